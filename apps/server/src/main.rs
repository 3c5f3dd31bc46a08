use anyhow::Context;
use chrono::{Datelike, Duration, Months, NaiveDate};
use clap::{Parser, Subcommand};
use gymbook_booking::{Clock, NewSubscription};
use gymbook_config::load as load_config;
use gymbook_database::{CreateClassRequest, CreateUserRequest, PlanType, UserRole};
use gymbook_runtime::{run_sweeper, shutdown_signal, telemetry, BackendServices};
use serde::Serialize;
use tracing::info;

#[derive(Parser)]
#[command(name = "gymbook")]
#[command(about = "Gym class booking backend (runs the no-show sweeper by default)")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the periodic no-show sweeper until Ctrl+C (default)
    Run,
    /// Lapse every overdue confirmed booking once and exit
    Sweep,
    /// Compute the current month's bill for a member
    Bill {
        /// Member id
        user_id: i64,
    },
    /// Booking statistics for one member, or the whole gym when omitted
    Stats {
        /// Member id
        user_id: Option<i64>,
    },
    /// List upcoming classes with their free spots
    Upcoming,
    /// Seed the database with demo members, classes and a subscription
    Seed,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    telemetry::init_tracing().context("failed to initialise tracing")?;
    let config = load_config().context("failed to load configuration")?;
    let services = BackendServices::initialise(&config)
        .await
        .context("failed to initialise backend services")?;

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run(&services).await,
        Commands::Sweep => sweep(&services).await,
        Commands::Bill { user_id } => bill(&services, user_id).await,
        Commands::Stats { user_id } => stats(&services, user_id).await,
        Commands::Upcoming => upcoming(&services).await,
        Commands::Seed => seed(&services).await,
    }
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    let rendered = serde_json::to_string_pretty(value).context("failed to render output")?;
    println!("{rendered}");
    Ok(())
}

async fn run(services: &BackendServices) -> anyhow::Result<()> {
    info!(
        interval_seconds = services.sweep_interval.as_secs(),
        "starting gym booking backend"
    );

    let swept = run_sweeper(services, shutdown_signal()).await;

    info!(swept, "backend shut down");
    Ok(())
}

async fn sweep(services: &BackendServices) -> anyhow::Result<()> {
    let swept = services
        .sweeper
        .sweep_now()
        .await
        .context("no-show sweep failed")?;

    println!("{swept} booking(s) marked as no-show");
    Ok(())
}

async fn bill(services: &BackendServices, user_id: i64) -> anyhow::Result<()> {
    let bill = services
        .billing
        .calculate_monthly_billing(user_id)
        .await
        .with_context(|| format!("failed to bill user {user_id}"))?;

    print_json(&bill)
}

async fn stats(services: &BackendServices, user_id: Option<i64>) -> anyhow::Result<()> {
    let stats = match user_id {
        Some(user_id) => services
            .stats
            .user_stats(user_id)
            .await
            .with_context(|| format!("failed to load stats for user {user_id}"))?,
        None => services
            .stats
            .dashboard_stats()
            .await
            .context("failed to load dashboard stats")?,
    };

    print_json(&stats)
}

async fn upcoming(services: &BackendServices) -> anyhow::Result<()> {
    let classes = services
        .classes
        .upcoming_classes()
        .await
        .context("failed to list upcoming classes")?;

    if classes.is_empty() {
        println!("No upcoming classes");
        return Ok(());
    }

    print_json(&classes)
}

async fn seed(services: &BackendServices) -> anyhow::Result<()> {
    info!("seeding database with demo data");

    let admin = services
        .users
        .register_user(CreateUserRequest {
            firstname: "Claire".into(),
            lastname: "Martin".into(),
            email: "admin@gymbook.local".into(),
            role: UserRole::Admin,
        })
        .await
        .context("failed to create admin (already seeded?)")?;

    let mut members = Vec::new();
    for (firstname, lastname, email) in [
        ("Lucas", "Bernard", "lucas@gymbook.local"),
        ("Emma", "Petit", "emma@gymbook.local"),
    ] {
        let member = services
            .users
            .register_user(CreateUserRequest {
                firstname: firstname.into(),
                lastname: lastname.into(),
                email: email.into(),
                role: UserRole::User,
            })
            .await
            .with_context(|| format!("failed to create member {email}"))?;
        members.push(member);
    }

    let now = services.clock.now();
    let tomorrow = now + Duration::days(1);
    let schedule = [
        ("Yoga Flow", "Sophie", Duration::hours(0), 60, 12),
        ("HIIT", "Karim", Duration::hours(2), 45, 2),
        ("Pilates", "Sophie", Duration::hours(4), 50, 10),
    ];

    let mut classes = Vec::new();
    for (title, coach, offset, duration_minutes, capacity) in schedule {
        let class = services
            .classes
            .schedule_class(
                admin.id,
                CreateClassRequest {
                    title: title.into(),
                    coach: coach.into(),
                    starts_at: tomorrow + offset,
                    duration_minutes,
                    capacity,
                },
            )
            .await
            .with_context(|| format!("failed to schedule {title}"))?;
        classes.push(class);
    }

    let today = now.date_naive();
    let start_date = today
        .checked_sub_months(Months::new(7))
        .unwrap_or(today)
        .with_day(1)
        .unwrap_or(today);
    let end_date = start_date
        .checked_add_months(Months::new(12))
        .unwrap_or(NaiveDate::MAX);

    for member in &members {
        services
            .subscriptions
            .subscribe(
                member.id,
                NewSubscription {
                    plan_type: PlanType::Standard,
                    start_date,
                    end_date,
                    auto_renew: true,
                },
            )
            .await
            .with_context(|| format!("failed to subscribe member {}", member.id))?;

        for class in &classes {
            services
                .bookings
                .create_booking(member.id, class.id)
                .await
                .with_context(|| format!("failed to book class {}", class.id))?;
        }
    }

    println!("Database seeded with demo data:");
    println!("- admin {} (id {})", admin.email, admin.id);
    println!("- {} members with STANDARD subscriptions", members.len());
    println!("- {} classes tomorrow, every member booked", classes.len());
    println!("Run 'upcoming' or 'stats' to inspect it");

    Ok(())
}
