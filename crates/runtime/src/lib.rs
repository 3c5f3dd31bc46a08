use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use gymbook_booking::{
    BillingPolicy, BillingService, BookingService, CancellationPolicy, ClassService, Clock,
    GymStore, NoShowSweeper, SqliteStore, StatsService, SubscriptionService, SystemClock,
    UserService,
};
use gymbook_config::AppConfig;
use gymbook_database::initialize_database;
use sqlx::SqlitePool;
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

pub mod telemetry {
    use anyhow::Result;
    use tracing::Level;
    use tracing_subscriber::{fmt::SubscriberBuilder, EnvFilter};

    pub fn init_tracing() -> Result<()> {
        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        let subscriber = SubscriberBuilder::default()
            .with_max_level(Level::INFO)
            .with_env_filter(env_filter)
            .finish();

        tracing::subscriber::set_global_default(subscriber)
            .map_err(|error| anyhow::anyhow!("failed to set tracing subscriber: {error}"))
    }
}

/// Every service wired against one SQLite pool
#[derive(Clone)]
pub struct BackendServices {
    pub db_pool: SqlitePool,
    pub store: Arc<SqliteStore>,
    pub clock: Arc<dyn Clock>,
    pub users: Arc<UserService<SqliteStore>>,
    pub classes: Arc<ClassService<SqliteStore>>,
    pub subscriptions: Arc<SubscriptionService<SqliteStore>>,
    pub bookings: Arc<BookingService<SqliteStore>>,
    pub sweeper: Arc<NoShowSweeper<SqliteStore>>,
    pub billing: Arc<BillingService<SqliteStore>>,
    pub stats: Arc<StatsService<SqliteStore>>,
    pub sweep_interval: Duration,
}

impl BackendServices {
    pub async fn initialise(config: &AppConfig) -> Result<Self> {
        Self::initialise_with_clock(config, Arc::new(SystemClock)).await
    }

    pub async fn initialise_with_clock(config: &AppConfig, clock: Arc<dyn Clock>) -> Result<Self> {
        let db_pool = initialize_database(&config.database)
            .await
            .context("failed to initialise database")?;

        let store = Arc::new(SqliteStore::new(db_pool.clone()));
        let cancellation = CancellationPolicy::from(&config.policy);
        let billing = BillingPolicy::from(&config.policy);

        info!(
            cancellation_window_hours = config.policy.cancellation_window_hours,
            penalty_threshold = config.policy.no_show_penalty_threshold,
            loyalty_min_months = config.policy.loyalty_min_months,
            "booking policy loaded"
        );

        Ok(Self {
            users: Arc::new(UserService::new(store.clone(), clock.clone())),
            classes: Arc::new(ClassService::new(store.clone(), clock.clone())),
            subscriptions: Arc::new(SubscriptionService::new(store.clone())),
            bookings: Arc::new(BookingService::new(store.clone(), clock.clone(), cancellation)),
            sweeper: Arc::new(NoShowSweeper::new(store.clone(), clock.clone())),
            billing: Arc::new(BillingService::new(store.clone(), clock.clone(), billing)),
            stats: Arc::new(StatsService::new(store.clone())),
            sweep_interval: Duration::from_secs(config.sweeper.interval_seconds),
            db_pool,
            store,
            clock,
        })
    }
}

/// Run the no-show sweeper on its configured interval until `shutdown` resolves.
///
/// Returns the number of bookings lapsed over the whole run.
pub async fn run_sweeper<F>(services: &BackendServices, shutdown: F) -> u64
where
    F: Future<Output = ()>,
{
    sweep_until(&services.sweeper, services.sweep_interval, shutdown).await
}

/// Sweep immediately, then every `period`, until `shutdown` resolves.
/// A failed sweep is logged and retried on the next tick.
pub async fn sweep_until<S, F>(sweeper: &NoShowSweeper<S>, period: Duration, shutdown: F) -> u64
where
    S: GymStore,
    F: Future<Output = ()>,
{
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    tokio::pin!(shutdown);

    let mut total = 0;
    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            _ = ticker.tick() => match sweeper.sweep_now().await {
                Ok(swept) => total += swept,
                Err(error) => warn!(%error, "no-show sweep failed"),
            },
        }
    }

    info!(total, "sweeper stopped");
    total
}

pub async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        warn!(?error, "failed to listen for shutdown signal");
    }
    info!("shutdown signal received");
}
