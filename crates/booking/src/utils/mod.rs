//! Internal utilities shared by the services.

pub mod permissions;
pub mod validation;

pub use permissions::*;
pub use validation::*;
