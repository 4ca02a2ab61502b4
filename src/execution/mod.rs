// Order execution module
pub mod executor;
pub mod guard;

pub use executor::{describe_retcode, ExecutionResult, OrderExecutor};
pub use guard::{GuardResult, PositionGuard};
