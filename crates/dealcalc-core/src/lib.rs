pub mod assumptions;
pub mod error;
pub mod format;
pub mod scenario;
pub mod time_value;
pub mod types;

#[cfg(feature = "loan")]
pub mod loan;

#[cfg(feature = "projection")]
pub mod projection;

#[cfg(feature = "exit")]
pub mod exit;

#[cfg(feature = "waterfall")]
pub mod waterfall;

#[cfg(feature = "comparison")]
pub mod comparison;

pub use assumptions::DealAssumptions;
pub use error::DealCalcError;
pub use scenario::{FinancingType, Scenario, ScenarioSet};
pub use types::*;

/// Standard result type for all dealcalc operations
pub type DealCalcResult<T> = Result<T, DealCalcError>;
