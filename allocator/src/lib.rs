pub mod calculator;
pub mod coerce;
pub mod types;

pub use calculator::AllocationCalculator;
pub use types::{Allocation, AllocationConfig, ConfigError, PayoutMode, TaxTable};
