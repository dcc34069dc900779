// 7.0: settlement state machine. construction validation, funding, resolution,
// claiming. each operation is one atomic transition under the contract lock.

mod claims;
mod config;
mod core;
mod funding;
mod resolution;
mod results;

pub use config::EngineConfig;
pub use core::{ContractSnapshot, LifecycleState, OptionContract};
pub use results::{ErrorCategory, FundingResult, ResolutionResult, SettlementError};
