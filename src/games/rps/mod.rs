//! Rock-paper-scissors: choices, rounds, and rules.

mod rules;
mod types;

pub use rules::RpsRules;
pub use types::{Choice, Round, RpsMove, RpsState};
