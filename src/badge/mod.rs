pub mod evaluator;
pub mod ledger;
pub mod models;

mod errors;

pub use errors::BadgeError;
pub use evaluator::{BadgeEvaluator, HistoryBadgeEvaluator};
pub use ledger::{BadgeLedger, InMemoryBadgeLedger};
pub use models::{badge_codes, BadgeUnlock};
