use thiserror::Error;

#[derive(Debug, Error)]
pub enum BadgeError {
    #[error("Ledger error: {0}")]
    Ledger(String),

    #[error("History error: {0}")]
    History(String),
}
