mod history;
mod reconciler;

pub use history::{BallHistory, BallHistoryEntry};
pub use reconciler::{Classification, ReconcileOutcome, RollbackReconciler};
