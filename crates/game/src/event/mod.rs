mod queue;
mod types;

pub use queue::EventQueue;
pub use types::MatchEvent;
