pub mod catalog;
pub mod config;
pub mod error;
pub mod events;
pub mod fallback;
pub mod generation;
pub mod goal;
pub mod ledger;
pub mod normalize;
pub mod nudge;
pub mod persona;
pub mod prompts;
pub mod quest;
pub mod reward;
pub mod sequencer;
pub mod session;
pub mod snapshot;
pub mod validate;

pub use catalog::GoalCatalogBuilder;
pub use generation::{GenerationRequest, TextGenerator};
pub use goal::Goal;
pub use ledger::ProgressionLedger;
pub use persona::Persona;
pub use quest::{Quest, Stage};
pub use sequencer::QuestSequencer;
pub use session::{Coach, Session};

/// Returns true when a goal category denotes health coverage.
pub fn is_health_category(category: &str) -> bool {
    category.to_lowercase().contains("health")
}
