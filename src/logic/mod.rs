pub mod change;
pub mod controller;
pub mod growth_stage;
pub mod ingest;
pub mod rules;

pub use change::has_action_changed;
pub use controller::{DecisionRunner, GreenhouseStore, RunOutcome, SkipReason};
pub use growth_stage::{resolve_growth_stage, GrowthStage};
pub use ingest::SensorPayload;
pub use rules::DecisionEngine;
