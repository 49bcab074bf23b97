pub mod aggregator;
pub mod broadcaster;
pub mod orchestrator;
pub mod registry;
pub mod scripts;
pub mod service;

pub use aggregator::BestPriceAggregator;
pub use broadcaster::{EventBroadcaster, SubscriberId, Subscription};
pub use orchestrator::{OrchestratorSettings, SearchOrchestrator};
pub use registry::TaskRegistry;
pub use service::{ServiceStats, TaskService};
