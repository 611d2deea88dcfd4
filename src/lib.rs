// HTCPCP coffee pot - a brewing state machine served over HTTP
// This exposes the core components for testing and integration

pub mod cli;
pub mod config;
pub mod external;
pub mod http;
pub mod observability;
pub mod pot;
pub mod shutdown;
pub mod telemetry;

// Re-export key types for easy access
pub use config::{FileSettingsSource, PotConfig, SettingsSource};
pub use external::{ActionError, ActionOutput, ActionRunner, CommandActionRunner};
pub use http::{router, serve, DispatchError, Dispatcher, Verb};
pub use observability::{OperationTimer, PotMetrics, PotStats};
pub use pot::{Pot, PotError, PotSettings, PotSnapshot, PotState};
pub use shutdown::shutdown_signal;
pub use telemetry::{generate_correlation_id, init_telemetry, shutdown_telemetry};
