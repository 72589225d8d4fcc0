//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize)
//!     → loader.rs (environment overrides, one variable per field)
//!     → validation.rs (semantic checks)
//!     → AppConfig (validated, immutable)
//!     → shared via ArcSwap to handlers
//!
//! On file change:
//!     watcher.rs detects change
//!     → loader.rs resolves new config
//!     → validation.rs validates
//!     → atomic swap of Arc<AppConfig>
//!     → next request observes new overrides
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require full reload
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{apply_env_overrides, load_config, resolve_config, ConfigError};
pub use schema::{
    AppConfig, CorsConfig, DemoConfig, InventoryConfig, ListenerConfig, LogFormat,
    ObservabilityConfig, ResourcesConfig, VotesConfig,
};
pub use validation::{validate_config, ValidationError};
pub use watcher::ConfigWatcher;
