//! # Actor Runtime Configuration
//!
//! Configuration types and defaults shared by the actor runtime and the node
//! binary.
//!
//! ## Features
//!
//! - **Defaults**: mailbox capacity, remote call timeout, path sentinels
//! - **Remote coordinates**: the `RemoteConfig` a system advertises in its paths
//! - **Runtime configuration**: TOML file plus `ACTORS_` environment overrides
//!
//! ## Usage
//!
//! ```rust,no_run
//! use actor_config::{RuntimeConfig, defaults};
//!
//! let config = RuntimeConfig::load(None).expect("configuration");
//! assert!(config.system.mailbox_size > 0);
//! assert_eq!(defaults::REMOTE_TIMEOUT_MS, 15_000);
//! ```

pub mod defaults;
pub mod runtime_config;

// Re-export commonly used types
pub use runtime_config::{
    LoggingSettings, RemoteConfig, RemoteSettings, RuntimeConfig, SystemSettings,
};
