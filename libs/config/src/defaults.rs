//! Runtime defaults
//!
//! Default values and constants used across the actor runtime for
//! consistency between the library and the node binary.

/// Default mailbox capacity (pending messages per actor)
pub const MAILBOX_SIZE: usize = 10_000;

/// Remote call timeout (milliseconds)
pub const REMOTE_TIMEOUT_MS: u64 = 15_000;

/// Protocol prefix of every actor path
pub const PATH_PROTOCOL: &str = "zio";

/// Host advertised in paths when remoting is not configured
pub const UNSPECIFIED_HOST: &str = "0.0.0.0";

/// Port advertised in paths when remoting is not configured
pub const UNSPECIFIED_PORT: u16 = 0;

/// HTTP route serving remote actor commands
pub const COMMAND_ROUTE: &str = "/cmd";

/// Default log level for binaries
pub const LOG_LEVEL: &str = "info";

/// Environment variable prefix for configuration overrides
pub const ENV_PREFIX: &str = "ACTORS";
