//! Actor Paths
//!
//! Every actor is addressed as
//! `zio://<system>@<host>:<port>/<hierarchical/path>`. Systems without
//! remoting advertise the sentinel coordinates `0.0.0.0:0000`.

use crate::error::{ActorSystemError, Result};
use actor_config::{defaults, RemoteConfig};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

const PATH_CHARS: &str = r"\w\-.*$+:@&=,!~';|";

static PATH_GRAMMAR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"^{}://(\w+)@(\d+\.\d+\.\d+\.\d+):(\d+)(/[{}/]+)$",
        defaults::PATH_PROTOCOL,
        PATH_CHARS
    ))
    .expect("actor path grammar")
});

static NAME_GRAMMAR: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!(r"^[{}]+$", PATH_CHARS)).expect("actor name grammar"));

static SYSTEM_GRAMMAR: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\w+$").expect("system grammar"));

/// Fully qualified address of an actor
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ActorPath {
    system: String,
    host: String,
    port: u16,
    path: String,
}

impl ActorPath {
    /// Build a path from its parts; `path` must be `/`-rooted
    pub fn new(system: &str, coordinates: &RemoteConfig, path: &str) -> Result<Self> {
        Self::parse(&format_path(system, &coordinates.host, coordinates.port, path))
    }

    /// Parse a path string against the path grammar
    pub fn parse(raw: &str) -> Result<Self> {
        let captures = PATH_GRAMMAR
            .captures(raw)
            .ok_or_else(|| ActorSystemError::invalid_path(raw))?;

        let port = captures[3]
            .parse::<u16>()
            .map_err(|_| ActorSystemError::invalid_path(raw))?;

        Ok(Self {
            system: captures[1].to_string(),
            host: captures[2].to_string(),
            port,
            path: captures[4].to_string(),
        })
    }

    pub fn system(&self) -> &str {
        &self.system
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Hierarchical part, e.g. `/parent/child`
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Last path segment
    pub fn name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or_default()
    }

    /// Host and port this path points at
    pub fn coordinates(&self) -> RemoteConfig {
        RemoteConfig::new(self.host.clone(), self.port)
    }
}

impl fmt::Display for ActorPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_path(&self.system, &self.host, self.port, &self.path))
    }
}

impl FromStr for ActorPath {
    type Err = ActorSystemError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl Serialize for ActorPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ActorPath {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

fn format_path(system: &str, host: &str, port: u16, path: &str) -> String {
    // The unspecified port is written as `0000`
    if port == defaults::UNSPECIFIED_PORT {
        format!("{}://{}@{}:0000{}", defaults::PATH_PROTOCOL, system, host, path)
    } else {
        format!("{}://{}@{}:{}{}", defaults::PATH_PROTOCOL, system, host, port, path)
    }
}

/// Check a single actor name (one path segment)
pub fn validate_actor_name(name: &str) -> Result<()> {
    if NAME_GRAMMAR.is_match(name) {
        Ok(())
    } else {
        Err(ActorSystemError::invalid_name(name))
    }
}

/// Check an actor system name
pub fn validate_system_name(name: &str) -> Result<()> {
    if SYSTEM_GRAMMAR.is_match(name) {
        Ok(())
    } else {
        Err(ActorSystemError::invalid_name(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_parse_local_sentinel_path() {
        let path = ActorPath::parse("zio://sys1@0.0.0.0:0000/parent/child").unwrap();
        assert_eq!(path.system(), "sys1");
        assert_eq!(path.host(), "0.0.0.0");
        assert_eq!(path.port(), 0);
        assert_eq!(path.path(), "/parent/child");
        assert_eq!(path.name(), "child");
        assert_eq!(path.to_string(), "zio://sys1@0.0.0.0:0000/parent/child");
    }

    #[test]
    fn test_new_formats_sentinel_port() {
        let path = ActorPath::new("sys1", &RemoteConfig::unspecified(), "/a").unwrap();
        assert_eq!(path.to_string(), "zio://sys1@0.0.0.0:0000/a");

        let remote = ActorPath::new("sys1", &RemoteConfig::new("1.2.3.4", 9999), "/x").unwrap();
        assert_eq!(remote.to_string(), "zio://sys1@1.2.3.4:9999/x");
    }

    #[test]
    fn test_malformed_paths_are_rejected() {
        for raw in [
            "",
            "sys1@0.0.0.0:0000/a",
            "http://sys1@0.0.0.0:0000/a",
            "zio://sys1@localhost:9000/a",
            "zio://sys1@0.0.0.0:0000",
            "zio://sys1@0.0.0.0:0000/",
            "zio://sys 1@0.0.0.0:0000/a",
            "zio://sys1@0.0.0.0:99999/a",
        ] {
            assert_eq!(
                ActorPath::parse(raw),
                Err(ActorSystemError::invalid_path(raw)),
                "{raw:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_name_validation() {
        assert!(validate_actor_name("worker-1").is_ok());
        assert_eq!(
            validate_actor_name(""),
            Err(ActorSystemError::invalid_name(""))
        );
        assert!(validate_actor_name("a/b").is_err());
        assert!(validate_system_name("sys1").is_ok());
        assert!(validate_system_name("sys-1").is_err());
    }

    #[test]
    fn test_serde_as_string() {
        let path = ActorPath::parse("zio://sys1@10.0.0.1:9000/a/b").unwrap();
        let encoded = serde_json::to_string(&path).unwrap();
        assert_eq!(encoded, "\"zio://sys1@10.0.0.1:9000/a/b\"");
        let decoded: ActorPath = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded, path);
        assert!(serde_json::from_str::<ActorPath>("\"bogus\"").is_err());
    }

    proptest! {
        #[test]
        fn prop_path_round_trip(
            system in "[A-Za-z0-9_]{1,12}",
            octets in proptest::array::uniform4(any::<u8>()),
            port in any::<u16>(),
            segments in proptest::collection::vec("[a-z0-9_\\-]{1,8}", 1..4),
        ) {
            let host = format!("{}.{}.{}.{}", octets[0], octets[1], octets[2], octets[3]);
            let hierarchical = format!("/{}", segments.join("/"));

            let formatted = format_path(&system, &host, port, &hierarchical);
            let parsed = ActorPath::parse(&formatted).unwrap();

            prop_assert_eq!(parsed.system(), system.as_str());
            prop_assert_eq!(parsed.host(), host.as_str());
            prop_assert_eq!(parsed.port(), port);
            prop_assert_eq!(parsed.path(), hierarchical.as_str());
            prop_assert_eq!(parsed.to_string(), formatted);
        }
    }
}
