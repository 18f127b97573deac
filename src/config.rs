use serde::Deserialize;

/// Tier used when none is given.
pub const DEFAULT_TIER: &str = "default";

/// Options for opening a [`Connection`](crate::Connection).
///
/// Deserializable so they can live in a config file:
/// ```rust
/// use sql_dbapi::ConnectOptions;
///
/// let opts: ConnectOptions =
///     serde_json::from_str(r#"{"database": "mattdb", "tier": "dev"}"#).unwrap();
/// assert_eq!(opts.tier, "dev");
/// assert!(!opts.autocommit);
/// assert_eq!(opts.arraysize, 1);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ConnectOptions {
    pub database: String,
    #[serde(default = "default_tier")]
    pub tier: String,
    /// Bypass tier discovery and talk to this host directly.
    #[serde(default)]
    pub host: Option<String>,
    /// Run every statement in its own transaction instead of opening one implicitly.
    #[serde(default)]
    pub autocommit: bool,
    /// Initial `arraysize` for cursors created on the connection.
    #[serde(default = "default_arraysize")]
    pub arraysize: usize,
}

fn default_tier() -> String {
    DEFAULT_TIER.to_string()
}

fn default_arraysize() -> usize {
    1
}

impl ConnectOptions {
    #[must_use]
    pub fn new(database: impl Into<String>, tier: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            tier: tier.into(),
            host: None,
            autocommit: false,
            arraysize: default_arraysize(),
        }
    }

    #[must_use]
    pub fn builder(database: impl Into<String>) -> ConnectOptionsBuilder {
        ConnectOptionsBuilder::new(database)
    }
}

/// Fluent builder for [`ConnectOptions`].
#[derive(Debug, Clone)]
pub struct ConnectOptionsBuilder {
    opts: ConnectOptions,
}

impl ConnectOptionsBuilder {
    #[must_use]
    pub fn new(database: impl Into<String>) -> Self {
        Self {
            opts: ConnectOptions::new(database, DEFAULT_TIER),
        }
    }

    #[must_use]
    pub fn tier(mut self, tier: impl Into<String>) -> Self {
        self.opts.tier = tier.into();
        self
    }

    #[must_use]
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.opts.host = Some(host.into());
        self
    }

    #[must_use]
    pub fn autocommit(mut self, autocommit: bool) -> Self {
        self.opts.autocommit = autocommit;
        self
    }

    #[must_use]
    pub fn arraysize(mut self, arraysize: usize) -> Self {
        self.opts.arraysize = arraysize.max(1);
        self
    }

    #[must_use]
    pub fn finish(self) -> ConnectOptions {
        self.opts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_sets_every_field() {
        let opts = ConnectOptions::builder("mattdb")
            .tier("local")
            .host("db1.example")
            .autocommit(true)
            .arraysize(0)
            .finish();
        assert_eq!(opts.database, "mattdb");
        assert_eq!(opts.tier, "local");
        assert_eq!(opts.host.as_deref(), Some("db1.example"));
        assert!(opts.autocommit);
        assert_eq!(opts.arraysize, 1);
    }

    #[test]
    fn deserialize_fills_defaults() -> Result<(), serde_json::Error> {
        let opts: ConnectOptions = serde_json::from_str(r#"{"database": "mattdb"}"#)?;
        assert_eq!(opts, ConnectOptions::new("mattdb", DEFAULT_TIER));
        Ok(())
    }
}
