//! Connection settings for the local graph-database adapter
//!
//! Each value resolves as: explicit override, then environment, then the
//! built-in default. Empty strings count as unset at every layer. The
//! environment is read through a caller-supplied lookup so the adapter
//! itself never touches process state.

use thiserror::Error;

pub const DEFAULT_URI: &str = "bolt://localhost:7687";
pub const DEFAULT_USER: &str = "neo4j";

pub const ENV_URI: &str = "NEO4J_URI";
pub const ENV_USER: &str = "NEO4J_USER";
pub const ENV_PASSWORD: &str = "NEO4J_PASSWORD";
pub const ENV_GRAPH_NAME: &str = "GRAPH_NAME";

const SUPPORTED_SCHEMES: &[&str] = &[
    "bolt", "bolt+s", "bolt+ssc", "neo4j", "neo4j+s", "neo4j+ssc",
];

/// Errors found while validating a resolved configuration.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("connection URI has no scheme: {0}")]
    MissingScheme(String),

    #[error("unsupported connection scheme '{scheme}' in {uri}")]
    UnsupportedScheme { scheme: String, uri: String },
}

/// Explicit values supplied by the caller, e.g. from CLI flags
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub uri: Option<String>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub graph_name: Option<String>,
}

impl ConfigOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_uri(mut self, uri: impl Into<String>) -> Self {
        self.uri = Some(uri.into());
        self
    }

    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }

    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    pub fn with_graph_name(mut self, graph_name: impl Into<String>) -> Self {
        self.graph_name = Some(graph_name.into());
        self
    }
}

/// Resolved settings for `LocalAdapter`
#[derive(Clone, PartialEq, Eq)]
pub struct LocalAdapterConfig {
    pub uri: String,
    pub user: String,
    /// No default: absent means unauthenticated or supplied elsewhere
    pub password: Option<String>,
    /// Named graph to select, if the server hosts several
    pub graph_name: Option<String>,
}

impl Default for LocalAdapterConfig {
    fn default() -> Self {
        Self {
            uri: DEFAULT_URI.to_string(),
            user: DEFAULT_USER.to_string(),
            password: None,
            graph_name: None,
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

impl LocalAdapterConfig {
    /// Layer overrides over `lookup` over the defaults.
    pub fn resolve<F>(overrides: ConfigOverrides, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let pick = |explicit: Option<String>, var: &str| {
            non_empty(explicit).or_else(|| non_empty(lookup(var)))
        };

        Self {
            uri: pick(overrides.uri, ENV_URI).unwrap_or_else(|| DEFAULT_URI.to_string()),
            user: pick(overrides.user, ENV_USER).unwrap_or_else(|| DEFAULT_USER.to_string()),
            password: pick(overrides.password, ENV_PASSWORD),
            graph_name: pick(overrides.graph_name, ENV_GRAPH_NAME),
        }
    }

    /// `resolve` against the process environment. Call once, at startup.
    pub fn from_env(overrides: ConfigOverrides) -> Self {
        Self::resolve(overrides, |var| std::env::var(var).ok())
    }

    /// The URI scheme, e.g. `bolt`
    pub fn scheme(&self) -> Option<&str> {
        self.uri.split_once("://").map(|(scheme, _)| scheme)
    }

    /// Check that the URI names a graph-database scheme.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let scheme = self
            .scheme()
            .ok_or_else(|| ConfigError::MissingScheme(self.uri.clone()))?;
        if SUPPORTED_SCHEMES.contains(&scheme) {
            Ok(())
        } else {
            Err(ConfigError::UnsupportedScheme {
                scheme: scheme.to_string(),
                uri: self.uri.clone(),
            })
        }
    }
}

// Password stays out of logs and debug output.
impl std::fmt::Debug for LocalAdapterConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalAdapterConfig")
            .field("uri", &self.uri)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("graph_name", &self.graph_name)
            .finish()
    }
}

impl std::fmt::Display for LocalAdapterConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "uri:        {}", self.uri)?;
        writeln!(f, "user:       {}", self.user)?;
        writeln!(
            f,
            "password:   {}",
            if self.password.is_some() { "(set)" } else { "(unset)" }
        )?;
        write!(
            f,
            "graph_name: {}",
            self.graph_name.as_deref().unwrap_or("(default)")
        )
    }
}
