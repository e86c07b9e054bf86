use serde::{Deserialize, Deserializer};
use std::{
    fmt, fs,
    path::{Path, PathBuf},
};
use thiserror::Error;
use tracing::debug;

use crate::format::FieldPolicy;

pub const DEFAULT_CONFIG_FILE: &str = "config.json";
pub const DEFAULT_LISTEN_PORT: &str = "8080";

pub const API_TOKEN_ENV: &str = "WEATHER_API_TOKEN";
pub const LISTEN_PORT_ENV: &str = "MM_LISTEN_PORT";
pub const COMMAND_TOKEN_ENV: &str = "MM_COMMAND_TOKEN";

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: BoxError,
    },

    #[error("failed to locate API key")]
    MissingApiKey,
}

/// Settings as they appear in the config file.
///
/// Example JSON:
/// {"apiKey": "...", "listenPort": "8080"}
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileConfig {
    pub api_key: Option<String>,

    /// Accepts either `"8080"` or `8080`.
    #[serde(default, deserialize_with = "port_value")]
    pub listen_port: Option<String>,

    pub command_token: Option<String>,

    #[serde(default)]
    pub strict_fields: bool,
}

impl FileConfig {
    /// Read and parse a config file. A `.toml` extension selects TOML, anything else is JSON.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let is_toml = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));

        let parsed: Result<Self, BoxError> = if is_toml {
            toml::from_str(&contents).map_err(BoxError::from)
        } else {
            serde_json::from_str(&contents).map_err(BoxError::from)
        };

        parsed.map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

fn port_value<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum PortValue {
        Text(String),
        Number(u64),
    }

    Ok(Option::<PortValue>::deserialize(deserializer)?.map(|value| match value {
        PortValue::Text(s) => s,
        PortValue::Number(n) => n.to_string(),
    }))
}

/// Values given explicitly on the command line. These win over every other source.
#[derive(Debug, Clone)]
pub struct Overrides {
    pub config_file: PathBuf,
    pub api_key: Option<String>,
    pub listen_port: Option<String>,
    pub command_token: Option<String>,
    pub strict_fields: bool,
}

impl Default for Overrides {
    fn default() -> Self {
        Self {
            config_file: PathBuf::from(DEFAULT_CONFIG_FILE),
            api_key: None,
            listen_port: None,
            command_token: None,
            strict_fields: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    CommandLine,
    Environment,
    ConfigFile,
    Default,
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Source::CommandLine => "command line",
            Source::Environment => "environment",
            Source::ConfigFile => "config file",
            Source::Default => "default",
        })
    }
}

/// Fully resolved, read-only configuration for one process.
#[derive(Clone)]
pub struct Settings {
    pub api_key: String,
    pub listen_port: String,
    pub command_token: Option<String>,
    pub field_policy: FieldPolicy,
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("api_key", &"<redacted>")
            .field("listen_port", &self.listen_port)
            .field("command_token", &self.command_token.as_ref().map(|_| "<redacted>"))
            .field("field_policy", &self.field_policy)
            .finish()
    }
}

impl Settings {
    /// Resolve settings from command line, environment and config file, in that order.
    ///
    /// The config file is only read when the API key is not available from the
    /// command line or the environment. Other file-backed settings are taken from
    /// it only when it was read. Empty values count as absent.
    pub fn resolve<E>(overrides: &Overrides, env: E) -> Result<Self, ConfigError>
    where
        E: Fn(&str) -> Option<String>,
    {
        let mut file = None;

        let api_key = match first_present([
            (overrides.api_key.clone(), Source::CommandLine),
            (env(API_TOKEN_ENV), Source::Environment),
        ]) {
            Some(found) => Some(found),
            None => {
                let loaded = FileConfig::load(&overrides.config_file)?;
                let key = loaded.api_key.clone();
                file = Some(loaded);
                first_present([(key, Source::ConfigFile)])
            }
        };

        let Some((api_key, source)) = api_key else {
            return Err(ConfigError::MissingApiKey);
        };
        debug!("Obtained API key from {source}");

        let file = file.unwrap_or_default();

        let (listen_port, source) = first_present([
            (overrides.listen_port.clone(), Source::CommandLine),
            (env(LISTEN_PORT_ENV), Source::Environment),
            (file.listen_port, Source::ConfigFile),
        ])
        .unwrap_or_else(|| (DEFAULT_LISTEN_PORT.to_string(), Source::Default));
        debug!("Obtained listen port '{listen_port}' from {source}");

        let command_token = first_present([
            (overrides.command_token.clone(), Source::CommandLine),
            (env(COMMAND_TOKEN_ENV), Source::Environment),
            (file.command_token, Source::ConfigFile),
        ])
        .map(|(token, source)| {
            debug!("Obtained command token from {source}");
            token
        });

        let field_policy = if overrides.strict_fields || file.strict_fields {
            FieldPolicy::Strict
        } else {
            FieldPolicy::Lenient
        };

        Ok(Self {
            api_key,
            listen_port,
            command_token,
            field_policy,
        })
    }
}

fn first_present<const N: usize>(
    candidates: [(Option<String>, Source); N],
) -> Option<(String, Source)> {
    candidates
        .into_iter()
        .find_map(|(value, source)| value.filter(|v| !v.is_empty()).map(|v| (v, source)))
}
