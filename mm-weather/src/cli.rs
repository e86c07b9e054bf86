use anyhow::Context;
use clap::Parser;
use mm_weather_core::{
    AppState, ConfigError, Overrides, Settings,
    config::DEFAULT_CONFIG_FILE,
    relay,
};
use std::{ffi::OsString, path::PathBuf, process::ExitCode};
use tracing::{error, info};

/// Exit status when no API key could be found anywhere.
const MISSING_API_KEY_EXIT: u8 = 2;

/// Long options that may also be spelled with a single dash, e.g. `-port 9000`.
const LONG_FLAGS: &[&str] = &[
    "debug",
    "config",
    "token",
    "port",
    "command-token",
    "strict-fields",
    "help",
    "version",
];

#[derive(Debug)]
pub enum Startup {
    Serve(Settings),
    Exit(u8),
}

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(
    name = "mm-weather",
    version,
    about = "Mattermost slash command server reporting the current weather"
)]
pub struct Cli {
    /// Enable debug mode.
    #[arg(long)]
    pub debug: bool,

    /// Override default config file.
    #[arg(long, default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    /// Override the API token supplied in the environment or config file.
    #[arg(long)]
    pub token: Option<String>,

    /// Override the port that this server should listen on.
    #[arg(long)]
    pub port: Option<String>,

    /// Reject slash command requests that do not carry this token.
    #[arg(long)]
    pub command_token: Option<String>,

    /// Fail requests when the weather response lacks an expected field.
    #[arg(long)]
    pub strict_fields: bool,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse_from(expand_single_dash_longs(std::env::args_os()))
    }

    pub fn overrides(&self) -> Overrides {
        Overrides {
            config_file: self.config.clone(),
            api_key: self.token.clone(),
            listen_port: self.port.clone(),
            command_token: self.command_token.clone(),
            strict_fields: self.strict_fields,
        }
    }

    /// Resolve settings. A missing API key ends the process with a fixed status;
    /// any other configuration failure is returned as an error.
    pub fn startup<E>(&self, env: E) -> anyhow::Result<Startup>
    where
        E: Fn(&str) -> Option<String>,
    {
        match Settings::resolve(&self.overrides(), env) {
            Ok(settings) => Ok(Startup::Serve(settings)),
            Err(ConfigError::MissingApiKey) => {
                error!("Failed to locate API key!");
                Ok(Startup::Exit(MISSING_API_KEY_EXIT))
            }
            Err(err) => Err(err).context("fatal error processing config file"),
        }
    }

    pub async fn run(self) -> anyhow::Result<ExitCode> {
        let settings = match self.startup(|name| std::env::var(name).ok())? {
            Startup::Serve(settings) => settings,
            Startup::Exit(code) => return Ok(ExitCode::from(code)),
        };

        let state = AppState::from_settings(&settings)?;

        info!("Starting server on port {}", settings.listen_port);
        let listener = relay::bind(&settings.listen_port).await?;
        relay::serve(listener, state).await?;

        Ok(ExitCode::SUCCESS)
    }
}

/// Rewrite `-name` and `-name=value` into `--name` forms for the known long options.
pub fn expand_single_dash_longs<I>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = OsString>,
{
    args.into_iter()
        .map(|arg| match arg.to_str() {
            Some(s) if is_single_dash_long(s) => OsString::from(format!("-{s}")),
            _ => arg,
        })
        .collect()
}

fn is_single_dash_long(arg: &str) -> bool {
    let Some(rest) = arg.strip_prefix('-') else {
        return false;
    };
    if rest.starts_with('-') {
        return false;
    }
    let name = rest.split_once('=').map_or(rest, |(name, _)| name);
    LONG_FLAGS.contains(&name)
}
