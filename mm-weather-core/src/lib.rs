//! Core library for the `mm-weather` slash command server.
//!
//! This crate defines:
//! - Settings resolution (command line, environment, config file)
//! - The WeatherAPI.com client behind a provider trait
//! - Formatting of the channel message and the Mattermost response envelope
//! - The `/weather` HTTP handler and router, with an optional command token check
//!
//! It is used by `mm-weather`, but the router can be mounted by other services too.

pub mod auth;
pub mod config;
pub mod format;
pub mod model;
pub mod provider;
pub mod relay;

pub use auth::CommandToken;
pub use config::{ConfigError, Overrides, Settings};
pub use format::FieldPolicy;
pub use model::{ChatResponse, WeatherSnapshot};
pub use provider::{ProviderError, WeatherApiProvider, WeatherProvider};
pub use relay::AppState;
