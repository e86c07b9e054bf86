use tracing::Level;
use tracing_subscriber::{EnvFilter, fmt::writer::MakeWriterExt};

/// Errors go to stderr, everything else to stdout. `RUST_LOG` overrides the level.
pub fn init(debug: bool) {
    let default_filter = if debug {
        "info,mm_weather=debug,mm_weather_core=debug"
    } else {
        "info"
    };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let writer = std::io::stderr
        .with_max_level(Level::ERROR)
        .or_else(std::io::stdout);

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .init();
}
