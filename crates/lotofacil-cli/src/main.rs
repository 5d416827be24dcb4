use tracing_subscriber::filter::{EnvFilter, LevelFilter};

mod command;
mod util;

fn main() -> anyhow::Result<()> {
    let directives = std::env::var(EnvFilter::DEFAULT_ENV).unwrap_or_default();
    tracing_subscriber::fmt()
        .with_env_filter(env_filter(&directives))
        .with_writer(std::io::stderr)
        .init();
    command::run()
}

/// Parses `RUST_LOG`-style directives, falling back to `info` when there are none.
fn env_filter(directives: &str) -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .parse_lossy(directives)
}
