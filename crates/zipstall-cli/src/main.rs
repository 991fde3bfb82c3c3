use anyhow::Result;
use clap::Parser;

mod completion;
mod config;
mod dispatch;
mod render;

#[cfg(test)]
mod tests;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = dispatch::Cli::parse();
    dispatch::run_cli(cli)
}
