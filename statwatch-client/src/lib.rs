pub mod cli;
pub mod config;
pub mod fetcher;
pub mod monitor;
pub mod util;

/// Entrypoint used by `main.rs` and tests to run the full CLI.
pub async fn run_cli() -> anyhow::Result<()> {
    cli::cli().await
}
