use anyhow::Result;
use clap::Parser;
use editor_state_store::Config;
use editor_state_store::cli::{Cli, run_with};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::from_args(cli.store)?;

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.log_level.as_str()),
    )
    .init();

    run_with(&config, cli.command).await
}
