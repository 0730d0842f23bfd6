use statwatch_client::run_cli;
use statwatch_client::util::shutdown::listen_for_ctrl_c;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    listen_for_ctrl_c();
    run_cli().await
}
