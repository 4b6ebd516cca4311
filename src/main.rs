use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    slidesynth_cli::run_cli().await
}
