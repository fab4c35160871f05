use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    noteanchor_cli::cli::app::run().await
}
