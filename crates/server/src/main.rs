#[tokio::main]
async fn main() -> anyhow::Result<()> {
    fletia_server::start().await
}
