use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    hostsdb::server::run().await
}
