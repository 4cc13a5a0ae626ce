#[tokio::main]
async fn main() -> anyhow::Result<()> {
    roastchat_lib::run().await
}
