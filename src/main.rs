#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    wheat_vision_lib::run().await
}
