#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = coursepulse::run().await {
        eprintln!("coursepulse fatal: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}
