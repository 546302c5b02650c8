//! Runs a single fetch cycle with the configured sources and prints `{events, apod}` as JSON.

use deep_space_signals::config::DeepSpaceConfig;
use deep_space_signals::ingest::Pipeline;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    deep_space_signals::init_tracing();

    let cfg = DeepSpaceConfig::load_default()?;
    let pipeline = Pipeline::from_config(&cfg)?;
    let set = pipeline.run_cycle().await;

    println!("{}", serde_json::to_string_pretty(&set)?);
    Ok(())
}
