use anyhow::{Context, Result};
use config::Config;
use membrane_normalization::acquisition::HttpTimeseriesSource;
use membrane_normalization::{config, telemetry, NormalizationEngine};
use std::sync::Arc;
use telemetry::init_tracing;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let cfg = Config::load()?;
    let source = HttpTimeseriesSource::new(
        cfg.acquisition.base_url.clone(),
        cfg.acquisition.timeout(),
    )?;
    let engine = NormalizationEngine::new(Arc::new(source));

    let baseline = match cfg.baseline.record()? {
        Some(record) => record,
        None => {
            let instant = cfg
                .baseline
                .instant
                .context("baseline needs either `values` or an `instant` to resolve from history")?;
            engine.resolve_baseline(&cfg.request, instant).await?
        }
    };

    info!(
        system_id = %cfg.request.system_id,
        start = %cfg.request.start,
        end = %cfg.request.end,
        "starting normalization"
    );
    let table = engine.run(&cfg.request, &baseline).await?;
    println!("{}", serde_json::to_string(&table)?);
    Ok(())
}
