use anyhow::Context;
use shared::config::Settings;
use shared::db::PgCatalog;
use shared::memory::MemoryCatalog;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

mod batch;

use batch::{BatchCfg, CsvFileSink};

#[tokio::main(flavor = "multi_thread")]
async fn main() -> anyhow::Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let settings = Settings::new().context("loading settings")?;
    let match_cfg = settings.match_config();
    let batch_cfg = BatchCfg {
        emit_policy: settings.emit_policy,
        max_parallel: settings.max_parallel,
    };
    info!(
        mode = %match_cfg.mode,
        max_ngram_size = match_cfg.max_ngram_size,
        punctuation = %settings.punctuation_equivalence,
        emit_policy = %batch_cfg.emit_policy,
        max_parallel = batch_cfg.max_parallel,
        input = %settings.input_path,
        output = %settings.output_path,
        "batch-matcher starting"
    );

    let input = batch::read_input_path(&settings.input_path)?;
    info!(rows = input.rows.len(), rejected = input.rejected, "input loaded");

    let mut sink = CsvFileSink::new(&settings.output_path);

    let summary = match settings.catalog_path.as_deref() {
        Some(path) => {
            let store = MemoryCatalog::from_path(path)
                .await
                .context("loading catalog file")?;
            info!(
                %path,
                manufacturers = store.manufacturers.len(),
                products = store.products.len(),
                "using in-memory catalog"
            );
            batch::process(input, &store, &mut sink, &match_cfg, &batch_cfg).await
        }
        None => {
            let store = PgCatalog::connect(&settings.database_url)
                .await
                .map_err(|e| {
                    error!(%e, "failed to connect to catalog database");
                    e
                })?;
            let result = batch::process(input, &store, &mut sink, &match_cfg, &batch_cfg).await;
            store.close().await;
            result
        }
    }?;

    info!(emitted = summary.emitted, output = %settings.output_path, "results written");
    Ok(())
}
