use std::error::Error;

use embedding_service::telemetry;
use salary_pipeline::{MongoStore, PipelineConfig, SalaryPipeline, ServiceEmbedder};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // Load environment variables from .env file; a missing file is fine.
    let dotenv = dotenvy::dotenv();
    if let Err(e) = &dotenv {
        if !e.not_found() {
            return Err(e.to_string().into());
        }
    }

    tracing_subscriber::registry()
        .with(telemetry::env_filter("info"))
        .with(telemetry::layer())
        .init();

    if let Ok(path) = dotenv {
        info!("environment loaded from {}", path.display());
    }

    let cfg = PipelineConfig::from_env()?;
    let provider = ServiceEmbedder::new(cfg.embedding.model.clone());

    let summary = SalaryPipeline::new(cfg)?.run(&provider, &MongoStore).await?;
    info!(
        rows = summary.rows,
        embedded = summary.embedded_rows,
        saved = summary.sink.inserted,
        "run complete"
    );

    Ok(())
}
