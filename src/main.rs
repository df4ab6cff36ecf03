use vqa_dataset_store::{AppContainer, StoreConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = StoreConfig::from_env()?;
    tracing::info!(
        "Opening dataset store at {} (dimension {})",
        config.redacted_database_url(),
        config.embedding_dimension
    );

    let container = AppContainer::new(&config).await?;
    tracing::info!("Vector support: {:?}", container.vector_support);

    if config.seed_on_start {
        let seeded = container.seed_dataset_use_case.execute_bundled().await?;
        for table in &seeded.report.tables {
            tracing::info!(
                "Seeded {}: {} inserted, {} already present",
                table.table,
                table.inserted,
                table.skipped
            );
        }
    }

    let stats = container.statistics_service.collect().await?;
    tracing::info!(
        "Dataset: {} files, {} documents, {} pages, {} chunks, {} image chunks ({:.0}% embedded), {} queries",
        stats.files,
        stats.documents,
        stats.pages,
        stats.chunks,
        stats.image_chunks,
        stats.embedding_coverage() * 100.0,
        stats.queries
    );

    Ok(())
}
