use anyhow::Context;
use book_service::prelude::*;
use book_service::error::sanitize_url;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load().context("loading configuration")?;
    init_tracing(&config)?;

    let url = &config.database.url;
    let dialect = Dialect::from_url(url).with_context(|| {
        format!(
            "unsupported database url '{}': expected postgres:// or sqlite:",
            sanitize_url(url)
        )
    })?;
    tracing::info!(
        dialect = dialect.name(),
        url = %sanitize_url(url),
        environment = %config.service.environment,
        "Connecting to database"
    );

    let pool = create_pool(&config.database).await?;
    let books = BookRepository::new(pool, dialect);
    if config.database.auto_migrate {
        books.ensure_schema().await?;
    }

    let state = AppState::new(config.clone(), books);
    Server::new(config).serve(router(state)).await?;

    Ok(())
}
