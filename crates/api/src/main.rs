use anyhow::Context;

use credits_infra::config::Settings;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load(None).context("failed to load settings")?;
    credits_observability::init(settings.debug);

    let app = credits_api::app::build_app(&settings).await?;

    let listener = tokio::net::TcpListener::bind(&settings.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", settings.bind_addr))?;

    tracing::info!(app = %settings.app_name, "listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}
