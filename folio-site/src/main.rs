use anyhow::Result;
use folio_site::config::SiteSettings;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let ax = folio_site::build().await?;
    let settings = SiteSettings::from_config(&ax.app.config_snapshot())?;

    tracing::info!("folio listening on http://{}", settings.addr());
    ax.listen(settings.addr(), settings.body_limit()).await?;

    Ok(())
}
