use release_registry::config::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if it exists
    dotenvy::dotenv().ok();

    use env_logger::Builder;
    use log::LevelFilter;

    Builder::new()
        .filter_level(LevelFilter::Info)
        .filter_module("sqlx", LevelFilter::Warn)
        .parse_default_env()
        .init();

    let config = AppConfig::load()?;
    log::info!(
        "Configuration loaded: server={}:{}, page size {} (max {}), repositories at {}",
        config.server.host,
        config.server.port,
        config.releases.default_page_size,
        config.releases.max_page_size,
        config.git.repositories_root.display()
    );

    release_registry::run_server(config).await
}
