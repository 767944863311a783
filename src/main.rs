use framescout::api::SearchClient;
use framescout::config::AppConfig;
use framescout::http_server::{start_server, ServerState};
use framescout::session::SessionService;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let config = AppConfig::from_env();
    match &config.search_api_url {
        Some(url) => log::info!("Search backend: {}", url),
        None => log::info!("No search backend configured, running in offline mock mode"),
    }

    let sessions = SessionService::new(config.default_settings.clone());
    // Exactly one default tab on a fresh start
    sessions.bootstrap();

    let client = SearchClient::new(&config);

    start_server(ServerState { sessions, client }, config.server_port).await
}
