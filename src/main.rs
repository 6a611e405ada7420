use anyhow::Result;
use std::sync::Arc;
use teloxide::prelude::*;
use tracing::info;
use tracing_subscriber::EnvFilter;

use wikichat::bot::{callback_handler, message_handler, Router};
use wikichat::config::BotConfig;
use wikichat::localization::init_localization;
use wikichat::session_store::{spawn_sweeper, SessionStore};
use wikichat::wiki::WikipediaClient;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var("LOG_FORMAT")
        .map(|format| format.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let subscriber = tracing_subscriber::fmt().with_env_filter(filter);
    if json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();
    init_tracing();

    info!("Starting WikiChat bot");

    let config = BotConfig::from_env()?;
    init_localization()?;

    let provider = Arc::new(WikipediaClient::new(config.provider.clone())?);
    let store = Arc::new(SessionStore::new());
    spawn_sweeper(Arc::clone(&store), config.session.clone());

    let router = Arc::new(Router::new(provider, store, config.render.clone()));
    let bot = Bot::new(config.telegram_token.clone());

    info!("Bot initialized, starting dispatcher");

    let handler = dptree::entry()
        .branch(Update::filter_message().endpoint(message_handler))
        .branch(Update::filter_callback_query().endpoint(callback_handler));

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![router])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    Ok(())
}
