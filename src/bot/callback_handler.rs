//! Callback Handler module for processing inline keyboard callback queries

use anyhow::Result;
use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::types::CallbackQuery;
use tracing::{debug, error, warn};

use super::delivery::{deliver, TelegramProgress};
use super::router::{Event, Router};

/// Handle callback queries from inline keyboards
pub async fn callback_handler(bot: Bot, q: CallbackQuery, router: Arc<Router>) -> Result<()> {
    debug!(user_id = %q.from.id, data = ?q.data, "Received callback query from user");

    // Stop the client spinner whatever happens next
    if let Err(e) = bot.answer_callback_query(q.id.clone()).await {
        error!(user_id = %q.from.id, error = %e, "Failed to answer callback query");
    }

    let Some(message) = &q.message else {
        warn!(user_id = %q.from.id, "Callback query without message, ignoring");
        return Ok(());
    };
    let Some(data) = q.data.clone() else {
        return Ok(());
    };

    let chat_id = message.chat().id;
    let progress = TelegramProgress::editing(bot.clone(), chat_id, message.id());
    let outcome = router
        .handle_event(
            chat_id.into(),
            Event::Button(data),
            q.from.language_code.as_deref(),
            &progress,
        )
        .await;

    deliver(&bot, chat_id, &progress, outcome).await
}
