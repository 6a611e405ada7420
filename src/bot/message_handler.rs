//! Message Handler module for processing incoming Telegram messages

use anyhow::Result;
use std::sync::Arc;
use teloxide::prelude::*;
use tracing::debug;

use super::delivery::{deliver, TelegramProgress};
use super::router::{Event, Router};

/// Handle text messages and commands
pub async fn message_handler(bot: Bot, msg: Message, router: Arc<Router>) -> Result<()> {
    let chat_id = msg.chat.id;
    let language_code = msg
        .from
        .as_ref()
        .and_then(|user| user.language_code.clone());

    let event = match msg.text() {
        Some(text) => Event::from_text(text),
        None => Event::Unsupported,
    };
    debug!(user_id = %chat_id, event = ?event, "Received message");

    let progress = TelegramProgress::new(bot.clone(), chat_id);
    let outcome = router
        .handle_event(chat_id.into(), event, language_code.as_deref(), &progress)
        .await;

    deliver(&bot, chat_id, &progress, outcome).await
}
