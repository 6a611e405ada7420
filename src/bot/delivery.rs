//! Delivery of screens and documents to Telegram.

use anyhow::Result;
use async_trait::async_trait;
use std::sync::{Mutex, PoisonError};
use teloxide::prelude::*;
use teloxide::types::{InputFile, MessageId};
use teloxide::{ApiError, RequestError};
use tracing::{debug, error};

use super::router::{Outcome, ProgressSink};
use super::ui_builder::{to_keyboard, Screen};

/// Progress sink showing interim screens in the chat.
///
/// The first interim screen of a text message is sent as a new message; for
/// button presses the pressed message is edited. The final screen then
/// replaces whichever message the sink ended up owning.
pub struct TelegramProgress {
    bot: Bot,
    chat_id: ChatId,
    message_id: Mutex<Option<MessageId>>,
}

impl TelegramProgress {
    pub fn new(bot: Bot, chat_id: ChatId) -> Self {
        Self {
            bot,
            chat_id,
            message_id: Mutex::new(None),
        }
    }

    /// Sink that edits an existing message (the one whose button was pressed)
    pub fn editing(bot: Bot, chat_id: ChatId, message_id: MessageId) -> Self {
        Self {
            bot,
            chat_id,
            message_id: Mutex::new(Some(message_id)),
        }
    }

    pub fn message_id(&self) -> Option<MessageId> {
        *self.message_id.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_message_id(&self, message_id: MessageId) {
        *self.message_id.lock().unwrap_or_else(PoisonError::into_inner) = Some(message_id);
    }
}

#[async_trait]
impl ProgressSink for TelegramProgress {
    async fn working(&self, screen: &Screen) {
        match self.message_id() {
            Some(message_id) => {
                // No markup: the old buttons disappear while the provider works
                if let Err(e) = self
                    .bot
                    .edit_message_text(self.chat_id, message_id, screen.text.clone())
                    .await
                {
                    if !is_not_modified(&e) {
                        error!(user_id = %self.chat_id, error = %e, "Failed to show progress message");
                    }
                }
            }
            None => match self.bot.send_message(self.chat_id, screen.text.clone()).await {
                Ok(message) => self.set_message_id(message.id),
                Err(e) => {
                    error!(user_id = %self.chat_id, error = %e, "Failed to send progress message")
                }
            },
        }
    }
}

fn is_not_modified(error: &RequestError) -> bool {
    matches!(error, RequestError::Api(ApiError::MessageNotModified))
}

/// Send the final screen of an event, then the generated document if any.
pub async fn deliver(
    bot: &Bot,
    chat_id: ChatId,
    progress: &TelegramProgress,
    outcome: Outcome,
) -> Result<()> {
    let Outcome { screen, document } = outcome;

    match progress.message_id() {
        Some(message_id) => {
            let edited = bot
                .edit_message_text(chat_id, message_id, screen.text.clone())
                .reply_markup(to_keyboard(&screen))
                .await;
            match edited {
                Ok(_) => {}
                Err(e) if is_not_modified(&e) => {
                    debug!(user_id = %chat_id, "Screen unchanged");
                }
                Err(e) => {
                    error!(user_id = %chat_id, error = %e, "Failed to edit message, sending a new one");
                    send_screen(bot, chat_id, &screen).await?;
                }
            }
        }
        None => send_screen(bot, chat_id, &screen).await?,
    }

    if let Some(document) = document {
        let file = InputFile::file(document.path()).file_name(document.file_name.clone());
        if let Err(e) = bot.send_document(chat_id, file).await {
            error!(user_id = %chat_id, error = %e, "Failed to send document");
        }
        // The temporary file is removed here
        drop(document);
    }

    Ok(())
}

async fn send_screen(bot: &Bot, chat_id: ChatId, screen: &Screen) -> Result<()> {
    let mut request = bot.send_message(chat_id, screen.text.clone());
    if !screen.buttons.is_empty() {
        request = request.reply_markup(to_keyboard(screen));
    }
    request.await?;
    Ok(())
}
