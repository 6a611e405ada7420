//! Navigation router: the single entry point for conversation events.
//!
//! `handle_event` locks the conversation, runs the handler for the event on a
//! draft of the session, commits the draft only if the handler succeeded, and
//! renders the resulting screen. Failures never reach the transport; they
//! become a retry-or-cancel screen or a notice over the unchanged screen.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::RenderConfig;
use crate::dialogue::{ChatState, Session};
use crate::errors::FlowError;
use crate::localization::detect_language;
use crate::session_store::{ConversationId, SessionStore};
use crate::wiki::{ContentProvider, GeneratedDocument};

use super::dialogue_manager::{self as handlers, Reply, Step};
use super::route::{ArticleAction, Route};
use super::ui_builder::{render, render_failure, render_with_notice, Notice, Screen};

/// Supported bot commands
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    Start,
    Help,
    Cancel,
}

/// An inbound conversation event, transport independent
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    Command(Command),
    UnknownCommand(String),
    Text(String),
    /// Raw route token from an inline button
    Button(String),
    /// Anything else the chat sent (stickers, photos, ...)
    Unsupported,
}

impl Event {
    /// Classify a text message: `/command[@botname]` or free text.
    pub fn from_text(text: &str) -> Self {
        let trimmed = text.trim();
        let Some(command) = trimmed.strip_prefix('/') else {
            return Event::Text(text.to_string());
        };
        let name = command
            .split_whitespace()
            .next()
            .unwrap_or_default()
            .split('@')
            .next()
            .unwrap_or_default()
            .to_lowercase();

        match name.as_str() {
            "start" => Event::Command(Command::Start),
            "help" => Event::Command(Command::Help),
            "cancel" => Event::Command(Command::Cancel),
            _ => Event::UnknownCommand(name),
        }
    }

    pub fn button(route: &Route) -> Self {
        Event::Button(route.encode())
    }
}

/// Receives interim screens while a handler waits on the content provider
#[async_trait]
pub trait ProgressSink: Send + Sync {
    async fn working(&self, screen: &Screen);
}

/// Progress sink that drops interim screens
pub struct NoProgress;

#[async_trait]
impl ProgressSink for NoProgress {
    async fn working(&self, _screen: &Screen) {}
}

/// Result of one event: the screen to show and maybe a file to send
#[derive(Debug)]
pub struct Outcome {
    pub screen: Screen,
    pub document: Option<GeneratedDocument>,
}

pub struct Router {
    provider: Arc<dyn ContentProvider>,
    store: Arc<SessionStore>,
    render: RenderConfig,
}

impl Router {
    pub fn new(
        provider: Arc<dyn ContentProvider>,
        store: Arc<SessionStore>,
        render: RenderConfig,
    ) -> Self {
        Self {
            provider,
            store,
            render,
        }
    }

    /// Apply one event to a conversation and render the result.
    ///
    /// Events for the same conversation are handled one at a time, in the
    /// order they acquire the session lock.
    pub async fn handle_event(
        &self,
        id: ConversationId,
        event: Event,
        ui_language: Option<&str>,
        progress: &dyn ProgressSink,
    ) -> Outcome {
        let mut guard = self.store.lock(id).await;

        if let Some(code) = ui_language {
            let detected = Some(detect_language(Some(code)).to_string());
            if guard.session().ui_language != detected {
                let mut draft = guard.draft();
                draft.ui_language = detected;
                guard.commit(draft);
            }
        }

        let mut draft = guard.draft();
        debug!(conversation = %id, state = ?draft.state, event = ?event, "Handling event");

        let (result, retry) = match event {
            Event::Button(token) => match token.parse::<Route>() {
                Ok(route) => {
                    let result = self.dispatch_route(&mut draft, &route, progress).await;
                    (result, Some(route))
                }
                Err(e) => {
                    warn!(conversation = %id, error = %e, "Undecodable button token");
                    (Err(FlowError::invalid_state(e.to_string())), None)
                }
            },
            input => (self.dispatch_input(&mut draft, input, progress).await, None),
        };

        match result {
            Ok(reply) => {
                let from = guard.session().state;
                if guard.commit(draft) {
                    info!(conversation = %id, from = ?from, to = ?guard.session().state, "Event applied");
                }
                let Reply { notice, document } = reply;
                let screen = match notice {
                    Some(notice) => render_with_notice(guard.session(), &notice, &self.render),
                    None => render(guard.session(), &self.render),
                };
                Outcome { screen, document }
            }
            Err(error) if error.is_retryable() => {
                warn!(conversation = %id, error = %error, "Provider call failed, session unchanged");
                guard.touch();
                Outcome {
                    screen: render_failure(guard.session(), &error, retry),
                    document: None,
                }
            }
            Err(error) => {
                debug!(conversation = %id, error = %error, "Event rejected");
                guard.touch();
                Outcome {
                    screen: render_with_notice(guard.session(), &Notice::Problem(error), &self.render),
                    document: None,
                }
            }
        }
    }

    async fn dispatch_input(
        &self,
        draft: &mut Session,
        event: Event,
        progress: &dyn ProgressSink,
    ) -> Result<Reply, FlowError> {
        match event {
            Event::Command(Command::Start) => Ok(handlers::start(draft)),
            Event::Command(Command::Help) => Ok(Reply::notice(Notice::Help)),
            Event::Command(Command::Cancel) => Ok(handlers::cancel(draft)),
            Event::UnknownCommand(_) => Ok(Reply::notice(Notice::UnknownCommand)),
            Event::Text(text) => match draft.state {
                ChatState::Searching | ChatState::NoResults => {
                    handlers::search(draft, &text, self.provider.as_ref(), progress).await
                }
                state => Err(FlowError::invalid_state(format!("text in {state:?}"))),
            },
            Event::Button(token) => Err(FlowError::invalid_state(format!("button {token}"))),
            Event::Unsupported => Err(FlowError::invalid_state("unsupported message")),
        }
    }

    async fn dispatch_route(
        &self,
        draft: &mut Session,
        route: &Route,
        progress: &dyn ProgressSink,
    ) -> Result<Reply, FlowError> {
        use ChatState::*;
        let provider = self.provider.as_ref();

        match (draft.state, route) {
            (_, Route::Cancel) => Ok(handlers::cancel(draft)),
            (_, Route::Refresh) => Ok(Reply::default()),
            (_, Route::NewSearch) => Ok(handlers::new_search(draft)),

            (SelectingLanguage, Route::PickLanguage(code)) => handlers::pick_language(draft, code),
            (NoResults | ViewingResults, Route::TryAgain) => Ok(handlers::try_again(draft)),
            (ViewingResults, Route::PickResult(index)) => {
                handlers::open_result(draft, *index, provider, progress).await
            }

            (ViewingArticle, Route::Article(action)) => {
                handlers::article_action(draft, *action, provider, progress).await
            }
            (ViewingTranslation, Route::Article(ArticleAction::Translate)) => {
                handlers::choose_other_translation(draft)
            }
            (ViewingArticle, Route::ViewLanguage(code)) => {
                handlers::view_language(draft, code, provider, progress).await
            }
            (ViewingArticle | ViewingTranslation, Route::TranslateTo(code)) => {
                handlers::translate_article(draft, code, provider, progress).await
            }

            (ReadingArticle, Route::Next) => handlers::step_section(draft, Step::Next),
            (ReadingArticle, Route::Prev) => handlers::step_section(draft, Step::Prev),
            (ReadingArticle, Route::ShowSection(index)) => handlers::show_section(draft, *index),
            (ReadingArticle, Route::TranslateSectionMenu(index)) => {
                handlers::translate_section_menu(draft, *index)
            }
            (ReadingArticle, Route::TranslateSection(index, code)) => {
                handlers::translate_section(draft, *index, code, provider, progress).await
            }

            (ViewingTranslation, Route::ReadTranslation) => handlers::read_translation(draft),
            (ViewingTranslation, Route::DownloadTranslation) => {
                handlers::download_translation(draft, provider, progress).await
            }
            (ReadingTranslation, Route::Next) => handlers::step_translated_section(draft, Step::Next),
            (ReadingTranslation, Route::Prev) => handlers::step_translated_section(draft, Step::Prev),

            (
                ViewingArticle | ReadingArticle | ViewingTranslation | ReadingTranslation,
                Route::BackToArticle,
            ) => handlers::back_to_article(draft),
            (ViewingArticle | ReadingTranslation, Route::BackToTranslation) => {
                handlers::back_to_translation(draft)
            }

            (state, route) => Err(FlowError::invalid_state(format!("{route:?} in {state:?}"))),
        }
    }
}
