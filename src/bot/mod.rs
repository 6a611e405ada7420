//! Bot module for handling Telegram interactions
//!
//! This module is split into several submodules:
//! - `router`: event entry point, per-state dispatch and commit of session drafts
//! - `dialogue_manager`: one handler per conversation transition
//! - `ui_builder`: renders sessions into screens and keyboards
//! - `route`: button route tokens
//! - `message_handler` / `callback_handler`: teloxide endpoints
//! - `delivery`: sends screens, progress messages and documents

pub mod callback_handler;
pub mod delivery;
pub mod dialogue_manager;
pub mod message_handler;
pub mod route;
pub mod router;
pub mod ui_builder;

// Re-export main handler functions for use in main.rs
pub use callback_handler::callback_handler;
pub use message_handler::message_handler;

pub use route::{ArticleAction, Route};
pub use router::{Command, Event, NoProgress, Outcome, ProgressSink, Router};
pub use ui_builder::{Button, Notice, Screen};
