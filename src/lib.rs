//! # WikiChat Telegram Bot
//!
//! A Telegram bot for searching Wikipedia, reading articles section by
//! section, switching language editions, translating content and exporting
//! articles as documents.

pub mod bot;
pub mod circuit_breaker;
pub mod config;
pub mod dialogue;
pub mod errors;
pub mod languages;
pub mod localization;
pub mod paginator;
pub mod session_store;
pub mod wiki;
