//! # Flow Error Types
//!
//! Every failure a handler can hit is converted into a [`FlowError`] before it
//! reaches the renderer. None of them is fatal: the router turns each kind into
//! a screen and the session stays in its pre-event state.

use thiserror::Error;

use crate::wiki::ProviderError;

/// Errors raised while handling one conversation event.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FlowError {
    /// Searched article or language edition is absent
    #[error("not found: {0}")]
    NotFound(String),
    /// Content provider did not answer in time
    #[error("provider timed out: {0}")]
    ProviderTimeout(String),
    /// Content provider failed (search, fetch, translation, document)
    #[error("provider failed: {0}")]
    ProviderFailure(String),
    /// Event does not apply to the current screen, e.g. a button from an old message
    #[error("event not valid on this screen: {0}")]
    InvalidState(String),
    /// Index or code no longer valid against the session data
    #[error("invalid selection: {0}")]
    InvalidSelection(#[from] SelectionError),
}

impl FlowError {
    /// Provider failures get a retry-or-cancel screen; everything else re-renders
    /// the current screen with a notice.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            FlowError::ProviderTimeout(_) | FlowError::ProviderFailure(_)
        )
    }

    pub fn invalid_state(event: impl Into<String>) -> Self {
        FlowError::InvalidState(event.into())
    }
}

/// Why a selection was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectionError {
    #[error("section {index} is out of range ({len} sections)")]
    SectionOutOfRange { index: usize, len: usize },
    #[error("section {requested} is not the section on screen ({current})")]
    StaleSection { requested: usize, current: usize },
    #[error("search result {index} is out of range ({len} results)")]
    ResultOutOfRange { index: usize, len: usize },
    #[error("language '{0}' is not offered here")]
    UnsupportedLanguage(String),
    #[error("article is already in '{0}'")]
    SameLanguage(String),
    #[error("search query is empty")]
    EmptyQuery,
    #[error("search query is too long")]
    QueryTooLong,
}

impl From<ProviderError> for FlowError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::NotFound(what) => FlowError::NotFound(what),
            ProviderError::Timeout(msg) => FlowError::ProviderTimeout(msg),
            ProviderError::InvalidInput(msg) => FlowError::NotFound(msg),
            other => FlowError::ProviderFailure(other.to_string()),
        }
    }
}
