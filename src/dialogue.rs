//! Conversation state for one chat: the current screen plus the data gathered
//! along the way (language, query, results, article, sections, translation).

use crate::errors::{FlowError, SelectionError};
use crate::languages::DEFAULT_LANGUAGE;
use crate::paginator::Pages;
use crate::wiki::Article;

/// Maximum accepted search query length, in characters
pub const MAX_QUERY_CHARS: usize = 300;

/// Screen the conversation is on
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ChatState {
    #[default]
    Init,
    SelectingLanguage,
    Searching,
    /// Search returned nothing; offers "try again" and "change language"
    NoResults,
    ViewingResults,
    ViewingArticle,
    ReadingArticle,
    ViewingTranslation,
    ReadingTranslation,
}

/// What the article screen shows below the title
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum ArticlePanel {
    #[default]
    Summary,
    /// Other language editions of the article
    Languages,
    /// Translation target picker
    TranslateTargets,
    ShareLink(String),
}

/// What the reading screen shows for the current section
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum SectionPanel {
    #[default]
    Text,
    /// Translation target picker for the current section
    TranslateTargets,
    /// One-off translation of the current section, never cached
    Translated {
        language: String,
        heading: Option<String>,
        text: String,
    },
}

/// The single cached article translation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Translation {
    pub language: String,
    pub article: Article,
    /// Present once the translation is being read
    pub sections: Option<Pages>,
}

/// Everything the bot remembers about one conversation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Session {
    pub state: ChatState,
    /// Interface language reported by the chat client
    pub ui_language: Option<String>,
    /// Search and display language
    pub language: String,
    pub search_query: Option<String>,
    pub search_results: Vec<String>,
    pub current_article: Option<Article>,
    pub article_sections: Option<Pages>,
    pub translation: Option<Translation>,
    pub article_panel: ArticlePanel,
    pub section_panel: SectionPanel,
    /// Bumped on every committed change
    pub revision: u64,
}

impl Default for Session {
    fn default() -> Self {
        Self {
            state: ChatState::Init,
            ui_language: None,
            language: DEFAULT_LANGUAGE.to_string(),
            search_query: None,
            search_results: Vec::new(),
            current_article: None,
            article_sections: None,
            translation: None,
            article_panel: ArticlePanel::Summary,
            section_panel: SectionPanel::Text,
            revision: 0,
        }
    }
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ui_language(&self) -> Option<&str> {
        self.ui_language.as_deref()
    }

    /// Back to `Init`, keeping only the interface language and revision.
    pub fn reset(&mut self) {
        *self = Self {
            ui_language: self.ui_language.take(),
            revision: self.revision,
            ..Self::default()
        };
    }

    /// Drop search, article and translation data, keeping the search language.
    pub fn clear_search(&mut self) {
        self.search_query = None;
        self.search_results.clear();
        self.clear_article();
    }

    fn clear_article(&mut self) {
        self.current_article = None;
        self.article_sections = None;
        self.translation = None;
        self.article_panel = ArticlePanel::Summary;
        self.section_panel = SectionPanel::Text;
    }

    /// Make `article` current. Everything derived from the previous one goes.
    pub fn open_article(&mut self, article: Article) {
        self.clear_article();
        self.current_article = Some(article);
        self.state = ChatState::ViewingArticle;
    }

    pub fn article(&self) -> Result<&Article, FlowError> {
        self.current_article
            .as_ref()
            .ok_or_else(|| FlowError::invalid_state("no article is open"))
    }

    pub fn sections_mut(&mut self) -> Result<&mut Pages, FlowError> {
        self.article_sections
            .as_mut()
            .ok_or_else(|| FlowError::invalid_state("article is not being read"))
    }

    /// Replace the cached translation. Only one is kept at a time.
    pub fn set_translation(&mut self, language: impl Into<String>, article: Article) {
        self.translation = Some(Translation {
            language: language.into(),
            article,
            sections: None,
        });
    }

    /// Cached translation for `language`, if that is the one held.
    pub fn translation_for(&self, language: &str) -> Option<&Translation> {
        self.translation
            .as_ref()
            .filter(|t| t.language == language)
    }

    pub fn translation(&self) -> Result<&Translation, FlowError> {
        self.translation
            .as_ref()
            .ok_or_else(|| FlowError::invalid_state("no translation available"))
    }

    pub fn translation_mut(&mut self) -> Result<&mut Translation, FlowError> {
        self.translation
            .as_mut()
            .ok_or_else(|| FlowError::invalid_state("no translation available"))
    }

    pub fn translated_sections_mut(&mut self) -> Result<&mut Pages, FlowError> {
        self.translation_mut()?
            .sections
            .as_mut()
            .ok_or_else(|| FlowError::invalid_state("translation is not being read"))
    }

    /// Resolve a search result button against the stored results.
    pub fn search_result(&self, index: usize) -> Result<&str, SelectionError> {
        self.search_results
            .get(index)
            .map(String::as_str)
            .ok_or(SelectionError::ResultOutOfRange {
                index,
                len: self.search_results.len(),
            })
    }
}

/// Validates a search query input
pub fn validate_query(query: &str) -> Result<String, SelectionError> {
    let trimmed = query.trim();

    if trimmed.is_empty() {
        return Err(SelectionError::EmptyQuery);
    }

    if trimmed.chars().count() > MAX_QUERY_CHARS {
        return Err(SelectionError::QueryTooLong);
    }

    Ok(trimmed.to_string())
}
