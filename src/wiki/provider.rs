//! The capability surface the conversation core depends on.

use async_trait::async_trait;
use reqwest::Url;

use super::article::Article;
use super::document::GeneratedDocument;
use super::errors::ProviderError;

/// Search, fetch, translation and export operations used by the router.
///
/// Implementations own their timeouts; the router only sees the resulting
/// [`ProviderError`].
#[async_trait]
pub trait ContentProvider: Send + Sync {
    /// Candidate titles for a query, best match first. May be empty.
    async fn search_articles(&self, query: &str, language: &str)
        -> Result<Vec<String>, ProviderError>;

    /// Fetch one article. Missing pages are `ProviderError::NotFound`.
    async fn fetch_article(&self, title: &str, language: &str) -> Result<Article, ProviderError>;

    /// Fetch the same subject from another language edition.
    async fn fetch_article_in_language(
        &self,
        article: &Article,
        target_language: &str,
    ) -> Result<Article, ProviderError>;

    async fn translate(
        &self,
        text: &str,
        source_language: &str,
        target_language: &str,
    ) -> Result<String, ProviderError>;

    /// Export an article. The returned file is removed when dropped.
    async fn generate_document(&self, article: &Article) -> Result<GeneratedDocument, ProviderError>;

    fn share_link(&self, title: &str, language: &str) -> Result<String, ProviderError> {
        share_link(title, language)
    }
}

/// Canonical Wikipedia URL for a title.
pub fn share_link(title: &str, language: &str) -> Result<String, ProviderError> {
    let title = title.trim();
    if title.is_empty() {
        return Err(ProviderError::InvalidInput("empty title".to_string()));
    }
    if !crate::languages::is_wiki_language_code(language) {
        return Err(ProviderError::InvalidInput(format!(
            "invalid language code: {language}"
        )));
    }

    let mut url = Url::parse(&format!("https://{language}.wikipedia.org/wiki/"))
        .map_err(|e| ProviderError::InvalidInput(e.to_string()))?;
    url.path_segments_mut()
        .map_err(|_| ProviderError::InvalidInput("cannot build article path".to_string()))?
        .pop_if_empty()
        .push(&title.replace(' ', "_"));
    Ok(url.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_share_link_encodes_title() {
        assert_eq!(
            share_link("Alan Turing", "en").unwrap(),
            "https://en.wikipedia.org/wiki/Alan_Turing"
        );
        assert_eq!(
            share_link("C++/CLI", "fr").unwrap(),
            "https://fr.wikipedia.org/wiki/C++%2FCLI"
        );
    }

    #[test]
    fn test_share_link_rejects_malformed_input() {
        assert!(share_link("  ", "en").is_err());
        assert!(share_link("Turing", "en.evil.com/").is_err());
    }
}
