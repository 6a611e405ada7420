//! Article data returned by the content provider.

use std::collections::BTreeMap;

/// A Wikipedia article in one language.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Article {
    pub title: String,
    /// Language code the article is written in
    pub language: String,
    pub summary: String,
    /// Full plain-text body, headings included
    pub body: String,
    pub url: String,
    /// Language code -> title of the same subject in that language
    available_languages: BTreeMap<String, String>,
}

impl Article {
    pub fn new(
        title: impl Into<String>,
        language: impl Into<String>,
        summary: impl Into<String>,
        body: impl Into<String>,
        url: impl Into<String>,
    ) -> Self {
        let mut article = Self {
            title: title.into(),
            language: language.into(),
            summary: summary.into(),
            body: body.into(),
            url: url.into(),
            available_languages: BTreeMap::new(),
        };
        article.normalize_languages();
        article
    }

    /// Attach the alternate-language map. The entry for the article's own
    /// language always ends up pointing at `title`.
    pub fn with_languages<I, K, V>(mut self, languages: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.available_languages = languages
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        self.normalize_languages();
        self
    }

    fn normalize_languages(&mut self) {
        self.available_languages
            .insert(self.language.clone(), self.title.clone());
    }

    /// Alternate languages only, the article's own language excluded.
    pub fn alternate_languages(&self) -> impl Iterator<Item = (&str, &str)> {
        self.available_languages
            .iter()
            .filter(move |(code, _)| **code != self.language)
            .map(|(code, title)| (code.as_str(), title.as_str()))
    }

    pub fn title_in(&self, language: &str) -> Option<&str> {
        self.available_languages.get(language).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_own_language_entry_matches_title() {
        let article = Article::new("Alan Turing", "en", "s", "b", "u")
            .with_languages([("en", "Turing"), ("fr", "Alan Turing (fr)")]);

        assert_eq!(article.title_in("en"), Some("Alan Turing"));
        assert_eq!(article.title_in("fr"), Some("Alan Turing (fr)"));
    }

    #[test]
    fn test_alternate_languages_exclude_source() {
        let article = Article::new("Turing", "en", "", "", "")
            .with_languages([("de", "Turing"), ("es", "Turing")]);
        let codes: Vec<&str> = article.alternate_languages().map(|(c, _)| c).collect();
        assert_eq!(codes, vec!["de", "es"]);
    }
}
