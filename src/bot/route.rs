//! Button route tokens.
//!
//! Every inline button carries a [`Route`] encoded as a short ASCII string
//! (`lang:fr`, `res:2`, `ts:3:de`). Tokens are decoded once when a callback
//! arrives and the router matches on the enum; the index or language code they
//! carry is re-validated against the session before use.

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::languages::is_wiki_language_code;

/// Telegram rejects callback data longer than this
pub const MAX_TOKEN_BYTES: usize = 64;

/// Actions offered on the article screen
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ArticleAction {
    Read,
    Languages,
    Translate,
    Download,
    Link,
}

impl ArticleAction {
    fn as_str(self) -> &'static str {
        match self {
            ArticleAction::Read => "read",
            ArticleAction::Languages => "langs",
            ArticleAction::Translate => "tr",
            ArticleAction::Download => "dl",
            ArticleAction::Link => "link",
        }
    }
}

/// Decoded button payload
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Route {
    /// Search language picked on the language screen
    PickLanguage(String),
    /// Search result by position
    PickResult(usize),
    Article(ArticleAction),
    /// Open the article's edition in another language
    ViewLanguage(String),
    /// Translate the whole article
    TranslateTo(String),
    Next,
    Prev,
    /// Back to the plain text of section `i`
    ShowSection(usize),
    /// Translation targets for section `i`
    TranslateSectionMenu(usize),
    TranslateSection(usize, String),
    ReadTranslation,
    DownloadTranslation,
    BackToArticle,
    BackToTranslation,
    NewSearch,
    TryAgain,
    Refresh,
    Cancel,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteError {
    #[error("unknown route token: {0}")]
    Unknown(String),
    #[error("malformed argument in route token: {0}")]
    BadArgument(String),
}

impl Route {
    pub fn encode(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Route::PickLanguage(code) => write!(f, "lang:{code}"),
            Route::PickResult(index) => write!(f, "res:{index}"),
            Route::Article(action) => write!(f, "act:{}", action.as_str()),
            Route::ViewLanguage(code) => write!(f, "vl:{code}"),
            Route::TranslateTo(code) => write!(f, "tr:{code}"),
            Route::Next => f.write_str("nx"),
            Route::Prev => f.write_str("pv"),
            Route::ShowSection(index) => write!(f, "sec:{index}"),
            Route::TranslateSectionMenu(index) => write!(f, "tsm:{index}"),
            Route::TranslateSection(index, code) => write!(f, "ts:{index}:{code}"),
            Route::ReadTranslation => f.write_str("rt"),
            Route::DownloadTranslation => f.write_str("dt"),
            Route::BackToArticle => f.write_str("ba"),
            Route::BackToTranslation => f.write_str("bt"),
            Route::NewSearch => f.write_str("ns"),
            Route::TryAgain => f.write_str("ta"),
            Route::Refresh => f.write_str("rf"),
            Route::Cancel => f.write_str("cx"),
        }
    }
}

fn language_arg(token: &str, code: &str) -> Result<String, RouteError> {
    if is_wiki_language_code(code) {
        Ok(code.to_string())
    } else {
        Err(RouteError::BadArgument(token.to_string()))
    }
}

fn index_arg(token: &str, index: &str) -> Result<usize, RouteError> {
    index
        .parse()
        .map_err(|_| RouteError::BadArgument(token.to_string()))
}

impl FromStr for Route {
    type Err = RouteError;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        if token.len() > MAX_TOKEN_BYTES {
            return Err(RouteError::Unknown(token.to_string()));
        }

        let (kind, arg) = match token.split_once(':') {
            Some((kind, arg)) => (kind, Some(arg)),
            None => (token, None),
        };

        let route = match (kind, arg) {
            ("lang", Some(code)) => Route::PickLanguage(language_arg(token, code)?),
            ("res", Some(index)) => Route::PickResult(index_arg(token, index)?),
            ("act", Some(action)) => Route::Article(match action {
                "read" => ArticleAction::Read,
                "langs" => ArticleAction::Languages,
                "tr" => ArticleAction::Translate,
                "dl" => ArticleAction::Download,
                "link" => ArticleAction::Link,
                _ => return Err(RouteError::BadArgument(token.to_string())),
            }),
            ("vl", Some(code)) => Route::ViewLanguage(language_arg(token, code)?),
            ("tr", Some(code)) => Route::TranslateTo(language_arg(token, code)?),
            ("sec", Some(index)) => Route::ShowSection(index_arg(token, index)?),
            ("tsm", Some(index)) => Route::TranslateSectionMenu(index_arg(token, index)?),
            ("ts", Some(rest)) => {
                let (index, code) = rest
                    .split_once(':')
                    .ok_or_else(|| RouteError::BadArgument(token.to_string()))?;
                Route::TranslateSection(index_arg(token, index)?, language_arg(token, code)?)
            }
            ("nx", None) => Route::Next,
            ("pv", None) => Route::Prev,
            ("rt", None) => Route::ReadTranslation,
            ("dt", None) => Route::DownloadTranslation,
            ("ba", None) => Route::BackToArticle,
            ("bt", None) => Route::BackToTranslation,
            ("ns", None) => Route::NewSearch,
            ("ta", None) => Route::TryAgain,
            ("rf", None) => Route::Refresh,
            ("cx", None) => Route::Cancel,
            _ => return Err(RouteError::Unknown(token.to_string())),
        };

        Ok(route)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decodes_tokens_with_arguments() {
        assert_eq!("lang:fr".parse(), Ok(Route::PickLanguage("fr".into())));
        assert_eq!("res:2".parse(), Ok(Route::PickResult(2)));
        assert_eq!("act:dl".parse(), Ok(Route::Article(ArticleAction::Download)));
        assert_eq!(
            "ts:3:zh-yue".parse(),
            Ok(Route::TranslateSection(3, "zh-yue".into()))
        );
        assert_eq!("nx".parse(), Ok(Route::Next));
    }

    #[test]
    fn test_encode_matches_decode() {
        let routes = [
            Route::ViewLanguage("de".into()),
            Route::TranslateSectionMenu(12),
            Route::Article(ArticleAction::Languages),
            Route::Cancel,
        ];
        for route in routes {
            assert_eq!(route.encode().parse::<Route>(), Ok(route));
        }
    }

    #[test]
    fn test_rejects_malformed_tokens() {
        assert!(matches!("res:-1".parse::<Route>(), Err(RouteError::BadArgument(_))));
        assert!(matches!("lang:EN".parse::<Route>(), Err(RouteError::BadArgument(_))));
        assert!(matches!("ts:3".parse::<Route>(), Err(RouteError::BadArgument(_))));
        assert!(matches!("act:fly".parse::<Route>(), Err(RouteError::BadArgument(_))));
        assert!(matches!("nx:1".parse::<Route>(), Err(RouteError::Unknown(_))));
        assert!(matches!("edit_0".parse::<Route>(), Err(RouteError::Unknown(_))));
    }

    #[test]
    fn test_tokens_fit_callback_limit() {
        let longest = Route::TranslateSection(usize::MAX, "abcdefghijkl".into());
        assert!(longest.encode().len() <= MAX_TOKEN_BYTES);
    }
}
