use anyhow::Result;

use wikichat::dialogue::{validate_query, ChatState, Session, MAX_QUERY_CHARS};
use wikichat::errors::{FlowError, SelectionError};
use wikichat::paginator::Pages;
use wikichat::wiki::Article;

fn article(title: &str, language: &str) -> Article {
    Article::new(title, language, "Summary.", "Intro\n== One ==\nBody\n", "url")
}

/// Search query validation
#[test]
fn test_query_validation() {
    assert_eq!(validate_query("  Alan Turing  ").unwrap(), "Alan Turing");
    assert_eq!(validate_query(""), Err(SelectionError::EmptyQuery));
    assert_eq!(validate_query(" \t "), Err(SelectionError::EmptyQuery));
    assert!(validate_query(&"a".repeat(MAX_QUERY_CHARS)).is_ok());
    assert_eq!(
        validate_query(&"a".repeat(MAX_QUERY_CHARS + 1)),
        Err(SelectionError::QueryTooLong)
    );
}

/// A fresh session starts idle with the default language
#[test]
fn test_default_session() {
    let session = Session::default();
    assert_eq!(session.state, ChatState::Init);
    assert_eq!(session.language, "en");
    assert!(session.search_results.is_empty());
    assert!(session.translation.is_none());
}

/// Replacing the article invalidates sections and translation
#[tokio::test]
async fn test_new_article_clears_derived_state() -> Result<()> {
    let mut session = Session::new();
    session.open_article(article("Alan Turing", "en"));
    session.article_sections = Some(Pages::from_body(&session.article()?.body));
    session.set_translation("fr", article("[fr] Alan Turing", "fr"));

    session.open_article(article("Turing machine", "en"));

    assert_eq!(session.state, ChatState::ViewingArticle);
    assert!(session.article_sections.is_none());
    assert!(session.translation.is_none());
    Ok(())
}

/// The cached translation sections are only reachable through the translation
#[test]
fn test_translation_sections_live_inside_translation() {
    let mut session = Session::new();
    session.open_article(article("Alan Turing", "en"));
    assert!(matches!(
        session.translated_sections_mut(),
        Err(FlowError::InvalidState(_))
    ));

    session.set_translation("de", article("[de] Alan Turing", "de"));
    session.translation_mut().unwrap().sections = Some(Pages::from_body("a\n== b ==\nc"));
    assert_eq!(session.translated_sections_mut().unwrap().len(), 2);

    // A new target replaces the whole slot, sections included
    session.set_translation("it", article("[it] Alan Turing", "it"));
    assert!(session.translation().unwrap().sections.is_none());
}

/// Clearing a search keeps the picked language
#[test]
fn test_clear_search_keeps_language() {
    let mut session = Session::new();
    session.language = "ja".to_string();
    session.search_query = Some("東京".to_string());
    session.search_results = vec!["東京都".to_string()];
    session.open_article(article("東京都", "ja"));

    session.clear_search();

    assert_eq!(session.language, "ja");
    assert!(session.search_query.is_none());
    assert!(session.search_results.is_empty());
    assert!(session.current_article.is_none());
}
