//! Dialogue Manager module: one handler per transition of the conversation.
//!
//! Handlers work on a draft copy of the session. They validate everything the
//! event carries against the draft, announce provider calls through the
//! progress sink, and only touch the draft once the provider has answered, so
//! an early return leaves nothing half-done.

use tracing::{debug, info};

use crate::dialogue::{validate_query, ArticlePanel, ChatState, SectionPanel, Session};
use crate::errors::{FlowError, SelectionError};
use crate::languages::{is_search_language, is_translation_language};
use crate::paginator::{paginate, reassemble, Pages, Section};
use crate::wiki::{Article, ContentProvider, GeneratedDocument, ProviderError};

use super::route::ArticleAction;
use super::router::ProgressSink;
use super::ui_builder::{render_working, Notice, Work};

/// What a successful handler hands back besides the mutated draft
#[derive(Debug, Default)]
pub struct Reply {
    pub notice: Option<Notice>,
    pub document: Option<GeneratedDocument>,
}

impl Reply {
    pub fn notice(notice: Notice) -> Self {
        Self {
            notice: Some(notice),
            document: None,
        }
    }

    fn document(document: GeneratedDocument) -> Self {
        Self {
            notice: Some(Notice::DocumentReady),
            document: Some(document),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Step {
    Next,
    Prev,
}

async fn announce(progress: &dyn ProgressSink, draft: &Session, work: Work<'_>) {
    progress.working(&render_working(&work, draft.ui_language())).await;
}

/// `/start`: fresh session on the language picker
pub fn start(draft: &mut Session) -> Reply {
    draft.reset();
    draft.state = ChatState::SelectingLanguage;
    Reply::default()
}

/// `/cancel` or the Cancel button
pub fn cancel(draft: &mut Session) -> Reply {
    draft.reset();
    Reply::notice(Notice::Cancelled)
}

/// Drop search and article data and pick a language again
pub fn new_search(draft: &mut Session) -> Reply {
    draft.clear_search();
    draft.state = ChatState::SelectingLanguage;
    Reply::default()
}

pub fn pick_language(draft: &mut Session, code: &str) -> Result<Reply, FlowError> {
    if !is_search_language(code) {
        return Err(SelectionError::UnsupportedLanguage(code.to_string()).into());
    }
    draft.language = code.to_string();
    draft.clear_search();
    draft.state = ChatState::Searching;
    Ok(Reply::default())
}

/// Back to the query prompt, keeping the language
pub fn try_again(draft: &mut Session) -> Reply {
    draft.clear_search();
    draft.state = ChatState::Searching;
    Reply::default()
}

pub async fn search(
    draft: &mut Session,
    text: &str,
    provider: &dyn ContentProvider,
    progress: &dyn ProgressSink,
) -> Result<Reply, FlowError> {
    let query = validate_query(text)?;
    announce(
        progress,
        draft,
        Work::Search {
            query: &query,
            language: &draft.language,
        },
    )
    .await;

    let results = provider.search_articles(&query, &draft.language).await?;
    info!(
        query = %query,
        language = %draft.language,
        result_count = results.len(),
        "Search completed"
    );

    draft.clear_search();
    draft.state = if results.is_empty() {
        ChatState::NoResults
    } else {
        ChatState::ViewingResults
    };
    draft.search_query = Some(query);
    draft.search_results = results;
    Ok(Reply::default())
}

pub async fn open_result(
    draft: &mut Session,
    index: usize,
    provider: &dyn ContentProvider,
    progress: &dyn ProgressSink,
) -> Result<Reply, FlowError> {
    let title = draft.search_result(index)?.to_string();
    announce(progress, draft, Work::Article { title: &title }).await;

    let article = provider.fetch_article(&title, &draft.language).await?;
    debug!(title = %article.title, language = %article.language, "Article opened");
    draft.open_article(article);
    Ok(Reply::default())
}

pub async fn article_action(
    draft: &mut Session,
    action: ArticleAction,
    provider: &dyn ContentProvider,
    progress: &dyn ProgressSink,
) -> Result<Reply, FlowError> {
    let article = draft.article()?;

    match action {
        ArticleAction::Read => {
            let pages = Pages::from_body(&article.body);
            debug!(title = %article.title, sections = pages.len(), "Reading article");
            draft.article_sections = Some(pages);
            draft.section_panel = SectionPanel::Text;
            draft.state = ChatState::ReadingArticle;
        }
        ArticleAction::Languages => draft.article_panel = ArticlePanel::Languages,
        ArticleAction::Translate => draft.article_panel = ArticlePanel::TranslateTargets,
        ArticleAction::Link => {
            let url = provider.share_link(&article.title, &article.language)?;
            draft.article_panel = ArticlePanel::ShareLink(url);
        }
        ArticleAction::Download => {
            announce(progress, draft, Work::Document).await;
            let document = provider.generate_document(draft.article()?).await?;
            return Ok(Reply::document(document));
        }
    }
    Ok(Reply::default())
}

/// Switch to the article's edition in another language
pub async fn view_language(
    draft: &mut Session,
    code: &str,
    provider: &dyn ContentProvider,
    progress: &dyn ProgressSink,
) -> Result<Reply, FlowError> {
    let article = draft.article()?;
    if code == article.language || article.title_in(code).is_none() {
        return Err(SelectionError::UnsupportedLanguage(code.to_string()).into());
    }

    announce(progress, draft, Work::Edition { language: code }).await;
    let edition = provider.fetch_article_in_language(draft.article()?, code).await?;

    info!(title = %edition.title, language = %code, "Switched article language");
    draft.language = code.to_string();
    draft.open_article(edition);
    Ok(Reply::default())
}

/// Translate the whole article into `code`, reusing the cached translation
/// when it already is in that language.
pub async fn translate_article(
    draft: &mut Session,
    code: &str,
    provider: &dyn ContentProvider,
    progress: &dyn ProgressSink,
) -> Result<Reply, FlowError> {
    let article = draft.article()?;
    if !is_translation_language(code) {
        return Err(SelectionError::UnsupportedLanguage(code.to_string()).into());
    }
    if code == article.language {
        return Err(SelectionError::SameLanguage(code.to_string()).into());
    }

    if draft.translation_for(code).is_none() {
        announce(progress, draft, Work::Translate { language: code }).await;
        let translated = translate_article_content(provider, draft.article()?, code).await?;
        info!(title = %translated.title, language = %code, "Article translated");
        draft.set_translation(code, translated);
    }

    draft.article_panel = ArticlePanel::Summary;
    draft.state = ChatState::ViewingTranslation;
    Ok(Reply::default())
}

/// Translate title, summary and every section of an article.
///
/// The translated body is rebuilt with one `== heading ==` line per titled
/// section so it paginates like the original.
pub async fn translate_article_content(
    provider: &dyn ContentProvider,
    article: &Article,
    target: &str,
) -> Result<Article, ProviderError> {
    let source = article.language.as_str();

    let title = provider.translate(&article.title, source, target).await?;
    let summary = translate_optional(provider, &article.summary, source, target).await?;

    let mut sections = Vec::new();
    for section in paginate(&article.body) {
        let body = translate_optional(provider, section.text(), source, target).await?;
        let body = if body.is_empty() { body } else { format!("{body}\n") };
        let translated = match &section.heading {
            Some(heading) => {
                let heading = provider.translate(heading, source, target).await?;
                Section::titled(heading.trim(), section.level, body)
            }
            None => Section::untitled(body),
        };
        sections.push(translated);
    }

    Ok(Article::new(
        title.trim(),
        target,
        summary,
        reassemble(&sections),
        article.url.clone(),
    ))
}

async fn translate_optional(
    provider: &dyn ContentProvider,
    text: &str,
    source: &str,
    target: &str,
) -> Result<String, ProviderError> {
    if text.trim().is_empty() {
        return Ok(String::new());
    }
    provider.translate(text, source, target).await
}

/// The cursor must still be on the section a button was drawn for.
/// Section routes carry the index they were drawn for; only the current one is accepted.
fn check_section(pages: &mut Pages, index: usize) -> Result<(), SelectionError> {
    let current = pages.index();
    if index < pages.len() && index != current {
        return Err(SelectionError::StaleSection {
            requested: index,
            current,
        });
    }
    pages.select(index)?;
    Ok(())
}

fn step(pages: &mut Pages, step: Step) {
    let moved = match step {
        Step::Next => pages.next(),
        Step::Prev => pages.prev(),
    };
    if !moved {
        debug!(index = pages.index(), ?step, "Already at the boundary");
    }
}

pub fn step_section(draft: &mut Session, direction: Step) -> Result<Reply, FlowError> {
    step(draft.sections_mut()?, direction);
    draft.section_panel = SectionPanel::Text;
    Ok(Reply::default())
}

pub fn show_section(draft: &mut Session, index: usize) -> Result<Reply, FlowError> {
    check_section(draft.sections_mut()?, index)?;
    draft.section_panel = SectionPanel::Text;
    Ok(Reply::default())
}

pub fn translate_section_menu(draft: &mut Session, index: usize) -> Result<Reply, FlowError> {
    check_section(draft.sections_mut()?, index)?;
    draft.section_panel = SectionPanel::TranslateTargets;
    Ok(Reply::default())
}

/// Translate the current section for display only. Never cached.
pub async fn translate_section(
    draft: &mut Session,
    index: usize,
    code: &str,
    provider: &dyn ContentProvider,
    progress: &dyn ProgressSink,
) -> Result<Reply, FlowError> {
    check_section(draft.sections_mut()?, index)?;
    let source = draft.article()?.language.clone();
    if !is_translation_language(code) {
        return Err(SelectionError::UnsupportedLanguage(code.to_string()).into());
    }
    if code == source {
        return Err(SelectionError::SameLanguage(code.to_string()).into());
    }

    let section = draft.sections_mut()?.current().clone();
    announce(progress, draft, Work::Translate { language: code }).await;

    let heading = match &section.heading {
        Some(heading) => Some(provider.translate(heading, &source, code).await?),
        None => None,
    };
    let text = translate_optional(provider, section.text(), &source, code).await?;

    debug!(index, language = %code, "Section translated");
    draft.section_panel = SectionPanel::Translated {
        language: code.to_string(),
        heading,
        text,
    };
    Ok(Reply::default())
}

/// From the translation screen, back to the target picker of the article
pub fn choose_other_translation(draft: &mut Session) -> Result<Reply, FlowError> {
    draft.article()?;
    draft.article_panel = ArticlePanel::TranslateTargets;
    draft.state = ChatState::ViewingArticle;
    Ok(Reply::default())
}

pub fn read_translation(draft: &mut Session) -> Result<Reply, FlowError> {
    let translation = draft.translation_mut()?;
    translation.sections = Some(Pages::from_body(&translation.article.body));
    draft.state = ChatState::ReadingTranslation;
    Ok(Reply::default())
}

pub async fn download_translation(
    draft: &mut Session,
    provider: &dyn ContentProvider,
    progress: &dyn ProgressSink,
) -> Result<Reply, FlowError> {
    draft.translation()?;
    announce(progress, draft, Work::Document).await;
    let document = provider.generate_document(&draft.translation()?.article).await?;
    Ok(Reply::document(document))
}

pub fn step_translated_section(draft: &mut Session, direction: Step) -> Result<Reply, FlowError> {
    step(draft.translated_sections_mut()?, direction);
    Ok(Reply::default())
}

/// Back to the article summary. A cached translation stays available.
pub fn back_to_article(draft: &mut Session) -> Result<Reply, FlowError> {
    draft.article()?;
    draft.article_panel = ArticlePanel::Summary;
    draft.section_panel = SectionPanel::Text;
    draft.state = ChatState::ViewingArticle;
    Ok(Reply::default())
}

pub fn back_to_translation(draft: &mut Session) -> Result<Reply, FlowError> {
    draft.translation()?;
    draft.state = ChatState::ViewingTranslation;
    Ok(Reply::default())
}
