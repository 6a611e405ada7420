//! UI Builder module: turns a session into the text and buttons of one screen.
//!
//! Rendering is a pure function of the session; Telegram types only appear in
//! [`to_keyboard`].

use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};

use crate::config::RenderConfig;
use crate::dialogue::{ArticlePanel, ChatState, SectionPanel, Session};
use crate::errors::{FlowError, SelectionError};
use crate::languages::{is_known_language, language_name, translation_targets, SEARCH_LANGUAGES};
use crate::localization::{t_args_lang, t_lang};
use crate::paginator::Pages;
use crate::wiki::Article;

use super::route::{ArticleAction, Route};

/// One inline button
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Button {
    pub label: String,
    pub route: Route,
}

impl Button {
    pub fn new(label: impl Into<String>, route: Route) -> Self {
        Self {
            label: label.into(),
            route,
        }
    }
}

/// Display text plus button rows
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Screen {
    pub text: String,
    pub buttons: Vec<Vec<Button>>,
}

impl Screen {
    /// Every route on the screen, row by row
    pub fn routes(&self) -> impl Iterator<Item = &Route> {
        self.buttons.iter().flatten().map(|button| &button.route)
    }

    pub fn has_route(&self, route: &Route) -> bool {
        self.routes().any(|r| r == route)
    }
}

/// Message shown above the current screen
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Notice {
    Help,
    Cancelled,
    DocumentReady,
    UnknownCommand,
    Problem(FlowError),
}

/// Interim screen shown while the content provider works
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Work<'a> {
    Search { query: &'a str, language: &'a str },
    Article { title: &'a str },
    Edition { language: &'a str },
    Translate { language: &'a str },
    Document,
}

/// Text parts before length limiting. Header and footer are never cut.
#[derive(Default)]
struct Parts {
    header: String,
    body: String,
    footer: String,
}

type Rows = Vec<Vec<Button>>;

pub fn render(session: &Session, config: &RenderConfig) -> Screen {
    let (parts, buttons) = layout(session, config);
    Screen {
        text: compose(&parts, config.max_message_chars, session.ui_language()),
        buttons: shorten_labels(buttons, config.button_label_chars),
    }
}

pub fn render_with_notice(session: &Session, notice: &Notice, config: &RenderConfig) -> Screen {
    let (mut parts, buttons) = layout(session, config);
    let notice = notice_text(session, notice);
    parts.header = join_nonempty(&[&notice, &parts.header]);
    Screen {
        text: compose(&parts, config.max_message_chars, session.ui_language()),
        buttons: shorten_labels(buttons, config.button_label_chars),
    }
}

/// Retry-or-cancel screen after a provider failure. Without a route to retry,
/// the retry button re-renders the current screen.
pub fn render_failure(session: &Session, error: &FlowError, retry: Option<Route>) -> Screen {
    let ui = session.ui_language();
    let headline = match error {
        FlowError::ProviderTimeout(_) => t_lang("error-timeout", ui),
        _ => t_lang("error-provider", ui),
    };
    let retry = match retry {
        Some(route) => Button::new(t_lang("button-retry", ui), route),
        None => Button::new(t_lang("button-refresh", ui), Route::Refresh),
    };

    Screen {
        text: format!("{}\n\n{}", headline, t_lang("error-retry-hint", ui)),
        buttons: vec![vec![retry, Button::new(t_lang("button-cancel", ui), Route::Cancel)]],
    }
}

pub fn render_working(work: &Work<'_>, ui_language: Option<&str>) -> Screen {
    let text = match *work {
        Work::Search { query, language } => t_args_lang(
            "working-search",
            &[("query", query), ("language", language_name(language))],
            ui_language,
        ),
        Work::Article { title } => t_args_lang("working-article", &[("title", title)], ui_language),
        Work::Edition { language } => t_args_lang(
            "working-edition",
            &[("language", language_name(language))],
            ui_language,
        ),
        Work::Translate { language } => t_args_lang(
            "working-translate",
            &[("language", language_name(language))],
            ui_language,
        ),
        Work::Document => t_lang("working-document", ui_language),
    };
    Screen {
        text,
        buttons: Vec::new(),
    }
}

/// Telegram inline keyboard for a screen
pub fn to_keyboard(screen: &Screen) -> InlineKeyboardMarkup {
    let rows = screen.buttons.iter().map(|row| {
        row.iter()
            .map(|button| InlineKeyboardButton::callback(button.label.clone(), button.route.encode()))
            .collect::<Vec<_>>()
    });
    InlineKeyboardMarkup::new(rows)
}

fn layout(session: &Session, config: &RenderConfig) -> (Parts, Rows) {
    let ui = session.ui_language();
    match session.state {
        ChatState::Init => (
            Parts {
                body: t_lang("idle", ui),
                ..Parts::default()
            },
            Vec::new(),
        ),
        ChatState::SelectingLanguage => language_picker(ui),
        ChatState::Searching => (
            Parts {
                body: t_args_lang(
                    "search-prompt",
                    &[("language", language_name(&session.language))],
                    ui,
                ),
                ..Parts::default()
            },
            vec![
                vec![Button::new(t_lang("button-change-language", ui), Route::NewSearch)],
                vec![cancel_button(ui)],
            ],
        ),
        ChatState::NoResults => {
            let query = session.search_query.as_deref().unwrap_or_default();
            let body = format!(
                "{}\n{}",
                t_args_lang(
                    "no-results",
                    &[("query", query), ("language", language_name(&session.language))],
                    ui,
                ),
                t_lang("no-results-hint", ui)
            );
            (
                Parts {
                    body,
                    ..Parts::default()
                },
                vec![
                    vec![
                        Button::new(t_lang("button-try-again", ui), Route::TryAgain),
                        Button::new(t_lang("button-change-language", ui), Route::NewSearch),
                    ],
                    vec![cancel_button(ui)],
                ],
            )
        }
        ChatState::ViewingResults => results(session),
        ChatState::ViewingArticle => match &session.current_article {
            Some(article) => article_screen(session, article, config),
            None => missing_data(ui),
        },
        ChatState::ReadingArticle => match (&session.current_article, &session.article_sections) {
            (Some(article), Some(pages)) => reading_screen(session, article, pages),
            _ => missing_data(ui),
        },
        ChatState::ViewingTranslation => match (&session.current_article, &session.translation) {
            (Some(article), Some(translation)) => {
                translation_screen(session, article, &translation.article, config)
            }
            _ => missing_data(ui),
        },
        ChatState::ReadingTranslation => match session.translation.as_ref().and_then(|t| {
            t.sections.as_ref().map(|pages| (&t.article, pages))
        }) {
            Some((article, pages)) => translated_reading_screen(session, article, pages),
            None => missing_data(ui),
        },
    }
}

fn language_picker(ui: Option<&str>) -> (Parts, Rows) {
    let mut rows: Rows = SEARCH_LANGUAGES
        .chunks(2)
        .map(|pair| {
            pair.iter()
                .map(|code| Button::new(language_name(code), Route::PickLanguage(code.to_string())))
                .collect()
        })
        .collect();
    rows.push(vec![cancel_button(ui)]);

    (
        Parts {
            header: format!("{}\n{}", t_lang("welcome-title", ui), t_lang("welcome-description", ui)),
            body: t_lang("choose-language", ui),
            ..Parts::default()
        },
        rows,
    )
}

fn results(session: &Session) -> (Parts, Rows) {
    let ui = session.ui_language();
    let query = session.search_query.as_deref().unwrap_or_default();

    let body = session
        .search_results
        .iter()
        .enumerate()
        .map(|(i, title)| format!("{}. {}", i + 1, title))
        .collect::<Vec<_>>()
        .join("\n");

    let mut rows: Rows = session
        .search_results
        .iter()
        .enumerate()
        .map(|(i, title)| vec![Button::new(title.clone(), Route::PickResult(i))])
        .collect();
    rows.push(vec![
        Button::new(t_lang("button-new-search", ui), Route::NewSearch),
        cancel_button(ui),
    ]);

    (
        Parts {
            header: t_args_lang(
                "results-title",
                &[("query", query), ("language", language_name(&session.language))],
                ui,
            ),
            body,
            ..Parts::default()
        },
        rows,
    )
}

fn known_alternates(article: &Article) -> Vec<(&str, &str)> {
    article
        .alternate_languages()
        .filter(|(code, _)| is_known_language(code))
        .collect()
}

fn article_screen(session: &Session, article: &Article, config: &RenderConfig) -> (Parts, Rows) {
    let ui = session.ui_language();
    let header = format!(
        "📚 {}\n{}",
        article.title,
        t_args_lang("article-language", &[("language", language_name(&article.language))], ui)
    );
    let back = vec![Button::new(t_lang("button-back-article", ui), Route::BackToArticle)];

    let (body, rows) = match &session.article_panel {
        ArticlePanel::Summary => {
            let mut rows = vec![vec![Button::new(
                t_lang("button-read", ui),
                Route::Article(ArticleAction::Read),
            )]];
            if !known_alternates(article).is_empty() {
                rows.push(vec![Button::new(
                    t_lang("button-languages", ui),
                    Route::Article(ArticleAction::Languages),
                )]);
            }
            rows.push(vec![Button::new(
                t_lang("button-translate", ui),
                Route::Article(ArticleAction::Translate),
            )]);
            rows.push(vec![
                Button::new(t_lang("button-download", ui), Route::Article(ArticleAction::Download)),
                Button::new(t_lang("button-link", ui), Route::Article(ArticleAction::Link)),
            ]);
            if let Some(translation) = &session.translation {
                rows.push(vec![Button::new(
                    t_args_lang(
                        "button-view-translation",
                        &[("language", language_name(&translation.language))],
                        ui,
                    ),
                    Route::BackToTranslation,
                )]);
            }
            rows.push(vec![
                Button::new(t_lang("button-new-search", ui), Route::NewSearch),
                cancel_button(ui),
            ]);
            (summary_text(&article.summary, config.summary_chars, ui), rows)
        }
        ArticlePanel::Languages => {
            let alternates = known_alternates(article);
            if alternates.is_empty() {
                (t_lang("article-no-languages", ui), vec![back])
            } else {
                let list = alternates
                    .iter()
                    .map(|(code, title)| format!("• {}: {}", language_name(code), title))
                    .collect::<Vec<_>>()
                    .join("\n");
                let mut rows: Rows = alternates
                    .chunks(2)
                    .map(|pair| {
                        pair.iter()
                            .map(|(code, title)| {
                                Button::new(
                                    format!("{} - {}", language_name(code), title),
                                    Route::ViewLanguage(code.to_string()),
                                )
                            })
                            .collect()
                    })
                    .collect();
                rows.push(back);
                (format!("{}\n{}", t_lang("article-languages", ui), list), rows)
            }
        }
        ArticlePanel::TranslateTargets => {
            let mut rows = target_rows(&article.language, |code| Route::TranslateTo(code.to_string()));
            rows.push(back);
            (t_lang("article-translate-prompt", ui), rows)
        }
        ArticlePanel::ShareLink(url) => (format!("{}\n{}", t_lang("article-link", ui), url), vec![back]),
    };

    (
        Parts {
            header,
            body,
            ..Parts::default()
        },
        rows,
    )
}

fn reading_screen(session: &Session, article: &Article, pages: &Pages) -> (Parts, Rows) {
    let ui = session.ui_language();
    let index = pages.index();
    let section = pages.current();
    let position = position_text(pages, ui);
    let heading = section_heading(pages, ui);

    let (parts, mut rows) = match &session.section_panel {
        SectionPanel::Text => (
            Parts {
                header: format!("📖 {}\n\n{}", article.title, heading),
                body: section_text(section.text(), ui),
                footer: position,
            },
            vec![
                vec![Button::new(
                    t_lang("button-translate-section", ui),
                    Route::TranslateSectionMenu(index),
                )],
                vec![Button::new(t_lang("button-back-article", ui), Route::BackToArticle)],
            ],
        ),
        SectionPanel::TranslateTargets => {
            let mut rows = target_rows(&article.language, |code| {
                Route::TranslateSection(index, code.to_string())
            });
            rows.push(vec![Button::new(
                t_lang("button-show-original", ui),
                Route::ShowSection(index),
            )]);
            (
                Parts {
                    header: format!("📖 {}\n\n{}", article.title, heading),
                    body: section_text(section.text(), ui),
                    footer: format!("{}\n\n{}", t_lang("section-translate-prompt", ui), position),
                },
                rows,
            )
        }
        SectionPanel::Translated {
            language,
            heading: translated_heading,
            text,
        } => (
            Parts {
                header: format!(
                    "📖 {}\n\n{}\n{}",
                    article.title,
                    t_args_lang("section-translated", &[("language", language_name(language))], ui),
                    translated_heading.as_deref().unwrap_or(&heading)
                ),
                body: section_text(text.trim(), ui),
                footer: position,
            },
            vec![
                vec![Button::new(t_lang("button-show-original", ui), Route::ShowSection(index))],
                vec![Button::new(t_lang("button-back-article", ui), Route::BackToArticle)],
            ],
        ),
    };

    if !matches!(session.section_panel, SectionPanel::TranslateTargets) {
        if let Some(nav) = navigation_row(pages, ui) {
            rows.insert(0, nav);
        }
    }
    (parts, rows)
}

fn translation_screen(
    session: &Session,
    original: &Article,
    translated: &Article,
    config: &RenderConfig,
) -> (Parts, Rows) {
    let ui = session.ui_language();
    let header = format!(
        "🌐 {}\n{}",
        translated.title,
        t_args_lang(
            "translation-title",
            &[
                ("source", language_name(&original.language)),
                ("target", language_name(&translated.language)),
            ],
            ui,
        )
    );
    let rows = vec![
        vec![Button::new(t_lang("button-read-translation", ui), Route::ReadTranslation)],
        vec![Button::new(t_lang("button-download-translation", ui), Route::DownloadTranslation)],
        vec![Button::new(
            t_lang("button-other-translation", ui),
            Route::Article(ArticleAction::Translate),
        )],
        vec![Button::new(t_lang("button-back-article", ui), Route::BackToArticle)],
        vec![
            Button::new(t_lang("button-new-search", ui), Route::NewSearch),
            cancel_button(ui),
        ],
    ];
    (
        Parts {
            header,
            body: summary_text(&translated.summary, config.summary_chars, ui),
            ..Parts::default()
        },
        rows,
    )
}

fn translated_reading_screen(session: &Session, translated: &Article, pages: &Pages) -> (Parts, Rows) {
    let ui = session.ui_language();
    let mut rows = Vec::new();
    if let Some(nav) = navigation_row(pages, ui) {
        rows.push(nav);
    }
    rows.push(vec![Button::new(t_lang("button-back-translation", ui), Route::BackToTranslation)]);
    rows.push(vec![Button::new(t_lang("button-back-article", ui), Route::BackToArticle)]);

    (
        Parts {
            header: format!("🌐 {}\n\n{}", translated.title, section_heading(pages, ui)),
            body: section_text(pages.current().text(), ui),
            footer: position_text(pages, ui),
        },
        rows,
    )
}

fn missing_data(ui: Option<&str>) -> (Parts, Rows) {
    (
        Parts {
            body: t_lang("guidance-init", ui),
            ..Parts::default()
        },
        vec![vec![Button::new(t_lang("button-new-search", ui), Route::NewSearch)]],
    )
}

fn cancel_button(ui: Option<&str>) -> Button {
    Button::new(t_lang("button-cancel", ui), Route::Cancel)
}

/// Translation targets three per row, the article's own language excluded
fn target_rows(source: &str, route: impl Fn(&str) -> Route) -> Rows {
    translation_targets(source)
        .chunks(3)
        .map(|codes| {
            codes
                .iter()
                .map(|code| Button::new(language_name(code), route(*code)))
                .collect()
        })
        .collect()
}

fn navigation_row(pages: &Pages, ui: Option<&str>) -> Option<Vec<Button>> {
    let mut row = Vec::new();
    if !pages.is_first() {
        row.push(Button::new(t_lang("button-prev", ui), Route::Prev));
    }
    if !pages.is_last() {
        row.push(Button::new(t_lang("button-next", ui), Route::Next));
    }
    (!row.is_empty()).then_some(row)
}

fn section_heading(pages: &Pages, ui: Option<&str>) -> String {
    match &pages.current().heading {
        Some(heading) => heading.clone(),
        None => t_lang("section-intro", ui),
    }
}

fn section_text(text: &str, ui: Option<&str>) -> String {
    if text.is_empty() {
        t_lang("section-empty", ui)
    } else {
        text.to_string()
    }
}

fn position_text(pages: &Pages, ui: Option<&str>) -> String {
    let current = (pages.index() + 1).to_string();
    let total = pages.len().to_string();
    t_args_lang("section-position", &[("current", &current), ("total", &total)], ui)
}

fn summary_text(summary: &str, max_chars: usize, ui: Option<&str>) -> String {
    let summary = summary.trim();
    if summary.is_empty() {
        return t_lang("article-summary-empty", ui);
    }
    if summary.chars().count() <= max_chars {
        return summary.to_string();
    }
    format!("{}…", cut_at_boundary(summary, max_chars.saturating_sub(1)))
}

fn notice_text(session: &Session, notice: &Notice) -> String {
    let ui = session.ui_language();
    match notice {
        Notice::Help => [
            t_lang("help-title", ui),
            t_lang("help-commands", ui),
            t_lang("help-usage", ui),
        ]
        .join("\n\n"),
        Notice::Cancelled => t_lang("cancelled", ui),
        Notice::DocumentReady => t_lang("document-ready", ui),
        Notice::UnknownCommand => t_lang("unknown-command", ui),
        Notice::Problem(error) => problem_text(session, error),
    }
}

fn problem_text(session: &Session, error: &FlowError) -> String {
    let ui = session.ui_language();
    match error {
        FlowError::NotFound(_) => t_lang("error-not-found", ui),
        FlowError::ProviderTimeout(_) => t_lang("error-timeout", ui),
        FlowError::ProviderFailure(_) => t_lang("error-provider", ui),
        FlowError::InvalidState(_) => t_lang(guidance_key(session.state), ui),
        FlowError::InvalidSelection(selection) => match selection {
            SelectionError::SectionOutOfRange { .. } | SelectionError::StaleSection { .. } => {
                t_lang("error-stale-section", ui)
            }
            SelectionError::ResultOutOfRange { .. } => t_lang("error-stale-choice", ui),
            SelectionError::UnsupportedLanguage(_) => t_lang("error-unsupported-language", ui),
            SelectionError::SameLanguage(code) => {
                t_args_lang("error-same-language", &[("language", language_name(code))], ui)
            }
            SelectionError::EmptyQuery => t_lang("error-empty-query", ui),
            SelectionError::QueryTooLong => t_lang("error-query-too-long", ui),
        },
    }
}

fn guidance_key(state: ChatState) -> &'static str {
    match state {
        ChatState::Init => "guidance-init",
        ChatState::SelectingLanguage => "guidance-selecting-language",
        ChatState::Searching => "guidance-searching",
        ChatState::NoResults => "guidance-no-results",
        ChatState::ViewingResults => "guidance-results",
        ChatState::ViewingArticle => "guidance-article",
        ChatState::ReadingArticle | ChatState::ReadingTranslation => "guidance-reading",
        ChatState::ViewingTranslation => "guidance-translation",
    }
}

fn join_nonempty(parts: &[&str]) -> String {
    parts
        .iter()
        .filter(|part| !part.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Join the parts, shortening the body when the whole exceeds `max_chars`.
fn compose(parts: &Parts, max_chars: usize, ui: Option<&str>) -> String {
    let full = join_nonempty(&[&parts.header, &parts.body, &parts.footer]);
    if char_len(&full) <= max_chars {
        return full;
    }

    let indicator = t_lang("truncated", ui);
    let frame = char_len(&join_nonempty(&[&parts.header, &parts.footer]));
    // Two separators around the body plus the newline before the indicator
    let budget = max_chars.saturating_sub(frame + 4 + 1 + char_len(&indicator));
    let body = format!("{}\n{}", cut_at_boundary(&parts.body, budget), indicator);
    let text = join_nonempty(&[&parts.header, &body, &parts.footer]);

    if char_len(&text) <= max_chars {
        text
    } else {
        // Header and footer alone are over the limit
        let room = max_chars.saturating_sub(char_len(&indicator) + 1);
        if room == 0 {
            return cut_at_boundary(&indicator, max_chars).to_string();
        }
        format!("{}\n{}", cut_at_boundary(&text, room), indicator)
    }
}

/// Longest prefix of at most `max_chars` characters, ending at a paragraph,
/// line or word break when one lies in the second half of the prefix.
fn cut_at_boundary(text: &str, max_chars: usize) -> &str {
    let end = match text.char_indices().nth(max_chars) {
        Some((end, _)) => end,
        None => return text,
    };
    let prefix = &text[..end];
    for separator in ["\n\n", "\n", " "] {
        if let Some(pos) = prefix.rfind(separator) {
            if pos >= end / 2 {
                return prefix[..pos].trim_end();
            }
        }
    }
    prefix
}

fn shorten_labels(rows: Rows, max_chars: usize) -> Rows {
    rows.into_iter()
        .map(|row| {
            row.into_iter()
                .map(|button| Button {
                    label: shorten_label(&button.label, max_chars),
                    route: button.route,
                })
                .collect()
        })
        .collect()
}

fn shorten_label(label: &str, max_chars: usize) -> String {
    if char_len(label) <= max_chars {
        return label.to_string();
    }
    let kept: String = label.chars().take(max_chars.saturating_sub(1)).collect();
    format!("{}…", kept.trim_end())
}
