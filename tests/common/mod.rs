//! Shared test tooling: a scripted content provider and a harness driving the
//! router for one conversation.

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use wikichat::bot::{Event, NoProgress, Outcome, ProgressSink, Route, Router, Screen};
use wikichat::config::RenderConfig;
use wikichat::dialogue::Session;
use wikichat::session_store::{ConversationId, SessionStore};
use wikichat::wiki::document::write_document;
use wikichat::wiki::{Article, ContentProvider, GeneratedDocument, ProviderError};

pub const TURING_BODY: &str = "Alan Mathison Turing was an English mathematician.\n\n\
== Early life ==\nTuring was born in Maida Vale, London.\n\n\
== Career ==\nHe worked at Bletchley Park.\n\n\
=== Codebreaking ===\nHe helped break Enigma.\n";

/// Content provider answering from fixed tables and counting calls
#[derive(Default)]
pub struct FakeProvider {
    results: Mutex<HashMap<(String, String), Vec<String>>>,
    articles: Mutex<HashMap<(String, String), Article>>,
    pub fail_search: AtomicBool,
    pub fail_translation: AtomicBool,
    pub search_calls: AtomicUsize,
    pub fetch_calls: AtomicUsize,
    pub translate_calls: AtomicUsize,
    pub document_calls: AtomicUsize,
}

impl FakeProvider {
    /// Provider knowing the "Turing" search in English and its French edition
    pub fn with_turing() -> Self {
        let provider = Self::default();
        provider.add_results(
            "Turing",
            "en",
            &["Alan Turing", "Turing machine", "Turing test"],
        );
        provider.add_article(
            Article::new(
                "Alan Turing",
                "en",
                "Alan Mathison Turing was an English mathematician.",
                TURING_BODY,
                "https://en.wikipedia.org/wiki/Alan_Turing",
            )
            .with_languages([("fr", "Alan Turing"), ("de", "Alan Turing"), ("xx", "Xx")]),
        );
        provider.add_article(
            Article::new(
                "Alan Turing",
                "fr",
                "Alan Turing est un mathématicien britannique.",
                "Alan Turing est un mathématicien.\n\n== Biographie ==\nNé à Londres.\n",
                "https://fr.wikipedia.org/wiki/Alan_Turing",
            )
            .with_languages([("en", "Alan Turing")]),
        );
        provider.add_article(Article::new(
            "Turing machine",
            "en",
            "A model of computation.",
            "A Turing machine is a model of computation.",
            "https://en.wikipedia.org/wiki/Turing_machine",
        ));
        provider
    }

    pub fn add_results(&self, query: &str, language: &str, titles: &[&str]) {
        self.results.lock().unwrap().insert(
            (query.to_string(), language.to_string()),
            titles.iter().map(|t| t.to_string()).collect(),
        );
    }

    pub fn add_article(&self, article: Article) {
        self.articles
            .lock()
            .unwrap()
            .insert((article.title.clone(), article.language.clone()), article);
    }

    pub fn calls(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }

    fn lookup(&self, title: &str, language: &str) -> Result<Article, ProviderError> {
        self.articles
            .lock()
            .unwrap()
            .get(&(title.to_string(), language.to_string()))
            .cloned()
            .ok_or_else(|| ProviderError::NotFound(format!("{title} ({language})")))
    }
}

#[async_trait]
impl ContentProvider for FakeProvider {
    async fn search_articles(
        &self,
        query: &str,
        language: &str,
    ) -> Result<Vec<String>, ProviderError> {
        self.search_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_search.load(Ordering::SeqCst) {
            return Err(ProviderError::Timeout("search timed out".to_string()));
        }
        Ok(self
            .results
            .lock()
            .unwrap()
            .get(&(query.to_string(), language.to_string()))
            .cloned()
            .unwrap_or_default())
    }

    async fn fetch_article(&self, title: &str, language: &str) -> Result<Article, ProviderError> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        self.lookup(title, language)
    }

    async fn fetch_article_in_language(
        &self,
        article: &Article,
        target_language: &str,
    ) -> Result<Article, ProviderError> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        let title = article
            .title_in(target_language)
            .ok_or_else(|| ProviderError::NotFound(target_language.to_string()))?;
        self.lookup(title, target_language)
    }

    async fn translate(
        &self,
        text: &str,
        _source_language: &str,
        target_language: &str,
    ) -> Result<String, ProviderError> {
        self.translate_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_translation.load(Ordering::SeqCst) {
            return Err(ProviderError::Translation("translation service unavailable".to_string()));
        }
        Ok(format!("[{target_language}] {text}"))
    }

    async fn generate_document(&self, article: &Article) -> Result<GeneratedDocument, ProviderError> {
        self.document_calls.fetch_add(1, Ordering::SeqCst);
        write_document(article, None)
    }
}

/// Interim screens seen during an event
#[derive(Default)]
pub struct RecordingProgress {
    pub screens: Mutex<Vec<String>>,
}

#[async_trait]
impl ProgressSink for RecordingProgress {
    async fn working(&self, screen: &Screen) {
        self.screens.lock().unwrap().push(screen.text.clone());
    }
}

/// One conversation driven through the router
pub struct Harness {
    pub provider: Arc<FakeProvider>,
    pub store: Arc<SessionStore>,
    pub router: Router,
    pub id: ConversationId,
}

impl Harness {
    pub fn new(provider: FakeProvider) -> Self {
        let provider = Arc::new(provider);
        let store = Arc::new(SessionStore::new());
        let router = Router::new(provider.clone(), Arc::clone(&store), RenderConfig::default());
        Self {
            provider,
            store,
            router,
            id: ConversationId(42),
        }
    }

    pub async fn send(&self, event: Event) -> Outcome {
        self.router
            .handle_event(self.id, event, Some("en"), &NoProgress)
            .await
    }

    pub async fn text(&self, text: &str) -> Outcome {
        self.send(Event::from_text(text)).await
    }

    pub async fn press(&self, route: Route) -> Outcome {
        self.send(Event::button(&route)).await
    }

    pub async fn session(&self) -> Session {
        self.store
            .snapshot(self.id)
            .await
            .expect("conversation should exist")
    }

    /// `/start`, English, search "Turing", open the first result
    pub async fn open_turing(&self) -> Outcome {
        self.text("/start").await;
        self.press(Route::PickLanguage("en".to_string())).await;
        self.text("Turing").await;
        self.press(Route::PickResult(0)).await
    }
}
