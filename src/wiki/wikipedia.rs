//! MediaWiki + public translation endpoint implementation of [`ContentProvider`].

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use super::article::Article;
use super::document::{write_document, GeneratedDocument};
use super::errors::ProviderError;
use super::provider::{share_link, ContentProvider};
use super::translate::{parse_gtx_response, rejoin, split_into_chunks, Chunk};
use crate::circuit_breaker::CircuitBreaker;
use crate::config::{ProviderConfig, RecoveryConfig};
use crate::languages::is_wiki_language_code;

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    query: Option<T>,
}

#[derive(Debug, Deserialize)]
struct SearchQuery {
    #[serde(default)]
    search: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    title: String,
}

#[derive(Debug, Deserialize)]
struct PagesQuery {
    #[serde(default)]
    pages: Vec<Page>,
}

#[derive(Debug, Deserialize)]
struct Page {
    title: String,
    #[serde(default)]
    missing: bool,
    #[serde(default)]
    invalid: bool,
    extract: Option<String>,
    fullurl: Option<String>,
    #[serde(default)]
    langlinks: Vec<LangLink>,
}

#[derive(Debug, Deserialize)]
struct LangLink {
    lang: String,
    title: String,
}

struct ClientInner {
    http: reqwest::Client,
    config: ProviderConfig,
    breaker: CircuitBreaker,
}

/// Wikipedia client. Cheap to clone; clones share the HTTP pool and breaker.
#[derive(Clone)]
pub struct WikipediaClient {
    inner: Arc<ClientInner>,
}

impl WikipediaClient {
    pub fn new(config: ProviderConfig) -> Result<Self, ProviderError> {
        let http = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;
        let breaker = CircuitBreaker::new(config.recovery.clone());
        Ok(Self {
            inner: Arc::new(ClientInner {
                http,
                config,
                breaker,
            }),
        })
    }

    fn api_url(language: &str) -> Result<String, ProviderError> {
        if !is_wiki_language_code(language) {
            return Err(ProviderError::InvalidInput(format!(
                "invalid language code: {language}"
            )));
        }
        Ok(format!("https://{language}.wikipedia.org/w/api.php"))
    }

    /// GET + JSON decode with retries and the circuit breaker.
    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, &str)],
    ) -> Result<T, ProviderError> {
        let inner = &self.inner;
        if inner.breaker.is_open() {
            return Err(ProviderError::Unavailable(
                "too many recent failures, try again later".to_string(),
            ));
        }

        let mut attempt = 0;
        loop {
            let response = inner
                .http
                .get(url)
                .query(query)
                .send()
                .await
                .and_then(|r| r.error_for_status());

            let error = match response {
                Ok(resp) => match resp.json::<T>().await {
                    Ok(value) => {
                        inner.breaker.record_success();
                        return Ok(value);
                    }
                    // The server answered; a bad payload is neither retried nor held against it
                    Err(e) if e.is_decode() => return Err(ProviderError::from(e)),
                    Err(e) => ProviderError::from(e),
                },
                Err(e) if e.status().is_some_and(|s| s.is_client_error()) => {
                    inner.breaker.record_failure();
                    return Err(ProviderError::Request(e.to_string()));
                }
                Err(e) => ProviderError::from(e),
            };

            inner.breaker.record_failure();
            if !error.is_transient() || attempt >= inner.config.recovery.max_retries {
                return Err(error);
            }

            let delay = retry_delay(&inner.config.recovery, attempt);
            warn!(url = %url, attempt = attempt + 1, delay_ms = delay.as_millis() as u64, error = %error, "Provider call failed, retrying");
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }

    /// Bound a whole operation, retries included.
    async fn with_deadline<T>(
        &self,
        operation: &str,
        fut: impl std::future::Future<Output = Result<T, ProviderError>>,
    ) -> Result<T, ProviderError> {
        let limit = Duration::from_secs(self.inner.config.recovery.operation_timeout_secs);
        match tokio::time::timeout(limit, fut).await {
            Ok(result) => result,
            Err(_) => Err(ProviderError::Timeout(format!(
                "{operation} exceeded {}s",
                limit.as_secs()
            ))),
        }
    }

    async fn fetch_pages(&self, language: &str, query: &[(&str, &str)]) -> Result<Option<Page>, ProviderError> {
        let url = Self::api_url(language)?;
        let response: ApiResponse<PagesQuery> = self.get_json(&url, query).await?;
        Ok(response
            .query
            .and_then(|q| q.pages.into_iter().next())
            .filter(|page| !page.missing && !page.invalid))
    }

    async fn fetch_article_inner(&self, title: &str, language: &str) -> Result<Article, ProviderError> {
        let page = self
            .fetch_pages(
                language,
                &[
                    ("action", "query"),
                    ("format", "json"),
                    ("formatversion", "2"),
                    ("prop", "extracts|info|langlinks"),
                    ("explaintext", "1"),
                    ("redirects", "1"),
                    ("inprop", "url"),
                    ("lllimit", "max"),
                    ("titles", title),
                ],
            )
            .await?
            .ok_or_else(|| ProviderError::NotFound(title.to_string()))?;

        let summary = self
            .fetch_pages(
                language,
                &[
                    ("action", "query"),
                    ("format", "json"),
                    ("formatversion", "2"),
                    ("prop", "extracts"),
                    ("exintro", "1"),
                    ("explaintext", "1"),
                    ("redirects", "1"),
                    ("titles", page.title.as_str()),
                ],
            )
            .await?
            .and_then(|p| p.extract)
            .unwrap_or_default();

        let url = match page.fullurl {
            Some(url) => url,
            None => share_link(&page.title, language)?,
        };
        let languages = page.langlinks.into_iter().map(|l| (l.lang, l.title));

        info!(title = %page.title, language = %language, "Fetched article");
        Ok(Article::new(
            page.title,
            language,
            summary.trim(),
            page.extract.unwrap_or_default(),
            url,
        )
        .with_languages(languages))
    }

    async fn translate_chunk(
        &self,
        chunk: &str,
        source: &str,
        target: &str,
    ) -> Result<String, ProviderError> {
        let endpoint = self.inner.config.translate_endpoint.clone();
        let payload: Value = self
            .get_json(
                &endpoint,
                &[
                    ("client", "gtx"),
                    ("sl", source),
                    ("tl", target),
                    ("dt", "t"),
                    ("q", chunk),
                ],
            )
            .await
            .map_err(|e| match e {
                ProviderError::Request(msg) => ProviderError::Translation(msg),
                other => other,
            })?;
        parse_gtx_response(&payload)
    }

    async fn translate_inner(&self, text: &str, source: &str, target: &str) -> Result<String, ProviderError> {
        let chunks = split_into_chunks(text, self.inner.config.translate_chunk_chars);
        if chunks.is_empty() {
            return Ok(text.to_string());
        }
        if let [chunk] = chunks.as_slice() {
            return self.translate_chunk(&chunk.text, source, target).await;
        }

        debug!(chunks = chunks.len(), source = %source, target = %target, "Translating in chunks");
        let separators: Vec<&'static str> = chunks.iter().map(|chunk| chunk.separator).collect();
        let permits = Arc::new(Semaphore::new(self.inner.config.translate_concurrency.max(1)));
        let mut tasks = JoinSet::new();
        for (index, Chunk { text: chunk, .. }) in chunks.into_iter().enumerate() {
            let client = self.clone();
            let permits = Arc::clone(&permits);
            let (source, target) = (source.to_string(), target.to_string());
            tasks.spawn(async move {
                let _permit = permits
                    .acquire_owned()
                    .await
                    .map_err(|e| ProviderError::Translation(e.to_string()))?;
                let translated = client.translate_chunk(&chunk, &source, &target).await?;
                Ok::<_, ProviderError>((index, translated))
            });
        }

        let mut translated = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            let (index, text) =
                joined.map_err(|e| ProviderError::Translation(e.to_string()))??;
            translated.push((index, text));
        }
        translated.sort_by_key(|(index, _)| *index);
        let translated: Vec<Chunk> = translated
            .into_iter()
            .zip(separators)
            .map(|((_, text), separator)| Chunk { text, separator })
            .collect();
        Ok(rejoin(&translated))
    }
}

/// Exponential backoff with jitter, capped by `max_retry_delay_ms`.
fn retry_delay(config: &RecoveryConfig, attempt: u32) -> Duration {
    let exponential = config
        .base_retry_delay_ms
        .saturating_mul(1u64 << attempt.min(16));
    let capped = exponential.min(config.max_retry_delay_ms);
    let jitter = rand::thread_rng().gen_range(0..=config.base_retry_delay_ms / 2);
    Duration::from_millis(capped.saturating_add(jitter).min(config.max_retry_delay_ms))
}

#[async_trait]
impl ContentProvider for WikipediaClient {
    async fn search_articles(&self, query: &str, language: &str) -> Result<Vec<String>, ProviderError> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }
        let url = Self::api_url(language)?;
        let limit = self.inner.config.search_limit.to_string();

        self.with_deadline("search", async {
            let response: ApiResponse<SearchQuery> = self
                .get_json(
                    &url,
                    &[
                        ("action", "query"),
                        ("format", "json"),
                        ("formatversion", "2"),
                        ("list", "search"),
                        ("srsearch", query),
                        ("srlimit", limit.as_str()),
                    ],
                )
                .await?;
            let titles: Vec<String> = response
                .query
                .map(|q| q.search.into_iter().map(|hit| hit.title).collect())
                .unwrap_or_default();
            info!(query = %query, language = %language, results = titles.len(), "Search completed");
            Ok(titles)
        })
        .await
    }

    async fn fetch_article(&self, title: &str, language: &str) -> Result<Article, ProviderError> {
        if title.trim().is_empty() {
            return Err(ProviderError::InvalidInput("empty title".to_string()));
        }
        self.with_deadline("fetch", self.fetch_article_inner(title, language))
            .await
    }

    async fn fetch_article_in_language(
        &self,
        article: &Article,
        target_language: &str,
    ) -> Result<Article, ProviderError> {
        let title = article.title_in(target_language).ok_or_else(|| {
            ProviderError::NotFound(format!("{} in {}", article.title, target_language))
        })?;
        self.with_deadline("fetch", self.fetch_article_inner(title, target_language))
            .await
    }

    async fn translate(&self, text: &str, source_language: &str, target_language: &str) -> Result<String, ProviderError> {
        if text.trim().is_empty() || source_language == target_language {
            return Ok(text.to_string());
        }
        self.with_deadline(
            "translate",
            self.translate_inner(text, source_language, target_language),
        )
        .await
    }

    async fn generate_document(&self, article: &Article) -> Result<GeneratedDocument, ProviderError> {
        let article = article.clone();
        let dir = self.inner.config.document_dir.clone();
        tokio::task::spawn_blocking(move || write_document(&article, dir.as_deref()))
            .await
            .map_err(|e| ProviderError::Document(e.to_string()))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn test_malformed_payload_is_not_retried() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);
        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                counter.fetch_add(1, Ordering::SeqCst);
                let mut request = [0u8; 2048];
                let _ = socket.read(&mut request).await;
                let _ = socket
                    .write_all(
                        b"HTTP/1.1 200 OK\r\nContent-Type: application/json\r\n\
                          Content-Length: 8\r\nConnection: close\r\n\r\nnot json",
                    )
                    .await;
            }
        });

        let mut config = ProviderConfig::default();
        config.recovery.max_retries = 3;
        config.recovery.base_retry_delay_ms = 10;
        config.recovery.circuit_breaker_threshold = 1;
        let client = WikipediaClient::new(config).unwrap();

        let result: Result<Value, ProviderError> = client
            .get_json(&format!("http://{addr}/w/api.php"), &[("action", "query")])
            .await;

        assert!(matches!(result, Err(ProviderError::Decode(_))), "got {result:?}");
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert!(!client.inner.breaker.is_open());
    }

    #[test]
    fn test_retry_delay_is_capped() {
        let config = RecoveryConfig {
            base_retry_delay_ms: 100,
            max_retry_delay_ms: 1000,
            ..Default::default()
        };
        assert!(retry_delay(&config, 0) >= Duration::from_millis(100));
        assert!(retry_delay(&config, 0) <= Duration::from_millis(150));
        assert_eq!(retry_delay(&config, 30), Duration::from_millis(1000));
    }

    #[test]
    fn test_api_url_validates_language() {
        assert_eq!(
            WikipediaClient::api_url("de").unwrap(),
            "https://de.wikipedia.org/w/api.php"
        );
        assert!(WikipediaClient::api_url("de.evil").is_err());
    }

    #[test]
    fn test_decodes_page_response() {
        let raw = r#"{"batchcomplete":true,"query":{"pages":[{"pageid":30,"ns":0,"title":"Alan Turing","extract":"Alan Turing was...","fullurl":"https://en.wikipedia.org/wiki/Alan_Turing","langlinks":[{"lang":"fr","title":"Alan Turing"},{"lang":"de","title":"Alan Turing"}]}]}}"#;
        let response: ApiResponse<PagesQuery> = serde_json::from_str(raw).unwrap();
        let page = response.query.unwrap().pages.into_iter().next().unwrap();
        assert_eq!(page.title, "Alan Turing");
        assert!(!page.missing);
        assert_eq!(page.langlinks.len(), 2);
    }

    #[test]
    fn test_decodes_missing_page() {
        let raw = r#"{"query":{"pages":[{"ns":0,"title":"Zzzzxxqq","missing":true}]}}"#;
        let response: ApiResponse<PagesQuery> = serde_json::from_str(raw).unwrap();
        assert!(response.query.unwrap().pages[0].missing);
    }

    #[test]
    fn test_decodes_search_response() {
        let raw = r#"{"query":{"searchinfo":{"totalhits":3},"search":[{"ns":0,"title":"Alan Turing"},{"ns":0,"title":"Turing machine"}]}}"#;
        let response: ApiResponse<SearchQuery> = serde_json::from_str(raw).unwrap();
        let titles: Vec<String> = response.query.unwrap().search.into_iter().map(|h| h.title).collect();
        assert_eq!(titles, vec!["Alan Turing", "Turing machine"]);
    }
}
