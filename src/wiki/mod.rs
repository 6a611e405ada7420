//! Content provider: Wikipedia search and fetch, translation, document export.
//!
//! - `provider`: the `ContentProvider` trait the conversation core depends on
//! - `wikipedia`: HTTP implementation over the MediaWiki API
//! - `translate`: chunking and decoding for the translation endpoint
//! - `document`: plain-text export written to temporary files

pub mod article;
pub mod document;
pub mod errors;
pub mod provider;
pub mod translate;
pub mod wikipedia;

pub use article::Article;
pub use document::GeneratedDocument;
pub use errors::ProviderError;
pub use provider::{share_link, ContentProvider};
pub use wikipedia::WikipediaClient;
