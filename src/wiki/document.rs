//! Plain-text document export of an article.

use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;
use tracing::debug;

use super::article::Article;
use super::errors::ProviderError;
use crate::languages::language_name;
use crate::paginator::paginate;

/// An exported article on disk. The file is deleted when this value is dropped.
#[derive(Debug)]
pub struct GeneratedDocument {
    file: NamedTempFile,
    /// Name shown to the user when the file is delivered
    pub file_name: String,
}

impl GeneratedDocument {
    pub fn path(&self) -> &Path {
        self.file.path()
    }
}

/// File name built from the title: alphanumerics, spaces, `-` and `_` are kept.
pub fn document_file_name(article: &Article) -> String {
    let safe_title: String = article
        .title
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, ' ' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let safe_title = safe_title.trim();
    let safe_title = if safe_title.is_empty() { "article" } else { safe_title };
    format!("{}_{}.txt", safe_title, article.language)
}

/// Render the document text.
pub fn render_document(article: &Article) -> String {
    let mut out = String::new();
    out.push_str(&article.title);
    out.push('\n');
    out.push_str(&"=".repeat(article.title.chars().count().max(3)));
    out.push_str("\n\n");
    out.push_str(&format!(
        "Source: Wikipedia ({})\n",
        language_name(&article.language)
    ));
    if !article.url.is_empty() {
        out.push_str(&article.url);
        out.push('\n');
    }
    out.push_str(&"_".repeat(50));
    out.push_str("\n\nSummary\n-------\n\n");
    out.push_str(article.summary.trim());
    out.push_str("\n\nFull Content\n------------\n");

    for section in paginate(&article.body) {
        if let Some(heading) = &section.heading {
            let indent = "#".repeat(section.level.saturating_sub(1).max(1) as usize);
            out.push_str(&format!("\n{indent} {heading}\n"));
        }
        let text = section.text();
        if !text.is_empty() {
            out.push('\n');
            out.push_str(text);
            out.push('\n');
        }
    }
    out
}

/// Write the document to a temporary file in `dir` (system temp dir when `None`).
///
/// On any failure the partially written file is removed with the dropped handle.
pub fn write_document(article: &Article, dir: Option<&Path>) -> Result<GeneratedDocument, ProviderError> {
    let file_name = document_file_name(article);
    let mut builder = tempfile::Builder::new();
    builder.prefix("wikichat-").suffix(".txt");
    let mut file = match dir {
        Some(dir) => builder.tempfile_in(dir)?,
        None => builder.tempfile()?,
    };

    file.write_all(render_document(article).as_bytes())?;
    file.flush()?;
    debug!(path = %file.path().display(), file_name = %file_name, "Document written");

    Ok(GeneratedDocument { file, file_name })
}
