//! Text chunking and response decoding for the public translation endpoint.

use serde_json::Value;

use super::errors::ProviderError;

/// A piece of text sent to the translator in one request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Chunk {
    pub text: String,
    /// What followed the chunk in the source: `"\n"` after whole lines,
    /// `" "` between pieces of one long line, empty after the last chunk.
    pub separator: &'static str,
}

impl Chunk {
    fn new(text: String, separator: &'static str) -> Self {
        Self { text, separator }
    }
}

/// Split text into chunks of at most `max_chars` characters.
///
/// Lines are kept whole when they fit; longer lines are split after sentence
/// ends, and sentences that are still too long are split between words.
/// `rejoin` of the chunks gives back every non-blank line of the input.
pub fn split_into_chunks(text: &str, max_chars: usize) -> Vec<Chunk> {
    let max_chars = max_chars.max(1);
    let mut chunks = Vec::new();
    let mut current = String::new();

    for line in text.lines() {
        if char_len(line) > max_chars {
            flush(&mut chunks, &mut current);
            let pieces = split_long_line(line, max_chars);
            let last = pieces.len().saturating_sub(1);
            chunks.extend(pieces.into_iter().enumerate().map(|(i, piece)| {
                Chunk::new(piece, if i == last { "\n" } else { " " })
            }));
            continue;
        }
        let needed = char_len(&current) + char_len(line) + usize::from(!current.is_empty());
        if needed > max_chars {
            flush(&mut chunks, &mut current);
        }
        if !current.is_empty() {
            current.push('\n');
        }
        current.push_str(line);
    }
    flush(&mut chunks, &mut current);
    if let Some(last) = chunks.last_mut() {
        last.separator = "";
    }
    chunks
}

/// Concatenate chunks with the separators they were split on.
pub fn rejoin(chunks: &[Chunk]) -> String {
    chunks
        .iter()
        .map(|chunk| format!("{}{}", chunk.text, chunk.separator))
        .collect()
}

fn flush(chunks: &mut Vec<Chunk>, current: &mut String) {
    if !current.trim().is_empty() {
        chunks.push(Chunk::new(std::mem::take(current), "\n"));
    } else {
        current.clear();
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

fn split_long_line(line: &str, max_chars: usize) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut current = String::new();

    for sentence in sentences(line) {
        let pieces_of_sentence = if char_len(sentence) > max_chars {
            split_words(sentence, max_chars)
        } else {
            vec![sentence.to_string()]
        };
        for piece in pieces_of_sentence {
            if char_len(&current) + char_len(&piece) > max_chars && !current.trim().is_empty() {
                pieces.push(std::mem::take(&mut current));
            }
            current.push_str(&piece);
        }
    }
    if !current.trim().is_empty() {
        pieces.push(current);
    }
    pieces.into_iter().map(|p| p.trim().to_string()).collect()
}

/// Sentences including their trailing whitespace.
fn sentences(line: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut start = 0;
    let mut after_end = false;
    let mut gap = false;
    for (i, c) in line.char_indices() {
        if c.is_whitespace() {
            gap |= after_end;
            continue;
        }
        if gap {
            out.push(&line[start..i]);
            start = i;
        }
        gap = false;
        after_end = matches!(c, '.' | '!' | '?');
    }
    if start < line.len() {
        out.push(&line[start..]);
    }
    out
}

fn split_words(sentence: &str, max_chars: usize) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut current = String::new();
    for word in sentence.split_whitespace() {
        let mut word = word.to_string();
        // A single word longer than the limit is cut on char boundaries.
        while char_len(&word) > max_chars {
            let cut = word
                .char_indices()
                .nth(max_chars)
                .map(|(i, _)| i)
                .unwrap_or(word.len());
            if !current.is_empty() {
                pieces.push(std::mem::take(&mut current));
            }
            pieces.push(word[..cut].to_string());
            word = word[cut..].to_string();
        }
        if !current.is_empty() && char_len(&current) + 1 + char_len(&word) > max_chars {
            pieces.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(&word);
    }
    if !current.is_empty() {
        pieces.push(current);
    }
    pieces.into_iter().map(|p| format!("{p} ")).collect()
}

/// Extract the translated text from a `translate_a/single?client=gtx` response.
///
/// The payload is a nested array whose first element lists
/// `[translated, original, ...]` pairs, one per sentence.
pub fn parse_gtx_response(payload: &Value) -> Result<String, ProviderError> {
    let segments = payload
        .get(0)
        .and_then(Value::as_array)
        .ok_or_else(|| ProviderError::Translation("unexpected response shape".to_string()))?;

    let translated: String = segments
        .iter()
        .filter_map(|segment| segment.get(0).and_then(Value::as_str))
        .collect();

    if translated.is_empty() {
        return Err(ProviderError::Translation("empty translation".to_string()));
    }
    Ok(translated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn texts(chunks: &[Chunk]) -> Vec<&str> {
        chunks.iter().map(|c| c.text.as_str()).collect()
    }

    #[test]
    fn test_short_text_is_one_chunk() {
        let chunks = split_into_chunks("Hello.\nWorld.", 800);
        assert_eq!(texts(&chunks), vec!["Hello.\nWorld."]);
        assert_eq!(chunks[0].separator, "");
    }

    #[test]
    fn test_lines_are_grouped_under_limit() {
        let text = "aaaa\nbbbb\ncccc";
        let chunks = split_into_chunks(text, 9);
        assert_eq!(texts(&chunks), vec!["aaaa\nbbbb", "cccc"]);
        assert_eq!(rejoin(&chunks), text);
    }

    #[test]
    fn test_long_paragraph_rejoins_without_line_breaks() {
        let paragraph = "This is a fairly ordinary sentence about Alan Turing and computation. "
            .repeat(30);
        let paragraph = paragraph.trim_end();
        let chunks = split_into_chunks(paragraph, 800);
        assert!(chunks.len() > 1);
        assert!(chunks.iter().all(|c| c.text.chars().count() <= 800));

        let rejoined = rejoin(&chunks);
        assert!(!rejoined.contains('\n'));
        assert_eq!(rejoined, paragraph);
    }

    #[test]
    fn test_long_line_keeps_its_line_break() {
        let long = "Word ".repeat(10);
        let text = format!("Short line\n{}\nTail", long.trim_end());
        let chunks = split_into_chunks(&text, 12);
        assert_eq!(rejoin(&chunks), text);
        assert_eq!(chunks.iter().filter(|c| c.separator == "\n").count(), 2);
    }

    #[test]
    fn test_long_line_splits_on_sentences() {
        let line = "First sentence here. Second one follows! Third?";
        let chunks = split_into_chunks(line, 25);
        assert_eq!(
            texts(&chunks),
            vec!["First sentence here.", "Second one follows!", "Third?"]
        );
        assert!(chunks.iter().all(|c| c.text.chars().count() <= 25));
        assert_eq!(rejoin(&chunks), line);
    }

    #[test]
    fn test_long_sentence_splits_on_words() {
        let line = "one two three four five six seven eight nine ten";
        let chunks = split_into_chunks(line, 12);
        assert!(chunks.iter().all(|c| c.text.chars().count() <= 12));
        assert_eq!(rejoin(&chunks), line);
    }

    #[test]
    fn test_multibyte_words_are_cut_safely() {
        let word = "é".repeat(30);
        let chunks = split_into_chunks(&word, 10);
        assert_eq!(chunks.len(), 3);
        assert!(chunks.iter().all(|c| c.text.chars().count() == 10));
    }

    #[test]
    fn test_blank_text_has_no_chunks() {
        assert!(split_into_chunks("  \n\n ", 100).is_empty());
    }

    #[test]
    fn test_parse_gtx_response() {
        let payload = json!([[["Bonjour. ", "Hello. ", null], ["Le monde.", "The world.", null]], null, "en"]);
        assert_eq!(parse_gtx_response(&payload).unwrap(), "Bonjour. Le monde.");
    }

    #[test]
    fn test_parse_gtx_response_rejects_garbage() {
        assert!(parse_gtx_response(&json!({"error": 1})).is_err());
        assert!(parse_gtx_response(&json!([[]])).is_err());
    }
}
