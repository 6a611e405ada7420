//! # Section Paginator
//!
//! Splits plain-text article bodies into ordered sections on MediaWiki-style
//! headings (`== History ==`) and provides bounded cursor navigation over them.
//!
//! Splitting is lossless: concatenating `marker + body` of every section gives
//! back the input, byte for byte.

use lazy_static::lazy_static;
use regex::Regex;

use crate::errors::SelectionError;

// Candidate heading lines. The closing fence needs a backreference, so it is checked in code.
const HEADING_LINE_PATTERN: &str = r"(?m)^==.*$";

lazy_static! {
    static ref HEADING_LINE_REGEX: Regex =
        Regex::new(HEADING_LINE_PATTERN).expect("Heading pattern should be valid");
}

/// An ordered fragment of an article body.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Section {
    /// Heading label, `None` for the intro or unstructured text
    pub heading: Option<String>,
    /// Heading depth (2 for `==`), 0 when untitled
    pub level: u8,
    /// Exact source text preceding the body (the heading line), empty for the intro
    pub marker: String,
    pub body: String,
}

impl Section {
    pub fn untitled(body: impl Into<String>) -> Self {
        Self {
            heading: None,
            level: 0,
            marker: String::new(),
            body: body.into(),
        }
    }

    pub fn titled(heading: impl Into<String>, level: u8, body: impl Into<String>) -> Self {
        let heading = heading.into();
        let fence = "=".repeat(level.clamp(2, 6) as usize);
        Self {
            marker: format!("{fence} {heading} {fence}\n"),
            heading: Some(heading),
            level,
            body: body.into(),
        }
    }

    /// Body with surrounding blank space removed, for display.
    pub fn text(&self) -> &str {
        self.body.trim()
    }
}

struct HeadingMatch {
    start: usize,
    marker_end: usize,
    level: u8,
    label: String,
}

/// Parse a heading line: an opening fence of 2 to 6 `=`, a label, and the
/// same fence again somewhere later on the line. Text after the closing
/// fence is ignored. Longer opening runs are tried first.
fn parse_heading(line: &str) -> Option<(u8, &str)> {
    let run = line.len() - line.trim_start_matches('=').len();
    (2..=run.min(6)).rev().find_map(|level| {
        let fence = &line[..level];
        let rest = line[level..].trim_start();
        let close = rest.find(fence)?;
        Some((level as u8, rest[..close].trim_end()))
    })
}

fn find_headings(body: &str) -> Vec<HeadingMatch> {
    HEADING_LINE_REGEX
        .find_iter(body)
        .filter_map(|line| {
            let (level, label) = parse_heading(line.as_str())?;
            let marker_end = if line.end() < body.len() {
                line.end() + 1
            } else {
                body.len()
            };
            Some(HeadingMatch {
                start: line.start(),
                marker_end,
                level,
                label: label.to_string(),
            })
        })
        .collect()
}

/// Split a body into sections. Never returns an empty vector.
pub fn paginate(body: &str) -> Vec<Section> {
    let headings = find_headings(body);
    if headings.is_empty() {
        return vec![Section::untitled(body)];
    }

    let mut sections = Vec::with_capacity(headings.len() + 1);
    let intro = &body[..headings[0].start];
    // A blank intro would render as an empty page; keep its bytes in the first marker instead.
    let mut marker_start = headings[0].start;
    if intro.trim().is_empty() {
        marker_start = 0;
    } else {
        sections.push(Section::untitled(intro));
    }

    for (i, heading) in headings.iter().enumerate() {
        let end = headings
            .get(i + 1)
            .map(|next| next.start)
            .unwrap_or(body.len());
        let start = if i == 0 { marker_start } else { heading.start };
        sections.push(Section {
            heading: Some(heading.label.clone()),
            level: heading.level,
            marker: body[start..heading.marker_end].to_string(),
            body: body[heading.marker_end..end].to_string(),
        });
    }

    sections
}

/// Rebuild the source text from its sections.
pub fn reassemble(sections: &[Section]) -> String {
    sections
        .iter()
        .map(|s| format!("{}{}", s.marker, s.body))
        .collect()
}

/// A non-empty list of sections with a cursor that always points inside it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Pages {
    sections: Vec<Section>,
    index: usize,
}

impl Pages {
    pub fn new(mut sections: Vec<Section>) -> Self {
        if sections.is_empty() {
            sections.push(Section::untitled(""));
        }
        Self { sections, index: 0 }
    }

    pub fn from_body(body: &str) -> Self {
        Self::new(paginate(body))
    }

    pub fn current(&self) -> &Section {
        &self.sections[self.index]
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn is_first(&self) -> bool {
        self.index == 0
    }

    pub fn is_last(&self) -> bool {
        self.index + 1 == self.sections.len()
    }

    /// Move forward one section. Returns false at the last section.
    pub fn next(&mut self) -> bool {
        if self.is_last() {
            return false;
        }
        self.index += 1;
        true
    }

    /// Move back one section. Returns false at the first section.
    pub fn prev(&mut self) -> bool {
        if self.is_first() {
            return false;
        }
        self.index -= 1;
        true
    }

    pub fn select(&mut self, index: usize) -> Result<&Section, SelectionError> {
        if index >= self.sections.len() {
            return Err(SelectionError::SectionOutOfRange {
                index,
                len: self.sections.len(),
            });
        }
        self.index = index;
        Ok(self.current())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BODY: &str = "Intro text.\n\n== Early life ==\nBorn in London.\n\n=== School ===\nSherborne.\n\n== Death ==\nDied 1954.";

    #[test]
    fn test_splits_on_headings() {
        let sections = paginate(BODY);
        let labels: Vec<Option<&str>> = sections.iter().map(|s| s.heading.as_deref()).collect();
        assert_eq!(
            labels,
            vec![None, Some("Early life"), Some("School"), Some("Death")]
        );
        assert_eq!(sections[2].level, 3);
        assert_eq!(sections[1].text(), "Born in London.");
    }

    #[test]
    fn test_reassembles_losslessly() {
        assert_eq!(reassemble(&paginate(BODY)), BODY);
    }

    #[test]
    fn test_blank_intro_is_folded_into_first_marker() {
        let body = "\n\n== Only ==\ncontent";
        let sections = paginate(body);
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].marker, "\n\n== Only ==\n");
        assert_eq!(reassemble(&sections), body);
    }

    #[test]
    fn test_heading_fence_rules() {
        assert_eq!(parse_heading("== Broken ==="), Some((2, "Broken")));
        assert_eq!(parse_heading("== Notes == x"), Some((2, "Notes")));
        assert_eq!(parse_heading("=== A =="), Some((2, "= A")));
        assert_eq!(parse_heading("==Tight=="), Some((2, "Tight")));
        assert_eq!(parse_heading("== no close"), None);
        assert_eq!(parse_heading("= Single ="), None);
    }

    #[test]
    fn test_empty_body_yields_one_section() {
        let sections = paginate("");
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].body, "");
    }

    #[test]
    fn test_cursor_is_clamped() {
        let mut pages = Pages::from_body(BODY);
        assert!(!pages.prev());
        while pages.next() {}
        assert_eq!(pages.index(), pages.len() - 1);
        assert!(!pages.next());
        assert_eq!(pages.index(), pages.len() - 1);
    }

    #[test]
    fn test_select_rejects_out_of_range() {
        let mut pages = Pages::from_body(BODY);
        assert!(pages.select(2).is_ok());
        assert_eq!(pages.index(), 2);
        assert!(pages.select(10).is_err());
        assert_eq!(pages.index(), 2);
    }

    #[test]
    fn test_titled_section_marker() {
        let section = Section::titled("History", 2, "text");
        assert_eq!(section.marker, "== History ==\n");
        assert_eq!(paginate(&reassemble(&[section.clone()]))[0], section);
    }
}
