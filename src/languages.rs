//! Language tables shared by the search picker, the translation menus and the
//! document export.

/// Display names for every language code the bot knows about.
pub const LANGUAGE_NAMES: &[(&str, &str)] = &[
    ("en", "English"),
    ("es", "Spanish"),
    ("fr", "French"),
    ("de", "German"),
    ("it", "Italian"),
    ("pt", "Portuguese"),
    ("zh", "Chinese"),
    ("ja", "Japanese"),
    ("ru", "Russian"),
    ("ar", "Arabic"),
    ("hi", "Hindi"),
    ("ko", "Korean"),
    ("tr", "Turkish"),
];

/// Languages offered on the search language picker.
pub const SEARCH_LANGUAGES: &[&str] = &["en", "es", "fr", "de", "ru", "zh", "ar", "ja"];

/// Languages offered as translation targets.
pub const TRANSLATION_LANGUAGES: &[&str] =
    &["en", "es", "fr", "de", "it", "pt", "ru", "ja", "zh", "ko", "ar"];

/// Default search language when none was picked.
pub const DEFAULT_LANGUAGE: &str = "en";

/// Human readable name of a language code, falling back to the code itself.
pub fn language_name(code: &str) -> &str {
    LANGUAGE_NAMES
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, name)| *name)
        .unwrap_or(code)
}

/// Whether the code has a display name.
pub fn is_known_language(code: &str) -> bool {
    LANGUAGE_NAMES.iter().any(|(c, _)| *c == code)
}

pub fn is_search_language(code: &str) -> bool {
    SEARCH_LANGUAGES.contains(&code)
}

pub fn is_translation_language(code: &str) -> bool {
    TRANSLATION_LANGUAGES.contains(&code)
}

/// Translation targets for an article written in `source`, source excluded.
pub fn translation_targets(source: &str) -> Vec<&'static str> {
    TRANSLATION_LANGUAGES
        .iter()
        .copied()
        .filter(|code| *code != source)
        .collect()
}

/// Whether a string looks like a Wikipedia language code (`en`, `zh-yue`, `simple`).
pub fn is_wiki_language_code(code: &str) -> bool {
    (2..=12).contains(&code.len())
        && code
            .chars()
            .all(|c| c.is_ascii_lowercase() || c == '-')
        && !code.starts_with('-')
        && !code.ends_with('-')
}
