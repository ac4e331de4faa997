use isolang::Language;
use serde::{Deserialize, Serialize};

/// Language tag utilities
///
/// Sheet names and XLIFF `target-language` values are platform locale codes
/// such as `fr`, `pt_BR` or `zh_CN`. This module holds the single policy used
/// to turn them into the `target-language` attribute and suggested filenames,
/// plus helpers to describe a tag in log output.
/// How language tags are rendered in exported documents and filenames
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum LanguageTagStyle {
    /// Keep the tag exactly as found in the sheet name
    #[default]
    Verbatim,
    /// Lowercase and replace underscores with hyphens (`pt_BR` -> `pt-br`)
    HyphenatedLowercase,
}

/// Apply a tag style to a raw language tag
pub fn normalize_language_tag(tag: &str, style: LanguageTagStyle) -> String {
    let trimmed = tag.trim();
    match style {
        LanguageTagStyle::Verbatim => trimmed.to_string(),
        LanguageTagStyle::HyphenatedLowercase => trimmed.to_lowercase().replace('_', "-"),
    }
}

/// Suggested filename for an exported XLIFF document
pub fn suggested_xliff_filename(tag: &str, style: LanguageTagStyle) -> String {
    format!("{}_output.xlf", normalize_language_tag(tag, style))
}

/// Suggested filename for an imported workbook
pub fn suggested_workbook_filename(tag: &str, style: LanguageTagStyle) -> String {
    format!("{}.xlsx", normalize_language_tag(tag, style))
}

/// Primary language subtag, lowercase (`pt_BR` -> `pt`)
pub fn primary_subtag(tag: &str) -> String {
    tag.trim()
        .split(['_', '-'])
        .next()
        .unwrap_or_default()
        .to_lowercase()
}

/// Check that a tag only uses characters valid in a locale code
pub fn is_valid_language_tag(tag: &str) -> bool {
    !tag.is_empty()
        && tag
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

/// English name of the tag's language, or the tag itself when unknown
pub fn describe_language(tag: &str) -> String {
    let primary = primary_subtag(tag);
    let language = match primary.len() {
        2 => Language::from_639_1(&primary),
        3 => Language::from_639_3(&primary),
        _ => None,
    };

    match language {
        Some(lang) if primary != tag.trim().to_lowercase() => {
            format!("{} ({})", lang.to_name(), tag.trim())
        }
        Some(lang) => lang.to_name().to_string(),
        None => tag.trim().to_string(),
    }
}
