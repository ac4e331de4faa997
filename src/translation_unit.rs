use std::collections::{HashMap, HashSet};
use std::fmt;

// @module: Canonical translation unit and language document model

/// Target text written for units that have no translation yet
pub const MISSING_TARGET_MARKER: &str = "<>";

/// Numeric width constraint of a translation unit
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MaxWidth {
    /// Whole number of units
    Integer(i64),
    /// Fractional width
    Decimal(f64),
}

impl MaxWidth {
    /// Coerce a raw attribute or cell value into a width.
    ///
    /// All-digit input becomes an integer, anything else is tried as a
    /// decimal. Values that are neither yield `None`; this never fails.
    pub fn coerce(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }

        if trimmed.bytes().all(|b| b.is_ascii_digit()) {
            if let Ok(value) = trimmed.parse::<i64>() {
                return Some(Self::Integer(value));
            }
        }

        match trimmed.parse::<f64>() {
            Ok(value) if value.is_finite() => Some(Self::Decimal(value)),
            _ => None,
        }
    }

    /// Build a width from a numeric spreadsheet cell
    pub fn from_number(value: f64) -> Option<Self> {
        if !value.is_finite() {
            return None;
        }
        if value.fract() == 0.0 && value.abs() < 1e15 {
            Some(Self::Integer(value as i64))
        } else {
            Some(Self::Decimal(value))
        }
    }

    /// Width as a float, for spreadsheet cells and length checks
    pub fn as_f64(&self) -> f64 {
        match self {
            Self::Integer(value) => *value as f64,
            Self::Decimal(value) => *value,
        }
    }
}

impl fmt::Display for MaxWidth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(value) => write!(f, "{}", value),
            Self::Decimal(value) => write!(f, "{}", value),
        }
    }
}

// @struct: Single translation unit
#[derive(Debug, Clone, PartialEq)]
pub struct TranslationUnit {
    // @field: Business key, unique within a document
    pub id: String,

    // @field: Length constraint for the translated text
    pub max_width: Option<MaxWidth>,

    // @field: Width as written on a sheet, exported verbatim
    pub max_width_text: Option<String>,

    // @field: Unit of the width constraint
    pub size_unit: String,

    // @field: Original-language text
    pub source: String,

    // @field: Translated text, absent when not translated yet
    pub target: Option<String>,

    // @field: Free-text annotation
    pub note: Option<String>,
}

impl TranslationUnit {
    /// Create a unit with only an id and source text
    pub fn new(id: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            max_width: None,
            max_width_text: None,
            size_unit: String::new(),
            source: source.into(),
            target: None,
            note: None,
        }
    }

    pub fn with_max_width(mut self, max_width: Option<MaxWidth>) -> Self {
        self.max_width = max_width;
        self
    }

    pub fn with_max_width_text(mut self, text: impl Into<String>) -> Self {
        self.max_width_text = Some(text.into());
        self
    }

    pub fn with_size_unit(mut self, size_unit: impl Into<String>) -> Self {
        self.size_unit = size_unit.into();
        self
    }

    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    /// Width rendered as it is written into XLIFF attributes.
    ///
    /// Text taken from a sheet is kept as is, so `wide` or `007` survive
    /// export; otherwise the numeric width is formatted.
    pub fn max_width_string(&self) -> String {
        match &self.max_width_text {
            Some(text) => text.clone(),
            None => self.max_width.map(|w| w.to_string()).unwrap_or_default(),
        }
    }

    /// Target text, empty when absent
    pub fn target_text(&self) -> &str {
        self.target.as_deref().unwrap_or_default()
    }

    /// Target text for export: empty or absent targets become the marker
    pub fn target_or_marker(&self) -> &str {
        match self.target.as_deref() {
            Some(text) if !text.is_empty() => text,
            _ => MISSING_TARGET_MARKER,
        }
    }

    /// Note text, only when present and non-empty
    pub fn note_text(&self) -> Option<&str> {
        self.note.as_deref().filter(|note| !note.is_empty())
    }
}

/// Ordered translation units of one target language
#[derive(Debug, Clone, PartialEq)]
pub struct LanguageDocument {
    /// Sheet name or XLIFF `target-language`
    pub language_tag: String,

    /// Units in document order
    pub units: Vec<TranslationUnit>,
}

impl LanguageDocument {
    pub fn new(language_tag: impl Into<String>) -> Self {
        Self {
            language_tag: language_tag.into(),
            units: Vec::new(),
        }
    }

    /// Build a document where the first occurrence of every id wins.
    ///
    /// Returns the document and the ids of the dropped units, in the order
    /// they were dropped.
    pub fn from_units_first_wins<I>(language_tag: impl Into<String>, units: I) -> (Self, Vec<String>)
    where
        I: IntoIterator<Item = TranslationUnit>,
    {
        let mut document = Self::new(language_tag);
        let mut seen: HashSet<String> = HashSet::new();
        let mut dropped = Vec::new();

        for unit in units {
            if seen.contains(&unit.id) {
                dropped.push(unit.id);
                continue;
            }
            seen.insert(unit.id.clone());
            document.units.push(unit);
        }

        (document, dropped)
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Look up a unit by id
    pub fn find(&self, id: &str) -> Option<&TranslationUnit> {
        self.units.iter().find(|unit| unit.id == id)
    }

    /// Map of id to target text, first occurrence wins
    pub fn target_index(&self) -> HashMap<&str, &str> {
        let mut index = HashMap::with_capacity(self.units.len());
        for unit in &self.units {
            index.entry(unit.id.as_str()).or_insert_with(|| unit.target_text());
        }
        index
    }

    /// Ids occurring more than once, each reported once
    pub fn duplicate_ids(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        let mut reported = HashSet::new();
        let mut duplicates = Vec::new();
        for unit in &self.units {
            if !seen.insert(unit.id.as_str()) && reported.insert(unit.id.as_str()) {
                duplicates.push(unit.id.as_str());
            }
        }
        duplicates
    }
}
