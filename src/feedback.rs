/*!
 * Reviewer feedback columns.
 *
 * Annotated sheets keep the six base columns and append, in order, an
 * optional `Translated to English` lookup column, an empty `Feedback By
 * Customer` column and a `Feedback for Length` formula that checks the
 * customer's text against the row's max width.
 */

use log::{debug, info};

use crate::errors::ConversionError;
use crate::spreadsheet_codec::{self, columns, Cell, SheetTable, BASE_HEADER};
use crate::translation_unit::{LanguageDocument, TranslationUnit};

pub const ENGLISH_HEADER: &str = "Translated to English";
pub const CUSTOMER_FEEDBACK_HEADER: &str = "Feedback By Customer";
pub const LENGTH_FEEDBACK_HEADER: &str = "Feedback for Length";

/// Result shown by the length check when the feedback fits
pub const LENGTH_OK: &str = "OK";

/// One annotated row
#[derive(Debug, Clone, PartialEq)]
pub struct FeedbackRow {
    pub unit: TranslationUnit,

    /// Reference target for the same id, when a reference was supplied
    pub english_target: Option<String>,

    /// Text entered by the reviewer, empty when generated
    pub customer_feedback: String,
}

impl FeedbackRow {
    /// Set the reviewer text, as a reviewer would in the sheet
    pub fn with_customer_feedback(mut self, feedback: impl Into<String>) -> Self {
        self.customer_feedback = feedback.into();
        self
    }

    /// Value the length formula evaluates to for this row
    pub fn length_feedback(&self) -> String {
        evaluate_length_feedback(&spreadsheet_codec::max_width_cell(&self.unit), &self.customer_feedback)
    }
}

/// A language document extended with reviewer columns
#[derive(Debug, Clone, PartialEq)]
pub struct FeedbackSheet {
    pub language_tag: String,
    pub has_reference: bool,
    pub rows: Vec<FeedbackRow>,
}

impl FeedbackSheet {
    /// Header titles, base columns first
    pub fn header(&self) -> Vec<String> {
        let mut header: Vec<String> = BASE_HEADER.iter().map(|title| title.to_string()).collect();
        if self.has_reference {
            header.push(ENGLISH_HEADER.to_string());
        }
        header.push(CUSTOMER_FEEDBACK_HEADER.to_string());
        header.push(LENGTH_FEEDBACK_HEADER.to_string());
        header
    }

    /// Zero-based column of the reviewer's text
    pub fn customer_feedback_column(&self) -> usize {
        BASE_HEADER.len() + usize::from(self.has_reference)
    }

    /// Zero-based column of the length formula
    pub fn length_feedback_column(&self) -> usize {
        self.customer_feedback_column() + 1
    }

    /// Formula text for a zero-based data row index
    pub fn length_formula(&self, row_index: usize) -> String {
        // Data starts on spreadsheet row 2
        let row_number = row_index + 2;
        length_feedback_formula(
            &format!("{}{}", column_letter(columns::MAX_WIDTH), row_number),
            &format!("{}{}", column_letter(self.customer_feedback_column()), row_number),
        )
    }

    /// Sheet ready to be written, formulas included
    pub fn to_table(&self) -> SheetTable {
        let base = SheetTable::from_document(&LanguageDocument {
            language_tag: self.language_tag.clone(),
            units: self.rows.iter().map(|row| row.unit.clone()).collect(),
        });

        let rows = base
            .rows
            .into_iter()
            .zip(&self.rows)
            .enumerate()
            .map(|(index, (mut cells, row))| {
                if self.has_reference {
                    cells.push(Cell::text(row.english_target.clone().unwrap_or_default()));
                }
                cells.push(Cell::text(row.customer_feedback.clone()));
                cells.push(Cell::Formula {
                    expression: self.length_formula(index),
                    cached: row.length_feedback(),
                });
                cells
            })
            .collect();

        SheetTable {
            name: self.language_tag.clone(),
            header: self.header(),
            rows,
        }
    }
}

/// Builds feedback sheets from converted documents
#[derive(Debug, Clone, Copy, Default)]
pub struct FeedbackAnnotator;

impl FeedbackAnnotator {
    /// Annotate one document, looking up reference targets by id.
    ///
    /// Ids missing from the reference resolve to an empty string.
    pub fn annotate(&self, document: &LanguageDocument, reference: Option<&LanguageDocument>) -> FeedbackSheet {
        let index = reference.map(LanguageDocument::target_index);
        let mut misses = 0usize;

        let rows = document
            .units
            .iter()
            .map(|unit| {
                let english_target = index.as_ref().map(|index| match index.get(unit.id.as_str()) {
                    Some(target) => target.to_string(),
                    None => {
                        misses += 1;
                        String::new()
                    }
                });
                FeedbackRow {
                    unit: unit.clone(),
                    english_target,
                    customer_feedback: String::new(),
                }
            })
            .collect();

        if misses > 0 {
            debug!(
                "{} id(s) of '{}' have no reference translation",
                misses, document.language_tag
            );
        }

        FeedbackSheet {
            language_tag: document.language_tag.clone(),
            has_reference: reference.is_some(),
            rows,
        }
    }

    /// Annotate documents and write them as one workbook
    pub fn annotate_workbook(
        &self,
        documents: &[LanguageDocument],
        reference: Option<&LanguageDocument>,
        file_name: &str,
    ) -> Result<Vec<u8>, ConversionError> {
        let tables: Vec<SheetTable> = documents
            .iter()
            .map(|document| self.annotate(document, reference).to_table())
            .collect();

        info!(
            "Annotated {} sheet(s) for review{}",
            tables.len(),
            if reference.is_some() { " with reference translations" } else { "" }
        );
        spreadsheet_codec::write_workbook(&tables, file_name)
    }
}

/// Excel formula checking the reviewer's text against the max width.
///
/// Empty feedback gives an empty cell, feedback longer than the width gives
/// the "too long" message with both numbers, anything else gives `OK`.
pub fn length_feedback_formula(width_cell: &str, feedback_cell: &str) -> String {
    format!(
        "=IF({f}=\"\",\"\",IF(LEN({f})>{w},\"* The new translation is too long (\"&LEN({f})&\") should be under \"&{w}&\" chars\",\"{ok}\"))",
        f = feedback_cell,
        w = width_cell,
        ok = LENGTH_OK
    )
}

/// Evaluate the length formula for the given width cell and feedback.
///
/// A blank width cell counts as 0 in the comparison and as empty text in
/// the message. Text compares greater than any number, so a textual width
/// always gives `OK`.
pub fn evaluate_length_feedback(width: &Cell, feedback: &str) -> String {
    if feedback.is_empty() {
        return String::new();
    }

    let length = feedback.chars().count();
    let limit = match width {
        Cell::Empty => 0.0,
        Cell::Number(n) => *n,
        _ => return LENGTH_OK.to_string(),
    };

    if length as f64 > limit {
        format!(
            "* The new translation is too long ({}) should be under {} chars",
            length,
            width.stringify()
        )
    } else {
        LENGTH_OK.to_string()
    }
}

/// Convert column index to Excel column letter (0 = A, 25 = Z, 26 = AA, etc.)
pub fn column_letter(col: usize) -> String {
    let mut result = String::new();
    let mut n = col;
    loop {
        result.insert(0, (b'A' + (n % 26) as u8) as char);
        if n < 26 {
            break;
        }
        n = n / 26 - 1;
    }
    result
}
