/*!
 * Review session.
 *
 * Holds the most recent conversion result so that the feedback step can
 * annotate it directly, instead of saving the workbook and loading it back.
 */

use log::debug;
use parking_lot::Mutex;

use crate::converter::WorkbookImport;
use crate::errors::ConversionError;
use crate::feedback::FeedbackAnnotator;
use crate::translation_unit::LanguageDocument;

/// Workbook produced by the feedback step
#[derive(Debug, Clone)]
pub struct AnnotatedWorkbook {
    /// Suggested filename, derived from the converted workbook's name
    pub file_name: String,

    /// XLSX bytes with the feedback columns
    pub bytes: Vec<u8>,

    /// Number of annotated sheets
    pub sheet_count: usize,
}

/// Explicit holder of the last produced conversion artifact
#[derive(Debug, Default)]
pub struct ReviewSession {
    last: Mutex<Option<WorkbookImport>>,
    annotator: FeedbackAnnotator,
}

impl ReviewSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remember a conversion result, replacing the previous one
    pub fn record(&self, artifact: WorkbookImport) {
        debug!("Review session now holds {}", artifact.file_name);
        *self.last.lock() = Some(artifact);
    }

    pub fn has_artifact(&self) -> bool {
        self.last.lock().is_some()
    }

    /// Suggested filename of the held artifact
    pub fn last_file_name(&self) -> Option<String> {
        self.last.lock().as_ref().map(|artifact| artifact.file_name.clone())
    }

    /// Annotate the held artifact for review, without touching the disk
    pub fn annotate_last(&self, reference: Option<&LanguageDocument>) -> Result<AnnotatedWorkbook, ConversionError> {
        let guard = self.last.lock();
        let artifact = guard.as_ref().ok_or_else(|| {
            ConversionError::Session("convert a document before requesting feedback columns".to_string())
        })?;

        let file_name = feedback_file_name(&artifact.file_name);
        let bytes = self
            .annotator
            .annotate_workbook(&artifact.documents, reference, &file_name)?;

        Ok(AnnotatedWorkbook {
            file_name,
            bytes,
            sheet_count: artifact.documents.len(),
        })
    }
}

/// `fr.xlsx` -> `fr_feedback.xlsx`
pub fn feedback_file_name(file_name: &str) -> String {
    match file_name.rsplit_once('.') {
        Some((stem, extension)) if !stem.is_empty() => format!("{}_feedback.{}", stem, extension),
        _ => format!("{}_feedback.xlsx", file_name),
    }
}
