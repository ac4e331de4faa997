/*!
 * Workbook <-> XLIFF conversion.
 *
 * Export (workbook to XLIFF) applies first-occurrence-wins deduplication per
 * sheet. Import (XLIFF to workbook) applies numeric coercion of `maxwidth`.
 * Batch variants read their inputs from disk and return one outcome per file.
 */

use std::path::PathBuf;

use log::{debug, info, warn};

use crate::app_config::ConversionConfig;
use crate::batch::{self, BatchReport, WorkerFailure};
use crate::errors::ConversionError;
use crate::language_utils::{self, LanguageTagStyle};
use crate::spreadsheet_codec::{self, SheetTable};
use crate::translation_unit::LanguageDocument;
use crate::xliff_codec::XliffCodec;

impl WorkerFailure for ConversionError {
    fn worker_failed(item: &str, reason: String) -> Self {
        ConversionError::SourceRead {
            source_name: item.to_string(),
            reason: format!("conversion worker failed: {}", reason),
        }
    }
}

/// One XLIFF document produced from one sheet
#[derive(Debug, Clone)]
pub struct XliffExport {
    /// Sheet name the document came from
    pub language_tag: String,

    /// Suggested filename for saving the document
    pub file_name: String,

    /// Serialized XLIFF text
    pub xml: String,

    /// Number of trans-units written
    pub unit_count: usize,

    /// Ids of rows dropped because their id was already seen
    pub dropped_duplicates: Vec<String>,
}

/// A workbook produced from one or more XLIFF documents
#[derive(Debug, Clone)]
pub struct WorkbookImport {
    /// Documents written into the workbook, one sheet each
    pub documents: Vec<LanguageDocument>,

    /// Suggested filename for saving the workbook
    pub file_name: String,

    /// XLSX bytes
    pub bytes: Vec<u8>,
}

/// Converts between workbooks and XLIFF documents
#[derive(Debug, Clone)]
pub struct Converter {
    codec: XliffCodec,
    tag_style: LanguageTagStyle,
    max_workers: usize,
}

impl Default for Converter {
    fn default() -> Self {
        Self::new(&ConversionConfig::default())
    }
}

impl Converter {
    pub fn new(config: &ConversionConfig) -> Self {
        Self {
            codec: XliffCodec::new(config.language_tag_style),
            tag_style: config.language_tag_style,
            max_workers: config.max_workers.max(1),
        }
    }

    pub fn codec(&self) -> &XliffCodec {
        &self.codec
    }

    /// Export every sheet of a workbook held in memory
    pub fn export_workbook(&self, bytes: &[u8], source_name: &str) -> Result<Vec<XliffExport>, ConversionError> {
        let sheets = spreadsheet_codec::read_workbook(bytes, source_name)?;
        debug!("Read {} sheet(s) from {}", sheets.len(), source_name);
        self.export_sheets(&sheets)
    }

    /// Export already-read sheets, one XLIFF document per sheet
    pub fn export_sheets(&self, sheets: &[SheetTable]) -> Result<Vec<XliffExport>, ConversionError> {
        sheets.iter().map(|sheet| self.export_sheet(sheet)).collect()
    }

    /// Export one sheet; later rows repeating an id are dropped
    pub fn export_sheet(&self, sheet: &SheetTable) -> Result<XliffExport, ConversionError> {
        let (document, dropped) = sheet.to_document()?;
        if !dropped.is_empty() {
            warn!(
                "Sheet '{}': dropped {} row(s) with an already-seen id: {}",
                sheet.name,
                dropped.len(),
                dropped.join(", ")
            );
        }

        let mut export = self.export_document(&document)?;
        export.dropped_duplicates = dropped;
        Ok(export)
    }

    /// Serialize a document that is already deduplicated
    pub fn export_document(&self, document: &LanguageDocument) -> Result<XliffExport, ConversionError> {
        let xml = self.codec.serialize(document)?;
        info!(
            "Exported {} unit(s) for {}",
            document.len(),
            language_utils::describe_language(&document.language_tag)
        );

        Ok(XliffExport {
            language_tag: document.language_tag.clone(),
            file_name: language_utils::suggested_xliff_filename(&document.language_tag, self.tag_style),
            xml,
            unit_count: document.len(),
            dropped_duplicates: Vec::new(),
        })
    }

    /// Parse one XLIFF document without writing a workbook
    pub fn parse_xliff(&self, xml: &str, source_name: &str) -> Result<LanguageDocument, ConversionError> {
        let document = self.codec.parse(xml, source_name)?;
        let duplicates = document.duplicate_ids();
        if !duplicates.is_empty() {
            warn!(
                "{} repeats trans-unit id(s) {}; keeping every occurrence",
                source_name,
                duplicates.join(", ")
            );
        }
        Ok(document)
    }

    /// Convert one XLIFF document into a single-sheet workbook
    pub fn import_xliff(&self, xml: &str, source_name: &str) -> Result<WorkbookImport, ConversionError> {
        let document = self.parse_xliff(xml, source_name)?;
        let file_name = language_utils::suggested_workbook_filename(&document.language_tag, self.tag_style);
        self.import_documents(vec![document], &file_name)
    }

    /// Write documents into one workbook, a sheet per document
    pub fn import_documents(
        &self,
        documents: Vec<LanguageDocument>,
        file_name: &str,
    ) -> Result<WorkbookImport, ConversionError> {
        let tables: Vec<SheetTable> = documents.iter().map(SheetTable::from_document).collect();
        let bytes = spreadsheet_codec::write_workbook(&tables, file_name)?;
        info!("Imported {} document(s) into {}", documents.len(), file_name);

        Ok(WorkbookImport {
            documents,
            file_name: file_name.to_string(),
            bytes,
        })
    }

    /// Export many workbooks; a failing file does not stop the others
    pub async fn export_batch<P>(&self, inputs: Vec<PathBuf>, progress: P) -> BatchReport<Vec<XliffExport>, ConversionError>
    where
        P: Fn(usize, usize) + Clone + Send + 'static,
    {
        let converter = self.clone();
        batch::run_bounded(
            named_inputs(inputs),
            self.max_workers,
            move |path: PathBuf| {
                let bytes = std::fs::read(&path).map_err(|e| ConversionError::SourceRead {
                    source_name: path.display().to_string(),
                    reason: e.to_string(),
                })?;
                converter.export_workbook(&bytes, &path.display().to_string())
            },
            progress,
        )
        .await
    }

    /// Import many XLIFF files, one workbook per file
    pub async fn import_batch<P>(&self, inputs: Vec<PathBuf>, progress: P) -> BatchReport<WorkbookImport, ConversionError>
    where
        P: Fn(usize, usize) + Clone + Send + 'static,
    {
        let converter = self.clone();
        batch::run_bounded(
            named_inputs(inputs),
            self.max_workers,
            move |path: PathBuf| {
                let xml = std::fs::read_to_string(&path).map_err(|e| ConversionError::SourceRead {
                    source_name: path.display().to_string(),
                    reason: e.to_string(),
                })?;
                converter.import_xliff(&xml, &path.display().to_string())
            },
            progress,
        )
        .await
    }

    /// Parse many XLIFF files, for combining them into one workbook
    pub async fn parse_batch<P>(&self, inputs: Vec<PathBuf>, progress: P) -> BatchReport<LanguageDocument, ConversionError>
    where
        P: Fn(usize, usize) + Clone + Send + 'static,
    {
        let converter = self.clone();
        batch::run_bounded(
            named_inputs(inputs),
            self.max_workers,
            move |path: PathBuf| {
                let xml = std::fs::read_to_string(&path).map_err(|e| ConversionError::SourceRead {
                    source_name: path.display().to_string(),
                    reason: e.to_string(),
                })?;
                converter.parse_xliff(&xml, &path.display().to_string())
            },
            progress,
        )
        .await
    }
}

fn named_inputs(inputs: Vec<PathBuf>) -> Vec<(String, PathBuf)> {
    inputs
        .into_iter()
        .map(|path| {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string());
            (name, path)
        })
        .collect()
}
