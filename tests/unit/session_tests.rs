/*!
 * Tests for the review session
 */

use anyhow::Result;
use xliffsheet::converter::Converter;
use xliffsheet::errors::ConversionError;
use xliffsheet::session::ReviewSession;
use xliffsheet::spreadsheet_codec;

use crate::common;

#[test]
fn test_annotate_last_withEmptySession_shouldReturnSessionError() {
    let session = ReviewSession::new();

    assert!(!session.has_artifact());
    assert!(matches!(session.annotate_last(None), Err(ConversionError::Session(_))));
}

#[test]
fn test_annotate_last_withRecordedImport_shouldAnnotateInMemory() -> Result<()> {
    let converter = Converter::default();
    let workbook = converter.import_xliff(&common::sample_xliff("fr", &[("1", "10", "Hello", "Salut")]), "fr.xlf")?;
    let session = ReviewSession::new();
    session.record(workbook);

    let annotated = session.annotate_last(None)?;

    assert_eq!(annotated.file_name, "fr_feedback.xlsx");
    assert_eq!(annotated.sheet_count, 1);
    let sheets = spreadsheet_codec::read_workbook(&annotated.bytes, &annotated.file_name)?;
    assert_eq!(sheets[0].header.len(), 8);
    assert_eq!(session.last_file_name().as_deref(), Some("fr.xlsx"));
    Ok(())
}

#[test]
fn test_record_withSecondImport_shouldReplaceFirst() -> Result<()> {
    let converter = Converter::default();
    let session = ReviewSession::new();
    session.record(converter.import_xliff(&common::sample_xliff("fr", &[]), "fr.xlf")?);
    session.record(converter.import_xliff(&common::sample_xliff("de", &[("A", "", "a", "b")]), "de.xlf")?);

    assert_eq!(session.last_file_name().as_deref(), Some("de.xlsx"));
    let annotated = session.annotate_last(None)?;
    let sheets = spreadsheet_codec::read_workbook(&annotated.bytes, &annotated.file_name)?;
    assert_eq!(sheets[0].name, "de");
    assert_eq!(annotated.file_name, "de_feedback.xlsx");
    Ok(())
}
