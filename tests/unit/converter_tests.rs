/*!
 * Tests for single-file and batch conversion
 */

use anyhow::Result;
use xliffsheet::app_config::ConversionConfig;
use xliffsheet::converter::Converter;
use xliffsheet::errors::ConversionError;
use xliffsheet::language_utils::LanguageTagStyle;
use xliffsheet::spreadsheet_codec;
use xliffsheet::translation_unit::MaxWidth;

use crate::common;

#[test]
fn test_export_workbook_withTwoSheets_shouldProduceOneDocumentPerSheet() -> Result<()> {
    let exports = Converter::default().export_workbook(&common::sample_workbook(), "sample.xlsx")?;

    assert_eq!(exports.len(), 2);
    assert_eq!(exports[0].language_tag, "fr");
    assert_eq!(exports[0].file_name, "fr_output.xlf");
    assert_eq!(exports[0].unit_count, 2);
    assert_eq!(exports[1].file_name, "pt_BR_output.xlf");
    assert!(exports[0].xml.contains("<target>Nom du compte</target>"));
    assert!(exports[0].xml.contains("<target>&lt;&gt;</target>"));
    assert!(exports[0].xml.contains("<note>keep short</note>"));
    Ok(())
}

#[test]
fn test_export_sheet_withDuplicateIds_shouldReportDroppedRows() -> Result<()> {
    let table = common::sheet(
        "fr",
        vec![
            common::row("A", Some(10.0), "first", "premier", ""),
            common::row("A", Some(10.0), "second", "deuxieme", ""),
        ],
    );

    let export = Converter::default().export_sheet(&table)?;

    assert_eq!(export.unit_count, 1);
    assert_eq!(export.dropped_duplicates, vec!["A".to_string()]);
    assert!(export.xml.contains("premier"));
    assert!(!export.xml.contains("deuxieme"));
    Ok(())
}

#[test]
fn test_export_withHyphenatedStyle_shouldApplyToFilenameAndAttribute() -> Result<()> {
    let converter = Converter::new(&ConversionConfig {
        language_tag_style: LanguageTagStyle::HyphenatedLowercase,
        max_workers: 2,
    });

    let exports = converter.export_workbook(&common::sample_workbook(), "sample.xlsx")?;

    assert_eq!(exports[1].file_name, "pt-br_output.xlf");
    assert!(exports[1].xml.contains("target-language=\"pt-br\""));
    Ok(())
}

#[test]
fn test_import_xliff_withWidths_shouldCoerceNumbers() -> Result<()> {
    let xml = common::sample_xliff(
        "fr",
        &[("A", "40", "a", "x"), ("B", "40.5", "b", "y"), ("C", "wide", "c", "z")],
    );

    let workbook = Converter::default().import_xliff(&xml, "fr.xlf")?;
    assert_eq!(workbook.file_name, "fr.xlsx");

    let sheets = spreadsheet_codec::read_workbook(&workbook.bytes, &workbook.file_name)?;
    let (document, _) = sheets[0].to_document()?;
    assert_eq!(sheets[0].name, "fr");
    assert_eq!(document.units[0].max_width, Some(MaxWidth::Integer(40)));
    assert_eq!(document.units[1].max_width, Some(MaxWidth::Decimal(40.5)));
    assert_eq!(document.units[2].max_width, None);
    Ok(())
}

#[tokio::test]
async fn test_import_batch_withOneBrokenFile_shouldReportPerItem() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let fr = common::create_test_file(temp_dir.path(), "fr.xlf", &common::sample_xliff("fr", &[("A", "10", "a", "b")]))?;
    let broken = common::create_test_file(temp_dir.path(), "broken.xlf", "<xliff><file>")?;
    let de = common::create_test_file(temp_dir.path(), "de.xlf", &common::sample_xliff("de", &[("A", "10", "a", "b")]))?;

    let report = Converter::default().import_batch(vec![fr, broken, de], |_, _| {}).await;

    assert_eq!(report.len(), 3);
    assert_eq!(report.success_count(), 2);
    let failures: Vec<_> = report.failures().collect();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].0, "broken.xlf");
    assert!(matches!(failures[0].1, ConversionError::Parse { .. }));
    assert_eq!(report.outcomes[2].item, "de.xlf");
    Ok(())
}

#[tokio::test]
async fn test_export_batch_withMissingFile_shouldReportSourceRead() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let good = common::create_test_bytes(temp_dir.path(), "good.xlsx", &common::sample_workbook())?;
    let missing = temp_dir.path().join("missing.xlsx");

    let report = Converter::default().export_batch(vec![good, missing], |_, _| {}).await;

    assert_eq!(report.success_count(), 1);
    assert!(matches!(
        report.failures().next(),
        Some(("missing.xlsx", ConversionError::SourceRead { .. }))
    ));
    Ok(())
}

#[test]
fn test_import_documents_withSameLanguageTwice_shouldWriteBothSheets() -> Result<()> {
    let converter = Converter::default();
    let french = converter.parse_xliff(&common::sample_xliff("fr", &[("A", "5", "a", "b")]), "fr.xlf")?;

    let combined = converter.import_documents(vec![french.clone(), french], "translations.xlsx")?;

    let sheets = spreadsheet_codec::read_workbook(&combined.bytes, &combined.file_name)?;
    let names: Vec<&str> = sheets.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["fr", "fr_2"]);
    assert_eq!(combined.documents.len(), 2);
    Ok(())
}
