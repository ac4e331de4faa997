/*!
 * Tests for error types
 */

use xliffsheet::errors::{AppError, ConversionError, PackageError};

#[test]
fn test_conversionError_malformedRow_shouldNameSheetAndRow() {
    let error = ConversionError::MalformedRow {
        sheet: "fr".to_string(),
        row: 7,
        reason: "missing id".to_string(),
    };
    assert_eq!(error.to_string(), "Malformed row 7 in sheet 'fr': missing id");
}

#[test]
fn test_conversionError_parse_shouldNameSource() {
    let error = ConversionError::Parse {
        source_name: "fr.xlf".to_string(),
        reason: "unexpected end".to_string(),
    };
    assert_eq!(error.to_string(), "Invalid XLIFF in 'fr.xlf': unexpected end");
}

#[test]
fn test_packageError_filenameFormat_shouldShowExpectedPattern() {
    let error = PackageError::FilenameFormat {
        filename: "Account.objectTranslation".to_string(),
        extension: "objectTranslation".to_string(),
    };
    assert_eq!(
        error.to_string(),
        "Fragment filename 'Account.objectTranslation' does not match <objectApiName>-<languageCode>.objectTranslation"
    );
}

#[test]
fn test_appError_fromConversionError_shouldWrapCorrectly() {
    let error: AppError = ConversionError::Session("nothing converted".to_string()).into();
    assert!(matches!(error, AppError::Conversion(_)));
    assert_eq!(error.to_string(), "Conversion error: Review session is empty: nothing converted");
}

#[test]
fn test_appError_fromIoError_shouldWrapAsFileError() {
    let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
    let error: AppError = io_error.into();
    assert!(matches!(error, AppError::File(_)));
}

#[test]
fn test_appError_fromAnyhowError_shouldWrapAsUnknown() {
    let error: AppError = anyhow::anyhow!("boom").into();
    assert_eq!(error.to_string(), "Unknown error: boom");
}
