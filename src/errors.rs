/*!
 * Error types for the xliffsheet application.
 *
 * This module contains custom error types for the conversion engine and the
 * package builder, using the thiserror crate for ergonomic error definitions.
 * Missing ids in a reference document are not errors: they resolve to an
 * empty string.
 */

use thiserror::Error;

/// Errors that can occur while converting between workbooks and XLIFF
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConversionError {
    /// The input could not be opened or parsed as a workbook
    #[error("Failed to read source '{source_name}': {reason}")]
    SourceRead {
        /// Name of the offending input
        source_name: String,
        /// Underlying cause
        reason: String,
    },

    /// A spreadsheet row does not have the expected shape
    #[error("Malformed row {row} in sheet '{sheet}': {reason}")]
    MalformedRow {
        /// Sheet (language) the row belongs to
        sheet: String,
        /// 1-based row number as shown by spreadsheet applications
        row: usize,
        /// What is wrong with the row
        reason: String,
    },

    /// The input is not well-formed XLIFF
    #[error("Invalid XLIFF in '{source_name}': {reason}")]
    Parse {
        /// Name of the offending input
        source_name: String,
        /// Underlying cause
        reason: String,
    },

    /// Serializing an output document failed
    #[error("Failed to write '{target}': {reason}")]
    Write {
        /// Name of the output being produced
        target: String,
        /// Underlying cause
        reason: String,
    },

    /// The review session holds no artifact to work on
    #[error("Review session is empty: {0}")]
    Session(String),
}

/// Errors that can occur while building deployment packages
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PackageError {
    /// The fragment filename does not follow `<object>-<language>.<extension>`
    #[error("Fragment filename '{filename}' does not match <objectApiName>-<languageCode>.{extension}")]
    FilenameFormat {
        /// Offending filename
        filename: String,
        /// Extension the builder expects
        extension: String,
    },

    /// The fragment could not be read
    #[error("Failed to read fragment '{filename}': {reason}")]
    SourceRead {
        /// Offending filename
        filename: String,
        /// Underlying cause
        reason: String,
    },

    /// The fragment is not well-formed XML
    #[error("Invalid XML in fragment '{filename}': {reason}")]
    Parse {
        /// Offending filename
        filename: String,
        /// Underlying cause
        reason: String,
    },

    /// The same object/language pair was supplied twice
    #[error("Duplicate fragment '{filename}' for {object_api_name}-{language_code}")]
    Duplicate {
        /// Offending filename
        filename: String,
        /// Object API name parsed from the filename
        object_api_name: String,
        /// Language code parsed from the filename
        language_code: String,
    },

    /// Writing the manifest or the archive failed
    #[error("Failed to build archive for language '{language_code}': {reason}")]
    Archive {
        /// Language whose bundle failed
        language_code: String,
        /// Underlying cause
        reason: String,
    },
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Error from a conversion
    #[error("Conversion error: {0}")]
    Conversion(#[from] ConversionError),

    /// Error from package building
    #[error("Package error: {0}")]
    Package(#[from] PackageError),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

// Utility functions for error conversion
impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(error.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}
