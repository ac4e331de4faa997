/*!
 * # xliffsheet - translation workbooks, XLIFF and deployment packages
 *
 * A Rust library for moving localization data between XLSX workbooks and
 * XLIFF 1.2 documents, and for packaging metadata translations.
 *
 * ## Features
 *
 * - Export workbooks (one sheet per language) to XLIFF, first occurrence of an id wins
 * - Import XLIFF back into workbooks, optionally combining languages into one workbook
 * - Reviewer feedback columns with a length-check formula per row
 * - Reference ("English") column looked up by id from a second document
 * - Per-language deployment archives with a generated `package.xml`
 * - Batch processing on a bounded worker pool with per-file outcomes
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `translation_unit`: The translation unit record and language documents
 * - `xliff_codec`: XLIFF 1.2 parsing and serialization
 * - `spreadsheet_codec`: XLSX reading and writing
 * - `converter`: Single-file and batch conversion
 * - `feedback`: Reviewer feedback columns and formulas
 * - `package_builder`: Fragment stripping, manifests and archives
 * - `session`: The review session holding the last conversion result
 * - `batch`: Bounded worker pool and per-item outcomes
 * - `app_config`: Configuration management
 * - `file_utils`: File system operations and location selection
 * - `app_controller`: Main application controller
 * - `language_utils`: Language tag utilities
 * - `errors`: Custom error types for the application
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod app_controller;
pub mod batch;
pub mod converter;
pub mod errors;
pub mod feedback;
pub mod file_utils;
pub mod language_utils;
pub mod package_builder;
pub mod session;
pub mod spreadsheet_codec;
pub mod translation_unit;
pub mod xliff_codec;

// Re-export main types for easier usage
pub use app_config::Config;
pub use converter::{Converter, WorkbookImport, XliffExport};
pub use errors::{AppError, ConversionError, PackageError};
pub use feedback::{FeedbackAnnotator, FeedbackSheet};
pub use package_builder::{PackageBuilder, PackageReport, RawFragment};
pub use session::ReviewSession;
pub use translation_unit::{LanguageDocument, MaxWidth, TranslationUnit};
pub use xliff_codec::XliffCodec;
