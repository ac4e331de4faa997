/*!
 * Common test utilities for the xliffsheet test suite
 */

#![allow(dead_code)]

use anyhow::Result;
use std::fs;
use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use xliffsheet::spreadsheet_codec::{self, Cell, SheetTable, BASE_HEADER};

/// Creates a temporary directory for test files
pub fn create_temp_dir() -> Result<TempDir> {
    Ok(TempDir::new()?)
}

/// Creates a test file with the given content in the specified directory
pub fn create_test_file(dir: &Path, filename: &str, content: &str) -> Result<PathBuf> {
    let file_path = dir.join(filename);
    fs::write(&file_path, content)?;
    Ok(file_path)
}

/// Creates a test file with binary content in the specified directory
pub fn create_test_bytes(dir: &Path, filename: &str, content: &[u8]) -> Result<PathBuf> {
    let file_path = dir.join(filename);
    fs::write(&file_path, content)?;
    Ok(file_path)
}

/// A row of the six base columns; an empty max width leaves the cell empty
pub fn row(id: &str, max_width: Option<f64>, source: &str, target: &str, note: &str) -> Vec<Cell> {
    vec![
        Cell::text(id),
        max_width.map(Cell::Number).unwrap_or(Cell::Empty),
        Cell::text("char"),
        Cell::text(source),
        Cell::text(target),
        Cell::text(note),
    ]
}

/// Sheet with the base header and the given rows
pub fn sheet(name: &str, rows: Vec<Vec<Cell>>) -> SheetTable {
    let mut table = SheetTable::new(name, BASE_HEADER.iter().map(|title| title.to_string()).collect());
    table.rows = rows;
    table
}

/// XLSX bytes for the given sheets
pub fn workbook_bytes(sheets: &[SheetTable]) -> Vec<u8> {
    spreadsheet_codec::write_workbook(sheets, "test.xlsx").expect("test workbook should be writable")
}

/// Two-language workbook used across the conversion tests
pub fn sample_workbook() -> Vec<u8> {
    workbook_bytes(&[
        sheet(
            "fr",
            vec![
                row("Account.Name", Some(40.0), "Account Name", "Nom du compte", ""),
                row("Account.Type", Some(20.0), "Type", "", "keep short"),
            ],
        ),
        sheet(
            "pt_BR",
            vec![row("Account.Name", Some(40.0), "Account Name", "Nome da conta", "")],
        ),
    ])
}

/// Minimal XLIFF document for one language
pub fn sample_xliff(language: &str, units: &[(&str, &str, &str, &str)]) -> String {
    let body: String = units
        .iter()
        .map(|(id, max_width, source, target)| {
            format!(
                r#"      <trans-unit id="{}" maxwidth="{}" size-unit="char">
        <source>{}</source>
        <target>{}</target>
      </trans-unit>
"#,
                id, max_width, source, target
            )
        })
        .collect();

    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<xliff version="1.2">
  <file original="Salesforce" source-language="en_US" target-language="{}" datatype="xml">
    <body>
{}    </body>
  </file>
</xliff>
"#,
        language, body
    )
}

/// Metadata translation fragment with every strippable section present
pub fn sample_fragment(label: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<CustomObjectTranslation xmlns="http://soap.sforce.com/2006/04/metadata">
    <caseValues>
        <plural>false</plural>
        <value>{label}</value>
    </caseValues>
    <fields>
        <label>Field</label>
        <name>Field__c</name>
    </fields>
    <validationRules>
        <errorMessage>Bad</errorMessage>
        <name>Rule</name>
    </validationRules>
    <webLinks>
        <label>Link</label>
        <name>Link</name>
    </webLinks>
    <layouts>
        <layout>Main</layout>
    </layouts>
    <fieldSets>
        <label>Set</label>
        <name>Set</name>
    </fieldSets>
    <gender>Masculine</gender>
</CustomObjectTranslation>
"#,
        label = label
    )
}

/// Entry names of a zip archive, in archive order
pub fn zip_entry_names(bytes: &[u8]) -> Result<Vec<String>> {
    let archive = zip::ZipArchive::new(Cursor::new(bytes.to_vec()))?;
    Ok(archive.file_names().map(|name| name.to_string()).collect::<Vec<_>>())
}

/// Text content of one zip entry
pub fn zip_entry_text(bytes: &[u8], name: &str) -> Result<String> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes.to_vec()))?;
    let mut entry = archive.by_name(name)?;
    let mut text = String::new();
    entry.read_to_string(&mut text)?;
    Ok(text)
}
