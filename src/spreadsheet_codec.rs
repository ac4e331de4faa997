use std::collections::HashSet;
use std::io::Cursor;

use calamine::{open_workbook_auto_from_rs, Data, Reader};
use log::{debug, warn};
use rust_xlsxwriter::{Format, Formula, Workbook, Worksheet};

use crate::errors::ConversionError;
use crate::translation_unit::{LanguageDocument, MaxWidth, TranslationUnit};

// @module: Workbook reading and writing

/// Column titles of the six base columns, in positional order
pub const BASE_HEADER: [&str; 6] = ["ID", "Max Width", "Size Unit", "Source", "Target", "Note"];

/// Longest worksheet name a workbook accepts
pub const MAX_SHEET_NAME_CHARS: usize = 31;

/// Fewest columns a data row must have (id through target)
pub const MIN_ROW_COLUMNS: usize = 5;

/// Zero-based column positions of the base columns
pub mod columns {
    pub const ID: usize = 0;
    pub const MAX_WIDTH: usize = 1;
    pub const SIZE_UNIT: usize = 2;
    pub const SOURCE: usize = 3;
    pub const TARGET: usize = 4;
    pub const NOTE: usize = 5;
}

/// Value of a single spreadsheet cell
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
    /// Live formula plus the result cached for viewers that do not recalculate
    Formula { expression: String, cached: String },
}

impl Cell {
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    /// Empty cells and empty strings
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Empty => true,
            Self::Text(text) => text.is_empty(),
            _ => false,
        }
    }

    /// Cell rendered as text; integral numbers lose their decimal part
    pub fn stringify(&self) -> String {
        match self {
            Self::Empty => String::new(),
            Self::Text(text) => text.clone(),
            Self::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    format!("{}", *n as i64)
                } else {
                    format!("{}", n)
                }
            }
            Self::Bool(b) => if *b { "TRUE" } else { "FALSE" }.to_string(),
            Self::Formula { cached, .. } => cached.clone(),
        }
    }

    /// Width constraint held by this cell, if it is numeric
    pub fn to_max_width(&self) -> Option<MaxWidth> {
        match self {
            Self::Number(n) => MaxWidth::from_number(*n),
            Self::Text(text) => {
                let width = MaxWidth::coerce(text);
                if width.is_none() && !text.trim().is_empty() {
                    debug!("Ignoring non-numeric max width cell '{}'", text);
                }
                width
            }
            _ => None,
        }
    }
}

impl From<&Data> for Cell {
    fn from(data: &Data) -> Self {
        match data {
            Data::Empty => Cell::Empty,
            Data::String(s) => Cell::Text(s.clone()),
            Data::Float(n) => Cell::Number(*n),
            Data::Int(n) => Cell::Number(*n as f64),
            Data::Bool(b) => Cell::Bool(*b),
            Data::DateTime(dt) => Cell::Number(dt.as_f64()),
            Data::DateTimeIso(s) => Cell::Text(s.clone()),
            Data::DurationIso(s) => Cell::Text(s.clone()),
            Data::Error(e) => Cell::Text(format!("#{:?}", e)),
        }
    }
}

/// One worksheet: a header row followed by data rows
#[derive(Debug, Clone, PartialEq)]
pub struct SheetTable {
    /// Sheet name, which doubles as the language tag
    pub name: String,

    /// Titles of the first row
    pub header: Vec<String>,

    /// Data rows, starting at spreadsheet row 2
    pub rows: Vec<Vec<Cell>>,
}

impl SheetTable {
    pub fn new(name: impl Into<String>, header: Vec<String>) -> Self {
        Self {
            name: name.into(),
            header,
            rows: Vec::new(),
        }
    }

    /// Base table for a language document
    pub fn from_document(document: &LanguageDocument) -> Self {
        let mut table = Self::new(
            document.language_tag.clone(),
            BASE_HEADER.iter().map(|title| title.to_string()).collect(),
        );
        table.rows = document.units.iter().map(unit_to_row).collect();
        table
    }

    /// Convert rows into a language document, first occurrence of an id wins.
    ///
    /// Rows where every cell is blank are skipped. Returns the ids of the
    /// dropped duplicate rows alongside the document.
    pub fn to_document(&self) -> Result<(LanguageDocument, Vec<String>), ConversionError> {
        let mut units = Vec::with_capacity(self.rows.len());

        for (index, row) in self.rows.iter().enumerate() {
            if row.iter().all(Cell::is_blank) {
                continue;
            }
            units.push(self.row_to_unit(index + 2, row)?);
        }

        Ok(LanguageDocument::from_units_first_wins(self.name.clone(), units))
    }

    fn row_to_unit(&self, row_number: usize, row: &[Cell]) -> Result<TranslationUnit, ConversionError> {
        let malformed = |reason: String| ConversionError::MalformedRow {
            sheet: self.name.clone(),
            row: row_number,
            reason,
        };

        if row.len() < MIN_ROW_COLUMNS {
            return Err(malformed(format!(
                "expected at least {} columns, found {}",
                MIN_ROW_COLUMNS,
                row.len()
            )));
        }

        let id = row[columns::ID].stringify();
        if id.trim().is_empty() {
            return Err(malformed("missing id".to_string()));
        }

        let width = &row[columns::MAX_WIDTH];
        let target = &row[columns::TARGET];
        let note = row.get(columns::NOTE).filter(|cell| !cell.is_blank());

        Ok(TranslationUnit {
            id,
            max_width: width.to_max_width(),
            max_width_text: Some(width.stringify()),
            size_unit: row[columns::SIZE_UNIT].stringify(),
            source: row[columns::SOURCE].stringify(),
            target: (!target.is_blank()).then(|| target.stringify()),
            note: note.map(Cell::stringify),
        })
    }
}

/// Max width cell of a unit: numeric when it coerces, its text otherwise
pub fn max_width_cell(unit: &TranslationUnit) -> Cell {
    match (unit.max_width, unit.max_width_text.as_deref()) {
        (Some(width), _) => Cell::Number(width.as_f64()),
        (None, Some(text)) if !text.is_empty() => Cell::text(text),
        (None, _) => Cell::Empty,
    }
}

fn unit_to_row(unit: &TranslationUnit) -> Vec<Cell> {
    vec![
        Cell::text(unit.id.clone()),
        max_width_cell(unit),
        Cell::text(unit.size_unit.clone()),
        Cell::text(unit.source.clone()),
        Cell::text(unit.target_text()),
        Cell::text(unit.note.clone().unwrap_or_default()),
    ]
}

/// Read every sheet of an XLSX/XLS/ODS workbook held in memory
pub fn read_workbook(bytes: &[u8], source_name: &str) -> Result<Vec<SheetTable>, ConversionError> {
    let read_error = |reason: String| ConversionError::SourceRead {
        source_name: source_name.to_string(),
        reason,
    };

    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))
        .map_err(|e| read_error(e.to_string()))?;

    let mut sheets = Vec::new();
    for name in workbook.sheet_names() {
        let range = workbook
            .worksheet_range(&name)
            .map_err(|e| read_error(format!("sheet '{}': {}", name, e)))?;

        // Ranges start at the first used cell; pad back to A1
        let (first_row, first_col) = match range.start() {
            Some((row, col)) => (row as usize, col as usize),
            None => {
                sheets.push(SheetTable::new(name, Vec::new()));
                continue;
            }
        };

        let mut header = Vec::new();
        let mut rows = Vec::new();
        for (offset, cells) in range.rows().enumerate() {
            let mut row: Vec<Cell> = vec![Cell::Empty; first_col];
            row.extend(cells.iter().map(Cell::from));

            let absolute = first_row + offset;
            if absolute == 0 {
                header = row.iter().map(Cell::stringify).collect();
                continue;
            }
            // Rows above the used range are blank and get skipped later
            while rows.len() < absolute - 1 {
                rows.push(Vec::new());
            }
            rows.push(row);
        }

        sheets.push(SheetTable { name, header, rows });
    }

    Ok(sheets)
}

/// Write tables into a new workbook, one worksheet per table
pub fn write_workbook(sheets: &[SheetTable], target_name: &str) -> Result<Vec<u8>, ConversionError> {
    let write_error = |reason: String| ConversionError::Write {
        target: target_name.to_string(),
        reason,
    };

    let mut workbook = Workbook::new();
    let header_format = Format::new().set_bold();
    let names = unique_sheet_names(sheets.iter().map(|sheet| sheet.name.as_str()));

    for (sheet, name) in sheets.iter().zip(&names) {
        if *name != sheet.name {
            warn!("Sheet '{}' written as '{}'", sheet.name, name);
        }
        let worksheet = workbook.add_worksheet();
        worksheet
            .set_name(name)
            .map_err(|e| write_error(format!("sheet '{}': {}", name, e)))?;

        for (col, title) in sheet.header.iter().enumerate() {
            worksheet
                .write_string_with_format(0, col as u16, title, &header_format)
                .map_err(|e| write_error(format!("header '{}': {}", title, e)))?;
        }

        for (index, row) in sheet.rows.iter().enumerate() {
            for (col, cell) in row.iter().enumerate() {
                write_cell(worksheet, index as u32 + 1, col as u16, cell)
                    .map_err(|e| write_error(format!("sheet '{}' row {}: {}", sheet.name, index + 2, e)))?;
            }
        }
    }

    workbook
        .save_to_buffer()
        .map_err(|e| write_error(e.to_string()))
}

/// Worksheet names a workbook accepts, in input order.
///
/// Characters Excel forbids become `_`, names are cut to 31 characters and
/// a name already taken (ignoring case) gets a `_2`, `_3`, ... suffix.
pub fn unique_sheet_names<'a, I>(names: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut taken: HashSet<String> = HashSet::new();
    let mut result = Vec::new();

    for name in names {
        let mut base: String = name
            .chars()
            .map(|c| if matches!(c, '[' | ']' | ':' | '*' | '?' | '/' | '\\') { '_' } else { c })
            .collect();
        base = base.trim_matches('\'').to_string();
        if base.trim().is_empty() {
            base = "Sheet".to_string();
        }
        let base: String = base.chars().take(MAX_SHEET_NAME_CHARS).collect();

        let mut candidate = base.clone();
        let mut counter = 2;
        while taken.contains(&candidate.to_lowercase()) {
            let suffix = format!("_{}", counter);
            let keep = MAX_SHEET_NAME_CHARS - suffix.chars().count();
            candidate = format!("{}{}", base.chars().take(keep).collect::<String>(), suffix);
            counter += 1;
        }

        taken.insert(candidate.to_lowercase());
        result.push(candidate);
    }

    result
}

fn write_cell(worksheet: &mut Worksheet, row: u32, col: u16, cell: &Cell) -> Result<(), rust_xlsxwriter::XlsxError> {
    match cell {
        Cell::Empty => {}
        Cell::Text(text) if text.is_empty() => {}
        Cell::Text(text) => {
            worksheet.write_string(row, col, text)?;
        }
        Cell::Number(n) => {
            worksheet.write_number(row, col, *n)?;
        }
        Cell::Bool(b) => {
            worksheet.write_boolean(row, col, *b)?;
        }
        Cell::Formula { expression, cached } => {
            let formula = Formula::new(expression).set_result(cached);
            worksheet.write_formula(row, col, formula)?;
        }
    }
    Ok(())
}
