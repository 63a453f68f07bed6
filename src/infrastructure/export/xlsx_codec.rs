// ============================================================
// XLSX CODEC
// ============================================================
// Read the first worksheet of an export workbook and write one back

use std::io::Cursor;

use calamine::{open_workbook_auto_from_rs, Data, Reader};
use rust_xlsxwriter::{Format, FormatBorder, Workbook, Worksheet, XlsxError};
use tracing::debug;

use crate::domain::error::AppError;
use crate::domain::export::{CellValue, PostProcessConfig, Scalar, Table};

/// Excel worksheet limits
const MAX_SHEET_ROWS: usize = 1_048_576;
const MAX_SHEET_COLUMNS: usize = 16_384;

const DATETIME_NUM_FORMAT: &str = "yyyy-mm-dd hh:mm:ss";

/// XLSX reader/writer for export tables
pub struct XlsxCodec {
    sheet_name: String,

    nested_column: String,

    detect_index_column: bool,
}

impl Default for XlsxCodec {
    fn default() -> Self {
        Self::new(&PostProcessConfig::default())
    }
}

impl XlsxCodec {
    pub fn new(config: &PostProcessConfig) -> Self {
        Self {
            sheet_name: config.sheet_name.clone(),
            nested_column: config.nested_column.clone(),
            detect_index_column: config.detect_index_column,
        }
    }

    /// Parse the first worksheet of a spreadsheet workbook; its first row
    /// holds the column names
    pub fn parse(&self, bytes: &[u8]) -> Result<Table, AppError> {
        // Format is sniffed from the bytes: xlsx, xlsb, xls or ods
        let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))
            .map_err(|e| AppError::ParseError(format!("Failed to open Excel workbook: {}", e)))?;

        let range = workbook
            .worksheet_range_at(0)
            .ok_or_else(|| AppError::ParseError("No worksheet found".to_string()))?
            .map_err(|e| AppError::ParseError(format!("Failed to read Excel range: {}", e)))?;

        let mut rows = range.rows();
        let headers = match rows.next() {
            Some(header_row) => header_row.iter().map(header_text).collect::<Vec<_>>(),
            None => Vec::new(),
        };

        let mut table = Table::with_headers(headers);
        let nested_index = table.column_index(&self.nested_column);

        for (row_idx, row) in rows.enumerate() {
            let cells = row
                .iter()
                .enumerate()
                .map(|(idx, cell)| {
                    CellValue::from_scalar(cell_scalar(cell), Some(idx) == nested_index)
                })
                .collect();

            table.push_row(cells).map_err(|cells| {
                AppError::ParseError(format!(
                    "Expected {} cells in sheet row {}, saw {}",
                    table.column_count(),
                    row_idx + 2,
                    cells.len()
                ))
            })?;
        }

        if self.detect_index_column && table.drop_ordinal_index() {
            debug!("Dropped existing row index column from Excel input");
        }

        debug!(
            rows = table.row_count(),
            columns = table.column_count(),
            "Parsed Excel export"
        );

        Ok(table)
    }

    /// Write a table to a single-sheet workbook with a leading row index column
    pub fn serialize(&self, table: &Table) -> Result<Vec<u8>, AppError> {
        if table.row_count() + 1 > MAX_SHEET_ROWS {
            return Err(AppError::SerializeError(format!(
                "{} rows exceed the worksheet limit of {}",
                table.row_count(),
                MAX_SHEET_ROWS - 1
            )));
        }
        if table.column_count() + 1 > MAX_SHEET_COLUMNS {
            return Err(AppError::SerializeError(format!(
                "{} columns exceed the worksheet limit of {}",
                table.column_count(),
                MAX_SHEET_COLUMNS - 1
            )));
        }

        let header_format = Format::new().set_bold().set_border(FormatBorder::Thin);
        let datetime_format = Format::new().set_num_format(DATETIME_NUM_FORMAT);

        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(self.sheet_name.as_str()).map_err(write_error)?;

        for (idx, name) in table.columns().iter().enumerate() {
            worksheet
                .write_string_with_format(0, (idx + 1) as u16, name.as_str(), &header_format)
                .map_err(write_error)?;
        }

        for (row_idx, row) in table.rows().iter().enumerate() {
            let sheet_row = (row_idx + 1) as u32;
            worksheet
                .write_number_with_format(sheet_row, 0, row_idx as f64, &header_format)
                .map_err(write_error)?;

            for (idx, cell) in row.iter().enumerate() {
                write_cell(worksheet, sheet_row, (idx + 1) as u16, cell, &datetime_format)
                    .map_err(write_error)?;
            }
        }

        workbook
            .save_to_buffer()
            .map_err(|e| AppError::SerializeError(format!("Failed to save Excel workbook: {}", e)))
    }
}

fn write_error(err: XlsxError) -> AppError {
    AppError::SerializeError(format!("Failed to write Excel sheet: {}", err))
}

fn write_cell(
    worksheet: &mut Worksheet,
    row: u32,
    col: u16,
    cell: &CellValue,
    datetime_format: &Format,
) -> Result<(), XlsxError> {
    match cell {
        CellValue::Plain(Scalar::Empty) => {}
        CellValue::Plain(Scalar::Text(text)) | CellValue::Markup(text) => {
            worksheet.write_string(row, col, text.as_str())?;
        }
        CellValue::Plain(Scalar::Int(value)) => {
            worksheet.write_number(row, col, *value as f64)?;
        }
        CellValue::Plain(Scalar::Float(value)) => {
            if value.is_finite() {
                worksheet.write_number(row, col, *value)?;
            } else if !value.is_nan() {
                worksheet.write_string(row, col, value.to_string().as_str())?;
            }
        }
        CellValue::Plain(Scalar::Bool(value)) => {
            worksheet.write_boolean(row, col, *value)?;
        }
        CellValue::Plain(Scalar::DateTime(serial)) => {
            worksheet.write_number_with_format(row, col, *serial, datetime_format)?;
        }
        CellValue::Structured(_) => {
            worksheet.write_string(row, col, cell.to_string().as_str())?;
        }
    }
    Ok(())
}

/// Column name for a header cell; whole numbers drop the decimal part
fn header_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", *f as i64),
        other => cell_scalar(other).to_string(),
    }
}

fn cell_scalar(cell: &Data) -> Scalar {
    match cell {
        Data::Empty => Scalar::Empty,
        Data::String(s) => Scalar::Text(s.clone()),
        Data::Int(i) => Scalar::Int(*i),
        Data::Float(f) => Scalar::Float(*f),
        Data::Bool(b) => Scalar::Bool(*b),
        Data::DateTime(dt) => Scalar::DateTime(dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => Scalar::Text(s.clone()),
        Data::Error(e) => Scalar::Text(e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use calamine::Xlsx;

    fn workbook_bytes(rows: &[&[&str]]) -> Vec<u8> {
        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();
        for (r, row) in rows.iter().enumerate() {
            for (c, value) in row.iter().enumerate() {
                if !value.is_empty() {
                    worksheet.write_string(r as u32, c as u16, *value).unwrap();
                }
            }
        }
        workbook.save_to_buffer().unwrap()
    }

    #[test]
    fn test_parse_first_sheet() {
        let bytes = workbook_bytes(&[
            &["A", "More"],
            &["<b>bold</b>", r#"{"x": 1}"#],
            &["plain", ""],
        ]);
        let table = XlsxCodec::default().parse(&bytes).unwrap();

        assert_eq!(table.columns(), &["A", "More"]);
        assert_eq!(table.rows()[0][0], CellValue::Markup("<b>bold</b>".to_string()));
        assert!(matches!(table.rows()[0][1], CellValue::Structured(_)));
        assert_eq!(table.rows()[1][0], CellValue::text("plain"));
        assert_eq!(table.rows()[1][1], CellValue::empty());
    }

    #[test]
    fn test_parse_numeric_cells() {
        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();
        worksheet.write_string(0, 0, "n").unwrap();
        worksheet.write_number(0, 1, 2020.0).unwrap();
        worksheet.write_number(1, 0, 1.5).unwrap();
        worksheet.write_boolean(1, 1, true).unwrap();
        let bytes = workbook.save_to_buffer().unwrap();

        let table = XlsxCodec::default().parse(&bytes).unwrap();
        assert_eq!(table.columns(), &["n", "2020"]);
        assert_eq!(table.rows()[0][0], CellValue::Plain(Scalar::Float(1.5)));
        assert_eq!(table.rows()[0][1], CellValue::Plain(Scalar::Bool(true)));
    }

    #[test]
    fn test_parse_corrupt_bytes_fails() {
        let err = XlsxCodec::default().parse(b"not a workbook").unwrap_err();
        assert!(matches!(err, AppError::ParseError(_)));
    }

    #[test]
    fn test_parse_sniffs_format_from_bytes() {
        let bytes = workbook_bytes(&[&["A"], &["x"]]);
        let table = XlsxCodec::default().parse(&bytes).unwrap();
        assert_eq!(table.columns(), &["A"]);

        // Zip signature without a workbook inside
        let err = XlsxCodec::default().parse(b"PK\x03\x04broken").unwrap_err();
        assert!(matches!(err, AppError::ParseError(_)));
    }

    #[test]
    fn test_serialize_writes_index_column() {
        let mut table = Table::with_headers(vec!["A".to_string(), "B".to_string()]);
        table
            .push_row(vec![CellValue::text("x"), CellValue::Plain(Scalar::Int(7))])
            .unwrap();
        table
            .push_row(vec![CellValue::text("y"), CellValue::empty()])
            .unwrap();

        let bytes = XlsxCodec::default().serialize(&table).unwrap();

        let mut workbook: Xlsx<_> = Xlsx::new(Cursor::new(bytes)).unwrap();
        assert_eq!(workbook.sheet_names(), vec!["Sheet1".to_string()]);
        let range = workbook.worksheet_range_at(0).unwrap().unwrap();
        let rows: Vec<_> = range.rows().collect();

        assert_eq!(rows[0][0], Data::Empty);
        assert_eq!(rows[0][1], Data::String("A".to_string()));
        assert_eq!(rows[1][0], Data::Float(0.0));
        assert_eq!(rows[2][0], Data::Float(1.0));
        assert_eq!(rows[1][2], Data::Float(7.0));
        assert_eq!(rows[2][2], Data::Empty);
    }

    #[test]
    fn test_round_trip_drops_written_index() {
        let codec = XlsxCodec::default();
        let mut table = Table::with_headers(vec!["A".to_string()]);
        table.push_row(vec![CellValue::text("x")]).unwrap();
        table.push_row(vec![CellValue::text("y")]).unwrap();

        let reparsed = codec.parse(&codec.serialize(&table).unwrap()).unwrap();
        assert_eq!(reparsed, table);
    }

    #[test]
    fn test_custom_sheet_name() {
        let config = PostProcessConfig {
            sheet_name: "Export".to_string(),
            ..Default::default()
        };
        let bytes = XlsxCodec::new(&config)
            .serialize(&Table::with_headers(vec!["A".to_string()]))
            .unwrap();

        let workbook: Xlsx<_> = Xlsx::new(Cursor::new(bytes)).unwrap();
        assert_eq!(workbook.sheet_names(), vec!["Export".to_string()]);
    }
}
