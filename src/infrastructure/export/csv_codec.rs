// ============================================================
// CSV CODEC
// ============================================================
// Parse CSV exports into tables and write them back with a row index

use csv::{ReaderBuilder, StringRecord, Terminator, WriterBuilder};
use tracing::debug;

use crate::domain::error::AppError;
use crate::domain::export::{CellValue, PostProcessConfig, Table};

/// CSV reader/writer for export tables
pub struct CsvCodec {
    /// Delimiter character (default: comma)
    delimiter: u8,

    /// Terminate records with "\r\n" instead of "\n"
    crlf: bool,

    /// Column whose cells may hold JSON records
    nested_column: String,

    /// Drop a row index column left by an earlier pass
    detect_index_column: bool,
}

impl Default for CsvCodec {
    fn default() -> Self {
        Self::new(&PostProcessConfig::default())
    }
}

impl CsvCodec {
    pub fn new(config: &PostProcessConfig) -> Self {
        Self {
            delimiter: config.delimiter_byte(),
            crlf: config.uses_crlf(),
            nested_column: config.nested_column.clone(),
            detect_index_column: config.detect_index_column,
        }
    }

    /// Decode raw CSV bytes as UTF-8, dropping a byte order mark and
    /// replacing invalid sequences
    pub fn decode(bytes: &[u8]) -> String {
        let (content, _, had_errors) = encoding_rs::UTF_8.decode(bytes);
        if had_errors {
            debug!("CSV input contained invalid UTF-8, replaced with U+FFFD");
        }
        content.into_owned()
    }

    /// Parse CSV content into a table
    pub fn parse(&self, content: &str) -> Result<Table, AppError> {
        let content = content.strip_prefix('\u{feff}').unwrap_or(content);

        let mut reader = ReaderBuilder::new()
            .delimiter(self.delimiter)
            .flexible(true) // Short rows are padded, long rows rejected below
            .from_reader(content.as_bytes());

        let headers = reader
            .headers()
            .map_err(|e| AppError::ParseError(format!("Failed to read CSV headers: {}", e)))?
            .clone();

        if headers.is_empty() {
            return Err(AppError::ParseError(
                "No columns to parse from CSV input".to_string(),
            ));
        }

        let mut table = Table::with_headers(headers.iter().map(str::to_string));
        let nested_index = table.column_index(&self.nested_column);

        for result in reader.records() {
            let record = result
                .map_err(|e| AppError::ParseError(format!("Failed to parse CSV row: {}", e)))?;

            let cells = self.parse_record(&record, nested_index);
            table.push_row(cells).map_err(|cells| {
                AppError::ParseError(format!(
                    "Expected {} fields in line {}, saw {}",
                    headers.len(),
                    record.position().map(|p| p.line()).unwrap_or_default(),
                    cells.len()
                ))
            })?;
        }

        if self.detect_index_column && table.drop_ordinal_index() {
            debug!("Dropped existing row index column from CSV input");
        }

        debug!(
            rows = table.row_count(),
            columns = table.column_count(),
            "Parsed CSV export"
        );

        Ok(table)
    }

    fn parse_record(&self, record: &StringRecord, nested_index: Option<usize>) -> Vec<CellValue> {
        record
            .iter()
            .enumerate()
            .map(|(idx, field)| CellValue::from_text(field.to_string(), Some(idx) == nested_index))
            .collect()
    }

    /// Write a table as CSV with a leading, blank-headed row index column
    pub fn serialize(&self, table: &Table) -> Result<String, AppError> {
        let terminator = if self.crlf {
            Terminator::CRLF
        } else {
            Terminator::Any(b'\n')
        };

        let mut writer = WriterBuilder::new()
            .delimiter(self.delimiter)
            .terminator(terminator)
            .from_writer(Vec::new());

        let mut header = Vec::with_capacity(table.column_count() + 1);
        header.push(String::new());
        header.extend(table.columns().iter().cloned());
        writer
            .write_record(&header)
            .map_err(|e| AppError::SerializeError(format!("Failed to write CSV header: {}", e)))?;

        for (index, row) in table.rows().iter().enumerate() {
            let mut record = Vec::with_capacity(row.len() + 1);
            record.push(index.to_string());
            record.extend(row.iter().map(|cell| cell.to_string()));

            writer.write_record(&record).map_err(|e| {
                AppError::SerializeError(format!("Failed to write CSV row {}: {}", index, e))
            })?;
        }

        let bytes = writer.into_inner().map_err(|e| {
            AppError::SerializeError(format!("Failed to flush CSV output: {}", e.error()))
        })?;

        String::from_utf8(bytes)
            .map_err(|e| AppError::SerializeError(format!("CSV output is not UTF-8: {}", e)))
    }
}
