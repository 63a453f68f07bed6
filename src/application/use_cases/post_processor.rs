// ============================================================
// EXPORT POST-PROCESSOR USE CASE
// ============================================================
// Orchestrate parsing, cell cleaning, flattening, and re-serialization

use std::borrow::Cow;
use std::time::Instant;

use tracing::{debug, info};

use crate::application::use_cases::table_flattener::TableFlattener;
use crate::domain::error::{AppError, Result};
use crate::domain::export::{CellValue, ExportFormat, ExportPayload, PostProcessConfig, Table};
use crate::infrastructure::config::ConfigService;
use crate::infrastructure::export::{CsvCodec, MarkupCleaner, XlsxCodec};

/// CSV exports consisting of just this are passed through untouched
const EMPTY_CSV_EXPORT: &str = "\n";

/// Export post-processing use case
pub struct PostProcessor {
    config: PostProcessConfig,
    cleaner: MarkupCleaner,
    flattener: TableFlattener,
    csv: CsvCodec,
    xlsx: XlsxCodec,
}

impl PostProcessor {
    /// Create a post-processor, validating the configuration first
    pub fn new(config: PostProcessConfig) -> Result<Self> {
        config.validate().map_err(|e| {
            AppError::ValidationError(format!("Invalid post-processing config: {}", e))
        })?;

        Ok(Self {
            cleaner: MarkupCleaner::new(&config)?,
            flattener: TableFlattener::new(&config),
            csv: CsvCodec::new(&config),
            xlsx: XlsxCodec::new(&config),
            config,
        })
    }

    /// Create with default configuration
    pub fn default_config() -> Result<Self> {
        Self::new(PostProcessConfig::default())
    }

    /// Create from layered file/environment configuration
    pub fn from_config(service: &ConfigService) -> Result<Self> {
        Self::new(service.load()?)
    }

    pub fn config(&self) -> &PostProcessConfig {
        &self.config
    }

    /// Post-process one export and re-serialize it in the same format.
    /// The returned payload is text if the input was text, bytes otherwise.
    pub fn process(&self, payload: ExportPayload, format: ExportFormat) -> Result<ExportPayload> {
        let start = Instant::now();

        let (output, rows, columns) = match format {
            ExportFormat::Csv => {
                if payload.as_bytes() == EMPTY_CSV_EXPORT.as_bytes() {
                    debug!("Empty CSV export, skipping post-processing");
                    return Ok(payload);
                }

                let as_text = payload.is_text();
                let content = match &payload {
                    ExportPayload::Text(text) => Cow::Borrowed(text.as_str()),
                    ExportPayload::Binary(bytes) => Cow::Owned(CsvCodec::decode(bytes)),
                };

                let table = self.process_table(self.csv.parse(&content)?);
                let serialized = self.csv.serialize(&table)?;
                let output = if as_text {
                    ExportPayload::Text(serialized)
                } else {
                    ExportPayload::Binary(serialized.into_bytes())
                };
                (output, table.row_count(), table.column_count())
            }
            ExportFormat::Spreadsheet => {
                let bytes = match payload {
                    ExportPayload::Binary(bytes) => bytes,
                    ExportPayload::Text(_) => {
                        return Err(AppError::ValidationError(
                            "Spreadsheet exports must be passed as binary data".to_string(),
                        ))
                    }
                };

                let table = self.process_table(self.xlsx.parse(&bytes)?);
                let output = ExportPayload::Binary(self.xlsx.serialize(&table)?);
                (output, table.row_count(), table.column_count())
            }
        };

        info!(
            format = %format,
            rows,
            columns,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Post-processed export"
        );

        Ok(output)
    }

    /// Clean every cell, then flatten the nested column
    pub fn process_table(&self, table: Table) -> Table {
        let table = table.map_rows(|row| self.process_row(row));
        self.flattener.flatten(table)
    }

    /// Clean every cell of a row, keeping positions
    pub fn process_row(&self, row: Vec<CellValue>) -> Vec<CellValue> {
        row.into_iter().map(|cell| self.clean_cell(cell)).collect()
    }

    pub fn clean_cell(&self, cell: CellValue) -> CellValue {
        self.cleaner.clean(cell)
    }
}

/// Post-process a raw export with the default configuration.
///
/// `is_csv_format` selects CSV text handling; otherwise `data` must hold XLSX
/// bytes. The result has the same shape as `data`; use
/// [`ExportPayload::into_cursor`] to read it from the start.
pub fn apply_post_process(data: ExportPayload, is_csv_format: bool) -> Result<ExportPayload> {
    PostProcessor::default_config()?.process(data, ExportFormat::from_csv_flag(is_csv_format))
}

#[cfg(test)]
mod tests {
    use super::*;
    use calamine::{Data, Reader, Xlsx};
    use rust_xlsxwriter::Workbook;
    use std::io::Cursor;

    fn csv(input: &str) -> String {
        match apply_post_process(ExportPayload::from(input), true).unwrap() {
            ExportPayload::Text(text) => text,
            other => panic!("expected text output, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_export_short_circuit() {
        assert_eq!(csv("\n"), "\n");

        let out = apply_post_process(ExportPayload::Binary(b"\n".to_vec()), true).unwrap();
        assert_eq!(out, ExportPayload::Binary(b"\n".to_vec()));
    }

    #[test]
    fn test_markup_cells_cleaned() {
        let input = concat!(
            "Name,Params\n",
            "<div>Hello <b>World</b></div>,",
            "\"<div data-info-type=\"\"show_params\"\" data-info=\"\"x=1;y=2\"\">ignored</div>\"\n",
            "plain,3\n",
        );
        assert_eq!(csv(input), ",Name,Params\n0,Hello World,x=1;y=2\n1,plain,3\n");
    }

    #[test]
    fn test_discarded_fragments_are_emptied() {
        let input = "A,B\n<body></body>,<!DOCTYPE html>\n<html></html>,<head></head>\n";
        assert_eq!(csv(input), ",A,B\n0,,\n1,,\n");
    }

    #[test]
    fn test_more_column_flattened() {
        let input = "A,More\n1,\"{\"\"x\"\": 1}\"\n2,\"{\"\"x\"\": 2}\"\n";
        assert_eq!(csv(input), ",A,x\n0,1,1\n1,2,2\n");
    }

    #[test]
    fn test_flattened_collision_keeps_original() {
        let input = "x,More\n10,\"{\"\"x\"\": 1, \"\"y\"\": 5}\"\n";
        assert_eq!(csv(input), ",x,y\n0,10,5\n");
    }

    #[test]
    fn test_reprocessing_is_stable() {
        let input = "A,B\nfoo,<i>bar</i>\n\"a,b\",\n";
        let first = csv(input);
        assert_eq!(first, ",A,B\n0,foo,bar\n1,\"a,b\",\n");
        assert_eq!(csv(&first), first);
    }

    #[test]
    fn test_binary_csv_stays_binary() {
        let out = apply_post_process(ExportPayload::Binary(b"A\n<p>x</p>\n".to_vec()), true).unwrap();
        assert_eq!(out, ExportPayload::Binary(b",A\n0,x\n".to_vec()));
    }

    #[test]
    fn test_malformed_csv_is_an_error() {
        let result = apply_post_process(ExportPayload::from("A,B\n1,2,3\n"), true);
        assert!(matches!(result, Err(AppError::ParseError(_))));
    }

    #[test]
    fn test_text_spreadsheet_is_rejected() {
        let result = apply_post_process(ExportPayload::from("A\n1\n"), false);
        assert!(matches!(result, Err(AppError::ValidationError(_))));
    }

    #[test]
    fn test_spreadsheet_end_to_end() {
        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();
        worksheet.write_string(0, 0, "A").unwrap();
        worksheet.write_string(0, 1, "More").unwrap();
        worksheet.write_string(1, 0, "<div>Hello <b>World</b></div>").unwrap();
        worksheet.write_string(1, 1, r#"{"x": 1}"#).unwrap();
        let input = workbook.save_to_buffer().unwrap();

        let output = match apply_post_process(ExportPayload::Binary(input), false).unwrap() {
            ExportPayload::Binary(bytes) => bytes,
            other => panic!("expected binary output, got {:?}", other),
        };

        let mut workbook: Xlsx<_> = Xlsx::new(Cursor::new(output)).unwrap();
        let range = workbook.worksheet_range_at(0).unwrap().unwrap();
        let rows: Vec<_> = range.rows().collect();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0][1], Data::String("A".to_string()));
        assert_eq!(rows[0][2], Data::String("x".to_string()));
        assert_eq!(rows[1][0], Data::Float(0.0));
        assert_eq!(rows[1][1], Data::String("Hello World".to_string()));
        assert_eq!(rows[1][2], Data::Float(1.0));
    }

    #[test]
    fn test_corrupt_spreadsheet_is_an_error() {
        let result = apply_post_process(ExportPayload::Binary(vec![0, 1, 2, 3]), false);
        assert!(matches!(result, Err(AppError::ParseError(_))));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = PostProcessConfig {
            nested_column: String::new(),
            ..Default::default()
        };
        assert!(matches!(
            PostProcessor::new(config),
            Err(AppError::ValidationError(_))
        ));
    }

    #[test]
    fn test_from_config_service() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("SCRIBE_EXPORT_NESTED_COLUMN", "Extra");

            let processor =
                PostProcessor::from_config(&ConfigService::new()).map_err(|e| e.to_string())?;
            let out = processor
                .process(
                    ExportPayload::from("Extra\n\"{\"\"k\"\": 1}\"\n"),
                    ExportFormat::Csv,
                )
                .map_err(|e| e.to_string())?;

            assert_eq!(processor.config().nested_column, "Extra");
            assert_eq!(out, ExportPayload::from(",k\n0,1\n"));
            Ok(())
        });
    }

    #[test]
    fn test_concurrent_calls() {
        let handles: Vec<_> = (0..4)
            .map(|i| {
                std::thread::spawn(move || {
                    let input = format!("A\n<b>{}</b>\n", i);
                    apply_post_process(ExportPayload::Text(input), true).unwrap()
                })
            })
            .collect();

        for (i, handle) in handles.into_iter().enumerate() {
            let out = handle.join().unwrap();
            assert_eq!(out, ExportPayload::Text(format!(",A\n0,{}\n", i)));
        }
    }
}
