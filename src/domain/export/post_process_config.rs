// ============================================================
// POST-PROCESSING CONFIGURATION
// ============================================================
// Tunable names and output conventions for export post-processing

use serde::{Deserialize, Serialize};

/// Characters Excel refuses in sheet names
const SHEET_NAME_FORBIDDEN: [char; 7] = ['[', ']', ':', '*', '?', '/', '\\'];

/// Configuration for export post-processing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PostProcessConfig {
    /// Column holding key-value records to flatten (default: "More")
    pub nested_column: String,

    /// Element searched for the parameter marker (default: "div")
    pub marker_tag: String,

    /// Attribute that identifies a parameter marker (default: "data-info-type")
    pub marker_type_attr: String,

    /// Required value of `marker_type_attr` (default: "show_params")
    pub marker_type_value: String,

    /// Attribute whose value replaces the cell text (default: "data-info")
    pub marker_value_attr: String,

    /// Joins nested record keys when flattening (default: ".")
    pub key_separator: String,

    /// CSV field delimiter (default: ',')
    pub csv_delimiter: char,

    /// CSV record terminator, "\n" or "\r\n" (default: "\n")
    pub line_terminator: String,

    /// Name of the written worksheet (default: "Sheet1")
    pub sheet_name: String,

    /// Recognize a leading row index column written by an earlier pass
    pub detect_index_column: bool,

    /// `tracing` filter directives installed by `bootstrap` (default: "info")
    pub log_filter: String,
}

impl Default for PostProcessConfig {
    fn default() -> Self {
        Self {
            nested_column: "More".to_string(),
            marker_tag: "div".to_string(),
            marker_type_attr: "data-info-type".to_string(),
            marker_type_value: "show_params".to_string(),
            marker_value_attr: "data-info".to_string(),
            key_separator: ".".to_string(),
            csv_delimiter: ',',
            line_terminator: "\n".to_string(),
            sheet_name: "Sheet1".to_string(),
            detect_index_column: true,
            log_filter: "info".to_string(),
        }
    }
}

impl PostProcessConfig {
    /// Delimiter as the single byte the CSV reader and writer expect
    pub fn delimiter_byte(&self) -> u8 {
        self.csv_delimiter as u8
    }

    pub fn uses_crlf(&self) -> bool {
        self.line_terminator == "\r\n"
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), String> {
        if self.nested_column.is_empty() {
            return Err("nested_column must not be empty".to_string());
        }
        if self.marker_tag.trim().is_empty() {
            return Err("marker_tag must not be empty".to_string());
        }
        if self.marker_type_attr.is_empty() || self.marker_value_attr.is_empty() {
            return Err("marker attribute names must not be empty".to_string());
        }
        if self.key_separator.is_empty() {
            return Err("key_separator must not be empty".to_string());
        }
        if !self.csv_delimiter.is_ascii() || matches!(self.csv_delimiter, '"' | '\n' | '\r') {
            return Err(format!(
                "csv_delimiter must be an ASCII character other than a quote or newline, got {:?}",
                self.csv_delimiter
            ));
        }
        if self.line_terminator != "\n" && self.line_terminator != "\r\n" {
            return Err(format!(
                "line_terminator must be \"\\n\" or \"\\r\\n\", got {:?}",
                self.line_terminator
            ));
        }
        let sheet_len = self.sheet_name.chars().count();
        if sheet_len == 0 || sheet_len > 31 {
            return Err("sheet_name must be between 1 and 31 characters".to_string());
        }
        if self.sheet_name.contains(&SHEET_NAME_FORBIDDEN[..]) {
            return Err(format!(
                "sheet_name must not contain any of {:?}",
                SHEET_NAME_FORBIDDEN
            ));
        }
        Ok(())
    }
}
