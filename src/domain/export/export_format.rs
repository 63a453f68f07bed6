// ============================================================
// EXPORT FORMAT
// ============================================================
// Which wire format an export uses, and the buffer that carries it

use serde::{Deserialize, Serialize};
use std::io::Cursor;

/// Serialization format of an export
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExportFormat {
    /// Comma separated text with a header row
    Csv,

    /// Single-sheet XLSX workbook
    Spreadsheet,
}

impl ExportFormat {
    pub fn from_csv_flag(is_csv_format: bool) -> Self {
        if is_csv_format {
            ExportFormat::Csv
        } else {
            ExportFormat::Spreadsheet
        }
    }
}

impl std::fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExportFormat::Csv => write!(f, "CSV"),
            ExportFormat::Spreadsheet => write!(f, "Spreadsheet"),
        }
    }
}

/// Raw export data, either text or bytes.
/// Post-processing hands back the same variant it was given.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportPayload {
    Text(String),
    Binary(Vec<u8>),
}

impl ExportPayload {
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            ExportPayload::Text(text) => text.as_bytes(),
            ExportPayload::Binary(bytes) => bytes,
        }
    }

    pub fn is_text(&self) -> bool {
        matches!(self, ExportPayload::Text(_))
    }

    pub fn into_bytes(self) -> Vec<u8> {
        match self {
            ExportPayload::Text(text) => text.into_bytes(),
            ExportPayload::Binary(bytes) => bytes,
        }
    }

    /// Reader over the payload, positioned at offset 0
    pub fn into_cursor(self) -> Cursor<Vec<u8>> {
        Cursor::new(self.into_bytes())
    }
}

impl From<String> for ExportPayload {
    fn from(text: String) -> Self {
        ExportPayload::Text(text)
    }
}

impl From<&str> for ExportPayload {
    fn from(text: &str) -> Self {
        ExportPayload::Text(text.to_string())
    }
}

impl From<Vec<u8>> for ExportPayload {
    fn from(bytes: Vec<u8>) -> Self {
        ExportPayload::Binary(bytes)
    }
}
