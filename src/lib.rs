//! Post-processing for chart data exports.
//!
//! Takes a CSV or XLSX export, replaces HTML fragments in cells with their
//! visible text (or the `data-info` value of a `show_params` marker), flattens
//! the JSON records of the `More` column into columns of their own, and writes
//! the table back in the same format with a leading row index.

mod app;
mod application;
mod domain;
mod infrastructure;

pub use crate::app::{bootstrap, init_tracing};
pub use crate::application::{apply_post_process, PostProcessor, TableFlattener};
pub use crate::domain::error::{AppError, Result};
pub use crate::domain::export::{
    CellValue, ExportFormat, ExportPayload, PostProcessConfig, Scalar, Table,
};
pub use crate::infrastructure::config::ConfigService;
pub use crate::infrastructure::export::{CsvCodec, MarkupCleaner, ParseSkipped, XlsxCodec};
