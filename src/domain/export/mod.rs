// ============================================================
// EXPORT DOMAIN LAYER
// ============================================================
// Core types for export post-processing
// No I/O, no format-specific parsing

mod cell_value;
mod export_format;
mod post_process_config;
mod table;

pub use cell_value::{CellValue, Scalar};
pub use export_format::{ExportFormat, ExportPayload};
pub use post_process_config::PostProcessConfig;
pub use table::Table;
