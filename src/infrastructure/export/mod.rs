// ============================================================
// EXPORT INFRASTRUCTURE LAYER
// ============================================================
// CSV and XLSX codecs, HTML cell cleaning

mod csv_codec;
mod markup_cleaner;
mod xlsx_codec;

pub use csv_codec::CsvCodec;
pub use markup_cleaner::{MarkupCleaner, ParseSkipped};
pub use xlsx_codec::XlsxCodec;
