pub mod use_cases;

pub use use_cases::post_processor::{apply_post_process, PostProcessor};
pub use use_cases::table_flattener::TableFlattener;
