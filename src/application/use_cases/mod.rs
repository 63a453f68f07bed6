pub mod post_processor;
pub mod table_flattener;
