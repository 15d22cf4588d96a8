pub mod columns_cmd;
pub mod export_cmd;
pub mod filters_cmd;
pub mod serve_cmd;
pub mod sort_cmd;
pub mod watch_cmd;
