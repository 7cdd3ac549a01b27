pub mod json;
pub mod markdown;
pub mod table;

pub use json::{to_json, write_json};
pub use markdown::MarkdownReport;
pub use table::{write_table, PlatformReport};
