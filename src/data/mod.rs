pub mod browser;
pub mod extractor;
pub mod reader;
pub mod types;
