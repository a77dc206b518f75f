pub mod extractor;
pub mod layout;
pub mod reader;
pub mod types;
pub mod utils;

pub use extractor::{ExtractorOptions, PricePerSessionRounding, WorkbookExtractor};
pub use reader::read_workbook;
