//! Dataset loading — parsing uploaded spreadsheet bytes into an in-memory
//! table and tracking which table is "current" for the process.

pub mod parse;
pub mod store;
pub mod table;

pub use self::parse::{parse_spreadsheet, ParseError};
pub use self::store::DatasetStore;
pub use self::table::{Dataset, Row};
