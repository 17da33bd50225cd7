mod error;
mod parser;
mod record;

pub use error::TleError;
pub use parser::{ParseReport, SkippedBlock, TleParser, TleRecords};
pub use record::TleRecord;
