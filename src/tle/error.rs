use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum TleError {
    #[error("line {line} must start with '{expected} '")]
    InvalidLineStart { line: u8, expected: char },
    #[error("line {line} is {len} characters, expected at least {min}")]
    LineTooShort { line: u8, len: usize, min: usize },
    #[error("line {0} contains non-ASCII characters")]
    NonAscii(u8),
    #[error("checksum failed on line {line}: expected {expected}, computed {computed}")]
    Checksum { line: u8, expected: u8, computed: u8 },
    #[error("NORAD ids differ between lines: {0} vs {1}")]
    NoradMismatch(u32, u32),
    #[error("invalid {field} field: '{value}'")]
    Field { field: &'static str, value: String },
    #[error("{field} out of range: {value}")]
    OutOfRange { field: &'static str, value: f64 },
}
