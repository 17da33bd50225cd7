use std::str::Lines;

use serde::Serialize;

use super::error::TleError;
use super::record::TleRecord;

/// Element-set parser for catalog text (Celestrak / Space-Track style).
///
/// Accepts named three-line blocks and unnamed two-line blocks. A block that
/// cannot be parsed is skipped and reported; it never stops the parser.
#[derive(Debug, Clone, Copy)]
pub struct TleParser {
    pub verify_checksum: bool,
}

impl Default for TleParser {
    fn default() -> Self {
        Self {
            verify_checksum: true,
        }
    }
}

/// A block the parser had to drop.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedBlock {
    /// 1-based line number where the block starts.
    pub line: usize,
    pub name: Option<String>,
    pub reason: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ParseReport {
    pub records: Vec<TleRecord>,
    pub skipped: Vec<SkippedBlock>,
}

impl TleParser {
    pub fn new(verify_checksum: bool) -> Self {
        Self { verify_checksum }
    }

    /// Lazily parse `text`. Malformed blocks are logged and counted.
    /// Cloning the iterator (or calling `parse` again) restarts it.
    pub fn parse<'a>(&self, text: &'a str) -> TleRecords<'a> {
        TleRecords {
            blocks: Blocks::new(text),
            verify_checksum: self.verify_checksum,
            skipped: 0,
        }
    }

    /// Parse everything, keeping the reasons for each skipped block.
    pub fn parse_report(&self, text: &str) -> ParseReport {
        let mut report = ParseReport::default();
        for block in Blocks::new(text) {
            match block.and_then(|b| b.into_record(self.verify_checksum)) {
                Ok(record) => report.records.push(record),
                Err(skipped) => report.skipped.push(skipped),
            }
        }
        report
    }
}

/// Iterator over the valid records of a catalog text.
#[derive(Debug, Clone)]
pub struct TleRecords<'a> {
    blocks: Blocks<'a>,
    verify_checksum: bool,
    skipped: usize,
}

impl TleRecords<'_> {
    /// Number of blocks dropped so far.
    pub fn skipped(&self) -> usize {
        self.skipped
    }
}

impl Iterator for TleRecords<'_> {
    type Item = TleRecord;

    fn next(&mut self) -> Option<TleRecord> {
        for block in self.blocks.by_ref() {
            match block.and_then(|b| b.into_record(self.verify_checksum)) {
                Ok(record) => return Some(record),
                Err(skipped) => {
                    log::warn!(
                        "Skipping TLE block at line {} ({}): {}",
                        skipped.line,
                        skipped.name.as_deref().unwrap_or("unnamed"),
                        skipped.reason
                    );
                    self.skipped += 1;
                }
            }
        }
        None
    }
}

#[derive(Debug, Clone)]
struct RawBlock<'a> {
    line: usize,
    name: Option<&'a str>,
    line1: &'a str,
    line2: &'a str,
}

impl RawBlock<'_> {
    fn into_record(self, verify_checksum: bool) -> Result<TleRecord, SkippedBlock> {
        TleRecord::from_lines(self.name, self.line1, self.line2, verify_checksum).map_err(
            |e: TleError| SkippedBlock {
                line: self.line,
                name: self.name.map(|n| n.trim().to_string()),
                reason: e.to_string(),
            },
        )
    }
}

/// Groups non-blank lines into name/line1/line2 blocks.
#[derive(Debug, Clone)]
struct Blocks<'a> {
    lines: Lines<'a>,
    line_no: usize,
    pending: Option<(usize, &'a str)>,
}

impl<'a> Blocks<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            lines: text.lines(),
            line_no: 0,
            pending: None,
        }
    }

    fn next_line(&mut self) -> Option<(usize, &'a str)> {
        if let Some(p) = self.pending.take() {
            return Some(p);
        }
        for raw in self.lines.by_ref() {
            self.line_no += 1;
            let line = raw.trim();
            if !line.is_empty() {
                return Some((self.line_no, line));
            }
        }
        None
    }

    fn peek_line(&mut self) -> Option<(usize, &'a str)> {
        let next = self.next_line();
        self.pending = next;
        next
    }
}

impl<'a> Iterator for Blocks<'a> {
    type Item = Result<RawBlock<'a>, SkippedBlock>;

    fn next(&mut self) -> Option<Self::Item> {
        let (start, first) = self.next_line()?;

        let skip = |name: Option<&str>, reason: &str| SkippedBlock {
            line: start,
            name: name.map(String::from),
            reason: reason.to_string(),
        };

        if first.starts_with("2 ") {
            return Some(Err(skip(None, "line 2 without a preceding line 1")));
        }

        let (name, line1) = if first.starts_with("1 ") {
            (None, first)
        } else {
            match self.peek_line() {
                Some((_, l)) if l.starts_with("1 ") => {
                    self.pending = None;
                    (Some(first), l)
                }
                _ => return Some(Err(skip(Some(first), "name line without line 1"))),
            }
        };

        match self.peek_line() {
            Some((_, l)) if l.starts_with("2 ") => {
                self.pending = None;
                Some(Ok(RawBlock {
                    line: start,
                    name,
                    line1,
                    line2: l,
                }))
            }
            _ => Some(Err(skip(name, "line 1 without a following line 2"))),
        }
    }
}
