//! Parser for the diagnostic log HandBrakeCLI prints during `--scan`.
//!
//! The log interleaves unrelated lines with the fields of interest, so the
//! parser skips forward until the next expected line instead of matching the
//! stream line by line. Titles shorter than the duration threshold are dropped
//! here, and their chapter sections are never examined.

use crate::config::Timecode;
use once_cell::sync::Lazy;
use regex::Regex;
use std::io::{self, BufRead};
use thiserror::Error;
use tracing::{debug, trace, warn};

static TITLE_COUNT_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"scan thread found (\d+) valid title").expect("title count regex should compile")
});
static TITLE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\+ title (\d+)").expect("title regex should compile"));
static DURATION_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\+ duration: (\d\d:\d\d:\d\d)").expect("duration regex should compile")
});
static CHAPTERS_HEADER_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\+ chapters:").expect("chapters header regex should compile"));
static CHAPTER_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\+ (\d+): duration (\d\d:\d\d:\d\d)").expect("chapter regex should compile")
});

/// Error type for scan output that ends before the required data was found
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// No `scan thread found N valid title` line before end of stream
    #[error("Scan output has no title count")]
    NoTitleCount,

    /// The title count line carries a number that does not fit in `u32`
    #[error("Scan reported an out-of-range title count: {count}")]
    InvalidTitleCount { count: String },

    /// Fewer title blocks than the scan announced
    #[error("Scan announced {declared} titles but only {found} were reported")]
    MissingTitle { declared: u32, found: u32 },

    /// A title block without a duration line
    #[error("No duration reported for title {title}")]
    MissingDuration { title: u32 },

    /// Reading the scan output failed
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// A title that met the duration threshold and the number of chapters it lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TitleEntry {
    pub title: u32,
    pub chapter_count: u32,
}

/// Titles on one disc image that are long enough to be episodes, in the
/// order the scan reported them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanResult {
    entries: Vec<TitleEntry>,
}

impl ScanResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `title` with zero chapters.
    ///
    /// A title seen twice keeps its first position and has its count reset.
    pub fn record_title(&mut self, title: u32) {
        match self.entries.iter_mut().find(|e| e.title == title) {
            Some(entry) => entry.chapter_count = 0,
            None => self.entries.push(TitleEntry {
                title,
                chapter_count: 0,
            }),
        }
    }

    /// Adds one chapter to an already recorded title.
    pub fn add_chapter(&mut self, title: u32) {
        if let Some(entry) = self.entries.iter_mut().find(|e| e.title == title) {
            entry.chapter_count += 1;
        }
    }

    /// Chapter count of `title`, if it was recorded
    pub fn chapter_count(&self, title: u32) -> Option<u32> {
        self.entries
            .iter()
            .find(|e| e.title == title)
            .map(|e| e.chapter_count)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TitleEntry> {
        self.entries.iter()
    }
}

impl FromIterator<(u32, u32)> for ScanResult {
    fn from_iter<I: IntoIterator<Item = (u32, u32)>>(iter: I) -> Self {
        let mut result = ScanResult::new();
        for (title, chapters) in iter {
            result.record_title(title);
            for _ in 0..chapters {
                result.add_chapter(title);
            }
        }
        result
    }
}

/// Where the parser is in the scan log
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParserState {
    AwaitTitleCount,
    AwaitTitle,
    AwaitDuration { title: u32 },
    AwaitChaptersHeaderOrNextTitle { title: u32 },
    InChapterList { title: u32 },
    Done,
}

fn capture_u32(pattern: &Regex, line: &str) -> Option<u32> {
    pattern
        .captures(line)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

fn capture_timecode(line: &str) -> Option<Timecode> {
    DURATION_PATTERN
        .captures(line)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Incremental scan log parser.
///
/// Feed it one line at a time until [`ScanParser::is_done`], then call
/// [`ScanParser::finish`]. Calling `finish` early means the stream ended.
#[derive(Debug)]
pub struct ScanParser {
    threshold: Timecode,
    state: ParserState,
    declared: u32,
    remaining: u32,
    invalid_count: Option<String>,
    result: ScanResult,
}

impl ScanParser {
    pub fn new(threshold: Timecode) -> Self {
        Self {
            threshold,
            state: ParserState::AwaitTitleCount,
            declared: 0,
            remaining: 0,
            invalid_count: None,
            result: ScanResult::new(),
        }
    }

    /// All announced titles have been examined; further lines are ignored.
    pub fn is_done(&self) -> bool {
        self.state == ParserState::Done
    }

    fn after_title(&self) -> ParserState {
        if self.remaining == 0 {
            ParserState::Done
        } else {
            ParserState::AwaitTitle
        }
    }

    /// Consume one line of scan output.
    pub fn feed(&mut self, line: &str) {
        // A line that ends a chapter section is not consumed by it; the loop
        // hands the same line to the next state.
        loop {
            match self.state {
                ParserState::AwaitTitleCount => {
                    let Some(caps) = TITLE_COUNT_PATTERN.captures(line) else {
                        return;
                    };
                    match caps[1].parse::<u32>() {
                        Ok(count) => {
                            debug!(titles = count, "scan reported title count");
                            self.declared = count;
                            self.remaining = count;
                            self.state = self.after_title();
                        }
                        Err(_) => {
                            warn!(count = &caps[1], "title count out of range");
                            self.invalid_count = Some(caps[1].to_string());
                            self.state = ParserState::Done;
                        }
                    }
                    return;
                }
                ParserState::AwaitTitle => {
                    if let Some(title) = capture_u32(&TITLE_PATTERN, line) {
                        self.remaining -= 1;
                        self.state = ParserState::AwaitDuration { title };
                    }
                    return;
                }
                ParserState::AwaitDuration { title } => {
                    if let Some(duration) = capture_timecode(line) {
                        if duration >= self.threshold {
                            debug!(title, %duration, "title meets duration threshold");
                            self.result.record_title(title);
                            self.state = ParserState::AwaitChaptersHeaderOrNextTitle { title };
                        } else {
                            debug!(
                                title,
                                %duration,
                                threshold = %self.threshold,
                                "title too short, skipping"
                            );
                            self.state = self.after_title();
                        }
                    }
                    return;
                }
                ParserState::AwaitChaptersHeaderOrNextTitle { title } => {
                    if CHAPTERS_HEADER_PATTERN.is_match(line) {
                        self.state = ParserState::InChapterList { title };
                        return;
                    }
                    if !TITLE_PATTERN.is_match(line) {
                        return;
                    }
                    debug!(title, "title has no chapter section");
                    self.state = self.after_title();
                    if self.is_done() {
                        return;
                    }
                }
                ParserState::InChapterList { title } => {
                    if CHAPTER_PATTERN.is_match(line) {
                        self.result.add_chapter(title);
                        return;
                    }
                    self.state = self.after_title();
                    if self.is_done() {
                        return;
                    }
                }
                ParserState::Done => return,
            }
        }
    }

    /// End of stream: hand back the titles found, or the reason there are none.
    pub fn finish(self) -> Result<ScanResult, ProtocolError> {
        if let Some(count) = self.invalid_count {
            return Err(ProtocolError::InvalidTitleCount { count });
        }
        let found = self.declared - self.remaining;
        match self.state {
            ParserState::AwaitTitleCount => Err(ProtocolError::NoTitleCount),
            ParserState::AwaitTitle => Err(ProtocolError::MissingTitle {
                declared: self.declared,
                found,
            }),
            ParserState::AwaitDuration { title } => Err(ProtocolError::MissingDuration { title }),
            ParserState::AwaitChaptersHeaderOrNextTitle { .. }
            | ParserState::InChapterList { .. }
                if self.remaining > 0 =>
            {
                Err(ProtocolError::MissingTitle {
                    declared: self.declared,
                    found,
                })
            }
            _ => Ok(self.result),
        }
    }
}

/// Read scan output from `reader` until every announced title is examined.
///
/// Lines after the last title block are left unread. Bytes that are not
/// valid UTF-8 are replaced rather than rejected.
pub fn parse_scan<R: BufRead>(
    reader: &mut R,
    threshold: Timecode,
) -> Result<ScanResult, ProtocolError> {
    let mut parser = ScanParser::new(threshold);
    let mut buf = Vec::new();

    while !parser.is_done() {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            break;
        }
        let line = String::from_utf8_lossy(&buf);
        let line = line.trim_end_matches(['\n', '\r']);
        trace!(target: "seriesrip::scan::output", "{}", line);
        parser.feed(line);
    }

    parser.finish()
}
