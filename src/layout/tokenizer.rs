//! Line-oriented tokenizer for key layout files
//!
//! The tokenizer owns the full file contents and walks them one line at a
//! time. Tokens never cross a line boundary; the caller decides when to move
//! on with [`Tokenizer::next_line`].

use std::fmt;
use std::fs;
use std::io;
use std::path::Path;

/// Source position used in diagnostics
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub filename: String,
    pub line: usize,
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.filename, self.line)
    }
}

/// Streams a text buffer as whitespace-delimited tokens, line by line
#[derive(Debug)]
pub struct Tokenizer {
    filename: String,
    buffer: String,
    current: usize,
    line_number: usize,
}

impl Tokenizer {
    /// Read a whole file into a new tokenizer.
    ///
    /// Invalid UTF-8 sequences are replaced rather than rejected; the format
    /// itself is ASCII.
    pub fn open(path: &Path) -> io::Result<Self> {
        let bytes = fs::read(path)?;
        let contents = String::from_utf8_lossy(&bytes).into_owned();
        Ok(Self::from_contents(path.display().to_string(), contents))
    }

    /// Tokenize an in-memory buffer. `filename` is only used for diagnostics.
    pub fn from_contents(filename: impl Into<String>, contents: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            buffer: contents.into(),
            current: 0,
            line_number: 1,
        }
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// Current 1-based line number
    pub fn line_number(&self) -> usize {
        self.line_number
    }

    pub fn location(&self) -> Location {
        Location {
            filename: self.filename.clone(),
            line: self.line_number,
        }
    }

    pub fn is_eof(&self) -> bool {
        self.current >= self.buffer.len()
    }

    pub fn is_eol(&self) -> bool {
        self.is_eof() || self.byte_at(self.current) == b'\n'
    }

    /// Next character without consuming it, `None` at end of file
    pub fn peek_char(&self) -> Option<char> {
        self.buffer[self.current..].chars().next()
    }

    /// Everything from the cursor up to (not including) the end of the line
    pub fn peek_remainder_of_line(&self) -> &str {
        let end = self.end_of_line();
        &self.buffer[self.current..end]
    }

    /// Consume bytes up to the next delimiter or end of line.
    ///
    /// Returns an empty string if the cursor already sits on a delimiter or
    /// at the end of the line.
    pub fn next_token(&mut self, delimiters: &str) -> String {
        let start = self.current;
        while !self.is_eol() && !is_delimiter(self.byte_at(self.current), delimiters) {
            self.current += 1;
        }
        self.buffer[start..self.current].to_string()
    }

    /// Skip any run of delimiter characters on the current line
    pub fn skip_delimiters(&mut self, delimiters: &str) {
        while !self.is_eol() && is_delimiter(self.byte_at(self.current), delimiters) {
            self.current += 1;
        }
    }

    /// Move to the start of the next line. Does nothing at end of file.
    pub fn next_line(&mut self) {
        while !self.is_eof() {
            let byte = self.byte_at(self.current);
            self.current += 1;
            if byte == b'\n' {
                self.line_number += 1;
                break;
            }
        }
    }

    fn byte_at(&self, index: usize) -> u8 {
        self.buffer.as_bytes()[index]
    }

    fn end_of_line(&self) -> usize {
        self.buffer[self.current..]
            .find('\n')
            .map_or(self.buffer.len(), |offset| self.current + offset)
    }
}

// Delimiters are ASCII, so stopping on one always lands on a char boundary.
fn is_delimiter(byte: u8, delimiters: &str) -> bool {
    byte.is_ascii() && delimiters.as_bytes().contains(&byte)
}

#[cfg(test)]
mod tests {
    use super::*;

    const WHITESPACE: &str = " \t\r";

    #[test]
    fn tokens_stay_on_one_line() {
        let mut t = Tokenizer::from_contents("test.kl", "key 30 A\nkey 31 B\n");
        assert_eq!(t.next_token(WHITESPACE), "key");
        t.skip_delimiters(WHITESPACE);
        assert_eq!(t.next_token(WHITESPACE), "30");
        t.skip_delimiters(WHITESPACE);
        assert_eq!(t.next_token(WHITESPACE), "A");
        assert!(t.is_eol());
        assert_eq!(t.next_token(WHITESPACE), "");
        assert_eq!(t.line_number(), 1);

        t.next_line();
        assert_eq!(t.line_number(), 2);
        assert_eq!(t.peek_remainder_of_line(), "key 31 B");
    }

    #[test]
    fn skips_tabs_and_carriage_returns() {
        let mut t = Tokenizer::from_contents("test.kl", "\t key\t\r30 \r\n");
        t.skip_delimiters(WHITESPACE);
        assert_eq!(t.peek_char(), Some('k'));
        assert_eq!(t.next_token(WHITESPACE), "key");
        t.skip_delimiters(WHITESPACE);
        assert_eq!(t.next_token(WHITESPACE), "30");
        t.skip_delimiters(WHITESPACE);
        assert!(t.is_eol());
        assert!(!t.is_eof());
    }

    #[test]
    fn eof_is_sticky() {
        let mut t = Tokenizer::from_contents("test.kl", "a");
        assert!(!t.is_eof());
        t.next_line();
        assert!(t.is_eof());
        assert!(t.is_eol());
        t.next_line();
        assert!(t.is_eof());
        assert_eq!(t.peek_char(), None);
        assert_eq!(t.line_number(), 1);
    }

    #[test]
    fn empty_buffer_is_eof() {
        let t = Tokenizer::from_contents("empty.kl", "");
        assert!(t.is_eof());
        assert_eq!(t.peek_remainder_of_line(), "");
    }

    #[test]
    fn location_formats_as_file_and_line() {
        let mut t = Tokenizer::from_contents("Vendor_054c.kl", "\n\nkey");
        t.next_line();
        t.next_line();
        assert_eq!(t.location().to_string(), "Vendor_054c.kl:3");
    }

    #[test]
    fn open_missing_file_fails() {
        let result = Tokenizer::open(Path::new("/nonexistent/keylayout/none.kl"));
        assert!(result.is_err());
    }
}
