//! Lazily decoded input.
//!
//! Code points are pulled from the reader only when the recognizer asks for
//! an offset past what has been read, and are kept so any offset can be
//! revisited.

use std::io::{self, BufRead, ErrorKind};

pub struct Input<R> {
    reader: R,
    chars: Vec<char>,
    partial: Vec<u8>,
    eof: bool,
    error: Option<io::Error>,
}

impl<R: BufRead> Input<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            chars: Vec::new(),
            partial: Vec::new(),
            eof: false,
            error: None,
        }
    }

    /// The code point at `offset`, or `None` at end of input. A read failure
    /// also ends the input; it is kept for [`Input::take_error`].
    pub fn get(&mut self, offset: usize) -> Option<char> {
        while self.chars.len() <= offset {
            if !self.fill() {
                return None;
            }
        }
        Some(self.chars[offset])
    }

    /// Number of code points read so far.
    pub fn read_len(&self) -> usize {
        self.chars.len()
    }

    pub fn take_error(&mut self) -> Option<io::Error> {
        self.error.take()
    }

    pub fn into_chars(self) -> Vec<char> {
        self.chars
    }

    /// Decodes the next buffered chunk. Returns false when nothing more can
    /// be read.
    fn fill(&mut self) -> bool {
        if self.eof || self.error.is_some() {
            return false;
        }

        let chunk = match self.reader.fill_buf() {
            Ok(chunk) => chunk,
            Err(e) if e.kind() == ErrorKind::Interrupted => return true,
            Err(e) => {
                self.error = Some(e);
                return false;
            }
        };

        if chunk.is_empty() {
            self.eof = true;
            if !self.partial.is_empty() {
                self.error = Some(invalid_utf8());
            }
            return false;
        }

        let len = chunk.len();
        self.partial.extend_from_slice(chunk);
        self.reader.consume(len);

        let valid = match std::str::from_utf8(&self.partial) {
            Ok(text) => text.len(),
            Err(e) if e.error_len().is_none() => e.valid_up_to(),
            Err(_) => {
                self.error = Some(invalid_utf8());
                return false;
            }
        };

        let decoded: Vec<u8> = self.partial.drain(..valid).collect();
        // the prefix was validated above
        if let Ok(text) = std::str::from_utf8(&decoded) {
            self.chars.extend(text.chars());
        }
        true
    }
}

fn invalid_utf8() -> io::Error {
    io::Error::new(ErrorKind::InvalidData, "invalid unicode character")
}
