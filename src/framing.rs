//! Delimiter-based line framing over a stream of partial reads.

use memchr::memmem::Finder;

/// Accumulates raw bytes and splits off complete delimiter-terminated lines.
///
/// Bytes after the last delimiter stay buffered until more input completes
/// them. No maximum line length is enforced: a peer that never sends the
/// delimiter grows the buffer without bound.
#[derive(Debug, Clone)]
pub struct LineFramer {
    finder: Finder<'static>,
    buffer: Vec<u8>,
    // Offset before which the delimiter is known not to start.
    scanned: usize,
}

impl LineFramer {
    /// Create a framer for `delimiter`.
    ///
    /// # Panics
    ///
    /// Panics if `delimiter` is empty. [`LineReader::open`](crate::LineReader::open)
    /// rejects an empty delimiter before ever building a framer.
    pub fn new(delimiter: &[u8]) -> Self {
        assert!(!delimiter.is_empty(), "line delimiter must not be empty");
        Self {
            finder: Finder::new(delimiter).into_owned(),
            buffer: Vec::with_capacity(4096),
            scanned: 0,
        }
    }

    /// The byte sequence lines are split on.
    pub fn delimiter(&self) -> &[u8] {
        self.finder.needle()
    }

    /// Append bytes from one underlying read.
    pub fn push(&mut self, bytes: &[u8]) {
        self.buffer.extend_from_slice(bytes);
    }

    /// Remove and return the next complete line, without its delimiter.
    pub fn next_line(&mut self) -> Option<Vec<u8>> {
        let delim_len = self.finder.needle().len();
        match self.finder.find(&self.buffer[self.scanned..]) {
            Some(pos) => {
                let end = self.scanned + pos;
                let line = self.buffer[..end].to_vec();
                self.buffer.drain(..end + delim_len);
                self.scanned = 0;
                Some(line)
            }
            None => {
                // A delimiter split across reads may still start in the tail.
                self.scanned = self.buffer.len().saturating_sub(delim_len - 1);
                None
            }
        }
    }

    /// Iterate over every complete line currently buffered.
    pub fn lines(&mut self) -> Lines<'_> {
        Lines { framer: self }
    }

    /// Bytes buffered but not yet part of a complete line.
    pub fn pending(&self) -> &[u8] {
        &self.buffer
    }

    /// Discard any partial line.
    pub fn clear(&mut self) {
        self.buffer.clear();
        self.scanned = 0;
    }
}

/// Draining iterator returned by [`LineFramer::lines`].
#[derive(Debug)]
pub struct Lines<'a> {
    framer: &'a mut LineFramer,
}

impl Iterator for Lines<'_> {
    type Item = Vec<u8>;

    fn next(&mut self) -> Option<Self::Item> {
        self.framer.next_line()
    }
}
