//! Incremental UTF-8 decoding of reply chunks.

/// Accumulates reply text from raw chunks.
///
/// A multi-byte character split across chunks is held back until its last
/// byte arrives. Invalid sequences become U+FFFD.
#[derive(Debug, Default)]
pub struct Utf8Accumulator {
    text: String,
    pending: Vec<u8>,
}

impl Utf8Accumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode `chunk`. Returns whether the text grew.
    pub fn push(&mut self, chunk: &[u8]) -> bool {
        let before = self.text.len();
        self.pending.extend_from_slice(chunk);
        let input = std::mem::take(&mut self.pending);
        let mut rest = input.as_slice();

        while !rest.is_empty() {
            match std::str::from_utf8(rest) {
                Ok(valid) => {
                    self.text.push_str(valid);
                    break;
                }
                Err(err) => {
                    let (valid, tail) = rest.split_at(err.valid_up_to());
                    self.text.push_str(&String::from_utf8_lossy(valid));
                    match err.error_len() {
                        Some(len) => {
                            self.text.push(char::REPLACEMENT_CHARACTER);
                            rest = &tail[len..];
                        }
                        None => {
                            // Incomplete sequence at the end; wait for more bytes
                            self.pending = tail.to_vec();
                            break;
                        }
                    }
                }
            }
        }

        self.text.len() != before
    }

    /// Flush at end of data. A dangling partial character becomes U+FFFD.
    pub fn finish(&mut self) -> bool {
        if self.pending.is_empty() {
            return false;
        }
        self.pending.clear();
        self.text.push(char::REPLACEMENT_CHARACTER);
        true
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }
}
