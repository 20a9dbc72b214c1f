//! Stateful Sentence Framing

use crate::error::SentenceError;
use crate::info::NmeaInfo;
use crate::sentence::Sentence;
use tracing::trace;

/// Longest unterminated tail kept between calls (bytes)
pub const MAX_PENDING: usize = 1024;

enum Boundary {
    /// CR-LF found at this offset
    Terminator(usize),
    /// A new `$` started before the current sentence was terminated
    Restart(usize),
}

fn scan(bytes: &[u8]) -> Option<Boundary> {
    for (i, &b) in bytes.iter().enumerate() {
        match b {
            b'$' => return Some(Boundary::Restart(i)),
            b'\r' if bytes.get(i + 1) == Some(&b'\n') => return Some(Boundary::Terminator(i)),
            _ => {}
        }
    }
    None
}

/// NMEA 0183 parser that carries partial sentences across calls
#[derive(Debug, Default)]
pub struct NmeaParser {
    /// Bytes of a sentence whose terminator has not arrived yet
    pending: Vec<u8>,
    info: NmeaInfo,
    accepted: u64,
    rejected: u64,
}

impl NmeaParser {
    /// Create a parser with empty info
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed text and return how many sentences were decoded by this call
    ///
    /// Sentences must be `$`-started and CR-LF terminated. Bytes outside a
    /// sentence are skipped. An unterminated tail is retained and completed
    /// by the next call.
    pub fn parse(&mut self, text: &[u8]) -> usize {
        self.pending.extend_from_slice(text);

        let mut parsed = 0;
        let mut cursor = 0;
        loop {
            let Some(offset) = self.pending[cursor..].iter().position(|&b| b == b'$') else {
                cursor = self.pending.len();
                break;
            };
            let start = cursor + offset;

            match scan(&self.pending[start + 1..]) {
                Some(Boundary::Terminator(len)) => {
                    let end = start + 1 + len;
                    match decode(&mut self.info, &self.pending[start..end]) {
                        Ok(()) => {
                            self.accepted += 1;
                            parsed += 1;
                        }
                        Err(SentenceError::Unsupported(id)) => {
                            trace!("Skipping unsupported sentence {}", id);
                        }
                        Err(e) => {
                            self.rejected += 1;
                            trace!("Rejected sentence: {}", e);
                        }
                    }
                    cursor = end + 2;
                }
                Some(Boundary::Restart(len)) => {
                    self.rejected += 1;
                    trace!("Dropping truncated sentence of {} bytes", len + 1);
                    cursor = start + 1 + len;
                }
                None => {
                    cursor = start;
                    break;
                }
            }
        }

        self.pending.drain(..cursor);
        if self.pending.len() > MAX_PENDING {
            trace!("Discarding {} unterminated bytes", self.pending.len());
            self.pending.clear();
        }

        parsed
    }

    /// Accumulated info from every decoded sentence
    pub fn info(&self) -> &NmeaInfo {
        &self.info
    }

    /// Bytes waiting for a terminator
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Sentences decoded since creation
    pub fn accepted(&self) -> u64 {
        self.accepted
    }

    /// Sentences rejected (checksum, malformed, truncated) since creation
    pub fn rejected(&self) -> u64 {
        self.rejected
    }
}

fn decode(info: &mut NmeaInfo, line: &[u8]) -> Result<(), SentenceError> {
    let sentence = Sentence::parse(line)?;
    info.apply(&sentence);
    Ok(())
}
