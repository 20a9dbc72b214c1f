//! NMEA 0183 Decoder
//!
//! Stateful parser for the fix-related sentences emitted by serial GPS
//! receivers. The parser accumulates decoded fields in an [`NmeaInfo`] and
//! retains any partially received sentence until its terminator arrives.

mod error;
mod info;
mod parser;
mod sentence;

pub use error::SentenceError;
pub use info::NmeaInfo;
pub use parser::{NmeaParser, MAX_PENDING};
pub use sentence::{checksum, Gga, Gsv, Rmc, Sentence, SentenceKind, UtcFields};
