//! Byte Ring Buffer
//!
//! Provides the fixed-capacity byte FIFO shared between the serial reader
//! thread and the sentence consumer.

mod buffer;

pub use buffer::{RingBuffer, DEFAULT_CAPACITY};
