//! Sentence Reassembly
//!
//! Sentences must end in CR-LF. The tty's ICRNL translation and receiver
//! glitches can leave bare line feeds, which are repaired here before the
//! text reaches the decoder.

/// Reassembled text and the number of line endings repaired
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reassembled {
    pub text: Vec<u8>,
    pub repaired: usize,
}

/// Copy `bytes`, inserting CR before every LF (after the first byte) that
/// does not already follow a CR
pub fn reassemble(bytes: &[u8]) -> Reassembled {
    let mut text = Vec::with_capacity(bytes.len() + bytes.len() / 32);
    let mut repaired = 0;

    for (i, &byte) in bytes.iter().enumerate() {
        if i > 0 && byte == b'\n' && bytes[i - 1] != b'\r' {
            text.push(b'\r');
            repaired += 1;
        }
        text.push(byte);
    }

    Reassembled { text, repaired }
}
