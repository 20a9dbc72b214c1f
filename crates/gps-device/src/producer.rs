//! Serial Reader Thread
//!
//! Blocks on the serial link and appends whatever arrives to the shared
//! ring. Cancellation is only observed between reads, so a reader parked in
//! a blocking read stays there until the receiver sends data.

use crate::device::{lock, SharedState};
use crate::serial::SerialIo;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, trace};

/// Everything the reader thread owns
pub(crate) struct Producer {
    pub link: Arc<dyn SerialIo>,
    pub shared: Arc<Mutex<SharedState>>,
    pub cancel: Arc<AtomicBool>,
    pub read_chunk: usize,
    pub warmup: Duration,
    pub pacing: Duration,
}

impl Producer {
    /// Start the reader on its own named thread
    pub fn spawn(self) -> io::Result<JoinHandle<()>> {
        thread::Builder::new()
            .name("gps-reader".to_string())
            .spawn(move || self.run())
    }

    fn run(self) {
        debug!("GPS reader waiting {:?} for receiver restart", self.warmup);
        thread::sleep(self.warmup);

        let mut chunk = vec![0u8; self.read_chunk.max(1)];
        while !self.cancel.load(Ordering::SeqCst) {
            match self.link.read(&mut chunk) {
                Ok(0) => {}
                Ok(n) => {
                    let mut shared = lock(&self.shared);
                    shared.ring.extend_from_slice(&chunk[..n]);
                    drop(shared);
                    metrics::counter!("gps_bytes_read_total").increment(n as u64);
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => trace!("Serial read returned no data: {}", e),
            }

            // Receiver emits at most once per second; no need to spin
            thread::sleep(self.pacing);
        }

        debug!("GPS reader stopped");
    }
}
