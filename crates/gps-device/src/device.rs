//! GPS Device Lifecycle and Consumer Tick
//!
//! The device owns one lock around the byte ring, the decoder, and the
//! published records. A tick holds it from drain through decode to commit,
//! so readers never see a half-updated fix and the reader thread never sees
//! a half-drained ring. The reader thread therefore waits for a whole tick
//! before it can append.

use crate::config::DeviceConfig;
use crate::error::GpsError;
use crate::filter::PositionFilter;
use crate::producer::Producer;
use crate::reassembler::{reassemble, Reassembled};
use crate::serial::{Connector, SerialIo, TtyConnector};
use crate::types::{DeviceState, GpsSnapshot, PositionEstimate, TickStatus, UtcTime};
use nmea_decoder::NmeaParser;
use ring_buffer::RingBuffer;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::JoinHandle;
use tracing::{debug, error, info, trace, warn};

/// State shared by the reader thread, the tick, and the query surface
pub(crate) struct SharedState {
    pub ring: RingBuffer,
    pub snapshot: GpsSnapshot,
    pub estimate: PositionEstimate,
    /// Created once; partial sentences survive across ticks and restarts
    pub decoder: NmeaParser,
}

impl SharedState {
    fn new(capacity: usize) -> Self {
        Self {
            ring: RingBuffer::new(capacity),
            snapshot: GpsSnapshot::default(),
            estimate: PositionEstimate::default(),
            decoder: NmeaParser::new(),
        }
    }

    fn reset(&mut self) {
        self.ring.clear();
        self.snapshot = GpsSnapshot::default();
        self.estimate = PositionEstimate::default();
    }
}

/// Lock a mutex, recovering the data if another thread panicked holding it
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Handles owned while the device is running
struct Lifecycle {
    serial_port: String,
    link: Option<Arc<dyn SerialIo>>,
    worker: Option<JoinHandle<()>>,
}

/// Serial GPS receiver
pub struct GpsDevice {
    config: DeviceConfig,
    connector: Box<dyn Connector>,
    filter: PositionFilter,
    shared: Arc<Mutex<SharedState>>,
    cancel: Arc<AtomicBool>,
    /// Serializes start/stop; never held together with `shared`
    lifecycle: Mutex<Lifecycle>,
    state: Mutex<DeviceState>,
}

impl GpsDevice {
    /// Create a device that opens real tty devices
    pub fn new(config: DeviceConfig) -> Self {
        Self::with_connector(config, TtyConnector)
    }

    /// Create a device with a custom link connector
    ///
    /// # Panics
    /// Panics if `config.buffer_capacity` is zero; see [`DeviceConfig::validate`].
    pub fn with_connector(config: DeviceConfig, connector: impl Connector + 'static) -> Self {
        info!("Creating GPS device for {}", config.serial_port);
        Self {
            filter: PositionFilter::new(config.smoothing_weight, config.min_satellites),
            shared: Arc::new(Mutex::new(SharedState::new(config.buffer_capacity))),
            cancel: Arc::new(AtomicBool::new(false)),
            lifecycle: Mutex::new(Lifecycle {
                serial_port: config.serial_port.clone(),
                link: None,
                worker: None,
            }),
            state: Mutex::new(DeviceState::Stopped),
            connector: Box::new(connector),
            config,
        }
    }

    /// Connect to the receiver and start the reader thread
    ///
    /// A no-op when already running. On failure the error is logged and the
    /// device stays stopped; nothing is retried.
    pub fn start(&self) -> Result<(), GpsError> {
        let mut lifecycle = lock(&self.lifecycle);
        if self.state() == DeviceState::Running {
            debug!("GPS device already running");
            return Ok(());
        }

        self.set_state(DeviceState::Connecting);
        let path = lifecycle.serial_port.clone();
        let link = match self.connector.connect(&path, &self.config) {
            Ok(link) => link,
            Err(e) => {
                error!("Unable to start, no serial connection to GPS receiver: {}", e);
                self.set_state(DeviceState::Stopped);
                return Err(e);
            }
        };

        lock(&self.shared).reset();
        self.cancel.store(false, Ordering::SeqCst);

        let producer = Producer {
            link: Arc::clone(&link),
            shared: Arc::clone(&self.shared),
            cancel: Arc::clone(&self.cancel),
            read_chunk: self.config.read_chunk,
            warmup: self.config.warmup(),
            pacing: self.config.pacing(),
        };
        let worker = match producer.spawn() {
            Ok(worker) => worker,
            Err(e) => {
                error!("Unable to start GPS reader thread: {}", e);
                self.set_state(DeviceState::Stopped);
                return Err(GpsError::Spawn(e.to_string()));
            }
        };

        lifecycle.link = Some(link);
        lifecycle.worker = Some(worker);
        self.set_state(DeviceState::Running);
        info!("GPS device started on {}", path);
        Ok(())
    }

    /// Stop the reader thread and close the link
    ///
    /// Blocks until the reader observes cancellation, which requires its
    /// current read to return. A no-op when already stopped.
    pub fn stop(&self) {
        let mut lifecycle = lock(&self.lifecycle);
        if self.state() == DeviceState::Stopped {
            return;
        }

        info!("Stopping GPS device");
        self.cancel.store(true, Ordering::SeqCst);
        if let Some(worker) = lifecycle.worker.take() {
            if worker.join().is_err() {
                warn!("GPS reader thread panicked");
            }
        }
        // Last reference once the reader has exited; dropping closes the port
        lifecycle.link = None;

        self.set_state(DeviceState::Stopped);
        info!("GPS device stopped");
    }

    /// Point the device at another serial port, reconnecting if running
    pub fn set_serial_port(&self, path: &str) -> Result<(), GpsError> {
        let running = self.state() == DeviceState::Running;
        if running {
            self.stop();
        }
        lock(&self.lifecycle).serial_port = path.to_string();
        info!("GPS serial port set to {}", path);

        if running {
            self.start()
        } else {
            Ok(())
        }
    }

    /// Drain and decode buffered bytes
    ///
    /// Returns [`TickStatus::NoWork`] without touching any state while the
    /// ring holds no more than `drain_threshold` bytes. Otherwise the ring is
    /// always emptied, whether or not a sentence decoded.
    pub fn service_tick(&self) -> TickStatus {
        let mut guard = lock(&self.shared);
        let shared = &mut *guard;

        if shared.ring.len() <= self.config.drain_threshold {
            return TickStatus::NoWork;
        }

        let raw = shared.ring.drain_all();
        let Reassembled { text, repaired } = reassemble(&raw);
        trace!("Messages:\n{}", String::from_utf8_lossy(&text));

        let rejected_before = shared.decoder.rejected();
        let parsed = shared.decoder.parse(&text);
        let rejected = shared.decoder.rejected() - rejected_before;
        debug!(
            total_accepted = shared.decoder.accepted(),
            "Messages good {} vs. repaired line endings {}, rejected {}",
            parsed,
            repaired,
            rejected
        );
        metrics::counter!("gps_ticks_processed_total").increment(1);
        metrics::counter!("gps_sentences_decoded_total").increment(parsed as u64);
        metrics::counter!("gps_sentences_rejected_total").increment(rejected);
        metrics::counter!("gps_line_endings_repaired_total").increment(repaired as u64);

        if parsed > 0 {
            let info = shared.decoder.info();
            shared.snapshot.satellite_count = info.satellites_in_view;
            self.filter.update(&mut shared.estimate, info);

            let timestamp = UtcTime::from_fields(&info.utc);
            shared.snapshot.timestamp = timestamp;
            shared.estimate.timestamp = timestamp;

            debug!(
                satellites = info.satellites_in_view,
                utc_seconds = timestamp.whole_seconds,
                latitude = info.latitude,
                longitude = info.longitude,
                elevation = info.elevation,
                "Fix decoded"
            );
        } else {
            debug!("No valid messages processed");
        }

        shared.estimate.valid = self.filter.is_valid(shared.snapshot.satellite_count);
        TickStatus::DataProcessed
    }

    /// Last committed position estimate
    pub fn position_estimate(&self) -> PositionEstimate {
        lock(&self.shared).estimate
    }

    /// Last committed satellite summary
    pub fn gps_snapshot(&self) -> GpsSnapshot {
        lock(&self.shared).snapshot
    }

    /// Bytes waiting in the ring
    pub fn buffered_len(&self) -> usize {
        lock(&self.shared).ring.len()
    }

    /// Ring occupancy (0.0 to 1.0)
    pub fn buffer_fill_ratio(&self) -> f64 {
        lock(&self.shared).ring.fill_ratio()
    }

    /// Bytes appended to the ring since the last start
    pub fn bytes_received(&self) -> usize {
        lock(&self.shared).ring.total_written()
    }

    /// Current lifecycle state
    pub fn state(&self) -> DeviceState {
        *lock(&self.state)
    }

    /// Serial port used by the next `start`
    pub fn serial_port(&self) -> String {
        lock(&self.lifecycle).serial_port.clone()
    }

    /// Device configuration
    pub fn config(&self) -> &DeviceConfig {
        &self.config
    }

    fn set_state(&self, state: DeviceState) {
        *lock(&self.state) = state;
    }

    #[cfg(test)]
    pub(crate) fn inject(&self, bytes: &[u8]) {
        lock(&self.shared).ring.extend_from_slice(bytes);
    }
}

impl Drop for GpsDevice {
    fn drop(&mut self) {
        // Signal only; joining here could block on a parked read
        self.cancel.store(true, Ordering::SeqCst);
    }
}
