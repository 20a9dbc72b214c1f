//! Serial Link to the GPS Receiver
//!
//! Opens the tty, applies the receiver's line settings, and issues the
//! cold restart command. Reads block until at least one byte arrives.

use crate::config::DeviceConfig;
use crate::error::GpsError;
use std::fs::{File, OpenOptions};
use std::io::{self, Read, Write};
use std::os::unix::fs::OpenOptionsExt;
use std::os::unix::io::AsRawFd;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Byte source shared between the lifecycle controller and the reader thread
pub trait SerialIo: Send + Sync {
    /// Read into `buf`, blocking until at least one byte is available
    fn read(&self, buf: &mut [u8]) -> io::Result<usize>;
}

/// Opens serial links for the device
pub trait Connector: Send + Sync {
    /// Open and initialize the link at `path`
    fn connect(&self, path: &str, config: &DeviceConfig) -> Result<Arc<dyn SerialIo>, GpsError>;
}

/// Connector for real tty devices
#[derive(Debug, Default, Clone, Copy)]
pub struct TtyConnector;

impl Connector for TtyConnector {
    fn connect(&self, path: &str, config: &DeviceConfig) -> Result<Arc<dyn SerialIo>, GpsError> {
        let link = SerialLink::open(path, config)?;
        Ok(Arc::new(link))
    }
}

/// An open serial connection; closed when dropped
#[derive(Debug)]
pub struct SerialLink {
    file: File,
    path: String,
}

impl SerialLink {
    /// Open `path`, configure the line, and send the reset command
    ///
    /// Only the open itself is fatal. Configuration and reset failures are
    /// logged and the link is returned anyway.
    pub fn open(path: &str, config: &DeviceConfig) -> Result<Self, GpsError> {
        // Non-blocking so the open does not wait for carrier detect
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .custom_flags(libc::O_NOCTTY | libc::O_NONBLOCK)
            .open(path)
            .map_err(|source| GpsError::OpenFailed {
                path: path.to_string(),
                source,
            })?;
        debug!("Serial port to GPS is now open: {}", path);

        let link = Self {
            file,
            path: path.to_string(),
        };

        if let Err(e) = link.configure(config.baud_rate) {
            warn!("Could not apply line settings to {}: {}", path, e);
        }
        if let Err(e) = link.send(config.reset_command.as_bytes()) {
            warn!("Could not send reset command to {}: {}", path, e);
        }
        if let Err(e) = link.set_blocking() {
            warn!("Could not switch {} to blocking reads: {}", path, e);
        }

        info!("Connected to GPS receiver on {}", path);
        Ok(link)
    }

    /// Write raw bytes to the receiver
    pub fn send(&self, bytes: &[u8]) -> Result<(), GpsError> {
        (&self.file).write_all(bytes)?;
        Ok(())
    }

    /// Apply 8N1, canonical mode, RTS/CTS, and flush pending input
    fn configure(&self, baud_rate: u32) -> Result<(), GpsError> {
        let fd = self.file.as_raw_fd();
        let speed = baud_constant(baud_rate)?;

        // SAFETY: termios is plain old data; all-zero disables every
        // control character and flag not set below
        let mut tty: libc::termios = unsafe { std::mem::zeroed() };
        tty.c_cflag = libc::CRTSCTS | libc::CS8 | libc::CLOCAL | libc::CREAD;
        tty.c_iflag = libc::IGNPAR | libc::ICRNL;
        tty.c_oflag = 0;
        tty.c_lflag = libc::ICANON;
        tty.c_cc[libc::VEOF] = 4; // Ctrl-d
        tty.c_cc[libc::VTIME] = 0;
        tty.c_cc[libc::VMIN] = 1;

        // SAFETY: tty is a valid termios and fd stays open for self's lifetime
        unsafe {
            check(libc::cfsetispeed(&mut tty, speed))?;
            check(libc::cfsetospeed(&mut tty, speed))?;
            check(libc::tcflush(fd, libc::TCIFLUSH))?;
            check(libc::tcsetattr(fd, libc::TCSANOW, &tty))?;
        }
        Ok(())
    }

    fn set_blocking(&self) -> Result<(), GpsError> {
        let fd = self.file.as_raw_fd();
        // SAFETY: fcntl on an fd we own
        unsafe {
            let flags = libc::fcntl(fd, libc::F_GETFL);
            check(flags)?;
            check(libc::fcntl(fd, libc::F_SETFL, flags & !libc::O_NONBLOCK))?;
        }
        Ok(())
    }
}

impl SerialIo for SerialLink {
    fn read(&self, buf: &mut [u8]) -> io::Result<usize> {
        (&self.file).read(buf)
    }
}

impl Drop for SerialLink {
    fn drop(&mut self) {
        debug!("Closing serial port {}", self.path);
    }
}

fn check(ret: libc::c_int) -> Result<(), GpsError> {
    if ret < 0 {
        Err(GpsError::Configure(io::Error::last_os_error().to_string()))
    } else {
        Ok(())
    }
}

/// Map a numeric baud rate to its termios speed constant
pub fn baud_constant(baud_rate: u32) -> Result<libc::speed_t, GpsError> {
    let speed = match baud_rate {
        1200 => libc::B1200,
        2400 => libc::B2400,
        4800 => libc::B4800,
        9600 => libc::B9600,
        19200 => libc::B19200,
        38400 => libc::B38400,
        57600 => libc::B57600,
        115200 => libc::B115200,
        other => return Err(GpsError::UnsupportedBaudRate(other)),
    };
    Ok(speed)
}
