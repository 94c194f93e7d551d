//! Transport implementations for rigbridge.
//!
//! [`SerialTransport`] implements [`Transport`](rigbridge_core::Transport)
//! for USB virtual COM ports and RS-232 lines, which is how every supported
//! transceiver is attached.
//!
//! # Example
//!
//! ```no_run
//! use rigbridge_transport::SerialTransport;
//! use rigbridge_core::transport::Transport;
//! use std::time::Duration;
//!
//! # async fn example() -> rigbridge_core::Result<()> {
//! // IC-7300 over USB, CI-V at 115200 baud
//! let mut transport = SerialTransport::open("/dev/ttyUSB0", 115200).await?;
//! transport.send(&[0xFE, 0xFE, 0x94, 0xE0, 0x03, 0xFD]).await?;
//!
//! let mut buf = [0u8; 256];
//! let n = transport.receive(&mut buf, Duration::from_secs(1)).await?;
//! # Ok(())
//! # }
//! ```

pub mod serial;

pub use serial::{DataBits, FlowControl, Parity, SerialConfig, SerialTransport, StopBits};
