//! rigbridge-test-harness: test utilities for rigbridge.
//!
//! [`MockTransport`] scripts request/response exchanges so protocol engines,
//! the coordinator and the rigctld server can be tested without a radio.
//! A [`MockHandle`] keeps access to the script and the sent-data log after
//! the transport has been boxed and moved into a coordinator.

pub mod mock_serial;

pub use mock_serial::{MockHandle, MockTransport};
