//! Scripted mock transport.
//!
//! # Example
//!
//! ```
//! use rigbridge_test_harness::MockTransport;
//!
//! let mock = MockTransport::new();
//! // IC-7300 read frequency, answered with 14.230 MHz.
//! mock.expect(&[0xFE, 0xFE, 0x94, 0xE0, 0x03, 0xFD],
//!             &[0xFE, 0xFE, 0xE0, 0x94, 0x03, 0x00, 0x00, 0x23, 0x14, 0x00, 0xFD]);
//! let handle = mock.handle();
//! assert_eq!(handle.remaining_expectations(), 1);
//! ```

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use rigbridge_core::error::{Error, Result};
use rigbridge_core::transport::Transport;

#[derive(Debug, Clone)]
struct Expectation {
    request: Vec<u8>,
    response: Vec<u8>,
}

#[derive(Debug)]
struct MockState {
    expectations: VecDeque<Expectation>,
    /// Bytes the "rig" has sent that have not been read yet.
    rx: VecDeque<u8>,
    /// Largest number of bytes handed out per `receive()`; 0 = unlimited.
    chunk_size: usize,
    /// How long the "rig" takes to start answering each matched send.
    reply_delay: Duration,
    /// Part of the current reply delay not yet waited out.
    delay_left: Duration,
    connected: bool,
    sent_log: Vec<Vec<u8>>,
    clear_count: usize,
}

fn lock(state: &Mutex<MockState>) -> MutexGuard<'_, MockState> {
    // A panicking test thread must not hide the log from the others.
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// A mock [`Transport`] driven by an ordered list of expected exchanges.
///
/// Each `send()` is compared with the next expectation; on a match its
/// response is queued for `receive()`. Responses accumulate, so bytes left
/// unread by one exchange are still there for the next one (useful for
/// desync tests). `receive()` with nothing queued returns
/// [`Error::Timeout`] immediately. With a reply delay set, the first
/// `receive()` after each send waits that long (on the tokio clock) first.
#[derive(Debug, Clone)]
pub struct MockTransport {
    state: Arc<Mutex<MockState>>,
}

/// Shared view of a [`MockTransport`], usable after the transport moved.
#[derive(Debug, Clone)]
pub struct MockHandle {
    state: Arc<Mutex<MockState>>,
}

impl MockTransport {
    /// Create a new mock transport in the connected state.
    pub fn new() -> Self {
        MockTransport {
            state: Arc::new(Mutex::new(MockState {
                expectations: VecDeque::new(),
                rx: VecDeque::new(),
                chunk_size: 0,
                reply_delay: Duration::ZERO,
                delay_left: Duration::ZERO,
                connected: true,
                sent_log: Vec::new(),
                clear_count: 0,
            })),
        }
    }

    /// Queue an exchange: when `request` is sent, `response` becomes readable.
    pub fn expect(&self, request: &[u8], response: &[u8]) {
        self.handle().expect(request, response);
    }

    /// Make bytes readable without a preceding send.
    pub fn inject(&self, data: &[u8]) {
        self.handle().inject(data);
    }

    /// Deliver replies in fragments of at most `size` bytes.
    pub fn set_chunk_size(&self, size: usize) {
        lock(&self.state).chunk_size = size;
    }

    /// Simulate a slow rig: each reply becomes readable `delay` after its send.
    pub fn set_reply_delay(&self, delay: Duration) {
        lock(&self.state).reply_delay = delay;
    }

    pub fn handle(&self) -> MockHandle {
        MockHandle {
            state: Arc::clone(&self.state),
        }
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl MockHandle {
    pub fn expect(&self, request: &[u8], response: &[u8]) {
        lock(&self.state).expectations.push_back(Expectation {
            request: request.to_vec(),
            response: response.to_vec(),
        });
    }

    pub fn inject(&self, data: &[u8]) {
        lock(&self.state).rx.extend(data.iter().copied());
    }

    /// Every `send()` payload so far, in order.
    pub fn sent_data(&self) -> Vec<Vec<u8>> {
        lock(&self.state).sent_log.clone()
    }

    /// Sent payloads decoded as text, for CAT tests.
    pub fn sent_text(&self) -> Vec<String> {
        lock(&self.state)
            .sent_log
            .iter()
            .map(|b| String::from_utf8_lossy(b).into_owned())
            .collect()
    }

    pub fn send_count(&self) -> usize {
        lock(&self.state).sent_log.len()
    }

    pub fn remaining_expectations(&self) -> usize {
        lock(&self.state).expectations.len()
    }

    /// How many times `clear_input()` has been called.
    pub fn clear_count(&self) -> usize {
        lock(&self.state).clear_count
    }

    /// Bytes still waiting to be read.
    pub fn unread(&self) -> usize {
        lock(&self.state).rx.len()
    }

    pub fn set_connected(&self, connected: bool) {
        lock(&self.state).connected = connected;
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&mut self, data: &[u8]) -> Result<()> {
        let mut state = lock(&self.state);
        if !state.connected {
            return Err(Error::NotConnected);
        }
        state.sent_log.push(data.to_vec());

        match state.expectations.pop_front() {
            Some(expectation) if expectation.request == data => {
                state.rx.extend(expectation.response);
                state.delay_left = state.reply_delay;
                Ok(())
            }
            Some(expectation) => Err(Error::Transport(format!(
                "unexpected send data: expected {:02X?}, got {:02X?}",
                expectation.request, data
            ))),
            None => Err(Error::Transport(format!(
                "no more expectations in mock transport, got {data:02X?}"
            ))),
        }
    }

    async fn receive(&mut self, buf: &mut [u8], timeout: Duration) -> Result<usize> {
        let wait = {
            let mut state = lock(&self.state);
            if !state.connected {
                return Err(Error::NotConnected);
            }
            std::mem::take(&mut state.delay_left)
        };
        if wait > timeout {
            tokio::time::sleep(timeout).await;
            lock(&self.state).delay_left = wait - timeout;
            return Err(Error::Timeout);
        }
        if !wait.is_zero() {
            tokio::time::sleep(wait).await;
        }

        let mut state = lock(&self.state);
        if state.rx.is_empty() {
            return Err(Error::Timeout);
        }
        let limit = if state.chunk_size == 0 {
            buf.len()
        } else {
            state.chunk_size.min(buf.len())
        };
        let n = state.rx.len().min(limit);
        for (slot, byte) in buf.iter_mut().zip(state.rx.drain(..n)) {
            *slot = byte;
        }
        Ok(n)
    }

    async fn clear_input(&mut self) -> Result<()> {
        let mut state = lock(&self.state);
        state.rx.clear();
        state.clear_count += 1;
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        let mut state = lock(&self.state);
        state.connected = false;
        state.rx.clear();
        Ok(())
    }

    fn is_connected(&self) -> bool {
        lock(&self.state).connected
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn basic_send_receive() {
        let mut mock = MockTransport::new();
        let request = &[0xFE, 0xFE, 0x94, 0xE0, 0x03, 0xFD];
        let response = &[0xFE, 0xFE, 0xE0, 0x94, 0x03, 0x00, 0x00, 0x23, 0x14, 0x00, 0xFD];
        mock.expect(request, response);

        mock.send(request).await.unwrap();

        let mut buf = [0u8; 64];
        let n = mock.receive(&mut buf, Duration::from_millis(100)).await.unwrap();
        assert_eq!(&buf[..n], response);
    }

    #[tokio::test]
    async fn handle_sees_sends_after_boxing() {
        let mock = MockTransport::new();
        mock.expect(b"FA;", b"FA00014230000;");
        let handle = mock.handle();

        let mut boxed: Box<dyn Transport> = Box::new(mock);
        boxed.send(b"FA;").await.unwrap();

        assert_eq!(handle.send_count(), 1);
        assert_eq!(handle.sent_text(), vec!["FA;".to_string()]);
        assert_eq!(handle.remaining_expectations(), 0);
    }

    #[tokio::test]
    async fn wrong_data_errors() {
        let mut mock = MockTransport::new();
        mock.expect(&[0x01], &[0xFF]);
        let result = mock.send(&[0x99]).await;
        assert!(matches!(result, Err(Error::Transport(_))));
    }

    #[tokio::test]
    async fn no_expectations_errors() {
        let mut mock = MockTransport::new();
        assert!(matches!(mock.send(&[0x01]).await, Err(Error::Transport(_))));
    }

    #[tokio::test]
    async fn receive_without_data_times_out() {
        let mut mock = MockTransport::new();
        let mut buf = [0u8; 8];
        let result = mock.receive(&mut buf, Duration::from_millis(10)).await;
        assert!(matches!(result, Err(Error::Timeout)));
    }

    #[tokio::test(start_paused = true)]
    async fn reply_delay_holds_back_the_reply() {
        let mut mock = MockTransport::new();
        mock.set_reply_delay(Duration::from_millis(400));
        mock.expect(&[0x01], &[0xAA]);
        mock.send(&[0x01]).await.unwrap();

        let mut buf = [0u8; 8];
        let start = tokio::time::Instant::now();
        let result = mock.receive(&mut buf, Duration::from_millis(100)).await;
        assert!(matches!(result, Err(Error::Timeout)));
        assert_eq!(mock.receive(&mut buf, Duration::from_secs(1)).await.unwrap(), 1);
        assert_eq!(start.elapsed(), Duration::from_millis(400));
    }

    #[tokio::test]
    async fn chunked_delivery() {
        let mut mock = MockTransport::new();
        mock.set_chunk_size(2);
        mock.expect(&[0x01], &[0xAA, 0xBB, 0xCC]);
        mock.send(&[0x01]).await.unwrap();

        let mut buf = [0u8; 8];
        assert_eq!(mock.receive(&mut buf, Duration::ZERO).await.unwrap(), 2);
        assert_eq!(&buf[..2], &[0xAA, 0xBB]);
        assert_eq!(mock.receive(&mut buf, Duration::ZERO).await.unwrap(), 1);
        assert_eq!(buf[0], 0xCC);
    }

    #[tokio::test]
    async fn clear_input_drops_injected_bytes() {
        let mut mock = MockTransport::new();
        mock.inject(b"FA00007000000;");
        let handle = mock.handle();
        assert_eq!(handle.unread(), 14);

        mock.clear_input().await.unwrap();
        assert_eq!(handle.unread(), 0);
        assert_eq!(handle.clear_count(), 1);
    }

    #[tokio::test]
    async fn disconnected_mock_rejects_io() {
        let mut mock = MockTransport::new();
        mock.handle().set_connected(false);
        assert!(!mock.is_connected());
        assert!(matches!(mock.send(&[0x01]).await, Err(Error::NotConnected)));

        let mut buf = [0u8; 8];
        let result = mock.receive(&mut buf, Duration::ZERO).await;
        assert!(matches!(result, Err(Error::NotConnected)));
    }
}
