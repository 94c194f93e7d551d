//! The [`Coordinator`] handle.
//!
//! A cheap, cloneable front for one worker task. Every clone shares the
//! same queue, so any number of callers can use one rig concurrently and
//! still get strictly serialized, non-overlapping exchanges.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use rigbridge_core::error::{Error, Result};
use rigbridge_core::{Operation, Reply, Rig, RigCapabilities, RigInfo, Transport};

use crate::validate::validate;
use crate::worker::Request;

struct Inner {
    tx: mpsc::Sender<Request>,
    info: RigInfo,
    capabilities: RigCapabilities,
    command_timeout: Duration,
    cancel: CancellationToken,
    task: Mutex<Option<JoinHandle<()>>>,
}

#[derive(Clone)]
pub struct Coordinator {
    inner: Arc<Inner>,
}

impl Coordinator {
    pub(crate) fn new(
        tx: mpsc::Sender<Request>,
        info: RigInfo,
        capabilities: RigCapabilities,
        command_timeout: Duration,
        cancel: CancellationToken,
        task: JoinHandle<()>,
    ) -> Self {
        Coordinator {
            inner: Arc::new(Inner {
                tx,
                info,
                capabilities,
                command_timeout,
                cancel,
                task: Mutex::new(Some(task)),
            }),
        }
    }

    pub fn command_timeout(&self) -> Duration {
        self.inner.command_timeout
    }

    /// Token that stops the worker when cancelled.
    pub fn cancel_token(&self) -> CancellationToken {
        self.inner.cancel.clone()
    }

    /// Stop the worker after the requests already queued and recover the
    /// transport. Later calls on any clone fail with `NotConnected`.
    pub async fn shutdown(&self) -> Result<Box<dyn Transport>> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.inner
            .tx
            .send(Request::Shutdown { reply: reply_tx })
            .await
            .map_err(|_| Error::NotConnected)?;
        let transport = reply_rx.await.map_err(|_| Error::NotConnected)?;

        let task = self
            .inner
            .task
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();
        if let Some(task) = task {
            let _ = task.await;
        }
        Ok(transport)
    }
}

impl std::fmt::Debug for Coordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Coordinator")
            .field("model", &self.inner.info.model_name)
            .field("command_timeout", &self.inner.command_timeout)
            .finish()
    }
}

#[async_trait]
impl Rig for Coordinator {
    fn info(&self) -> &RigInfo {
        &self.inner.info
    }

    fn capabilities(&self) -> &RigCapabilities {
        &self.inner.capabilities
    }

    async fn execute(&self, op: Operation) -> Result<Reply> {
        validate(&op, &self.inner.capabilities)?;
        if op == Operation::MemoryCount {
            return Ok(Reply::Count(self.inner.capabilities.memory_count()));
        }

        let (reply_tx, reply_rx) = oneshot::channel();
        self.inner
            .tx
            .send(Request::Execute { op, reply: reply_tx })
            .await
            .map_err(|_| Error::NotConnected)?;

        // Queue wait is unbounded; the worker bounds each round trip.
        reply_rx.await.map_err(|_| Error::NotConnected)?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::CoordinatorBuilder;
    use rigbridge_cat::models::ts_590sg;
    use rigbridge_cat::CatEngine;
    use rigbridge_civ::models::ic_7300;
    use rigbridge_civ::CivEngine;
    use rigbridge_core::{Mode, Vfo};
    use rigbridge_test_harness::{MockHandle, MockTransport};

    const READ_FREQ: [u8; 6] = [0xFE, 0xFE, 0x94, 0xE0, 0x03, 0xFD];
    const FREQ_14_230: [u8; 11] = [
        0xFE, 0xFE, 0xE0, 0x94, 0x03, 0x00, 0x00, 0x23, 0x14, 0x00, 0xFD,
    ];
    const ACK: [u8; 6] = [0xFE, 0xFE, 0xE0, 0x94, 0xFB, 0xFD];
    const SELECT_A: [u8; 7] = [0xFE, 0xFE, 0x94, 0xE0, 0x07, 0x00, 0xFD];
    const READ_S_METER: [u8; 7] = [0xFE, 0xFE, 0x94, 0xE0, 0x15, 0x02, 0xFD];
    // Raw 120, which the IC-7300 table puts at S9.
    const S_METER_S9: [u8; 9] = [0xFE, 0xFE, 0xE0, 0x94, 0x15, 0x02, 0x01, 0x20, 0xFD];

    async fn ic7300() -> (Coordinator, MockTransport, MockHandle) {
        let mock = MockTransport::new();
        let handle = mock.handle();
        let coordinator = CoordinatorBuilder::new(Box::new(CivEngine::new(ic_7300())))
            .build_with_transport(Box::new(mock.clone()))
            .await
            .unwrap();
        (coordinator, mock, handle)
    }

    // ---------------------------------------------------------------
    // Cache
    // ---------------------------------------------------------------

    #[tokio::test]
    async fn second_read_within_ttl_is_served_from_cache() {
        let (rig, mock, handle) = ic7300().await;
        mock.expect(&READ_FREQ, &FREQ_14_230);
        assert_eq!(rig.get_frequency(Vfo::Current).await.unwrap(), 14_230_000);
        assert_eq!(rig.get_frequency(Vfo::Current).await.unwrap(), 14_230_000);
        assert_eq!(handle.send_count(), 1);
    }

    #[tokio::test]
    async fn read_after_write_goes_to_the_wire() {
        let (rig, mock, handle) = ic7300().await;
        mock.expect(&READ_FREQ, &FREQ_14_230);
        mock.expect(
            &[0xFE, 0xFE, 0x94, 0xE0, 0x05, 0x00, 0x00, 0x25, 0x14, 0x00, 0xFD],
            &ACK,
        );
        mock.expect(
            &READ_FREQ,
            &[0xFE, 0xFE, 0xE0, 0x94, 0x03, 0x00, 0x00, 0x25, 0x14, 0x00, 0xFD],
        );
        rig.get_frequency(Vfo::Current).await.unwrap();
        rig.set_frequency(Vfo::Current, 14_250_000).await.unwrap();
        assert_eq!(rig.get_frequency(Vfo::Current).await.unwrap(), 14_250_000);
        assert_eq!(handle.send_count(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn read_after_ttl_goes_to_the_wire() {
        let (rig, mock, handle) = ic7300().await;
        mock.expect(&READ_FREQ, &FREQ_14_230);
        mock.expect(&READ_FREQ, &FREQ_14_230);
        rig.get_frequency(Vfo::Current).await.unwrap();
        tokio::time::advance(Duration::from_millis(600)).await;
        rig.get_frequency(Vfo::Current).await.unwrap();
        assert_eq!(handle.send_count(), 2);
    }

    #[tokio::test]
    async fn vfo_select_invalidates_current_reads() {
        let (rig, mock, handle) = ic7300().await;
        mock.expect(&READ_FREQ, &FREQ_14_230);
        mock.expect(&[0xFE, 0xFE, 0x94, 0xE0, 0x07, 0x01, 0xFD], &ACK);
        mock.expect(
            &READ_FREQ,
            &[0xFE, 0xFE, 0xE0, 0x94, 0x03, 0x00, 0x00, 0x07, 0x07, 0x00, 0xFD],
        );
        rig.get_frequency(Vfo::Current).await.unwrap();
        rig.select_vfo(Vfo::B).await.unwrap();
        assert_eq!(rig.get_frequency(Vfo::Current).await.unwrap(), 7_070_000);
        assert_eq!(handle.send_count(), 3);
    }

    #[tokio::test]
    async fn zero_ttl_disables_cache() {
        let mock = MockTransport::new();
        let handle = mock.handle();
        let rig = CoordinatorBuilder::new(Box::new(CivEngine::new(ic_7300())))
            .cache_ttl(Duration::ZERO)
            .build_with_transport(Box::new(mock.clone()))
            .await
            .unwrap();
        mock.expect(&READ_FREQ, &FREQ_14_230);
        mock.expect(&READ_FREQ, &FREQ_14_230);
        rig.get_frequency(Vfo::Current).await.unwrap();
        rig.get_frequency(Vfo::Current).await.unwrap();
        assert_eq!(handle.send_count(), 2);
    }

    // ---------------------------------------------------------------
    // Validation
    // ---------------------------------------------------------------

    #[tokio::test]
    async fn invalid_requests_never_reach_the_wire() {
        let (rig, _, handle) = ic7300().await;
        assert!(matches!(
            rig.set_frequency(Vfo::Current, 200_000_000).await,
            Err(Error::FrequencyOutOfRange(200_000_000))
        ));
        assert!(matches!(
            rig.set_power(150.0).await,
            Err(Error::InvalidParameter(_))
        ));
        assert!(matches!(
            rig.select_vfo(Vfo::Main).await,
            Err(Error::UnsupportedOperation(_))
        ));
        assert!(matches!(
            rig.set_rit(true, 12_000).await,
            Err(Error::InvalidParameter(_))
        ));
        assert_eq!(handle.send_count(), 0);
    }

    #[tokio::test]
    async fn memory_count_is_answered_locally() {
        let (rig, _, handle) = ic7300().await;
        assert_eq!(rig.memory_count().await.unwrap(), 99);
        assert_eq!(handle.send_count(), 0);
    }

    // ---------------------------------------------------------------
    // Serialization and error recovery
    // ---------------------------------------------------------------

    #[tokio::test]
    async fn concurrent_callers_are_served_in_order() {
        let (rig, mock, handle) = ic7300().await;
        let read_ptt = [0xFE, 0xFE, 0x94, 0xE0, 0x1C, 0x00, 0xFD];
        let read_split = [0xFE, 0xFE, 0x94, 0xE0, 0x0F, 0xFD];
        mock.expect(&READ_FREQ, &FREQ_14_230);
        mock.expect(&read_ptt, &[0xFE, 0xFE, 0xE0, 0x94, 0x1C, 0x00, 0x00, 0xFD]);
        mock.expect(&read_split, &[0xFE, 0xFE, 0xE0, 0x94, 0x0F, 0x01, 0xFD]);

        let a = rig.clone();
        let b = rig.clone();
        let (freq, ptt, split) = tokio::join!(
            rig.get_frequency(Vfo::Current),
            a.get_ptt(),
            b.get_split()
        );
        assert_eq!(freq.unwrap(), 14_230_000);
        assert!(!ptt.unwrap());
        assert!(split.unwrap());
        assert_eq!(
            handle.sent_data(),
            vec![READ_FREQ.to_vec(), read_ptt.to_vec(), read_split.to_vec()]
        );
    }

    #[tokio::test]
    async fn timeout_flushes_before_next_command() {
        let (rig, mock, handle) = ic7300().await;
        // Truncated reply: the worker times out with bytes left behind.
        mock.expect(&READ_FREQ, &[0xFE, 0xFE, 0xE0, 0x94, 0x03, 0x00]);
        assert!(matches!(
            rig.get_frequency(Vfo::Current).await,
            Err(Error::Timeout)
        ));
        assert_eq!(handle.clear_count(), 0);

        // The engine no longer trusts the rig's VFO and selects A again.
        mock.expect(&SELECT_A, &ACK);
        mock.expect(&READ_FREQ, &FREQ_14_230);
        assert_eq!(rig.get_frequency(Vfo::Current).await.unwrap(), 14_230_000);
        assert_eq!(handle.clear_count(), 1);
        assert_eq!(handle.sent_data()[1], SELECT_A.to_vec());
    }

    #[tokio::test(start_paused = true)]
    async fn queued_callers_wait_out_a_slow_rig() {
        let (rig, mock, handle) = ic7300().await;
        // Each answer takes 400 ms; five callers queue for 2 s in total.
        mock.set_reply_delay(Duration::from_millis(400));
        for _ in 0..5 {
            mock.expect(&READ_S_METER, &S_METER_S9);
        }

        let mut callers = Vec::new();
        for _ in 0..5 {
            let rig = rig.clone();
            callers.push(tokio::spawn(async move { rig.get_signal_strength().await }));
        }
        for caller in callers {
            assert_eq!(caller.await.unwrap().unwrap(), 0);
        }
        assert_eq!(handle.send_count(), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn abandoned_request_still_reaches_the_rig() {
        let (rig, mock, handle) = ic7300().await;
        let ptt_on = [0xFE, 0xFE, 0x94, 0xE0, 0x1C, 0x00, 0x01, 0xFD];
        mock.set_reply_delay(Duration::from_millis(400));
        mock.expect(&READ_S_METER, &S_METER_S9);
        mock.expect(&ptt_on, &ACK);

        let impatient = rig.clone();
        let (strength, gave_up) = tokio::join!(
            rig.get_signal_strength(),
            tokio::time::timeout(Duration::from_millis(10), impatient.set_ptt(true))
        );
        assert_eq!(strength.unwrap(), 0);
        assert!(gave_up.is_err());

        // A later caller queues behind the abandoned write.
        mock.expect(
            &[0xFE, 0xFE, 0x94, 0xE0, 0x0F, 0xFD],
            &[0xFE, 0xFE, 0xE0, 0x94, 0x0F, 0x00, 0xFD],
        );
        assert!(!rig.get_split().await.unwrap());
        assert_eq!(handle.sent_data()[1], ptt_on.to_vec());
        assert_eq!(handle.send_count(), 3);
    }

    #[tokio::test]
    async fn nak_is_returned_once() {
        let (rig, mock, handle) = ic7300().await;
        mock.expect(
            &[0xFE, 0xFE, 0x94, 0xE0, 0x06, 0x01, 0x02, 0xFD],
            &[0xFE, 0xFE, 0xE0, 0x94, 0xFA, 0xFD],
        );
        let result = rig.set_mode(Vfo::Current, Mode::USB, None).await;
        assert!(matches!(result, Err(Error::CommandFailed(_))));
        assert_eq!(handle.send_count(), 1);
        assert_eq!(handle.clear_count(), 0);
    }

    #[tokio::test]
    async fn shutdown_returns_transport_and_stops_clones() {
        let (rig, _, _) = ic7300().await;
        let clone = rig.clone();
        let transport = rig.shutdown().await.unwrap();
        assert!(transport.is_connected());
        assert!(matches!(
            clone.get_ptt().await,
            Err(Error::NotConnected)
        ));
    }

    #[tokio::test]
    async fn cancel_token_stops_worker() {
        let (rig, _, _) = ic7300().await;
        rig.cancel_token().cancel();
        tokio::task::yield_now().await;
        assert!(matches!(rig.get_ptt().await, Err(Error::NotConnected)));
    }

    #[tokio::test]
    async fn text_rig_is_initialized_on_build() {
        let mock = MockTransport::new();
        let handle = mock.handle();
        mock.expect(b"AI0;", b"AI0;");
        let rig = CoordinatorBuilder::new(Box::new(CatEngine::new(ts_590sg())))
            .build_with_transport(Box::new(mock.clone()))
            .await
            .unwrap();
        assert_eq!(rig.info().model_name, "TS-590SG");
        assert_eq!(handle.sent_text(), vec!["AI0;".to_string()]);
    }
}
