//! The [`ProtocolEngine`] trait -- one implementation per wire protocol.
//!
//! An engine turns an [`Operation`] into bytes on a [`SerialLink`], waits for
//! and validates the reply, and returns a typed [`Reply`]. Engines hold only
//! protocol state (e.g. which VFO is selected); the link itself belongs to
//! the coordinator and is lent to the engine for each call.

use async_trait::async_trait;

use crate::error::Result;
use crate::link::SerialLink;
use crate::operation::{Operation, Reply};
use crate::types::{RigCapabilities, RigInfo};

#[async_trait]
pub trait ProtocolEngine: Send {
    /// Identity of the rig model this engine drives.
    fn info(&self) -> &RigInfo;

    /// Capability descriptor used for caller-side validation.
    fn capabilities(&self) -> &RigCapabilities;

    /// Serial speed the model ships with.
    fn default_baud_rate(&self) -> u32;

    /// One-time connection setup, run before the first operation.
    async fn initialize(&mut self, _link: &mut SerialLink) -> Result<()> {
        Ok(())
    }

    /// Perform one round trip for `op`.
    async fn execute(&mut self, link: &mut SerialLink, op: &Operation) -> Result<Reply>;

    /// Forget protocol state that may no longer match the rig, e.g. after a
    /// timeout left the exchange half-finished.
    fn reset(&mut self) {}
}
