//! rigbridge-core: core traits, types, framing and error definitions.
//!
//! This crate defines the manufacturer-agnostic abstractions shared by the
//! protocol engines, the command coordinator and the rigctld server.
//!
//! # Key types
//!
//! - [`Operation`] / [`Reply`] -- the vendor-neutral request set
//! - [`ProtocolEngine`] -- one implementation per wire protocol
//! - [`Rig`] -- the typed control interface front ends use
//! - [`Transport`] / [`SerialLink`] -- raw and framed byte channels
//! - [`Error`] / [`Result`] -- error handling

pub mod engine;
pub mod error;
pub mod framing;
pub mod helpers;
pub mod link;
pub mod operation;
pub mod rig;
pub mod transport;
pub mod types;

pub use engine::ProtocolEngine;
pub use error::{Error, Result};
pub use helpers::{calibrate_meter, format_freq_mhz, model_id};
pub use link::{command_timeout_for_baud, SerialLink, DEFAULT_COMMAND_TIMEOUT};
pub use operation::{Operation, Reply};
pub use rig::Rig;
pub use transport::Transport;
pub use types::*;
