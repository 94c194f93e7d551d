//! rigbridge-civ: Icom CI-V protocol engine.
//!
//! CI-V is a binary, half-duplex bus protocol. Frames are addressed
//! (`FE FE <dst> <src> <cmd> ... FD`), frequencies travel as 5-byte
//! little-endian BCD, and set commands are answered with `FB` (ACK) or
//! `FA` (NAK).
//!
//! # Modules
//!
//! - [`civ`] -- frame encoding and strict reply decoding
//! - [`commands`] -- command builders and payload parsers
//! - [`models`] -- per-model addresses, quirks and capabilities
//! - [`engine`] -- the [`CivEngine`] protocol engine
//!
//! # Example
//!
//! ```
//! use rigbridge_civ::{models, CivEngine};
//! use rigbridge_core::ProtocolEngine;
//!
//! let engine = CivEngine::new(models::ic_7300());
//! assert_eq!(engine.civ_address(), 0x94);
//! assert_eq!(engine.default_baud_rate(), 115_200);
//! ```

pub mod civ;
pub mod commands;
pub mod engine;
pub mod models;

pub use engine::CivEngine;
pub use models::IcomModel;
