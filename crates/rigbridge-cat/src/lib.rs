//! rigbridge-cat: text CAT engine for Kenwood, Elecraft and Yaesu rigs.
//!
//! All three vendors speak the same grammar (`MN<value>;`) and acknowledge
//! a set by echoing it back. They differ in a handful of mnemonics and the
//! meaning of some mode codes, captured in a [`Dialect`] table per vendor.
//!
//! # Example
//!
//! ```
//! use rigbridge_cat::{models, CatEngine};
//! use rigbridge_core::ProtocolEngine;
//!
//! let engine = CatEngine::new(models::k3());
//! assert_eq!(engine.dialect().ptt_on, "TX");
//! assert_eq!(engine.default_baud_rate(), 38_400);
//! ```

pub mod dialect;
pub mod engine;
pub mod models;
pub mod protocol;

pub use dialect::{Dialect, ELECRAFT, KENWOOD, YAESU};
pub use engine::CatEngine;
pub use models::CatModel;
