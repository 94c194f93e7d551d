//! rigbridge-rigctld: a Hamlib `rigctld`-compatible TCP front end.
//!
//! Logging programs that speak the rigctld network protocol (WSJT-X,
//! fldigi, N1MM+ via Hamlib) can drive any [`Rig`](rigbridge_core::Rig)
//! through a [`RigctldServer`]. Each connection has its own response mode;
//! every connection shares the same rig, so requests from all clients are
//! serialized by whatever sits behind the `Rig` (normally a coordinator).
//!
//! # Modules
//!
//! - [`command`] -- line parsing, short and long command forms
//! - [`response`] -- Default and Extended rendering, RPRT codes
//! - [`session`] -- per-connection state and command dispatch
//! - [`server`] -- TCP listener

pub mod command;
pub mod response;
pub mod server;
pub mod session;

pub use command::{Command, CommandError, Level};
pub use response::{ResponseMode, rprt_code};
pub use server::{RigctldServer, ServerConfig, ServerError, DEFAULT_PORT};
pub use session::Session;
