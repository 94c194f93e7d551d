//! # rigbridge -- transceiver control behind a rigctld-compatible server
//!
//! `rigbridge` drives Icom (CI-V), Kenwood, Elecraft and Yaesu (text CAT)
//! transceivers over a serial port and exposes them to logging software
//! through the Hamlib `rigctld` network protocol.
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use rigbridge::{find_model, CoordinatorBuilder, Rig, Vfo};
//! use rigbridge::rigctld::{RigctldServer, ServerConfig};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let engine = find_model("IC-7300")?.engine(None)?;
//! let rig = CoordinatorBuilder::new(engine)
//!     .serial_port("/dev/ttyUSB0")
//!     .build()
//!     .await?;
//! println!("VFO: {} Hz", rig.get_frequency(Vfo::Current).await?);
//!
//! let server = RigctldServer::bind(ServerConfig::default(), Arc::new(rig)).await?;
//! server.run(CancellationToken::new()).await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! | Crate                   | Purpose                                          |
//! |-------------------------|--------------------------------------------------|
//! | `rigbridge-core`        | Types, [`Operation`]/[`Reply`], [`Rig`], errors  |
//! | `rigbridge-transport`   | Serial transport                                 |
//! | `rigbridge-civ`         | Icom CI-V protocol engine                        |
//! | `rigbridge-cat`         | Kenwood / Elecraft / Yaesu text CAT engine       |
//! | `rigbridge-coordinator` | FIFO worker, read cache, validation              |
//! | `rigbridge-rigctld`     | rigctld TCP server                               |
//! | **`rigbridge`**         | This facade crate plus the model registry        |
//!
//! ## Feature Flags
//!
//! | Feature | Enables                              | Default |
//! |---------|--------------------------------------|---------|
//! | `civ`   | [`civ`] module and Icom models       | yes     |
//! | `cat`   | [`cat`] module and text CAT models   | yes     |

pub mod registry;

pub use rigbridge_core::*;
pub use rigbridge_coordinator::{Coordinator, CoordinatorBuilder, DEFAULT_CACHE_TTL};
pub use registry::{find_model, list_models, ModelEntry};

/// Icom CI-V protocol engine and models.
#[cfg(feature = "civ")]
pub mod civ {
    pub use rigbridge_civ::*;
}

/// Text CAT protocol engine, dialects and models.
#[cfg(feature = "cat")]
pub mod cat {
    pub use rigbridge_cat::*;
}

/// Serial transport.
pub mod transport {
    pub use rigbridge_transport::*;
}

/// rigctld-compatible TCP server.
pub mod rigctld {
    pub use rigbridge_rigctld::*;
}
