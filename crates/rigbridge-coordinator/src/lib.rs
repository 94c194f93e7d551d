//! rigbridge-coordinator: one owner for one serial link.
//!
//! A [`Coordinator`] is the only path to a rig. It validates each
//! operation against the rig's capabilities, answers fresh reads from a
//! short-lived cache, and hands everything else to a single worker task
//! that performs the round trips strictly first-in, first-out.
//!
//! # Modules
//!
//! - [`builder`] -- [`CoordinatorBuilder`]
//! - [`cache`] -- TTL read cache with per-write invalidation
//! - [`validate`] -- capability checks
//! - [`coordinator`] -- the cloneable [`Coordinator`] handle

pub mod builder;
pub mod cache;
pub mod coordinator;
pub mod validate;
mod worker;

pub use builder::CoordinatorBuilder;
pub use cache::DEFAULT_CACHE_TTL;
pub use coordinator::Coordinator;
