//! # Contracts
//!
//! Frozen interface contracts, defining inter-module data structures and traits.
//! All business crates can only depend on this crate, reverse dependencies are prohibited.
//!
//! ## Write model
//! - A `Record` is opaque to the dispatcher; only its identity is threaded through
//! - A `WriteRequest` is a keyed, multi-cell write addressed to one destination
//! - A `WriteClient` performs one bulk write per destination

mod blueprint;
mod builder;
mod client;
mod error;
mod record;
mod request;

pub use blueprint::*;
pub use builder::RequestBuilder;
pub use client::{LocalWriteClient, WriteClient};
pub use error::*;
pub use record::{FlowRecord, Record};
pub use request::{Cell, MissingField, WriteRequest};
