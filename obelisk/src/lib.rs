#![deny(missing_docs)]

//! Obelisk client - complete crate.
//!
//! Re-exports the Obelisk client components for single-crate usage.

pub use obelisk_client as client;
pub use obelisk_primitives as primitives;
pub use obelisk_protocol as protocol;

pub use obelisk_client::{ClientConfig, ClientError, ObeliskClient};
