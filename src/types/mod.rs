//! Type definitions for nessie-wallet

mod bank;
mod error;
mod snapshot;

pub use bank::*;
pub use error::*;
pub use snapshot::*;
