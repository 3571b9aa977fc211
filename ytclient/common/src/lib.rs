//! Common types shared by the client crates.
//!
//! This crate provides object identifiers, cluster timestamps and the RPC
//! error model that the transport reports to the transaction layer.

pub mod error;
pub mod guid;
pub mod timestamp;

pub use error::{ErrorCode, RpcError, RpcResult};
pub use guid::{Guid, GuidParseError};
pub use timestamp::Timestamp;
