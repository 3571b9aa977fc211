//! Transport-facing interfaces used by the transaction layer.
//!
//! The actual RPC client lives outside this workspace; this crate defines
//! what the transaction layer needs from it ([`RemoteSession`]), the typed
//! request/response model it exchanges, and the [`Scheduler`] used to run
//! deferred work such as heartbeats.
//!
//! # Feature Flags
//!
//! - **`testutil`**: enables the `testutil` module with an in-memory
//!   [`RemoteSession`] that records calls and injects failures.

pub mod remote;
pub mod request;
pub mod response;
pub mod scheduler;
#[cfg(any(test, feature = "testutil"))]
pub mod testutil;

pub use remote::RemoteSession;
pub use request::{Operation, StartTransaction, TransactionalOptions, TransactionalRequest};
pub use response::{Response, StartedTransaction};
pub use scheduler::{Scheduler, Task, TokioScheduler};
