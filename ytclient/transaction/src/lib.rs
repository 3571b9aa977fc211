//! Client-side transaction sessions.
//!
//! A [`TransactionSession`] represents a transaction opened on a remote
//! cluster. It keeps the transaction alive with heartbeats, forwards every
//! operation with the transaction attached, and coordinates commit and abort
//! so that the remote transaction is finished exactly once.
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use ytclient_rpc::request::{ModifyRows, Row};
//! use ytclient_rpc::{RemoteSession, TokioScheduler};
//! use ytclient_transaction::{TransactionConfig, TransactionSession};
//!
//! # async fn example(remote: Arc<dyn RemoteSession>) -> Result<(), Box<dyn std::error::Error>> {
//! let scheduler = Arc::new(TokioScheduler::current());
//! let txn = TransactionSession::start(remote, scheduler, &TransactionConfig::default()).await?;
//!
//! txn.modify_rows(ModifyRows::new("//home/dyntable").add_write(Row::new()))?;
//! txn.commit()?.await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
mod ops;
pub mod pending;
pub mod session;
mod signal;
pub mod state;

pub use config::TransactionConfig;
pub use error::{TransactionError, TransactionResult};
pub use pending::MutationHandle;
pub use session::{PingFailureObserver, TransactionSession};
pub use state::TransactionState;
