use async_trait::async_trait;
use ytclient_common::{Guid, RpcResult};

use crate::request::{StartTransaction, TransactionalRequest};
use crate::response::{Response, StartedTransaction};

/// Connection to the cluster as seen by a transaction.
///
/// Implementations own transport concerns: serialization, per-call retries
/// and endpoint selection. When a request's options are sticky it must be
/// routed to the endpoint that started the transaction.
#[async_trait]
pub trait RemoteSession: Send + Sync {
    /// Starts a new transaction and returns its identity.
    async fn start_transaction(&self, request: StartTransaction) -> RpcResult<StartedTransaction>;

    /// Extends the transaction lease.
    ///
    /// Fails with [`ErrorCode::NO_SUCH_TRANSACTION`](ytclient_common::ErrorCode::NO_SUCH_TRANSACTION)
    /// once the server has forgotten the transaction.
    async fn ping_transaction(&self, id: Guid) -> RpcResult<()>;

    async fn commit_transaction(&self, id: Guid) -> RpcResult<()>;

    async fn abort_transaction(&self, id: Guid) -> RpcResult<()>;

    /// Issues a data, metadata or operation request bound to a transaction.
    async fn execute(&self, request: TransactionalRequest) -> RpcResult<Response>;

    /// Address of the endpoint this session is pinned to, if any.
    fn address(&self) -> Option<String> {
        None
    }
}
