//! In-memory [`RemoteSession`] for tests.
//!
//! [`MockRemoteSession`] records every call in order, answers requests with
//! plausible default responses and lets tests inject failures or hold row
//! mutations in flight until released.

use std::collections::VecDeque;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::watch;
use ytclient_common::{Guid, RpcError, RpcResult, Timestamp};

use crate::RemoteSession;
use crate::request::{Operation, StartTransaction, TransactionalRequest};
use crate::response::{
    CheckPermissionResult, LockNodeResult, Response, Rowset, SecurityAction, StartedTransaction,
};

/// A call observed by [`MockRemoteSession`].
#[derive(Debug, Clone, PartialEq)]
pub enum RemoteCall {
    Start(StartTransaction),
    Ping(Guid),
    Commit(Guid),
    Abort(Guid),
    Execute(TransactionalRequest),
    /// A `modify_rows` request finished applying.
    MutationApplied { id: Guid, path: String },
}

pub struct MockRemoteSession {
    started: StartedTransaction,
    address: Option<String>,
    calls: Mutex<Vec<RemoteCall>>,
    ping_failures: Mutex<VecDeque<RpcError>>,
    commit_failure: Mutex<Option<RpcError>>,
    abort_failure: Mutex<Option<RpcError>>,
    mutation_failure: Mutex<Option<RpcError>>,
    responses: Mutex<VecDeque<Response>>,
    mutation_gate: watch::Sender<bool>,
    ping_gate: watch::Sender<bool>,
}

impl MockRemoteSession {
    pub const TRANSACTION_ID: Guid = Guid::new(0x1, 0x2, 0x3, 0x4);
    pub const START_TIMESTAMP: Timestamp = Timestamp::from_unix_seconds(1_700_000_000, 1);

    pub fn new() -> Self {
        let (mutation_gate, _) = watch::channel(true);
        let (ping_gate, _) = watch::channel(true);
        Self {
            started: StartedTransaction {
                id: Self::TRANSACTION_ID,
                start_timestamp: Self::START_TIMESTAMP,
            },
            address: None,
            calls: Mutex::new(Vec::new()),
            ping_failures: Mutex::new(VecDeque::new()),
            commit_failure: Mutex::new(None),
            abort_failure: Mutex::new(None),
            mutation_failure: Mutex::new(None),
            responses: Mutex::new(VecDeque::new()),
            mutation_gate,
            ping_gate,
        }
    }

    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }

    pub fn calls(&self) -> Vec<RemoteCall> {
        self.calls.lock().clone()
    }

    pub fn ping_count(&self) -> usize {
        self.count(|call| matches!(call, RemoteCall::Ping(_)))
    }

    pub fn commit_count(&self) -> usize {
        self.count(|call| matches!(call, RemoteCall::Commit(_)))
    }

    pub fn abort_count(&self) -> usize {
        self.count(|call| matches!(call, RemoteCall::Abort(_)))
    }

    /// Requests passed to [`RemoteSession::execute`], in call order.
    pub fn executed(&self) -> Vec<TransactionalRequest> {
        self.calls
            .lock()
            .iter()
            .filter_map(|call| match call {
                RemoteCall::Execute(request) => Some(request.clone()),
                _ => None,
            })
            .collect()
    }

    /// The next ping fails with `error`. Failures queue up.
    pub fn fail_next_ping(&self, error: RpcError) {
        self.ping_failures.lock().push_back(error);
    }

    pub fn fail_commit(&self, error: RpcError) {
        *self.commit_failure.lock() = Some(error);
    }

    pub fn fail_abort(&self, error: RpcError) {
        *self.abort_failure.lock() = Some(error);
    }

    /// Every subsequent row mutation fails with `error`.
    pub fn fail_mutations(&self, error: RpcError) {
        *self.mutation_failure.lock() = Some(error);
    }

    /// Answers the next non-mutation request with `response`.
    pub fn push_response(&self, response: Response) {
        self.responses.lock().push_back(response);
    }

    /// Keeps row mutations in flight until [`release_mutations`](Self::release_mutations).
    pub fn hold_mutations(&self) {
        self.mutation_gate.send_replace(false);
    }

    pub fn release_mutations(&self) {
        self.mutation_gate.send_replace(true);
    }

    /// Keeps pings in flight until [`release_pings`](Self::release_pings).
    /// A held ping is recorded when it is sent.
    pub fn hold_pings(&self) {
        self.ping_gate.send_replace(false);
    }

    pub fn release_pings(&self) {
        self.ping_gate.send_replace(true);
    }

    fn record(&self, call: RemoteCall) {
        self.calls.lock().push(call);
    }

    fn count(&self, predicate: impl Fn(&RemoteCall) -> bool) -> usize {
        self.calls.lock().iter().filter(|call| predicate(call)).count()
    }

    async fn apply_mutation(&self, id: Guid, path: String) -> RpcResult<Response> {
        let mut gate = self.mutation_gate.subscribe();
        if gate.wait_for(|open| *open).await.is_err() {
            return Err(RpcError::canceled("mock remote session was dropped"));
        }
        if let Some(error) = self.mutation_failure.lock().clone() {
            return Err(error);
        }
        self.record(RemoteCall::MutationApplied { id, path });
        Ok(Response::Unit)
    }
}

impl Default for MockRemoteSession {
    fn default() -> Self {
        Self::new()
    }
}

/// The response a real cluster would send for a successful `operation`.
pub fn default_response(operation: &Operation) -> Response {
    match operation {
        Operation::LookupRows(_)
        | Operation::VersionedLookupRows(_)
        | Operation::SelectRows(_)
        | Operation::ReadTable(_) => Response::Rowset(Rowset::default()),
        Operation::CreateNode(_)
        | Operation::CopyNode(_)
        | Operation::MoveNode(_)
        | Operation::LinkNode(_)
        | Operation::StartOperation(_) => Response::Id(Guid::new(0, 0, 0, 1)),
        Operation::ExistsNode(_) => Response::Bool(true),
        Operation::GetNode(_) | Operation::ListNode(_) => Response::Node(Value::Null),
        Operation::LockNode(_) => Response::Lock(LockNodeResult {
            lock_id: Guid::new(0, 0, 0, 2),
            node_id: Guid::new(0, 0, 0, 3),
        }),
        Operation::CheckPermission(_) => Response::Permission(CheckPermissionResult {
            action: SecurityAction::Allow,
            object_id: None,
            subject_id: None,
        }),
        Operation::GetFileFromCache(_) => Response::CachedPath(None),
        Operation::PutFileToCache(request) => {
            Response::CachedPath(Some(format!("{}/{}", request.cache_path, request.md5)))
        }
        Operation::ReadFile(_) => Response::Bytes(Vec::new()),
        Operation::ModifyRows(_)
        | Operation::RemoveNode(_)
        | Operation::SetNode(_)
        | Operation::ConcatenateNodes(_)
        | Operation::WriteTable(_)
        | Operation::WriteFile(_) => Response::Unit,
    }
}

#[async_trait]
impl RemoteSession for MockRemoteSession {
    async fn start_transaction(&self, request: StartTransaction) -> RpcResult<StartedTransaction> {
        self.record(RemoteCall::Start(request));
        Ok(self.started)
    }

    async fn ping_transaction(&self, id: Guid) -> RpcResult<()> {
        self.record(RemoteCall::Ping(id));
        let mut gate = self.ping_gate.subscribe();
        if gate.wait_for(|open| *open).await.is_err() {
            return Err(RpcError::canceled("mock remote session was dropped"));
        }
        match self.ping_failures.lock().pop_front() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    async fn commit_transaction(&self, id: Guid) -> RpcResult<()> {
        self.record(RemoteCall::Commit(id));
        match self.commit_failure.lock().clone() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    async fn abort_transaction(&self, id: Guid) -> RpcResult<()> {
        self.record(RemoteCall::Abort(id));
        match self.abort_failure.lock().clone() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    async fn execute(&self, request: TransactionalRequest) -> RpcResult<Response> {
        self.record(RemoteCall::Execute(request.clone()));
        if let Operation::ModifyRows(modify) = request.operation {
            return self
                .apply_mutation(request.options.transaction_id, modify.path)
                .await;
        }
        let queued = self.responses.lock().pop_front();
        Ok(queued.unwrap_or_else(|| default_response(&request.operation)))
    }

    fn address(&self) -> Option<String> {
        self.address.clone()
    }
}
