//! Client-side handle of a remote transaction.
//!
//! A [`TransactionSession`] keeps its transaction alive with heartbeats,
//! remembers every row mutation issued through it and drives commit or
//! abort so that the remote transaction is finished exactly once.
//!
//! # Heartbeats
//!
//! Heartbeats are cooperative: each tick schedules the next one on the
//! shared [`Scheduler`] instead of occupying a thread. The loop ends when the
//! session leaves `Active`/`Committing`, when [`TransactionSession::stop_ping`]
//! is called, or when the server reports that the transaction is gone.
//!
//! # Commit
//!
//! [`TransactionSession::commit`] switches to `Committing` and drains the
//! pending mutations in one step. Mutations issued after that point are not
//! waited for, so callers must not race new row writes against commit.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use futures::FutureExt;
use futures::channel::oneshot;
use futures::future::{self, BoxFuture};
use tracing::{debug, info, warn};
use ytclient_common::{ErrorCode, Guid, RpcError, RpcResult, Timestamp};
use ytclient_rpc::{
    Operation, RemoteSession, Scheduler, StartTransaction, TransactionalOptions,
    TransactionalRequest,
};

use crate::config::TransactionConfig;
use crate::error::{TransactionError, TransactionResult};
use crate::pending::{MutationHandle, PendingMutations};
use crate::signal::CompletionSignal;
use crate::state::{AtomicState, TransactionState};

/// Callback invoked with every heartbeat failure.
pub type PingFailureObserver = Arc<dyn Fn(&RpcError) + Send + Sync>;

/// A transaction opened on the cluster.
///
/// Dropping the session aborts the transaction unless it was already
/// committed or aborted.
pub struct TransactionSession {
    pub(crate) inner: Arc<SessionInner>,
}

pub(crate) struct SessionInner {
    pub(crate) id: Guid,
    pub(crate) start_timestamp: Timestamp,
    pub(crate) options: TransactionalOptions,
    ping_period: Duration,
    failed_ping_retry_period: Duration,
    pub(crate) remote: Arc<dyn RemoteSession>,
    pub(crate) scheduler: Arc<dyn Scheduler>,
    state: AtomicState,
    forced_ping_stop: AtomicBool,
    pub(crate) pending: PendingMutations,
    completion: CompletionSignal,
    on_ping_failed: Option<PingFailureObserver>,
}

impl TransactionSession {
    /// Wraps a transaction that was already started on the cluster and
    /// schedules its first heartbeat.
    pub fn new(
        id: Guid,
        start_timestamp: Timestamp,
        config: &TransactionConfig,
        remote: Arc<dyn RemoteSession>,
        scheduler: Arc<dyn Scheduler>,
    ) -> Self {
        Self::build(id, start_timestamp, config, remote, scheduler, None)
    }

    /// Like [`new`](Self::new), reporting heartbeat failures to `observer`.
    pub fn with_ping_failure_observer(
        id: Guid,
        start_timestamp: Timestamp,
        config: &TransactionConfig,
        remote: Arc<dyn RemoteSession>,
        scheduler: Arc<dyn Scheduler>,
        observer: PingFailureObserver,
    ) -> Self {
        Self::build(id, start_timestamp, config, remote, scheduler, Some(observer))
    }

    /// Starts a new transaction on the cluster.
    pub async fn start(
        remote: Arc<dyn RemoteSession>,
        scheduler: Arc<dyn Scheduler>,
        config: &TransactionConfig,
    ) -> TransactionResult<Self> {
        let request = StartTransaction {
            ping: config.ping,
            ping_ancestors: config.ping_ancestors,
            sticky: config.sticky,
            timeout: config.timeout,
        };
        let started = remote.start_transaction(request).await?;
        info!(
            transaction_id = %started.id,
            start_timestamp = %started.start_timestamp,
            "transaction started"
        );
        Ok(Self::new(
            started.id,
            started.start_timestamp,
            config,
            remote,
            scheduler,
        ))
    }

    fn build(
        id: Guid,
        start_timestamp: Timestamp,
        config: &TransactionConfig,
        remote: Arc<dyn RemoteSession>,
        scheduler: Arc<dyn Scheduler>,
        on_ping_failed: Option<PingFailureObserver>,
    ) -> Self {
        let options = TransactionalOptions::new(id, config.sticky)
            .with_ping(config.ping)
            .with_ping_ancestors(config.ping_ancestors);
        let inner = Arc::new(SessionInner {
            id,
            start_timestamp,
            options,
            ping_period: config.ping_period,
            failed_ping_retry_period: config.effective_failed_ping_retry_period(),
            remote,
            scheduler,
            state: AtomicState::new(TransactionState::Active),
            forced_ping_stop: AtomicBool::new(false),
            pending: PendingMutations::default(),
            completion: CompletionSignal::new(),
            on_ping_failed,
        });
        if config.heartbeat_enabled() {
            inner.schedule_ping(inner.ping_period);
        }
        Self { inner }
    }

    pub fn id(&self) -> Guid {
        self.inner.id
    }

    pub fn start_timestamp(&self) -> Timestamp {
        self.inner.start_timestamp
    }

    pub fn state(&self) -> TransactionState {
        self.inner.state.load()
    }

    pub fn is_active(&self) -> bool {
        self.state() == TransactionState::Active
    }

    pub fn is_ping(&self) -> bool {
        self.inner.options.ping
    }

    pub fn is_sticky(&self) -> bool {
        self.inner.options.sticky
    }

    /// Options attached to every request of this transaction.
    pub fn transactional_options(&self) -> &TransactionalOptions {
        &self.inner.options
    }

    /// Address of the proxy serving this transaction, if the remote reports one.
    pub fn rpc_proxy_address(&self) -> Option<String> {
        self.inner.remote.address()
    }

    /// Number of row mutations that the next commit would wait for.
    pub fn pending_mutation_count(&self) -> usize {
        self.inner.pending.len()
    }

    /// Resolves once the transaction is committed or aborted on the cluster.
    pub fn completion(&self) -> BoxFuture<'static, ()> {
        self.inner.completion.wait()
    }

    pub fn is_complete(&self) -> bool {
        self.inner.completion.is_complete()
    }

    /// Sends a single heartbeat.
    pub async fn ping(&self) -> RpcResult<()> {
        self.inner.remote.ping_transaction(self.inner.id).await
    }

    /// Stops the heartbeat loop for good. A heartbeat already in flight still
    /// completes.
    pub fn stop_ping(&self) {
        self.inner.forced_ping_stop.store(true, Ordering::Release);
    }

    /// Commits the transaction once every pending row mutation has landed.
    ///
    /// The state check happens immediately; the returned future resolves with
    /// the outcome. The commit proceeds even if that future is dropped.
    ///
    /// If any pending mutation fails, the transaction is aborted and the
    /// mutation error is returned. If the remote commit fails, the session is
    /// closed.
    pub fn commit(&self) -> TransactionResult<BoxFuture<'static, TransactionResult<()>>> {
        let inner = &self.inner;
        inner.transition(TransactionState::Active, TransactionState::Committing)?;
        let batch = inner.pending.drain();
        debug!(
            transaction_id = %inner.id,
            pending_mutations = batch.len(),
            "committing transaction"
        );

        let (sender, receiver) = oneshot::channel();
        let this = Arc::clone(inner);
        inner.scheduler.spawn(
            async move {
                let _ = sender.send(this.finish_commit(batch).await);
            }
            .boxed(),
        );

        let id = inner.id;
        Ok(async move {
            receiver.await.unwrap_or_else(|_| {
                Err(TransactionError::Canceled {
                    id,
                    action: "commit",
                })
            })
        }
        .boxed())
    }

    /// Aborts an active transaction.
    ///
    /// Fails immediately unless the session is `Active`. The remote abort is
    /// already under way when this returns; awaiting the future only reports
    /// its outcome.
    pub fn abort(&self) -> TransactionResult<BoxFuture<'static, RpcResult<()>>> {
        let inner = &self.inner;
        inner.transition(TransactionState::Active, TransactionState::Closed)?;
        debug!(transaction_id = %inner.id, "aborting transaction");

        let (sender, receiver) = oneshot::channel();
        inner.spawn_abort(Some(sender));
        let id = inner.id;
        Ok(async move {
            receiver.await.unwrap_or_else(|_| {
                Err(RpcError::canceled(format!(
                    "abort of transaction {id} was dropped"
                )))
            })
        }
        .boxed())
    }

    /// Aborts the transaction unless it was committed or aborted before.
    ///
    /// Never fails; errors of the remote abort are ignored.
    pub fn close(&self) {
        self.inner.close();
    }

    pub(crate) fn ensure_usable(&self) -> TransactionResult<()> {
        let state = self.state();
        if state.is_terminal() {
            return Err(TransactionError::NotActive {
                id: self.inner.id,
                state,
            });
        }
        Ok(())
    }

    pub(crate) fn request(
        &self,
        timestamp: Option<Timestamp>,
        operation: Operation,
    ) -> TransactionalRequest {
        TransactionalRequest {
            options: self.inner.options.clone(),
            timestamp,
            operation,
        }
    }

    /// Issues a row mutation and registers it for the next commit.
    pub(crate) fn track_mutation(&self, request: TransactionalRequest) -> MutationHandle {
        let inner = &self.inner;
        let (sender, receiver) = oneshot::channel();
        let id = inner.id;
        let handle = MutationHandle::new(
            async move {
                receiver.await.unwrap_or_else(|_| {
                    Err(RpcError::canceled(format!(
                        "row mutation of transaction {id} was dropped"
                    )))
                })
            }
            .boxed(),
        );
        inner.pending.push(handle.clone());

        let remote = Arc::clone(&inner.remote);
        inner.scheduler.spawn(
            async move {
                let result = remote.execute(request).await.map(|_| ());
                let _ = sender.send(result);
            }
            .boxed(),
        );
        handle
    }
}

impl SessionInner {
    fn transition(
        &self,
        expected: TransactionState,
        target: TransactionState,
    ) -> TransactionResult<()> {
        self.state
            .compare_exchange(expected, target)
            .map_err(|actual| TransactionError::WrongState {
                id: self.id,
                expected,
                target,
                actual,
            })
    }

    fn is_pingable(&self) -> bool {
        self.state.load().is_pingable() && !self.forced_ping_stop.load(Ordering::Acquire)
    }

    fn schedule_ping(self: &Arc<Self>, delay: Duration) {
        let this = Arc::clone(self);
        self.scheduler
            .schedule_after(delay, this.run_periodic_ping().boxed());
    }

    async fn run_periodic_ping(self: Arc<Self>) {
        if !self.is_pingable() {
            return;
        }

        let next_delay = match self.remote.ping_transaction(self.id).await {
            Ok(()) => {
                debug!(transaction_id = %self.id, "transaction pinged");
                self.ping_period
            }
            Err(error) => {
                warn!(transaction_id = %self.id, %error, "failed to ping transaction");
                if let Some(observer) = &self.on_ping_failed {
                    observer(&error);
                }
                if error.matches(ErrorCode::NO_SUCH_TRANSACTION) {
                    debug!(transaction_id = %self.id, "transaction is gone, heartbeats stopped");
                    return;
                }
                self.failed_ping_retry_period
            }
        };

        // A commit or abort may have finished while the heartbeat was in flight.
        if !self.is_pingable() {
            return;
        }
        self.schedule_ping(next_delay);
    }

    async fn finish_commit(self: Arc<Self>, batch: Vec<MutationHandle>) -> TransactionResult<()> {
        let outcomes = future::join_all(batch).await;
        if let Some(error) = outcomes.into_iter().find_map(Result::err) {
            warn!(
                transaction_id = %self.id,
                %error,
                "cannot commit transaction since modify rows failed"
            );
            self.close();
            return Err(TransactionError::MutationFailed {
                id: self.id,
                source: error,
            });
        }

        // Closed while the mutations were landing; the abort is already on its way.
        let state = self.state.load();
        if state != TransactionState::Committing {
            return Err(TransactionError::WrongState {
                id: self.id,
                expected: TransactionState::Committing,
                target: TransactionState::Committed,
                actual: state,
            });
        }

        let outcome = match self.remote.commit_transaction(self.id).await {
            Ok(()) => self
                .transition(TransactionState::Committing, TransactionState::Committed)
                .inspect(|_| info!(transaction_id = %self.id, "transaction committed")),
            Err(error) => {
                warn!(transaction_id = %self.id, %error, "failed to commit transaction");
                self.state.close();
                Err(error.into())
            }
        };
        self.completion.complete();
        outcome
    }

    /// Non-strict abort: closes from `Active` or `Committing`, no-op otherwise.
    /// Returns true if a remote abort was issued.
    fn close(self: &Arc<Self>) -> bool {
        let prior = self.state.close();
        if prior.is_terminal() {
            return false;
        }
        debug!(transaction_id = %self.id, %prior, "closing transaction");
        self.spawn_abort(None);
        true
    }

    /// Sends the remote abort without waiting for it. The completion signal
    /// fires once the call settles, whatever its outcome.
    fn spawn_abort(self: &Arc<Self>, reply: Option<oneshot::Sender<RpcResult<()>>>) {
        let this = Arc::clone(self);
        self.scheduler.spawn(
            async move {
                let result = this.remote.abort_transaction(this.id).await;
                match &result {
                    Ok(()) => info!(transaction_id = %this.id, "transaction aborted"),
                    Err(error) => {
                        warn!(transaction_id = %this.id, %error, "failed to abort transaction")
                    }
                }
                this.completion.complete();
                if let Some(reply) = reply {
                    let _ = reply.send(result);
                }
            }
            .boxed(),
        );
    }
}

impl Drop for TransactionSession {
    fn drop(&mut self) {
        self.inner.close();
    }
}

impl fmt::Display for TransactionSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Transaction@{}", self.inner.id)
    }
}

impl fmt::Debug for TransactionSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransactionSession")
            .field("id", &self.inner.id)
            .field("start_timestamp", &self.inner.start_timestamp)
            .field("state", &self.state())
            .field("sticky", &self.inner.options.sticky)
            .field("pending_mutations", &self.inner.pending.len())
            .finish()
    }
}
