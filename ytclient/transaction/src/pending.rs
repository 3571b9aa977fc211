use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use parking_lot::Mutex;
use ytclient_common::RpcResult;

/// Completion of a row mutation issued under a transaction.
///
/// Clones observe the same outcome. The mutation is in flight whether or not
/// the handle is polled.
#[derive(Clone)]
pub struct MutationHandle {
    inner: Shared<BoxFuture<'static, RpcResult<()>>>,
}

impl MutationHandle {
    pub(crate) fn new(future: BoxFuture<'static, RpcResult<()>>) -> Self {
        Self {
            inner: future.shared(),
        }
    }

    /// Returns the outcome if the mutation already finished.
    pub fn peek(&self) -> Option<&RpcResult<()>> {
        self.inner.peek()
    }
}

impl Future for MutationHandle {
    type Output = RpcResult<()>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.inner.poll_unpin(cx)
    }
}

impl std::fmt::Debug for MutationHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MutationHandle")
            .field("finished", &self.peek().is_some())
            .finish()
    }
}

/// Row mutations that commit has to wait for.
#[derive(Debug, Default)]
pub(crate) struct PendingMutations {
    handles: Mutex<Vec<MutationHandle>>,
}

impl PendingMutations {
    pub(crate) fn push(&self, handle: MutationHandle) {
        self.handles.lock().push(handle);
    }

    /// Takes every handle registered so far, leaving the set empty.
    pub(crate) fn drain(&self) -> Vec<MutationHandle> {
        std::mem::take(&mut *self.handles.lock())
    }

    pub(crate) fn len(&self) -> usize {
        self.handles.lock().len()
    }
}
