use futures::FutureExt;
use futures::channel::oneshot;
use futures::future::{BoxFuture, Shared};
use parking_lot::Mutex;

/// Fires once when the transaction reaches a terminal remote outcome.
///
/// Any number of waiters may observe the signal; repeated completion
/// attempts are ignored.
pub(crate) struct CompletionSignal {
    sender: Mutex<Option<oneshot::Sender<()>>>,
    receiver: Shared<oneshot::Receiver<()>>,
}

impl CompletionSignal {
    pub(crate) fn new() -> Self {
        let (sender, receiver) = oneshot::channel();
        Self {
            sender: Mutex::new(Some(sender)),
            receiver: receiver.shared(),
        }
    }

    /// Returns true if this call fired the signal.
    pub(crate) fn complete(&self) -> bool {
        match self.sender.lock().take() {
            Some(sender) => {
                let _ = sender.send(());
                true
            }
            None => false,
        }
    }

    pub(crate) fn is_complete(&self) -> bool {
        self.sender.lock().is_none()
    }

    pub(crate) fn wait(&self) -> BoxFuture<'static, ()> {
        let receiver = self.receiver.clone();
        async move {
            let _ = receiver.await;
        }
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_completes_once() {
        let signal = CompletionSignal::new();
        assert!(!signal.is_complete());
        assert!(signal.complete());
        assert!(!signal.complete());
        assert!(signal.is_complete());
    }

    #[test]
    fn test_all_waiters_observe_completion() {
        let signal = CompletionSignal::new();
        let first = signal.wait();
        let second = signal.wait();
        assert!(first.now_or_never().is_none());
        signal.complete();
        assert!(second.now_or_never().is_some());
        assert!(signal.wait().now_or_never().is_some());
    }
}
