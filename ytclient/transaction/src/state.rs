use std::sync::atomic::{AtomicU8, Ordering};

use strum::Display;

/// Lifecycle of a transaction session.
///
/// Transitions: `Active -> Committing -> Committed`, and `Active -> Closed` or
/// `Committing -> Closed` on abort or failure. `Committed` and `Closed` are
/// terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "snake_case")]
#[repr(u8)]
pub enum TransactionState {
    Active = 0,
    Committing = 1,
    Committed = 2,
    Closed = 3,
}

impl TransactionState {
    /// Heartbeats are sent only while the transaction may still commit.
    pub fn is_pingable(self) -> bool {
        matches!(self, Self::Active | Self::Committing)
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Committed | Self::Closed)
    }

    fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Active,
            1 => Self::Committing,
            2 => Self::Committed,
            _ => Self::Closed,
        }
    }
}

/// Atomic cell holding a [`TransactionState`].
#[derive(Debug)]
pub(crate) struct AtomicState(AtomicU8);

impl AtomicState {
    pub(crate) fn new(state: TransactionState) -> Self {
        Self(AtomicU8::new(state as u8))
    }

    pub(crate) fn load(&self) -> TransactionState {
        TransactionState::from_u8(self.0.load(Ordering::Acquire))
    }

    /// Moves from `expected` to `new`. On failure returns the state that was
    /// observed instead.
    pub(crate) fn compare_exchange(
        &self,
        expected: TransactionState,
        new: TransactionState,
    ) -> Result<(), TransactionState> {
        self.0
            .compare_exchange(expected as u8, new as u8, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| ())
            .map_err(TransactionState::from_u8)
    }

    /// Moves to `Closed` unless the state is already terminal. Returns the
    /// prior state.
    pub(crate) fn close(&self) -> TransactionState {
        let prior = self
            .0
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
                match TransactionState::from_u8(current) {
                    state if state.is_terminal() => None,
                    _ => Some(TransactionState::Closed as u8),
                }
            });
        match prior {
            Ok(value) | Err(value) => TransactionState::from_u8(value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compare_exchange() {
        let state = AtomicState::new(TransactionState::Active);
        assert!(
            state
                .compare_exchange(TransactionState::Active, TransactionState::Committing)
                .is_ok()
        );
        assert_eq!(
            state.compare_exchange(TransactionState::Active, TransactionState::Committing),
            Err(TransactionState::Committing)
        );
        assert_eq!(state.load(), TransactionState::Committing);
    }

    #[test]
    fn test_close_keeps_terminal_states() {
        let state = AtomicState::new(TransactionState::Committing);
        assert_eq!(state.close(), TransactionState::Committing);
        assert_eq!(state.load(), TransactionState::Closed);
        assert_eq!(state.close(), TransactionState::Closed);

        let state = AtomicState::new(TransactionState::Committed);
        assert_eq!(state.close(), TransactionState::Committed);
        assert_eq!(state.load(), TransactionState::Committed);
    }

    #[test]
    fn test_pingable_states() {
        assert!(TransactionState::Active.is_pingable());
        assert!(TransactionState::Committing.is_pingable());
        assert!(!TransactionState::Committed.is_pingable());
        assert!(!TransactionState::Closed.is_pingable());
        assert_eq!(TransactionState::Committing.to_string(), "committing");
    }
}
