use miette::Diagnostic;
use thiserror::Error;
use ytclient_common::{Guid, RpcError};

use crate::state::TransactionState;

#[derive(Debug, Error, Diagnostic)]
pub enum TransactionError {
    /// A commit or strict abort was requested from the wrong state.
    #[error(
        "failed to set transaction {id} into '{target}' state; expected state: '{expected}'; current state: '{actual}'"
    )]
    WrongState {
        id: Guid,
        expected: TransactionState,
        target: TransactionState,
        actual: TransactionState,
    },

    #[error("transaction {id} is {state} and accepts no new operations")]
    NotActive { id: Guid, state: TransactionState },

    #[error("cannot commit transaction {id} since modify rows failed")]
    MutationFailed {
        id: Guid,
        #[source]
        source: RpcError,
    },

    #[error("unexpected {response} response to {operation}")]
    UnexpectedResponse {
        operation: &'static str,
        response: &'static str,
    },

    #[error("{action} of transaction {id} was canceled before it finished")]
    Canceled { id: Guid, action: &'static str },

    #[error(transparent)]
    Rpc(#[from] RpcError),
}

impl TransactionError {
    /// Returns true for errors caused by misuse of the session rather than
    /// by the cluster.
    pub fn is_usage_error(&self) -> bool {
        matches!(self, Self::WrongState { .. } | Self::NotActive { .. })
    }
}

pub type TransactionResult<T> = std::result::Result<T, TransactionError>;
