//! Operations issued under a transaction.
//!
//! Every request is bound to the session's transaction through its
//! [`TransactionalOptions`](ytclient_rpc::TransactionalOptions); dynamic
//! table reads are additionally pinned to the transaction's start timestamp.

use ytclient_common::{Guid, Timestamp};
use ytclient_rpc::Operation;
use ytclient_rpc::request::{
    CheckPermission, ConcatenateNodes, CopyNode, CreateNode, ExistsNode, GetFileFromCache,
    GetNode, LinkNode, ListNode, LockNode, LookupRows, ModifyRows, MoveNode, PutFileToCache,
    ReadFile, ReadTable, RemoveNode, SelectRows, SetNode, StartOperation, WriteFile, WriteTable,
};
use ytclient_rpc::response::{CheckPermissionResult, LockNodeResult, Response, Rowset};

use crate::error::{TransactionError, TransactionResult};
use crate::pending::MutationHandle;
use crate::session::TransactionSession;

/// Unpacks the variant an operation expects.
macro_rules! expect_response {
    ($response:expr, $operation:literal, Unit) => {
        match $response {
            Response::Unit => Ok(()),
            other => Err(TransactionError::UnexpectedResponse {
                operation: $operation,
                response: other.kind(),
            }),
        }
    };
    ($response:expr, $operation:literal, $variant:ident) => {
        match $response {
            Response::$variant(value) => Ok(value),
            other => Err(TransactionError::UnexpectedResponse {
                operation: $operation,
                response: other.kind(),
            }),
        }
    };
}

impl TransactionSession {
    async fn execute(
        &self,
        timestamp: Option<Timestamp>,
        operation: Operation,
    ) -> TransactionResult<Response> {
        self.ensure_usable()?;
        let request = self.request(timestamp, operation);
        Ok(self.inner.remote.execute(request).await?)
    }

    // ---- Dynamic tables ----

    pub async fn lookup_rows(&self, request: LookupRows) -> TransactionResult<Rowset> {
        let snapshot = Some(self.start_timestamp());
        let response = self
            .execute(snapshot, Operation::LookupRows(request))
            .await?;
        expect_response!(response, "lookup_rows", Rowset)
    }

    pub async fn versioned_lookup_rows(&self, request: LookupRows) -> TransactionResult<Rowset> {
        let snapshot = Some(self.start_timestamp());
        let response = self
            .execute(snapshot, Operation::VersionedLookupRows(request))
            .await?;
        expect_response!(response, "versioned_lookup_rows", Rowset)
    }

    pub async fn select_rows(&self, request: SelectRows) -> TransactionResult<Rowset> {
        let snapshot = Some(self.start_timestamp());
        let response = self
            .execute(snapshot, Operation::SelectRows(request))
            .await?;
        expect_response!(response, "select_rows", Rowset)
    }

    /// Writes or deletes rows of a dynamic table.
    ///
    /// The request is sent right away. The returned handle is also kept by
    /// the session, and the next [`commit`](Self::commit) waits for it.
    pub fn modify_rows(&self, request: ModifyRows) -> TransactionResult<MutationHandle> {
        self.ensure_usable()?;
        let request = self.request(None, Operation::ModifyRows(request));
        Ok(self.track_mutation(request))
    }

    // ---- Cypress nodes ----

    pub async fn create_node(&self, request: CreateNode) -> TransactionResult<Guid> {
        let response = self.execute(None, Operation::CreateNode(request)).await?;
        expect_response!(response, "create_node", Id)
    }

    pub async fn exists_node(&self, request: ExistsNode) -> TransactionResult<bool> {
        let response = self.execute(None, Operation::ExistsNode(request)).await?;
        expect_response!(response, "exists_node", Bool)
    }

    pub async fn get_node(&self, request: GetNode) -> TransactionResult<serde_json::Value> {
        let response = self.execute(None, Operation::GetNode(request)).await?;
        expect_response!(response, "get_node", Node)
    }

    pub async fn list_node(&self, request: ListNode) -> TransactionResult<serde_json::Value> {
        let response = self.execute(None, Operation::ListNode(request)).await?;
        expect_response!(response, "list_node", Node)
    }

    pub async fn remove_node(&self, request: RemoveNode) -> TransactionResult<()> {
        let response = self.execute(None, Operation::RemoveNode(request)).await?;
        expect_response!(response, "remove_node", Unit)
    }

    pub async fn set_node(&self, request: SetNode) -> TransactionResult<()> {
        let response = self.execute(None, Operation::SetNode(request)).await?;
        expect_response!(response, "set_node", Unit)
    }

    pub async fn lock_node(&self, request: LockNode) -> TransactionResult<LockNodeResult> {
        let response = self.execute(None, Operation::LockNode(request)).await?;
        expect_response!(response, "lock_node", Lock)
    }

    pub async fn copy_node(&self, request: CopyNode) -> TransactionResult<Guid> {
        let response = self.execute(None, Operation::CopyNode(request)).await?;
        expect_response!(response, "copy_node", Id)
    }

    pub async fn move_node(&self, request: MoveNode) -> TransactionResult<Guid> {
        let response = self.execute(None, Operation::MoveNode(request)).await?;
        expect_response!(response, "move_node", Id)
    }

    pub async fn link_node(&self, request: LinkNode) -> TransactionResult<Guid> {
        let response = self.execute(None, Operation::LinkNode(request)).await?;
        expect_response!(response, "link_node", Id)
    }

    pub async fn concatenate_nodes(&self, request: ConcatenateNodes) -> TransactionResult<()> {
        let response = self
            .execute(None, Operation::ConcatenateNodes(request))
            .await?;
        expect_response!(response, "concatenate_nodes", Unit)
    }

    // ---- Static tables and files ----

    pub async fn read_table(&self, request: ReadTable) -> TransactionResult<Rowset> {
        let response = self.execute(None, Operation::ReadTable(request)).await?;
        expect_response!(response, "read_table", Rowset)
    }

    pub async fn write_table(&self, request: WriteTable) -> TransactionResult<()> {
        let response = self.execute(None, Operation::WriteTable(request)).await?;
        expect_response!(response, "write_table", Unit)
    }

    pub async fn read_file(&self, request: ReadFile) -> TransactionResult<Vec<u8>> {
        let response = self.execute(None, Operation::ReadFile(request)).await?;
        expect_response!(response, "read_file", Bytes)
    }

    pub async fn write_file(&self, request: WriteFile) -> TransactionResult<()> {
        let response = self.execute(None, Operation::WriteFile(request)).await?;
        expect_response!(response, "write_file", Unit)
    }

    // ---- Operations, security and file cache ----

    /// Starts a scheduler operation and returns its id.
    pub async fn start_operation(&self, request: StartOperation) -> TransactionResult<Guid> {
        let response = self
            .execute(None, Operation::StartOperation(request))
            .await?;
        expect_response!(response, "start_operation", Id)
    }

    pub async fn check_permission(
        &self,
        request: CheckPermission,
    ) -> TransactionResult<CheckPermissionResult> {
        let response = self
            .execute(None, Operation::CheckPermission(request))
            .await?;
        expect_response!(response, "check_permission", Permission)
    }

    /// Returns the cached path of a file with the given md5, if any.
    pub async fn get_file_from_cache(
        &self,
        request: GetFileFromCache,
    ) -> TransactionResult<Option<String>> {
        let response = self
            .execute(None, Operation::GetFileFromCache(request))
            .await?;
        expect_response!(response, "get_file_from_cache", CachedPath)
    }

    pub async fn put_file_to_cache(&self, request: PutFileToCache) -> TransactionResult<String> {
        let response = self
            .execute(None, Operation::PutFileToCache(request))
            .await?;
        match expect_response!(response, "put_file_to_cache", CachedPath)? {
            Some(path) => Ok(path),
            None => Err(TransactionError::UnexpectedResponse {
                operation: "put_file_to_cache",
                response: "empty cached_path",
            }),
        }
    }
}
