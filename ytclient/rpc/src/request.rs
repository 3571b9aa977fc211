//! Typed request model for transactional operations.
//!
//! Payloads are intentionally thin: validation and wire encoding belong to
//! the transport. Node values and table rows are carried as JSON values.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum::IntoStaticStr;
use ytclient_common::{Guid, Timestamp};

/// A table row keyed by column name.
pub type Row = serde_json::Map<String, Value>;

/// Transaction binding attached to every request issued under a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionalOptions {
    pub transaction_id: Guid,
    pub ping: bool,
    pub ping_ancestors: bool,
    /// Route the request to the proxy that started the transaction.
    pub sticky: bool,
}

impl TransactionalOptions {
    pub fn new(transaction_id: Guid, sticky: bool) -> Self {
        Self {
            transaction_id,
            ping: true,
            ping_ancestors: false,
            sticky,
        }
    }

    pub fn with_ping(mut self, ping: bool) -> Self {
        self.ping = ping;
        self
    }

    pub fn with_ping_ancestors(mut self, ping_ancestors: bool) -> Self {
        self.ping_ancestors = ping_ancestors;
        self
    }
}

/// Parameters of a new master transaction.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StartTransaction {
    pub ping: bool,
    pub ping_ancestors: bool,
    pub sticky: bool,
    /// Lease after which an idle transaction is aborted by the server.
    pub timeout: Option<Duration>,
}

/// A single operation issued under a transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionalRequest {
    pub options: TransactionalOptions,
    /// Snapshot timestamp for reads of dynamic tables.
    pub timestamp: Option<Timestamp>,
    pub operation: Operation,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, IntoStaticStr)]
#[serde(tag = "type", rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Operation {
    LookupRows(LookupRows),
    VersionedLookupRows(LookupRows),
    SelectRows(SelectRows),
    ModifyRows(ModifyRows),
    CreateNode(CreateNode),
    ExistsNode(ExistsNode),
    GetNode(GetNode),
    ListNode(ListNode),
    RemoveNode(RemoveNode),
    SetNode(SetNode),
    LockNode(LockNode),
    CopyNode(CopyNode),
    MoveNode(MoveNode),
    LinkNode(LinkNode),
    ConcatenateNodes(ConcatenateNodes),
    ReadTable(ReadTable),
    WriteTable(WriteTable),
    ReadFile(ReadFile),
    WriteFile(WriteFile),
    StartOperation(StartOperation),
    CheckPermission(CheckPermission),
    GetFileFromCache(GetFileFromCache),
    PutFileToCache(PutFileToCache),
}

impl Operation {
    /// Stable snake_case name of the operation, used in logs and errors.
    pub fn kind(&self) -> &'static str {
        self.into()
    }
}

// ---- Dynamic tables ----

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LookupRows {
    pub path: String,
    pub keys: Vec<Row>,
    /// Columns to fetch; empty means all columns.
    pub columns: Vec<String>,
    pub keep_missing_rows: bool,
}

impl LookupRows {
    pub fn new(path: impl Into<String>, keys: Vec<Row>) -> Self {
        Self {
            path: path.into(),
            keys,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectRows {
    pub query: String,
    pub input_row_limit: Option<u64>,
    pub output_row_limit: Option<u64>,
}

impl SelectRows {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            input_row_limit: None,
            output_row_limit: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "row", rename_all = "snake_case")]
pub enum RowModification {
    Write(Row),
    Delete(Row),
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ModifyRows {
    pub path: String,
    pub modifications: Vec<RowModification>,
}

impl ModifyRows {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            modifications: Vec::new(),
        }
    }

    pub fn add_write(mut self, row: Row) -> Self {
        self.modifications.push(RowModification::Write(row));
        self
    }

    pub fn add_delete(mut self, key: Row) -> Self {
        self.modifications.push(RowModification::Delete(key));
        self
    }
}

// ---- Cypress nodes ----

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectType {
    MapNode,
    ListNode,
    StringNode,
    Int64Node,
    Document,
    Table,
    File,
    Link,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateNode {
    pub path: String,
    pub node_type: ObjectType,
    pub recursive: bool,
    pub ignore_existing: bool,
    pub force: bool,
    pub attributes: serde_json::Map<String, Value>,
}

impl CreateNode {
    pub fn new(path: impl Into<String>, node_type: ObjectType) -> Self {
        Self {
            path: path.into(),
            node_type,
            recursive: false,
            ignore_existing: false,
            force: false,
            attributes: serde_json::Map::new(),
        }
    }

    pub fn recursive(mut self) -> Self {
        self.recursive = true;
        self
    }

    pub fn ignore_existing(mut self) -> Self {
        self.ignore_existing = true;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExistsNode {
    pub path: String,
}

impl ExistsNode {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GetNode {
    pub path: String,
    pub attributes: Vec<String>,
}

impl GetNode {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            attributes: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ListNode {
    pub path: String,
    pub attributes: Vec<String>,
    pub max_size: Option<u64>,
}

impl ListNode {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoveNode {
    pub path: String,
    pub recursive: bool,
    pub force: bool,
}

impl RemoveNode {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            recursive: true,
            force: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetNode {
    pub path: String,
    pub value: Value,
    pub force: bool,
}

impl SetNode {
    pub fn new(path: impl Into<String>, value: Value) -> Self {
        Self {
            path: path.into(),
            value,
            force: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LockMode {
    Snapshot,
    #[default]
    Shared,
    Exclusive,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockNode {
    pub path: String,
    pub mode: LockMode,
    pub waitable: bool,
    pub child_key: Option<String>,
    pub attribute_key: Option<String>,
}

impl LockNode {
    pub fn new(path: impl Into<String>, mode: LockMode) -> Self {
        Self {
            path: path.into(),
            mode,
            waitable: false,
            child_key: None,
            attribute_key: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CopyNode {
    pub source: String,
    pub destination: String,
    pub recursive: bool,
    pub force: bool,
    pub preserve_account: bool,
}

impl CopyNode {
    pub fn new(source: impl Into<String>, destination: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            destination: destination.into(),
            recursive: false,
            force: false,
            preserve_account: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveNode {
    pub source: String,
    pub destination: String,
    pub recursive: bool,
    pub force: bool,
}

impl MoveNode {
    pub fn new(source: impl Into<String>, destination: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            destination: destination.into(),
            recursive: false,
            force: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkNode {
    pub target: String,
    pub link: String,
    pub recursive: bool,
    pub force: bool,
}

impl LinkNode {
    pub fn new(target: impl Into<String>, link: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            link: link.into(),
            recursive: false,
            force: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConcatenateNodes {
    pub sources: Vec<String>,
    pub destination: String,
}

// ---- Static tables and files ----

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadTable {
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WriteTable {
    pub path: String,
    pub rows: Vec<Row>,
    pub append: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadFile {
    pub path: String,
    pub offset: Option<u64>,
    pub length: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteFile {
    pub path: String,
    pub data: Vec<u8>,
    pub append: bool,
}

// ---- Scheduler operations ----

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationType {
    Map,
    Reduce,
    Sort,
    MapReduce,
    Merge,
    RemoteCopy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StartOperation {
    pub operation_type: OperationType,
    pub spec: Value,
}

impl StartOperation {
    pub fn new(operation_type: OperationType, spec: Value) -> Self {
        Self {
            operation_type,
            spec,
        }
    }
}

// ---- Security and file cache ----

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    Read,
    Write,
    Use,
    Administer,
    Create,
    Remove,
    Mount,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckPermission {
    pub user: String,
    pub permission: Permission,
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetFileFromCache {
    pub md5: String,
    pub cache_path: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PutFileToCache {
    pub path: String,
    pub md5: String,
    pub cache_path: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_kind() {
        let op = Operation::CreateNode(CreateNode::new("//tmp/t", ObjectType::Table));
        assert_eq!(op.kind(), "create_node");

        let op = Operation::ModifyRows(ModifyRows::new("//tmp/dyn"));
        assert_eq!(op.kind(), "modify_rows");
    }

    #[test]
    fn test_operation_serializes_with_tag() {
        let op = Operation::ExistsNode(ExistsNode::new("//home"));
        let json = serde_json::to_value(&op).unwrap();
        assert_eq!(json, serde_json::json!({"type": "exists_node", "path": "//home"}));
    }

    #[test]
    fn test_object_type_names() {
        assert_eq!(
            serde_json::to_value(ObjectType::MapNode).unwrap(),
            serde_json::json!("map_node")
        );
        let mode: LockMode = serde_json::from_str(r#""exclusive""#).unwrap();
        assert_eq!(mode, LockMode::Exclusive);
    }
}
