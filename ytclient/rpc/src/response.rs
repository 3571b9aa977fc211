use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum::IntoStaticStr;
use ytclient_common::{Guid, Timestamp};

use crate::request::Row;

/// Identity of a transaction returned by the cluster on start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartedTransaction {
    pub id: Guid,
    pub start_timestamp: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Rowset {
    pub rows: Vec<Row>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockNodeResult {
    pub lock_id: Guid,
    pub node_id: Guid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SecurityAction {
    Allow,
    Deny,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckPermissionResult {
    pub action: SecurityAction,
    pub object_id: Option<Guid>,
    pub subject_id: Option<Guid>,
}

/// Result of [`RemoteSession::execute`](crate::RemoteSession::execute).
///
/// Each operation expects one variant; the transaction layer rejects any
/// other as an unexpected response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, IntoStaticStr)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Response {
    Unit,
    Id(Guid),
    Bool(bool),
    Node(Value),
    Lock(LockNodeResult),
    Rowset(Rowset),
    Permission(CheckPermissionResult),
    CachedPath(Option<String>),
    Bytes(Vec<u8>),
}

impl Response {
    pub fn kind(&self) -> &'static str {
        self.into()
    }
}
