#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use ytclient_rpc::TokioScheduler;
use ytclient_rpc::request::{ModifyRows, Row};
use ytclient_rpc::testutil::MockRemoteSession;
use ytclient_transaction::{PingFailureObserver, TransactionConfig, TransactionSession};

pub fn mock() -> Arc<MockRemoteSession> {
    Arc::new(MockRemoteSession::new())
}

/// A config without heartbeats, so tests only see the calls they make.
pub fn quiet_config() -> TransactionConfig {
    TransactionConfig::default().with_ping(false)
}

pub fn session(remote: &Arc<MockRemoteSession>, config: TransactionConfig) -> TransactionSession {
    TransactionSession::new(
        MockRemoteSession::TRANSACTION_ID,
        MockRemoteSession::START_TIMESTAMP,
        &config,
        remote.clone(),
        Arc::new(TokioScheduler::current()),
    )
}

pub fn observed_session(
    remote: &Arc<MockRemoteSession>,
    config: TransactionConfig,
    observer: PingFailureObserver,
) -> TransactionSession {
    TransactionSession::with_ping_failure_observer(
        MockRemoteSession::TRANSACTION_ID,
        MockRemoteSession::START_TIMESTAMP,
        &config,
        remote.clone(),
        Arc::new(TokioScheduler::current()),
        observer,
    )
}

pub fn write(path: &str, key: i64) -> ModifyRows {
    let mut row = Row::new();
    row.insert("key".to_owned(), json!(key));
    row.insert("value".to_owned(), json!(format!("v{key}")));
    ModifyRows::new(path).add_write(row)
}

/// Lets every spawned task that is ready run to its next suspension point.
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(1)).await;
}
