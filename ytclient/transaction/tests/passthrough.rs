use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use ytclient_common::Guid;
use ytclient_rpc::request::{
    CreateNode, GetFileFromCache, LockMode, LockNode, LookupRows, ObjectType, Operation,
    PutFileToCache, SelectRows, SetNode,
};
use ytclient_rpc::response::Response;
use ytclient_rpc::testutil::{MockRemoteSession, RemoteCall};
use ytclient_rpc::{StartTransaction, TokioScheduler};
use ytclient_transaction::{TransactionConfig, TransactionError, TransactionSession};

mod common;

use common::{mock, quiet_config, session, write};

#[tokio::test(start_paused = true)]
async fn test_start_transaction() {
    let remote = Arc::new(MockRemoteSession::new().with_address("proxy-1.example:9013"));
    let config = quiet_config()
        .with_sticky(true)
        .with_timeout(Duration::from_secs(30));

    let txn = TransactionSession::start(
        remote.clone(),
        Arc::new(TokioScheduler::current()),
        &config,
    )
    .await
    .unwrap();

    assert_eq!(
        remote.calls(),
        vec![RemoteCall::Start(StartTransaction {
            ping: false,
            ping_ancestors: false,
            sticky: true,
            timeout: Some(Duration::from_secs(30)),
        })]
    );
    assert_eq!(txn.id(), MockRemoteSession::TRANSACTION_ID);
    assert_eq!(txn.start_timestamp(), MockRemoteSession::START_TIMESTAMP);
    assert!(txn.is_active());
    assert!(txn.is_sticky());
    assert!(!txn.is_ping());
    assert_eq!(txn.rpc_proxy_address().as_deref(), Some("proxy-1.example:9013"));
    assert_eq!(txn.to_string(), "Transaction@1-2-3-4");
}

#[tokio::test(start_paused = true)]
async fn test_reads_use_start_timestamp() {
    let remote = mock();
    let txn = session(&remote, quiet_config());

    txn.lookup_rows(LookupRows::new("//tmp/dyntable", Vec::new()))
        .await
        .unwrap();
    txn.versioned_lookup_rows(LookupRows::new("//tmp/dyntable", Vec::new()))
        .await
        .unwrap();
    txn.select_rows(SelectRows::new("* from [//tmp/dyntable]"))
        .await
        .unwrap();

    let executed = remote.executed();
    assert_eq!(executed.len(), 3);
    for request in executed {
        assert_eq!(request.timestamp, Some(MockRemoteSession::START_TIMESTAMP));
        assert_eq!(
            request.options.transaction_id,
            MockRemoteSession::TRANSACTION_ID
        );
    }
}

#[tokio::test(start_paused = true)]
async fn test_requests_carry_transaction_options() {
    let remote = mock();
    let txn = session(&remote, quiet_config().with_sticky(true));

    let id = txn
        .create_node(CreateNode::new("//tmp/table", ObjectType::Table).recursive())
        .await
        .unwrap();
    assert_eq!(id, Guid::new(0, 0, 0, 1));
    txn.set_node(SetNode::new("//tmp/table/@expiration_time", json!("2030-01-01")))
        .await
        .unwrap();
    txn.modify_rows(write("//tmp/dyntable", 7))
        .unwrap()
        .await
        .unwrap();

    let executed = remote.executed();
    let kinds = executed
        .iter()
        .map(|request| request.operation.kind())
        .collect::<Vec<_>>();
    assert_eq!(kinds, ["create_node", "set_node", "modify_rows"]);
    for request in &executed {
        assert_eq!(request.options, *txn.transactional_options());
        assert!(request.options.sticky);
        assert_eq!(request.timestamp, None);
    }
    assert!(matches!(executed[2].operation, Operation::ModifyRows(_)));
}

#[tokio::test(start_paused = true)]
async fn test_typed_responses() {
    let remote = mock();
    let txn = session(&remote, quiet_config());

    let lock = txn
        .lock_node(LockNode::new("//tmp/table", LockMode::Exclusive))
        .await
        .unwrap();
    assert_eq!(lock.lock_id, Guid::new(0, 0, 0, 2));

    let cached = txn
        .get_file_from_cache(GetFileFromCache {
            md5: "d41d8cd98f00b204e9800998ecf8427e".to_owned(),
            cache_path: "//tmp/cache".to_owned(),
        })
        .await
        .unwrap();
    assert_eq!(cached, None);

    let path = txn
        .put_file_to_cache(PutFileToCache {
            path: "//tmp/file".to_owned(),
            md5: "d41d8cd98f00b204e9800998ecf8427e".to_owned(),
            cache_path: "//tmp/cache".to_owned(),
        })
        .await
        .unwrap();
    assert_eq!(path, "//tmp/cache/d41d8cd98f00b204e9800998ecf8427e");
}

#[tokio::test(start_paused = true)]
async fn test_unexpected_response_is_reported() {
    let remote = mock();
    let txn = session(&remote, quiet_config());
    remote.push_response(Response::Bool(false));

    let error = txn
        .create_node(CreateNode::new("//tmp/table", ObjectType::Table))
        .await
        .unwrap_err();
    assert!(matches!(error, TransactionError::UnexpectedResponse { .. }));
    insta::assert_snapshot!(error.to_string(), @"unexpected bool response to create_node");
}

#[tokio::test(start_paused = true)]
async fn test_empty_cached_path_is_rejected() {
    let remote = mock();
    let txn = session(&remote, quiet_config());
    remote.push_response(Response::CachedPath(None));

    let error = txn
        .put_file_to_cache(PutFileToCache {
            path: "//tmp/file".to_owned(),
            md5: "0".to_owned(),
            cache_path: "//tmp/cache".to_owned(),
        })
        .await
        .unwrap_err();
    assert!(matches!(
        error,
        TransactionError::UnexpectedResponse {
            operation: "put_file_to_cache",
            ..
        }
    ));
}

#[tokio::test(start_paused = true)]
async fn test_config_flags_reach_options() {
    let remote = mock();
    let config = TransactionConfig::default()
        .with_ping(false)
        .with_ping_ancestors(true);
    let txn = session(&remote, config);

    let options = txn.transactional_options();
    assert!(!options.ping);
    assert!(options.ping_ancestors);
    assert!(!options.sticky);
}
