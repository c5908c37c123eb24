//! ActionSubmitter driving the recording contract.

mod common;

use std::sync::Arc;

use common::{CountingProver, KEY_HASH, Workspace, planet_1_init, test_case, whitelist_request};
use df_runtime::{ActionError, ActionSubmitter, CacheStatus, ChainError, RecordingActions};
use df_zk::{CallValue, CircuitKind, FieldValue};

#[tokio::test]
async fn init_is_proven_once_and_sent() {
    let workspace = Workspace::new();
    let prover = CountingProver::default();
    let chain = Arc::new(RecordingActions::new());
    let submitter =
        ActionSubmitter::new(Arc::new(workspace.orchestrator(prover.clone())), chain.clone());

    let first = submitter
        .submit(test_case("planet_1"), planet_1_init())
        .await
        .unwrap();
    let second = submitter
        .submit(test_case("planet_1"), planet_1_init())
        .await
        .unwrap();

    assert_eq!(first.receipt.entrypoint, "initializePlayer");
    assert_eq!(first.status, CacheStatus::Miss);
    assert_eq!(second.status, CacheStatus::Hit);
    assert_eq!(prover.calls(), 1);

    let calls = chain.calls();
    assert_eq!(calls.len(), 2);
    assert!(calls.iter().all(|args| args.kind() == CircuitKind::Init));
}

#[tokio::test]
async fn corrupted_key_hash_is_rejected_by_contract() {
    let workspace = Workspace::new();
    let chain = Arc::new(RecordingActions::new());
    chain.add_keys([FieldValue::from_u64(KEY_HASH)]);
    let submitter = ActionSubmitter::new(
        Arc::new(workspace.orchestrator(CountingProver::default())),
        chain.clone(),
    );

    let prepared = submitter
        .prepare(test_case("key_1"), whitelist_request())
        .await
        .unwrap();

    let mut corrupted = prepared.call_args.clone();
    corrupted.replace_input(0, FieldValue::ZERO).unwrap();
    assert_eq!(corrupted.inputs().len(), 2);
    assert_eq!(corrupted.inputs()[0], CallValue::Uint(FieldValue::ZERO));

    let err = submitter.send(corrupted).await.unwrap_err();
    assert!(matches!(err, ActionError::Chain(ChainError::Reverted { .. })));

    let receipt = submitter.send(prepared.call_args).await.unwrap();
    assert_eq!(receipt.entrypoint, "useKey");
    assert_eq!(chain.calls().len(), 1);
}

#[tokio::test]
async fn prepare_errors_surface_through_submit() {
    let workspace = Workspace::new();
    let submitter = ActionSubmitter::new(
        Arc::new(workspace.orchestrator(common::FailingProver)),
        Arc::new(RecordingActions::new()),
    );

    let err = submitter
        .submit(test_case("planet_1"), planet_1_init())
        .await
        .unwrap_err();

    assert!(matches!(err, ActionError::Prepare(_)));
}
