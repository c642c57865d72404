mod common;

use common::*;
use serde_json::json;
use std::sync::Arc;

use saga_coordinator::application::sagas::account_registration::{
    self, AUTH_CREATE_COMMAND, AUTH_DELETE_COMMAND, CREATE_CREDENTIAL, CREATE_USER,
    USER_CREATE_COMMAND, USER_DELETE_COMMAND,
};
use saga_coordinator::core::patterns::sagas::{
    SagaInstanceRepository, SagaLogRepository, SagaStepRepository,
};
use saga_coordinator::{
    AppError, InMemorySagaStore, SagaLogType, SagaOrchestrator, SagaStatus,
};

async fn registration_orchestrator(
    store: Arc<InMemorySagaStore>,
    executor: Arc<MockCommandExecutor>,
) -> SagaOrchestrator {
    executor
        .set_response(USER_CREATE_COMMAND, json!({ "id": "user-42" }))
        .await;
    executor
        .set_response(AUTH_CREATE_COMMAND, json!({ "credential_id": "cred-7" }))
        .await;
    account_registration::orchestrator(repositories(store), executor, fast_config()).unwrap()
}

#[tokio::test]
async fn test_registration_completes_both_steps() {
    let store = Arc::new(InMemorySagaStore::new());
    let executor = Arc::new(MockCommandExecutor::new());
    let orchestrator = registration_orchestrator(store.clone(), executor.clone()).await;

    let saga_id = orchestrator
        .handle(registration_trigger("ada@example.com"))
        .await
        .unwrap();

    let instance = SagaInstanceRepository::find_by_id(store.as_ref(), saga_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(instance.status, SagaStatus::Completed);
    assert!(instance.start_date.is_some());
    assert!(instance.end_date.is_some());
    assert_eq!(instance.tenant_id.as_deref(), Some("tenant-a"));
    assert_eq!(instance.step_ids.len(), 2);

    let steps = SagaStepRepository::find_by_instance(store.as_ref(), saga_id)
        .await
        .unwrap();
    assert_eq!(steps.len(), 2);
    assert_eq!(steps[0].name, CREATE_USER);
    assert_eq!(steps[0].order, 1);
    assert_eq!(steps[0].result, Some(json!({ "id": "user-42" })));
    assert_eq!(steps[1].name, CREATE_CREDENTIAL);
    assert!(steps
        .iter()
        .all(|step| step.status == SagaStatus::Completed && step.end_date.is_some()));

    assert_eq!(
        executor.command_names().await,
        vec![USER_CREATE_COMMAND, AUTH_CREATE_COMMAND]
    );

    let calls = executor.calls().await;
    assert_eq!(calls[1].payload["user_id"], "user-42");
    assert_eq!(calls[1].payload["password"], "correct horse");
    assert!(calls.iter().all(|call| call.saga_instance_id == Some(saga_id)
        && call.tenant_id.as_deref() == Some("tenant-a")
        && call.correlation_id == instance.correlation_id));

    let logs = SagaLogRepository::find_by_instance(store.as_ref(), saga_id)
        .await
        .unwrap();
    assert_eq!(logs[0].message, "saga created");
    assert!(logs.iter().all(|entry| entry.log_type == SagaLogType::Info));
}

#[tokio::test]
async fn test_credential_failure_deletes_created_user() {
    let store = Arc::new(InMemorySagaStore::new());
    let executor = Arc::new(MockCommandExecutor::new());
    let orchestrator = registration_orchestrator(store.clone(), executor.clone()).await;
    executor
        .fail_always(AUTH_CREATE_COMMAND, "password too weak")
        .await;

    let err = orchestrator
        .handle(registration_trigger("bob@example.com"))
        .await
        .unwrap_err();

    let saga_id = err.saga_instance_id().unwrap();
    match &err {
        AppError::SagaFailed {
            step,
            reason,
            compensation_failures,
            ..
        } => {
            assert_eq!(step, CREATE_CREDENTIAL);
            assert!(reason.contains("password too weak"));
            assert_eq!(*compensation_failures, 0);
        }
        other => panic!("unexpected error: {:?}", other),
    }

    assert_eq!(
        executor.command_names().await,
        vec![USER_CREATE_COMMAND, AUTH_CREATE_COMMAND, USER_DELETE_COMMAND]
    );
    let delete = executor.calls().await.pop().unwrap();
    assert_eq!(delete.payload["payload"]["email"], "bob@example.com");
    assert_eq!(delete.payload["result"]["id"], "user-42");

    let instance = SagaInstanceRepository::find_by_id(store.as_ref(), saga_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(instance.status, SagaStatus::Failed);
    assert!(instance.end_date.is_some());

    let steps = SagaStepRepository::find_by_instance(store.as_ref(), saga_id)
        .await
        .unwrap();
    assert_eq!(steps[0].status, SagaStatus::Completed);
    assert_eq!(steps[1].status, SagaStatus::Failed);
    assert!(steps[1]
        .error_message
        .as_deref()
        .unwrap()
        .contains("password too weak"));

    let step_logs = store.find_by_step(steps[1].id).await.unwrap();
    assert!(step_logs
        .iter()
        .any(|entry| entry.log_type == SagaLogType::Error));
}

#[tokio::test]
async fn test_first_step_failure_compensates_nothing() {
    let store = Arc::new(InMemorySagaStore::new());
    let executor = Arc::new(MockCommandExecutor::new());
    let orchestrator = registration_orchestrator(store.clone(), executor.clone()).await;
    executor
        .fail_always(USER_CREATE_COMMAND, "email already registered")
        .await;

    let err = orchestrator
        .handle(registration_trigger("taken@example.com"))
        .await
        .unwrap_err();
    let saga_id = err.saga_instance_id().unwrap();

    assert_eq!(executor.command_names().await, vec![USER_CREATE_COMMAND]);
    assert_eq!(executor.call_count(USER_DELETE_COMMAND).await, 0);
    assert_eq!(executor.call_count(AUTH_DELETE_COMMAND).await, 0);

    let steps = SagaStepRepository::find_by_instance(store.as_ref(), saga_id)
        .await
        .unwrap();
    assert_eq!(steps.len(), 1);
    assert_eq!(steps[0].status, SagaStatus::Failed);

    let instance = SagaInstanceRepository::find_by_id(store.as_ref(), saga_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(instance.status, SagaStatus::Failed);
}

#[tokio::test]
async fn test_failed_compensation_does_not_stop_the_rest() {
    let journal = Journal::new();
    let (definition, registry) = journaled_saga(
        "fulfilment",
        &[
            ("reserve-stock", StepBehaviour::ok()),
            ("charge-card", StepBehaviour::failing_compensation()),
            ("ship-order", StepBehaviour::failing()),
        ],
        &journal,
    );
    let store = Arc::new(InMemorySagaStore::new());
    let orchestrator = SagaOrchestrator::new(
        definition,
        &registry,
        repositories(store.clone()),
        Arc::new(MockCommandExecutor::new()),
        fast_config(),
    )
    .unwrap();

    let err = orchestrator
        .handle(saga_coordinator::SagaTrigger::new("fulfilment", json!({})))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        AppError::SagaFailed {
            compensation_failures: 1,
            ..
        }
    ));
    assert_eq!(journal.compensations(), vec!["charge-card", "reserve-stock"]);

    let saga_id = err.saga_instance_id().unwrap();
    let logs = SagaLogRepository::find_by_instance(store.as_ref(), saga_id)
        .await
        .unwrap();
    let errors: Vec<&str> = logs
        .iter()
        .filter(|entry| entry.log_type == SagaLogType::Error)
        .map(|entry| entry.message.as_str())
        .collect();
    assert_eq!(errors.len(), 2);
    assert!(errors
        .iter()
        .any(|message| message.contains("compensation of step 'charge-card' failed")));
    assert!(logs
        .iter()
        .any(|entry| entry.message == "step 'reserve-stock' compensated"));

    let instance = SagaInstanceRepository::find_by_id(store.as_ref(), saga_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(instance.status, SagaStatus::Failed);
}
