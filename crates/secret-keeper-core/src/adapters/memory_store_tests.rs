//! Tests for the in-memory secret store

use super::*;
use crate::classifier::{ErrorClassifier, KindClassifier};

fn ns(value: &str) -> Namespace {
    Namespace::new(value).unwrap()
}

fn record(namespace: &str, name: &str, value: &str) -> SecretRecord {
    SecretRecord::new(
        SecretName::new(name).unwrap(),
        ns(namespace),
        SecretValue::from_string(value.to_string()),
    )
}

#[tokio::test]
async fn test_create_then_list() {
    let store = InMemorySecretStore::new();

    store.create(&record("tenant-a", "db-pass", "s3cr3t")).await.unwrap();
    store.create(&record("tenant-a", "api-key", "k")).await.unwrap();

    let names = store.list(&ns("tenant-a")).await.unwrap();
    let names: Vec<&str> = names.iter().map(SecretName::as_str).collect();
    assert_eq!(names, vec!["api-key", "db-pass"]);
}

#[tokio::test]
async fn test_list_is_partitioned_by_namespace() {
    let store = InMemorySecretStore::with_secrets(vec![
        record("tenant-a", "shared-name", "a"),
        record("tenant-b", "shared-name", "b"),
        record("tenant-b", "other", "b2"),
    ]);

    assert_eq!(store.list(&ns("tenant-a")).await.unwrap().len(), 1);
    assert_eq!(store.list(&ns("tenant-b")).await.unwrap().len(), 2);
    assert!(store.list(&ns("tenant-c")).await.unwrap().is_empty());
    assert_eq!(store.len(), 3);
}

#[tokio::test]
async fn test_duplicate_create_is_conflict() {
    let store = InMemorySecretStore::new();
    store.create(&record("tenant-a", "db-pass", "one")).await.unwrap();

    let err = store
        .create(&record("tenant-a", "db-pass", "two"))
        .await
        .unwrap_err();

    assert!(matches!(err, MemoryStoreError::AlreadyExists { .. }));
    assert_eq!(err.outcome_status(), Some(OutcomeStatus::AlreadyExists));

    // Original value untouched
    let stored = store.get(&ns("tenant-a"), &SecretName::new("db-pass").unwrap()).unwrap();
    assert_eq!(stored.value.expose_str(), Some("one"));
}

#[tokio::test]
async fn test_replace_updates_value_and_version() {
    let store = InMemorySecretStore::new();
    store.create(&record("tenant-a", "db-pass", "one")).await.unwrap();

    store.replace(&record("tenant-a", "db-pass", "two")).await.unwrap();

    let stored = store.get(&ns("tenant-a"), &SecretName::new("db-pass").unwrap()).unwrap();
    assert_eq!(stored.value.expose_str(), Some("two"));
    assert_eq!(stored.version, 2);
    assert!(stored.updated_at >= stored.created_at);
}

#[tokio::test]
async fn test_replace_missing_is_not_found() {
    let store = InMemorySecretStore::new();

    let err = store
        .replace(&record("tenant-a", "missing", "x"))
        .await
        .unwrap_err();

    assert_eq!(err.outcome_status(), Some(OutcomeStatus::NotFound));
}

#[tokio::test]
async fn test_delete_removes_secret() {
    let store = InMemorySecretStore::with_secrets(vec![record("tenant-a", "db-pass", "x")]);
    let name = SecretName::new("db-pass").unwrap();

    store.delete(&ns("tenant-a"), &name).await.unwrap();

    assert!(store.is_empty());
    let err = store.delete(&ns("tenant-a"), &name).await.unwrap_err();
    assert!(matches!(err, MemoryStoreError::NotFound { .. }));
}

#[tokio::test]
async fn test_delete_does_not_cross_namespaces() {
    let store = InMemorySecretStore::with_secrets(vec![record("tenant-a", "db-pass", "x")]);

    let err = store
        .delete(&ns("tenant-b"), &SecretName::new("db-pass").unwrap())
        .await
        .unwrap_err();

    assert!(matches!(err, MemoryStoreError::NotFound { .. }));
    assert_eq!(store.len(), 1);
}

#[tokio::test]
async fn test_uppercase_name_is_invalid_input() {
    let store = InMemorySecretStore::new();

    let err = store
        .create(&record("tenant-a", "DB_PASS", "x"))
        .await
        .unwrap_err();

    assert!(matches!(err, MemoryStoreError::InvalidName { .. }));
    assert_eq!(
        KindClassifier.classify(&err).status,
        OutcomeStatus::InvalidInput
    );
}

#[tokio::test]
async fn test_value_size_limit() {
    let store = InMemorySecretStore::with_max_value_size(4);

    store.create(&record("tenant-a", "small", "1234")).await.unwrap();
    let err = store
        .create(&record("tenant-a", "large", "12345"))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        MemoryStoreError::ValueTooLarge {
            size: 5,
            max_size: 4
        }
    ));
}

#[test]
fn test_lock_poisoned_has_no_kind() {
    assert_eq!(MemoryStoreError::LockPoisoned.outcome_status(), None);
    assert_eq!(
        KindClassifier.classify(&MemoryStoreError::LockPoisoned).status,
        OutcomeStatus::Internal
    );
}
