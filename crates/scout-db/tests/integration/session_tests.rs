use chrono::Utc;
use scout_core::session::{NewSession, ProcessingStatus, SessionStatus};
use scout_core::traits::SessionStore;
use uuid::Uuid;

use crate::integration::common::setup_store;

fn new_session(owner_id: Uuid) -> NewSession {
    NewSession {
        owner_id,
        business_type: "Coffee Shop".into(),
        location: "Milano".into(),
        search_query: "coffee shop|milano".into(),
    }
}

#[tokio::test]
async fn create_session_defaults() {
    let (store, _container) = setup_store().await;
    let owner = Uuid::new_v4();

    let session = store.create_session(&new_session(owner)).await.unwrap();

    assert_eq!(session.owner_id, owner);
    assert_eq!(session.status, SessionStatus::Running);
    assert_eq!(session.total_records, 0);
    assert_eq!(session.processing_status, ProcessingStatus::Pending);
    assert!(session.completed_at.is_none());
}

#[tokio::test]
async fn get_session_is_owner_scoped() {
    let (store, _container) = setup_store().await;
    let owner = Uuid::new_v4();
    let session = store.create_session(&new_session(owner)).await.unwrap();

    assert!(store.get_session(session.id, owner).await.unwrap().is_some());
    assert!(
        store
            .get_session(session.id, Uuid::new_v4())
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
async fn update_status_keeps_completed_at_unless_given() {
    let (store, _container) = setup_store().await;
    let owner = Uuid::new_v4();
    let session = store.create_session(&new_session(owner)).await.unwrap();

    store
        .update_status(session.id, SessionStatus::Paused, None)
        .await
        .unwrap();
    let paused = store.get_session(session.id, owner).await.unwrap().unwrap();
    assert_eq!(paused.status, SessionStatus::Paused);
    assert!(paused.completed_at.is_none());

    store
        .update_status(session.id, SessionStatus::Completed, Some(Utc::now()))
        .await
        .unwrap();
    let done = store.get_session(session.id, owner).await.unwrap().unwrap();
    assert_eq!(done.status, SessionStatus::Completed);
    assert!(done.completed_at.is_some());
}

#[tokio::test]
async fn terminal_status_is_never_overwritten() {
    let (store, _container) = setup_store().await;
    let owner = Uuid::new_v4();
    let session = store.create_session(&new_session(owner)).await.unwrap();

    store
        .update_status(session.id, SessionStatus::Completed, Some(Utc::now()))
        .await
        .unwrap();
    let done = store.get_session(session.id, owner).await.unwrap().unwrap();

    store
        .update_status(session.id, SessionStatus::Paused, None)
        .await
        .unwrap();
    store
        .update_status(session.id, SessionStatus::Completed, Some(Utc::now()))
        .await
        .unwrap();

    let after = store.get_session(session.id, owner).await.unwrap().unwrap();
    assert_eq!(after.status, SessionStatus::Completed);
    assert_eq!(after.completed_at, done.completed_at);
}

#[tokio::test]
async fn total_records_never_decreases() {
    let (store, _container) = setup_store().await;
    let owner = Uuid::new_v4();
    let session = store.create_session(&new_session(owner)).await.unwrap();

    store.set_total_records(session.id, 3).await.unwrap();
    store.set_total_records(session.id, 3).await.unwrap();
    store.set_total_records(session.id, 2).await.unwrap();

    let stored = store.get_session(session.id, owner).await.unwrap().unwrap();
    assert_eq!(stored.total_records, 3);
}

#[tokio::test]
async fn set_processing_status_persists() {
    let (store, _container) = setup_store().await;
    let owner = Uuid::new_v4();
    let session = store.create_session(&new_session(owner)).await.unwrap();

    store
        .set_processing_status(session.id, ProcessingStatus::Completed)
        .await
        .unwrap();

    let stored = store.get_session(session.id, owner).await.unwrap().unwrap();
    assert_eq!(stored.processing_status, ProcessingStatus::Completed);
}
