use chrono::{TimeDelta, Utc};
use scout_core::cache::QueryCache;
use scout_core::models::{NewCacheEntry, NewSearchLogEntry};
use scout_core::session::{NewSession, Session};
use scout_core::traits::{CacheStore, SearchLogStore, SessionStore};
use scout_db::PgStore;
use uuid::Uuid;

use crate::integration::common::setup_store;

async fn session(store: &PgStore, owner_id: Uuid) -> Session {
    store
        .create_session(&NewSession {
            owner_id,
            business_type: "Cafe".into(),
            location: "Milano".into(),
            search_query: "cafe|milano".into(),
        })
        .await
        .unwrap()
}

fn entry(session: &Session, cached_at: chrono::DateTime<Utc>) -> NewCacheEntry {
    NewCacheEntry {
        owner_id: session.owner_id,
        search_query: session.search_query.clone(),
        session_id: session.id,
        business_type: session.business_type.clone(),
        location: session.location.clone(),
        result_count: 4,
        cached_at,
        expires_at: cached_at + TimeDelta::days(7),
    }
}

#[tokio::test]
async fn find_valid_ignores_expired_and_other_owners() {
    let (store, _container) = setup_store().await;
    let owner = Uuid::new_v4();
    let s = session(&store, owner).await;

    store
        .insert_entry(&entry(&s, Utc::now() - TimeDelta::days(8)))
        .await
        .unwrap();
    assert!(
        store
            .find_valid(owner, "cafe|milano", Utc::now())
            .await
            .unwrap()
            .is_none()
    );

    store.insert_entry(&entry(&s, Utc::now())).await.unwrap();
    assert!(
        store
            .find_valid(owner, "cafe|milano", Utc::now())
            .await
            .unwrap()
            .is_some()
    );
    assert!(
        store
            .find_valid(Uuid::new_v4(), "cafe|milano", Utc::now())
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
async fn find_valid_prefers_most_recent() {
    let (store, _container) = setup_store().await;
    let owner = Uuid::new_v4();
    let older = session(&store, owner).await;
    let newer = session(&store, owner).await;

    store
        .insert_entry(&entry(&older, Utc::now() - TimeDelta::days(2)))
        .await
        .unwrap();
    store.insert_entry(&entry(&newer, Utc::now())).await.unwrap();

    let found = store
        .find_valid(owner, "cafe|milano", Utc::now())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found.session_id, newer.id);
}

#[tokio::test]
async fn query_cache_roundtrip_over_postgres() {
    let (store, _container) = setup_store().await;
    let owner = Uuid::new_v4();
    let s = session(&store, owner).await;
    let cache = QueryCache::new(store.clone(), TimeDelta::days(7));

    cache.record(&s, 4).await.unwrap();

    assert_eq!(cache.lookup(" CAFE", "milano ", owner).await, Some(s.id));
    assert_eq!(cache.lookup("cafe", "roma", owner).await, None);
}

#[tokio::test]
async fn search_log_appends() {
    let (store, _container) = setup_store().await;

    let id = store
        .append(&NewSearchLogEntry {
            owner_id: Uuid::new_v4(),
            business_type: "cafe".into(),
            location: "milano".into(),
            result_count: 7,
            was_cached: true,
        })
        .await
        .unwrap();

    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM search_logs WHERE id = $1")
        .bind(id)
        .fetch_one(store.pool())
        .await
        .unwrap();
    assert_eq!(count, 1);
}
