use std::collections::BTreeMap;

use scout_core::listing::{Listing, OpeningHours};
use scout_core::models::{NewProcessedListing, NewRawListing};
use scout_core::session::NewSession;
use scout_core::traits::{ListingStore, SessionStore};
use scout_db::PgStore;
use uuid::Uuid;

use crate::integration::common::setup_store;

async fn session(store: &PgStore) -> Uuid {
    store
        .create_session(&NewSession {
            owner_id: Uuid::new_v4(),
            business_type: "cafe".into(),
            location: "milano".into(),
            search_query: "cafe|milano".into(),
        })
        .await
        .unwrap()
        .id
}

fn full_listing() -> Listing {
    let mut hours = BTreeMap::new();
    hours.insert("monday".to_string(), "08:00-18:00".to_string());
    Listing {
        name: "Acme Cafe".into(),
        description: Some("Espresso bar".into()),
        rating: Some(4.6),
        reviews: Some(321),
        category: Some("cafe".into()),
        website: Some("acme.example".into()),
        address: Some("1 Main St".into()),
        phone: Some("+39 02 123".into()),
        latitude: Some(45.46),
        longitude: Some(9.19),
        opening_hours: Some(OpeningHours::Weekly(hours)),
        price_level: Some("$$".into()),
        thumbnail: Some("https://img.example/acme.png".into()),
        place_id: Some("place-1".into()),
    }
}

#[tokio::test]
async fn raw_listing_roundtrips_every_field() {
    let (store, _container) = setup_store().await;
    let session_id = session(&store).await;

    let inserted = store
        .insert_raw(&NewRawListing {
            session_id,
            position: 0,
            listing: full_listing(),
        })
        .await
        .unwrap();

    let rows = store.raw_listings(session_id).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].id, inserted.id);
    assert_eq!(rows[0].listing, full_listing());
}

#[tokio::test]
async fn raw_listings_come_back_in_ingestion_order() {
    let (store, _container) = setup_store().await;
    let session_id = session(&store).await;

    for position in [2u32, 0, 1] {
        store
            .insert_raw(&NewRawListing {
                session_id,
                position,
                listing: Listing::new(format!("L{position}")),
            })
            .await
            .unwrap();
    }

    let positions: Vec<u32> = store
        .raw_listings(session_id)
        .await
        .unwrap()
        .iter()
        .map(|r| r.position)
        .collect();
    assert_eq!(positions, vec![0, 1, 2]);
}

#[tokio::test]
async fn duplicate_position_is_rejected() {
    let (store, _container) = setup_store().await;
    let session_id = session(&store).await;
    let raw = NewRawListing {
        session_id,
        position: 0,
        listing: Listing::new("A"),
    };

    store.insert_raw(&raw).await.unwrap();
    assert!(store.insert_raw(&raw).await.is_err());
}

#[tokio::test]
async fn processed_batch_is_atomic() {
    let (store, _container) = setup_store().await;
    let session_id = session(&store).await;
    let raw = store
        .insert_raw(&NewRawListing {
            session_id,
            position: 0,
            listing: full_listing(),
        })
        .await
        .unwrap();

    let good = NewProcessedListing {
        session_id,
        raw_listing_id: raw.id,
        position: 0,
        listing: full_listing(),
        is_duplicate: false,
        is_website_verified: true,
        website_status_code: Some(200),
    };
    // Unknown raw listing id violates the foreign key.
    let bad = NewProcessedListing {
        raw_listing_id: Uuid::new_v4(),
        ..good.clone()
    };

    assert!(store.insert_processed(&[good.clone(), bad]).await.is_err());
    assert!(store.processed_listings(session_id).await.unwrap().is_empty());

    assert_eq!(store.insert_processed(&[good]).await.unwrap(), 1);
    let processed = store.processed_listings(session_id).await.unwrap();
    assert_eq!(processed.len(), 1);
    assert_eq!(processed[0].website_status_code, Some(200));
    assert!(processed[0].is_website_verified);
    assert!(!processed[0].is_duplicate);
}

#[tokio::test]
async fn deleting_session_cascades_to_listings() {
    let (store, _container) = setup_store().await;
    let session_id = session(&store).await;
    store
        .insert_raw(&NewRawListing {
            session_id,
            position: 0,
            listing: Listing::new("A"),
        })
        .await
        .unwrap();

    sqlx::query("DELETE FROM sessions WHERE id = $1")
        .bind(session_id)
        .execute(store.pool())
        .await
        .unwrap();

    assert!(store.raw_listings(session_id).await.unwrap().is_empty());
}

