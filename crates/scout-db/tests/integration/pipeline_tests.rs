use std::time::Duration;

use scout_core::error::AppError;
use scout_core::listing::Listing;
use scout_core::traits::{ListingSource, ListingStore, SessionStore, WebsiteVerifier};
use scout_core::{
    IngestOutcome, PipelineConfig, ProcessingStatus, SearchService, SearchStart, SessionStatus,
    TracingIngestReporter,
};
use uuid::Uuid;

use crate::integration::common::setup_store;

#[derive(Clone)]
struct FixedSource(Vec<Listing>);

impl ListingSource for FixedSource {
    async fn search(&self, _business_type: &str, _location: &str) -> Result<Vec<Listing>, AppError> {
        Ok(self.0.clone())
    }
}

/// Every site is up except the ones whose host starts with "dead".
#[derive(Clone)]
struct HostVerifier;

impl WebsiteVerifier for HostVerifier {
    async fn check(&self, url: &str) -> Result<u16, AppError> {
        if url.starts_with("https://dead") {
            Ok(404)
        } else {
            Ok(200)
        }
    }
}

fn listing(name: &str, address: &str, website: &str) -> Listing {
    Listing::new(name).with_address(address).with_website(website)
}

#[tokio::test]
async fn full_search_over_postgres() {
    let (store, _container) = setup_store().await;
    let owner = Uuid::new_v4();
    let source = FixedSource(vec![
        listing("Acme Cafe", "1 Main St", "acme.example"),
        listing(" acme cafe", "1 MAIN ST ", "acme.example"),
        listing("Bistro", "9 Elm St", "dead.example"),
    ]);
    let config = PipelineConfig::default().with_record_delay(Duration::ZERO);
    let service = SearchService::new(source, store.clone(), HostVerifier, &config);

    let SearchStart::Started { session, control } =
        service.start(owner, "Cafe", "Milano").await.unwrap()
    else {
        panic!("first search must miss the cache");
    };
    let outcome = service
        .run(&session, &control, &TracingIngestReporter)
        .await
        .unwrap();

    let IngestOutcome::Completed {
        total_records,
        summary,
    } = outcome
    else {
        panic!("expected natural completion");
    };
    assert_eq!(total_records, 3);
    assert_eq!(summary.processed, 1);
    assert_eq!(summary.duplicates_removed, 2);

    let stored = store.get_session(session.id, owner).await.unwrap().unwrap();
    assert_eq!(stored.status, SessionStatus::Completed);
    assert_eq!(stored.total_records, 3);
    assert_eq!(stored.processing_status, ProcessingStatus::Completed);
    assert_eq!(store.raw_listings(session.id).await.unwrap().len(), 3);

    let processed = store.processed_listings(session.id).await.unwrap();
    assert_eq!(processed.len(), 1);
    assert_eq!(processed[0].position, 0);

    match service.start(owner, "cafe", "milano").await.unwrap() {
        SearchStart::Cached {
            session_id,
            result_count,
        } => {
            assert_eq!(session_id, session.id);
            assert_eq!(result_count, 3);
        }
        SearchStart::Started { .. } => panic!("second search must hit the cache"),
    }
}
