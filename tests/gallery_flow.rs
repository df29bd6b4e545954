//! Service-level flows through the public library API.

#![allow(clippy::panic)]

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;

use gallery_gateway::app_state::AppState;
use gallery_gateway::config::GalleryConfig;
use gallery_gateway::domain::PhotoUpload;
use gallery_gateway::domain::demo::demo_events;
use gallery_gateway::error::GalleryError;
use gallery_gateway::persistence::{EventRepository, MemoryRepository};
use gallery_gateway::storage::{BucketStorage, ObjectStorage, UrlResolver};

struct Harness {
    repo: MemoryRepository,
    storage: Arc<dyn ObjectStorage>,
    state: AppState,
}

fn harness() -> Harness {
    let repo = MemoryRepository::new();
    let storage: Arc<dyn ObjectStorage> =
        Arc::new(BucketStorage::in_memory(UrlResolver::public("http://cdn.test/photos")));
    let state = AppState::new(
        Arc::new(repo.clone()),
        Arc::clone(&storage),
        &GalleryConfig::default(),
    );
    Harness {
        repo,
        storage,
        state,
    }
}

#[tokio::test]
async fn wedding_photo_round_trip() {
    let h = harness();
    let gallery = &h.state.gallery;

    let Ok(event) = gallery.create_event("Wedding", "2025-01-15", None).await else {
        panic!("create failed");
    };
    let upload = PhotoUpload::new("IMG 0001.JPG", "image/jpeg", vec![7_u8; 2 * 1024 * 1024]);
    let Ok(photo) = gallery.upload_event_photo(&event.id, upload).await else {
        panic!("upload failed");
    };
    assert!(photo.url.starts_with("http://cdn.test/photos/"));
    assert!(photo.filename.starts_with(&format!("{}/", event.id)));

    let snapshot = gallery.list_events(false).await;
    let Some(found) = snapshot.iter().find(|e| e.id == event.id) else {
        panic!("event missing from snapshot");
    };
    assert_eq!(found.photos.len(), 1);

    assert!(gallery.delete_event_photo(&event.id, &photo.id).await.is_ok());
    assert!(matches!(
        h.storage.get_object(&photo.filename).await,
        Err(GalleryError::ObjectNotFound(_))
    ));
    let Some(found) = gallery.cache().find_event(&event.id).await else {
        panic!("event missing from snapshot");
    };
    assert!(found.photos.is_empty());
}

#[tokio::test(start_paused = true)]
async fn writes_behind_the_cache_show_up_after_ttl() {
    let h = harness();
    let gallery = &h.state.gallery;
    let ttl = gallery.cache().ttl();

    assert!(gallery.list_events(false).await.is_empty());

    // A folder appears in the object store without any mutation call.
    let stored = h
        .storage
        .put_object("formatura/1-a.jpg", Bytes::from_static(b"x"), "image/jpeg")
        .await;
    assert!(stored.is_ok());

    tokio::time::advance(ttl - Duration::from_millis(1)).await;
    assert!(gallery.list_events(false).await.is_empty());

    tokio::time::advance(Duration::from_millis(2)).await;
    let snapshot = gallery.list_events(false).await;
    assert_eq!(snapshot.len(), 1);
    assert_eq!(snapshot.first().map(|e| e.name.as_str()), Some("Formatura"));
}

#[tokio::test]
async fn relational_outage_degrades_to_demo_events() {
    let h = harness();
    h.repo.set_available(false);

    let snapshot = h.state.gallery.list_events(true).await;
    assert_eq!(snapshot.as_ref(), &demo_events());

    assert!(matches!(
        h.state.gallery.create_event("Party", "2025-03-01", None).await,
        Err(GalleryError::StoreUnavailable { .. })
    ));
}

#[tokio::test]
async fn deleted_event_is_gone_from_both_stores() {
    let h = harness();
    let gallery = &h.state.gallery;
    let Ok(event) = gallery.create_event("Conference", "2024-10-05", None).await else {
        panic!("create failed");
    };
    let batch = vec![
        PhotoUpload::new("a.png", "image/png", vec![1_u8; 16]),
        PhotoUpload::new("b.webp", "image/webp", vec![2_u8; 16]),
    ];
    assert!(gallery.upload_event_photos(&event.id, batch).await.is_ok());

    assert!(gallery.delete_event(&event.id).await.is_ok());

    let Ok(rows) = h.repo.list_photos().await else {
        panic!("list failed");
    };
    assert!(rows.iter().all(|r| r.event_id != event.id));
    let Ok(listing) = h.storage.list_object_keys(&format!("{}/", event.id), None).await else {
        panic!("listing failed");
    };
    assert!(listing.keys.is_empty());
    let snapshot = gallery.list_events(true).await;
    assert!(snapshot.iter().all(|e| e.id != event.id));
}
