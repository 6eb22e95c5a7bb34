//! Roster services against a mocked data store.

use std::time::Duration;

use kennel_admin::db::RepositoryError;
use kennel_admin::services::{DogService, ServiceError};
use kennel_admin::store::MissingDogPolicy;
use kennel_core::{Dog, DogId, DogPatch, Gender, LineageError, NewDog};
use kennel_integration_tests::{Backend, day, dog, open_store, rows};
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, ResponseTemplate};

fn new_dog(name: &str) -> NewDog {
    serde_json::from_value(json!({
        "name": name,
        "breed": "Border Collie",
        "gender": "female",
        "birth_date": "2023-06-01",
        "color": "red merle"
    }))
    .unwrap()
}

#[tokio::test]
async fn test_refresh_loads_roster() {
    let backend = Backend::start().await;
    let ace = dog("Ace", Gender::Male);
    let bella = dog("Bella", Gender::Female);

    Mock::given(method("GET"))
        .and(path("/rest/v1/dogs"))
        .and(query_param("order", "created_at.asc"))
        .respond_with(rows(&[ace.clone(), bella.clone()]))
        .expect(1)
        .mount(&backend.data_store)
        .await;

    let outcome = DogService::new(&backend.data, &backend.store)
        .refresh()
        .await
        .unwrap();

    assert!(outcome.applied);
    assert_eq!(outcome.dogs, 2);
    let snapshot = backend.store.snapshot();
    assert_eq!(snapshot.dogs, vec![ace, bella]);
    assert!(!snapshot.is_loading);
    assert!(snapshot.last_error.is_none());
}

#[tokio::test]
async fn test_refresh_failure_sets_last_error_and_keeps_roster() {
    let backend = Backend::start().await;
    let ace = dog("Ace", Gender::Male);
    backend.store.write(|s| s.set_dogs(vec![ace.clone()]));

    Mock::given(method("GET"))
        .and(path("/rest/v1/dogs"))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .mount(&backend.data_store)
        .await;

    let err = DogService::new(&backend.data, &backend.store)
        .refresh()
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ServiceError::Repository(RepositoryError::Api { status: 503, .. })
    ));
    let snapshot = backend.store.snapshot();
    assert_eq!(snapshot.dogs, vec![ace]);
    assert!(!snapshot.is_loading);
    assert!(snapshot.last_error.unwrap().contains("maintenance"));
}

#[tokio::test]
async fn test_stale_refresh_is_dropped() {
    let backend = Backend::start().await;
    let ace = dog("Ace", Gender::Male);
    let bella = dog("Bella", Gender::Female);

    // The first request is answered slowly with the old roster.
    Mock::given(method("GET"))
        .and(path("/rest/v1/dogs"))
        .respond_with(rows(&[ace.clone()]).set_delay(Duration::from_millis(400)))
        .up_to_n_times(1)
        .mount(&backend.data_store)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/dogs"))
        .respond_with(rows(&[ace.clone(), bella.clone()]))
        .mount(&backend.data_store)
        .await;

    let service = DogService::new(&backend.data, &backend.store);
    let (first, second) = tokio::join!(service.refresh(), async {
        tokio::time::sleep(Duration::from_millis(100)).await;
        service.refresh().await
    });

    assert!(!first.unwrap().applied);
    assert!(second.unwrap().applied);
    let snapshot = backend.store.snapshot();
    assert_eq!(snapshot.dogs, vec![ace, bella]);
    assert!(!snapshot.is_loading);
}

#[tokio::test]
async fn test_create_adds_created_row_to_roster() {
    let backend = Backend::start().await;
    let created = dog("Clover", Gender::Female);

    Mock::given(method("POST"))
        .and(path("/rest/v1/dogs"))
        .and(body_partial_json(json!([{ "name": "Clover" }])))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([created])))
        .expect(1)
        .mount(&backend.data_store)
        .await;

    let dog = DogService::new(&backend.data, &backend.store)
        .create(&new_dog("Clover"), day(2024, 6, 1))
        .await
        .unwrap();

    assert_eq!(dog, created);
    assert_eq!(backend.store.dogs(), vec![created]);
}

#[tokio::test]
async fn test_invalid_dog_is_never_sent() {
    let backend = Backend::start().await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/dogs"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&backend.data_store)
        .await;

    let service = DogService::new(&backend.data, &backend.store);

    let err = service
        .create(&new_dog("   "), day(2024, 6, 1))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Validation(_)));

    // A dam must be female.
    let sire = dog("Rex", Gender::Male);
    backend.store.write(|s| s.set_dogs(vec![sire.clone()]));
    let mut input = new_dog("Pup");
    input.dam_id = Some(sire.id);
    let err = service.create(&input, day(2024, 6, 1)).await.unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Lineage(LineageError::DamNotFemale(id)) if id == sire.id
    ));

    assert!(backend.store.snapshot().last_error.is_none());
}

#[tokio::test]
async fn test_update_refreshes_selected_dog() {
    let backend = Backend::start().await;
    let ace = dog("Ace", Gender::Male);
    backend.store.write(|s| {
        s.set_dogs(vec![ace.clone()]);
        s.set_selected_dog(Some(ace.clone()));
    });

    let mut renamed = ace.clone();
    renamed.name = "Ace of Spades".to_string();
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/dogs"))
        .and(query_param("id", format!("eq.{}", ace.id)))
        .and(body_partial_json(json!({ "name": "Ace of Spades" })))
        .respond_with(rows(&[renamed]))
        .expect(1)
        .mount(&backend.data_store)
        .await;

    let patch = DogPatch {
        name: Some("Ace of Spades".to_string()),
        ..DogPatch::default()
    };
    DogService::new(&backend.data, &backend.store)
        .update(ace.id, &patch, day(2024, 6, 1))
        .await
        .unwrap();

    let snapshot = backend.store.snapshot();
    assert_eq!(snapshot.dogs[0].name, "Ace of Spades");
    assert_eq!(snapshot.selected_dog.unwrap().name, "Ace of Spades");

    // The selection was written through to disk.
    let restored = open_store(&backend.state_file, MissingDogPolicy::Ignore).snapshot();
    assert_eq!(restored.selected_dog.unwrap().name, "Ace of Spades");
}

#[tokio::test]
async fn test_update_of_unknown_dog_is_not_found() {
    let backend = Backend::start().await;
    let ghost = dog("Ghost", Gender::Male);

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/dogs"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&backend.data_store)
        .await;

    let patch = DogPatch {
        color: Some("grey".to_string()),
        ..DogPatch::default()
    };
    let err = DogService::new(&backend.data, &backend.store)
        .update(ghost.id, &patch, day(2024, 6, 1))
        .await
        .unwrap_err();

    assert!(matches!(err, ServiceError::DogNotFound(id) if id == ghost.id));
    assert!(backend.store.snapshot().last_error.is_none());
}

#[tokio::test]
async fn test_delete_clears_selection() {
    let backend = Backend::start().await;
    let ace = dog("Ace", Gender::Male);
    let bella = dog("Bella", Gender::Female);
    backend.store.write(|s| {
        s.set_dogs(vec![ace.clone(), bella.clone()]);
        s.set_selected_dog(Some(ace.clone()));
    });

    Mock::given(method("DELETE"))
        .and(path("/rest/v1/dogs"))
        .and(query_param("id", format!("eq.{}", ace.id)))
        .respond_with(rows(&[ace.clone()]))
        .expect(1)
        .mount(&backend.data_store)
        .await;

    DogService::new(&backend.data, &backend.store)
        .delete(ace.id)
        .await
        .unwrap();

    let snapshot = backend.store.snapshot();
    assert_eq!(snapshot.dogs, vec![bella]);
    assert!(snapshot.selected_dog.is_none());
}

#[tokio::test]
async fn test_select_fetches_dog_outside_roster() {
    let backend = Backend::start().await;
    let visitor = dog("Visitor", Gender::Female);

    Mock::given(method("GET"))
        .and(path("/rest/v1/dogs"))
        .and(query_param("id", format!("eq.{}", visitor.id)))
        .respond_with(rows(&[visitor.clone()]))
        .expect(1)
        .mount(&backend.data_store)
        .await;

    let service = DogService::new(&backend.data, &backend.store);
    let selected = service.select(Some(visitor.id)).await.unwrap();
    assert_eq!(selected, Some(visitor.clone()));
    assert_eq!(backend.store.snapshot().selected_dog, Some(visitor));
    assert!(backend.store.dogs().is_empty());

    assert_eq!(service.select(None).await.unwrap(), None);
    assert!(backend.store.snapshot().selected_dog.is_none());
}

#[tokio::test]
async fn test_cancelled_refresh_stops_loading() {
    let backend = Backend::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/dogs"))
        .respond_with(rows(&[dog("Ace", Gender::Male)]).set_delay(Duration::from_secs(5)))
        .mount(&backend.data_store)
        .await;

    let service = DogService::new(&backend.data, &backend.store);
    let cancelled = tokio::time::timeout(Duration::from_millis(200), service.refresh()).await;

    assert!(cancelled.is_err());
    let snapshot = backend.store.snapshot();
    assert!(!snapshot.is_loading);
    assert!(snapshot.dogs.is_empty());
    assert!(snapshot.last_error.is_none());
}

/// A restarted store holds the selected dog but no roster yet.
async fn restarted_with_selection(selected: &Dog) -> Backend {
    let backend = Backend::start_with_policy(MissingDogPolicy::Report).await;
    backend
        .store
        .write(|s| s.set_selected_dog(Some(selected.clone())));
    assert!(backend.store.dogs().is_empty());
    backend
}

#[tokio::test]
async fn test_delete_clears_selection_without_roster() {
    let ace = dog("Ace", Gender::Male);
    let backend = restarted_with_selection(&ace).await;

    Mock::given(method("DELETE"))
        .and(path("/rest/v1/dogs"))
        .and(query_param("id", format!("eq.{}", ace.id)))
        .respond_with(rows(&[ace.clone()]))
        .expect(1)
        .mount(&backend.data_store)
        .await;

    DogService::new(&backend.data, &backend.store)
        .delete(ace.id)
        .await
        .unwrap();

    let snapshot = backend.store.snapshot();
    assert!(snapshot.selected_dog.is_none());
    assert!(snapshot.last_error.is_none());
    let restored = open_store(&backend.state_file, MissingDogPolicy::Ignore).snapshot();
    assert!(restored.selected_dog.is_none());
}

#[tokio::test]
async fn test_update_replaces_selection_without_roster() {
    let ace = dog("Ace", Gender::Male);
    let backend = restarted_with_selection(&ace).await;

    let mut renamed = ace.clone();
    renamed.name = "Renamed".to_string();
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/dogs"))
        .and(query_param("id", format!("eq.{}", ace.id)))
        .respond_with(rows(&[renamed.clone()]))
        .expect(1)
        .mount(&backend.data_store)
        .await;

    let patch = DogPatch {
        name: Some("Renamed".to_string()),
        ..DogPatch::default()
    };
    let updated = DogService::new(&backend.data, &backend.store)
        .update(ace.id, &patch, day(2024, 6, 1))
        .await
        .unwrap();

    assert_eq!(updated, renamed);
    let snapshot = backend.store.snapshot();
    assert_eq!(snapshot.selected_dog, Some(renamed.clone()));
    assert!(snapshot.dogs.is_empty());
    assert!(snapshot.last_error.is_none());
    let restored = open_store(&backend.state_file, MissingDogPolicy::Ignore).snapshot();
    assert_eq!(restored.selected_dog, Some(renamed));
}

#[tokio::test]
async fn test_empty_patch_is_rejected() {
    let backend = Backend::start().await;
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/dogs"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&backend.data_store)
        .await;

    let err = DogService::new(&backend.data, &backend.store)
        .update(DogId::generate(), &DogPatch::default(), day(2024, 6, 1))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Validation(_)));
}
