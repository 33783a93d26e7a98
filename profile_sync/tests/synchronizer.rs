use std::sync::Arc;

use profile_sync::config::SyncConfig;
use profile_sync::error::StoreError;
use profile_sync::models::{
    CertificationRow, CityRow, IdentityRow, ProfileRow, SpecialtyRow, StateRow, TrainerProfileRow, UserId,
};
use profile_sync::store::memory::{MemoryStore, Op};
use profile_sync::synchronizer::{Phase, ProfileSynchronizer};
use profile_sync::view::TrainerProfileView;
use serde_json::json;

async fn seeded_store() -> Arc<MemoryStore> {
    let store = Arc::new(MemoryStore::new());
    store
        .put_identity(IdentityRow {
            id: "u1".into(),
            email: "ana@example.com".into(),
            phone: Some("+55 21 98888-0000".into()),
        })
        .await;
    store
        .put_profile(ProfileRow {
            user_id: "u1".into(),
            first_name: Some("Ana".into()),
            last_name: Some("Souza".into()),
            bio: Some("Coach".into()),
            ..Default::default()
        })
        .await;
    store
        .put_trainer_profile(TrainerProfileRow {
            user_id: "u1".into(),
            experience_years: Some(7),
            response_time_hours: Some(24),
            total_students: Some(42),
            service_mode: Some("online".into()),
        })
        .await;
    store
        .put_specialty(SpecialtyRow {
            trainer_id: "u1".into(),
            sport_id: 1,
            experience_level: "advanced".into(),
            years_of_experience: Some(6),
            is_primary: true,
        })
        .await;
    store
        .put_state(StateRow {
            id: 1,
            code: "RJ".into(),
            name: "Rio de Janeiro".into(),
        })
        .await;
    store
        .put_city(CityRow {
            id: 1,
            name: "Rio de Janeiro".into(),
            state_id: 1,
        })
        .await;
    store.put_service_city("u1", 1).await;
    store
}

fn synchronizer(store: &Arc<MemoryStore>) -> ProfileSynchronizer {
    ProfileSynchronizer::new(store.clone(), &SyncConfig::default())
}

#[tokio::test]
async fn load_runs_once_per_user_until_refetch() {
    let store = seeded_store().await;
    let mut sync = synchronizer(&store);

    sync.load(UserId::from("u1")).await.unwrap();
    sync.load(UserId::from("u1")).await.unwrap();
    assert_eq!(store.calls(Op::FetchIdentity), 1);
    assert_eq!(store.calls(Op::FetchGallery), 1);

    sync.refetch().await.unwrap();
    assert_eq!(store.calls(Op::FetchIdentity), 2);
    assert_eq!(store.calls(Op::FetchSpecialties), 2);

    let state = sync.state();
    assert_eq!(state.phase, Phase::Ready);
    assert_eq!(state.data.display_name, "Ana Souza");
    assert_eq!(state.data.experience_years, "6-10");
    assert_eq!(state.data.cities, vec!["Rio de Janeiro - RJ"]);
    assert!(!state.loading() && !state.saving());
}

#[tokio::test]
async fn certifications_split_into_degrees_and_courses() {
    let store = seeded_store().await;
    for (id, name, date, category) in [
        (1, "Faculdade de Educação Física", Some("2019-12-01"), None),
        (2, "Licenciatura", None, Some("university")),
        (3, "Personal Trainer Level 2", Some("2022-03-10"), None),
        (4, "University of Nowhere Workshop", Some("2020-06-01"), Some("course")),
    ] {
        store
            .put_certification(CertificationRow {
                id,
                trainer_id: "u1".into(),
                name: name.into(),
                institution: Some("USP".into()),
                issue_date: date.map(String::from),
                category: category.map(String::from),
            })
            .await;
    }
    let mut sync = synchronizer(&store);
    sync.load(UserId::from("u1")).await.unwrap();

    let names = |creds: &[profile_sync::view::CredentialView]| {
        creds
            .iter()
            .map(|c| (c.name.clone(), c.year.clone()))
            .collect::<Vec<_>>()
    };
    assert_eq!(
        names(&sync.data().universities),
        vec![
            ("Faculdade de Educação Física".to_string(), "2019".to_string()),
            ("Licenciatura".to_string(), String::new()),
        ]
    );
    assert_eq!(
        names(&sync.data().courses),
        vec![
            ("Personal Trainer Level 2".to_string(), "2022".to_string()),
            ("University of Nowhere Workshop".to_string(), "2020".to_string()),
        ]
    );
}

#[tokio::test]
async fn switching_user_clears_state() {
    let store = seeded_store().await;
    let mut sync = synchronizer(&store);
    sync.load(UserId::from("u1")).await.unwrap();
    sync.update_field("bio", json!("edited")).unwrap();

    sync.load(UserId::from("u2")).await.unwrap();
    assert_eq!(store.calls(Op::FetchIdentity), 2);
    assert_eq!(sync.data(), &TrainerProfileView::default());
    assert!(!sync.is_dirty());

    sync.sign_out();
    assert_eq!(sync.state().phase, Phase::Idle);
    assert!(sync.user().is_none());
}

#[tokio::test]
async fn failed_load_reports_and_allows_retry() {
    let store = seeded_store().await;
    store.fail(Op::FetchCertifications, StoreError::Query("disk I/O error".into()));
    let mut sync = synchronizer(&store);

    assert!(sync.load(UserId::from("u1")).await.is_err());
    assert_eq!(sync.state().phase, Phase::Error);
    assert_eq!(sync.state().error, Some("disk I/O error"));

    store.heal(Op::FetchCertifications);
    sync.load(UserId::from("u1")).await.unwrap();
    assert_eq!(sync.state().phase, Phase::Ready);
    assert_eq!(sync.state().error, None);
}

#[tokio::test]
async fn save_after_failed_load_writes_nothing() {
    let store = seeded_store().await;
    store.fail(Op::FetchGallery, StoreError::Query("disk I/O error".into()));
    let mut sync = synchronizer(&store);
    assert!(sync.load(UserId::from("u1")).await.is_err());
    store.heal(Op::FetchGallery);

    sync.update_field("bio", json!("typed while the load was failing")).unwrap();
    assert!(!sync.save().await);
    assert_eq!(sync.state().error, Some("no profile loaded"));
    assert!(sync.take_city_sync().is_none());

    for op in [
        Op::UpdateIdentity,
        Op::UpsertProfile,
        Op::UpsertTrainerProfile,
        Op::ReplaceSpecialties,
        Op::ReplaceServiceCities,
    ] {
        assert_eq!(store.calls(op), 0, "{op:?}");
    }
    assert_eq!(
        store.identity("u1").await.and_then(|i| i.phone).as_deref(),
        Some("+55 21 98888-0000")
    );
    assert_eq!(store.service_city_ids("u1").await, vec![1]);

    // a successful retry unlocks saving again
    sync.refetch().await.unwrap();
    assert!(sync.save().await);
}

#[tokio::test]
async fn reset_restores_the_loaded_snapshot() {
    let store = seeded_store().await;
    let mut sync = synchronizer(&store);
    sync.load(UserId::from("u1")).await.unwrap();
    let loaded = sync.data().clone();

    sync.update_field("bio", json!("Strength coach")).unwrap();
    sync.update_field("specialties.0.is_primary", json!(false)).unwrap();
    assert!(sync.is_dirty());

    sync.reset();
    assert_eq!(sync.data(), &loaded);
    assert!(!sync.is_dirty());
    assert_eq!(store.calls(Op::UpsertProfile), 0, "edits never touch the store");
}

#[tokio::test]
async fn save_rebases_the_snapshot() {
    let store = seeded_store().await;
    let mut sync = synchronizer(&store);
    sync.load(UserId::from("u1")).await.unwrap();

    sync.update_field("bio", json!("Strength coach")).unwrap();
    assert!(sync.save().await);
    assert!(!sync.is_dirty());

    sync.reset();
    assert_eq!(sync.data().bio, "Strength coach");
    let report = sync.take_city_sync().expect("pending city sync").wait().await;
    assert!(report.is_ok());
    assert_eq!(store.profile("u1").await.and_then(|p| p.bio).as_deref(), Some("Strength coach"));
}

#[tokio::test]
async fn profile_failure_keeps_other_sections_committed() {
    let store = seeded_store().await;
    let mut sync = synchronizer(&store);
    sync.load(UserId::from("u1")).await.unwrap();

    sync.update_field("phone", json!("+55 21 97777-1111")).unwrap();
    sync.update_field("bio", json!("new bio")).unwrap();
    sync.update_field("experience_years", json!("over-10")).unwrap();

    store.fail(Op::UpsertProfile, StoreError::InvalidInput("bad city id".into()));
    assert!(!sync.save().await);

    let state = sync.state();
    assert_eq!(state.phase, Phase::Error);
    assert_eq!(state.error, Some("problem with location data, check selected cities"));
    assert!(state.is_dirty, "a failed save keeps the edits");

    // no rollback: identity and trainer profile committed, profile did not
    assert_eq!(
        store.identity("u1").await.and_then(|i| i.phone).as_deref(),
        Some("+55 21 97777-1111")
    );
    assert_eq!(
        store.trainer_profile("u1").await.and_then(|t| t.experience_years),
        Some(15)
    );
    assert_eq!(store.profile("u1").await.and_then(|p| p.bio).as_deref(), Some("Coach"));
    assert_eq!(store.calls(Op::ReplaceSpecialties), 0);
    assert!(sync.take_city_sync().is_none());
}

#[tokio::test]
async fn several_failed_sections_are_counted() {
    let store = seeded_store().await;
    let mut sync = synchronizer(&store);
    sync.load(UserId::from("u1")).await.unwrap();

    store.fail(Op::UpdateIdentity, StoreError::Query("timeout".into()));
    store.fail(Op::UpsertTrainerProfile, StoreError::UniqueViolation("x".into()));
    assert!(!sync.save().await);
    assert_eq!(
        sync.state().error,
        Some(
            "failed to save 2 of 3 profile sections: identity (timeout), \
             trainer profile (duplicate data, try again)"
        )
    );
}

#[tokio::test]
async fn bucketed_fields_round_trip_through_the_store() {
    let store = seeded_store().await;
    let mut first = synchronizer(&store);
    first.load(UserId::from("u1")).await.unwrap();
    let before = first.data().clone();

    // write back exactly what was read
    assert!(first.save().await);
    first.take_city_sync().expect("city sync").wait().await;

    let mut second = synchronizer(&store);
    second.load(UserId::from("u1")).await.unwrap();
    let after = second.data();
    assert_eq!(after.experience_years, before.experience_years);
    assert_eq!(after.response_time, before.response_time);
    assert_eq!(after.total_students, before.total_students);
    assert_eq!(after.specialties, before.specialties);
    assert_eq!(after.phone, before.phone);
    assert_eq!(after.bio, before.bio);
    assert_eq!(after.cities, before.cities);
}

#[tokio::test]
async fn refetch_waits_for_the_city_sync() {
    let store = seeded_store().await;
    store.slow(Op::ReplaceServiceCities, std::time::Duration::from_millis(50));
    let mut sync = synchronizer(&store);
    sync.load(UserId::from("u1")).await.unwrap();

    sync.update_field("cities", json!(["Niterói - RJ", "Rio de Janeiro - RJ"]))
        .unwrap();
    assert!(sync.save().await);
    sync.refetch().await.unwrap();

    assert_eq!(sync.data().cities, vec!["Rio de Janeiro - RJ", "Niterói - RJ"]);
    assert_eq!(store.service_city_ids("u1").await, vec![1, 2]);
}
