//! The save protocol.
//!
//! 1. split the aggregate into table patches ([`crate::transform::to_schema`])
//! 2. write identity, profile and trainer profile concurrently; all three
//!    settle, and any failure fails the save without undoing the others
//! 3. replace the specialty set (fatal on error)
//! 4. spawn the city sync: resolve each free-text city in order, then replace
//!    the service-city set. Its failures are logged and reported through the
//!    returned [`CitySyncHandle`], never through the save result.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::{
    error::{SaveError, Section, StoreError},
    models::UserId,
    resolver::CityResolver,
    store::{CityDiff, ProfileStore, SpecialtyDiff},
    transform::to_schema,
    view::TrainerProfileView,
};

/// What a successful save changed, plus the still-running city sync.
#[derive(Debug)]
pub struct SavedProfile {
    /// Statements applied to the specialty set.
    pub specialties: SpecialtyDiff,
    /// Background city resolution and replace.
    pub city_sync: CitySyncHandle,
}

/// Outcome of one city sync run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CitySyncReport {
    /// Inputs that resolved, with their city id, in input order.
    pub resolved: Vec<(String, i32)>,
    /// Inputs that could not be resolved.
    pub skipped: Vec<String>,
    /// Changes applied to the service-city set, if the replace ran.
    pub diff: Option<CityDiff>,
    /// Why the replace failed, if it did.
    pub error: Option<StoreError>,
}

impl CitySyncReport {
    /// True when the replace committed.
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    /// Resolved city ids in input order.
    pub fn city_ids(&self) -> Vec<i32> {
        self.resolved.iter().map(|(_, id)| *id).collect()
    }
}

/// Handle on a detached city sync.
///
/// Dropping the handle does not cancel the sync.
pub struct CitySyncHandle {
    store: Arc<dyn ProfileStore>,
    resolver: Arc<CityResolver>,
    user: UserId,
    inputs: Vec<String>,
    task: JoinHandle<CitySyncReport>,
}

impl std::fmt::Debug for CitySyncHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CitySyncHandle")
            .field("user", &self.user)
            .field("inputs", &self.inputs)
            .field("finished", &self.task.is_finished())
            .finish_non_exhaustive()
    }
}

impl CitySyncHandle {
    /// Start a city sync for `user` on the current tokio runtime.
    pub fn spawn(
        store: Arc<dyn ProfileStore>,
        resolver: Arc<CityResolver>,
        user: UserId,
        inputs: Vec<String>,
    ) -> Self {
        let task = tokio::spawn(run_city_sync(
            Arc::clone(&store),
            Arc::clone(&resolver),
            user.clone(),
            inputs.clone(),
        ));
        Self {
            store,
            resolver,
            user,
            inputs,
            task,
        }
    }

    /// The free-text cities this sync was started with.
    pub fn inputs(&self) -> &[String] {
        &self.inputs
    }

    /// True once the sync has completed (successfully or not).
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for the sync and return its report.
    pub async fn wait(self) -> CitySyncReport {
        match self.task.await {
            Ok(report) => report,
            Err(join) => CitySyncReport {
                error: Some(StoreError::from(join)),
                ..Default::default()
            },
        }
    }

    /// Start another run with the same inputs.
    pub fn retry(&self) -> CitySyncHandle {
        CitySyncHandle::spawn(
            Arc::clone(&self.store),
            Arc::clone(&self.resolver),
            self.user.clone(),
            self.inputs.clone(),
        )
    }
}

async fn run_city_sync(
    store: Arc<dyn ProfileStore>,
    resolver: Arc<CityResolver>,
    user: UserId,
    inputs: Vec<String>,
) -> CitySyncReport {
    let mut report = CitySyncReport::default();
    for raw in inputs {
        match resolver.resolve_city(&raw).await {
            Some(id) => report.resolved.push((raw, id)),
            None => {
                warn!(user = %user, city = %raw, "skipping unresolved city");
                report.skipped.push(raw);
            }
        }
    }

    match store.replace_service_cities(&user, &report.city_ids()).await {
        Ok(diff) => {
            info!(user = %user, changes = diff.len(), "service cities saved");
            report.diff = Some(diff);
        }
        Err(err) => {
            warn!(user = %user, error = %err, "saving service cities failed");
            report.error = Some(err);
        }
    }
    report
}

/// Persist `view` for `user`.
pub async fn save_profile(
    store: &Arc<dyn ProfileStore>,
    resolver: &Arc<CityResolver>,
    view: &TrainerProfileView,
    user: &UserId,
) -> Result<SavedProfile, SaveError> {
    let patch = to_schema(view, user);

    let (identity, profile, trainer_profile) = tokio::join!(
        store.update_identity(user, &patch.identity),
        store.upsert_profile(&patch.profile),
        store.upsert_trainer_profile(&patch.trainer_profile),
    );
    let outcomes = [
        (Section::Identity, identity),
        (Section::Profile, profile),
        (Section::TrainerProfile, trainer_profile),
    ];
    let total = outcomes.len();
    let failures: Vec<(Section, StoreError)> = outcomes
        .into_iter()
        .filter_map(|(section, res)| res.err().map(|e| (section, e)))
        .collect();
    if !failures.is_empty() {
        let err = SaveError::Sections {
            failed: failures.len(),
            total,
            failures,
        };
        error!(user = %user, error = %err, "profile save failed");
        return Err(err);
    }

    let specialties = store
        .replace_specialties(user, &patch.specialties)
        .await
        .map_err(|e| {
            error!(user = %user, error = %e, "specialty replace failed");
            SaveError::Specialties(e)
        })?;

    let city_sync = CitySyncHandle::spawn(
        Arc::clone(store),
        Arc::clone(resolver),
        user.clone(),
        view.cities.clone(),
    );
    info!(user = %user, specialty_changes = specialties.len(), "profile saved");

    Ok(SavedProfile {
        specialties,
        city_sync,
    })
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::models::{CityRow, IdentityRow, StateRow};
    use crate::store::memory::{MemoryStore, Op};

    async fn fixture() -> (Arc<MemoryStore>, Arc<dyn ProfileStore>, Arc<CityResolver>) {
        let mem = Arc::new(MemoryStore::new());
        mem.put_identity(IdentityRow {
            id: "u1".into(),
            email: "u1@example.com".into(),
            phone: None,
        })
        .await;
        mem.put_state(StateRow {
            id: 1,
            code: "RJ".into(),
            name: "Rio de Janeiro".into(),
        })
        .await;
        mem.put_city(CityRow {
            id: 1,
            name: "Rio de Janeiro".into(),
            state_id: 1,
        })
        .await;
        let store: Arc<dyn ProfileStore> = mem.clone();
        let resolver = Arc::new(CityResolver::new(store.clone(), Duration::from_secs(60)));
        (mem, store, resolver)
    }

    #[tokio::test]
    async fn city_sync_reports_skips_and_retries() {
        let (mem, store, resolver) = fixture().await;
        mem.fail(Op::ReplaceServiceCities, StoreError::Query("locked".into()));
        let view = TrainerProfileView {
            cities: vec!["Rio de Janeiro - RJ".into(), "Atlantis - XX".into()],
            ..Default::default()
        };
        let saved = save_profile(&store, &resolver, &view, &UserId::from("u1"))
            .await
            .expect("city failures never fail the save");

        assert_eq!(saved.city_sync.inputs(), &view.cities[..]);
        let first = saved.city_sync.retry();
        assert_eq!(first.inputs(), saved.city_sync.inputs());
        let report = saved.city_sync.wait().await;
        assert_eq!(report.resolved, vec![("Rio de Janeiro - RJ".to_string(), 1)]);
        assert_eq!(report.skipped, vec!["Atlantis - XX".to_string()]);
        assert_eq!(report.error, Some(StoreError::Query("locked".into())));
        assert!(first.wait().await.error.is_some());

        mem.heal(Op::ReplaceServiceCities);
        let saved = save_profile(&store, &resolver, &view, &UserId::from("u1"))
            .await
            .unwrap();
        let report = saved.city_sync.wait().await;
        assert!(report.is_ok());
        assert_eq!(mem.service_city_ids("u1").await, vec![1]);
    }

    #[tokio::test]
    async fn specialty_failure_is_fatal_and_skips_cities() {
        let (mem, store, resolver) = fixture().await;
        mem.fail(Op::ReplaceSpecialties, StoreError::ForeignKeyViolation("sport".into()));
        let err = save_profile(&store, &resolver, &TrainerProfileView::default(), &UserId::from("u1"))
            .await
            .unwrap_err();
        assert_eq!(err.user_message(), "invalid reference in submitted data");
        assert_eq!(mem.calls(Op::ReplaceServiceCities), 0);
    }
}
