//! Stateful owner of one trainer's editable profile.
//!
//! Lifecycle:
//!
//! ```text
//! Idle ──load──▶ Loading ──▶ Ready(clean) ⇄ Ready(dirty) ──save──▶ Saving ──▶ Ready(clean)
//!                   │                                                 │
//!                   └──────────────▶ Error ◀─────────────────────────┘
//! ```
//!
//! - A profile is loaded once per user; loading the same user again is a no-op
//!   until [`ProfileSynchronizer::refetch`]. Switching users clears everything.
//! - Edits touch only the live aggregate. "Dirty" means the live aggregate
//!   differs from the snapshot taken at the last load or successful save.
//! - Every operation takes `&mut self`, so a second load or save cannot start
//!   while one is in flight.
//! - A pending city sync from the previous save is awaited before any read, so
//!   a reload always sees the cities that save wrote.

use std::sync::Arc;

use tracing::{debug, instrument, warn};

use crate::{
    config::SyncConfig,
    error::{FieldError, StoreError},
    models::UserId,
    reader::{ReadOptions, load_raw},
    resolver::CityResolver,
    store::ProfileStore,
    transform::{TransformConfig, to_view},
    view::TrainerProfileView,
    writer::{CitySyncHandle, save_profile},
};

/// Where the synchronizer is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No user, nothing loaded.
    Idle,
    /// Reading from the store.
    Loading,
    /// Loaded; the aggregate may be dirty.
    Ready,
    /// Writing to the store.
    Saving,
    /// The last load or save failed. The aggregate holds whatever was there.
    Error,
}

/// Read-only view of the synchronizer for the UI.
#[derive(Debug, Clone, Copy)]
pub struct ProfileState<'a> {
    /// Live aggregate.
    pub data: &'a TrainerProfileView,
    /// Lifecycle phase.
    pub phase: Phase,
    /// User-facing message of the last failure.
    pub error: Option<&'a str>,
    /// Live aggregate differs from the snapshot.
    pub is_dirty: bool,
    /// Completion of the live aggregate, 0–100.
    pub completion_percentage: u8,
}

impl ProfileState<'_> {
    /// A load is in progress.
    pub fn loading(&self) -> bool {
        self.phase == Phase::Loading
    }

    /// A save is in progress.
    pub fn saving(&self) -> bool {
        self.phase == Phase::Saving
    }
}

/// Load-once, edit, save, reset.
pub struct ProfileSynchronizer {
    store: Arc<dyn ProfileStore>,
    resolver: Arc<CityResolver>,
    read_opts: ReadOptions,
    transform: TransformConfig,
    user: Option<UserId>,
    loaded: bool,
    data: TrainerProfileView,
    snapshot: TrainerProfileView,
    phase: Phase,
    error: Option<String>,
    city_sync: Option<CitySyncHandle>,
}

impl std::fmt::Debug for ProfileSynchronizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProfileSynchronizer")
            .field("user", &self.user)
            .field("phase", &self.phase)
            .field("loaded", &self.loaded)
            .field("dirty", &self.is_dirty())
            .finish_non_exhaustive()
    }
}

impl ProfileSynchronizer {
    /// Synchronizer over `store`, configured from `cfg`.
    pub fn new(store: Arc<dyn ProfileStore>, cfg: &SyncConfig) -> Self {
        let resolver = Arc::new(CityResolver::new(Arc::clone(&store), cfg.state_cache_ttl()));
        Self {
            store,
            resolver,
            read_opts: ReadOptions::from(cfg),
            transform: TransformConfig::from(cfg),
            user: None,
            loaded: false,
            data: TrainerProfileView::default(),
            snapshot: TrainerProfileView::default(),
            phase: Phase::Idle,
            error: None,
            city_sync: None,
        }
    }

    /// The resolver used by saves, shared with their city syncs.
    pub fn resolver(&self) -> &Arc<CityResolver> {
        &self.resolver
    }

    /// Current user, if any.
    pub fn user(&self) -> Option<&UserId> {
        self.user.as_ref()
    }

    /// Live aggregate.
    pub fn data(&self) -> &TrainerProfileView {
        &self.data
    }

    /// Live aggregate differs from the snapshot.
    pub fn is_dirty(&self) -> bool {
        self.data != self.snapshot
    }

    /// Everything the UI renders from.
    pub fn state(&self) -> ProfileState<'_> {
        ProfileState {
            data: &self.data,
            phase: self.phase,
            error: self.error.as_deref(),
            is_dirty: self.is_dirty(),
            completion_percentage: self.data.completion_percentage(),
        }
    }

    /// Load `user`'s profile unless it is already loaded.
    #[instrument(skip_all, fields(user = %user))]
    pub async fn load(&mut self, user: UserId) -> Result<(), StoreError> {
        if self.user.as_ref() != Some(&user) {
            if self.user.is_some() {
                debug!("switching user; clearing state");
            }
            self.clear();
            self.user = Some(user.clone());
        }
        if self.loaded {
            debug!("already loaded");
            return Ok(());
        }

        self.phase = Phase::Loading;
        self.settle_city_sync().await;

        match load_raw(self.store.as_ref(), &user, &self.read_opts).await {
            Ok(raw) => {
                let view = to_view(&raw, &self.transform);
                self.snapshot = view.clone();
                self.data = view;
                self.loaded = true;
                self.phase = Phase::Ready;
                self.error = None;
                Ok(())
            }
            Err(err) => {
                warn!(error = %err, "profile load failed");
                self.phase = Phase::Error;
                self.error = Some(err.user_message());
                Err(err)
            }
        }
    }

    /// Drop the load guard and read the current user's profile again.
    #[instrument(skip_all)]
    pub async fn refetch(&mut self) -> Result<(), StoreError> {
        let Some(user) = self.user.clone() else {
            return Ok(());
        };
        self.loaded = false;
        self.load(user).await
    }

    /// Set the value at a dot path (`"bio"`, `"specialties.0.is_primary"`).
    ///
    /// The aggregate is untouched when the path does not exist or the value
    /// has the wrong type.
    pub fn update_field(&mut self, path: &str, value: serde_json::Value) -> Result<(), FieldError> {
        let invalid = |source| FieldError::InvalidValue {
            path: path.to_string(),
            source,
        };
        let mut root = serde_json::to_value(&self.data).map_err(invalid)?;

        let mut slot = &mut root;
        for segment in path.split('.') {
            slot = match slot {
                serde_json::Value::Object(map) if !segment.is_empty() => map.get_mut(segment),
                serde_json::Value::Array(items) => {
                    segment.parse::<usize>().ok().and_then(|i| items.get_mut(i))
                }
                _ => None,
            }
            .ok_or_else(|| FieldError::UnknownPath(path.to_string()))?;
        }
        *slot = value;

        self.data = serde_json::from_value(root).map_err(invalid)?;
        Ok(())
    }

    /// Persist the live aggregate. On success the snapshot is rebased and the
    /// city sync is kept as pending; on failure the message is in
    /// [`ProfileState::error`].
    ///
    /// Refused without touching the store until a load has succeeded.
    #[instrument(skip_all, fields(user = ?self.user))]
    pub async fn save(&mut self) -> bool {
        // the aggregate is a placeholder until a load succeeds
        let Some(user) = self.user.clone().filter(|_| self.loaded) else {
            warn!("save refused: no profile loaded");
            self.error = Some("no profile loaded".to_string());
            return false;
        };

        self.phase = Phase::Saving;
        self.settle_city_sync().await;

        match save_profile(&self.store, &self.resolver, &self.data, &user).await {
            Ok(saved) => {
                self.snapshot = self.data.clone();
                self.city_sync = Some(saved.city_sync);
                self.phase = Phase::Ready;
                self.error = None;
                true
            }
            Err(err) => {
                self.phase = Phase::Error;
                self.error = Some(err.user_message());
                false
            }
        }
    }

    /// Discard edits.
    pub fn reset(&mut self) {
        self.data = self.snapshot.clone();
        self.error = None;
        self.phase = if self.loaded { Phase::Ready } else { Phase::Idle };
    }

    /// Forget the user and return to [`Phase::Idle`]. A running city sync is
    /// left to finish on its own.
    pub fn sign_out(&mut self) {
        self.clear();
        self.user = None;
    }

    /// Hand the pending city sync to the caller.
    pub fn take_city_sync(&mut self) -> Option<CitySyncHandle> {
        self.city_sync.take()
    }

    fn clear(&mut self) {
        self.loaded = false;
        self.data = TrainerProfileView::default();
        self.snapshot = TrainerProfileView::default();
        self.phase = Phase::Idle;
        self.error = None;
        self.city_sync = None;
    }

    async fn settle_city_sync(&mut self) {
        if let Some(handle) = self.city_sync.take() {
            if !handle.is_finished() {
                debug!(inputs = handle.inputs().len(), "waiting for pending city sync");
            }
            let report = handle.wait().await;
            debug!(
                resolved = report.resolved.len(),
                skipped = report.skipped.len(),
                ok = report.is_ok(),
                "pending city sync settled"
            );
        }
    }
}
