//! Concurrent read of every table that makes up one trainer profile.

use tracing::debug;

use crate::{
    config::SyncConfig,
    error::{StoreError, StoreResult},
    models::{
        CertificationRow, GalleryRow, IdentityRow, ProfileRow, ServiceCityRow, SpecialtyRow,
        TrainerProfileRow, UserId,
    },
    store::ProfileStore,
};

/// Raw rows for one trainer, exactly as the store returned them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawProfile {
    /// Identity row, if present.
    pub identity: Option<IdentityRow>,
    /// Profile row, if present.
    pub profile: Option<ProfileRow>,
    /// Trainer profile row, if present.
    pub trainer_profile: Option<TrainerProfileRow>,
    /// Specialties, primary first.
    pub specialties: Vec<SpecialtyRow>,
    /// Service cities joined with names.
    pub service_cities: Vec<ServiceCityRow>,
    /// Gallery assets, newest first.
    pub gallery: Vec<GalleryRow>,
    /// Certifications, newest first, undated last.
    pub certifications: Vec<CertificationRow>,
}

/// Options the reader needs from [`SyncConfig`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadOptions {
    /// Maximum gallery rows.
    pub gallery_limit: i64,
    /// Gallery storage prefix (without the user id).
    pub gallery_prefix: String,
}

impl Default for ReadOptions {
    fn default() -> Self {
        ReadOptions::from(&SyncConfig::default())
    }
}

impl From<&SyncConfig> for ReadOptions {
    fn from(cfg: &SyncConfig) -> Self {
        Self {
            gallery_limit: cfg.gallery_limit,
            gallery_prefix: cfg.gallery_prefix.clone(),
        }
    }
}

impl ReadOptions {
    /// `"{prefix}/{user}/"`, the path every gallery asset of `user` starts with.
    pub fn gallery_path(&self, user: &UserId) -> String {
        if self.gallery_prefix.is_empty() {
            format!("{user}/")
        } else {
            format!("{}/{user}/", self.gallery_prefix)
        }
    }
}

/// Absence is a valid outcome for a single-row read.
fn optional<T>(res: StoreResult<T>) -> StoreResult<Option<T>> {
    match res {
        Ok(row) => Ok(Some(row)),
        Err(StoreError::NotFound) => Ok(None),
        Err(err) => Err(err),
    }
}

/// Issue all seven reads at once and wait for every one.
///
/// The first error other than "not found" aborts the load.
pub async fn load_raw(
    store: &dyn ProfileStore,
    user: &UserId,
    opts: &ReadOptions,
) -> StoreResult<RawProfile> {
    let gallery_path = opts.gallery_path(user);
    let (identity, profile, trainer_profile, specialties, service_cities, gallery, certifications) =
        tokio::try_join!(
            async { optional(store.fetch_identity(user).await) },
            async { optional(store.fetch_profile(user).await) },
            async { optional(store.fetch_trainer_profile(user).await) },
            store.fetch_specialties(user),
            store.fetch_service_cities(user),
            store.fetch_gallery(user, &gallery_path, opts.gallery_limit),
            store.fetch_certifications(user),
        )?;

    debug!(
        user = %user,
        has_profile = profile.is_some(),
        specialties = specialties.len(),
        cities = service_cities.len(),
        gallery = gallery.len(),
        certifications = certifications.len(),
        "loaded raw profile"
    );

    Ok(RawProfile {
        identity,
        profile,
        trainer_profile,
        specialties,
        service_cities,
        gallery,
        certifications,
    })
}
