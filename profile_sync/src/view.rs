//! The UI-facing aggregate: one flat record assembled from the normalized tables.
//!
//! Every field is plain data with an empty default, so an unauthenticated or
//! not-yet-loaded profile is simply `TrainerProfileView::default()`.

use serde::{Deserialize, Serialize};

/// Denormalized trainer profile the UI reads and edits.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainerProfileView {
    /// Account id.
    pub id: String,
    /// Login email (read-only).
    pub email: String,
    /// Contact phone.
    pub phone: String,
    /// Name shown on the public profile.
    pub display_name: String,
    /// Given name, carried so the profile row can be upserted whole.
    pub first_name: String,
    /// Family name, carried so the profile row can be upserted whole.
    pub last_name: String,
    /// Biography.
    pub bio: String,
    /// Avatar URL.
    pub avatar_url: String,
    /// Instagram link.
    pub instagram_url: String,
    /// Home city id from the profile row.
    pub home_city_id: Option<i32>,
    /// Experience bucket label, e.g. "6-10".
    pub experience_years: String,
    /// Response time label, e.g. "24-hours".
    pub response_time: String,
    /// Student tier label, e.g. "21-50".
    pub total_students: String,
    /// Service mode as stored.
    pub service_mode: String,
    /// Specialties, primary first.
    pub specialties: Vec<SpecialtyView>,
    /// Service cities as `"City - ST"` (or just `"City"`).
    pub cities: Vec<String>,
    /// Degrees derived from certifications.
    pub universities: Vec<CredentialView>,
    /// Courses derived from certifications.
    pub courses: Vec<CredentialView>,
    /// Gallery media, newest first.
    pub gallery: Vec<GalleryItem>,
}

/// One specialty as edited in the UI.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpecialtyView {
    /// Sport reference id.
    pub sport_id: i32,
    /// Level label.
    pub experience_level: String,
    /// Years practising this sport.
    pub years_of_experience: Option<i32>,
    /// Whether this is the headline specialty.
    pub is_primary: bool,
}

/// Display triple for a certification.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CredentialView {
    /// Degree or course name.
    pub name: String,
    /// Issuing institution.
    pub institution: String,
    /// Calendar year of issue, or `""`.
    pub year: String,
}

/// Gallery asset passthrough.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GalleryItem {
    /// Asset id.
    pub id: String,
    /// Public URL.
    pub url: String,
    /// Alt text.
    pub alt: String,
    /// Pixel width.
    pub width: Option<i32>,
    /// Pixel height.
    pub height: Option<i32>,
}

impl TrainerProfileView {
    /// Share of tracked fields that are filled in, 0–100 (rounded down).
    ///
    /// Tracked: display name, bio, avatar, phone, instagram, experience,
    /// response time, at least one specialty, city, and gallery item.
    pub fn completion_percentage(&self) -> u8 {
        let filled = [
            !self.display_name.trim().is_empty(),
            !self.bio.trim().is_empty(),
            !self.avatar_url.trim().is_empty(),
            !self.phone.trim().is_empty(),
            !self.instagram_url.trim().is_empty(),
            !self.experience_years.is_empty(),
            !self.response_time.is_empty(),
            !self.specialties.is_empty(),
            !self.cities.is_empty(),
            !self.gallery.is_empty(),
        ];
        let total = filled.len();
        let count = filled.iter().filter(|f| **f).count();
        (count * 100 / total) as u8
    }

    /// The specialty flagged primary, if any.
    pub fn primary_specialty(&self) -> Option<&SpecialtyView> {
        self.specialties.iter().find(|s| s.is_primary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_profile_is_zero_percent() {
        assert_eq!(TrainerProfileView::default().completion_percentage(), 0);
    }

    #[test]
    fn completion_counts_populated_fields() {
        let view = TrainerProfileView {
            display_name: "Ana".into(),
            bio: "Coach".into(),
            phone: "  ".into(),
            experience_years: "3-5".into(),
            cities: vec!["Rio de Janeiro - RJ".into()],
            ..Default::default()
        };
        assert_eq!(view.completion_percentage(), 40);
    }
}
