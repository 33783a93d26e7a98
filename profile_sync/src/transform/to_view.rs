use chrono::{Datelike, NaiveDate};

use super::TransformConfig;
use crate::{
    bucket::{EXPERIENCE_YEARS, TOTAL_STUDENTS, response_time_label},
    models::{CertificationRow, IdentityRow, ProfileRow, ServiceCityRow},
    reader::RawProfile,
    view::{CredentialView, GalleryItem, SpecialtyView, TrainerProfileView},
};

/// Build the aggregate from raw rows.
pub fn to_view(raw: &RawProfile, cfg: &TransformConfig) -> TrainerProfileView {
    let profile = raw.profile.as_ref();
    let trainer = raw.trainer_profile.as_ref();
    let text = |v: Option<&Option<String>>| v.and_then(|s| s.clone()).unwrap_or_default();

    let (universities, courses) = split_certifications(&raw.certifications, cfg);

    TrainerProfileView {
        id: raw.identity.as_ref().map(|i| i.id.clone()).unwrap_or_default(),
        email: raw.identity.as_ref().map(|i| i.email.clone()).unwrap_or_default(),
        phone: raw
            .identity
            .as_ref()
            .and_then(|i| i.phone.clone())
            .unwrap_or_default(),
        display_name: display_name(profile, raw.identity.as_ref()),
        first_name: text(profile.map(|p| &p.first_name)),
        last_name: text(profile.map(|p| &p.last_name)),
        bio: text(profile.map(|p| &p.bio)),
        avatar_url: text(profile.map(|p| &p.avatar_url)),
        instagram_url: text(profile.map(|p| &p.instagram_url)),
        home_city_id: profile.and_then(|p| p.city_id),
        experience_years: EXPERIENCE_YEARS.label_for_opt(trainer.and_then(|t| t.experience_years)),
        response_time: response_time_label(trainer.and_then(|t| t.response_time_hours)),
        total_students: TOTAL_STUDENTS.label_for_opt(trainer.and_then(|t| t.total_students)),
        service_mode: text(trainer.map(|t| &t.service_mode)),
        specialties: raw
            .specialties
            .iter()
            .map(|s| SpecialtyView {
                sport_id: s.sport_id,
                experience_level: s.experience_level.clone(),
                years_of_experience: s.years_of_experience,
                is_primary: s.is_primary,
            })
            .collect(),
        cities: raw.service_cities.iter().filter_map(city_label).collect(),
        universities,
        courses,
        gallery: raw
            .gallery
            .iter()
            .map(|g| GalleryItem {
                id: g.id.clone(),
                url: g.url.clone(),
                alt: g.alt.clone().unwrap_or_default(),
                width: g.width,
                height: g.height,
            })
            .collect(),
    }
}

/// Name shown on the profile.
///
/// Explicit display name, else `"first last"`, else the email's local part, else `""`.
pub fn display_name(profile: Option<&ProfileRow>, identity: Option<&IdentityRow>) -> String {
    let non_blank = |s: &Option<String>| {
        s.as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };

    if let Some(name) = profile.and_then(|p| non_blank(&p.display_name)) {
        return name;
    }
    if let Some(p) = profile {
        let full = [non_blank(&p.first_name), non_blank(&p.last_name)]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join(" ");
        if !full.is_empty() {
            return full;
        }
    }
    identity
        .and_then(|i| i.email.split('@').next())
        .map(str::trim)
        .unwrap_or_default()
        .to_string()
}

/// Calendar year of a `YYYY-MM-DD` (or RFC3339) date; `""` when absent or unparseable.
pub fn issue_year(date: Option<&str>) -> String {
    date.and_then(|d| d.get(..10))
        .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
        .map(|d| d.year().to_string())
        .unwrap_or_default()
}

fn city_label(row: &ServiceCityRow) -> Option<String> {
    let city = row.city_name.as_deref().map(str::trim).filter(|c| !c.is_empty())?;
    Some(match row.state_code.as_deref().map(str::trim) {
        Some(code) if !code.is_empty() => format!("{city} - {code}"),
        _ => city.to_string(),
    })
}

fn is_university(cert: &CertificationRow, cfg: &TransformConfig) -> bool {
    match cert.category.as_deref() {
        Some("university") => true,
        Some("course") => false,
        _ => {
            let name = cert.name.to_lowercase();
            cfg.university_keywords.iter().any(|k| name.contains(k.as_str()))
        }
    }
}

fn split_certifications(
    certs: &[CertificationRow],
    cfg: &TransformConfig,
) -> (Vec<CredentialView>, Vec<CredentialView>) {
    let mut universities = Vec::new();
    let mut courses = Vec::new();
    for cert in certs {
        let cred = CredentialView {
            name: cert.name.clone(),
            institution: cert.institution.clone().unwrap_or_default(),
            year: issue_year(cert.issue_date.as_deref()),
        };
        if is_university(cert, cfg) {
            universities.push(cred);
        } else {
            courses.push(cred);
        }
    }
    (universities, courses)
}
