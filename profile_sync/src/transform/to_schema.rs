use indexmap::IndexMap;
use serde::Serialize;

use crate::{
    bucket::{EXPERIENCE_YEARS, TOTAL_STUDENTS, response_time_hours},
    models::{IdentityPatch, ProfileRow, SpecialtyRow, TrainerProfileRow, UserId},
    view::TrainerProfileView,
};

/// Per-table writes derived from one aggregate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchemaPatch {
    /// Writable identity columns.
    pub identity: IdentityPatch,
    /// Whole profile row.
    pub profile: ProfileRow,
    /// Whole trainer profile row.
    pub trainer_profile: TrainerProfileRow,
    /// Full specialty set, one row per sport.
    pub specialties: Vec<SpecialtyRow>,
    /// Always empty; service cities are written by the background city sync.
    pub cities: Vec<i32>,
}

fn non_empty(s: &str) -> Option<String> {
    let s = s.trim();
    (!s.is_empty()).then(|| s.to_string())
}

/// Split the aggregate into table patches for `user`.
pub fn to_schema(view: &TrainerProfileView, user: &UserId) -> SchemaPatch {
    let mut specialties: IndexMap<i32, SpecialtyRow> = IndexMap::new();
    for s in &view.specialties {
        specialties.entry(s.sport_id).or_insert_with(|| SpecialtyRow {
            trainer_id: user.to_string(),
            sport_id: s.sport_id,
            experience_level: s.experience_level.trim().to_string(),
            years_of_experience: s.years_of_experience,
            is_primary: s.is_primary,
        });
    }

    SchemaPatch {
        identity: IdentityPatch {
            phone: non_empty(&view.phone),
        },
        profile: ProfileRow {
            user_id: user.to_string(),
            display_name: non_empty(&view.display_name),
            first_name: non_empty(&view.first_name),
            last_name: non_empty(&view.last_name),
            bio: non_empty(&view.bio),
            avatar_url: non_empty(&view.avatar_url),
            instagram_url: non_empty(&view.instagram_url),
            city_id: view.home_city_id,
        },
        trainer_profile: TrainerProfileRow {
            user_id: user.to_string(),
            experience_years: EXPERIENCE_YEARS.value_for(&view.experience_years),
            response_time_hours: response_time_hours(&view.response_time),
            total_students: TOTAL_STUDENTS.value_for(&view.total_students),
            service_mode: non_empty(&view.service_mode),
        },
        specialties: specialties.into_values().collect(),
        cities: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::SpecialtyView;

    fn specialty(sport_id: i32, level: &str, is_primary: bool) -> SpecialtyView {
        SpecialtyView {
            sport_id,
            experience_level: level.into(),
            years_of_experience: None,
            is_primary,
        }
    }

    #[test]
    fn labels_map_back_to_representatives() {
        let view = TrainerProfileView {
            experience_years: "6-10".into(),
            response_time: "12-hours".into(),
            total_students: "over-200".into(),
            ..Default::default()
        };
        let patch = to_schema(&view, &UserId::from("u1"));
        assert_eq!(patch.trainer_profile.experience_years, Some(10));
        assert_eq!(patch.trainer_profile.response_time_hours, Some(12));
        assert_eq!(patch.trainer_profile.total_students, Some(250));

        let unknown = TrainerProfileView {
            experience_years: "forever".into(),
            ..Default::default()
        };
        let patch = to_schema(&unknown, &UserId::from("u1"));
        assert_eq!(patch.trainer_profile.experience_years, None);
        assert_eq!(patch.trainer_profile.response_time_hours, None);
    }

    #[test]
    fn duplicate_sports_keep_first_and_order() {
        let view = TrainerProfileView {
            specialties: vec![
                specialty(5, "advanced", true),
                specialty(2, "beginner", false),
                specialty(5, "expert", false),
            ],
            ..Default::default()
        };
        let patch = to_schema(&view, &UserId::from("u1"));
        let got: Vec<_> = patch
            .specialties
            .iter()
            .map(|s| (s.sport_id, s.experience_level.as_str(), s.is_primary))
            .collect();
        assert_eq!(got, vec![(5, "advanced", true), (2, "beginner", false)]);
    }

    #[test]
    fn patch_shape() {
        let view = TrainerProfileView {
            id: "u1".into(),
            email: "ana@example.com".into(),
            phone: "+55 21 99999-0000".into(),
            display_name: "Ana".into(),
            bio: "  ".into(),
            home_city_id: Some(7),
            experience_years: "3-5".into(),
            service_mode: "online".into(),
            specialties: vec![specialty(1, "advanced", true)],
            cities: vec!["Rio de Janeiro - RJ".into()],
            ..Default::default()
        };
        let patch = to_schema(&view, &UserId::from("u1"));
        insta::assert_json_snapshot!(patch, @r#"
        {
          "identity": {
            "phone": "+55 21 99999-0000"
          },
          "profile": {
            "user_id": "u1",
            "display_name": "Ana",
            "first_name": null,
            "last_name": null,
            "bio": null,
            "avatar_url": null,
            "instagram_url": null,
            "city_id": 7
          },
          "trainer_profile": {
            "user_id": "u1",
            "experience_years": 5,
            "response_time_hours": null,
            "total_students": null,
            "service_mode": "online"
          },
          "specialties": [
            {
              "trainer_id": "u1",
              "sport_id": 1,
              "experience_level": "advanced",
              "years_of_experience": null,
              "is_primary": true
            }
          ],
          "cities": []
        }
        "#);
    }
}
