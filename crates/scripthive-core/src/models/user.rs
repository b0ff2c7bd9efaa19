use serde::{Deserialize, Serialize};

use super::de::opt_string_or_number;

/// A portal user as listed by `GET /users`.
///
/// The backend has served both `id` and `_id` over time, as either a string
/// or a number; both are normalized into `id`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(default, alias = "_id", deserialize_with = "opt_string_or_number")]
    pub id: Option<String>,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub active: bool,
}

impl User {
    pub fn status_label(&self) -> &'static str {
        if self.active {
            "Active"
        } else {
            "Not Active"
        }
    }
}

/// Account details shown and edited on the profile view.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    #[serde(default)]
    pub full_name: String,
    #[serde(default, alias = "userName")]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub role: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub phone: String,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

impl UserProfile {
    /// Editable subset, used to seed the edit form.
    pub fn to_update(&self) -> ProfileUpdate {
        ProfileUpdate {
            full_name: self.full_name.clone(),
            username: self.username.clone(),
            email: self.email.clone(),
            phone: self.phone.clone(),
        }
    }
}

/// Body of `PUT /users/{id}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    pub full_name: String,
    pub username: String,
    pub email: String,
    pub phone: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_accepts_either_id_field() {
        let a: User = serde_json::from_str(
            r#"{"id": 12, "fullName": "Ada Admin", "username": "ada", "email": "a@x.com",
                "phone": "0700", "role": "admin", "active": true}"#,
        )
        .unwrap();
        assert_eq!(a.id.as_deref(), Some("12"));
        assert_eq!(a.status_label(), "Active");

        let b: User =
            serde_json::from_str(r#"{"_id": "66af", "fullName": "Bo", "role": "writer"}"#).unwrap();
        assert_eq!(b.id.as_deref(), Some("66af"));
        assert!(!b.active);
        assert_eq!(b.status_label(), "Not Active");
    }

    #[test]
    fn test_profile_missing_phone_is_empty() {
        let p: UserProfile = serde_json::from_str(
            r#"{"fullName": "Ada", "username": "ada", "email": "a@x.com", "role": "admin", "phone": null}"#,
        )
        .unwrap();
        assert_eq!(p.phone, "");
    }

    #[test]
    fn test_update_omits_role() {
        let profile = UserProfile {
            full_name: "Ada".into(),
            username: "ada".into(),
            email: "a@x.com".into(),
            role: "admin".into(),
            phone: String::new(),
        };
        let mut update = profile.to_update();
        update.full_name = "Ada Lovelace".into();

        let json = serde_json::to_value(&update).unwrap();
        assert_eq!(json["fullName"], "Ada Lovelace");
        assert!(json.get("role").is_none());
    }
}
