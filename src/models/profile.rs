use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::enums::{ProviderRole, Role};

/// User record as the backend returns it.
///
/// Only `id` and `role` are guaranteed. Provider fields are optional here
/// and checked by `capability::verify_provider` before anything trusts them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    #[serde(alias = "_id")]
    pub id: String,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub specialty: Option<String>,
    /// Role-specific fields this crate does not interpret.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl UserProfile {
    /// Minimal record with only an id and a role.
    pub fn new(id: impl Into<String>, role: Role) -> Self {
        Self {
            id: id.into(),
            role,
            name: None,
            email: None,
            address: None,
            phone: None,
            is_active: None,
            specialty: None,
            extra: Map::new(),
        }
    }

    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .or(self.email.as_deref())
            .unwrap_or(&self.id)
    }
}

/// A provider record that passed the capability check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderProfile {
    pub id: String,
    pub role: ProviderRole,
    pub name: Option<String>,
    pub address: String,
    pub phone: String,
    pub is_active: bool,
    pub specialty: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_camel_case_backend_record() {
        let json = r#"{
            "_id": "64f0c2",
            "role": "doctor",
            "name": "Dr. Salma",
            "address": "12 Nile St",
            "phone": "+20 100 000 0000",
            "isActive": true,
            "specialty": "cardiology",
            "licenseNumber": "EG-7781"
        }"#;
        let profile: UserProfile = serde_json::from_str(json).unwrap();
        assert_eq!(profile.id, "64f0c2");
        assert_eq!(profile.role, Role::Doctor);
        assert_eq!(profile.is_active, Some(true));
        assert_eq!(profile.extra.get("licenseNumber").unwrap(), "EG-7781");
    }

    #[test]
    fn missing_optional_fields_default_to_none() {
        let profile: UserProfile =
            serde_json::from_str(r#"{"id": "p1", "role": "patient"}"#).unwrap();
        assert_eq!(profile, UserProfile::new("p1", Role::Patient));
        assert!(profile.address.is_none());
    }

    #[test]
    fn serializes_without_absent_fields() {
        let profile = UserProfile::new("p1", Role::Patient);
        let value = serde_json::to_value(&profile).unwrap();
        assert_eq!(value, serde_json::json!({"id": "p1", "role": "patient"}));
    }

    #[test]
    fn display_name_falls_back_to_email_then_id() {
        let mut profile = UserProfile::new("p1", Role::Patient);
        assert_eq!(profile.display_name(), "p1");
        profile.email = Some("nour@example.com".into());
        assert_eq!(profile.display_name(), "nour@example.com");
        profile.name = Some("Nour".into());
        assert_eq!(profile.display_name(), "Nour");
    }
}
