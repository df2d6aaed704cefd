use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::enums::RequestStatus;

/// A care request assigned to the signed-in provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MedicalRecord {
    #[serde(alias = "_id")]
    pub id: String,
    pub patient_id: String,
    #[serde(default)]
    pub patient_name: Option<String>,
    /// Free-form request type ("blood panel", "chest x-ray", ...).
    pub kind: String,
    pub status: RequestStatus,
    #[serde(default)]
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}
