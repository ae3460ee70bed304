//! Field ↔ column translation for the remote tables
//!
//! One declarative table per entity. Fields missing from a table are not
//! persisted (`patientName` has no column); columns missing from a table
//! are ignored when reading rows back.

use healthwise_shared::{LabReportData, UserProfile};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Table name plus `(field, column)` pairs
#[derive(Debug, Clone, Copy)]
pub struct ColumnMapping {
    pub table: &'static str,
    pub fields: &'static [(&'static str, &'static str)],
}

pub const PROFILE_COLUMNS: ColumnMapping = ColumnMapping {
    table: "profiles",
    fields: &[
        ("id", "id"),
        ("name", "name"),
        ("age", "age"),
        ("gender", "gender"),
        ("height", "height"),
        ("weight", "weight"),
        ("bloodType", "bloodtype"),
        ("email", "email"),
        ("phone", "phone"),
    ],
};

pub const REPORT_COLUMNS: ColumnMapping = ColumnMapping {
    table: "reports",
    fields: &[
        ("id", "id"),
        ("user_id", "user_id"),
        ("labName", "lab_name"),
        ("reportDate", "report_date"),
        ("uploadDate", "upload_date"),
        ("summary", "summary"),
        ("abnormalities", "abnormalities"),
        ("results", "results"),
        ("clinicalInterpretation", "clinical_interpretation"),
        ("dietaryRecommendations", "dietary_recommendations"),
    ],
};

impl ColumnMapping {
    /// Column for a field, if the field is persisted
    pub fn column(&self, field: &str) -> Option<&'static str> {
        self.fields
            .iter()
            .find(|(f, _)| *f == field)
            .map(|(_, c)| *c)
    }

    /// Rename the fields of a serialized entity to columns
    pub fn to_row(&self, entity: &Value) -> Value {
        let mut row = Map::new();
        if let Some(object) = entity.as_object() {
            for (field, column) in self.fields {
                if let Some(value) = object.get(*field) {
                    row.insert(column.to_string(), value.clone());
                }
            }
        }
        Value::Object(row)
    }

    /// Rename the columns of a row back to fields
    pub fn from_row(&self, row: &Value) -> Value {
        let mut entity = Map::new();
        if let Some(object) = row.as_object() {
            for (field, column) in self.fields {
                if let Some(value) = object.get(*column) {
                    entity.insert(field.to_string(), normalize_id(field, value));
                }
            }
        }
        Value::Object(entity)
    }
}

fn normalize_id(field: &str, value: &Value) -> Value {
    match value {
        Value::Number(n) if field == "id" || field == "user_id" => Value::String(n.to_string()),
        other => other.clone(),
    }
}

/// Profile row keyed by the caller's user id
pub fn profile_to_row(profile: &UserProfile, user_id: Uuid) -> Result<Value, serde_json::Error> {
    let mut row = PROFILE_COLUMNS.to_row(&serde_json::to_value(profile)?);
    if let Some(object) = row.as_object_mut() {
        object.insert("id".to_string(), Value::String(user_id.to_string()));
    }
    Ok(row)
}

pub fn profile_from_row(row: &Value) -> Result<UserProfile, serde_json::Error> {
    serde_json::from_value(PROFILE_COLUMNS.from_row(row))
}

/// Report row owned by the caller; the id is left to the store
pub fn report_to_row(report: &LabReportData, user_id: Uuid) -> Result<Value, serde_json::Error> {
    let mut row = REPORT_COLUMNS.to_row(&serde_json::to_value(report)?);
    if let Some(object) = row.as_object_mut() {
        object.remove("id");
        object.insert("user_id".to_string(), Value::String(user_id.to_string()));
    }
    Ok(row)
}

pub fn report_from_row(row: &Value) -> Result<LabReportData, serde_json::Error> {
    serde_json::from_value(REPORT_COLUMNS.from_row(row))
}

#[cfg(test)]
mod tests {
    use super::*;
    use healthwise_shared::{LabResult, TestCategory};
    use serde_json::json;

    #[test]
    fn test_profile_round_trip_through_columns() {
        let user_id = Uuid::new_v4();
        let mut profile = UserProfile::guest();
        profile.name = "Rosa".into();
        profile.blood_type = "B+".into();
        profile.height = Some(160.0);

        let row = profile_to_row(&profile, user_id).unwrap();
        assert_eq!(row["bloodtype"], "B+");
        assert_eq!(row["id"], user_id.to_string());
        assert!(row.get("bloodType").is_none());
        assert!(row["weight"].is_null());

        let restored = profile_from_row(&row).unwrap();
        assert_eq!(restored.blood_type, "B+");
        assert_eq!(restored.height, Some(160.0));
        assert_eq!(restored.weight, None);
        assert_eq!(restored.id, Some(user_id.to_string()));
    }

    #[test]
    fn test_report_row_drops_unpersisted_fields() {
        let user_id = Uuid::new_v4();
        let report = LabReportData {
            id: Some("local".into()),
            patient_name: Some("Rosa".into()),
            lab_name: Some("North Lab".into()),
            upload_date: Some("2024-04-01".into()),
            results: vec![LabResult::new("TSH", 2.1, "mIU/L", "0.4-4.0", TestCategory::ThyroidFunction)],
            ..Default::default()
        };

        let row = report_to_row(&report, user_id).unwrap();
        assert!(row.get("id").is_none());
        assert!(row.get("patientName").is_none());
        assert_eq!(row["lab_name"], "North Lab");
        assert_eq!(row["upload_date"], "2024-04-01");
        assert_eq!(row["user_id"], user_id.to_string());
        assert_eq!(row["results"][0]["testName"], "TSH");
    }

    #[test]
    fn test_report_from_row_normalizes_numeric_id() {
        let row = json!({
            "id": 17,
            "user_id": "b7a0a8d4-5d52-4c1e-9a43-3b7d1c9d2e10",
            "lab_name": "North Lab",
            "report_date": null,
            "upload_date": "2024-04-01",
            "summary": "ok",
            "abnormalities": [],
            "results": [],
            "clinical_interpretation": null,
            "dietary_recommendations": null,
            "created_at": "2024-04-01T10:00:00Z"
        });

        let report = report_from_row(&row).unwrap();
        assert_eq!(report.id.as_deref(), Some("17"));
        assert_eq!(report.lab_name.as_deref(), Some("North Lab"));
        assert_eq!(report.report_date, None);
        assert!(report.clinical_interpretation.is_none());
    }

    #[test]
    fn test_column_lookup() {
        assert_eq!(PROFILE_COLUMNS.column("bloodType"), Some("bloodtype"));
        assert_eq!(REPORT_COLUMNS.column("labName"), Some("lab_name"));
        assert_eq!(REPORT_COLUMNS.column("patientName"), None);
    }
}
