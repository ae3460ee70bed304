//! Data models for lab reports, results and user profiles
//!
//! Field names on the wire are camelCase, matching the backup document
//! format. Deserialization is deliberately lenient: documents produced by
//! older clients or by the analysis service may carry nulls, unknown
//! category labels or zero-valued measurements, and those are normalized
//! here instead of being rejected.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Number, Value};
use std::fmt;

/// Current backup document version
pub const BACKUP_VERSION: &str = "1.0";

// ============================================================================
// Enumerations
// ============================================================================

/// Laboratory test category
///
/// Closed set: an unrecognized label is read as [`TestCategory::Other`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum TestCategory {
    CompleteBloodCount,
    LiverFunction,
    KidneyFunction,
    LipidProfile,
    Electrolytes,
    InflammationMarkers,
    ThyroidFunction,
    #[default]
    Other,
}

impl TestCategory {
    /// All categories in display order
    pub const ALL: [TestCategory; 8] = [
        TestCategory::CompleteBloodCount,
        TestCategory::LiverFunction,
        TestCategory::KidneyFunction,
        TestCategory::LipidProfile,
        TestCategory::Electrolytes,
        TestCategory::InflammationMarkers,
        TestCategory::ThyroidFunction,
        TestCategory::Other,
    ];

    /// Human-readable label, also used as the wire value
    pub fn label(&self) -> &'static str {
        match self {
            TestCategory::CompleteBloodCount => "Complete Blood Count",
            TestCategory::LiverFunction => "Liver Function",
            TestCategory::KidneyFunction => "Kidney Function",
            TestCategory::LipidProfile => "Lipid Profile",
            TestCategory::Electrolytes => "Electrolytes",
            TestCategory::InflammationMarkers => "Inflammation Markers",
            TestCategory::ThyroidFunction => "Thyroid Function",
            TestCategory::Other => "Other",
        }
    }

    /// Parse a label leniently (case, spacing and hyphens are ignored)
    pub fn from_label(label: &str) -> Self {
        match normalize_label(label).as_str() {
            "completebloodcount" | "cbc" | "bloodcount" => TestCategory::CompleteBloodCount,
            "liverfunction" | "lft" | "liverpanel" => TestCategory::LiverFunction,
            "kidneyfunction" | "renalfunction" | "kft" | "kidneypanel" => {
                TestCategory::KidneyFunction
            }
            "lipidprofile" | "lipidpanel" | "lipids" => TestCategory::LipidProfile,
            "electrolytes" | "electrolytepanel" => TestCategory::Electrolytes,
            "inflammationmarkers" | "inflammation" | "inflammatorymarkers" => {
                TestCategory::InflammationMarkers
            }
            "thyroidfunction" | "thyroid" | "thyroidpanel" | "tft" => {
                TestCategory::ThyroidFunction
            }
            _ => TestCategory::Other,
        }
    }
}

impl fmt::Display for TestCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for TestCategory {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

impl<'de> Deserialize<'de> for TestCategory {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.map(|s| Self::from_label(&s)).unwrap_or_default())
    }
}

/// Clinical status of a single result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ResultStatus {
    Normal,
    High,
    Low,
    Critical,
    #[default]
    Unknown,
}

impl ResultStatus {
    pub fn label(&self) -> &'static str {
        match self {
            ResultStatus::Normal => "Normal",
            ResultStatus::High => "High",
            ResultStatus::Low => "Low",
            ResultStatus::Critical => "Critical",
            ResultStatus::Unknown => "Unknown",
        }
    }

    pub fn from_label(label: &str) -> Self {
        match normalize_label(label).as_str() {
            "normal" => ResultStatus::Normal,
            "high" => ResultStatus::High,
            "low" => ResultStatus::Low,
            "critical" => ResultStatus::Critical,
            _ => ResultStatus::Unknown,
        }
    }

    /// High, Low and Critical results are out of range
    pub fn is_abnormal(&self) -> bool {
        matches!(
            self,
            ResultStatus::High | ResultStatus::Low | ResultStatus::Critical
        )
    }
}

impl fmt::Display for ResultStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for ResultStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

impl<'de> Deserialize<'de> for ResultStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.map(|s| Self::from_label(&s)).unwrap_or_default())
    }
}

/// Priority of a dietary recommendation
///
/// An unrecognized or missing priority is read as [`Priority::Unknown`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Priority {
    High,
    Medium,
    Low,
    #[default]
    Unknown,
}

impl Priority {
    pub fn label(&self) -> &'static str {
        match self {
            Priority::High => "High",
            Priority::Medium => "Medium",
            Priority::Low => "Low",
            Priority::Unknown => "Unknown",
        }
    }

    pub fn from_label(label: &str) -> Self {
        match normalize_label(label).as_str() {
            "high" => Priority::High,
            "medium" => Priority::Medium,
            "low" => Priority::Low,
            _ => Priority::Unknown,
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for Priority {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

impl<'de> Deserialize<'de> for Priority {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.map(|s| Self::from_label(&s)).unwrap_or_default())
    }
}

fn normalize_label(label: &str) -> String {
    label
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

// ============================================================================
// Lab Results and Reports
// ============================================================================

/// Raw extracted value: numeric or textual
///
/// Anything else on the wire (booleans, arrays, objects) is kept as its
/// JSON text.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ResultValue {
    Number(f64),
    Text(String),
}

impl<'de> Deserialize<'de> for ResultValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match Value::deserialize(deserializer)? {
            Value::Number(n) => match n.as_f64() {
                Some(f) => ResultValue::Number(f),
                None => ResultValue::Text(n.to_string()),
            },
            Value::String(s) => ResultValue::Text(s),
            Value::Null => ResultValue::default(),
            other => ResultValue::Text(other.to_string()),
        })
    }
}

impl Default for ResultValue {
    fn default() -> Self {
        ResultValue::Text(String::new())
    }
}

impl ResultValue {
    /// Numeric reading of the value, if it has one
    pub fn as_number(&self) -> Option<f64> {
        match self {
            ResultValue::Number(n) if n.is_finite() => Some(*n),
            ResultValue::Number(_) => None,
            ResultValue::Text(text) => crate::classifier::parse_numeric(text),
        }
    }
}

impl fmt::Display for ResultValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResultValue::Number(n) => write!(f, "{}", n),
            ResultValue::Text(t) => f.write_str(t),
        }
    }
}

impl From<f64> for ResultValue {
    fn from(value: f64) -> Self {
        ResultValue::Number(value)
    }
}

impl From<&str> for ResultValue {
    fn from(value: &str) -> Self {
        ResultValue::Text(value.to_string())
    }
}

/// A single test result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabResult {
    #[serde(default, deserialize_with = "null_as_default")]
    pub test_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub value: ResultValue,
    #[serde(default, deserialize_with = "null_as_default")]
    pub unit: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub reference_range: String,
    #[serde(default)]
    pub category: TestCategory,
    #[serde(default)]
    pub status: ResultStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interpretation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clinical_significance: Option<String>,
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub possible_causes: Vec<String>,
}

impl LabResult {
    /// Build a bare result; status stays `Unknown` until classified
    pub fn new(
        test_name: impl Into<String>,
        value: impl Into<ResultValue>,
        unit: impl Into<String>,
        reference_range: impl Into<String>,
        category: TestCategory,
    ) -> Self {
        Self {
            test_name: test_name.into(),
            value: value.into(),
            unit: unit.into(),
            reference_range: reference_range.into(),
            category,
            status: ResultStatus::Unknown,
            interpretation: None,
            clinical_significance: None,
            possible_causes: Vec::new(),
        }
    }
}

/// Clinician-style interpretation attached to a report
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClinicalInterpretation {
    #[serde(default, deserialize_with = "null_as_default")]
    pub key_findings: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub clinical_implications: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub recommended_actions: Vec<String>,
}

/// Dietary recommendation attached to a report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DietaryRecommendation {
    #[serde(default, deserialize_with = "null_as_default")]
    pub topic: String,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default, deserialize_with = "null_as_default")]
    pub action: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub items: Vec<String>,
}

/// One uploaded lab report with its derived metadata
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabReportData {
    /// Assigned by the remote store on first insert
    #[serde(
        default,
        deserialize_with = "lenient_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<String>,
    #[serde(
        default,
        rename = "user_id",
        deserialize_with = "lenient_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patient_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub report_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lab_name: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub results: Vec<LabResult>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub summary: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub abnormalities: Vec<String>,
    /// Calendar date (YYYY-MM-DD) assigned at ingestion
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upload_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clinical_interpretation: Option<ClinicalInterpretation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dietary_recommendations: Option<Vec<DietaryRecommendation>>,
}

// ============================================================================
// User Profile
// ============================================================================

/// User profile, one per session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    /// Auth user id; absent until the profile is first persisted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    /// Kept exactly as stored; see [`UserProfile::age_years`]
    #[serde(default = "zero", deserialize_with = "lenient_number")]
    pub age: Number,
    #[serde(default, deserialize_with = "null_as_default")]
    pub gender: String,
    /// Height in cm; `None` when not filled in
    #[serde(default, deserialize_with = "measurement")]
    pub height: Option<f64>,
    /// Weight in kg; `None` when not filled in
    #[serde(default, deserialize_with = "measurement")]
    pub weight: Option<f64>,
    #[serde(default, alias = "blood_type", deserialize_with = "null_as_default")]
    pub blood_type: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub email: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub phone: String,
}

impl UserProfile {
    /// Anonymous profile used before sign-in and whenever the remote
    /// profile cannot be loaded
    pub fn guest() -> Self {
        Self {
            id: None,
            name: "Guest User".to_string(),
            age: zero(),
            gender: "Not Specified".to_string(),
            height: None,
            weight: None,
            blood_type: "Unknown".to_string(),
            email: String::new(),
            phone: String::new(),
        }
    }
}

impl UserProfile {
    /// Age as a whole number of years, if the stored value is one
    pub fn age_years(&self) -> Option<u64> {
        self.age.as_u64()
    }
}

impl Default for UserProfile {
    fn default() -> Self {
        Self::guest()
    }
}

// ============================================================================
// Backup
// ============================================================================

/// Complete, self-contained snapshot of a user's data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupData {
    #[serde(default = "default_backup_version")]
    pub version: String,
    #[serde(default = "Utc::now")]
    pub export_date: DateTime<Utc>,
    pub user: UserProfile,
    pub reports: Vec<LabReportData>,
}

fn default_backup_version() -> String {
    BACKUP_VERSION.to_string()
}

// ============================================================================
// Lenient field readers
// ============================================================================

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn zero() -> Number {
    Number::from(0)
}

/// Any JSON number is kept verbatim; numeric strings are parsed and
/// everything else reads as zero
fn lenient_number<'de, D>(deserializer: D) -> Result<Number, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(n) => n,
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .map(Number::from)
                .or_else(|| s.parse::<f64>().ok().and_then(Number::from_f64))
                .unwrap_or_else(zero)
        }
        _ => zero(),
    })
}

/// Zero, negative, non-finite and null measurements all mean "unset"
fn measurement<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<f64>::deserialize(deserializer)?;
    Ok(raw.filter(|v| v.is_finite() && *v > 0.0))
}

/// Ids arrive as strings or as bare integers from numeric key columns
pub(crate) fn lenient_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Signed(i64),
        Unsigned(u64),
    }

    Ok(match Option::<RawId>::deserialize(deserializer)? {
        Some(RawId::Text(s)) if !s.is_empty() => Some(s),
        Some(RawId::Signed(n)) => Some(n.to_string()),
        Some(RawId::Unsigned(n)) => Some(n.to_string()),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[test]
    fn test_category_labels_round_trip() {
        for category in TestCategory::ALL {
            assert_eq!(TestCategory::from_label(category.label()), category);
        }
    }

    #[test]
    fn test_category_lenient_parsing() {
        assert_eq!(
            TestCategory::from_label("Complete-Blood-Count"),
            TestCategory::CompleteBloodCount
        );
        assert_eq!(TestCategory::from_label("LIPID PROFILE"), TestCategory::LipidProfile);
        assert_eq!(TestCategory::from_label("Vitamins"), TestCategory::Other);
    }

    #[test]
    fn test_unknown_status_reads_as_unknown() {
        let result: LabResult = serde_json::from_value(json!({
            "testName": "Glucose",
            "value": 95,
            "unit": "mg/dL",
            "referenceRange": "70-100",
            "category": "Metabolic",
            "status": "borderline"
        }))
        .unwrap();

        assert_eq!(result.category, TestCategory::Other);
        assert_eq!(result.status, ResultStatus::Unknown);
        assert_eq!(result.value, ResultValue::Number(95.0));
    }

    #[test]
    fn test_result_tolerates_nulls() {
        let result: LabResult = serde_json::from_value(json!({
            "testName": "CRP",
            "value": null,
            "unit": null,
            "referenceRange": "<5",
            "category": null,
            "status": null,
            "possibleCauses": null
        }))
        .unwrap();

        assert_eq!(result.value, ResultValue::Text(String::new()));
        assert!(result.unit.is_empty());
        assert_eq!(result.category, TestCategory::Other);
        assert!(result.possible_causes.is_empty());
    }

    #[test]
    fn test_textual_value_keeps_text() {
        let result: LabResult = serde_json::from_value(json!({
            "testName": "HBsAg",
            "value": "Negative",
            "referenceRange": "Negative"
        }))
        .unwrap();
        assert_eq!(result.value, ResultValue::Text("Negative".to_string()));
        assert_eq!(result.value.as_number(), None);
    }

    #[test]
    fn test_zero_measurements_are_unset() {
        let profile: UserProfile = serde_json::from_value(json!({
            "name": "Ada",
            "age": 36,
            "gender": "Female",
            "height": 0,
            "weight": 0,
            "bloodType": "O+",
            "email": "ada@example.com",
            "phone": ""
        }))
        .unwrap();

        assert_eq!(profile.height, None);
        assert_eq!(profile.weight, None);

        let value = serde_json::to_value(&profile).unwrap();
        assert!(value["height"].is_null());
    }

    #[test]
    fn test_legacy_blood_type_key() {
        let profile: UserProfile = serde_json::from_value(json!({
            "name": "Guest User",
            "blood_type": "Unknown"
        }))
        .unwrap();
        assert_eq!(profile.blood_type, "Unknown");
    }

    #[test]
    fn test_report_wire_names() {
        let report = LabReportData {
            id: Some("42".to_string()),
            user_id: Some("u-1".to_string()),
            lab_name: Some("City Lab".to_string()),
            upload_date: Some("2026-10-18".to_string()),
            ..Default::default()
        };

        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["labName"], "City Lab");
        assert_eq!(value["user_id"], "u-1");
        assert_eq!(value["uploadDate"], "2026-10-18");
        assert!(value.get("clinicalInterpretation").is_none());
    }

    #[rstest]
    #[case(json!(-1), Some(-1.0), None)]
    #[case(json!(34.5), Some(34.5), None)]
    #[case(json!(212), Some(212.0), Some(212))]
    #[case(json!("41"), Some(41.0), Some(41))]
    #[case(json!(null), Some(0.0), Some(0))]
    #[case(json!(true), Some(0.0), Some(0))]
    fn test_age_is_kept_as_stored(
        #[case] age: serde_json::Value,
        #[case] stored: Option<f64>,
        #[case] years: Option<u64>,
    ) {
        let profile: UserProfile = serde_json::from_value(json!({
            "name": "Noor",
            "age": age
        }))
        .unwrap();
        assert_eq!(profile.age.as_f64(), stored);
        assert_eq!(profile.age_years(), years);
    }

    #[test]
    fn test_out_of_range_age_survives_round_trip() {
        let profile: UserProfile =
            serde_json::from_value(json!({"name": "Noor", "age": -3})).unwrap();
        assert_eq!(serde_json::to_value(&profile).unwrap()["age"], json!(-3));
    }

    #[rstest]
    #[case(json!("High"), Priority::High)]
    #[case(json!("medium"), Priority::Medium)]
    #[case(json!("LOW"), Priority::Low)]
    #[case(json!("urgent"), Priority::Unknown)]
    #[case(json!(null), Priority::Unknown)]
    fn test_priority_reads_leniently(#[case] priority: serde_json::Value, #[case] expected: Priority) {
        let recommendation: DietaryRecommendation = serde_json::from_value(json!({
            "topic": "Iron",
            "priority": priority,
            "action": "Eat more leafy greens",
            "items": ["spinach"]
        }))
        .unwrap();
        assert_eq!(recommendation.priority, expected);
    }

    #[test]
    fn test_missing_priority_is_unknown() {
        let recommendation: DietaryRecommendation =
            serde_json::from_value(json!({"topic": "Salt", "action": "Cut back"})).unwrap();
        assert_eq!(recommendation.priority, Priority::Unknown);
    }

    #[rstest]
    #[case(json!(true), ResultValue::Text("true".into()))]
    #[case(json!([1, 2]), ResultValue::Text("[1,2]".into()))]
    #[case(json!({"min": 3}), ResultValue::Text(r#"{"min":3}"#.into()))]
    #[case(json!(7.25), ResultValue::Number(7.25))]
    #[case(json!("7.25"), ResultValue::Text("7.25".into()))]
    fn test_any_value_shape_is_accepted(
        #[case] value: serde_json::Value,
        #[case] expected: ResultValue,
    ) {
        let result: LabResult = serde_json::from_value(json!({
            "testName": "Marker",
            "value": value,
            "referenceRange": "1-10"
        }))
        .unwrap();
        assert_eq!(result.value, expected);
    }

    #[test]
    fn test_unknown_category_is_stored_as_other() {
        let result: LabResult = serde_json::from_value(json!({
            "testName": "Ferritin",
            "value": 12,
            "category": "Iron Studies"
        }))
        .unwrap();
        let written = serde_json::to_value(&result).unwrap();
        assert_eq!(written["category"], "Other");
    }

    #[test]
    fn test_guest_profile() {
        let guest = UserProfile::guest();
        assert_eq!(guest.name, "Guest User");
        assert!(guest.id.is_none());
        assert!(guest.height.is_none());
        assert_eq!(UserProfile::default(), guest);
    }
}
