//! HealthWise WASM Module
//!
//! Browser bindings for classification, BMI and backup checks, so the UI
//! can give instant feedback without a round trip.

use healthwise_shared::backup::import_backup;
use healthwise_shared::classifier;
use healthwise_shared::health_metrics;
use healthwise_shared::ImportError;
use healthwise_shared::ResultValue;
use wasm_bindgen::prelude::*;

/// Classify a raw value against a reference range, returning the status label
#[wasm_bindgen]
pub fn classify_result(value: &str, reference_range: &str) -> String {
    classify_label(value, reference_range).to_string()
}

fn classify_label(value: &str, reference_range: &str) -> &'static str {
    classifier::classify(&ResultValue::from(value), reference_range).label()
}

/// Calculate BMI from weight (kg) and height (cm); undefined when either is unset
#[wasm_bindgen]
pub fn calculate_bmi(weight_kg: f64, height_cm: f64) -> Option<f64> {
    if weight_kg <= 0.0 || height_cm <= 0.0 {
        return None;
    }
    let bmi = health_metrics::calculate_bmi(weight_kg, height_cm);
    bmi.is_finite().then_some(bmi)
}

/// Check a backup file before upload; returns the number of reports it holds
#[wasm_bindgen]
pub fn validate_backup(json: &str) -> Result<u32, JsValue> {
    backup_report_count(json).map_err(|e| JsValue::from_str(&e.to_string()))
}

fn backup_report_count(json: &str) -> Result<u32, ImportError> {
    let backup = import_backup(json)?;
    Ok(backup.reports.len() as u32)
}
