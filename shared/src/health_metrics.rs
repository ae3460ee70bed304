//! Health metrics derived from the user profile
//!
//! BMI is only computed when both height and weight are set; otherwise the
//! missing fields are reported instead of a meaningless number.

use crate::models::UserProfile;
use serde::{Deserialize, Serialize};

/// BMI category classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BmiCategory {
    Underweight,
    Normal,
    Overweight,
    Obese,
}

impl BmiCategory {
    /// Get the BMI range for this category
    pub fn range(&self) -> (f64, f64) {
        match self {
            BmiCategory::Underweight => (0.0, 18.5),
            BmiCategory::Normal => (18.5, 25.0),
            BmiCategory::Overweight => (25.0, 30.0),
            BmiCategory::Obese => (30.0, f64::INFINITY),
        }
    }
}

/// Calculate BMI from weight and height
///
/// Formula: BMI = weight(kg) / height(m)²
pub fn calculate_bmi(weight_kg: f64, height_cm: f64) -> f64 {
    let height_m = height_cm / 100.0;
    weight_kg / (height_m * height_m)
}

/// Classify BMI into category
pub fn classify_bmi(bmi: f64) -> BmiCategory {
    if bmi < 18.5 {
        BmiCategory::Underweight
    } else if bmi < 25.0 {
        BmiCategory::Normal
    } else if bmi < 30.0 {
        BmiCategory::Overweight
    } else {
        BmiCategory::Obese
    }
}

/// Calculate healthy weight range for a given height
///
/// Weights whose BMI falls in the [`BmiCategory::Normal`] range
pub fn healthy_weight_range_kg(height_cm: f64) -> (f64, f64) {
    let height_m = height_cm / 100.0;
    let height_m_sq = height_m * height_m;
    let (low, high) = BmiCategory::Normal.range();
    (low * height_m_sq, high * height_m_sq)
}

/// BMI rounded to one decimal, with its category
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BmiReading {
    pub value: f64,
    pub category: BmiCategory,
    pub healthy_weight_range_kg: (f64, f64),
}

/// Metrics view over a profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileMetrics {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bmi: Option<BmiReading>,
    /// Fields that must be filled in before BMI can be shown
    pub missing_fields: Vec<String>,
}

/// BMI for a profile, `None` while height or weight is unset
pub fn profile_bmi(profile: &UserProfile) -> Option<BmiReading> {
    let (height, weight) = (profile.height?, profile.weight?);
    let bmi = calculate_bmi(weight, height);
    if !bmi.is_finite() {
        return None;
    }
    Some(BmiReading {
        value: (bmi * 10.0).round() / 10.0,
        category: classify_bmi(bmi),
        healthy_weight_range_kg: healthy_weight_range_kg(height),
    })
}

/// Compute the metrics view for a profile
pub fn profile_metrics(profile: &UserProfile) -> ProfileMetrics {
    let mut missing_fields = Vec::new();
    if profile.height.is_none() {
        missing_fields.push("height".to_string());
    }
    if profile.weight.is_none() {
        missing_fields.push("weight".to_string());
    }

    ProfileMetrics {
        bmi: profile_bmi(profile),
        missing_fields,
    }
}
