//! Input validation
//!
//! Upload checks run before any network call; profile checks run before a
//! profile is written to the remote store.

use crate::errors::ValidationError;
use crate::models::UserProfile;
use once_cell::sync::Lazy;
use regex_lite::Regex;

/// Largest accepted upload
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

static EMAIL: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap());

/// Reject files the analysis service cannot read
pub fn validate_upload(content_type: &str, size: usize) -> Result<(), ValidationError> {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    // Any image, or a PDF
    let accepted = essence.len() > "image/".len() && essence.starts_with("image/");
    if !accepted && essence != "application/pdf" {
        return Err(ValidationError::UnsupportedFileType {
            content_type: content_type.to_string(),
        });
    }

    if size > MAX_UPLOAD_BYTES {
        return Err(ValidationError::FileTooLarge {
            size,
            max: MAX_UPLOAD_BYTES,
        });
    }

    Ok(())
}

/// Guess a content type from the file extension when the client sent none
pub fn content_type_from_name(file_name: &str) -> Option<&'static str> {
    let ext = file_name.rsplit_once('.')?.1.to_ascii_lowercase();
    match ext.as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "webp" => Some("image/webp"),
        "heic" => Some("image/heic"),
        "pdf" => Some("application/pdf"),
        _ => None,
    }
}

/// Validate email format; empty means "not provided"
pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    if email.is_empty() {
        return Ok(());
    }
    if email.len() > 255 {
        return Err(ValidationError::field("email", "Email too long"));
    }
    if !EMAIL.is_match(email) {
        return Err(ValidationError::field("email", "Invalid email format"));
    }
    Ok(())
}

/// Height in cm, when set
pub fn validate_height_cm(height_cm: f64) -> Result<(), ValidationError> {
    if !height_cm.is_finite() {
        return Err(ValidationError::field("height", "Height must be a valid number"));
    }
    if !(30.0..=300.0).contains(&height_cm) {
        return Err(ValidationError::field(
            "height",
            "Height must be between 30 and 300 cm",
        ));
    }
    Ok(())
}

/// Weight in kg, when set
pub fn validate_weight_kg(weight_kg: f64) -> Result<(), ValidationError> {
    if !weight_kg.is_finite() {
        return Err(ValidationError::field("weight", "Weight must be a valid number"));
    }
    if !(1.0..=700.0).contains(&weight_kg) {
        return Err(ValidationError::field(
            "weight",
            "Weight must be between 1 and 700 kg",
        ));
    }
    Ok(())
}

/// Check a profile before it is saved
pub fn validate_profile(profile: &UserProfile) -> Result<(), ValidationError> {
    if profile.name.trim().is_empty() {
        return Err(ValidationError::field("name", "Name cannot be empty"));
    }
    if profile.name.len() > 200 {
        return Err(ValidationError::field("name", "Name too long"));
    }
    match profile.age_years() {
        Some(age) if age > 150 => {
            return Err(ValidationError::field("age", "Age cannot exceed 150 years"));
        }
        Some(_) => {}
        None => {
            return Err(ValidationError::field(
                "age",
                "Age must be a whole number of years",
            ));
        }
    }
    if let Some(height) = profile.height {
        validate_height_cm(height)?;
    }
    if let Some(weight) = profile.weight {
        validate_weight_kg(weight)?;
    }
    validate_email(&profile.email)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rstest::rstest;

    #[rstest]
    #[case("image/png", 1024)]
    #[case("image/jpeg", MAX_UPLOAD_BYTES)]
    #[case("application/pdf", 0)]
    #[case("Application/PDF; charset=binary", 10)]
    fn test_accepts_supported_uploads(#[case] content_type: &str, #[case] size: usize) {
        assert!(validate_upload(content_type, size).is_ok());
    }

    #[test]
    fn test_rejects_unsupported_type() {
        let err = validate_upload("text/plain", 10).unwrap_err();
        assert_eq!(err.to_string(), "Please upload an image (JPG, PNG) or PDF.");
        assert!(validate_upload("", 10).is_err());
    }

    #[test]
    fn test_rejects_oversized_file() {
        let err = validate_upload("image/png", MAX_UPLOAD_BYTES + 1).unwrap_err();
        assert_eq!(err.to_string(), "File size too large. Max 10MB.");
    }

    #[test]
    fn test_content_type_from_name() {
        assert_eq!(content_type_from_name("scan.JPG"), Some("image/jpeg"));
        assert_eq!(content_type_from_name("report.pdf"), Some("application/pdf"));
        assert_eq!(content_type_from_name("notes.txt"), None);
        assert_eq!(content_type_from_name("noextension"), None);
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("").is_ok());
        assert!(validate_email("test@example.com").is_ok());
        assert!(validate_email("user.name@domain.co.uk").is_ok());
        assert!(validate_email("invalid").is_err());
        assert!(validate_email("no@dot").is_err());
        assert!(validate_email("spaces in@email.com").is_err());
    }

    #[test]
    fn test_validate_profile() {
        let mut profile = UserProfile::guest();
        assert!(validate_profile(&profile).is_ok());

        profile.height = Some(172.0);
        profile.weight = Some(68.0);
        assert!(validate_profile(&profile).is_ok());

        profile.height = Some(12.0);
        let err = validate_profile(&profile).unwrap_err();
        assert_eq!(err.field_name(), Some("height"));

        profile.height = None;
        profile.age = 151.into();
        assert_eq!(validate_profile(&profile).unwrap_err().field_name(), Some("age"));

        profile.age = (-2).into();
        assert_eq!(validate_profile(&profile).unwrap_err().field_name(), Some("age"));

        profile.age = 40.into();
        profile.name = "  ".into();
        assert_eq!(validate_profile(&profile).unwrap_err().field_name(), Some("name"));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn prop_upload_size_limit(size in 0usize..(2 * MAX_UPLOAD_BYTES)) {
            let result = validate_upload("image/png", size);
            prop_assert_eq!(result.is_ok(), size <= MAX_UPLOAD_BYTES);
        }

        #[test]
        fn prop_valid_height_range(height in 30.0f64..=300.0) {
            prop_assert!(validate_height_cm(height).is_ok());
        }

        #[test]
        fn prop_invalid_height_above_max(height in 300.1f64..1000.0) {
            prop_assert!(validate_height_cm(height).is_err());
        }

        #[test]
        fn prop_valid_weight_range(weight in 1.0f64..=700.0) {
            prop_assert!(validate_weight_kg(weight).is_ok());
        }
    }
}
