//! Input checks applied before any remote write.

use crate::error::AppError;
use crate::model::{Coordinates, EvidenceUpload, MAX_EVIDENCE_BYTES};

pub const MAX_NAME_LEN: usize = 200;
pub const MAX_TEXT_LEN: usize = 20_000;

/// Trims `value` and rejects it when empty or longer than `max_len` characters.
pub fn required_text(field: &str, value: &str, max_len: usize) -> Result<String, AppError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::invalid(format!("{field} must not be empty")));
    }
    if trimmed.chars().count() > max_len {
        return Err(AppError::invalid(format!(
            "{field} must be at most {max_len} characters"
        )));
    }
    Ok(trimmed.to_string())
}

/// Trims an optional field; blank values become `None`.
pub fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

pub fn coordinates(location: Coordinates) -> Result<Coordinates, AppError> {
    if location.is_valid() {
        Ok(location)
    } else {
        Err(AppError::invalid(format!(
            "Coordinates out of range: {}, {}",
            location.latitude, location.longitude
        )))
    }
}

pub fn evidence(mut upload: EvidenceUpload) -> Result<EvidenceUpload, AppError> {
    upload.file_name = required_text("File name", &upload.file_name, MAX_NAME_LEN)?;
    if upload.bytes.is_empty() {
        return Err(AppError::invalid("Evidence file is empty"));
    }
    if upload.bytes.len() > MAX_EVIDENCE_BYTES {
        return Err(AppError::invalid(format!(
            "Evidence file is larger than {} MB",
            MAX_EVIDENCE_BYTES / (1024 * 1024)
        )));
    }
    if upload.content_type.trim().is_empty() {
        upload.content_type = "application/octet-stream".to_string();
    }
    Ok(upload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::IncidentId;

    fn upload(size: usize) -> EvidenceUpload {
        EvidenceUpload {
            incident_id: IncidentId(1),
            file_name: " photo.jpg ".into(),
            content_type: String::new(),
            bytes: vec![0; size],
        }
    }

    #[test]
    fn test_required_text() {
        assert_eq!(required_text("Entry", "  hello \n", 10).unwrap(), "hello");
        assert!(matches!(required_text("Entry", "   ", 10), Err(AppError::InvalidInput(_))));
        assert!(required_text("Entry", "abcdef", 5).is_err());
    }

    #[test]
    fn test_optional_text() {
        assert_eq!(optional_text(Some("  ".into())), None);
        assert_eq!(optional_text(Some(" Main St ".into())), Some("Main St".into()));
        assert_eq!(optional_text(None), None);
    }

    #[test]
    fn test_evidence_limits() {
        let accepted = evidence(upload(1024)).unwrap();
        assert_eq!(accepted.file_name, "photo.jpg");
        assert_eq!(accepted.content_type, "application/octet-stream");

        assert!(evidence(upload(MAX_EVIDENCE_BYTES)).is_ok());
        assert!(evidence(upload(MAX_EVIDENCE_BYTES + 1)).is_err());
        assert!(evidence(upload(0)).is_err());
    }
}
