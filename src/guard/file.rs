//! Upload metadata checks.

use serde::{Deserialize, Serialize};

use crate::config::schema::UploadConfig;

const MIB: f64 = 1024.0 * 1024.0;

/// Caller-supplied description of an uploaded file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileDescriptor {
    pub size_bytes: u64,
    pub mime_type: String,
    pub file_name: String,
}

/// Result of checking a [`FileDescriptor`]. Lists every violation found.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileCheck {
    pub is_valid: bool,
    pub errors: Vec<String>,
}

/// Check a file against `policy`. All checks run; violations accumulate.
pub fn validate_file_upload(file: Option<&FileDescriptor>, policy: &UploadConfig) -> FileCheck {
    let Some(file) = file else {
        return FileCheck {
            is_valid: false,
            errors: vec!["No file provided".to_string()],
        };
    };

    let mut errors = Vec::new();

    if file.size_bytes > policy.max_size_bytes {
        errors.push(format!(
            "File size exceeds {}MB limit",
            policy.max_size_bytes as f64 / MIB
        ));
    }

    if !policy.allowed_mime_types.iter().any(|t| t == &file.mime_type) {
        errors.push("File type not allowed".to_string());
    }

    let extension = extension_of(&file.file_name);
    if !policy.allowed_extensions.iter().any(|e| e.eq_ignore_ascii_case(&extension)) {
        errors.push("File extension not allowed".to_string());
    }

    // "invoice.pdf.exe" style double extensions
    if file.file_name.split('.').count() > 2 {
        errors.push("Suspicious filename detected".to_string());
    }

    FileCheck {
        is_valid: errors.is_empty(),
        errors,
    }
}

/// `"."` followed by the lower-cased last dot segment of `name`.
fn extension_of(name: &str) -> String {
    let last = name.rsplit('.').next().unwrap_or_default();
    format!(".{}", last.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(name: &str, mime: &str, size: u64) -> FileDescriptor {
        FileDescriptor {
            size_bytes: size,
            mime_type: mime.to_string(),
            file_name: name.to_string(),
        }
    }

    #[test]
    fn test_valid_file() {
        let check = validate_file_upload(Some(&file("notes.md", "text/markdown", 1024)), &UploadConfig::default());
        assert!(check.is_valid);
        assert!(check.errors.is_empty());
    }

    #[test]
    fn test_extension_case_insensitive() {
        let check = validate_file_upload(Some(&file("PHOTO.JPG", "image/jpeg", 10)), &UploadConfig::default());
        assert!(check.is_valid, "{:?}", check.errors);
    }

    #[test]
    fn test_missing_file() {
        let check = validate_file_upload(None, &UploadConfig::default());
        assert!(!check.is_valid);
        assert_eq!(check.errors, vec!["No file provided".to_string()]);
    }

    #[test]
    fn test_double_extension_with_allowed_mime() {
        let check = validate_file_upload(
            Some(&file("invoice.pdf.exe", "application/pdf", 100)),
            &UploadConfig::default(),
        );
        assert!(!check.is_valid);
        assert!(check.errors.contains(&"Suspicious filename detected".to_string()));
        assert!(check.errors.contains(&"File extension not allowed".to_string()));
        assert!(!check.errors.contains(&"File type not allowed".to_string()));
    }

    #[test]
    fn test_double_extension_even_if_last_allowed() {
        let check = validate_file_upload(
            Some(&file("archive.exe.pdf", "application/pdf", 100)),
            &UploadConfig::default(),
        );
        assert_eq!(check.errors, vec!["Suspicious filename detected".to_string()]);
    }

    #[test]
    fn test_all_violations_reported() {
        let check = validate_file_upload(
            Some(&file("payload.tar.gz", "application/gzip", 11 * 1024 * 1024)),
            &UploadConfig::default(),
        );
        assert_eq!(
            check.errors,
            vec![
                "File size exceeds 10MB limit".to_string(),
                "File type not allowed".to_string(),
                "File extension not allowed".to_string(),
                "Suspicious filename detected".to_string(),
            ]
        );
    }

    #[test]
    fn test_size_boundary() {
        let policy = UploadConfig::default();
        let at_limit = file("a.png", "image/png", policy.max_size_bytes);
        assert!(validate_file_upload(Some(&at_limit), &policy).is_valid);
        let over = file("a.png", "image/png", policy.max_size_bytes + 1);
        assert!(!validate_file_upload(Some(&over), &policy).is_valid);
    }

    #[test]
    fn test_fractional_limit_message() {
        let policy = UploadConfig {
            max_size_bytes: 512 * 1024,
            ..UploadConfig::default()
        };
        let check = validate_file_upload(Some(&file("a.png", "image/png", 600 * 1024)), &policy);
        assert_eq!(check.errors, vec!["File size exceeds 0.5MB limit".to_string()]);
    }

    #[test]
    fn test_extension_of() {
        assert_eq!(extension_of("a.TXT"), ".txt");
        assert_eq!(extension_of("noext"), ".noext");
        assert_eq!(extension_of("trailing."), ".");
    }
}
