//! Company profile records and the poster text placeholder policy

use crate::error::{PosterError, Result};
use crate::types::PosterSpec;
use image::DynamicImage;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const PLACEHOLDER_COMPANY_NAME: &str = "Your Company";
pub const PLACEHOLDER_BUSINESS_TYPE: &str = "Your Business";
pub const PLACEHOLDER_PHONE_NUMBER: &str = "+91 00000 00000";
pub const PLACEHOLDER_TAGLINE: &str = "Your trusted partner";

/// `value` trimmed, or `placeholder` when nothing is left
#[must_use]
pub fn or_placeholder(value: &str, placeholder: &str) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        placeholder.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Business identity as collected by the onboarding flow
///
/// Every field is optional; missing values fall back to placeholders when the
/// poster is rendered.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CompanyProfile {
    pub company_name: Option<String>,
    pub business_type: Option<String>,
    pub phone_number: Option<String>,
    pub tagline: Option<String>,
}

impl CompanyProfile {
    /// Parse a profile from JSON
    ///
    /// Accepts camelCase keys (`companyName`, `businessType`, ...).
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| PosterError::invalid_config(format!("Invalid company profile JSON: {}", e)))
    }

    /// Load a profile from a JSON file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_ref = path.as_ref();
        let json = std::fs::read_to_string(path_ref)
            .map_err(|e| PosterError::file_io_error("read company profile", path_ref, &e))?;
        Self::from_json_str(&json)
    }

    /// Poster text with placeholders applied
    #[must_use]
    pub fn poster_text(&self) -> PosterText {
        PosterText::resolve(
            self.company_name.as_deref().unwrap_or_default(),
            self.business_type.as_deref().unwrap_or_default(),
            self.phone_number.as_deref().unwrap_or_default(),
            self.tagline.as_deref().unwrap_or_default(),
        )
    }

    /// Combine with images into a render request
    #[must_use]
    pub fn into_poster_spec(self, foreground: DynamicImage, template: DynamicImage) -> PosterSpec {
        let text = self.poster_text();
        PosterSpec {
            company_name: text.company_name,
            business_type: text.business_type,
            phone_number: text.phone_number,
            tagline: text.tagline,
            foreground,
            template,
        }
    }
}

/// The four text fields drawn on a poster, never empty
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PosterText {
    pub company_name: String,
    pub business_type: String,
    pub phone_number: String,
    pub tagline: String,
}

impl PosterText {
    #[must_use]
    pub fn resolve(company_name: &str, business_type: &str, phone_number: &str, tagline: &str) -> Self {
        Self {
            company_name: or_placeholder(company_name, PLACEHOLDER_COMPANY_NAME),
            business_type: or_placeholder(business_type, PLACEHOLDER_BUSINESS_TYPE),
            phone_number: or_placeholder(phone_number, PLACEHOLDER_PHONE_NUMBER),
            tagline: or_placeholder(tagline, PLACEHOLDER_TAGLINE),
        }
    }

    #[must_use]
    pub fn from_spec(spec: &PosterSpec) -> Self {
        Self::resolve(
            &spec.company_name,
            &spec.business_type,
            &spec.phone_number,
            &spec.tagline,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_empty_profile_uses_placeholders() {
        let text = CompanyProfile::default().poster_text();
        assert_eq!(text.company_name, "Your Company");
        assert_eq!(text.business_type, "Your Business");
        assert_eq!(text.phone_number, "+91 00000 00000");
        assert_eq!(text.tagline, "Your trusted partner");
    }

    #[test]
    fn test_whitespace_counts_as_missing() {
        let profile = CompanyProfile {
            company_name: Some("   ".to_string()),
            tagline: Some("  Fresh every day ".to_string()),
            ..CompanyProfile::default()
        };
        let text = profile.poster_text();
        assert_eq!(text.company_name, PLACEHOLDER_COMPANY_NAME);
        assert_eq!(text.tagline, "Fresh every day");
    }

    #[test]
    fn test_profile_json_camel_case() {
        let profile = CompanyProfile::from_json_str(
            r#"{"companyName":"Sharma Sweets","businessType":"Bakery","phoneNumber":"+91 98765 43210"}"#,
        )
        .unwrap();
        assert_eq!(profile.company_name.as_deref(), Some("Sharma Sweets"));
        assert_eq!(profile.tagline, None);
        assert_eq!(profile.poster_text().tagline, PLACEHOLDER_TAGLINE);
    }

    #[test]
    fn test_profile_invalid_json() {
        let err = CompanyProfile::from_json_str("{ not json").unwrap_err();
        assert!(matches!(err, PosterError::InvalidConfig(_)));
    }

    #[test]
    fn test_profile_load_from_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("profile.json");
        std::fs::write(&path, r#"{"companyName":"Acme","tagline":"We fix things"}"#).unwrap();

        let profile = CompanyProfile::load(&path).unwrap();
        assert_eq!(profile.company_name.as_deref(), Some("Acme"));
        assert!(CompanyProfile::load(dir.path().join("missing.json")).is_err());
    }

    #[test]
    fn test_into_poster_spec() {
        let profile = CompanyProfile {
            company_name: Some("Acme".to_string()),
            ..CompanyProfile::default()
        };
        let spec = profile.into_poster_spec(DynamicImage::new_rgba8(2, 2), DynamicImage::new_rgba8(4, 4));
        assert_eq!(spec.company_name, "Acme");
        assert_eq!(spec.phone_number, PLACEHOLDER_PHONE_NUMBER);
        assert_eq!(spec.template.width(), 4);
    }
}
