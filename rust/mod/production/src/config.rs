use serde::Deserialize;

use crate::error::RequestError;

/// Intake rules for production requests.
///
/// Usually read from the `[request]` table of the front end's TOML file;
/// every field has a default so an empty table is valid.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RequestConfig {
    /// First segment of generated request numbers.
    pub number_prefix: String,

    /// Value the model picker shows before a choice is made. Submitting it
    /// is treated as "no model".
    pub model_placeholder: String,

    /// Allowed product models. Empty accepts any non-empty model.
    pub models: Vec<String>,

    /// Allowed lens suppliers. Empty accepts any value.
    pub lens_suppliers: Vec<String>,

    /// Lower-case file extensions accepted for attachments.
    pub attachment_extensions: Vec<String>,

    /// Upper bound on `quantity`; one serial row is kept per unit.
    pub max_quantity: u32,
}

impl Default for RequestConfig {
    fn default() -> Self {
        Self {
            number_prefix: "REQ".to_string(),
            model_placeholder: "선택하세요".to_string(),
            models: Vec::new(),
            lens_suppliers: Vec::new(),
            attachment_extensions: ["pdf", "png", "jpg", "xlsx"]
                .into_iter()
                .map(String::from)
                .collect(),
            max_quantity: 10_000,
        }
    }
}

impl RequestConfig {
    /// Reject settings the store cannot work with.
    pub fn validate(&self) -> Result<(), RequestError> {
        if self.number_prefix.is_empty()
            || !self
                .number_prefix
                .chars()
                .all(|c| c.is_ascii_alphanumeric())
        {
            return Err(RequestError::Validation(format!(
                "number prefix must be non-empty ASCII letters/digits, got {:?}",
                self.number_prefix
            )));
        }
        if self.max_quantity == 0 {
            return Err(RequestError::Validation("max quantity must be at least 1".into()));
        }
        if self.models.iter().any(|m| m == &self.model_placeholder) {
            return Err(RequestError::Validation(format!(
                "model catalog contains the placeholder {:?}",
                self.model_placeholder
            )));
        }
        Ok(())
    }

    pub(crate) fn allows_extension(&self, ext: &str) -> bool {
        self.attachment_extensions
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(ext))
    }
}
