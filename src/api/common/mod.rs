//! Common API types and serde helpers

pub mod validated_json;

pub use validated_json::ValidatedJson;

use serde::{Deserialize, Deserializer, Serialize};
use utoipa::ToSchema;

/// Standard response envelope.
///
/// On success: `{"success": true, "data": {...}}`,
/// on error: `{"success": false, "error": "description"}`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiResponse<T> {
    /// `true` if the request succeeded
    pub success: bool,
    /// Payload; `null` on error
    pub data: Option<T>,
    /// Error description; `null` on success
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

/// Deserializer for patch fields of nullable columns.
///
/// With `#[serde(default, deserialize_with = "double_option")]` on an
/// `Option<Option<T>>` field, a missing key stays `None` (leave the column
/// alone) while an explicit JSON `null` becomes `Some(None)` (clear it).
pub fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Deserialize::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize)]
    struct Patch {
        #[serde(default)]
        title: Option<String>,
        #[serde(default, deserialize_with = "double_option")]
        summary: Option<Option<String>>,
    }

    #[test]
    fn absent_field_stays_none() {
        let p: Patch = serde_json::from_str(r#"{"title": "x"}"#).unwrap();
        assert_eq!(p.title.as_deref(), Some("x"));
        assert_eq!(p.summary, None);
    }

    #[test]
    fn explicit_null_is_distinguishable() {
        let p: Patch = serde_json::from_str(r#"{"summary": null}"#).unwrap();
        assert_eq!(p.title, None);
        assert_eq!(p.summary, Some(None));
    }

    #[test]
    fn explicit_value_round_trips() {
        let p: Patch = serde_json::from_str(r#"{"summary": "short"}"#).unwrap();
        assert_eq!(p.summary, Some(Some("short".to_string())));
    }
}
