//! Response wrappers used by the ScriptHive backend.
//!
//! Most endpoints answer `{status, message, body}`; the listing endpoints for
//! projects and transactions answer `{status, data: [...]}` instead.

use serde::Deserialize;

/// Value of `status` the backend uses for a successful call.
pub const STATUS_SUCCESS: &str = "success";

#[derive(Debug, Clone, Deserialize)]
pub struct Envelope<T> {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default = "Option::default")]
    pub body: Option<T>,
}

impl<T> Envelope<T> {
    pub fn is_success(&self) -> bool {
        self.status.as_deref() == Some(STATUS_SUCCESS)
    }

    /// The server-supplied message, or `fallback` when there is none.
    pub fn message_or(&self, fallback: &str) -> String {
        match self.message.as_deref() {
            Some(m) if !m.trim().is_empty() => m.to_string(),
            _ => fallback.to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DataEnvelope<T> {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
}

impl<T> DataEnvelope<T> {
    pub fn is_success(&self) -> bool {
        self.status.as_deref() == Some(STATUS_SUCCESS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_requires_exact_status() {
        let ok: Envelope<String> =
            serde_json::from_str(r#"{"status":"success","body":"x"}"#).unwrap();
        assert!(ok.is_success());
        assert_eq!(ok.body.as_deref(), Some("x"));

        let failed: Envelope<String> =
            serde_json::from_str(r#"{"status":"error","message":"Invalid credentials"}"#).unwrap();
        assert!(!failed.is_success());
        assert_eq!(failed.message_or("fallback"), "Invalid credentials");
        assert!(failed.body.is_none());

        let bare: Envelope<String> = serde_json::from_str("{}").unwrap();
        assert!(!bare.is_success());
        assert_eq!(bare.message_or("Something went wrong"), "Something went wrong");
    }

    #[test]
    fn test_data_envelope_defaults_to_empty() {
        let parsed: DataEnvelope<u32> = serde_json::from_str(r#"{"status":"success"}"#).unwrap();
        assert!(parsed.is_success());
        assert!(parsed.data.is_empty());
    }
}
