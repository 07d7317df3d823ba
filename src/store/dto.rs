use serde::Deserialize;

/// Error body returned by PostgREST.
#[derive(Debug, Deserialize)]
pub struct PostgrestError {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub details: Option<String>,
    #[serde(default)]
    pub hint: Option<String>,
}

impl PostgrestError {
    pub fn summary(&self) -> String {
        let mut parts = Vec::new();
        if let Some(code) = &self.code {
            parts.push(format!("[{}]", code));
        }
        if let Some(message) = &self.message {
            parts.push(message.clone());
        }
        if let Some(details) = &self.details {
            parts.push(format!("details: {}", details));
        }
        if let Some(hint) = &self.hint {
            parts.push(format!("hint: {}", hint));
        }
        parts.join(" ")
    }
}

/// Error body returned by the storage API.
#[derive(Debug, Deserialize)]
pub struct StorageError {
    #[serde(default, rename = "statusCode")]
    pub status_code: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UploadResponse {
    #[serde(rename = "Key")]
    pub key: String,
}
