use serde::{Deserialize, Serialize};

/// Default endpoint: a local Ollama server exposing the OpenAI-compatible API.
pub const DEFAULT_ENDPOINT: &str = "http://localhost:11434/v1";

pub const DEFAULT_MODEL: &str = "deepseek-coder:6.7b";

/// Text generation provider configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Provider type.
    #[serde(default)]
    pub provider_type: ProviderType,

    /// Model identifier.
    #[serde(default = "default_model")]
    pub model: String,

    /// API key; Ollama ignores it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Base URL of the OpenAI-compatible API.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// Provider type enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ProviderType {
    #[serde(rename = "openai")]
    OpenAI,
    #[default]
    #[serde(rename = "ollama")]
    Ollama,
    #[serde(rename = "local")]
    LocalCustom,
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

fn default_timeout_secs() -> u64 {
    120
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            provider_type: ProviderType::default(),
            model: default_model(),
            api_key: None,
            endpoint: default_endpoint(),
            temperature: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl ProviderConfig {
    /// Endpoint without trailing slashes; local endpoints without a scheme get https.
    pub fn normalized_endpoint(&self) -> String {
        let endpoint = self.endpoint.trim().trim_end_matches('/');
        if self.provider_type == ProviderType::LocalCustom && !has_scheme(endpoint) {
            format!("https://{}", endpoint)
        } else {
            endpoint.to_string()
        }
    }

    /// Validate provider configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.model.trim().is_empty() {
            return Err("Model name cannot be empty".to_string());
        }

        let endpoint = self.normalized_endpoint();
        if !endpoint_url_is_valid(&endpoint) {
            return Err(format!("Invalid endpoint URL: {}", self.endpoint));
        }

        if self.provider_type == ProviderType::OpenAI && self.api_key.is_none() {
            return Err("OpenAI provider requires an api_key".to_string());
        }

        if let Some(temperature) = self.temperature {
            if !(0.0..=2.0).contains(&temperature) {
                return Err(format!(
                    "Temperature must be between 0.0 and 2.0, got {}",
                    temperature
                ));
            }
        }

        Ok(())
    }
}

fn has_scheme(endpoint: &str) -> bool {
    endpoint.starts_with("http://") || endpoint.starts_with("https://")
}

fn endpoint_url_is_valid(endpoint: &str) -> bool {
    let Some((_, rest)) = endpoint.split_once("://") else {
        return false;
    };
    if !has_scheme(endpoint) || rest.is_empty() || rest.chars().any(char::is_whitespace) {
        return false;
    }

    let authority = rest.split('/').next().unwrap_or_default();
    let host_port = authority.rsplit('@').next().unwrap_or(authority);
    let host = if let Some(stripped) = host_port.strip_prefix('[') {
        match stripped.find(']') {
            Some(end) => &stripped[..end],
            None => return false,
        }
    } else {
        host_port.split(':').next().unwrap_or_default()
    };

    !host.is_empty()
        && (host == "localhost" || host.contains('.') || host.parse::<std::net::IpAddr>().is_ok())
}
