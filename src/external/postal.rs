//! Postal code (CEP) lookup
//!
//! Talks to a ViaCEP-compatible service: `GET {base}/ws/{8 digits}/json/`.
//! Unknown codes come back as HTTP 200 with `{"erro": true}`.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PostalError {
    #[error("postal code must have exactly 8 digits")]
    InvalidFormat,

    #[error("postal service request failed: {0}")]
    Http(#[from] reqwest::Error),
}

/// Address fields returned for a postal code
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Address {
    #[serde(rename = "postalCode")]
    pub postal_code: String,
    pub street: String,
    pub complement: String,
    pub neighborhood: String,
    pub city: String,
    pub state: String,
}

#[derive(Debug, Deserialize)]
struct ViaCepResponse {
    #[serde(default)]
    cep: String,
    #[serde(default)]
    logradouro: String,
    #[serde(default)]
    complemento: String,
    #[serde(default)]
    bairro: String,
    #[serde(default)]
    localidade: String,
    #[serde(default)]
    uf: String,
    #[serde(default)]
    erro: Option<serde_json::Value>,
}

impl ViaCepResponse {
    fn not_found(&self) -> bool {
        match &self.erro {
            Some(serde_json::Value::Bool(flag)) => *flag,
            Some(serde_json::Value::String(flag)) => flag == "true",
            _ => false,
        }
    }
}

#[derive(Clone)]
pub struct PostalClient {
    http: reqwest::Client,
    base_url: String,
}

impl PostalClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_default();
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Strip formatting ("01001-000") and require exactly 8 digits
    pub fn normalize(code: &str) -> Option<String> {
        let digits: String = code.chars().filter(|c| !c.is_whitespace() && *c != '-' && *c != '.').collect();
        if digits.len() == 8 && digits.chars().all(|c| c.is_ascii_digit()) {
            Some(digits)
        } else {
            None
        }
    }

    /// Look a code up; `Ok(None)` when the service does not know it.
    ///
    /// Malformed codes fail with `InvalidFormat` before any request is made.
    pub async fn lookup(&self, code: &str) -> Result<Option<Address>, PostalError> {
        let digits = Self::normalize(code).ok_or(PostalError::InvalidFormat)?;

        let url = format!("{}/ws/{}/json/", self.base_url, digits);
        tracing::debug!("Postal lookup: {}", url);

        let body: ViaCepResponse = self
            .http
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if body.not_found() {
            return Ok(None);
        }

        Ok(Some(Address {
            postal_code: if body.cep.is_empty() { digits } else { body.cep },
            street: body.logradouro,
            complement: body.complemento,
            neighborhood: body.bairro,
            city: body.localidade,
            state: body.uf,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    #[test]
    fn test_normalize() {
        assert_eq!(PostalClient::normalize("01001-000").as_deref(), Some("01001000"));
        assert_eq!(PostalClient::normalize("01001000").as_deref(), Some("01001000"));
        assert_eq!(PostalClient::normalize("0100100"), None);
        assert_eq!(PostalClient::normalize("010010000"), None);
        assert_eq!(PostalClient::normalize("0100a000"), None);
        assert_eq!(PostalClient::normalize(""), None);
    }

    #[tokio::test]
    async fn test_lookup_found() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET).path("/ws/01001000/json/");
                then.status(200).json_body(json!({
                    "cep": "01001-000",
                    "logradouro": "Praça da Sé",
                    "complemento": "lado ímpar",
                    "bairro": "Sé",
                    "localidade": "São Paulo",
                    "uf": "SP"
                }));
            })
            .await;

        let client = PostalClient::new(server.base_url());
        let address = client.lookup("01001-000").await.unwrap().unwrap();

        mock.assert_async().await;
        assert_eq!(address.city, "São Paulo");
        assert_eq!(address.state, "SP");
        assert_eq!(address.postal_code, "01001-000");
    }

    #[tokio::test]
    async fn test_lookup_not_found() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET).path("/ws/99999999/json/");
                then.status(200).json_body(json!({ "erro": true }));
            })
            .await;

        let client = PostalClient::new(server.base_url());
        assert_eq!(client.lookup("99999999").await.unwrap(), None);
        mock.assert_hits_async(1).await;
    }

    #[tokio::test]
    async fn test_invalid_code_never_hits_network() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET);
                then.status(200).json_body(json!({}));
            })
            .await;

        let client = PostalClient::new(server.base_url());
        for code in ["1234567", "123456789", "abcdefgh", ""] {
            assert!(matches!(client.lookup(code).await, Err(PostalError::InvalidFormat)));
        }
        mock.assert_hits_async(0).await;
    }

    #[tokio::test]
    async fn test_upstream_failure() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET);
                then.status(500);
            })
            .await;

        let client = PostalClient::new(server.base_url());
        assert!(matches!(client.lookup("01001000").await, Err(PostalError::Http(_))));
    }
}
