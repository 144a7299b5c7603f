use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::Client;
use serde::Deserialize;
use tracing::info;

use crate::error::ZoomError;

const ZOOM_TOKEN_URL: &str = "https://zoom.us/oauth/token";

/// A freshly exchanged pair of tokens. Zoom invalidates the refresh token
/// presented for the exchange, so the new one must be persisted before the
/// access token is put to work.
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

pub struct AuthManager {
    client: Client,
    client_id: String,
    client_secret: String,
}

impl AuthManager {
    pub fn new(client_id: String, client_secret: String) -> Self {
        Self {
            client: Client::new(),
            client_id,
            client_secret,
        }
    }

    /// Exchange the stored refresh token for a fresh token pair.
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, ZoomError> {
        info!("Refreshing Zoom OAuth token");

        let params = [
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
        ];

        let response = self
            .client
            .post(ZOOM_TOKEN_URL)
            .header(
                reqwest::header::AUTHORIZATION,
                basic_auth_header(&self.client_id, &self.client_secret),
            )
            .form(&params)
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::UNAUTHORIZED {
            return Err(ZoomError::Authentication);
        }
        if !response.status().is_success() {
            let body = response.text().await?;
            return Err(ZoomError::TokenExchange(body));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| ZoomError::TokenExchange(e.to_string()))?;

        Ok(TokenPair {
            access_token: token.access_token,
            refresh_token: token.refresh_token,
        })
    }
}

fn basic_auth_header(client_id: &str, client_secret: &str) -> String {
    let raw = format!("{}:{}", client_id, client_secret);
    format!("Basic {}", STANDARD.encode(raw))
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_header_encodes_id_and_secret() {
        assert_eq!(basic_auth_header("abc", "xyz"), "Basic YWJjOnh5eg==");
    }
}
