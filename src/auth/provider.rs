use anyhow::Result;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::config::AuthConfig;

/// Verified identity returned by the provider's userinfo endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderIdentity {
    pub sub: String,
    pub email: String,
    pub given_name: Option<String>,
    pub family_name: Option<String>,
    pub name: Option<String>,
    pub picture: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ProviderTokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: u64,
    pub refresh_token: Option<String>,
}

pub struct IdentityProvider {
    config: AuthConfig,
    client: Client,
}

impl IdentityProvider {
    pub fn new(config: AuthConfig) -> Self {
        Self {
            config,
            client: Client::new(),
        }
    }

    pub fn is_configured(&self) -> bool {
        !self.config.provider_issuer_url.is_empty() && !self.config.provider_client_id.is_empty()
    }

    /// Authorization URL the client redirects the browser to.
    pub fn authorization_url(&self, state: &str) -> String {
        format!(
            "{}/oauth/v2/authorize?client_id={}&redirect_uri={}&response_type=code&scope=openid%20profile%20email&state={}",
            self.config.provider_issuer_url,
            self.config.provider_client_id,
            urlencoding::encode(&self.config.provider_redirect_uri),
            state
        )
    }

    /// Exchange an authorization code for provider tokens.
    pub async fn exchange_code(&self, code: &str) -> Result<ProviderTokenResponse> {
        let token_url = format!("{}/oauth/v2/token", self.config.provider_issuer_url);

        let params = [
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", &self.config.provider_redirect_uri),
            ("client_id", &self.config.provider_client_id),
            ("client_secret", &self.config.provider_client_secret),
        ];

        let response = self
            .client
            .post(&token_url)
            .form(&params)
            .send()
            .await?
            .error_for_status()?
            .json::<ProviderTokenResponse>()
            .await?;

        Ok(response)
    }

    /// Fetch the verified identity for an access token.
    pub async fn get_user_info(&self, access_token: &str) -> Result<ProviderIdentity> {
        let userinfo_url = format!("{}/oidc/v1/userinfo", self.config.provider_issuer_url);

        let response = self
            .client
            .get(&userinfo_url)
            .bearer_auth(access_token)
            .send()
            .await?
            .error_for_status()?
            .json::<ProviderIdentity>()
            .await?;

        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> AuthConfig {
        AuthConfig {
            jwt_secret: "0123456789abcdef0123456789abcdef".into(),
            access_token_minutes: 60,
            refresh_token_days: 7,
            provider_issuer_url: "https://idp.example.com".into(),
            provider_client_id: "client-1".into(),
            provider_client_secret: "shh".into(),
            provider_redirect_uri: "https://app.example.com/api/auth/callback".into(),
        }
    }

    #[test]
    fn test_authorization_url_encodes_redirect() {
        let provider = IdentityProvider::new(test_config());
        let url = provider.authorization_url("state-123");
        assert!(url.starts_with("https://idp.example.com/oauth/v2/authorize?client_id=client-1"));
        assert!(url.contains("redirect_uri=https%3A%2F%2Fapp.example.com%2Fapi%2Fauth%2Fcallback"));
        assert!(url.contains("state=state-123"));
    }

    #[test]
    fn test_is_configured() {
        assert!(IdentityProvider::new(test_config()).is_configured());
        let mut unconfigured = test_config();
        unconfigured.provider_issuer_url = String::new();
        assert!(!IdentityProvider::new(unconfigured).is_configured());
    }
}
