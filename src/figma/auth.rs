use crate::error::{Result, VdiffError};

pub const TOKEN_ENV: &str = "FIGMA_TOKEN";
pub const OAUTH_TOKEN_ENV: &str = "FIGMA_OAUTH_TOKEN";

#[derive(Clone)]
pub enum FigmaAuth {
    PersonalAccessToken(String),
    OAuthToken(String),
}

impl std::fmt::Debug for FigmaAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FigmaAuth::PersonalAccessToken(_) => f.write_str("PersonalAccessToken(***)"),
            FigmaAuth::OAuthToken(_) => f.write_str("OAuthToken(***)"),
        }
    }
}

impl FigmaAuth {
    /// Read a token from the environment, preferring the personal access token.
    ///
    /// Only the binary calls this; library entry points take the auth value
    /// explicitly.
    pub fn from_env() -> Option<Self> {
        if let Ok(token) = std::env::var(TOKEN_ENV) {
            if !token.trim().is_empty() {
                return Some(Self::PersonalAccessToken(token));
            }
        }

        if let Ok(token) = std::env::var(OAUTH_TOKEN_ENV) {
            if !token.trim().is_empty() {
                return Some(Self::OAuthToken(token));
            }
        }

        None
    }

    pub fn token(&self) -> &str {
        match self {
            FigmaAuth::PersonalAccessToken(token) | FigmaAuth::OAuthToken(token) => token,
        }
    }

    /// The request header carrying this credential.
    pub fn header(&self) -> Result<(String, String)> {
        if self.token().trim().is_empty() {
            return Err(VdiffError::MissingToken);
        }
        Ok(match self {
            FigmaAuth::PersonalAccessToken(token) => ("X-Figma-Token".to_string(), token.clone()),
            FigmaAuth::OAuthToken(token) => ("Authorization".to_string(), format!("Bearer {token}")),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn personal_access_token_uses_figma_header() {
        let auth = FigmaAuth::PersonalAccessToken("secret".into());
        let (name, value) = auth.header().unwrap();
        assert_eq!(name, "X-Figma-Token");
        assert_eq!(value, "secret");
    }

    #[test]
    fn oauth_token_uses_bearer_header() {
        let auth = FigmaAuth::OAuthToken("oauth_secret".into());
        let (name, value) = auth.header().unwrap();
        assert_eq!(name, "Authorization");
        assert_eq!(value, "Bearer oauth_secret");
    }

    #[test]
    fn blank_token_counts_as_missing() {
        let auth = FigmaAuth::PersonalAccessToken("  ".into());
        assert!(matches!(auth.header(), Err(VdiffError::MissingToken)));
    }

    #[test]
    fn debug_output_hides_token() {
        let auth = FigmaAuth::PersonalAccessToken("secret".into());
        assert!(!format!("{auth:?}").contains("secret"));
    }
}
