use std::env;
use std::fmt;

use thiserror::Error;

/// Project URL and key used to authenticate RPC calls.
///
/// The key is sent both as the `apikey` header and as a bearer token, which is
/// what PostgREST behind the Supabase gateway expects.
#[derive(Clone)]
pub struct Credentials {
    pub url: String,
    pub api_key: String,
}

#[derive(Error, Debug)]
pub enum CredentialsError {
    #[error("Missing environment variable: {0}")]
    MissingVariable(&'static str),
}

impl Credentials {
    pub fn new(url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            api_key: api_key.into(),
        }
    }

    /// Reads `SUPABASE_URL` and `SUPABASE_SERVICE_ROLE_KEY` from the environment.
    pub fn from_env() -> Result<Self, CredentialsError> {
        let url =
            env::var("SUPABASE_URL").map_err(|_| CredentialsError::MissingVariable("SUPABASE_URL"))?;
        let api_key = env::var("SUPABASE_SERVICE_ROLE_KEY")
            .map_err(|_| CredentialsError::MissingVariable("SUPABASE_SERVICE_ROLE_KEY"))?;

        Ok(Self::new(url, api_key))
    }

    pub fn bearer_header(&self) -> String {
        format!("Bearer {}", self.api_key)
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("url", &self.url)
            .field("api_key", &"<redacted>")
            .finish()
    }
}
