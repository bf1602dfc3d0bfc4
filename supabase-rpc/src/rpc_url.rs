#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RpcUrl(String);

impl AsRef<str> for RpcUrl {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl RpcUrl {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self(base_url.into())
    }

    /// URL of the PostgREST endpoint for the given function.
    pub fn for_function(base_url: &str, function: &str) -> Self {
        Self::new(base_url)
            .append_path("/rest/v1/rpc")
            .append_path(function)
    }

    /// Append the given path to the URL.
    pub fn append_path(&self, path: &str) -> Self {
        let trimmed_url = self.0.trim_end_matches('/');
        let trimmed_path = path.trim_start_matches('/');
        Self(format!("{}/{}", trimmed_url, trimmed_path))
    }
}
