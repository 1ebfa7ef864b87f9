//! API key providers.

/// Environment variable read by [`EnvApiKey::default`].
pub const DEFAULT_API_KEY_VAR: &str = "RATEWISE_API_KEY";

/// Supplies the API key for the remote pricing source.
pub trait ApiKeyProvider: Send + Sync {
    /// The key, or `None` when it is not available.
    fn load_api_key(&self) -> Option<String>;
}

/// A key known up front.
#[derive(Clone)]
pub struct StaticApiKey(String);

impl StaticApiKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }
}

impl ApiKeyProvider for StaticApiKey {
    fn load_api_key(&self) -> Option<String> {
        Some(self.0.clone())
    }
}

// Keep the key out of debug output.
impl std::fmt::Debug for StaticApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("StaticApiKey(***)")
    }
}

/// A key read from an environment variable on every load.
#[derive(Debug, Clone)]
pub struct EnvApiKey {
    var: String,
}

impl EnvApiKey {
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }

    /// Name of the variable consulted.
    pub fn var(&self) -> &str {
        &self.var
    }
}

impl Default for EnvApiKey {
    fn default() -> Self {
        Self::new(DEFAULT_API_KEY_VAR)
    }
}

impl ApiKeyProvider for EnvApiKey {
    fn load_api_key(&self) -> Option<String> {
        std::env::var(&self.var).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_key() {
        let provider = StaticApiKey::new("secret");
        assert_eq!(provider.load_api_key().as_deref(), Some("secret"));
        assert!(!format!("{:?}", provider).contains("secret"));
    }

    #[test]
    fn test_env_key_missing_variable() {
        let provider = EnvApiKey::new("RATEWISE_TEST_KEY_THAT_IS_NEVER_SET");
        assert_eq!(provider.load_api_key(), None);
    }

    #[test]
    fn test_env_key_reads_variable() {
        std::env::set_var("RATEWISE_TEST_KEY_PRESENT", "abc123");
        let provider = EnvApiKey::new("RATEWISE_TEST_KEY_PRESENT");
        assert_eq!(provider.load_api_key().as_deref(), Some("abc123"));
        assert_eq!(EnvApiKey::default().var(), DEFAULT_API_KEY_VAR);
    }
}
