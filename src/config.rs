/// Connection settings for the hosted backend. Built once by the
/// application's composition root and passed by reference — there is no
/// module-level cache and no implicit expiry; [`Config::reload`] is the
/// explicit refresh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub base_url: String,
    pub api_key: String,
    pub schema: String,
}

impl Config {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            schema: "public".into(),
        }
    }

    pub fn schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = schema.into();
        self
    }

    /// Read settings from `MEDSYNC_BASE_URL`, `MEDSYNC_API_KEY`, and
    /// `MEDSYNC_SCHEMA`.
    pub fn from_env() -> Self {
        Self {
            base_url: std::env::var("MEDSYNC_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:8000".into()),
            api_key: std::env::var("MEDSYNC_API_KEY").unwrap_or_default(),
            schema: std::env::var("MEDSYNC_SCHEMA").unwrap_or_else(|_| "public".into()),
        }
    }

    /// Re-read the environment in place.
    pub fn reload(&mut self) {
        *self = Self::from_env();
    }
}
