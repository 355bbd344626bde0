use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://picsum.photos/200/200";

/// Two pages of a 7x10 grid.
pub const DEFAULT_INITIAL_COUNT: usize = 140;

/// Board options.
#[derive(Debug, Clone)]
pub struct BoardOptions {
    /// Base locator; every identifier is this URL plus a uniqueness parameter.
    pub base_url: String,
    /// Number of identifiers generated by a reload.
    pub initial_count: usize,
    pub request_timeout: Duration,
    pub user_agent: Option<String>,
}

impl Default for BoardOptions {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            initial_count: DEFAULT_INITIAL_COUNT,
            request_timeout: Duration::from_secs(60),
            user_agent: Some(concat!("photoboard/", env!("CARGO_PKG_VERSION")).to_string()),
        }
    }
}
