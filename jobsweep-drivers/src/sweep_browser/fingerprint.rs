use serde::{Deserialize, Serialize};

/// The browser identity presented to the target site.
///
/// Fixed for the lifetime of a session. The fields feed both the launch
/// arguments and the JS overrides applied after navigation, so the two never
/// disagree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserProfile {
    pub user_agent: String,
    pub viewport: (u32, u32),
    pub platform: String,
    pub vendor: String,
    pub webgl_vendor: String,
    pub webgl_renderer: String,
    pub languages: Vec<String>,
}

impl BrowserProfile {
    /// Plain desktop Chrome on Windows.
    pub fn desktop_chrome() -> Self {
        Self {
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/122.0.0.0 Safari/537.36".to_string(),
            viewport: (1920, 1080),
            platform: "Win32".to_string(),
            vendor: "Google Inc.".to_string(),
            webgl_vendor: "Intel Inc.".to_string(),
            webgl_renderer: "Intel Iris OpenGL Engine".to_string(),
            languages: vec!["en-US".to_string(), "en".to_string()],
        }
    }
}
