use super::fingerprint::BrowserProfile;
use jobsweep_common::StealthLevel;

/// Chrome launch arguments for the requested stealth tier and fingerprint.
pub fn build_stealth_arguments(level: StealthLevel, profile: &BrowserProfile) -> Vec<String> {
    let mut args = vec![
        "--disable-blink-features=AutomationControlled".to_string(),
        "--disable-infobars".to_string(),
        "--disable-dev-shm-usage".to_string(),
        "--no-sandbox".to_string(),
        "--disable-extensions".to_string(),
        "--disable-plugins-discovery".to_string(),
        format!("--user-agent={}", profile.user_agent),
        format!(
            "--window-size={},{}",
            profile.viewport.0, profile.viewport.1
        ),
        format!("--lang={}", profile.languages.join(",")),
    ];
    if let StealthLevel::Maximum = level {
        args.push("--disable-gpu".to_string());
    }
    args
}

/// JavaScript evasions applied after navigation to mask automation markers.
pub struct StealthScripts;

impl StealthScripts {
    /// Baseline overrides every tier applies: the `webdriver` flag, the
    /// plugin list, languages, and `window.chrome`.
    pub fn core_evasions() -> &'static str {
        r#"
            Object.defineProperty(navigator, 'webdriver', { get: () => undefined });
            Object.defineProperty(navigator, 'plugins', { get: () => [1,2,3] });
            Object.defineProperty(navigator, 'languages', {
                get: () => ['en-US', 'en']
            });
            if (!window.chrome) window.chrome = { runtime: {} };
        "#
    }

    /// Align `navigator.vendor` and `navigator.platform` with the profile.
    pub fn identity_overrides(profile: &BrowserProfile) -> String {
        format!(
            r#"
            Object.defineProperty(navigator, 'vendor', {{ get: () => '{}' }});
            Object.defineProperty(navigator, 'platform', {{ get: () => '{}' }});
        "#,
            profile.vendor, profile.platform
        )
    }

    /// Report the profile's GPU strings for the WebGL vendor/renderer
    /// parameters (0x9245 and 0x9246) fingerprinting scripts query.
    pub fn webgl_overrides(profile: &BrowserProfile) -> String {
        format!(
            r#"
            const getParameter = WebGLRenderingContext.prototype.getParameter;
            WebGLRenderingContext.prototype.getParameter = function(parameter) {{
                if (parameter === 37445) return '{}';
                if (parameter === 37446) return '{}';
                return getParameter.call(this, parameter);
            }};
        "#,
            profile.webgl_vendor, profile.webgl_renderer
        )
    }
}
