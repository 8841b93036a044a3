//! Runtime configuration.
//!
//! Everything is read from the environment with development defaults, so
//! the binary runs against local services with no setup. Credentials are
//! collected once here and handed to the components that need them; no
//! component reads the environment on its own.

use std::env;
use std::time::Duration;

/// Environment variable names, public so tests and deploy scripts can
/// refer to them.
pub const ENV_STORE_PATH: &str = "NEWSDESK_STORE_PATH";
pub const ENV_WORDPRESS_URL: &str = "WORDPRESS_URL";
pub const ENV_WORDPRESS_USERNAME: &str = "WORDPRESS_USERNAME";
pub const ENV_WORDPRESS_APP_PASSWORD: &str = "WORDPRESS_APP_PASSWORD";
pub const ENV_GEMINI_API_KEY: &str = "GEMINI_API_KEY";
pub const ENV_GEMINI_API_BASE: &str = "GEMINI_API_BASE";
pub const ENV_HF_API_KEY: &str = "HF_API_KEY";
pub const ENV_HF_API_BASE: &str = "HF_API_BASE";

const DEFAULT_STORE_PATH: &str = "./newsdesk-store.json";
const DEFAULT_GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com";
const DEFAULT_HF_API_BASE: &str = "https://api-inference.huggingface.co";

/// CMS endpoint plus the credential pair encoded once per publisher.
#[derive(Debug, Clone)]
pub struct CmsSettings {
    /// Site root, e.g. `https://news.example.com` (no trailing slash).
    pub base_url: String,
    pub username: String,
    pub app_password: String,
}

/// Full runtime settings, assembled in `main` and passed explicitly into
/// each component constructor.
#[derive(Debug, Clone)]
pub struct Settings {
    pub store_path: String,
    pub cms: CmsSettings,
    pub gemini_api_key: String,
    pub gemini_api_base: String,
    pub hf_api_key: String,
    pub hf_api_base: String,
    /// Spacing between consecutive pipeline runs.
    pub run_interval: Duration,
}

impl Settings {
    /// Load from the environment, falling back to development defaults for
    /// everything except credentials, which default to empty strings and
    /// simply fail at the collaborator when unset.
    pub fn from_env() -> Self {
        Self {
            store_path: env::var(ENV_STORE_PATH)
                .unwrap_or_else(|_| DEFAULT_STORE_PATH.to_string()),
            cms: CmsSettings {
                base_url: env::var(ENV_WORDPRESS_URL)
                    .unwrap_or_default()
                    .trim_end_matches('/')
                    .to_string(),
                username: env::var(ENV_WORDPRESS_USERNAME).unwrap_or_default(),
                app_password: env::var(ENV_WORDPRESS_APP_PASSWORD).unwrap_or_default(),
            },
            gemini_api_key: env::var(ENV_GEMINI_API_KEY).unwrap_or_default(),
            gemini_api_base: env::var(ENV_GEMINI_API_BASE)
                .unwrap_or_else(|_| DEFAULT_GEMINI_API_BASE.to_string()),
            hf_api_key: env::var(ENV_HF_API_KEY).unwrap_or_default(),
            hf_api_base: env::var(ENV_HF_API_BASE)
                .unwrap_or_else(|_| DEFAULT_HF_API_BASE.to_string()),
            run_interval: Duration::from_secs(600),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // Environment-variable manipulating tests run serially.
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    fn clear_env() {
        for key in [
            ENV_STORE_PATH,
            ENV_WORDPRESS_URL,
            ENV_WORDPRESS_USERNAME,
            ENV_WORDPRESS_APP_PASSWORD,
            ENV_GEMINI_API_KEY,
            ENV_GEMINI_API_BASE,
            ENV_HF_API_KEY,
            ENV_HF_API_BASE,
        ] {
            unsafe {
                env::remove_var(key);
            }
        }
    }

    #[test]
    fn defaults_when_env_missing() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();
        let settings = Settings::from_env();
        assert_eq!(settings.store_path, DEFAULT_STORE_PATH);
        assert_eq!(settings.gemini_api_base, DEFAULT_GEMINI_API_BASE);
        assert_eq!(settings.run_interval, Duration::from_secs(600));
        assert!(settings.cms.base_url.is_empty());
    }

    #[test]
    fn trims_trailing_slash_from_cms_url() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();
        unsafe {
            env::set_var(ENV_WORDPRESS_URL, "https://news.example.com/");
        }
        let settings = Settings::from_env();
        assert_eq!(settings.cms.base_url, "https://news.example.com");
        unsafe {
            env::remove_var(ENV_WORDPRESS_URL);
        }
    }
}
