//! Environment variable loading for [`Settings`].
//!
//! Field names map to upper-cased environment variables (`api_key` →
//! `API_KEY`).  `api_key` is the only required value; everything else falls
//! back to [`Settings::default()`].

use std::env;

use super::{ConfigError, schema::Settings};

/// Assemble [`Settings`] from the process environment.
///
/// Fails with [`ConfigError::MissingRequired`] when `API_KEY` is absent and
/// with [`ConfigError::InvalidValue`] when a numeric variable does not parse.
pub fn load_settings() -> Result<Settings, ConfigError> {
    let mut settings = Settings::default();

    settings.api_key =
        env_opt("API_KEY").ok_or(ConfigError::MissingRequired("API_KEY"))?;

    if let Some(v) = env_opt("API_BASE") {
        settings.api_base = v;
    }
    if let Some(v) = env_opt("MODEL_NAME") {
        settings.model_name = v;
    }
    if let Some(v) = env_opt("TEMPERATURE") {
        settings.temperature = parse("TEMPERATURE", &v)?;
    }
    if let Some(v) = env_opt("MAX_TOKENS") {
        settings.max_tokens = Some(parse("MAX_TOKENS", &v)?);
    }

    settings.sandbox_address = env_opt("SANDBOX_ADDRESS");
    settings.sandbox_image = env_opt("SANDBOX_IMAGE");
    settings.sandbox_name_prefix = env_opt("SANDBOX_NAME_PREFIX");
    if let Some(v) = env_opt("SANDBOX_TTL_MINUTES") {
        settings.sandbox_ttl_minutes = parse("SANDBOX_TTL_MINUTES", &v)?;
    }
    settings.sandbox_network = env_opt("SANDBOX_NETWORK");
    if let Some(v) = env_opt("SANDBOX_CHROME_ARGS") {
        settings.sandbox_chrome_args = v;
    }
    settings.sandbox_https_proxy = env_opt("SANDBOX_HTTPS_PROXY");
    settings.sandbox_http_proxy = env_opt("SANDBOX_HTTP_PROXY");
    settings.sandbox_no_proxy = env_opt("SANDBOX_NO_PROXY");

    settings.google_search_api_key = env_opt("GOOGLE_SEARCH_API_KEY");
    settings.google_search_engine_id = env_opt("GOOGLE_SEARCH_ENGINE_ID");

    if let Some(v) = env_opt("LOG_LEVEL") {
        settings.log_level = v;
    }
    if let Some(v) = env_opt("HOST") {
        settings.host = v;
    }
    if let Some(v) = env_opt("PORT") {
        settings.port = parse("PORT", &v)?;
    }

    Ok(settings)
}

/// Read a variable, treating empty strings as unset.
fn env_opt(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.is_empty())
}

fn parse<T: std::str::FromStr>(name: &'static str, value: &str) -> Result<T, ConfigError> {
    value.parse().map_err(|_| ConfigError::InvalidValue {
        name,
        value: value.to_owned(),
    })
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
#[allow(unsafe_code)] // env::set_var / remove_var are unsafe in Rust 2024; tests run serially.
mod tests {
    use super::*;

    // Serialise env mutation across tests in this module.
    static ENV_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());

    const ALL_VARS: &[&str] = &[
        "API_KEY",
        "API_BASE",
        "MODEL_NAME",
        "TEMPERATURE",
        "MAX_TOKENS",
        "SANDBOX_ADDRESS",
        "SANDBOX_IMAGE",
        "SANDBOX_NAME_PREFIX",
        "SANDBOX_TTL_MINUTES",
        "SANDBOX_NETWORK",
        "SANDBOX_CHROME_ARGS",
        "SANDBOX_HTTPS_PROXY",
        "SANDBOX_HTTP_PROXY",
        "SANDBOX_NO_PROXY",
        "GOOGLE_SEARCH_API_KEY",
        "GOOGLE_SEARCH_ENGINE_ID",
        "LOG_LEVEL",
        "HOST",
        "PORT",
    ];

    fn with_env(vars: &[(&str, &str)], f: impl FnOnce()) {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        for k in ALL_VARS {
            // SAFETY: guarded by ENV_LOCK; no concurrent readers in this module.
            unsafe { env::remove_var(k) };
        }
        for (k, v) in vars {
            // SAFETY: same as remove_var above.
            unsafe { env::set_var(k, v) };
        }
        f();
        for (k, _) in vars {
            // SAFETY: same as remove_var above.
            unsafe { env::remove_var(k) };
        }
    }

    #[test]
    fn missing_api_key_is_fatal() {
        with_env(&[], || {
            let err = load_settings().unwrap_err();
            assert!(matches!(err, ConfigError::MissingRequired("API_KEY")));
        });
    }

    #[test]
    fn minimal_env_uses_defaults() {
        with_env(&[("API_KEY", "sk-test")], || {
            let s = load_settings().unwrap();
            assert_eq!(s.api_key, "sk-test");
            assert_eq!(s.model_name, "deepseek-chat");
            assert_eq!(s.max_tokens, Some(2000));
            assert!(s.sandbox_address.is_none());
        });
    }

    #[test]
    fn overrides_apply() {
        with_env(
            &[
                ("API_KEY", "sk-test"),
                ("MODEL_NAME", "gpt-4o-mini"),
                ("TEMPERATURE", "0.2"),
                ("SANDBOX_ADDRESS", "sandbox.internal"),
                ("PORT", "9000"),
            ],
            || {
                let s = load_settings().unwrap();
                assert_eq!(s.model_name, "gpt-4o-mini");
                assert_eq!(s.temperature, 0.2);
                assert_eq!(s.sandbox_address.as_deref(), Some("sandbox.internal"));
                assert_eq!(s.port, 9000);
            },
        );
    }

    #[test]
    fn invalid_number_is_rejected() {
        with_env(&[("API_KEY", "sk-test"), ("PORT", "not-a-port")], || {
            let err = load_settings().unwrap_err();
            assert!(matches!(err, ConfigError::InvalidValue { name: "PORT", .. }));
        });
    }

    #[test]
    fn empty_values_count_as_unset() {
        with_env(&[("API_KEY", "sk-test"), ("SANDBOX_ADDRESS", "")], || {
            let s = load_settings().unwrap();
            assert!(s.sandbox_address.is_none());
        });
    }
}
