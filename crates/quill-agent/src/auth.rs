//! Credential lookup for model and embedding providers
//!
//! Keys are read from the environment at first use, never at construction, so
//! a client can be built (and tested) without credentials present.

use quill_core::{QuillError, Result};
use std::env;

/// Read an API key from the named environment variable
///
/// Unset and empty variables both count as missing.
pub fn resolve_api_key(env_var: &str) -> Result<String> {
    match env::var(env_var) {
        Ok(key) if !key.trim().is_empty() => {
            tracing::debug!("Using credential from {}", env_var);
            Ok(key)
        }
        _ => Err(QuillError::MissingCredential(env_var.to_string())),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::Mutex;

    // Mutex to prevent concurrent env var modifications
    pub(crate) static ENV_LOCK: Mutex<()> = Mutex::new(());

    pub(crate) fn with_env_var<F, R>(key: &str, value: Option<&str>, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let original = env::var(key).ok();

        match value {
            Some(v) => env::set_var(key, v),
            None => env::remove_var(key),
        }

        let result = f();

        match original {
            Some(v) => env::set_var(key, v),
            None => env::remove_var(key),
        }

        result
    }

    #[test]
    fn test_key_present() {
        with_env_var("QUILL_TEST_KEY_PRESENT", Some("sk-test"), || {
            assert_eq!(resolve_api_key("QUILL_TEST_KEY_PRESENT").unwrap(), "sk-test");
        });
    }

    #[test]
    fn test_key_missing() {
        with_env_var("QUILL_TEST_KEY_MISSING", None, || {
            let err = resolve_api_key("QUILL_TEST_KEY_MISSING").unwrap_err();
            assert!(err.is_credential_related());
        });
    }

    #[test]
    fn test_empty_key_is_missing() {
        with_env_var("QUILL_TEST_KEY_EMPTY", Some("  "), || {
            assert!(matches!(
                resolve_api_key("QUILL_TEST_KEY_EMPTY"),
                Err(QuillError::MissingCredential(_))
            ));
        });
    }
}
