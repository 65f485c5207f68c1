//! QuantConnect credential resolution.
//!
//! Explicit values win; otherwise the two environment variables are
//! consulted. The environment is passed in as a snapshot so resolution stays
//! a pure function.

use super::error::TraderError;
use std::collections::HashMap;

pub const USER_ID_VAR: &str = "QC_USER_ID";
pub const API_TOKEN_VAR: &str = "QC_API_TOKEN";

#[derive(Clone, PartialEq, Eq)]
pub struct QcCredentials {
    pub user_id: String,
    pub api_token: String,
}

impl std::fmt::Debug for QcCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QcCredentials")
            .field("user_id", &self.user_id)
            .field("api_token", &"<redacted>")
            .finish()
    }
}

/// Snapshot of the process environment.
pub fn env_snapshot() -> HashMap<String, String> {
    std::env::vars().collect()
}

fn pick(explicit: Option<&str>, env: &HashMap<String, String>, var: &str) -> Option<String> {
    explicit
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .or_else(|| env.get(var).filter(|s| !s.is_empty()).cloned())
}

pub fn resolve_credentials(
    user_id: Option<&str>,
    api_token: Option<&str>,
    env: &HashMap<String, String>,
) -> Result<QcCredentials, TraderError> {
    match (
        pick(user_id, env, USER_ID_VAR),
        pick(api_token, env, API_TOKEN_VAR),
    ) {
        (Some(user_id), Some(api_token)) => Ok(QcCredentials { user_id, api_token }),
        _ => Err(TraderError::Configuration {
            reason: format!("set {USER_ID_VAR} and {API_TOKEN_VAR} environment variables"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn explicit_values_win() {
        let e = env(&[(USER_ID_VAR, "env-user"), (API_TOKEN_VAR, "env-token")]);
        let c = resolve_credentials(Some("me"), Some("secret"), &e).unwrap();
        assert_eq!(c.user_id, "me");
        assert_eq!(c.api_token, "secret");
    }

    #[test]
    fn falls_back_to_environment() {
        let e = env(&[(USER_ID_VAR, "env-user"), (API_TOKEN_VAR, "env-token")]);
        let c = resolve_credentials(None, None, &e).unwrap();
        assert_eq!(c.user_id, "env-user");
        assert_eq!(c.api_token, "env-token");
    }

    #[test]
    fn mixes_explicit_and_environment() {
        let e = env(&[(API_TOKEN_VAR, "env-token")]);
        let c = resolve_credentials(Some("me"), None, &e).unwrap();
        assert_eq!(c.user_id, "me");
        assert_eq!(c.api_token, "env-token");
    }

    #[test]
    fn empty_values_count_as_absent() {
        let e = env(&[(USER_ID_VAR, ""), (API_TOKEN_VAR, "env-token")]);
        let err = resolve_credentials(Some(""), None, &e).unwrap_err();
        assert!(matches!(err, TraderError::Configuration { .. }));
    }

    #[test]
    fn missing_everything_names_both_variables() {
        let err = resolve_credentials(None, None, &HashMap::new()).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains(USER_ID_VAR));
        assert!(msg.contains(API_TOKEN_VAR));
    }

    #[test]
    fn debug_hides_token() {
        let c = QcCredentials {
            user_id: "me".into(),
            api_token: "secret".into(),
        };
        assert!(!format!("{c:?}").contains("secret"));
    }
}
