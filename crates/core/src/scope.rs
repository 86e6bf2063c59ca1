use serde::{Deserialize, Serialize};
use std::fmt;

const PROFILE_PREFIX: &str = "profile:";
const ACCOUNT_PREFIX: &str = "account:";

/// Key of an isolated cooldown/risk/position namespace.
///
/// Each profile owns `profile:<id>`; ad-hoc manual runs use `account:<id>`.
/// Two profiles sharing one account always resolve to two distinct scopes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GuardrailScope(String);

impl GuardrailScope {
    #[must_use]
    pub fn for_profile(profile_id: &str) -> Self {
        Self(format!("{PROFILE_PREFIX}{profile_id}"))
    }

    #[must_use]
    pub fn for_account(account_id: &str) -> Self {
        Self(format!("{ACCOUNT_PREFIX}{account_id}"))
    }

    /// Rebuilds a scope from its string form (e.g. a trade-log tag).
    #[must_use]
    pub fn from_key(key: &str) -> Self {
        Self(key.to_string())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn is_profile_scope(&self) -> bool {
        self.0.starts_with(PROFILE_PREFIX)
    }
}

impl fmt::Display for GuardrailScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
