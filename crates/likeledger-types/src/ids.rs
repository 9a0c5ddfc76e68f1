use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{LedgerError, Result};

/// Opaque identifier of a post. The ledger never checks that the post exists.
///
/// Compared byte for byte, so ids with surrounding whitespace are rejected
/// rather than silently aliased to their trimmed form.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PostId(String);

impl PostId {
    pub fn parse(raw: &str) -> Result<Self> {
        if raw.trim().is_empty() {
            return Err(LedgerError::InvalidPostId("post id is empty".into()));
        }
        if raw.trim() != raw {
            return Err(LedgerError::InvalidPostId(format!(
                "post id {raw:?} has surrounding whitespace"
            )));
        }
        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PostId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for PostId {
    type Error = LedgerError;

    fn try_from(raw: String) -> Result<Self> {
        Self::parse(&raw)
    }
}

impl From<PostId> for String {
    fn from(id: PostId) -> Self {
        id.0
    }
}

impl From<u64> for PostId {
    fn from(id: u64) -> Self {
        Self(id.to_string())
    }
}

/// How liker identities are compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentityPolicy {
    /// Identities are compared exactly as submitted.
    #[default]
    Exact,
    /// ASCII case is folded, so `0xAB` and `0xab` are the same liker.
    CaseInsensitive,
}

impl IdentityPolicy {
    pub fn normalize(&self, raw: &str) -> String {
        match self {
            IdentityPolicy::Exact => raw.to_string(),
            IdentityPolicy::CaseInsensitive => raw.to_ascii_lowercase(),
        }
    }
}

/// Identity of an entity that liked a post, typically a wallet address.
///
/// Deserialized values must already be in stored form: non-blank and
/// trimmed. Identity policy is applied separately, at load.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LikerId(String);

impl LikerId {
    /// Trim, reject blanks, then apply `policy`.
    pub fn parse(raw: &str, policy: IdentityPolicy) -> Result<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(LedgerError::InvalidIdentity(
                "liker address is missing or empty".into(),
            ));
        }
        Ok(Self(policy.normalize(trimmed)))
    }

    /// Re-apply `policy` to an identity that was stored under another policy.
    pub fn renormalize(&self, policy: IdentityPolicy) -> Self {
        Self(policy.normalize(&self.0))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for LikerId {
    type Error = LedgerError;

    fn try_from(raw: String) -> Result<Self> {
        if raw.trim().is_empty() {
            return Err(LedgerError::InvalidIdentity("stored liker identity is empty".into()));
        }
        if raw.trim() != raw {
            return Err(LedgerError::InvalidIdentity(format!(
                "stored liker identity {raw:?} has surrounding whitespace"
            )));
        }
        Ok(Self(raw))
    }
}

impl From<LikerId> for String {
    fn from(id: LikerId) -> Self {
        id.0
    }
}

impl fmt::Display for LikerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
