//! Snapshot encoding: a pretty-printed JSON object mapping post id to an
//! array of liker identities.

use likeledger_types::{LedgerError, LedgerState, Result};

pub fn encode(state: &LedgerState) -> Result<Vec<u8>> {
    serde_json::to_vec_pretty(state).map_err(|e| LedgerError::Serialization(e.to_string()))
}

/// Decode a snapshot. Anything that is not an object of string arrays is rejected.
pub fn decode(bytes: &[u8]) -> std::result::Result<LedgerState, serde_json::Error> {
    serde_json::from_slice(bytes)
}
