//! Conversation memory snapshot.

use serde::{Deserialize, Serialize};

/// Point-in-time copy of the memory state.
///
/// `summary` is the latest compaction result (overwritten, never appended);
/// `raw_transcript` is the conversation text accumulated since that
/// compaction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemorySnapshot {
    pub summary: String,
    pub raw_transcript: String,
}
