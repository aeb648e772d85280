//! Wire message shapes exchanged with punter child processes.
//!
//! Setup responses and move responses carry an opaque `state` value
//! alongside their tagged payload (`{"claim": ..., "state": ...}`), which a
//! plain externally-tagged enum cannot express. Those two message kinds are
//! read as [`serde_json::Value`] and picked apart by hand in [`crate::host`],
//! the way the original referee script reads them with `message.get`.
//! Messages with a single, fixed shape are still fully typed.

use serde::{Deserialize, Serialize};

use crate::map::{MapJson, PunterId, SiteId};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HandshakeP {
    pub me: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HandshakeS {
    pub you: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub futures: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetupRequest {
    pub punter: PunterId,
    pub punters: u64,
    pub map: MapJson,
    pub settings: Settings,
}

/// The canonical, stripped form of one turn's outcome: what goes in the
/// rolling moves ring and, absent `--include_state`/`--include_cause`, the
/// all-moves log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Move {
    Claim {
        punter: PunterId,
        source: SiteId,
        target: SiteId,
    },
    Pass {
        punter: PunterId,
    },
}

impl Move {
    pub fn punter(&self) -> PunterId {
        match self {
            Move::Claim { punter, .. } => *punter,
            Move::Pass { punter } => *punter,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoveHistory {
    pub moves: Vec<Move>,
}

/// The final report printed to stdout: the full move log and final scores.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub moves: Vec<serde_json::Value>,
    pub scores: Vec<i64>,
}
