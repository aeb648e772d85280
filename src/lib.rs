//! Offline referee for a turn-based graph-claiming contest: punters join,
//! claim or pass on rivers each turn, and are scored by connectivity from
//! their mines at game end.

pub mod arena;
pub mod codec;
pub mod error;
pub mod host;
pub mod map;
pub mod options;
pub mod protocol;
pub mod score;
