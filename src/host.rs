//! Punter host: owns one child process and speaks the framed-JSON wire
//! protocol to it, handing fully-formed outcomes back to the arena.
//!
//! The arena drives this type rather than the host calling back into the
//! arena: `prompt_setup`/`prompt_move` return a `Result` the arena applies
//! to the map, the moves ring, and the log. This maps more naturally onto
//! Rust ownership than a `done_setup`/`done_move` callback style, where the
//! host would hold a handle back into its arena.

use std::collections::VecDeque;
use std::io::{BufReader, BufWriter};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::time::Instant;

use serde_json::{json, Value};

use crate::codec;
use crate::error::{ArenaError, Result};
use crate::map::{MapJson, PunterId, SiteId};
use crate::protocol::{HandshakeS, Move, Settings, SetupRequest};
use crate::score::Future;

const SETUP_DEADLINE_MS: u128 = 10_000;
const MOVE_DEADLINE_MS: u128 = 1_000;

/// Guarantees the child is killed and reaped on every exit path, including
/// the ones that return early on a protocol error.
struct ChildGuard(Child);

impl Drop for ChildGuard {
    fn drop(&mut self) {
        let _ = self.0.kill();
        let _ = self.0.wait();
    }
}

struct Session {
    guard: ChildGuard,
    writer: BufWriter<ChildStdin>,
    reader: BufReader<ChildStdout>,
}

pub struct SetupOutcome {
    pub futures: Option<Vec<Future>>,
}

pub enum MoveOutcome {
    Claim {
        source: SiteId,
        target: SiteId,
    },
    Pass,
}

pub struct MoveResult {
    pub outcome: MoveOutcome,
    pub elapsed_ms: u64,
    /// The raw response message, with `state` stripped, for the all-moves
    /// log when `--include_state` is set.
    pub raw_stripped: Value,
}

pub struct PunterHost {
    command: Vec<String>,
    punter_id: PunterId,
    name: Option<String>,
    requested_persistent: bool,
    feature_negotiation: bool,
    negotiated_persistent: Option<bool>,
    session: Option<Session>,
    game_state: Option<Value>,
}

impl PunterHost {
    pub fn new(
        command: Vec<String>,
        punter_id: PunterId,
        persistent: bool,
        feature_negotiation: bool,
    ) -> Self {
        PunterHost {
            command,
            punter_id,
            name: None,
            requested_persistent: persistent,
            feature_negotiation,
            negotiated_persistent: None,
            session: None,
            game_state: None,
        }
    }

    pub fn punter_id(&self) -> PunterId {
        self.punter_id
    }

    pub fn name(&self) -> &str {
        self.name.as_deref().unwrap_or("<unnamed>")
    }

    fn effective_persistent(&self) -> bool {
        self.negotiated_persistent.unwrap_or(self.requested_persistent)
    }

    fn ensure_launched(&mut self) -> Result<()> {
        if self.session.is_some() {
            return Ok(());
        }

        let mut argv = self.command.clone();
        if self.requested_persistent {
            argv.push("--persistent".to_string());
        }
        let (program, args) = argv.split_first().ok_or_else(|| ArenaError::ChildSpawnFailed {
            detail: "empty command".to_string(),
        })?;

        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .spawn()
            .map_err(|e| ArenaError::ChildSpawnFailed {
                detail: format!("{program}: {e}"),
            })?;

        let stdin = child.stdin.take().ok_or_else(|| ArenaError::ChildSpawnFailed {
            detail: "child stdin not piped".to_string(),
        })?;
        let stdout = child.stdout.take().ok_or_else(|| ArenaError::ChildSpawnFailed {
            detail: "child stdout not piped".to_string(),
        })?;

        self.session = Some(Session {
            guard: ChildGuard(child),
            writer: BufWriter::new(stdin),
            reader: BufReader::new(stdout),
        });
        Ok(())
    }

    fn kill_if_one_shot(&mut self) {
        if !self.effective_persistent() {
            self.session = None;
        }
    }

    /// Runs `body` and always tears down a one-shot session afterward,
    /// success or failure, so the next prompt respawns a fresh child. A
    /// persistent session is left as-is on failure: a persistent child that
    /// dies is not restarted, and the next prompt will fail the same way
    /// against the same (dead) pipes.
    fn with_session<T>(&mut self, body: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        let result = body(self);
        match &result {
            Ok(_) => self.kill_if_one_shot(),
            Err(_) if !self.effective_persistent() => self.session = None,
            Err(_) => {}
        }
        result
    }

    /// Reads `{me: name}`, records the name, writes `{you: name}`. This
    /// happens before *every* prompt, not once per process lifetime: a
    /// persistent child re-does the handshake on each iteration of its own
    /// request loop.
    fn handshake(&mut self) -> Result<()> {
        let session = self.session.as_mut().expect("ensure_launched was called");

        let handshake: crate::protocol::HandshakeP = codec::decode(&mut session.reader)
            .map_err(|_| ArenaError::BadHandshake {
                detail: "could not read {me: ...}".to_string(),
            })?;

        if self.feature_negotiation && self.negotiated_persistent.is_none() {
            let supports_persistent = handshake.me.ends_with("-persistent");
            self.negotiated_persistent = Some(self.requested_persistent && supports_persistent);
        }

        self.name = Some(handshake.me.clone());
        codec::encode(
            &mut session.writer,
            &HandshakeS {
                you: handshake.me,
            },
        )
    }

    pub fn prompt_setup(
        &mut self,
        punters: u64,
        map: &MapJson,
        futures_enabled: bool,
    ) -> Result<SetupOutcome> {
        let map = map.clone();
        self.with_session(move |me| {
            me.ensure_launched()?;
            me.handshake()?;

            let request = SetupRequest {
                punter: me.punter_id,
                punters,
                map,
                settings: Settings {
                    futures: futures_enabled,
                },
            };

            let start = Instant::now();
            {
                let session = me.session.as_mut().expect("launched above");
                codec::encode(&mut session.writer, &request)?;
            }
            let response: Value = {
                let session = me.session.as_mut().expect("launched above");
                codec::decode(&mut session.reader)?
            };
            let elapsed_ms = start.elapsed().as_millis();
            if elapsed_ms > SETUP_DEADLINE_MS {
                log::warn!(
                    "{}: setup exceeded soft deadline ({} ms)",
                    me.name(),
                    elapsed_ms
                );
            }

            me.parse_setup_response(response)
        })
    }

    fn parse_setup_response(&mut self, response: Value) -> Result<SetupOutcome> {
        let ready = response
            .get("ready")
            .and_then(Value::as_u64)
            .ok_or_else(|| ArenaError::BadReady {
                detail: format!("{response:?}"),
            })?;
        if ready != self.punter_id {
            return Err(ArenaError::BadReady {
                detail: format!("expected {}, got {ready}", self.punter_id),
            });
        }

        self.game_state = response.get("state").cloned();

        let futures = response
            .get("futures")
            .map(|v| serde_json::from_value::<Vec<Future>>(v.clone()))
            .transpose()
            .map_err(|e| ArenaError::BadReady {
                detail: format!("bad futures field: {e}"),
            })?;

        Ok(SetupOutcome { futures })
    }

    pub fn prompt_move(&mut self, ring: &VecDeque<Move>) -> Result<MoveResult> {
        let moves: Vec<Move> = ring.iter().cloned().collect();
        self.with_session(move |me| {
            me.ensure_launched()?;
            me.handshake()?;

            let mut payload = json!({ "move": { "moves": moves } });
            if let Some(state) = &me.game_state {
                payload["state"] = state.clone();
            }

            let start = Instant::now();
            {
                let session = me.session.as_mut().expect("launched above");
                codec::encode(&mut session.writer, &payload)?;
            }
            let response: Value = {
                let session = me.session.as_mut().expect("launched above");
                codec::decode(&mut session.reader)?
            };
            let elapsed_ms = start.elapsed().as_millis();
            if elapsed_ms > MOVE_DEADLINE_MS {
                log::warn!(
                    "{}: move exceeded soft deadline ({} ms)",
                    me.name(),
                    elapsed_ms
                );
            }

            me.parse_move_response(response, elapsed_ms as u64)
        })
    }

    fn parse_move_response(&mut self, response: Value, elapsed_ms: u64) -> Result<MoveResult> {
        let mut stripped = response.clone();
        if let Value::Object(ref mut map) = stripped {
            map.remove("state");
        }

        if let Some(claim) = response.get("claim") {
            let punter = claim
                .get("punter")
                .and_then(Value::as_u64)
                .ok_or_else(|| ArenaError::BadMove {
                    detail: format!("claim missing punter: {response:?}"),
                })?;
            if punter != self.punter_id {
                return Err(ArenaError::BadMove {
                    detail: format!("claim punter {punter} != host punter {}", self.punter_id),
                });
            }
            let source = claim
                .get("source")
                .and_then(Value::as_u64)
                .ok_or_else(|| ArenaError::BadMove {
                    detail: format!("claim missing source: {response:?}"),
                })?;
            let target = claim
                .get("target")
                .and_then(Value::as_u64)
                .ok_or_else(|| ArenaError::BadMove {
                    detail: format!("claim missing target: {response:?}"),
                })?;

            self.game_state = response.get("state").cloned();
            Ok(MoveResult {
                outcome: MoveOutcome::Claim { source, target },
                elapsed_ms,
                raw_stripped: stripped,
            })
        } else if let Some(pass) = response.get("pass") {
            let punter = pass
                .get("punter")
                .and_then(Value::as_u64)
                .ok_or_else(|| ArenaError::BadMove {
                    detail: format!("pass missing punter: {response:?}"),
                })?;
            if punter != self.punter_id {
                return Err(ArenaError::BadMove {
                    detail: format!("pass punter {punter} != host punter {}", self.punter_id),
                });
            }

            self.game_state = response.get("state").cloned();
            Ok(MoveResult {
                outcome: MoveOutcome::Pass,
                elapsed_ms,
                raw_stripped: stripped,
            })
        } else {
            Err(ArenaError::BadMove {
                detail: format!("neither claim nor pass present: {response:?}"),
            })
        }
    }
}
