//! Arena driver: owns the map and the punter hosts, drives setup and
//! the turn loop, applies move outcomes, and assembles the final report.

use std::collections::{HashMap, VecDeque};

use serde_json::{json, Value};

use crate::error::ArenaError;
use crate::host::{MoveOutcome, PunterHost};
use crate::map::{Map, MapJson, PunterId};
use crate::options::Options;
use crate::protocol::{Move, Report};
use crate::score::{self, Future};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Init,
    Setup,
    Playing,
    Done,
}

pub struct Arena<'a> {
    map: Map,
    raw_map: MapJson,
    hosts: Vec<PunterHost>,
    options: &'a Options,
    step: u64,
    num_rivers: u64,
    ring: VecDeque<Move>,
    log: Vec<Value>,
    futures: HashMap<PunterId, Vec<Future>>,
    phase: Phase,
}

impl<'a> Arena<'a> {
    pub fn new(
        raw_map: MapJson,
        hosts: Vec<PunterHost>,
        options: &'a Options,
    ) -> Result<Self, ArenaError> {
        let map = Map::from_json(&raw_map)?;
        let num_rivers = map.rivers.len() as u64;
        Ok(Arena {
            map,
            raw_map,
            hosts,
            options,
            step: 0,
            num_rivers,
            ring: VecDeque::new(),
            log: Vec::new(),
            futures: HashMap::new(),
            phase: Phase::Init,
        })
    }

    fn num_punters(&self) -> u64 {
        self.hosts.len() as u64
    }

    /// Runs the whole match: setup, the turn loop, and scoring. Returns the
    /// final report; printing it to stdout is the runner entry's job.
    pub fn run(&mut self) -> Result<Report, ArenaError> {
        self.run_setup()?;
        self.run_turns();
        self.finish()
    }

    fn run_setup(&mut self) -> Result<(), ArenaError> {
        debug_assert_eq!(self.phase, Phase::Init);
        self.phase = Phase::Setup;

        let n = self.num_punters();
        for i in 0..n {
            let raw_map = self.raw_map.clone();
            let futures_enabled = self.options.futures;
            let host = &mut self.hosts[i as usize];
            match host.prompt_setup(n, &raw_map, futures_enabled) {
                Ok(outcome) => {
                    log::debug!("{}: setup ok", host.name());
                    self.futures.insert(i, outcome.futures.unwrap_or_default());
                }
                Err(ArenaError::ChildSpawnFailed { detail }) => {
                    log::error!("{}: could not launch: {detail}", host.name());
                    return Err(ArenaError::ChildSpawnFailed { detail });
                }
                Err(e) => {
                    log::warn!("{}: setup failed, proceeding with no futures: {e}", host.name());
                    self.futures.insert(i, Vec::new());
                }
            }
        }
        Ok(())
    }

    fn run_turns(&mut self) {
        debug_assert_eq!(self.phase, Phase::Setup);
        self.phase = Phase::Playing;

        let n = self.num_punters();
        self.ring = (0..n).map(|i| Move::Pass { punter: i }).collect();

        while self.step < self.num_rivers {
            log::debug!("step {} / {}", self.step, self.num_rivers);
            let p = self.step % n;
            self.run_one_turn(p);
            self.step += 1;

            if self.options.log_score_every_step {
                self.log_provisional_scores();
            }
        }

        self.phase = Phase::Done;
    }

    fn run_one_turn(&mut self, punter: PunterId) {
        let ring_snapshot = self.ring.clone();
        let result = self.hosts[punter as usize].prompt_move(&ring_snapshot);

        let (stripped, full, cause, elapsed_ms) = match result {
            Ok(move_result) => {
                let elapsed_ms = move_result.elapsed_ms;
                match move_result.outcome {
                    MoveOutcome::Claim { source, target } => {
                        match self.map.claim(source, target, punter) {
                            Some(true) => {
                                let stripped = Move::Claim { punter, source, target };
                                (stripped, move_result.raw_stripped, None, elapsed_ms)
                            }
                            Some(false) => {
                                log::debug!(
                                    "{}: conflict claiming ({source}, {target})",
                                    self.hosts[punter as usize].name()
                                );
                                let stripped = Move::Pass { punter };
                                let cause = self.options.include_cause.then(|| move_result.raw_stripped);
                                (stripped.clone(), serde_json::to_value(&stripped).unwrap(), cause, elapsed_ms)
                            }
                            None => {
                                log::warn!(
                                    "{}: claimed nonexistent river ({source}, {target})",
                                    self.hosts[punter as usize].name()
                                );
                                let stripped = Move::Pass { punter };
                                (stripped.clone(), serde_json::to_value(&stripped).unwrap(), None, elapsed_ms)
                            }
                        }
                    }
                    MoveOutcome::Pass => {
                        let stripped = Move::Pass { punter };
                        (stripped, move_result.raw_stripped, None, elapsed_ms)
                    }
                }
            }
            Err(e) => {
                log::warn!("{}: {e}", self.hosts[punter as usize].name());
                let stripped = Move::Pass { punter };
                (stripped.clone(), serde_json::to_value(&stripped).unwrap(), None, 0)
            }
        };

        self.ring.push_back(stripped.clone());
        self.ring.pop_front();

        let mut log_entry = if self.options.include_state {
            full
        } else {
            serde_json::to_value(&stripped).unwrap()
        };
        if let Value::Object(ref mut map) = log_entry {
            if let Some(cause) = cause {
                map.insert("cause".to_string(), cause);
            }
            if self.options.include_time {
                map.insert("time".to_string(), json!(elapsed_ms));
            }
        }
        self.log.push(log_entry);
    }

    fn log_provisional_scores(&self) {
        let provisional = score::compute_scores_provisional(&self.map, self.num_punters(), &self.futures);
        for (id, p) in provisional.iter().enumerate() {
            log::info!(
                "provisional: punter {id} score={} potential_change={}",
                p.score,
                p.potential_change
            );
        }
    }

    fn finish(&mut self) -> Result<Report, ArenaError> {
        debug_assert_eq!(self.phase, Phase::Done);
        let scores = score::compute_scores(&self.map, self.num_punters(), &self.futures);
        Ok(Report {
            moves: std::mem::take(&mut self.log),
            scores,
        })
    }
}
