//! Minimal demo punter: greedily claims the first unclaimed river it can
//! see reaching its owned component from a mine, else passes.
//!
//! Used as an integration-test fixture for claim/conflict scoring
//! behavior, not a competitive bot. State carried
//! across turns is the map's rivers annotated with the owner this bot has
//! observed so far, reconstructed by folding the `moves` window it is
//! handed each turn (the window exactly tiles the turn sequence between
//! two of this punter's own turns, so merging it every call is sufficient
//! to reconstruct full history without needing the referee's internal map).

use std::io::{self, BufReader, BufWriter};

use serde_json::{json, Value};

use lambda_punter_arena::codec;

#[derive(serde::Serialize, serde::Deserialize)]
struct RiverView {
    source: u64,
    target: u64,
    owner: Option<u64>,
}

#[derive(serde::Serialize, serde::Deserialize)]
struct State {
    punter_id: u64,
    mines: Vec<u64>,
    rivers: Vec<RiverView>,
}

fn normalize(a: u64, b: u64) -> (u64, u64) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

fn setup_state(request: &Value) -> State {
    let punter_id = request["punter"].as_u64().unwrap_or(0);
    let map = &request["map"];
    let mines: Vec<u64> = map["mines"]
        .as_array()
        .map(|a| a.iter().filter_map(Value::as_u64).collect())
        .unwrap_or_default();
    let rivers: Vec<RiverView> = map["rivers"]
        .as_array()
        .map(|a| {
            a.iter()
                .filter_map(|r| {
                    let source = r.get("source")?.as_u64()?;
                    let target = r.get("target")?.as_u64()?;
                    let (source, target) = normalize(source, target);
                    Some(RiverView {
                        source,
                        target,
                        owner: None,
                    })
                })
                .collect()
        })
        .unwrap_or_default();

    State {
        punter_id,
        mines,
        rivers,
    }
}

fn merge_moves(state: &mut State, moves: &[Value]) {
    for mv in moves {
        if let Some(claim) = mv.get("claim") {
            let (Some(source), Some(target)) = (
                claim.get("source").and_then(Value::as_u64),
                claim.get("target").and_then(Value::as_u64),
            ) else {
                continue;
            };
            let punter = claim.get("punter").and_then(Value::as_u64);
            let (source, target) = normalize(source, target);
            if let Some(river) = state
                .rivers
                .iter_mut()
                .find(|r| r.source == source && r.target == target)
            {
                if river.owner.is_none() {
                    river.owner = punter;
                }
            }
        }
    }
}

/// Sites reachable from any mine using only rivers this bot owns.
fn owned_reachable(state: &State) -> std::collections::HashSet<u64> {
    let mut adjacency: std::collections::HashMap<u64, Vec<u64>> = std::collections::HashMap::new();
    for river in &state.rivers {
        if river.owner == Some(state.punter_id) {
            adjacency.entry(river.source).or_default().push(river.target);
            adjacency.entry(river.target).or_default().push(river.source);
        }
    }

    let mut visited = std::collections::HashSet::new();
    let mut stack: Vec<u64> = state.mines.clone();
    for &m in &state.mines {
        visited.insert(m);
    }
    while let Some(site) = stack.pop() {
        if let Some(neighbors) = adjacency.get(&site) {
            for &next in neighbors {
                if visited.insert(next) {
                    stack.push(next);
                }
            }
        }
    }
    visited
}

fn choose_move(state: &State) -> Value {
    let reachable = owned_reachable(state);

    let pick = state
        .rivers
        .iter()
        .find(|r| r.owner.is_none() && (reachable.contains(&r.source) || reachable.contains(&r.target)))
        .or_else(|| state.rivers.iter().find(|r| r.owner.is_none()));

    match pick {
        Some(river) => json!({
            "claim": { "punter": state.punter_id, "source": river.source, "target": river.target }
        }),
        None => json!({ "pass": { "punter": state.punter_id } }),
    }
}

fn main() {
    let persistent = std::env::args().any(|a| a == "--persistent");
    let name = if persistent {
        "greedy_bot-persistent"
    } else {
        "greedy_bot"
    };

    let stdin = io::stdin();
    let mut reader = BufReader::new(stdin.lock());
    let stdout = io::stdout();
    let mut writer = BufWriter::new(stdout.lock());

    let mut state: Option<State> = None;

    loop {
        if codec::encode(&mut writer, &json!({ "me": name })).is_err() {
            return;
        }
        if codec::decode::<_, Value>(&mut reader).is_err() {
            return;
        }

        let request: Value = match codec::decode(&mut reader) {
            Ok(v) => v,
            Err(_) => return,
        };

        let response = if request.get("punter").is_some() {
            let s = setup_state(&request);
            let ready = s.punter_id;
            let state_json = serde_json::to_value(&s).unwrap();
            state = Some(s);
            json!({ "ready": ready, "state": state_json })
        } else if let Some(mv) = request.get("move") {
            let mut s = match state.take().or_else(|| {
                request
                    .get("state")
                    .and_then(|v| serde_json::from_value(v.clone()).ok())
            }) {
                Some(s) => s,
                None => return,
            };
            let moves = mv["moves"].as_array().cloned().unwrap_or_default();
            merge_moves(&mut s, &moves);
            let response = choose_move(&s);
            let state_json = serde_json::to_value(&s).unwrap();
            state = Some(s);
            let mut response = response;
            response["state"] = state_json;
            response
        } else {
            return;
        };

        if codec::encode(&mut writer, &response).is_err() {
            return;
        }

        if !persistent {
            return;
        }
    }
}
