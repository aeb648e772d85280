//! Minimal demo punter: always tries to claim the fixed river `(0, 1)`,
//! regardless of what has already happened in the match. Used as an
//! integration-test fixture to force a real claim conflict deterministically
//! — unlike `greedy_bot`, it never tracks ownership, so two of them (or one
//! replaying after its own successful claim) collide on purpose.

use std::io::{self, BufReader, BufWriter};

use serde_json::{json, Value};

use lambda_punter_arena::codec;

fn main() {
    let persistent = std::env::args().any(|a| a == "--persistent");
    let name = if persistent {
        "claimer_bot-persistent"
    } else {
        "claimer_bot"
    };

    let stdin = io::stdin();
    let mut reader = BufReader::new(stdin.lock());
    let stdout = io::stdout();
    let mut writer = BufWriter::new(stdout.lock());

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

        let response = if let Some(punter_id) = request.get("punter").and_then(Value::as_u64) {
            json!({ "ready": punter_id, "state": { "punter_id": punter_id } })
        } else if request.get("move").is_some() {
            let punter_id = request
                .get("state")
                .and_then(|s| s.get("punter_id"))
                .and_then(Value::as_u64)
                .unwrap_or(0);
            json!({
                "claim": { "punter": punter_id, "source": 0, "target": 1 },
                "state": { "punter_id": punter_id }
            })
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
