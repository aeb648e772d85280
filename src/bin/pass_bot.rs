//! Minimal demo punter: always passes.
//!
//! Grounded in `examples/original_source/punter/pass-py/pass.py`: write
//! `{me: name}`, discard the referee's ack, read the setup or move request,
//! reply, and (when `--persistent` is on argv) loop for another round on
//! the same stream.
//!
//! Advertises persistent-mode support the way `--feature_negotiation`
//! expects: when launched with `--persistent`, its handshake name carries
//! the `-persistent` suffix.

use std::io::{self, BufReader, BufWriter};

use serde_json::{json, Value};

use lambda_punter_arena::codec;

fn main() {
    let persistent = std::env::args().any(|a| a == "--persistent");
    let name = if persistent {
        "pass_bot-persistent"
    } else {
        "pass_bot"
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
            json!({ "pass": { "punter": punter_id }, "state": { "punter_id": punter_id } })
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
