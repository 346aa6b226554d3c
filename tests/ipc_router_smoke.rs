use serde_json::json;
use std::io::{BufRead, BufReader, Write};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};

fn spawn_sidecar() -> (Child, ChildStdin, BufReader<ChildStdout>) {
    let exe = env!("CARGO_BIN_EXE_rosterd");
    let mut child = Command::new(exe)
        .env_remove("ROSTERD_WORKSPACE")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn rosterd");
    let stdin = child.stdin.take().expect("child stdin");
    let stdout = child.stdout.take().expect("child stdout");
    (child, stdin, BufReader::new(stdout))
}

fn read_line_json(reader: &mut BufReader<ChildStdout>) -> serde_json::Value {
    let mut line = String::new();
    reader.read_line(&mut line).expect("read response line");
    serde_json::from_str(line.trim()).expect("parse response json")
}

fn request(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let payload = json!({ "id": id, "method": method, "params": params });
    writeln!(stdin, "{}", payload).expect("write request");
    stdin.flush().expect("flush request");
    let value = read_line_json(reader);
    assert_eq!(value.get("id").and_then(|v| v.as_str()), Some(id));
    value
}

fn code(value: &serde_json::Value) -> Option<&str> {
    value["error"]["code"].as_str()
}

#[test]
fn router_dispatch_smoke_covers_handler_families() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    let health = request(&mut stdin, &mut reader, "1", "health", json!({}));
    assert_eq!(health["ok"].as_bool(), Some(true));
    assert!(health["result"]["workspacePath"].is_null());
    assert_eq!(health["result"]["loaded"].as_bool(), Some(false));

    for (id, method) in [
        ("2", "controls.get"),
        ("3", "roster.classes"),
        ("4", "roster.stats"),
        ("5", "roster.visible"),
        ("6", "messaging.status"),
    ] {
        let v = request(&mut stdin, &mut reader, id, method, json!({}));
        assert_eq!(v["ok"].as_bool(), Some(true), "{} failed: {}", method, v);
    }

    let unknown = request(&mut stdin, &mut reader, "7", "grades.explode", json!({}));
    assert_eq!(code(&unknown), Some("not_implemented"));

    writeln!(stdin, "{{not json").expect("write garbage");
    stdin.flush().expect("flush");
    let bad = read_line_json(&mut reader);
    assert_eq!(code(&bad), Some("bad_json"));
    assert!(bad.get("id").is_none());

    let no_ws = request(&mut stdin, &mut reader, "8", "settings.get", json!({ "key": "messaging.rateLimit" }));
    assert_eq!(code(&no_ws), Some("no_workspace"));

    let locked = request(
        &mut stdin,
        &mut reader,
        "9",
        "settings.set",
        json!({ "key": "wa_global_limit", "value": {} }),
    );
    assert_eq!(code(&locked), Some("bad_params"));

    let missing = request(&mut stdin, &mut reader, "10", "roster.card", json!({ "id": "404" }));
    assert_eq!(code(&missing), Some("not_found"));

    let unknown_key = request(
        &mut stdin,
        &mut reader,
        "11",
        "controls.set",
        json!({ "patch": { "colour": "red" } }),
    );
    assert_eq!(code(&unknown_key), Some("bad_params"));

    let bad_sort = request(
        &mut stdin,
        &mut reader,
        "12",
        "controls.set",
        json!({ "patch": { "sortBy": "HEIGHT", "search": "x" } }),
    );
    assert_eq!(code(&bad_sort), Some("bad_params"));
    let controls = request(&mut stdin, &mut reader, "13", "controls.get", json!({}));
    // a rejected patch leaves no partial update behind
    assert_eq!(controls["result"]["controls"]["search"].as_str(), Some(""));

    let bad_uuid = request(
        &mut stdin,
        &mut reader,
        "14",
        "roster.unsubscribe",
        json!({ "subscriptionId": "nope" }),
    );
    assert_eq!(code(&bad_uuid), Some("bad_params"));

    let bad_surface = request(&mut stdin, &mut reader, "15", "roster.subscribe", json!({ "surface": "tv" }));
    assert_eq!(code(&bad_surface), Some("bad_params"));

    drop(stdin);
    let _ = child.wait();
}
