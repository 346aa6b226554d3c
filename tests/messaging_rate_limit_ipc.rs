use serde_json::json;
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::time::{SystemTime, UNIX_EPOCH};

fn temp_dir(prefix: &str) -> PathBuf {
    let p = std::env::temp_dir().join(format!(
        "{}-{}",
        prefix,
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock")
            .as_nanos()
    ));
    std::fs::create_dir_all(&p).expect("create temp dir");
    p
}

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

    let mut line = String::new();
    reader.read_line(&mut line).expect("read response line");
    let value: serde_json::Value = serde_json::from_str(line.trim()).expect("parse response json");
    assert_eq!(value.get("id").and_then(|v| v.as_str()), Some(id));
    value
}

fn request_ok(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let value = request(stdin, reader, id, method, params);
    assert_eq!(value["ok"].as_bool(), Some(true), "{} failed: {}", method, value);
    value["result"].clone()
}

fn error_code(value: &serde_json::Value) -> &str {
    value["error"]["code"].as_str().unwrap_or("")
}

#[test]
fn back_to_back_sends_are_rate_limited() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    let sent = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "messaging.send",
        json!({ "phone": 9876543210u64, "message": "Hello Ravi, fees due: 1,200/-" }),
    );
    assert_eq!(sent["phone"].as_str(), Some("919876543210"));
    assert_eq!(sent["target"].as_str(), Some("web"));
    assert_eq!(
        sent["url"].as_str(),
        Some("https://web.whatsapp.com/send?phone=919876543210&text=Hello%20Ravi%2C%20fees%20due%3A%201%2C200%2F-")
    );
    assert_eq!(sent["sentToday"].as_u64(), Some(1));

    let again = request(
        &mut stdin,
        &mut reader,
        "2",
        "messaging.send",
        json!({ "phone": "09876543210", "message": "again" }),
    );
    assert_eq!(error_code(&again), "rate_limited");
    assert_eq!(again["error"]["details"]["reason"].as_str(), Some("wait"));
    let seconds = again["error"]["details"]["seconds"].as_i64().expect("seconds");
    assert!((1..=15).contains(&seconds), "{seconds}");
    assert_eq!(
        again["error"]["message"].as_str(),
        Some(format!("Please wait {seconds} seconds before sending another message.").as_str())
    );

    // rejected attempts leave the counter alone
    let status = request_ok(&mut stdin, &mut reader, "3", "messaging.status", json!({}));
    assert_eq!(status["state"]["count"].as_u64(), Some(1));
    assert_eq!(status["remainingToday"].as_u64(), Some(199));

    drop(stdin);
    let _ = child.wait();
}

#[test]
fn invalid_phone_is_rejected_before_the_limiter() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    let bad = request(
        &mut stdin,
        &mut reader,
        "1",
        "messaging.send",
        json!({ "phone": "12345", "message": "hi" }),
    );
    assert_eq!(error_code(&bad), "invalid_phone");
    assert_eq!(
        bad["error"]["message"].as_str(),
        Some("Invalid phone number. It must be 10 digits.")
    );

    let sent = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "messaging.send",
        json!({
            "response": { "phone": "98765-43210", "watsapp_message": "Hi" },
            "userAgent": "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X)"
        }),
    );
    assert_eq!(sent["target"].as_str(), Some("app"));
    assert_eq!(sent["url"].as_str(), Some("whatsapp://send?phone=919876543210&text=Hi"));

    drop(stdin);
    let _ = child.wait();
}

#[test]
fn workspace_policy_and_state_survive_restart() {
    let workspace = temp_dir("rosterd-messaging");

    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    let rejected = request(
        &mut stdin,
        &mut reader,
        "2",
        "settings.set",
        json!({ "key": "messaging.rateLimit", "value": { "minGapMs": -5 } }),
    );
    assert_eq!(error_code(&rejected), "bad_params");
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "settings.set",
        json!({ "key": "messaging.rateLimit", "value": { "minGapMs": 0, "jitterMs": 0, "dailyCap": 2 } }),
    );

    for id in ["4", "5"] {
        let _ = request_ok(
            &mut stdin,
            &mut reader,
            id,
            "messaging.send",
            json!({ "phone": "9123456780", "message": "ok" }),
        );
    }
    let capped = request(
        &mut stdin,
        &mut reader,
        "6",
        "messaging.send",
        json!({ "phone": "9123456780", "message": "ok" }),
    );
    assert_eq!(error_code(&capped), "rate_limited");
    assert_eq!(capped["error"]["details"]["reason"].as_str(), Some("daily_cap"));
    assert_eq!(
        capped["error"]["message"].as_str(),
        Some("Daily limit of 2 messages reached.")
    );
    drop(stdin);
    let _ = child.wait();

    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    let status = request_ok(&mut stdin, &mut reader, "2", "messaging.status", json!({}));
    assert_eq!(status["state"]["count"].as_u64(), Some(2));
    assert_eq!(status["policy"]["dailyCap"].as_u64(), Some(2));
    assert_eq!(status["remainingToday"].as_u64(), Some(0));
    drop(stdin);
    let _ = child.wait();
}
