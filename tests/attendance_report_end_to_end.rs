use serde_json::json;
use std::io::{BufRead, BufReader, Write};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};

fn spawn_sidecar() -> (Child, ChildStdin, BufReader<ChildStdout>) {
    let exe = env!("CARGO_BIN_EXE_dailytrackd");
    let mut child = Command::new(exe)
        .args(["--today", "2024-01-10"])
        .env_remove("DAILYTRACK_WORKSPACE")
        .env_remove("DAILYTRACK_TODAY")
        .env_remove("DAILYTRACK_OUTBOX")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn dailytrackd");
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
    let payload = json!({
        "id": id,
        "method": method,
        "params": params,
    });
    writeln!(stdin, "{}", payload).expect("write request");
    stdin.flush().expect("flush request");

    let mut line = String::new();
    reader.read_line(&mut line).expect("read response line");
    assert!(!line.trim().is_empty(), "empty response for {}", method);
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
    assert!(
        value.get("ok").and_then(|v| v.as_bool()).unwrap_or(false),
        "{} failed: {}",
        method,
        value
            .get("error")
            .and_then(|e| e.get("message"))
            .and_then(|v| v.as_str())
            .unwrap_or("unknown error")
    );
    value.get("result").cloned().unwrap_or_else(|| json!({}))
}

fn create_student(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    roll_no: &str,
    name: &str,
) -> String {
    let res = request_ok(
        stdin,
        reader,
        id,
        "students.create",
        json!({ "rollNo": roll_no, "name": name }),
    );
    res["student"]["id"].as_str().expect("student id").to_string()
}

#[test]
fn daily_report_for_three_students() {
    let workspace = tempfile::tempdir().expect("tempdir");
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "ws",
        "workspace.select",
        json!({ "path": workspace.path().to_string_lossy() }),
    );
    // Created out of roll order on purpose.
    let a3 = create_student(&mut stdin, &mut reader, "s3", "A3", "Chitra");
    let a1 = create_student(&mut stdin, &mut reader, "s1", "A1", "Asha");
    let a2 = create_student(&mut stdin, &mut reader, "s2", "A2", "Bala");

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "m",
        "attendance.markBulk",
        json!({ "date": "2024-01-10", "entries": [
            { "studentId": a1, "status": "present" },
            { "studentId": a2, "status": "absent", "leaveFormSubmitted": false },
            { "studentId": a3, "status": "on_duty" }
        ] }),
    );

    let summary = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "attendance.summary",
        json!({ "date": "2024-01-10" }),
    );
    let s = &summary["summary"];
    assert_eq!(s["totalStudents"], 3);
    assert_eq!(s["presentCount"], 1);
    assert_eq!(s["absentCount"], 1);
    assert_eq!(s["odCount"], 1);
    let avg = s["classAverage"].as_f64().expect("classAverage");
    assert!((avg - 33.33).abs() < 0.01, "classAverage {}", avg);

    let daily = request_ok(&mut stdin, &mut reader, "2", "reports.daily", json!({}));
    let report = &daily["report"];
    assert_eq!(report["date"], "2024-01-10");
    assert_eq!(report["absentees"].as_array().map(|a| a.len()), Some(1));
    assert_eq!(report["absentees"][0]["rollNo"], "A2");
    assert_eq!(report["odStudents"][0]["rollNo"], "A3");
    let text = daily["text"].as_str().expect("text");
    assert!(text.contains("Roll numbers: A2"), "{}", text);
    assert!(text.contains("A3 - Chitra"), "{}", text);
    assert!(text.contains("📅 Date: Jan 10, 2024"), "{}", text);
    assert!(text.contains("📅 Day: Wednesday"), "{}", text);
    assert!(text.contains("Class Average: 33.33%"), "{}", text);

    let absentees = request_ok(&mut stdin, &mut reader, "3", "reports.absentees", json!({}));
    assert_eq!(absentees["count"], 1);
    assert!(absentees["text"].as_str().unwrap_or("").contains("A2 - Bala"));

    let quick = request_ok(&mut stdin, &mut reader, "4", "reports.quickSummary", json!({}));
    assert!(quick["text"].as_str().unwrap_or("").contains("Present: 1/3"));

    // Deactivated students drop out of the report lists.
    let _ = request_ok(&mut stdin, &mut reader, "5", "students.delete", json!({ "studentId": a2 }));
    let after = request_ok(
        &mut stdin,
        &mut reader,
        "6",
        "reports.daily",
        json!({ "date": "2024-01-10" }),
    );
    assert_eq!(after["report"]["absentees"].as_array().map(|a| a.len()), Some(0));
    assert_eq!(after["report"]["summary"]["totalStudents"], 2);
    assert!(!after["text"].as_str().unwrap_or("").contains("Roll numbers"));
}
