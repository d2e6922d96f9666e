//! `--json` vs. human-readable output. Every command builds a
//! `serde_json::Value` and hands it here; the flag decides rendering.

use serde::Serialize;

pub fn emit<T: Serialize>(value: &T, json: bool) {
    if json {
        match serde_json::to_string_pretty(value) {
            Ok(text) => println!("{text}"),
            Err(err) => eprintln!("failed to serialize output: {err}"),
        }
    } else {
        print_human(&serde_json::to_value(value).unwrap_or(serde_json::Value::Null));
    }
}

fn print_human(value: &serde_json::Value) {
    match value {
        serde_json::Value::Array(items) => {
            for item in items {
                print_human_line(item);
            }
        }
        other => print_human_line(other),
    }
}

fn print_human_line(value: &serde_json::Value) {
    match value {
        serde_json::Value::Object(map) => {
            let rendered: Vec<String> = map.iter().map(|(k, v)| format!("{k}={}", compact(v))).collect();
            println!("{}", rendered.join(" "));
        }
        other => println!("{}", compact(other)),
    }
}

fn compact(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
