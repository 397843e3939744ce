//! Simple inspector for transito files.
//!
//! Reads every message in a file, counts values by kind and re-encodes the
//! messages in each format to compare sizes.

use std::collections::BTreeMap;
use std::fs;

use transito::{Format, Reader, Value, ValueKind, Writer};

fn format_for(path: &str) -> Format {
    if path.ends_with(".verbose.json") {
        Format::JsonVerbose
    } else if path.ends_with(".json") {
        Format::Json
    } else {
        Format::MessagePack
    }
}

fn format_value(v: &Value) -> String {
    match v {
        Value::String(s) => {
            let preview: String = s.chars().take(80).collect();
            if s.chars().count() > 80 {
                format!("\"{}...\"", preview)
            } else {
                format!("\"{}\"", preview)
            }
        }
        Value::Array(items) => format!("ARRAY[{}]", items.len()),
        Value::Set(items) => format!("SET[{}]", items.len()),
        Value::Map(pairs) => format!("MAP[{}]", pairs.len()),
        Value::Bytes(b) => format!("BYTES[{}]", b.len()),
        Value::Tagged(t) => format!("TAGGED({}, {})", t.tag, format_value(&t.rep)),
        other => format!("{:?}", other),
    }
}

fn count_kinds(v: &Value, counts: &mut BTreeMap<&'static str, usize>, tags: &mut BTreeMap<String, usize>) {
    *counts.entry(v.kind().name()).or_default() += 1;
    match v {
        Value::Array(items) | Value::Set(items) => {
            for item in items {
                count_kinds(item, counts, tags);
            }
        }
        Value::Map(pairs) => {
            for (k, val) in pairs {
                count_kinds(k, counts, tags);
                count_kinds(val, counts, tags);
            }
        }
        Value::Tagged(t) => {
            *tags.entry(t.tag.clone()).or_default() += 1;
            count_kinds(&t.rep, counts, tags);
        }
        _ => {}
    }
}

fn main() {
    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "data/sample.json".to_string());
    let format = format_for(&path);

    println!("Reading: {} ({})", path, format);

    let data = fs::read(&path).expect("Failed to read file");
    println!("File size: {} bytes", data.len());

    let messages = Reader::new(format).read_many(&data).expect("Failed to decode");
    println!("\n=== Messages ({}) ===", messages.len());

    let mut counts = BTreeMap::new();
    let mut tags = BTreeMap::new();
    for message in &messages {
        count_kinds(message, &mut counts, &mut tags);
    }
    for (kind, count) in &counts {
        println!("  {}: {}", kind, count);
    }
    if !tags.is_empty() {
        println!("\n=== Unknown tags ===");
        for (tag, count) in &tags {
            println!("  {}: {}", tag, count);
        }
    }

    println!("\n=== First 10 messages ===");
    for (i, message) in messages.iter().take(10).enumerate() {
        println!("[{}] {}", i, format_value(message));
        if message.kind() == ValueKind::Map {
            for (k, v) in message.as_map().unwrap_or_default().iter().take(5) {
                println!("      {} = {}", format_value(k), format_value(v));
            }
        }
    }

    println!("\n=== Re-encoded sizes ===");
    for target in [Format::Json, Format::JsonVerbose, Format::MessagePack] {
        let writer = Writer::new(target);
        let total: usize = messages
            .iter()
            .map(|m| writer.write(m).expect("Failed to encode").len())
            .sum();
        println!("  {}: {} bytes", target, total);
    }
}
