//! Building and inspecting DsonValue trees, then moving them to binary.
//!
//! Run with: cargo run --example dynamic_values

use dson::{dson, from_binary, from_text, to_binary, to_text, DsonValue, FieldNumber};
use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    let config = dson!({
        "host": "localhost",
        "port": 8080,
        "features": ["auth", "logging", "metrics"],
        "debug": true
    });

    let text = to_text(&config)?;
    println!("Config as DSON text:\n{}\n", text);

    if let DsonValue::Object(obj) = &config {
        if let Some(host) = obj.fields.get("host").and_then(DsonValue::as_str) {
            println!("host: {}", host);
        }
        if let Some(port) = obj.fields.get("port").and_then(DsonValue::as_i64) {
            println!("port: {}", port);
        }
        if let Some(features) = obj.fields.get("features").and_then(DsonValue::as_array) {
            println!("features: {} items\n", features.elements.len());
        }
    }

    // Comments and class names survive the text reader.
    let typed = from_text("# service record\n-- @Service{name: api, replicas: 3}")?;
    if let Some(object) = typed.as_object() {
        println!("class: {:?}", object.class_id);
    }

    // The binary form keys fields by number instead of name.
    let names = ["host", "port", "features", "debug"];
    let numbered: DsonValue<FieldNumber> = config.clone().map_names(
        &mut |name: String| {
            let index = names.iter().position(|n| *n == name).unwrap_or(names.len());
            FieldNumber::of(index as u32 + 1)
        },
        &mut |_| None,
    );
    let bytes = to_binary(&numbered)?;
    println!("\nbinary: {} bytes, {}", bytes.len(), hex::encode(&bytes[..8]));
    assert_eq!(from_binary(&bytes)?, numbered);

    let back: DsonValue = from_text(&text)?;
    assert_eq!(back, config);
    Ok(())
}
