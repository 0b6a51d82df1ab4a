//! Typed values to DSON text and back.
//!
//! Run with: cargo run --example simple

use dson::{from_str, to_string, to_string_pretty};
use serde::{Deserialize, Serialize};
use std::error::Error;

#[derive(Debug, Serialize, Deserialize, PartialEq)]
struct User {
    id: u32,
    name: String,
    email: String,
    tags: Vec<String>,
}

fn main() -> Result<(), Box<dyn Error>> {
    let users = vec![
        User {
            id: 42,
            name: "Alice Johnson".to_string(),
            email: "alice@example.com".to_string(),
            tags: vec!["admin".to_string()],
        },
        User {
            id: 43,
            name: "Bob Smith".to_string(),
            email: "bob@example.com".to_string(),
            tags: Vec::new(),
        },
    ];

    let text = to_string(&users)?;
    println!("Flow style:\n{}\n", text);
    println!("Indented:\n{}\n", to_string_pretty(&users)?);

    let back: Vec<User> = from_str(&text)?;
    assert_eq!(users, back);
    println!("Round trip ok: {} users", back.len());

    Ok(())
}
