//! Tuning the writers with DsonOptions.
//!
//! Run with: cargo run --example custom_options

use dson::{
    dson, to_binary_with_options, to_text_with_options, DsonOptions, DsonValue, FieldNumber,
    ObjectStyle, WireType,
};
use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    let value = dson!({
        "name": "inventory",
        "items": ["bolts", "nuts", "washers", "brackets", "hinges", "springs"],
        "notes": "first line\nsecond line"
    });

    println!("=== Default ===");
    println!("{}\n", to_text_with_options(&value, &DsonOptions::default())?);

    println!("=== Indented, 4 spaces ===");
    let indented = DsonOptions::new()
        .with_style(ObjectStyle::Indent)
        .with_indent(4);
    println!("{}\n", to_text_with_options(&value, &indented)?);

    println!("=== Soft line length 24 ===");
    let narrow = DsonOptions::new().with_soft_line_length(24);
    println!("{}\n", to_text_with_options(&value, &narrow)?);

    println!("=== Without long-text blocks ===");
    let plain = DsonOptions::new().with_text_mode(false);
    println!("{}\n", to_text_with_options(&value, &plain)?);

    println!("=== Binary integer wire types ===");
    let number = DsonValue::<FieldNumber>::Int32(-2);
    for wire in [WireType::VarInt, WireType::Uint, WireType::Sint, WireType::Fixed] {
        let options = DsonOptions::new().with_wire_type(wire);
        let bytes = to_binary_with_options(&number, &options)?;
        println!("{:?}: {}", wire, hex::encode(bytes));
    }

    Ok(())
}
