//! Decode a capture file, or a built-in sample when no path is given.
//!
//! Usage: `cargo run -p nibe --example replay-capture [capture.bin]`

use std::sync::Arc;

use bytes::BytesMut;
use nibe::frame::{encode_wire, DATA_ADDRESS};
use nibe::link::Link;
use nibe::registers::{register_info, RegisterTable, Update, KNOWN_REGISTERS};
use nibe::transport::ReplayChannel;

fn sample() -> Result<Vec<u8>, Box<dyn std::error::Error>> {
    // Outdoor -1.0 °C, 10 compressor starts, hysteresis 25.0.
    let payload = [
        0x00, 0x01, 0xFF, 0xF6, 0x00, 0x19, 0x64, 0x00, 0x28, 0x00, 0x32, 0x00,
    ];
    let mut buf = BytesMut::new();
    encode_wire(DATA_ADDRESS, &payload, &mut buf)?;
    Ok(buf.to_vec())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let capture = match std::env::args().nth(1) {
        Some(path) => std::fs::read(path)?,
        None => sample()?,
    };

    let registers = Arc::new(RegisterTable::new());
    for register in KNOWN_REGISTERS {
        registers.subscribe(register, |update: &Update| {
            let name = register_info(update.register).map_or("unknown", |info| info.name);
            println!("{:>3} {name}: {}", update.register, update.value);
        });
    }

    let mut link = Link::replay(ReplayChannel::from_bytes(capture), registers);
    match link.run() {
        Ok(_) => {}
        Err(err) if err.is_end_of_stream() => {}
        Err(err) => return Err(err.into()),
    }

    let stats = link.stats();
    println!(
        "{} frames, {} updates, {} rejected",
        stats.frames,
        stats.updates,
        stats.frame.rejected()
    );
    Ok(())
}
