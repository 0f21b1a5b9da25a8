use bytes::Bytes;
use nibe_frame::decode_frame;
use nibe_registers::{decode, PayloadEntries};

use crate::cmd::DecodeArgs;
use crate::exit::{CliError, CliResult, DATA_INVALID, SUCCESS};
use crate::output::{print_entries, OutputFormat};

pub fn run(args: DecodeArgs, format: OutputFormat) -> CliResult<i32> {
    let bytes = parse_hex(&args.hex)?;
    let payload = if args.frame {
        decode_frame(bytes)
            .map_err(|reason| CliError::new(DATA_INVALID, format!("frame rejected: {reason}")))?
            .payload
    } else {
        bytes
    };

    let entries: Vec<_> = PayloadEntries::new(&payload)
        .map(|(register, raw)| (register, raw, decode(register, raw)))
        .collect();
    print_entries(payload.len(), &entries, format);
    Ok(SUCCESS)
}

fn parse_hex(input: &str) -> CliResult<Bytes> {
    let compact: String = input.split_whitespace().collect();
    hex::decode(compact)
        .map(Bytes::from)
        .map_err(|err| CliError::new(DATA_INVALID, format!("invalid hex input: {err}")))
}
