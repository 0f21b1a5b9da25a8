use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use clap::{Args, Subcommand, ValueEnum};
use nibe_link::StopHandle;
use nibe_registers::{RegisterId, RegisterTable, Update, KNOWN_REGISTERS};

use crate::exit::{CliError, CliResult, INTERNAL, USAGE};
use crate::output::{print_update, OutputFormat};

pub mod decode;
pub mod listen;
pub mod registers;
pub mod replay;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Read the serial link and print register changes.
    Listen(ListenArgs),
    /// Run a captured byte stream through the reader.
    Replay(ReplayArgs),
    /// Decode a hex payload without change tracking.
    Decode(DecodeArgs),
    /// List documented registers and their decode rules.
    Registers(RegistersArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Listen(args) => listen::run(args, format),
        Command::Replay(args) => replay::run(args, format),
        Command::Decode(args) => decode::run(args, format),
        Command::Registers(args) => registers::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

/// Which registers to print, shared by `listen` and `replay`.
#[derive(Args, Debug)]
pub struct SubscriptionArgs {
    /// Registers to print (comma-separated). Default: all documented registers.
    #[arg(long, value_delimiter = ',', env = "NIBE_REGISTERS")]
    pub registers: Option<Vec<RegisterId>>,
    /// Exit after printing N updates.
    #[arg(long)]
    pub count: Option<usize>,
}

#[derive(Args, Debug)]
pub struct ListenArgs {
    /// Serial device (e.g. /dev/ttyUSB0).
    #[arg(env = "NIBE_PORT")]
    pub port: PathBuf,
    #[command(flatten)]
    pub subscription: SubscriptionArgs,
    /// Line speed.
    #[arg(long, default_value_t = 19_200)]
    pub baud: u32,
    /// Parity mode of the line.
    #[arg(long, value_enum, default_value = "mark")]
    pub parity: ParityArg,
    /// Read timeout (e.g. 3s, 500ms).
    #[arg(long, default_value = "3s")]
    pub timeout: String,
}

#[derive(Args, Debug)]
pub struct ReplayArgs {
    /// Capture file holding raw line bytes.
    pub file: PathBuf,
    #[command(flatten)]
    pub subscription: SubscriptionArgs,
}

#[derive(Args, Debug)]
pub struct DecodeArgs {
    /// Hex bytes; whitespace is ignored.
    pub hex: String,
    /// Input is a whole frame (prefix, payload, checksum) and is validated first.
    #[arg(long)]
    pub frame: bool,
}

#[derive(Args, Debug, Default)]
pub struct RegistersArgs {}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum ParityArg {
    None,
    Even,
    Odd,
    Mark,
}

/// Subscribe a printer to each selected register.
///
/// Once `count` updates have been printed the link is stopped; updates
/// arriving after that are dropped.
pub(crate) fn subscribe_printer(
    registers: &RegisterTable,
    args: &SubscriptionArgs,
    format: OutputFormat,
    stop: StopHandle,
) {
    let ids = args
        .registers
        .clone()
        .unwrap_or_else(|| KNOWN_REGISTERS.to_vec());
    let printed = Arc::new(AtomicUsize::new(0));
    let limit = args.count;

    for register in ids {
        let printed = Arc::clone(&printed);
        let stop = stop.clone();
        registers.subscribe(register, move |update: &Update| {
            if !stop.is_running() {
                return;
            }
            print_update(update, format);
            let total = printed.fetch_add(1, Ordering::SeqCst) + 1;
            if limit.is_some_and(|limit| total >= limit) {
                stop.stop();
            }
        });
    }
}

pub(crate) fn install_ctrlc_handler(stop: StopHandle) -> CliResult<()> {
    ctrlc::set_handler(move || stop.stop()).map_err(|err| {
        CliError::new(INTERNAL, format!("signal handler setup failed: {err}"))
    })
}

pub(crate) fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, millis) = if let Some(num) = input.strip_suffix("ms") {
        (num, true)
    } else if let Some(num) = input.strip_suffix('s') {
        (num, false)
    } else {
        (input, false)
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;

    if value == 0 {
        return Err(CliError::new(USAGE, "duration must be greater than zero"));
    }

    Ok(if millis {
        Duration::from_millis(value)
    } else {
        Duration::from_secs(value)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn durations_accept_seconds_and_millis() {
        assert_eq!(parse_duration("3s").unwrap(), Duration::from_secs(3));
        assert_eq!(parse_duration("500ms").unwrap(), Duration::from_millis(500));
        assert_eq!(parse_duration(" 7 ").unwrap(), Duration::from_secs(7));
    }

    #[test]
    fn durations_reject_zero_and_garbage() {
        assert_eq!(parse_duration("0s").unwrap_err().code, USAGE);
        assert_eq!(parse_duration("").unwrap_err().code, USAGE);
        assert_eq!(parse_duration("3m").unwrap_err().code, USAGE);
    }
}
