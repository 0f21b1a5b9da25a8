use std::sync::Arc;

use nibe_link::{Link, LinkStats};
use nibe_registers::RegisterTable;
use nibe_transport::ReplayChannel;
use tracing::info;

use crate::cmd::{install_ctrlc_handler, subscribe_printer, ReplayArgs};
use crate::exit::{link_error, transport_error, CliResult, SUCCESS};
use crate::output::OutputFormat;

pub fn run(args: ReplayArgs, format: OutputFormat) -> CliResult<i32> {
    let channel =
        ReplayChannel::open(&args.file).map_err(|err| transport_error("replay failed", err))?;

    let registers = Arc::new(RegisterTable::new());
    let mut link = Link::replay(channel, Arc::clone(&registers));

    let stop = link.stop_handle();
    install_ctrlc_handler(stop.clone())?;
    subscribe_printer(&registers, &args.subscription, format, stop);

    let stats = match link.run() {
        Ok(stats) => stats,
        // A capture ends wherever it was cut, possibly mid-frame.
        Err(err) if err.is_end_of_stream() => link.stats(),
        Err(err) => return Err(link_error("replay failed", err)),
    };
    log_summary(&stats, link.channel().written().len());
    Ok(SUCCESS)
}

fn log_summary(stats: &LinkStats, acks: usize) {
    info!(
        frames = stats.frames,
        updates = stats.updates,
        noise_bytes = stats.frame.noise_bytes,
        checksum_errors = stats.frame.checksum_errors,
        acks,
        "replay finished"
    );
}
