use crate::cmd::ListenArgs;
use crate::exit::CliResult;
use crate::output::OutputFormat;

#[cfg(unix)]
pub fn run(args: ListenArgs, format: OutputFormat) -> CliResult<i32> {
    use std::sync::Arc;

    use nibe_frame::FrameConfig;
    use nibe_link::{Link, LinkConfig};
    use nibe_registers::RegisterTable;
    use nibe_transport::{LinkParity, SerialConfig};
    use tracing::info;

    use crate::cmd::{install_ctrlc_handler, parse_duration, subscribe_printer, ParityArg};
    use crate::exit::{link_error, SUCCESS};

    let timeout = parse_duration(&args.timeout)?;
    let parity = match args.parity {
        ParityArg::None => LinkParity::None,
        ParityArg::Even => LinkParity::Even,
        ParityArg::Odd => LinkParity::Odd,
        ParityArg::Mark => LinkParity::Mark,
    };
    let config = LinkConfig {
        serial: SerialConfig {
            baud_rate: args.baud,
            timeout,
            parity,
        },
        frame: FrameConfig {
            read_timeout: Some(timeout),
        },
    };

    let registers = Arc::new(RegisterTable::new());
    let mut link = Link::open(&args.port, Arc::clone(&registers), &config)
        .map_err(|err| link_error("open failed", err))?;

    info!(port = %link.channel().path().display(), "listening");

    let stop = link.stop_handle();
    install_ctrlc_handler(stop.clone())?;
    subscribe_printer(&registers, &args.subscription, format, stop);

    let stats = link.run().map_err(|err| link_error("link failed", err))?;
    info!(
        frames = stats.frames,
        updates = stats.updates,
        rejected = stats.frame.rejected(),
        "listen finished"
    );
    Ok(SUCCESS)
}

#[cfg(not(unix))]
pub fn run(_args: ListenArgs, _format: OutputFormat) -> CliResult<i32> {
    Err(crate::exit::CliError::new(
        crate::exit::USAGE,
        "serial ports are only supported on unix",
    ))
}
