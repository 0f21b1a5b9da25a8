use crate::cmd::RegistersArgs;
use crate::exit::{CliResult, SUCCESS};
use crate::output::{print_rules, OutputFormat};

pub fn run(_args: RegistersArgs, format: OutputFormat) -> CliResult<i32> {
    print_rules(format);
    Ok(SUCCESS)
}
