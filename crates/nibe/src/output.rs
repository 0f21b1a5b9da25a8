use std::io::IsTerminal;
use std::time::{SystemTime, UNIX_EPOCH};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use nibe_registers::{
    register_info, rule_for, RawValue, RegisterId, RegisterValue, Update, KNOWN_REGISTERS,
};
use serde::Serialize;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

/// Number that keeps its integer or float form in JSON.
#[derive(Serialize)]
#[serde(untagged)]
enum JsonValue {
    Integer(i64),
    Float(f64),
}

impl From<RegisterValue> for JsonValue {
    fn from(value: RegisterValue) -> Self {
        match value {
            RegisterValue::Integer(v) => JsonValue::Integer(v),
            RegisterValue::Float(v) => JsonValue::Float(v),
        }
    }
}

#[derive(Serialize)]
struct UpdateOutput<'a> {
    register: RegisterId,
    name: Option<&'static str>,
    value: JsonValue,
    unit: Option<&'static str>,
    raw: String,
    source: &'a str,
    info: &'a str,
    timestamp: String,
}

#[derive(Serialize)]
struct EntryOutput {
    register: RegisterId,
    name: Option<&'static str>,
    value: JsonValue,
    unit: Option<&'static str>,
    raw: String,
}

#[derive(Serialize)]
struct DecodeOutput {
    payload_size: usize,
    entries: Vec<EntryOutput>,
}

#[derive(Serialize)]
struct RuleOutput {
    register: RegisterId,
    name: &'static str,
    unit: Option<&'static str>,
    rule: String,
}

/// Print one changed register as it arrives.
pub fn print_update(update: &Update, format: OutputFormat) {
    let info = register_info(update.register);
    let name = info.map(|i| i.name);
    let unit = info.and_then(|i| i.unit);

    match format {
        OutputFormat::Json => {
            let out = UpdateOutput {
                register: update.register,
                name,
                value: update.value.into(),
                unit,
                raw: raw_hex(update.raw),
                source: update.source,
                info: &update.info,
                timestamp: now_unix_seconds(),
            };
            print_json(&out);
        }
        OutputFormat::Table => {
            let mut table = new_table(vec!["REGISTER", "NAME", "VALUE", "RAW", "SOURCE"]);
            table.add_row(vec![
                update.register.to_string(),
                name.unwrap_or("-").to_string(),
                with_unit(update.value, unit),
                raw_hex(update.raw),
                update.source.to_string(),
            ]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!(
                "[{}] {} {} = {} (raw {})",
                update.source,
                update.info,
                name.unwrap_or("unknown"),
                with_unit(update.value, unit),
                raw_hex(update.raw)
            );
        }
    }
}

/// Print every entry of a decoded payload.
pub fn print_entries(
    payload_size: usize,
    entries: &[(RegisterId, RawValue, RegisterValue)],
    format: OutputFormat,
) {
    match format {
        OutputFormat::Json => {
            let out = DecodeOutput {
                payload_size,
                entries: entries
                    .iter()
                    .map(|&(register, raw, value)| {
                        let info = register_info(register);
                        EntryOutput {
                            register,
                            name: info.map(|i| i.name),
                            value: value.into(),
                            unit: info.and_then(|i| i.unit),
                            raw: raw_hex(raw),
                        }
                    })
                    .collect(),
            };
            print_json(&out);
        }
        OutputFormat::Table => {
            let mut table = new_table(vec!["REGISTER", "NAME", "VALUE", "RAW"]);
            for &(register, raw, value) in entries {
                let info = register_info(register);
                table.add_row(vec![
                    register.to_string(),
                    info.map_or("-", |i| i.name).to_string(),
                    with_unit(value, info.and_then(|i| i.unit)),
                    raw_hex(raw),
                ]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            for &(register, raw, value) in entries {
                let info = register_info(register);
                println!(
                    "REG {register:>3} {:<36} {} (raw {})",
                    info.map_or("unknown", |i| i.name),
                    with_unit(value, info.and_then(|i| i.unit)),
                    raw_hex(raw)
                );
            }
        }
    }
}

/// Print the decode rule of every documented register.
pub fn print_rules(format: OutputFormat) {
    let rows: Vec<RuleOutput> = KNOWN_REGISTERS
        .iter()
        .filter_map(|&register| {
            register_info(register).map(|info| RuleOutput {
                register,
                name: info.name,
                unit: info.unit,
                rule: rule_for(register).to_string(),
            })
        })
        .collect();

    match format {
        OutputFormat::Json => print_json(&rows),
        OutputFormat::Table => {
            let mut table = new_table(vec!["REGISTER", "NAME", "UNIT", "RULE"]);
            for row in &rows {
                table.add_row(vec![
                    row.register.to_string(),
                    row.name.to_string(),
                    row.unit.unwrap_or("-").to_string(),
                    row.rule.clone(),
                ]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            for row in &rows {
                println!(
                    "{:>3}  {:<36} {:<5} {}",
                    row.register,
                    row.name,
                    row.unit.unwrap_or(""),
                    row.rule
                );
            }
        }
    }
}

fn new_table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);
    table
}

fn print_json<T: Serialize>(value: &T) {
    println!(
        "{}",
        serde_json::to_string(value).unwrap_or_else(|_| "{}".to_string())
    );
}

fn with_unit(value: RegisterValue, unit: Option<&str>) -> String {
    match unit {
        Some(unit) => format!("{value} {unit}"),
        None => value.to_string(),
    }
}

fn raw_hex(raw: RawValue) -> String {
    hex::encode(raw.as_bytes())
}

fn now_unix_seconds() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs().to_string())
        .unwrap_or_else(|_| "0".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_value_keeps_number_kind() {
        let int = serde_json::to_string(&JsonValue::from(RegisterValue::Integer(10))).unwrap();
        let float = serde_json::to_string(&JsonValue::from(RegisterValue::Float(-1.0))).unwrap();
        assert_eq!(int, "10");
        assert_eq!(float, "-1.0");
    }

    #[test]
    fn raw_is_lower_hex_of_wire_bytes() {
        assert_eq!(raw_hex(RawValue::Word([0xFF, 0xF6])), "fff6");
        assert_eq!(raw_hex(RawValue::Byte(0x64)), "64");
    }

    #[test]
    fn unit_is_appended_when_known() {
        assert_eq!(with_unit(RegisterValue::Float(21.5), Some("°C")), "21.5 °C");
        assert_eq!(with_unit(RegisterValue::Integer(3), None), "3");
    }
}
