use std::fmt;

use crate::value::{RawValue, RegisterId, RegisterValue};

/// How a register's raw value becomes a number.
///
/// Raw bytes are read as big-endian unsigned first. `signed` reinterprets the
/// 16-bit value as two's complement (single bytes are zero-extended before
/// that). Integer rules truncate the division toward zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeRule {
    Integer { signed: bool, divisor: u16 },
    Float { signed: bool, divisor: u16 },
    /// Registers with no known meaning: the raw unsigned value.
    Identity,
}

impl DecodeRule {
    /// Unscaled integer passthrough.
    pub const RAW: DecodeRule = DecodeRule::Integer {
        signed: false,
        divisor: 1,
    };

    pub fn apply(self, raw: RawValue) -> RegisterValue {
        let unsigned = raw.as_u16();
        let twos = raw.as_i16();
        match self {
            DecodeRule::Integer { signed: true, divisor } => {
                RegisterValue::Integer(i64::from(twos) / i64::from(divisor))
            }
            DecodeRule::Integer {
                signed: false,
                divisor,
            } => RegisterValue::Integer(i64::from(unsigned) / i64::from(divisor)),
            DecodeRule::Float { signed: true, divisor } => {
                RegisterValue::Float(f64::from(twos) / f64::from(divisor))
            }
            DecodeRule::Float {
                signed: false,
                divisor,
            } => RegisterValue::Float(f64::from(unsigned) / f64::from(divisor)),
            DecodeRule::Identity => RegisterValue::Integer(i64::from(unsigned)),
        }
    }
}

impl fmt::Display for DecodeRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (kind, signed, divisor) = match *self {
            DecodeRule::Integer { signed, divisor } => ("int", signed, divisor),
            DecodeRule::Float { signed, divisor } => ("float", signed, divisor),
            DecodeRule::Identity => return f.write_str("identity"),
        };
        let sign = if signed { "signed" } else { "unsigned" };
        if divisor == 1 {
            write!(f, "{sign} {kind}")
        } else {
            write!(f, "{sign} {kind} /{divisor}")
        }
    }
}

/// Decode rule for a register.
pub const fn rule_for(register: RegisterId) -> DecodeRule {
    match register {
        0 | 31..=36 | 38 | 44..=46 | 48 | 100..=105 => DecodeRule::RAW,
        4 | 8 => DecodeRule::Integer {
            signed: true,
            divisor: 10,
        },
        25 => DecodeRule::Integer {
            signed: false,
            divisor: 10,
        },
        1 | 5..=7 | 11..=18 | 21 | 23 | 27 | 37 => DecodeRule::Float {
            signed: true,
            divisor: 10,
        },
        9 | 10 | 19 | 20 | 22 | 24 => DecodeRule::Float {
            signed: false,
            divisor: 10,
        },
        40 | 47 => DecodeRule::Float {
            signed: false,
            divisor: 2,
        },
        43 | 49 | 50 => DecodeRule::Float {
            signed: false,
            divisor: 1,
        },
        // 2, 3, 26, 28-30, 39, 41, 42 show up on the wire but are undocumented.
        _ => DecodeRule::Identity,
    }
}

/// Decode a register's raw bytes.
pub fn decode(register: RegisterId, raw: RawValue) -> RegisterValue {
    rule_for(register).apply(raw)
}

/// Descriptive metadata for a documented register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegisterInfo {
    pub name: &'static str,
    pub unit: Option<&'static str>,
}

const fn info(name: &'static str, unit: Option<&'static str>) -> Option<RegisterInfo> {
    Some(RegisterInfo { name, unit })
}

const CELSIUS: Option<&str> = Some("°C");

/// Every register with a documented meaning, in ID order.
pub const KNOWN_REGISTERS: [RegisterId; 48] = [
    0, 1, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16, 17, 18, 19, 20, 21, 22, 23, 24, 25, 27,
    31, 32, 33, 34, 35, 36, 37, 38, 40, 43, 44, 45, 46, 47, 48, 49, 50, 100, 101, 102, 103, 104,
    105,
];

/// Name and unit of a documented register.
pub fn register_info(register: RegisterId) -> Option<RegisterInfo> {
    match register {
        0 => info("CPU ID", None),
        1 => info("Outdoor temperature", CELSIUS),
        4 => info("Heating curve offset", None),
        5 => info("Flow temperature setpoint", CELSIUS),
        6 => info("Flow temperature", CELSIUS),
        7 => info("Return temperature", CELSIUS),
        8 => info("Degree minutes", None),
        9 => info("Compressor frequency setpoint", Some("Hz")),
        10 => info("Compressor frequency", Some("Hz")),
        11 => info("Condenser out (max)", CELSIUS),
        12 => info("Hot water top", CELSIUS),
        13 => info("Hot water bottom", CELSIUS),
        14 => info("Evaporator temperature Tho-R1", CELSIUS),
        15 => info("Evaporator temperature Tho-R2", CELSIUS),
        16 => info("Suction gas temperature Tho-S", CELSIUS),
        17 => info("Hot gas temperature Tho-D", CELSIUS),
        18 => info("Liquid temperature AMS", CELSIUS),
        19 => info("High pressure", Some("bar")),
        20 => info("Low pressure", Some("bar")),
        21 => info("Outdoor temperature at AMS Tho-A", CELSIUS),
        22 => info("AMS phase current", Some("A")),
        23 => info("Inverter temperature Tho-IP", CELSIUS),
        24 => info("Compressor run time", Some("h")),
        25 => info("Compressor starts", None),
        27 => info("Supply temperature", CELSIUS),
        31 => info("Heating status", None),
        32 => info("Auxiliary heating allowed", None),
        33 => info("Max dF compressor", None),
        34 => info("Compressor frequency reg P", None),
        35 => info("Min start time at min frequency", Some("min")),
        36 => info("Min time at constant frequency", Some("min")),
        37 => info("Max difference setpoint/calculated", CELSIUS),
        38 => info("Compressor frequency GradMin", None),
        40 => info("Hysteresis", CELSIUS),
        43 => info("Stop temperature heating", CELSIUS),
        44 => info("Pump speed", Some("%")),
        45 => info("Hot water reg P", None),
        46 => info("Hot water reg Q", None),
        47 => info("Hot water reg xP", None),
        48 => info("Hot water reg value xP", Some("%")),
        49 => info("Hot water start temperature", CELSIUS),
        50 => info("Hot water stop temperature", CELSIUS),
        100 => info("Date year", None),
        101 => info("Date month", None),
        102 => info("Date day", None),
        103 => info("Time hour", None),
        104 => info("Time minute", None),
        105 => info("Time second", None),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signed_float_register() {
        assert_eq!(
            decode(1, RawValue::Word([0xFF, 0xF6])),
            RegisterValue::Float(-1.0)
        );
        assert_eq!(
            decode(6, RawValue::Word([0x01, 0x2C])),
            RegisterValue::Float(30.0)
        );
    }

    #[test]
    fn unsigned_integer_divides_and_truncates() {
        assert_eq!(decode(25, RawValue::Byte(100)), RegisterValue::Integer(10));
        assert_eq!(
            decode(25, RawValue::Word([0x00, 0x6D])),
            RegisterValue::Integer(10)
        );
    }

    #[test]
    fn signed_integer_truncates_toward_zero() {
        // 0xFFF1 = -15 -> -1.5 -> -1
        assert_eq!(
            decode(8, RawValue::Word([0xFF, 0xF1])),
            RegisterValue::Integer(-1)
        );
        assert_eq!(
            decode(4, RawValue::Word([0x00, 0x19])),
            RegisterValue::Integer(2)
        );
    }

    #[test]
    fn half_scaled_register() {
        assert_eq!(
            decode(40, RawValue::Word([0x00, 0x32])),
            RegisterValue::Float(25.0)
        );
        assert_eq!(decode(47, RawValue::Byte(7)), RegisterValue::Float(3.5));
    }

    #[test]
    fn unscaled_float_register() {
        assert_eq!(decode(49, RawValue::Byte(45)), RegisterValue::Float(45.0));
    }

    #[test]
    fn unsigned_tenths() {
        assert_eq!(
            decode(19, RawValue::Word([0x00, 0xFF])),
            RegisterValue::Float(25.5)
        );
    }

    #[test]
    fn raw_passthrough() {
        assert_eq!(decode(0, RawValue::Byte(5)), RegisterValue::Integer(5));
        assert_eq!(decode(31, RawValue::Byte(3)), RegisterValue::Integer(3));
        assert_eq!(
            decode(100, RawValue::Word([0x07, 0xEA])),
            RegisterValue::Integer(2026)
        );
    }

    #[test]
    fn single_byte_is_zero_extended_before_sign() {
        assert_eq!(decode(1, RawValue::Byte(0xF6)), RegisterValue::Float(24.6));
    }

    #[test]
    fn unknown_registers_fall_back_to_identity() {
        assert_eq!(decode(99, RawValue::Byte(7)), RegisterValue::Integer(7));
        for register in [2, 3, 26, 28, 29, 30, 39, 41, 42] {
            assert_eq!(rule_for(register), DecodeRule::Identity);
            assert_eq!(
                decode(register, RawValue::Word([0xFF, 0xFF])),
                RegisterValue::Integer(65535)
            );
        }
    }

    #[test]
    fn every_known_register_has_a_rule_and_info() {
        for register in KNOWN_REGISTERS {
            assert_ne!(rule_for(register), DecodeRule::Identity, "register {register}");
            assert!(register_info(register).is_some(), "register {register}");
        }
        assert!(register_info(2).is_none());
        assert!(KNOWN_REGISTERS.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn rule_display() {
        assert_eq!(rule_for(0).to_string(), "unsigned int");
        assert_eq!(rule_for(4).to_string(), "signed int /10");
        assert_eq!(rule_for(40).to_string(), "unsigned float /2");
        assert_eq!(rule_for(99).to_string(), "identity");
    }
}
