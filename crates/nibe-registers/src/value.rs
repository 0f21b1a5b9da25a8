use std::fmt;

/// Register identifier as it appears in the payload.
pub type RegisterId = u8;

/// Undecoded register bytes, exactly as they appeared in the payload.
///
/// Width is significant: `Byte(5)` and `Word([0, 5])` are different raw values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RawValue {
    Byte(u8),
    Word([u8; 2]),
}

impl RawValue {
    /// Big-endian unsigned value; single bytes are zero-extended.
    pub fn as_u16(self) -> u16 {
        match self {
            RawValue::Byte(b) => u16::from(b),
            RawValue::Word(w) => u16::from_be_bytes(w),
        }
    }

    /// Two's-complement reinterpretation of [`as_u16`](Self::as_u16).
    pub fn as_i16(self) -> i16 {
        self.as_u16() as i16
    }

    pub fn width(self) -> usize {
        match self {
            RawValue::Byte(_) => 1,
            RawValue::Word(_) => 2,
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        match self {
            RawValue::Byte(b) => std::slice::from_ref(b),
            RawValue::Word(w) => w,
        }
    }
}

/// Decoded register value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RegisterValue {
    Integer(i64),
    Float(f64),
}

impl fmt::Display for RegisterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegisterValue::Integer(v) => write!(f, "{v}"),
            RegisterValue::Float(v) => write!(f, "{v:?}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_values_are_big_endian() {
        assert_eq!(RawValue::Word([0x01, 0x02]).as_u16(), 0x0102);
        assert_eq!(RawValue::Byte(0xFE).as_u16(), 0x00FE);
        assert_eq!(RawValue::Word([0xFF, 0xF6]).as_i16(), -10);
        assert_eq!(RawValue::Byte(0xFF).as_i16(), 255);
    }

    #[test]
    fn width_is_part_of_identity() {
        assert_ne!(RawValue::Byte(5), RawValue::Word([0, 5]));
        assert_eq!(RawValue::Byte(5).as_bytes(), &[5]);
        assert_eq!(RawValue::Word([0, 5]).as_bytes(), &[0, 5]);
        assert_eq!(RawValue::Word([0, 5]).width(), 2);
    }

    #[test]
    fn display_keeps_float_marker() {
        assert_eq!(RegisterValue::Integer(-3).to_string(), "-3");
        assert_eq!(RegisterValue::Float(25.0).to_string(), "25.0");
        assert_eq!(RegisterValue::Float(-1.5).to_string(), "-1.5");
    }
}
