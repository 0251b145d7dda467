//! Vocoder codec enumerants

use std::fmt;

/// Vocoder algorithms the transcoder can convert between
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Codec {
    /// AMBE+ (D-STAR)
    AmbePlus = 1,
    /// AMBE2+ (DMR, YSF)
    Ambe2Plus = 2,
}

impl Codec {
    /// Decode a wire enumerant, `None` for anything unsupported
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            1 => Some(Codec::AmbePlus),
            2 => Some(Codec::Ambe2Plus),
            _ => None,
        }
    }

    /// Wire enumerant
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    pub fn name(self) -> &'static str {
        match self {
            Codec::AmbePlus => "AMBE+",
            Codec::Ambe2Plus => "AMBE2+",
        }
    }
}

impl fmt::Display for Codec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
