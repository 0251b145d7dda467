//! Amateur radio station identifier carried in control packets

use std::fmt;

/// Fixed width of a callsign on the wire
pub const CALLSIGN_LEN: usize = 8;

/// Space-padded, 8-byte station callsign
///
/// The last byte doubles as the module letter (`"XLX123 B"`) and may be
/// a space when no module is given.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Callsign([u8; CALLSIGN_LEN]);

impl Callsign {
    /// Build a callsign from raw bytes
    ///
    /// At most [`CALLSIGN_LEN`] bytes are taken; shorter input is padded
    /// with spaces and NUL bytes are turned into spaces. No validation is
    /// done here, see [`Callsign::is_valid`].
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let mut raw = [b' '; CALLSIGN_LEN];
        for (dst, &src) in raw.iter_mut().zip(bytes.iter()) {
            *dst = if src == 0 { b' ' } else { src };
        }
        Self(raw)
    }

    /// Build a callsign and keep it only if it is valid
    pub fn parse(bytes: &[u8]) -> Option<Self> {
        let callsign = Self::from_bytes(bytes);
        callsign.is_valid().then_some(callsign)
    }

    /// Check the callsign grammar
    ///
    /// The first three characters are uppercase letters or digits but not
    /// all digits; the remaining ones are uppercase letters, digits or
    /// spaces.
    pub fn is_valid(&self) -> bool {
        let (head, tail) = self.0.split_at(3);

        let head_ok = head.iter().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
            && !head.iter().all(u8::is_ascii_digit);
        let tail_ok = tail
            .iter()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || *c == b' ');

        head_ok && tail_ok
    }

    /// Raw wire representation
    pub fn as_bytes(&self) -> &[u8; CALLSIGN_LEN] {
        &self.0
    }

    /// Module letter, if one is set
    pub fn module(&self) -> Option<char> {
        let last = self.0[CALLSIGN_LEN - 1];
        last.is_ascii_uppercase().then_some(last as char)
    }
}

impl fmt::Display for Callsign {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = String::from_utf8_lossy(&self.0);
        f.write_str(text.trim_end())
    }
}

impl fmt::Debug for Callsign {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Callsign({:?})", String::from_utf8_lossy(&self.0))
    }
}
