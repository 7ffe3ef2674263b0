use std::fmt;
use std::str::FromStr;

use crate::error::ProtoError;

/// Urgency level carried by a `notify` message.
///
/// Mirrors `heyu.protocol.URGENCY_LOW/NORMAL/CRITICAL` and the
/// `urgency_map`/`urgency_names` tables from the original Python source:
/// the numeric values and canonical names are part of the wire contract,
/// not an implementation detail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Urgency {
    Low = 0,
    Normal = 1,
    Critical = 2,
}

impl Default for Urgency {
    fn default() -> Self {
        Urgency::Low
    }
}

impl Urgency {
    /// The canonical wire name for this urgency level.
    pub fn name(self) -> &'static str {
        match self {
            Urgency::Low => "low",
            Urgency::Normal => "normal",
            Urgency::Critical => "critical",
        }
    }

    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for Urgency {
    type Error = ProtoError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Urgency::Low),
            1 => Ok(Urgency::Normal),
            2 => Ok(Urgency::Critical),
            other => Err(ProtoError::InvalidUrgency(other)),
        }
    }
}

impl FromStr for Urgency {
    type Err = ProtoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "low" => Ok(Urgency::Low),
            "normal" => Ok(Urgency::Normal),
            "critical" => Ok(Urgency::Critical),
            _ => Err(ProtoError::UnknownUrgencyName(s.to_string())),
        }
    }
}

impl fmt::Display for Urgency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_names() {
        for u in [Urgency::Low, Urgency::Normal, Urgency::Critical] {
            assert_eq!(Urgency::from_str(u.name()).unwrap(), u);
            assert_eq!(Urgency::try_from(u.as_u8()).unwrap(), u);
        }
    }

    #[test]
    fn rejects_unknown_values() {
        assert!(Urgency::try_from(3).is_err());
        assert!(Urgency::from_str("urgent").is_err());
    }

    #[test]
    fn default_is_low() {
        assert_eq!(Urgency::default(), Urgency::Low);
    }
}
