//! Decoded sample values and the per-poll sample set.

use serde::{Deserialize, Serialize};

/// Hundredths of a second per day, the unit TimeTicks are counted in.
const TICKS_PER_DAY: u64 = 100 * 60 * 60 * 24;

/// Classification of a decoded variable, as far as arithmetic is concerned.
///
/// INTEGER, Counter32 and Unsigned32/Gauge32 all collapse into `Integer`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SampleKind {
    Integer,
    /// 64-bit counter. Only the low 32 bits take part in arithmetic.
    Counter64,
    /// Text with no numeric interpretation.
    OctetString,
    /// Device uptime in hundredths of a second.
    TimeTicks,
}

/// One decoded variable: the type tag, its display text and its numeric
/// equivalent (zero when the kind has no numeric interpretation).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sample {
    pub kind: SampleKind,
    pub text: String,
    pub numeric: i64,
}

impl Sample {
    pub fn integer(value: i64) -> Self {
        Self {
            kind: SampleKind::Integer,
            text: value.to_string(),
            numeric: value,
        }
    }

    /// A Counter64 keeps the full value in its text but only the low
    /// 32 bits in `numeric`. Rates on counters above 2^32 wrap.
    pub fn counter64(value: u64) -> Self {
        Self {
            kind: SampleKind::Counter64,
            text: value.to_string(),
            numeric: i64::from(value as u32),
        }
    }

    pub fn timeticks(ticks: u32) -> Self {
        Self {
            kind: SampleKind::TimeTicks,
            text: format_uptime(u64::from(ticks)),
            numeric: i64::from(ticks),
        }
    }

    /// Decodes an OCTET STRING. A string holding an unsigned integer literal
    /// is reclassified as `Integer` so it can take part in arithmetic.
    pub fn octet_string(bytes: &[u8]) -> Self {
        let text = String::from_utf8_lossy(bytes).into_owned();
        match text.trim().parse::<u64>() {
            Ok(n) => Self {
                kind: SampleKind::Integer,
                numeric: i64::try_from(n).unwrap_or(i64::MAX),
                text,
            },
            Err(_) => Self {
                kind: SampleKind::OctetString,
                text,
                numeric: 0,
            },
        }
    }

    /// Whether `numeric` carries a meaningful value.
    pub fn is_numeric(&self) -> bool {
        self.kind != SampleKind::OctetString
    }
}

/// Formats TimeTicks as `"{days}d {hours}:{minutes}"`.
pub fn format_uptime(ticks: u64) -> String {
    let days = ticks / TICKS_PER_DAY;
    let hours = (ticks / 100 / 60 / 60) % 24;
    let minutes = (ticks / 100 / 60) % 60;
    format!("{}d {}:{}", days, hours, minutes)
}

/// All variables decoded from one response, in request order.
///
/// Slot 0 is the implicit uptime request; configured values start at slot 1.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SampleSet {
    samples: Vec<Sample>,
}

impl SampleSet {
    pub fn new(samples: Vec<Sample>) -> Self {
        Self { samples }
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Device uptime carried in slot 0, or 0 when slot 0 is not TimeTicks.
    pub fn timestamp(&self) -> u64 {
        match self.samples.first() {
            Some(s) if s.kind == SampleKind::TimeTicks => s.numeric.max(0) as u64,
            _ => 0,
        }
    }

    /// The i-th configured value (slot `i + 1`).
    pub fn value(&self, index: usize) -> Option<&Sample> {
        self.samples.get(index + 1)
    }

    /// Number of configured values present (everything after slot 0).
    pub fn value_count(&self) -> usize {
        self.samples.len().saturating_sub(1)
    }

    /// Compares the configured values only; the uptime slot always moves.
    pub fn same_values(&self, other: &SampleSet) -> bool {
        self.samples.get(1..) == other.samples.get(1..)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_uptime() {
        assert_eq!(format_uptime(0), "0d 0:0");
        assert_eq!(format_uptime(864_720_000), "100d 2:0");
        assert_eq!(format_uptime(865_320_000), "100d 3:40");
    }

    #[test]
    fn test_octet_string_numeric_reclassification() {
        let s = Sample::octet_string(b"42");
        assert_eq!(s.kind, SampleKind::Integer);
        assert_eq!(s.numeric, 42);
        assert_eq!(s.text, "42");

        let s = Sample::octet_string(b"0.35");
        assert_eq!(s.kind, SampleKind::OctetString);
        assert_eq!(s.numeric, 0);
        assert!(!s.is_numeric());
    }

    #[test]
    fn test_counter64_keeps_only_low_bits_for_arithmetic() {
        let s = Sample::counter64((1u64 << 32) + 5);
        assert_eq!(s.numeric, 5);
        assert_eq!(s.text, "4294967301");
        assert!(s.is_numeric());
    }

    #[test]
    fn test_same_values_ignores_uptime_slot() {
        let a = SampleSet::new(vec![Sample::timeticks(100), Sample::integer(7)]);
        let b = SampleSet::new(vec![Sample::timeticks(200), Sample::integer(7)]);
        let c = SampleSet::new(vec![Sample::timeticks(300), Sample::integer(8)]);
        assert!(a.same_values(&b));
        assert!(!a.same_values(&c));
        assert_eq!(b.timestamp(), 200);
        assert_eq!(c.value(0).map(|s| s.numeric), Some(8));
        assert_eq!(c.value_count(), 1);
    }
}
