//! Derived-value arithmetic: rates, divisors and human scaling.

use snmp_reader_core::SYS_UPTIME_OID;
use snmp_reader_types::sample::format_uptime;
use snmp_reader_types::{Oid, Sample, SampleKind, SampleSet};

const GIGA: i64 = 1024 * 1024 * 1024;
const MEGA: i64 = 1024 * 1024;
const KILO: i64 = 1024;

/// How a reader turns raw samples into displayed numbers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Derivation {
    pub delta: bool,
    pub divisor: u32,
}

/// Seconds between two samples, from the device uptime in slot 0.
/// Never less than one.
pub fn elapsed_seconds(current: &SampleSet, previous: &SampleSet) -> i64 {
    let diff = current.timestamp() as i64 - previous.timestamp() as i64;
    (diff / 100).max(1)
}

/// Apply delta and divisor rules to one raw value.
///
/// In delta mode a divisor of 0 yields the plain difference, without time
/// normalization. Outside delta mode a divisor of 0 counts as 1.
pub fn derive_value(raw: i64, previous: Option<i64>, elapsed: i64, rule: Derivation) -> i64 {
    if rule.delta {
        let diff = match previous {
            Some(prev) => raw.wrapping_sub(prev),
            None => 0,
        };
        if rule.divisor == 0 {
            diff
        } else {
            diff / elapsed.max(1) / i64::from(rule.divisor)
        }
    } else {
        raw / i64::from(rule.divisor.max(1))
    }
}

/// Binary magnitude suffixing: G, M and K above 2e9, 6e6 and 6000
pub fn scale(value: i64) -> String {
    if value >= 2_000_000_000 {
        format!("{}G", value / GIGA)
    } else if value >= 6_000_000 {
        format!("{}M", value / MEGA)
    } else if value >= 6000 {
        format!("{}K", value / KILO)
    } else {
        value.to_string()
    }
}

/// Whether a value is a device uptime and should render as `"Nd h:m"`
pub fn is_uptime(oid: Option<&Oid>, sample: &Sample) -> bool {
    sample.kind == SampleKind::TimeTicks || oid.map_or(false, |o| o.as_slice() == SYS_UPTIME_OID)
}

/// Render one configured value.
///
/// Uptimes and plain strings bypass all arithmetic.
pub fn render_sample(
    oid: Option<&Oid>,
    sample: &Sample,
    previous: Option<&Sample>,
    elapsed: i64,
    rule: Derivation,
    scaled: bool,
) -> String {
    if is_uptime(oid, sample) {
        return format_uptime(sample.numeric.max(0) as u64);
    }
    if !sample.is_numeric() {
        return sample.text.clone();
    }
    let previous = previous.filter(|p| p.is_numeric()).map(|p| p.numeric);
    let value = derive_value(sample.numeric, previous, elapsed, rule);
    if scaled {
        scale(value)
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DELTA: Derivation = Derivation {
        delta: true,
        divisor: 1,
    };

    #[test]
    fn test_delta_per_second() {
        assert_eq!(derive_value(150, Some(100), 10, DELTA), 5);
    }

    #[test]
    fn test_delta_with_zero_divisor_is_raw_difference() {
        let rule = Derivation {
            delta: true,
            divisor: 0,
        };
        assert_eq!(derive_value(150, Some(100), 10, rule), 50);
    }

    #[test]
    fn test_absolute_value_divisor() {
        let rule = Derivation {
            delta: false,
            divisor: 0,
        };
        assert_eq!(derive_value(1500, None, 1, rule), 1500);
        let rule = Derivation {
            delta: false,
            divisor: 100,
        };
        assert_eq!(derive_value(1500, None, 1, rule), 15);
    }

    #[test]
    fn test_first_delta_sample_is_zero() {
        assert_eq!(derive_value(123_456, None, 1, DELTA), 0);
    }

    #[test]
    fn test_scale_boundaries() {
        assert_eq!(scale(999), "999");
        assert_eq!(scale(5999), "5999");
        assert_eq!(scale(7000), "6K");
        assert_eq!(scale(7_000_000), "6M");
        assert_eq!(scale(3_000_000_000), "2G");
        assert_eq!(scale(-7000), "-7000");
    }

    #[test]
    fn test_elapsed_seconds_floor() {
        let at = |ticks| SampleSet::new(vec![Sample::timeticks(ticks)]);
        assert_eq!(elapsed_seconds(&at(2000), &at(1000)), 10);
        assert_eq!(elapsed_seconds(&at(1050), &at(1000)), 1);
        // Device rebooted: uptime went backwards
        assert_eq!(elapsed_seconds(&at(10), &at(1000)), 1);
    }

    #[test]
    fn test_render_special_cases() {
        let uptime = Oid::from_slice(SYS_UPTIME_OID);
        let ticks = Sample::timeticks(864_720_000);
        assert_eq!(render_sample(Some(&uptime), &ticks, None, 1, DELTA, true), "100d 2:0");

        let text = Sample::octet_string(b"up 3 days");
        assert_eq!(render_sample(None, &text, None, 1, DELTA, true), "up 3 days");

        let now = Sample::integer(1_000_000 + 70_000);
        let before = Sample::integer(1_000_000);
        assert_eq!(render_sample(None, &now, Some(&before), 10, DELTA, false), "7000");
        assert_eq!(render_sample(None, &now, Some(&before), 10, DELTA, true), "6K");
    }
}
