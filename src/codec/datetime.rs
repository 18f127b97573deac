use chrono::{DateTime, FixedOffset, TimeDelta, Timelike};

const NANOS_PER_MILLI: u32 = 1_000_000;
const HALF_MILLI: u32 = 500_000;

/// Round to the nearest millisecond, half up, carrying into seconds, days and beyond.
///
/// Returns `None` only when the carry leaves chrono's representable range.
#[must_use]
pub fn round_to_millis(dt: DateTime<FixedOffset>) -> Option<DateTime<FixedOffset>> {
    // Leap-second representations park the extra second in nanos >= 1e9.
    let nanos = dt.nanosecond();
    let sub_milli = nanos % NANOS_PER_MILLI;
    let truncated = dt.with_nanosecond(nanos - sub_milli)?;
    if sub_milli >= HALF_MILLI {
        truncated.checked_add_signed(TimeDelta::milliseconds(1))
    } else {
        Some(truncated)
    }
}
