use chrono::{Local, Offset, TimeZone};

/// FILETIME sentinel for "never".
pub const ZERO_TIME: u64 = 94354848000000000;

/// FILETIME sentinel for "permanent".
pub const DEFAULT_TIME: u64 = 150842304000000000;

/// 100-ns ticks between 1601-01-01 and the unix epoch.
const FILETIME_UNIX_EPOCH: i64 = 116444736010800000;

/// Timestamps on the wire are Windows FILETIME with the local timezone offset
/// pre-added; the client renders them without further conversion.
pub fn filetime_with_offset(epoch_ms: i64, utc_offset_seconds: i32) -> u64 {
    (epoch_ms * 10000 + FILETIME_UNIX_EPOCH + utc_offset_seconds as i64 * 10_000_000) as u64
}

pub fn filetime_now() -> u64 {
    let now = Local::now();
    let offset = now.offset().fix().local_minus_utc();
    filetime_with_offset(now.timestamp_millis(), offset)
}

/// FILETIME for a stored unix timestamp, folding in the local offset that was
/// in effect at that instant.
pub fn filetime_from_unix(unix_seconds: i64) -> u64 {
    let offset = match Local.timestamp_opt(unix_seconds, 0) {
        chrono::LocalResult::Single(time) => time.offset().fix().local_minus_utc(),
        _ => Local::now().offset().fix().local_minus_utc(),
    };
    filetime_with_offset(unix_seconds * 1000, offset)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filetime_formula_matches_reference() {
        // 2020-01-01T00:00:00Z at UTC+2.
        assert_eq!(
            filetime_with_offset(1_577_836_800_000, 7200),
            1_577_836_800_000 * 10000 + 116444736010800000 + 7200 * 10_000_000
        );
    }

    #[test]
    fn filetime_at_epoch_without_offset() {
        assert_eq!(filetime_with_offset(0, 0), 116444736010800000);
    }

    #[test]
    fn sentinels_are_fixed() {
        assert_eq!(ZERO_TIME, 94354848000000000);
        assert_eq!(DEFAULT_TIME, 150842304000000000);
    }
}
