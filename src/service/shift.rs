//! Local-clock helpers for badge scans: shift classification, the scan state machine
//! and calendar-day windows.

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveTime, TimeZone, Utc};

use crate::model::attendance::{AttendanceRecord, AttendanceStatus};

/// Status of a check-in made at `local_time` against an optional shift.
///
/// Without a configured shift every check-in is on time. Arrivals after the
/// grace period are late; arrivals at or after the shift end are out of hours.
pub fn classify_check_in(
    local_time: NaiveTime,
    shift_start: Option<NaiveTime>,
    shift_end: Option<NaiveTime>,
    grace_minutes: i64,
) -> AttendanceStatus {
    if let Some(end) = shift_end {
        if local_time >= end {
            return AttendanceStatus::FueraDeHorario;
        }
    }

    match shift_start {
        // time difference, not `start + grace`, which wraps at midnight
        Some(start) if local_time.signed_duration_since(start) > Duration::minutes(grace_minutes) => {
            AttendanceStatus::Retardo
        }
        _ => AttendanceStatus::Presente,
    }
}

/// What a badge scan does, given the employee's records for the local day.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScanStep<'a> {
    /// Nothing scanned yet today: open a record.
    CheckIn,
    /// Close this open record.
    CheckOut(&'a AttendanceRecord),
    /// The day's record is already closed; a day is attended at most once.
    DayClosed(&'a AttendanceRecord),
}

fn opened_by_scan(status: AttendanceStatus) -> bool {
    matches!(
        status,
        AttendanceStatus::Presente | AttendanceStatus::Retardo | AttendanceStatus::FueraDeHorario
    )
}

/// Records opened by manual marking (ausente, vacaciones, ...) are ignored.
pub fn next_scan_step(today: &[AttendanceRecord]) -> ScanStep<'_> {
    let scanned = today.iter().filter(|r| opened_by_scan(r.status));

    if let Some(open) = scanned.clone().filter(|r| r.check_out.is_none()).max_by_key(|r| r.check_in) {
        return ScanStep::CheckOut(open);
    }

    match scanned.max_by_key(|r| r.check_in) {
        Some(closed) => ScanStep::DayClosed(closed),
        None => ScanStep::CheckIn,
    }
}

/// Start of the local calendar day `date`, as a UTC instant.
pub fn local_day_start(date: NaiveDate, offset: FixedOffset) -> DateTime<Utc> {
    offset
        .from_local_datetime(&date.and_time(NaiveTime::default()))
        .single()
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|| date.and_time(NaiveTime::default()).and_utc())
}

/// Half-open UTC window `[from 00:00, to+1 00:00)` covering both local days inclusively.
pub fn day_range(
    from: NaiveDate,
    to: NaiveDate,
    offset: FixedOffset,
) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    if from > to {
        return None;
    }
    let end = to.succ_opt()?;
    Some((local_day_start(from, offset), local_day_start(end, offset)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn test_on_time_within_grace() {
        let status = classify_check_in(t(7, 9), Some(t(7, 0)), Some(t(15, 0)), 10);
        assert_eq!(status, AttendanceStatus::Presente);
        let status = classify_check_in(t(7, 10), Some(t(7, 0)), Some(t(15, 0)), 10);
        assert_eq!(status, AttendanceStatus::Presente);
    }

    #[test]
    fn test_late_after_grace() {
        let status = classify_check_in(t(7, 11), Some(t(7, 0)), Some(t(15, 0)), 10);
        assert_eq!(status, AttendanceStatus::Retardo);
    }

    #[test]
    fn test_out_of_hours_after_shift_end() {
        let status = classify_check_in(t(15, 0), Some(t(7, 0)), Some(t(15, 0)), 10);
        assert_eq!(status, AttendanceStatus::FueraDeHorario);
    }

    #[test]
    fn test_no_shift_is_present() {
        assert_eq!(classify_check_in(t(23, 0), None, None, 0), AttendanceStatus::Presente);
    }

    #[test]
    fn test_grace_does_not_wrap_past_midnight() {
        let status = classify_check_in(t(23, 56), Some(t(23, 55)), None, 10);
        assert_eq!(status, AttendanceStatus::Presente);
        let status = classify_check_in(t(23, 59), Some(t(23, 45)), None, 10);
        assert_eq!(status, AttendanceStatus::Retardo);
    }

    #[test]
    fn test_early_arrival_is_present() {
        let status = classify_check_in(t(6, 30), Some(t(7, 0)), Some(t(15, 0)), 0);
        assert_eq!(status, AttendanceStatus::Presente);
    }

    fn record(id: u64, hour: u32, closed: bool, status: AttendanceStatus) -> AttendanceRecord {
        let check_in = Utc.with_ymd_and_hms(2026, 3, 2, hour, 0, 0).unwrap();
        AttendanceRecord {
            id,
            employee_id: 3,
            check_in,
            check_out: closed.then(|| check_in + Duration::hours(8)),
            status,
        }
    }

    #[test]
    fn test_first_scan_checks_in() {
        assert_eq!(next_scan_step(&[]), ScanStep::CheckIn);
    }

    #[test]
    fn test_open_record_is_checked_out() {
        let today = [record(1, 7, false, AttendanceStatus::Retardo)];
        assert_eq!(next_scan_step(&today), ScanStep::CheckOut(&today[0]));
    }

    #[test]
    fn test_third_scan_does_not_reopen_day() {
        // in at 07:00, out at 15:00, then another scan
        let today = [record(1, 7, true, AttendanceStatus::Presente)];
        assert_eq!(next_scan_step(&today), ScanStep::DayClosed(&today[0]));
    }

    #[test]
    fn test_marked_day_does_not_block_check_in() {
        let today = [record(1, 6, false, AttendanceStatus::Justificado)];
        assert_eq!(next_scan_step(&today), ScanStep::CheckIn);
    }

    #[test]
    fn test_open_record_wins_over_closed_one() {
        let today = [
            record(1, 7, true, AttendanceStatus::Presente),
            record(2, 9, false, AttendanceStatus::FueraDeHorario),
        ];
        assert_eq!(next_scan_step(&today), ScanStep::CheckOut(&today[1]));
    }

    #[test]
    fn test_day_range_with_offset() {
        let offset = FixedOffset::west_opt(6 * 3600).unwrap();
        let day = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
        let (start, end) = day_range(day, day, offset).unwrap();

        assert_eq!(start, Utc.with_ymd_and_hms(2026, 3, 2, 6, 0, 0).unwrap());
        assert_eq!(end, Utc.with_ymd_and_hms(2026, 3, 3, 6, 0, 0).unwrap());
    }

    #[test]
    fn test_inverted_range_is_rejected() {
        let utc = FixedOffset::east_opt(0).unwrap();
        let a = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
        let b = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        assert!(day_range(a, b, utc).is_none());
    }
}
