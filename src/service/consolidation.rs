//! Per-employee rollup of attendance records over a reporting window.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::model::attendance::{AttendanceRecord, DayBucket};
use crate::model::employee::EmployeeRef;

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct ConsolidatedRecord {
    #[schema(example = 1)]
    pub user_id: u64,
    #[schema(example = "Maria Perez")]
    pub user_name: String,
    pub attended_days: u32,
    pub absent_days: u32,
    pub free_days: u32,
    pub justified_rest_days: u32,
    pub total_hours: f64,
}

impl ConsolidatedRecord {
    fn empty(employee: &EmployeeRef) -> Self {
        ConsolidatedRecord {
            user_id: employee.id,
            user_name: employee.name.clone(),
            attended_days: 0,
            absent_days: 0,
            free_days: 0,
            justified_rest_days: 0,
            total_hours: 0.0,
        }
    }
}

/// Whole hours between the two instants, truncated. Negative spans count as zero.
pub fn hours_between(check_out: DateTime<Utc>, check_in: DateTime<Utc>) -> f64 {
    (check_out - check_in).num_hours().max(0) as f64
}

/// Every employee gets a record, even with no attendance. Records for unknown
/// employees are skipped. Output order is unspecified.
pub fn consolidate(records: &[AttendanceRecord], employees: &[EmployeeRef]) -> Vec<ConsolidatedRecord> {
    let mut by_employee: HashMap<u64, ConsolidatedRecord> = employees
        .iter()
        .map(|e| (e.id, ConsolidatedRecord::empty(e)))
        .collect();

    for record in records {
        let Some(acc) = by_employee.get_mut(&record.employee_id) else {
            continue;
        };

        match record.status.bucket() {
            Some(DayBucket::Attended) => {
                acc.attended_days += 1;
                if let Some(check_out) = record.check_out {
                    acc.total_hours += hours_between(check_out, record.check_in);
                }
            }
            Some(DayBucket::Absent) => acc.absent_days += 1,
            Some(DayBucket::Free) => acc.free_days += 1,
            Some(DayBucket::JustifiedRest) => acc.justified_rest_days += 1,
            None => {}
        }
    }

    by_employee.into_values().collect()
}

/// Display ordering: by name, then id.
pub fn sort_by_name(records: &mut [ConsolidatedRecord]) {
    records.sort_by(|a, b| {
        a.user_name
            .cmp(&b.user_name)
            .then_with(|| a.user_id.cmp(&b.user_id))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::attendance::AttendanceStatus;
    use chrono::TimeZone;

    fn employee(id: u64, name: &str) -> EmployeeRef {
        EmployeeRef {
            id,
            name: name.to_string(),
        }
    }

    fn at(day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, day, hour, minute, 0).unwrap()
    }

    fn record(
        employee_id: u64,
        status: AttendanceStatus,
        check_in: DateTime<Utc>,
        check_out: Option<DateTime<Utc>>,
    ) -> AttendanceRecord {
        AttendanceRecord {
            id: 0,
            employee_id,
            check_in,
            check_out,
            status,
        }
    }

    fn find(out: &[ConsolidatedRecord], id: u64) -> &ConsolidatedRecord {
        out.iter().find(|r| r.user_id == id).unwrap()
    }

    #[test]
    fn test_every_employee_is_covered() {
        let employees = vec![employee(1, "A"), employee(2, "B"), employee(3, "C")];
        let out = consolidate(&[], &employees);

        assert_eq!(out.len(), 3);
        for r in &out {
            assert_eq!(r.attended_days, 0);
            assert_eq!(r.absent_days, 0);
            assert_eq!(r.free_days, 0);
            assert_eq!(r.justified_rest_days, 0);
            assert_eq!(r.total_hours, 0.0);
        }
    }

    #[test]
    fn test_classification() {
        let employees = vec![employee(1, "A")];
        let records = vec![
            record(1, AttendanceStatus::Retardo, at(2, 9, 20), None),
            record(1, AttendanceStatus::NoJustificado, at(3, 0, 0), None),
            record(1, AttendanceStatus::Vacaciones, at(4, 0, 0), None),
            record(1, AttendanceStatus::DiaLibre, at(5, 0, 0), None),
            record(1, AttendanceStatus::Justificado, at(6, 0, 0), None),
            record(1, AttendanceStatus::FueraDeHorario, at(7, 22, 0), Some(at(7, 23, 30))),
        ];
        let out = consolidate(&records, &employees);
        let r = find(&out, 1);

        assert_eq!(r.attended_days, 1);
        assert_eq!(r.absent_days, 1);
        assert_eq!(r.free_days, 2);
        assert_eq!(r.justified_rest_days, 1);
        assert_eq!(r.total_hours, 0.0);
    }

    #[test]
    fn test_unmatched_record_is_dropped() {
        let employees = vec![employee(1, "A"), employee(2, "B")];
        let records = vec![record(99, AttendanceStatus::Presente, at(2, 9, 0), Some(at(2, 17, 0)))];
        let out = consolidate(&records, &employees);

        assert_eq!(out.len(), 2);
        assert!(out.iter().all(|r| r.user_id != 99));
        assert!(out.iter().all(|r| r.attended_days == 0));
    }

    #[test]
    fn test_hours_only_for_attended_with_checkout() {
        let employees = vec![employee(1, "A"), employee(2, "B"), employee(3, "C")];
        let records = vec![
            record(1, AttendanceStatus::Presente, at(2, 9, 0), Some(at(2, 17, 0))),
            record(2, AttendanceStatus::Ausente, at(2, 9, 0), Some(at(2, 17, 0))),
            record(3, AttendanceStatus::Presente, at(2, 9, 0), None),
        ];
        let out = consolidate(&records, &employees);

        assert_eq!(find(&out, 1).total_hours, 8.0);
        assert_eq!(find(&out, 2).total_hours, 0.0);
        assert_eq!(find(&out, 2).absent_days, 1);
        assert_eq!(find(&out, 3).total_hours, 0.0);
        assert_eq!(find(&out, 3).attended_days, 1);
    }

    #[test]
    fn test_hours_truncate_to_whole_hours() {
        assert_eq!(hours_between(at(2, 17, 59), at(2, 9, 0)), 8.0);
        assert_eq!(hours_between(at(2, 8, 0), at(2, 9, 0)), 0.0);
    }

    #[test]
    fn test_same_day_records_are_not_deduplicated() {
        let employees = vec![employee(1, "A")];
        let records = vec![
            record(1, AttendanceStatus::Presente, at(2, 7, 0), Some(at(2, 11, 0))),
            record(1, AttendanceStatus::Presente, at(2, 12, 0), Some(at(2, 15, 0))),
        ];
        let out = consolidate(&records, &employees);

        assert_eq!(out[0].attended_days, 2);
        assert_eq!(out[0].total_hours, 7.0);
    }

    #[test]
    fn test_sort_by_name() {
        let employees = vec![employee(3, "Carla"), employee(1, "Ana"), employee(2, "Beto")];
        let mut out = consolidate(&[], &employees);
        sort_by_name(&mut out);
        let names: Vec<_> = out.iter().map(|r| r.user_name.as_str()).collect();
        assert_eq!(names, vec!["Ana", "Beto", "Carla"]);
    }
}
