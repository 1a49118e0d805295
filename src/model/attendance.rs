use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};
use utoipa::ToSchema;

/// Day classification recorded against an attendance entry.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    ToSchema,
    Display,
    EnumString,
    AsRefStr,
    EnumIter,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum AttendanceStatus {
    Presente,
    Ausente,
    Retardo,
    FueraDeHorario,
    Justificado,
    NoJustificado,
    Vacaciones,
    DiaLibre,
}

/// The four day-count buckets of a consolidated record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayBucket {
    Attended,
    Absent,
    Free,
    JustifiedRest,
}

impl AttendanceStatus {
    /// `None` for statuses that count toward no bucket (e.g. fuera-de-horario).
    pub fn bucket(self) -> Option<DayBucket> {
        match self {
            AttendanceStatus::Presente | AttendanceStatus::Retardo => Some(DayBucket::Attended),
            AttendanceStatus::Ausente | AttendanceStatus::NoJustificado => Some(DayBucket::Absent),
            AttendanceStatus::DiaLibre | AttendanceStatus::Vacaciones => Some(DayBucket::Free),
            AttendanceStatus::Justificado => Some(DayBucket::JustifiedRest),
            AttendanceStatus::FueraDeHorario => None,
        }
    }
}

/// Attendance row exactly as stored.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AttendanceRow {
    pub id: u64,
    pub employee_id: u64,
    pub check_in: DateTime<Utc>,
    pub check_out: Option<DateTime<Utc>>,
    pub status: String,
}

/// Domain attendance record. Built once from an [`AttendanceRow`] at the store boundary.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct AttendanceRecord {
    pub id: u64,
    pub employee_id: u64,
    #[schema(value_type = String, format = "date-time")]
    pub check_in: DateTime<Utc>,
    #[schema(value_type = Option<String>, format = "date-time")]
    pub check_out: Option<DateTime<Utc>>,
    pub status: AttendanceStatus,
}

impl TryFrom<AttendanceRow> for AttendanceRecord {
    type Error = strum::ParseError;

    fn try_from(row: AttendanceRow) -> Result<Self, Self::Error> {
        Ok(AttendanceRecord {
            id: row.id,
            employee_id: row.employee_id,
            check_in: row.check_in,
            check_out: row.check_out,
            status: row.status.parse()?,
        })
    }
}

/// Converts stored rows, dropping (and logging) rows whose status is not recognised.
pub fn records_from_rows(rows: Vec<AttendanceRow>) -> Vec<AttendanceRecord> {
    rows.into_iter()
        .filter_map(|row| {
            let id = row.id;
            match AttendanceRecord::try_from(row) {
                Ok(record) => Some(record),
                Err(e) => {
                    tracing::warn!(attendance_id = id, error = %e, "Skipping attendance row with unknown status");
                    None
                }
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use strum::IntoEnumIterator;

    fn row(status: &str) -> AttendanceRow {
        AttendanceRow {
            id: 7,
            employee_id: 3,
            check_in: Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap(),
            check_out: None,
            status: status.to_string(),
        }
    }

    #[test]
    fn test_status_wire_names() {
        assert_eq!(AttendanceStatus::FueraDeHorario.to_string(), "fuera-de-horario");
        assert_eq!(AttendanceStatus::NoJustificado.as_ref(), "no-justificado");
        assert_eq!("dia-libre".parse::<AttendanceStatus>().unwrap(), AttendanceStatus::DiaLibre);
        assert_eq!(
            serde_json::to_string(&AttendanceStatus::Retardo).unwrap(),
            "\"retardo\""
        );
    }

    #[test]
    fn test_every_status_parses_back() {
        for status in AttendanceStatus::iter() {
            assert_eq!(status.to_string().parse::<AttendanceStatus>().unwrap(), status);
        }
    }

    #[test]
    fn test_bucket_mapping() {
        assert_eq!(AttendanceStatus::Retardo.bucket(), Some(DayBucket::Attended));
        assert_eq!(AttendanceStatus::NoJustificado.bucket(), Some(DayBucket::Absent));
        assert_eq!(AttendanceStatus::Vacaciones.bucket(), Some(DayBucket::Free));
        assert_eq!(AttendanceStatus::Justificado.bucket(), Some(DayBucket::JustifiedRest));
        assert_eq!(AttendanceStatus::FueraDeHorario.bucket(), None);
    }

    #[test]
    fn test_unknown_status_rows_are_dropped() {
        let records = records_from_rows(vec![row("presente"), row("holiday"), row("ausente")]);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].status, AttendanceStatus::Presente);
        assert_eq!(records[1].status, AttendanceStatus::Ausente);
    }
}
