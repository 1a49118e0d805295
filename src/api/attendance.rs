use crate::{
    api::employee::{EMPLOYEE_COLUMNS, fetch_employee},
    auth::auth::AuthUser,
    config::Config,
    error::AppError,
    model::{
        attendance::{AttendanceRecord, AttendanceRow, AttendanceStatus, records_from_rows},
        employee::Employee,
    },
    service::{
        consolidation::hours_between,
        shift::{ScanStep, classify_check_in, day_range, local_day_start, next_scan_step},
    },
    utils::scan_guard::ScanGuard,
};
use actix_web::{HttpResponse, web};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::MySqlPool;
use tracing::info;
use utoipa::{IntoParams, ToSchema};

const ATTENDANCE_COLUMNS: &str = "id, employee_id, check_in, check_out, status";

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct DateRangeQuery {
    /// First day of the window (inclusive, local calendar)
    #[param(value_type = String, format = Date, example = "2026-03-01")]
    pub from: NaiveDate,
    /// Last day of the window (inclusive, local calendar)
    #[param(value_type = String, format = Date, example = "2026-03-31")]
    pub to: NaiveDate,
    /// Restrict to one employee
    pub employee_id: Option<u64>,
}

impl DateRangeQuery {
    pub fn utc_bounds(&self, config: &Config) -> Result<(DateTime<Utc>, DateTime<Utc>), AppError> {
        day_range(self.from, self.to, config.local_offset())
            .ok_or_else(|| AppError::BadRequest("from must not be after to".into()))
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ScanRequest {
    #[schema(example = "8d1f0c0e-6b7a-4a8e-9d55-52f2c1f0b7aa")]
    pub token: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum ScanAction {
    CheckIn,
    CheckOut,
    /// Repeated read inside the debounce window
    Ignored,
    /// The day's record is already closed
    DayClosed,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ScanResponse {
    pub action: ScanAction,
    pub employee_id: Option<u64>,
    pub employee_name: Option<String>,
    pub status: Option<AttendanceStatus>,
    /// Whole hours of the closed record, on check-out
    pub hours: Option<f64>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct MarkDayRequest {
    pub employee_id: u64,
    #[schema(example = "2026-03-02", value_type = String, format = "date")]
    pub date: NaiveDate,
    pub status: AttendanceStatus,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateStatusRequest {
    pub status: AttendanceStatus,
}

/// Records in `[from, to)` ordered by check-in. Rows with unknown statuses are dropped.
pub(crate) async fn fetch_attendance_range(
    pool: &MySqlPool,
    tenant_id: u64,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
    employee_id: Option<u64>,
) -> Result<Vec<AttendanceRecord>, sqlx::Error> {
    let mut sql = format!(
        "SELECT {ATTENDANCE_COLUMNS} FROM attendance WHERE tenant_id = ? AND check_in >= ? AND check_in < ?"
    );
    if employee_id.is_some() {
        sql.push_str(" AND employee_id = ?");
    }
    sql.push_str(" ORDER BY check_in");

    let mut query = sqlx::query_as::<_, AttendanceRow>(&sql)
        .bind(tenant_id)
        .bind(from)
        .bind(to);
    if let Some(id) = employee_id {
        query = query.bind(id);
    }

    Ok(records_from_rows(query.fetch_all(pool).await?))
}

/// The employee's records for the local day containing `now`.
async fn fetch_todays_records(
    pool: &MySqlPool,
    employee: &Employee,
    now: DateTime<Utc>,
    config: &Config,
) -> Result<Vec<AttendanceRecord>, sqlx::Error> {
    let offset = config.local_offset();
    let today = now.with_timezone(&offset).date_naive();
    let Some((start, end)) = day_range(today, today, offset) else {
        return Ok(Vec::new());
    };

    fetch_attendance_range(pool, employee.tenant_id, start, end, Some(employee.id)).await
}

/// QR badge scan: opens the day's record on first scan, closes it on the next.
#[utoipa::path(
    post,
    path = "/api/attendance/scan",
    request_body = ScanRequest,
    responses(
        (status = 200, description = "Check-in, check-out, ignored duplicate or closed day", body = ScanResponse),
        (status = 400, description = "Empty token"),
        (status = 403, description = "Caller may not scan"),
        (status = 404, description = "Unknown badge")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn scan(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    guard: web::Data<ScanGuard>,
    payload: web::Json<ScanRequest>,
) -> actix_web::Result<HttpResponse> {
    auth.require_scanner()?;

    let token = payload.token.trim();
    if token.is_empty() {
        return Err(AppError::BadRequest("Empty badge token".into()).into());
    }

    if !guard.might_be_known(auth.tenant_id, token) {
        return Err(AppError::NotFound("Unknown badge".into()).into());
    }

    if !guard.accept_scan(auth.tenant_id, token).await {
        return Ok(HttpResponse::Ok().json(ScanResponse {
            action: ScanAction::Ignored,
            employee_id: None,
            employee_name: None,
            status: None,
            hours: None,
        }));
    }

    let sql = format!("SELECT {EMPLOYEE_COLUMNS} FROM employees WHERE tenant_id = ? AND qr_token = ?");
    let employee = sqlx::query_as::<_, Employee>(&sql)
        .bind(auth.tenant_id)
        .bind(token)
        .fetch_optional(pool.get_ref())
        .await
        .map_err(AppError::from)?
        .ok_or_else(|| AppError::NotFound("Unknown badge".into()))?;

    let now = Utc::now();
    let today = fetch_todays_records(pool.get_ref(), &employee, now, &config)
        .await
        .map_err(AppError::from)?;

    match next_scan_step(&today) {
        ScanStep::CheckOut(open) => {
            sqlx::query("UPDATE attendance SET check_out = ? WHERE id = ? AND check_out IS NULL")
                .bind(now)
                .bind(open.id)
                .execute(pool.get_ref())
                .await
                .map_err(AppError::from)?;

            let hours = hours_between(now, open.check_in);
            info!(tenant_id = auth.tenant_id, employee_id = employee.id, hours, "Checked out");

            return Ok(HttpResponse::Ok().json(ScanResponse {
                action: ScanAction::CheckOut,
                employee_id: Some(employee.id),
                employee_name: Some(employee.full_name()),
                status: Some(open.status),
                hours: Some(hours),
            }));
        }
        ScanStep::DayClosed(closed) => {
            info!(tenant_id = auth.tenant_id, employee_id = employee.id, "Scan after day closed");

            return Ok(HttpResponse::Ok().json(ScanResponse {
                action: ScanAction::DayClosed,
                employee_id: Some(employee.id),
                employee_name: Some(employee.full_name()),
                status: Some(closed.status),
                hours: closed.check_out.map(|out| hours_between(out, closed.check_in)),
            }));
        }
        ScanStep::CheckIn => {}
    }

    let local_time = now.with_timezone(&config.local_offset()).time();
    let status = classify_check_in(
        local_time,
        employee.shift_start,
        employee.shift_end,
        config.late_grace_minutes,
    );

    sqlx::query(
        r#"
        INSERT INTO attendance (tenant_id, employee_id, check_in, status)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(auth.tenant_id)
    .bind(employee.id)
    .bind(now)
    .bind(status.as_ref())
    .execute(pool.get_ref())
    .await
    .map_err(AppError::from)?;

    info!(tenant_id = auth.tenant_id, employee_id = employee.id, status = %status, "Checked in");

    Ok(HttpResponse::Ok().json(ScanResponse {
        action: ScanAction::CheckIn,
        employee_id: Some(employee.id),
        employee_name: Some(employee.full_name()),
        status: Some(status),
        hours: None,
    }))
}

/// Attendance records in a date window. Staff only see their own.
#[utoipa::path(
    get,
    path = "/api/attendance",
    params(DateRangeQuery),
    responses(
        (status = 200, description = "Records ordered by check-in", body = [AttendanceRecord]),
        (status = 400, description = "Invalid range")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn list_attendance(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    query: web::Query<DateRangeQuery>,
) -> actix_web::Result<HttpResponse> {
    let employee_id = if auth.require_manager().is_ok() {
        query.employee_id
    } else {
        Some(
            auth.employee_id
                .ok_or_else(|| actix_web::error::ErrorForbidden("No employee profile"))?,
        )
    };

    let (from, to) = query.utc_bounds(&config)?;
    let records = fetch_attendance_range(pool.get_ref(), auth.tenant_id, from, to, employee_id)
        .await
        .map_err(AppError::from)?;

    Ok(HttpResponse::Ok().json(records))
}

/// Record a day without a scan (absence, leave, day off...).
#[utoipa::path(
    post,
    path = "/api/attendance/mark",
    request_body = MarkDayRequest,
    responses(
        (status = 201, description = "Day recorded"),
        (status = 404, description = "Employee not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn mark_day(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    payload: web::Json<MarkDayRequest>,
) -> actix_web::Result<HttpResponse> {
    auth.require_manager()?;

    if fetch_employee(pool.get_ref(), auth.tenant_id, payload.employee_id)
        .await
        .map_err(AppError::from)?
        .is_none()
    {
        return Err(AppError::NotFound("Employee not found".into()).into());
    }

    let check_in = local_day_start(payload.date, config.local_offset());

    let done = sqlx::query(
        r#"
        INSERT INTO attendance (tenant_id, employee_id, check_in, status)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(auth.tenant_id)
    .bind(payload.employee_id)
    .bind(check_in)
    .bind(payload.status.as_ref())
    .execute(pool.get_ref())
    .await
    .map_err(AppError::from)?;

    info!(
        tenant_id = auth.tenant_id,
        employee_id = payload.employee_id,
        date = %payload.date,
        status = %payload.status,
        "Attendance day marked"
    );

    Ok(HttpResponse::Created().json(json!({
        "message": "Attendance recorded",
        "id": done.last_insert_id(),
    })))
}

#[utoipa::path(
    put,
    path = "/api/attendance/{attendance_id}/status",
    params(("attendance_id", Path, description = "Attendance record ID")),
    request_body = UpdateStatusRequest,
    responses(
        (status = 200, description = "Status updated"),
        (status = 404, description = "Record not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn update_status(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    payload: web::Json<UpdateStatusRequest>,
) -> actix_web::Result<HttpResponse> {
    auth.require_manager()?;
    let attendance_id = path.into_inner();

    let exists = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM attendance WHERE id = ? AND tenant_id = ?")
        .bind(attendance_id)
        .bind(auth.tenant_id)
        .fetch_one(pool.get_ref())
        .await
        .map_err(AppError::from)?;

    if exists == 0 {
        return Err(AppError::NotFound("Attendance record not found".into()).into());
    }

    sqlx::query("UPDATE attendance SET status = ? WHERE id = ? AND tenant_id = ?")
        .bind(payload.status.as_ref())
        .bind(attendance_id)
        .bind(auth.tenant_id)
        .execute(pool.get_ref())
        .await
        .map_err(AppError::from)?;

    Ok(HttpResponse::Ok().json(json!({ "message": "Status updated" })))
}
