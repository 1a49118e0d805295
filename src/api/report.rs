use actix_web::{HttpResponse, web};
use serde_json::{Value, json};
use sqlx::MySqlPool;

use crate::{
    api::{
        attendance::{DateRangeQuery, fetch_attendance_range},
        employee::fetch_all_employees,
    },
    auth::auth::AuthUser,
    config::Config,
    error::AppError,
    model::employee::EmployeeRef,
    service::consolidation::{ConsolidatedRecord, consolidate, sort_by_name},
    utils::{
        export::{ExportRow, ExportSheet},
        format::round2,
    },
};

impl ExportRow for ConsolidatedRecord {
    const COLUMNS: &'static [&'static str] = &[
        "Employee ID",
        "Name",
        "Attended Days",
        "Absent Days",
        "Free Days",
        "Justified Rest Days",
        "Total Hours",
    ];

    fn values(&self) -> Vec<Value> {
        vec![
            json!(self.user_id),
            json!(self.user_name),
            json!(self.attended_days),
            json!(self.absent_days),
            json!(self.free_days),
            json!(self.justified_rest_days),
            json!(round2(self.total_hours)),
        ]
    }
}

/// Loads the window and consolidates it per employee, sorted by name.
async fn consolidated_window(
    auth: &AuthUser,
    pool: &MySqlPool,
    config: &Config,
    query: &DateRangeQuery,
) -> Result<Vec<ConsolidatedRecord>, AppError> {
    let (from, to) = query.utc_bounds(config)?;

    let mut employees: Vec<EmployeeRef> = fetch_all_employees(pool, auth.tenant_id)
        .await?
        .iter()
        .map(EmployeeRef::from)
        .collect();
    if let Some(id) = query.employee_id {
        employees.retain(|e| e.id == id);
    }

    let records = fetch_attendance_range(pool, auth.tenant_id, from, to, query.employee_id).await?;

    tracing::debug!(
        tenant_id = auth.tenant_id,
        employees = employees.len(),
        records = records.len(),
        "Consolidating attendance"
    );

    let mut out = consolidate(&records, &employees);
    sort_by_name(&mut out);
    Ok(out)
}

/// Per-employee attendance rollup for a date window.
#[utoipa::path(
    get,
    path = "/api/report/attendance",
    params(DateRangeQuery),
    responses(
        (status = 200, body = [ConsolidatedRecord]),
        (status = 400, description = "Invalid range")
    ),
    security(("bearer_auth" = [])),
    tag = "Report"
)]
pub async fn attendance_report(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    query: web::Query<DateRangeQuery>,
) -> actix_web::Result<HttpResponse> {
    auth.require_manager()?;
    let records = consolidated_window(&auth, pool.get_ref(), &config, &query).await?;
    Ok(HttpResponse::Ok().json(records))
}

/// The attendance rollup as a flat sheet for spreadsheet export.
#[utoipa::path(
    get,
    path = "/api/report/attendance/export",
    params(DateRangeQuery),
    responses((status = 200, body = ExportSheet)),
    security(("bearer_auth" = [])),
    tag = "Report"
)]
pub async fn export_attendance_report(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    query: web::Query<DateRangeQuery>,
) -> actix_web::Result<HttpResponse> {
    auth.require_manager()?;
    let records = consolidated_window(&auth, pool.get_ref(), &config, &query).await?;

    let sheet = ExportSheet::build(&format!("attendance {} to {}", query.from, query.to), &records);
    Ok(HttpResponse::Ok().json(sheet))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_consolidated_export_row() {
        let record = ConsolidatedRecord {
            user_id: 3,
            user_name: "Beto Ruiz".into(),
            attended_days: 20,
            absent_days: 1,
            free_days: 8,
            justified_rest_days: 1,
            total_hours: 160.0,
        };
        let sheet = ExportSheet::build("attendance", &[record]);

        assert_eq!(sheet.columns[0], "Employee ID");
        let row = &sheet.rows[0];
        assert_eq!(row["Name"], "Beto Ruiz");
        assert_eq!(row["Attended Days"], 20);
        assert_eq!(row["Total Hours"], 160.0);
    }
}
