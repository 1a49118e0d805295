use crate::{
    auth::auth::AuthUser,
    error::{AppError, is_duplicate_key},
    model::employee::Employee,
    utils::{
        db_utils::{SqlValue, build_update_sql, execute_update},
        scan_guard::ScanGuard,
    },
};
use actix_web::{HttpResponse, web};
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use sqlx::MySqlPool;
use tracing::{debug, info};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

pub(crate) const EMPLOYEE_COLUMNS: &str = "id, tenant_id, employee_code, first_name, last_name, email, \
     position, hire_date, base_monthly_salary, other_bonuses, food_allocation, \
     shift_start, shift_end, qr_token, status";

/// Columns a manager may change through the generic update endpoint.
/// Compensation has its own endpoint.
const UPDATABLE_COLUMNS: &[&str] = &[
    "employee_code",
    "first_name",
    "last_name",
    "email",
    "position",
    "hire_date",
    "shift_start",
    "shift_end",
    "status",
];

pub(crate) async fn fetch_employee(
    pool: &MySqlPool,
    tenant_id: u64,
    employee_id: u64,
) -> Result<Option<Employee>, sqlx::Error> {
    let sql = format!("SELECT {EMPLOYEE_COLUMNS} FROM employees WHERE id = ? AND tenant_id = ?");
    sqlx::query_as::<_, Employee>(&sql)
        .bind(employee_id)
        .bind(tenant_id)
        .fetch_optional(pool)
        .await
}

/// Every employee of the tenant, ordered by id.
pub(crate) async fn fetch_all_employees(pool: &MySqlPool, tenant_id: u64) -> Result<Vec<Employee>, sqlx::Error> {
    let sql = format!("SELECT {EMPLOYEE_COLUMNS} FROM employees WHERE tenant_id = ? ORDER BY id");
    sqlx::query_as::<_, Employee>(&sql)
        .bind(tenant_id)
        .fetch_all(pool)
        .await
}

#[derive(Deserialize, Serialize, ToSchema)]
pub struct CreateEmployee {
    #[schema(example = "COC-001")]
    pub employee_code: String,
    #[schema(example = "Maria")]
    pub first_name: String,
    #[schema(example = "Perez")]
    pub last_name: String,
    #[schema(example = "maria.perez@canteen.example", format = "email")]
    pub email: String,
    #[schema(example = "cook")]
    pub position: Option<String>,
    #[schema(example = "2024-01-01", format = "date", value_type = Option<String>)]
    pub hire_date: Option<NaiveDate>,
    #[schema(example = 10000.0)]
    #[serde(default)]
    pub base_monthly_salary: f64,
    #[schema(example = 0.0)]
    #[serde(default)]
    pub other_bonuses: f64,
    #[schema(example = 1200.0)]
    #[serde(default)]
    pub food_allocation: f64,
    #[schema(example = "07:00:00", value_type = Option<String>)]
    pub shift_start: Option<NaiveTime>,
    #[schema(example = "15:00:00", value_type = Option<String>)]
    pub shift_end: Option<NaiveTime>,
}

#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct EmployeeQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub position: Option<String>,
    pub status: Option<String>,
    /// Search by name, email or employee code
    pub search: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct EmployeeListResponse {
    pub data: Vec<Employee>,
    #[schema(example = 1)]
    pub page: u32,
    #[schema(example = 20)]
    pub per_page: u32,
    #[schema(example = 10)]
    pub total: i64,
}

/// The persisted subset of the compensation inputs ("Save").
#[derive(Debug, Deserialize, ToSchema)]
pub struct SaveCompensation {
    #[schema(example = 10000.0)]
    pub base_monthly_salary: f64,
    #[schema(example = 1200.0)]
    pub food_allocation: f64,
    #[schema(example = 500.0)]
    pub other_bonuses: f64,
}

impl SaveCompensation {
    fn validate(&self) -> Result<(), AppError> {
        let fields = [
            ("base_monthly_salary", self.base_monthly_salary),
            ("food_allocation", self.food_allocation),
            ("other_bonuses", self.other_bonuses),
        ];
        match fields.iter().find(|(_, v)| !v.is_finite() || *v < 0.0) {
            Some((name, _)) => Err(AppError::BadRequest(format!("{name} must be a non-negative number"))),
            None => Ok(()),
        }
    }
}

fn validate_shift(start: Option<NaiveTime>, end: Option<NaiveTime>) -> Result<(), AppError> {
    match (start, end) {
        (Some(s), Some(e)) if s >= e => Err(AppError::BadRequest(
            "shift_start must be before shift_end".into(),
        )),
        _ => Ok(()),
    }
}

/// Value of a shift column after a partial update: the body's value if present, else `stored`.
fn shift_field(body: &Value, key: &str, stored: Option<NaiveTime>) -> Result<Option<NaiveTime>, AppError> {
    let invalid = || AppError::BadRequest(format!("{key} must be a time (HH:MM or HH:MM:SS)"));

    match body.get(key) {
        None => Ok(stored),
        Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => NaiveTime::parse_from_str(s, "%H:%M:%S")
            .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M"))
            .map(Some)
            .map_err(|_| invalid()),
        Some(_) => Err(invalid()),
    }
}

/// Rejects a partial update that would leave the employee with an inverted shift.
fn validate_shift_update(body: &Value, stored: &Employee) -> Result<(), AppError> {
    validate_shift(
        shift_field(body, "shift_start", stored.shift_start)?,
        shift_field(body, "shift_end", stored.shift_end)?,
    )
}

/// sqlx connects to MySQL with CLIENT_FOUND_ROWS, so `rows_affected` counts matched
/// rows even when the new values equal the stored ones.
fn ensure_matched(rows_affected: u64) -> Result<(), AppError> {
    if rows_affected == 0 {
        Err(AppError::NotFound("Employee not found".into()))
    } else {
        Ok(())
    }
}

/// Create Employee
#[utoipa::path(
    post,
    path = "/api/employee",
    request_body = CreateEmployee,
    responses(
        (status = 201, description = "Employee created", body = Object, example = json!({
            "message": "Employee created", "id": 12, "qr_token": "8d1f0c0e-6b7a-4a8e-9d55-52f2c1f0b7aa"
        })),
        (status = 400, description = "Invalid payload"),
        (status = 409, description = "Employee code already used")
    ),
    tag = "Employee",
    security(("bearer_auth" = []))
)]
pub async fn create_employee(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    guard: web::Data<ScanGuard>,
    payload: web::Json<CreateEmployee>,
) -> actix_web::Result<HttpResponse> {
    auth.require_manager()?;

    if payload.first_name.trim().is_empty() || payload.employee_code.trim().is_empty() {
        return Err(AppError::BadRequest("employee_code and first_name are required".into()).into());
    }
    SaveCompensation {
        base_monthly_salary: payload.base_monthly_salary,
        food_allocation: payload.food_allocation,
        other_bonuses: payload.other_bonuses,
    }
    .validate()?;
    validate_shift(payload.shift_start, payload.shift_end)?;

    let qr_token = Uuid::new_v4().to_string();

    let result = sqlx::query(
        r#"
        INSERT INTO employees
        (tenant_id, employee_code, first_name, last_name, email, position, hire_date,
         base_monthly_salary, other_bonuses, food_allocation, shift_start, shift_end, qr_token)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(auth.tenant_id)
    .bind(payload.employee_code.trim())
    .bind(payload.first_name.trim())
    .bind(payload.last_name.trim())
    .bind(payload.email.trim())
    .bind(payload.position.as_deref())
    .bind(payload.hire_date)
    .bind(payload.base_monthly_salary)
    .bind(payload.other_bonuses)
    .bind(payload.food_allocation)
    .bind(payload.shift_start)
    .bind(payload.shift_end)
    .bind(&qr_token)
    .execute(pool.get_ref())
    .await;

    match result {
        Ok(done) => {
            guard.register_token(auth.tenant_id, &qr_token);
            info!(tenant_id = auth.tenant_id, employee_id = done.last_insert_id(), "Employee created");
            Ok(HttpResponse::Created().json(json!({
                "message": "Employee created",
                "id": done.last_insert_id(),
                "qr_token": qr_token,
            })))
        }
        Err(e) if is_duplicate_key(&e) => {
            Err(AppError::Conflict("Employee code already used".into()).into())
        }
        Err(e) => Err(AppError::from(e).into()),
    }
}

#[utoipa::path(
    get,
    path = "/api/employee",
    params(EmployeeQuery),
    responses(
        (status = 200, description = "Paginated employee list", body = EmployeeListResponse)
    ),
    tag = "Employee",
    security(("bearer_auth" = []))
)]
pub async fn list_employees(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<EmployeeQuery>,
) -> actix_web::Result<HttpResponse> {
    auth.require_manager()?;

    let page = query.page.unwrap_or(1).max(1);
    let per_page = query.per_page.unwrap_or(20).clamp(1, 100);
    let offset = (page - 1) * per_page;

    // ---------- build WHERE clause dynamically ----------
    // tenant_id is always the first placeholder; the rest are text filters.
    let mut conditions = vec!["tenant_id = ?"];
    let mut bindings: Vec<String> = Vec::new();

    if let Some(position) = &query.position {
        conditions.push("position = ?");
        bindings.push(position.clone());
    }

    if let Some(status) = &query.status {
        conditions.push("status = ?");
        bindings.push(status.clone());
    }

    if let Some(search) = query.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        conditions.push("(first_name LIKE ? OR last_name LIKE ? OR email LIKE ? OR employee_code LIKE ?)");
        let like = format!("%{}%", search);
        for _ in 0..4 {
            bindings.push(like.clone());
        }
    }

    let where_clause = format!("WHERE {}", conditions.join(" AND "));

    // ---------- total count ----------
    let count_sql = format!("SELECT COUNT(*) FROM employees {}", where_clause);
    debug!(sql = %count_sql, tenant_id = auth.tenant_id, bindings = ?bindings, "Counting employees");

    let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql).bind(auth.tenant_id);
    for b in &bindings {
        count_query = count_query.bind(b);
    }
    let total = count_query.fetch_one(pool.get_ref()).await.map_err(AppError::from)?;

    // ---------- data query ----------
    let data_sql = format!(
        "SELECT {EMPLOYEE_COLUMNS} FROM employees {} ORDER BY last_name, first_name LIMIT ? OFFSET ?",
        where_clause
    );
    debug!(sql = %data_sql, page, per_page, offset, "Fetching employees");

    let mut data_query = sqlx::query_as::<_, Employee>(&data_sql).bind(auth.tenant_id);
    for b in &bindings {
        data_query = data_query.bind(b);
    }
    data_query = data_query.bind(per_page as i64).bind(offset as i64);

    let employees = data_query.fetch_all(pool.get_ref()).await.map_err(AppError::from)?;

    Ok(HttpResponse::Ok().json(EmployeeListResponse {
        data: employees,
        page,
        per_page,
        total,
    }))
}

#[utoipa::path(
    get,
    path = "/api/employee/{employee_id}",
    params(("employee_id", Path, description = "Employee ID")),
    responses(
        (status = 200, description = "Employee found", body = Employee),
        (status = 404, description = "Employee not found")
    ),
    tag = "Employee",
    security(("bearer_auth" = []))
)]
pub async fn get_employee(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<HttpResponse> {
    let employee_id = path.into_inner();
    auth.require_self_or_manager(employee_id)?;

    match fetch_employee(pool.get_ref(), auth.tenant_id, employee_id)
        .await
        .map_err(AppError::from)?
    {
        Some(employee) => Ok(HttpResponse::Ok().json(employee)),
        None => Err(AppError::NotFound("Employee not found".into()).into()),
    }
}

/// Partial update; unknown or protected fields are rejected.
#[utoipa::path(
    put,
    path = "/api/employee/{employee_id}",
    params(("employee_id", Path, description = "Employee ID")),
    responses(
        (status = 200, description = "Employee updated"),
        (status = 400, description = "Invalid field"),
        (status = 404, description = "Employee not found")
    ),
    tag = "Employee",
    security(("bearer_auth" = []))
)]
pub async fn update_employee(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    body: web::Json<Value>,
) -> actix_web::Result<HttpResponse> {
    auth.require_manager()?;
    let employee_id = path.into_inner();

    let update = build_update_sql(
        "employees",
        &body,
        UPDATABLE_COLUMNS,
        vec![
            ("id", SqlValue::U64(employee_id)),
            ("tenant_id", SqlValue::U64(auth.tenant_id)),
        ],
    )?;

    if body.get("shift_start").is_some() || body.get("shift_end").is_some() {
        let stored = fetch_employee(pool.get_ref(), auth.tenant_id, employee_id)
            .await
            .map_err(AppError::from)?
            .ok_or_else(|| AppError::NotFound("Employee not found".into()))?;
        validate_shift_update(&body, &stored)?;
    }

    let affected = match execute_update(pool.get_ref(), update).await {
        Ok(n) => n,
        Err(e) if is_duplicate_key(&e) => {
            return Err(AppError::Conflict("Employee code already used".into()).into());
        }
        Err(e) => return Err(AppError::from(e).into()),
    };
    ensure_matched(affected)?;

    Ok(HttpResponse::Ok().json(json!({ "message": "Employee updated successfully" })))
}

#[utoipa::path(
    delete,
    path = "/api/employee/{employee_id}",
    params(("employee_id", Path, description = "Employee ID")),
    responses(
        (status = 200, description = "Successfully deleted"),
        (status = 404, description = "Employee not found")
    ),
    tag = "Employee",
    security(("bearer_auth" = []))
)]
pub async fn delete_employee(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    guard: web::Data<ScanGuard>,
    path: web::Path<u64>,
) -> actix_web::Result<HttpResponse> {
    auth.require_admin()?;
    let employee_id = path.into_inner();

    let Some(employee) = fetch_employee(pool.get_ref(), auth.tenant_id, employee_id)
        .await
        .map_err(AppError::from)?
    else {
        return Err(AppError::NotFound("Employee not found".into()).into());
    };

    sqlx::query("DELETE FROM employees WHERE id = ? AND tenant_id = ?")
        .bind(employee_id)
        .bind(auth.tenant_id)
        .execute(pool.get_ref())
        .await
        .map_err(AppError::from)?;

    guard.forget_token(auth.tenant_id, &employee.qr_token);
    info!(tenant_id = auth.tenant_id, employee_id, "Employee deleted");

    Ok(HttpResponse::Ok().json(json!({ "message": "Successfully deleted" })))
}

/// Persist base salary, food allocation and bonuses for an employee.
#[utoipa::path(
    put,
    path = "/api/employee/{employee_id}/compensation",
    params(("employee_id", Path, description = "Employee ID")),
    request_body = SaveCompensation,
    responses(
        (status = 200, description = "Compensation saved"),
        (status = 400, description = "Negative or non-numeric amount"),
        (status = 404, description = "Employee not found")
    ),
    tag = "Employee",
    security(("bearer_auth" = []))
)]
pub async fn save_compensation(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    payload: web::Json<SaveCompensation>,
) -> actix_web::Result<HttpResponse> {
    auth.require_manager()?;
    payload.validate()?;
    let employee_id = path.into_inner();

    let result = sqlx::query(
        r#"
        UPDATE employees
        SET base_monthly_salary = ?, food_allocation = ?, other_bonuses = ?
        WHERE id = ? AND tenant_id = ?
        "#,
    )
    .bind(payload.base_monthly_salary)
    .bind(payload.food_allocation)
    .bind(payload.other_bonuses)
    .bind(employee_id)
    .bind(auth.tenant_id)
    .execute(pool.get_ref())
    .await
    .map_err(AppError::from)?;

    ensure_matched(result.rows_affected())?;

    info!(tenant_id = auth.tenant_id, employee_id, "Compensation saved");
    Ok(HttpResponse::Ok().json(json!({ "message": "Compensation saved" })))
}

/// Issue a new QR badge token; the old badge stops working.
#[utoipa::path(
    post,
    path = "/api/employee/{employee_id}/badge",
    params(("employee_id", Path, description = "Employee ID")),
    responses(
        (status = 200, description = "New badge token", body = Object, example = json!({
            "qr_token": "8d1f0c0e-6b7a-4a8e-9d55-52f2c1f0b7aa"
        })),
        (status = 404, description = "Employee not found")
    ),
    tag = "Employee",
    security(("bearer_auth" = []))
)]
pub async fn rotate_badge(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    guard: web::Data<ScanGuard>,
    path: web::Path<u64>,
) -> actix_web::Result<HttpResponse> {
    auth.require_manager()?;
    let employee_id = path.into_inner();

    let Some(employee) = fetch_employee(pool.get_ref(), auth.tenant_id, employee_id)
        .await
        .map_err(AppError::from)?
    else {
        return Err(AppError::NotFound("Employee not found".into()).into());
    };

    let qr_token = Uuid::new_v4().to_string();

    sqlx::query("UPDATE employees SET qr_token = ? WHERE id = ? AND tenant_id = ?")
        .bind(&qr_token)
        .bind(employee_id)
        .bind(auth.tenant_id)
        .execute(pool.get_ref())
        .await
        .map_err(AppError::from)?;

    guard.forget_token(auth.tenant_id, &employee.qr_token);
    guard.register_token(auth.tenant_id, &qr_token);

    Ok(HttpResponse::Ok().json(json!({ "qr_token": qr_token })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::employee::tests::sample_employee;

    #[test]
    fn test_save_compensation_rejects_negative() {
        let ok = SaveCompensation {
            base_monthly_salary: 10000.0,
            food_allocation: 0.0,
            other_bonuses: 0.0,
        };
        assert!(ok.validate().is_ok());

        let bad = SaveCompensation {
            base_monthly_salary: 10000.0,
            food_allocation: -1.0,
            other_bonuses: 0.0,
        };
        let err = bad.validate().unwrap_err();
        assert!(err.to_string().contains("food_allocation"));

        let nan = SaveCompensation {
            base_monthly_salary: f64::NAN,
            food_allocation: 0.0,
            other_bonuses: 0.0,
        };
        assert!(nan.validate().is_err());
    }

    #[test]
    fn test_shift_order() {
        let seven = NaiveTime::from_hms_opt(7, 0, 0);
        let three = NaiveTime::from_hms_opt(15, 0, 0);
        assert!(validate_shift(seven, three).is_ok());
        assert!(validate_shift(three, seven).is_err());
        assert!(validate_shift(None, seven).is_ok());
    }

    #[test]
    fn test_partial_shift_update_checked_against_stored_shift() {
        let mut stored = sample_employee(1, "Ana");
        stored.shift_start = NaiveTime::from_hms_opt(7, 0, 0);
        stored.shift_end = NaiveTime::from_hms_opt(15, 0, 0);

        // 16:00 start against the stored 15:00 end
        let err = validate_shift_update(&json!({"shift_start": "16:00"}), &stored).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));

        assert!(validate_shift_update(&json!({"shift_start": "06:30"}), &stored).is_ok());
        assert!(validate_shift_update(&json!({"shift_start": "16:00", "shift_end": "23:00:00"}), &stored).is_ok());
        assert!(validate_shift_update(&json!({"shift_end": null}), &stored).is_ok());
        assert!(validate_shift_update(&json!({"position": "cook"}), &stored).is_ok());
    }

    #[test]
    fn test_shift_update_rejects_non_time_values() {
        let stored = sample_employee(1, "Ana");
        assert!(validate_shift_update(&json!({"shift_end": "late"}), &stored).is_err());
        assert!(validate_shift_update(&json!({"shift_end": 15}), &stored).is_err());
    }

    #[test]
    fn test_unmatched_update_is_not_found() {
        assert!(matches!(ensure_matched(0), Err(AppError::NotFound(_))));
        assert!(ensure_matched(1).is_ok());
    }

    #[test]
    fn test_compensation_fields_not_generically_updatable() {
        assert!(!UPDATABLE_COLUMNS.contains(&"base_monthly_salary"));
        assert!(!UPDATABLE_COLUMNS.contains(&"tenant_id"));
        assert!(!UPDATABLE_COLUMNS.contains(&"qr_token"));
    }
}
