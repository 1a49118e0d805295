use actix_web::{HttpResponse, web};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use sqlx::MySqlPool;
use utoipa::{IntoParams, ToSchema};

use crate::{
    api::employee::{fetch_all_employees, fetch_employee},
    auth::auth::AuthUser,
    error::AppError,
    model::employee::Employee,
    service::compensation::{
        CompensationInputs, CompensationResult, DEFAULT_UTILIDADES_DAYS, DEFAULT_VACATION_BONUS_DAYS,
        UTILIDADES_MAX_DAYS, UTILIDADES_MIN_DAYS, compute_compensation,
    },
    utils::{
        export::{ExportRow, ExportSheet},
        format::{format_amount, format_date, format_tenure, round2},
    },
};

/// Aliquot day policy; missing values fall back to 30 / 15.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AliquotPolicyQuery {
    /// Profit-share days per year (30 to 120)
    #[param(example = 30)]
    pub utilidades_days: Option<u32>,
    /// Vacation-bonus days per year
    #[param(example = 15)]
    pub vacation_bonus_days: Option<u32>,
}

impl AliquotPolicyQuery {
    fn resolve(&self) -> Result<(u32, u32), AppError> {
        let utilidades = self.utilidades_days.unwrap_or(DEFAULT_UTILIDADES_DAYS);
        check_utilidades_days(utilidades)?;
        Ok((
            utilidades,
            self.vacation_bonus_days.unwrap_or(DEFAULT_VACATION_BONUS_DAYS),
        ))
    }
}

fn check_utilidades_days(days: u32) -> Result<(), AppError> {
    if (UTILIDADES_MIN_DAYS..=UTILIDADES_MAX_DAYS).contains(&days) {
        Ok(())
    } else {
        Err(AppError::BadRequest(format!(
            "utilidades_days must be between {UTILIDADES_MIN_DAYS} and {UTILIDADES_MAX_DAYS}"
        )))
    }
}

/// Display strings: two decimals, `N/A` where there is nothing to show.
#[derive(Debug, Serialize, ToSchema)]
pub struct FormattedCompensation {
    #[schema(example = "10000.00")]
    pub normal_salary: String,
    #[schema(example = "333.33")]
    pub normal_daily: String,
    pub utilidades_aliquot: String,
    pub vacation_bonus_aliquot: String,
    #[schema(example = "11250.00")]
    pub integral_salary: String,
    #[schema(example = "375.00")]
    pub integral_daily: String,
    #[schema(example = "2024-01-01")]
    pub hire_date: String,
    #[schema(example = "2.00")]
    pub tenure_years: String,
    #[schema(example = "22500.00")]
    pub estimated_severance: String,
    pub food_allocation: String,
}

impl FormattedCompensation {
    fn new(hire_date: Option<NaiveDate>, result: &CompensationResult) -> Self {
        FormattedCompensation {
            normal_salary: format_amount(result.normal_salary),
            normal_daily: format_amount(result.normal_daily),
            utilidades_aliquot: format_amount(result.utilidades_aliquot),
            vacation_bonus_aliquot: format_amount(result.vacation_bonus_aliquot),
            integral_salary: format_amount(result.integral_salary),
            integral_daily: format_amount(result.integral_daily),
            hire_date: format_date(hire_date),
            tenure_years: format_tenure(hire_date, result.tenure_years),
            estimated_severance: format_amount(result.estimated_severance),
            food_allocation: format_amount(result.food_allocation),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CompensationView {
    pub employee_id: Option<u64>,
    pub employee_name: Option<String>,
    pub inputs: CompensationInputs,
    pub result: CompensationResult,
    pub formatted: FormattedCompensation,
}

impl CompensationView {
    fn compute(employee: Option<&Employee>, inputs: CompensationInputs) -> Self {
        let result = compute_compensation(&inputs, Utc::now());
        CompensationView {
            employee_id: employee.map(|e| e.id),
            employee_name: employee.map(Employee::full_name),
            formatted: FormattedCompensation::new(inputs.hire_date, &result),
            inputs,
            result,
        }
    }
}

/// One employee's line in the payroll export.
pub struct PayrollLine {
    pub employee: Employee,
    pub inputs: CompensationInputs,
    pub result: CompensationResult,
}

impl ExportRow for PayrollLine {
    const COLUMNS: &'static [&'static str] = &[
        "Employee Code",
        "Name",
        "Hire Date",
        "Base Monthly Salary",
        "Other Bonuses",
        "Food Allocation",
        "Normal Salary",
        "Normal Daily",
        "Utilidades Aliquot",
        "Vacation Bonus Aliquot",
        "Integral Salary",
        "Integral Daily",
        "Tenure (years)",
        "Estimated Severance",
    ];

    fn values(&self) -> Vec<Value> {
        let r = &self.result;
        vec![
            json!(self.employee.employee_code),
            json!(self.employee.full_name()),
            json!(format_date(self.inputs.hire_date)),
            json!(round2(self.inputs.base_monthly_salary)),
            json!(round2(self.inputs.other_bonuses)),
            json!(round2(self.inputs.food_allocation)),
            json!(round2(r.normal_salary)),
            json!(round2(r.normal_daily)),
            json!(round2(r.utilidades_aliquot)),
            json!(round2(r.vacation_bonus_aliquot)),
            json!(round2(r.integral_salary)),
            json!(round2(r.integral_daily)),
            json!(format_tenure(self.inputs.hire_date, r.tenure_years)),
            json!(round2(r.estimated_severance)),
        ]
    }
}

/// Compute figures for arbitrary inputs (what-if calculator).
#[utoipa::path(
    post,
    path = "/api/payroll/calculate",
    request_body = CompensationInputs,
    responses(
        (status = 200, body = CompensationView),
        (status = 400, description = "utilidades_days outside 30..=120")
    ),
    security(("bearer_auth" = [])),
    tag = "Payroll"
)]
pub async fn calculate(
    auth: AuthUser,
    payload: web::Json<CompensationInputs>,
) -> actix_web::Result<HttpResponse> {
    auth.require_manager()?;

    let inputs = payload.into_inner().sanitized();
    check_utilidades_days(inputs.utilidades_days)?;

    Ok(HttpResponse::Ok().json(CompensationView::compute(None, inputs)))
}

/// Figures from the stored employee record.
#[utoipa::path(
    get,
    path = "/api/payroll/{employee_id}",
    params(
        ("employee_id", Path, description = "Employee ID"),
        AliquotPolicyQuery
    ),
    responses(
        (status = 200, body = CompensationView),
        (status = 404, description = "Employee not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Payroll"
)]
pub async fn employee_compensation(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    query: web::Query<AliquotPolicyQuery>,
) -> actix_web::Result<HttpResponse> {
    let employee_id = path.into_inner();
    auth.require_self_or_manager(employee_id)?;
    let (utilidades_days, vacation_bonus_days) = query.resolve()?;

    let employee = fetch_employee(pool.get_ref(), auth.tenant_id, employee_id)
        .await
        .map_err(AppError::from)?
        .ok_or_else(|| AppError::NotFound("Employee not found".into()))?;

    let inputs = employee.compensation_inputs(utilidades_days, vacation_bonus_days);
    Ok(HttpResponse::Ok().json(CompensationView::compute(Some(&employee), inputs)))
}

/// Payroll sheet for every employee of the canteen.
#[utoipa::path(
    get,
    path = "/api/payroll/export",
    params(AliquotPolicyQuery),
    responses((status = 200, body = ExportSheet)),
    security(("bearer_auth" = [])),
    tag = "Payroll"
)]
pub async fn export_payroll(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<AliquotPolicyQuery>,
) -> actix_web::Result<HttpResponse> {
    auth.require_manager()?;
    let (utilidades_days, vacation_bonus_days) = query.resolve()?;

    let employees = fetch_all_employees(pool.get_ref(), auth.tenant_id)
        .await
        .map_err(AppError::from)?;

    let now = Utc::now();
    let lines: Vec<PayrollLine> = employees
        .into_iter()
        .map(|employee| {
            let inputs = employee.compensation_inputs(utilidades_days, vacation_bonus_days);
            let result = compute_compensation(&inputs, now);
            PayrollLine {
                employee,
                inputs,
                result,
            }
        })
        .collect();

    tracing::info!(tenant_id = auth.tenant_id, rows = lines.len(), "Payroll export built");
    Ok(HttpResponse::Ok().json(ExportSheet::build("payroll", &lines)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::employee::tests::sample_employee;

    #[test]
    fn test_policy_defaults_and_range() {
        assert_eq!(AliquotPolicyQuery::default().resolve().unwrap(), (30, 15));

        let q = AliquotPolicyQuery {
            utilidades_days: Some(120),
            vacation_bonus_days: Some(20),
        };
        assert_eq!(q.resolve().unwrap(), (120, 20));

        let q = AliquotPolicyQuery {
            utilidades_days: Some(29),
            vacation_bonus_days: None,
        };
        assert!(q.resolve().is_err());
    }

    #[test]
    fn test_formatted_reference_figures() {
        let inputs = CompensationInputs {
            base_monthly_salary: 10000.0,
            ..Default::default()
        };
        let view = CompensationView::compute(None, inputs);

        assert_eq!(view.formatted.normal_daily, "333.33");
        assert_eq!(view.formatted.integral_salary, "11250.00");
        assert_eq!(view.formatted.integral_daily, "375.00");
        assert_eq!(view.formatted.hire_date, "N/A");
        assert_eq!(view.formatted.tenure_years, "N/A");
        assert_eq!(view.formatted.estimated_severance, "0.00");
    }

    #[test]
    fn test_payroll_export_row() {
        let employee = sample_employee(1, "Ana");
        let inputs = employee.compensation_inputs(30, 15);
        let result = compute_compensation(&inputs, Utc::now());
        let sheet = ExportSheet::build("payroll", &[PayrollLine { employee, inputs, result }]);

        let row = &sheet.rows[0];
        assert_eq!(row["Name"], "Ana Perez");
        assert_eq!(row["Hire Date"], "N/A");
        assert_eq!(row["Normal Daily"], 333.33);
        assert_eq!(row["Integral Salary"], 11250.0);
        assert_eq!(row["Food Allocation"], 1200.0);
        assert_eq!(row["Estimated Severance"], 0.0);
        assert_eq!(sheet.columns.len(), PayrollLine::COLUMNS.len());
    }
}
