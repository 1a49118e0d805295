use crate::api::attendance::{MarkDayRequest, ScanAction, ScanRequest, ScanResponse, UpdateStatusRequest};
use crate::api::employee::{CreateEmployee, EmployeeListResponse, EmployeeQuery, SaveCompensation};
use crate::api::payroll::{CompensationView, FormattedCompensation};
use crate::model::attendance::{AttendanceRecord, AttendanceStatus};
use crate::model::employee::Employee;
use crate::service::compensation::{CompensationInputs, CompensationResult};
use crate::service::consolidation::ConsolidatedRecord;
use crate::utils::export::ExportSheet;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Canteen Operations API",
        version = "0.1.0",
        description = r#"
## Canteen Operations

Back office for multi-site cafeterias and canteens.

### Features
- **Staff**: employee records, QR badges and stored compensation
- **Attendance**: QR badge check-in/check-out, manual day marking, range queries
- **Payroll**: normal and integral salary, profit-share and vacation-bonus aliquots, accrued severance estimate
- **Reports**: per-employee attendance rollups and flat sheets for spreadsheet export

### Security
Every `/api` endpoint requires a JWT bearer token. Data is scoped to the caller's canteen.
Managers and admins run reports and payroll; kiosk accounts may only scan badges.
"#,
    ),
    paths(
        crate::api::employee::create_employee,
        crate::api::employee::list_employees,
        crate::api::employee::get_employee,
        crate::api::employee::update_employee,
        crate::api::employee::delete_employee,
        crate::api::employee::save_compensation,
        crate::api::employee::rotate_badge,

        crate::api::attendance::scan,
        crate::api::attendance::list_attendance,
        crate::api::attendance::mark_day,
        crate::api::attendance::update_status,

        crate::api::payroll::calculate,
        crate::api::payroll::employee_compensation,
        crate::api::payroll::export_payroll,

        crate::api::report::attendance_report,
        crate::api::report::export_attendance_report
    ),
    components(
        schemas(
            Employee,
            CreateEmployee,
            EmployeeQuery,
            EmployeeListResponse,
            SaveCompensation,
            AttendanceStatus,
            AttendanceRecord,
            ScanRequest,
            ScanAction,
            ScanResponse,
            MarkDayRequest,
            UpdateStatusRequest,
            CompensationInputs,
            CompensationResult,
            FormattedCompensation,
            CompensationView,
            ConsolidatedRecord,
            ExportSheet
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "Employee", description = "Staff records and badges"),
        (name = "Attendance", description = "Badge scans and attendance days"),
        (name = "Payroll", description = "Salary aliquots and severance estimate"),
        (name = "Report", description = "Attendance rollups and exports"),
    )
)]
pub struct ApiDoc;

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_lists_core_paths() {
        let doc = ApiDoc::openapi();
        let paths = &doc.paths.paths;

        assert!(paths.contains_key("/api/attendance/scan"));
        assert!(paths.contains_key("/api/payroll/{employee_id}"));
        assert!(paths.contains_key("/api/report/attendance"));
        assert!(doc.components.unwrap().security_schemes.contains_key("bearer_auth"));
    }
}
