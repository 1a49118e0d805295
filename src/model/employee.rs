use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::service::compensation::CompensationInputs;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(
    example = json!({
        "id": 1,
        "tenant_id": 1,
        "employee_code": "COC-001",
        "first_name": "Maria",
        "last_name": "Perez",
        "email": "maria.perez@canteen.example",
        "position": "cook",
        "hire_date": "2023-01-16",
        "base_monthly_salary": 10000.0,
        "other_bonuses": 500.0,
        "food_allocation": 1200.0,
        "shift_start": "07:00:00",
        "shift_end": "15:00:00",
        "qr_token": "8d1f0c0e-6b7a-4a8e-9d55-52f2c1f0b7aa",
        "status": "active"
    })
)]
pub struct Employee {
    #[schema(example = 1)]
    pub id: u64,

    #[schema(example = 1)]
    pub tenant_id: u64,

    #[schema(example = "COC-001")]
    pub employee_code: String,

    #[schema(example = "Maria")]
    pub first_name: String,

    #[schema(example = "Perez")]
    pub last_name: String,

    #[schema(example = "maria.perez@canteen.example")]
    pub email: String,

    #[schema(example = "cook", nullable = true)]
    pub position: Option<String>,

    #[schema(example = "2023-01-16", value_type = Option<String>, format = "date")]
    pub hire_date: Option<NaiveDate>,

    #[schema(example = 10000.0)]
    pub base_monthly_salary: f64,

    #[schema(example = 500.0)]
    pub other_bonuses: f64,

    #[schema(example = 1200.0)]
    pub food_allocation: f64,

    #[schema(example = "07:00:00", value_type = Option<String>)]
    pub shift_start: Option<NaiveTime>,

    #[schema(example = "15:00:00", value_type = Option<String>)]
    pub shift_end: Option<NaiveTime>,

    pub qr_token: String,

    #[schema(example = "active")]
    pub status: String,
}

impl Employee {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name).trim().to_string()
    }

    /// Compensation inputs from the stored figures, with the caller's aliquot day policy.
    pub fn compensation_inputs(&self, utilidades_days: u32, vacation_bonus_days: u32) -> CompensationInputs {
        CompensationInputs {
            base_monthly_salary: self.base_monthly_salary,
            other_bonuses: self.other_bonuses,
            food_allocation: self.food_allocation,
            utilidades_days,
            vacation_bonus_days,
            hire_date: self.hire_date,
        }
        .sanitized()
    }
}

/// Identity of an employee as seen by the attendance aggregator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmployeeRef {
    pub id: u64,
    pub name: String,
}

impl From<&Employee> for EmployeeRef {
    fn from(employee: &Employee) -> Self {
        EmployeeRef {
            id: employee.id,
            name: employee.full_name(),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn sample_employee(id: u64, first_name: &str) -> Employee {
        Employee {
            id,
            tenant_id: 1,
            employee_code: format!("COC-{id:03}"),
            first_name: first_name.to_string(),
            last_name: "Perez".to_string(),
            email: format!("{}@canteen.example", first_name.to_lowercase()),
            position: None,
            hire_date: None,
            base_monthly_salary: 10000.0,
            other_bonuses: 0.0,
            food_allocation: 1200.0,
            shift_start: None,
            shift_end: None,
            qr_token: format!("token-{id}"),
            status: "active".to_string(),
        }
    }

    #[test]
    fn test_full_name_and_ref() {
        let employee = sample_employee(4, "Lucia");
        let r = EmployeeRef::from(&employee);
        assert_eq!(r.id, 4);
        assert_eq!(r.name, "Lucia Perez");
    }

    #[test]
    fn test_compensation_inputs_zero_negative_amounts() {
        let mut employee = sample_employee(1, "Ana");
        employee.other_bonuses = -50.0;
        let inputs = employee.compensation_inputs(30, 15);
        assert_eq!(inputs.base_monthly_salary, 10000.0);
        assert_eq!(inputs.other_bonuses, 0.0);
        assert_eq!(inputs.food_allocation, 1200.0);
    }
}
