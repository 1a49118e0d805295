//! Normal and integral salary figures and the accrued severance estimate.
//!
//! Every daily rate uses a fixed 30-day month and aliquots use a 360-day year,
//! while tenure is measured against a 365.25-day year. No rounding happens here;
//! figures are rounded to two decimals only when displayed or exported.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub const MONTH_DAYS: f64 = 30.0;
pub const ALIQUOT_YEAR_DAYS: f64 = 360.0;
pub const DAYS_PER_YEAR: f64 = 365.25;
pub const SEVERANCE_DAYS_PER_YEAR: f64 = 30.0;
const MS_PER_DAY: f64 = 86_400_000.0;

pub const DEFAULT_UTILIDADES_DAYS: u32 = 30;
pub const DEFAULT_VACATION_BONUS_DAYS: u32 = 15;
pub const UTILIDADES_MIN_DAYS: u32 = 30;
pub const UTILIDADES_MAX_DAYS: u32 = 120;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CompensationInputs {
    #[schema(example = 10000.0)]
    pub base_monthly_salary: f64,
    #[schema(example = 0.0)]
    #[serde(default)]
    pub other_bonuses: f64,
    /// Tracked alongside the salary but never part of a legal base.
    #[schema(example = 1200.0)]
    #[serde(default)]
    pub food_allocation: f64,
    #[schema(example = 30)]
    #[serde(default = "default_utilidades_days")]
    pub utilidades_days: u32,
    #[schema(example = 15)]
    #[serde(default = "default_vacation_bonus_days")]
    pub vacation_bonus_days: u32,
    #[schema(example = "2024-01-01", value_type = Option<String>, format = "date")]
    #[serde(default)]
    pub hire_date: Option<NaiveDate>,
}

fn default_utilidades_days() -> u32 {
    DEFAULT_UTILIDADES_DAYS
}

fn default_vacation_bonus_days() -> u32 {
    DEFAULT_VACATION_BONUS_DAYS
}

impl Default for CompensationInputs {
    fn default() -> Self {
        CompensationInputs {
            base_monthly_salary: 0.0,
            other_bonuses: 0.0,
            food_allocation: 0.0,
            utilidades_days: DEFAULT_UTILIDADES_DAYS,
            vacation_bonus_days: DEFAULT_VACATION_BONUS_DAYS,
            hire_date: None,
        }
    }
}

impl CompensationInputs {
    /// Negative or non-finite amounts become zero.
    pub fn sanitized(self) -> Self {
        fn clean(v: f64) -> f64 {
            if v.is_finite() && v > 0.0 { v } else { 0.0 }
        }

        CompensationInputs {
            base_monthly_salary: clean(self.base_monthly_salary),
            other_bonuses: clean(self.other_bonuses),
            food_allocation: clean(self.food_allocation),
            ..self
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct CompensationResult {
    pub normal_salary: f64,
    pub normal_daily: f64,
    pub utilidades_aliquot: f64,
    pub vacation_bonus_aliquot: f64,
    pub integral_salary: f64,
    pub integral_daily: f64,
    pub tenure_years: f64,
    pub estimated_severance: f64,
    pub food_allocation: f64,
}

/// Years elapsed since `hire_date` (taken at midnight UTC). Zero when absent or in the future.
pub fn tenure_years(hire_date: Option<NaiveDate>, now: DateTime<Utc>) -> f64 {
    let Some(hire_date) = hire_date else {
        return 0.0;
    };

    let hired_at = hire_date.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc());
    let Some(hired_at) = hired_at else {
        return 0.0;
    };

    let elapsed_ms = (now - hired_at).num_milliseconds() as f64;
    (elapsed_ms / MS_PER_DAY / DAYS_PER_YEAR).max(0.0)
}

pub fn compute_compensation(inputs: &CompensationInputs, now: DateTime<Utc>) -> CompensationResult {
    let normal_salary = inputs.base_monthly_salary + inputs.other_bonuses;
    let normal_daily = normal_salary / MONTH_DAYS;

    let utilidades_aliquot = normal_salary * inputs.utilidades_days as f64 / ALIQUOT_YEAR_DAYS;
    let vacation_bonus_aliquot =
        normal_salary * inputs.vacation_bonus_days as f64 / ALIQUOT_YEAR_DAYS;

    let integral_salary = normal_salary + utilidades_aliquot + vacation_bonus_aliquot;
    let integral_daily = integral_salary / MONTH_DAYS;

    let tenure_years = tenure_years(inputs.hire_date, now);
    let estimated_severance = tenure_years * SEVERANCE_DAYS_PER_YEAR * integral_daily;

    CompensationResult {
        normal_salary,
        normal_daily,
        utilidades_aliquot,
        vacation_bonus_aliquot,
        integral_salary,
        integral_daily,
        tenure_years,
        estimated_severance,
        food_allocation: inputs.food_allocation,
    }
}
