use chrono::NaiveDate;
use serde::Serialize;

use crate::models::{CheckIn, Member, Payment, ScheduledClass, Transaction};

/// Rows read for one KPI computation, already scoped to a tenant and to the
/// current/previous windows.
#[derive(Debug, Clone, Default)]
pub struct KpiInputs {
    pub company_name: Option<String>,
    /// Every member of the tenant, regardless of window.
    pub members: Vec<Member>,
    pub current_transactions: Vec<Transaction>,
    pub previous_transactions: Vec<Transaction>,
    /// Paid payments only.
    pub current_payments: Vec<Payment>,
    pub previous_payments: Vec<Payment>,
    /// Current window only; there is no previous-window schedule read.
    pub classes: Vec<ScheduledClass>,
    pub current_check_ins: Vec<CheckIn>,
    pub previous_check_ins: Vec<CheckIn>,
}

/// Dashboard metrics for one tenant and window.
///
/// Currency values are in the tenant's base unit. Percentages are plain
/// numbers, so `15.3` means 15.3%.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KpiSnapshot {
    pub company_id: String,
    pub company_name: Option<String>,
    pub current_start: NaiveDate,
    pub current_end: NaiveDate,
    pub previous_start: NaiveDate,
    pub previous_end: NaiveDate,
    pub period_days: u32,

    // Members
    pub active_members: u64,
    pub new_members: u64,
    /// Members created before the previous window and still active.
    pub previous_active_count: u64,
    pub canceled_this_period: u64,
    pub churn_rate: f64,
    pub retention_rate: f64,

    // Finance
    pub revenue: f64,
    pub expenses: f64,
    pub profit: f64,
    pub profit_margin: f64,
    pub mrr: f64,
    pub arr: f64,
    pub average_ticket: f64,
    pub ltv: f64,
    pub cac: f64,
    pub ltv_cac_ratio: f64,

    // Schedule & attendance
    pub total_classes: u64,
    pub total_capacity: u64,
    pub total_bookings: u64,
    pub occupation_rate: f64,
    pub total_check_ins: u64,
    pub attendance_rate: f64,
    pub avg_check_ins_per_member: f64,

    // Previous window
    pub previous_revenue: f64,
    pub previous_expenses: f64,
    pub previous_profit: f64,
    pub previous_average_ticket: f64,
    pub previous_check_ins: u64,

    // Growth, in percent
    pub revenue_growth: f64,
    pub profit_growth: f64,
    pub members_growth: f64,
    pub check_ins_growth: f64,
}
