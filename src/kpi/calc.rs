use crate::models::{MemberStatus, Payment, Transaction, TransactionType, MARKETING_CATEGORY};

use super::types::{KpiInputs, KpiSnapshot};
use super::window::ReportWindow;

/// Months of tenure assumed when turning average ticket into lifetime value.
pub const ASSUMED_LIFETIME_MONTHS: f64 = 12.0;

/// `num / den`, or 0 when `den` is not positive.
fn ratio(num: f64, den: f64) -> f64 {
    if den > 0.0 {
        num / den
    } else {
        0.0
    }
}

/// `num / den × 100`, or 0 when `den` is not positive.
fn pct(num: f64, den: f64) -> f64 {
    ratio(num, den) * 100.0
}

/// Percentage change from `previous` to `current`; 0 when `previous` is 0.
pub fn growth(current: f64, previous: f64) -> f64 {
    if previous != 0.0 {
        (current - previous) / previous * 100.0
    } else {
        0.0
    }
}

/// Revenue and expenses from completed transactions.
fn ledger_totals(transactions: &[Transaction]) -> (f64, f64) {
    transactions.iter().fold((0.0, 0.0), |(income, expense), t| {
        if t.is_completed(TransactionType::Income) {
            (income + t.amount, expense)
        } else if t.is_completed(TransactionType::Expense) {
            (income, expense + t.amount)
        } else {
            (income, expense)
        }
    })
}

fn ticket_average(revenue: f64, paid: &[Payment]) -> f64 {
    ratio(revenue, paid.len() as f64)
}

/// Reduce fetched rows into the flat KPI snapshot. Pure: the same inputs
/// always give the same snapshot.
pub fn calculate(company_id: &str, window: &ReportWindow, inputs: &KpiInputs) -> KpiSnapshot {
    let current = window.current();

    // Members
    let active_members = inputs.members.iter().filter(|m| m.is_active()).count() as u64;
    let new_members = inputs
        .members
        .iter()
        .filter(|m| current.contains(m.created_at.date()))
        .count() as u64;
    let previous_active_count = inputs
        .members
        .iter()
        .filter(|m| m.created_at.date() < window.previous_start && m.is_active())
        .count() as u64;
    let canceled_this_period = inputs
        .members
        .iter()
        .filter(|m| m.status == MemberStatus::Inactive && current.contains(m.updated_at.date()))
        .count() as u64;
    let churn_rate = pct(canceled_this_period as f64, previous_active_count as f64);
    let retention_rate = 100.0 - churn_rate;

    // Finance
    let (revenue, expenses) = ledger_totals(&inputs.current_transactions);
    let profit = revenue - expenses;
    let profit_margin = pct(profit, revenue);

    let mrr: f64 = inputs
        .members
        .iter()
        .filter(|m| m.is_active())
        .map(|m| m.active_plan_price.unwrap_or(0.0))
        .sum();
    let arr = mrr * 12.0;

    let average_ticket = ticket_average(revenue, &inputs.current_payments);
    let ltv = average_ticket * ASSUMED_LIFETIME_MONTHS;

    let marketing_spend: f64 = inputs
        .current_transactions
        .iter()
        .filter(|t| t.kind == TransactionType::Expense && t.category == MARKETING_CATEGORY)
        .map(|t| t.amount)
        .sum();
    let cac = ratio(marketing_spend, new_members as f64);
    let ltv_cac_ratio = ratio(ltv, cac);

    // Schedule & attendance
    let total_classes = inputs.classes.len() as u64;
    let total_capacity: u64 = inputs.classes.iter().map(|c| c.max_capacity as u64).sum();
    let total_bookings: u64 = inputs.classes.iter().map(|c| c.bookings.len() as u64).sum();
    let occupation_rate = pct(total_bookings as f64, total_capacity as f64);

    let total_check_ins = inputs.current_check_ins.len() as u64;
    let attendance_rate = pct(total_check_ins as f64, total_bookings as f64);
    let avg_check_ins_per_member = ratio(total_check_ins as f64, active_members as f64);

    // Previous window
    let (previous_revenue, previous_expenses) = ledger_totals(&inputs.previous_transactions);
    let previous_profit = previous_revenue - previous_expenses;
    let previous_average_ticket = ticket_average(previous_revenue, &inputs.previous_payments);
    let previous_check_ins = inputs.previous_check_ins.len() as u64;

    KpiSnapshot {
        company_id: company_id.to_string(),
        company_name: inputs.company_name.clone(),
        current_start: window.current_start,
        current_end: window.current_end,
        previous_start: window.previous_start,
        previous_end: window.previous_end,
        period_days: window.period_days(),

        active_members,
        new_members,
        previous_active_count,
        canceled_this_period,
        churn_rate,
        retention_rate,

        revenue,
        expenses,
        profit,
        profit_margin,
        mrr,
        arr,
        average_ticket,
        ltv,
        cac,
        ltv_cac_ratio,

        total_classes,
        total_capacity,
        total_bookings,
        occupation_rate,
        total_check_ins,
        attendance_rate,
        avg_check_ins_per_member,

        previous_revenue,
        previous_expenses,
        previous_profit,
        previous_average_ticket,
        previous_check_ins,

        revenue_growth: growth(revenue, previous_revenue),
        profit_growth: growth(profit, previous_profit),
        members_growth: growth(active_members as f64, previous_active_count as f64),
        check_ins_growth: growth(total_check_ins as f64, previous_check_ins as f64),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        Booking, CheckIn, Member, PaymentStatus, ScheduledClass, TransactionStatus,
    };
    use chrono::{NaiveDate, NaiveDateTime};

    const EPS: f64 = 1e-9;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn ts(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(&format!("{s} 10:00:00"), "%Y-%m-%d %H:%M:%S").unwrap()
    }

    fn march() -> ReportWindow {
        ReportWindow::resolve(None, date("2025-03-15"))
    }

    fn member(id: &str, status: MemberStatus, created: &str, updated: &str, price: Option<f64>) -> Member {
        Member {
            member_id: id.to_string(),
            company_id: "c1".to_string(),
            name: id.to_string(),
            email: None,
            status,
            created_at: ts(created),
            updated_at: ts(updated),
            active_plan_price: price,
        }
    }

    fn tx(
        kind: TransactionType,
        status: TransactionStatus,
        amount: f64,
        day: &str,
        category: &str,
    ) -> Transaction {
        Transaction {
            transaction_id: format!("{kind}-{day}-{amount}"),
            company_id: "c1".to_string(),
            kind,
            status,
            amount,
            transaction_date: date(day),
            category: category.to_string(),
            description: None,
        }
    }

    fn paid(amount: f64, day: &str) -> Payment {
        Payment {
            payment_id: format!("p-{day}-{amount}"),
            company_id: "c1".to_string(),
            member_id: "m1".to_string(),
            status: PaymentStatus::Paid,
            amount,
            due_date: None,
            paid_date: Some(date(day)),
        }
    }

    fn class(id: &str, capacity: u32, bookings: usize) -> ScheduledClass {
        ScheduledClass {
            class_id: id.to_string(),
            company_id: "c1".to_string(),
            name: id.to_string(),
            date: date("2025-03-10"),
            max_capacity: capacity,
            bookings: (0..bookings)
                .map(|i| Booking {
                    booking_id: format!("{id}-b{i}"),
                    class_id: id.to_string(),
                    member_id: format!("m{i}"),
                })
                .collect(),
        }
    }

    fn check_ins(n: usize, day: &str) -> Vec<CheckIn> {
        (0..n)
            .map(|i| CheckIn {
                check_in_id: format!("ci-{day}-{i}"),
                company_id: "c1".to_string(),
                member_id: "m1".to_string(),
                check_in_time: ts(day),
            })
            .collect()
    }

    fn sample_inputs() -> KpiInputs {
        use TransactionStatus::*;
        use TransactionType::*;

        KpiInputs {
            company_name: Some("Box One".to_string()),
            members: vec![
                // Old, still active
                member("m1", MemberStatus::Active, "2024-10-01", "2024-10-01", Some(200.0)),
                member("m2", MemberStatus::Active, "2024-11-01", "2024-11-01", Some(150.0)),
                member("m3", MemberStatus::Active, "2025-01-05", "2025-01-05", None),
                // Joined this month
                member("m4", MemberStatus::Active, "2025-03-03", "2025-03-03", Some(150.0)),
                member("m5", MemberStatus::Pending, "2025-03-20", "2025-03-20", None),
                // Left this month
                member("m6", MemberStatus::Inactive, "2024-09-01", "2025-03-12", Some(999.0)),
                // Left before the window
                member("m7", MemberStatus::Inactive, "2024-09-01", "2025-02-12", None),
            ],
            current_transactions: vec![
                tx(Income, Completed, 1000.0, "2025-03-02", "membership"),
                tx(Income, Completed, 100.0, "2025-03-09", "store"),
                tx(Income, Pending, 500.0, "2025-03-09", "membership"),
                tx(Expense, Completed, 300.0, "2025-03-05", "rent"),
                tx(Expense, Completed, 120.0, "2025-03-06", "marketing"),
                tx(Expense, Pending, 80.0, "2025-03-07", "marketing"),
                tx(Expense, Cancelled, 50.0, "2025-03-08", "rent"),
            ],
            previous_transactions: vec![
                tx(Income, Completed, 1000.0, "2025-02-02", "membership"),
                tx(Expense, Completed, 400.0, "2025-02-05", "rent"),
            ],
            current_payments: vec![
                paid(200.0, "2025-03-02"),
                paid(150.0, "2025-03-03"),
                paid(150.0, "2025-03-04"),
                paid(50.0, "2025-03-05"),
            ],
            previous_payments: vec![paid(500.0, "2025-02-02"), paid(500.0, "2025-02-03")],
            classes: vec![class("k1", 10, 8), class("k2", 10, 4), class("k3", 20, 0)],
            current_check_ins: check_ins(9, "2025-03-10"),
            previous_check_ins: check_ins(6, "2025-02-10"),
        }
    }

    #[test]
    fn test_member_metrics() {
        let s = calculate("c1", &march(), &sample_inputs());
        assert_eq!(s.active_members, 4);
        assert_eq!(s.new_members, 2);
        // m1, m2, m3 were created before Feb 1 and are active now
        assert_eq!(s.previous_active_count, 3);
        assert_eq!(s.canceled_this_period, 1);
        assert!((s.churn_rate - 100.0 / 3.0).abs() < EPS);
        assert!((s.retention_rate + s.churn_rate - 100.0).abs() < EPS);
        assert!((s.members_growth - 100.0 / 3.0).abs() < EPS);
    }

    #[test]
    fn test_finance_metrics() {
        let s = calculate("c1", &march(), &sample_inputs());
        assert_eq!(s.revenue, 1100.0);
        assert_eq!(s.expenses, 420.0);
        assert_eq!(s.profit, 680.0);
        assert!((s.profit_margin - 680.0 / 1100.0 * 100.0).abs() < EPS);

        // Inactive m6 and its plan price are excluded
        assert_eq!(s.mrr, 500.0);
        assert_eq!(s.arr, 6000.0);

        assert_eq!(s.average_ticket, 275.0);
        assert_eq!(s.ltv, 3300.0);

        // Marketing spend counts pending rows too: (120 + 80) / 2 new members
        assert_eq!(s.cac, 100.0);
        assert_eq!(s.ltv_cac_ratio, 33.0);

        assert_eq!(s.previous_revenue, 1000.0);
        assert_eq!(s.previous_profit, 600.0);
        assert_eq!(s.previous_average_ticket, 500.0);
        assert!((s.revenue_growth - 10.0).abs() < EPS);
        assert!((s.profit_growth - 680.0 / 600.0 * 100.0 + 100.0).abs() < EPS);
    }

    #[test]
    fn test_schedule_and_attendance_metrics() {
        let s = calculate("c1", &march(), &sample_inputs());
        assert_eq!(s.total_classes, 3);
        assert_eq!(s.total_capacity, 40);
        assert_eq!(s.total_bookings, 12);
        assert!((s.occupation_rate - 30.0).abs() < EPS);
        assert_eq!(s.total_check_ins, 9);
        assert_eq!(s.attendance_rate, 75.0);
        assert_eq!(s.avg_check_ins_per_member, 2.25);
        assert_eq!(s.previous_check_ins, 6);
        assert_eq!(s.check_ins_growth, 50.0);
        assert_eq!(s.period_days, 31);
    }

    #[test]
    fn test_empty_inputs_never_divide_by_zero() {
        let s = calculate("c1", &march(), &KpiInputs::default());
        for value in [
            s.profit_margin,
            s.average_ticket,
            s.ltv,
            s.cac,
            s.ltv_cac_ratio,
            s.churn_rate,
            s.occupation_rate,
            s.attendance_rate,
            s.avg_check_ins_per_member,
            s.revenue_growth,
            s.profit_growth,
            s.members_growth,
            s.check_ins_growth,
        ] {
            assert_eq!(value, 0.0);
        }
        assert_eq!(s.retention_rate, 100.0);
        assert_eq!(s.total_classes, 0);
    }

    #[test]
    fn test_zero_revenue_gives_zero_margin() {
        let mut inputs = sample_inputs();
        inputs.current_transactions.retain(|t| t.kind == TransactionType::Expense);
        let s = calculate("c1", &march(), &inputs);
        assert_eq!(s.revenue, 0.0);
        assert_eq!(s.profit, -s.expenses);
        assert_eq!(s.profit_margin, 0.0);
        assert!((s.revenue_growth + 100.0).abs() < EPS);
    }

    #[test]
    fn test_no_new_members_gives_zero_cac() {
        let mut inputs = sample_inputs();
        inputs
            .members
            .retain(|m| m.created_at.date() < date("2025-03-01"));
        let s = calculate("c1", &march(), &inputs);
        assert_eq!(s.new_members, 0);
        assert_eq!(s.cac, 0.0);
        assert_eq!(s.ltv_cac_ratio, 0.0);
    }

    #[test]
    fn test_bookings_without_capacity() {
        let mut inputs = sample_inputs();
        inputs.classes = vec![class("k1", 0, 0)];
        let s = calculate("c1", &march(), &inputs);
        assert_eq!(s.occupation_rate, 0.0);
        assert_eq!(s.attendance_rate, 0.0);
    }

    #[test]
    fn test_growth() {
        assert!((growth(1100.0, 1000.0) - 10.0).abs() < EPS);
        assert_eq!(growth(50.0, 0.0), 0.0);
        assert_eq!(growth(0.0, 200.0), -100.0);
        // Negative baseline: from a loss of 100 to a profit of 50
        assert_eq!(growth(50.0, -100.0), -150.0);
    }

    #[test]
    fn test_calculate_is_deterministic() {
        let inputs = sample_inputs();
        let a = serde_json::to_string(&calculate("c1", &march(), &inputs)).unwrap();
        let b = serde_json::to_string(&calculate("c1", &march(), &inputs)).unwrap();
        assert_eq!(a, b);
        assert!(a.contains("\"ltvCacRatio\":33.0"));
        assert!(a.contains("\"currentStart\":\"2025-03-01\""));
    }
}
