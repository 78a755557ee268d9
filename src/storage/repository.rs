use std::collections::HashMap;

use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension};
use serde::Serialize;

use crate::models::{
    Booking, CheckIn, Company, Member, Payment, PaymentStatus, Plan, ScheduledClass, Subscription,
    Transaction,
};

// ── Companies ──────────────────────────────────────────────────────

pub fn upsert_company(conn: &Connection, company: &Company) -> Result<(), rusqlite::Error> {
    conn.execute(
        "INSERT INTO companies (company_id, name, created_at) VALUES (?1, ?2, ?3)
         ON CONFLICT(company_id) DO UPDATE SET name = excluded.name",
        params![company.company_id, company.name, company.created_at],
    )?;
    Ok(())
}

pub fn get_company_name(
    conn: &Connection,
    company_id: &str,
) -> Result<Option<String>, rusqlite::Error> {
    conn.query_row(
        "SELECT name FROM companies WHERE company_id = ?1",
        params![company_id],
        |row| row.get(0),
    )
    .optional()
}

/// A tenant with headline counts, for listings.
#[derive(Debug, Clone, Serialize)]
pub struct CompanySummary {
    pub company_id: String,
    pub name: String,
    pub member_count: u64,
    pub active_member_count: u64,
}

pub fn list_companies(conn: &Connection) -> Result<Vec<CompanySummary>, rusqlite::Error> {
    let mut stmt = conn.prepare(
        "SELECT c.company_id, c.name,
                COUNT(m.member_id),
                COALESCE(SUM(CASE WHEN m.status = 'active' THEN 1 ELSE 0 END), 0)
         FROM companies c
         LEFT JOIN members m ON m.company_id = c.company_id
         GROUP BY c.company_id, c.name
         ORDER BY c.name",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok(CompanySummary {
            company_id: row.get(0)?,
            name: row.get(1)?,
            member_count: row.get::<_, i64>(2)? as u64,
            active_member_count: row.get::<_, i64>(3)? as u64,
        })
    })?;
    rows.collect()
}

// ── Plans & members ────────────────────────────────────────────────

pub fn upsert_plan(conn: &Connection, plan: &Plan) -> Result<(), rusqlite::Error> {
    conn.execute(
        "INSERT INTO plans (plan_id, company_id, name, price, billing_cycle)
         VALUES (?1, ?2, ?3, ?4, ?5)
         ON CONFLICT(plan_id) DO UPDATE SET
            company_id = excluded.company_id, name = excluded.name,
            price = excluded.price, billing_cycle = excluded.billing_cycle",
        params![plan.plan_id, plan.company_id, plan.name, plan.price, plan.billing_cycle],
    )?;
    Ok(())
}

pub fn upsert_member(conn: &Connection, member: &Member) -> Result<(), rusqlite::Error> {
    conn.execute(
        "INSERT INTO members (member_id, company_id, name, email, status, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
         ON CONFLICT(member_id) DO UPDATE SET
            company_id = excluded.company_id, name = excluded.name, email = excluded.email,
            status = excluded.status, created_at = excluded.created_at,
            updated_at = excluded.updated_at",
        params![
            member.member_id,
            member.company_id,
            member.name,
            member.email,
            member.status,
            member.created_at,
            member.updated_at,
        ],
    )?;
    Ok(())
}

pub fn upsert_subscription(conn: &Connection, sub: &Subscription) -> Result<(), rusqlite::Error> {
    conn.execute(
        "INSERT INTO subscriptions (
            subscription_id, company_id, member_id, plan_id, status, start_date, end_date
         ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
         ON CONFLICT(subscription_id) DO UPDATE SET
            company_id = excluded.company_id, member_id = excluded.member_id,
            plan_id = excluded.plan_id, status = excluded.status,
            start_date = excluded.start_date, end_date = excluded.end_date",
        params![
            sub.subscription_id,
            sub.company_id,
            sub.member_id,
            sub.plan_id,
            sub.status,
            sub.start_date,
            sub.end_date,
        ],
    )?;
    Ok(())
}

/// All members of a tenant, each with the plan price of their most recently
/// started active subscription.
pub fn list_members(conn: &Connection, company_id: &str) -> Result<Vec<Member>, rusqlite::Error> {
    let mut stmt = conn.prepare(
        "SELECT m.member_id, m.company_id, m.name, m.email, m.status, m.created_at, m.updated_at,
                (SELECT p.price
                   FROM subscriptions s
                   JOIN plans p ON p.plan_id = s.plan_id
                  WHERE s.member_id = m.member_id AND s.status = 'active'
                  ORDER BY s.start_date DESC
                  LIMIT 1)
         FROM members m
         WHERE m.company_id = ?1
         ORDER BY m.member_id",
    )?;
    let rows = stmt.query_map(params![company_id], |row| {
        Ok(Member {
            member_id: row.get(0)?,
            company_id: row.get(1)?,
            name: row.get(2)?,
            email: row.get(3)?,
            status: row.get(4)?,
            created_at: row.get(5)?,
            updated_at: row.get(6)?,
            active_plan_price: row.get(7)?,
        })
    })?;
    rows.collect()
}

// ── Ledger ─────────────────────────────────────────────────────────

pub fn upsert_transaction(conn: &Connection, t: &Transaction) -> Result<(), rusqlite::Error> {
    conn.execute(
        "INSERT INTO transactions (
            transaction_id, company_id, type, status, amount, transaction_date, category, description
         ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
         ON CONFLICT(transaction_id) DO UPDATE SET
            company_id = excluded.company_id, type = excluded.type, status = excluded.status,
            amount = excluded.amount, transaction_date = excluded.transaction_date,
            category = excluded.category, description = excluded.description",
        params![
            t.transaction_id,
            t.company_id,
            t.kind,
            t.status,
            t.amount,
            t.transaction_date,
            t.category,
            t.description,
        ],
    )?;
    Ok(())
}

/// Transactions of any type and status dated inside `[start, end]`.
pub fn list_transactions(
    conn: &Connection,
    company_id: &str,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<Transaction>, rusqlite::Error> {
    let mut stmt = conn.prepare(
        "SELECT transaction_id, company_id, type, status, amount, transaction_date, category, description
         FROM transactions
         WHERE company_id = ?1 AND transaction_date >= ?2 AND transaction_date <= ?3
         ORDER BY transaction_date, transaction_id",
    )?;
    let rows = stmt.query_map(params![company_id, start, end], |row| {
        Ok(Transaction {
            transaction_id: row.get(0)?,
            company_id: row.get(1)?,
            kind: row.get(2)?,
            status: row.get(3)?,
            amount: row.get(4)?,
            transaction_date: row.get(5)?,
            category: row.get(6)?,
            description: row.get(7)?,
        })
    })?;
    rows.collect()
}

pub fn upsert_payment(conn: &Connection, p: &Payment) -> Result<(), rusqlite::Error> {
    conn.execute(
        "INSERT INTO payments (payment_id, company_id, member_id, status, amount, due_date, paid_date)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
         ON CONFLICT(payment_id) DO UPDATE SET
            company_id = excluded.company_id, member_id = excluded.member_id,
            status = excluded.status, amount = excluded.amount,
            due_date = excluded.due_date, paid_date = excluded.paid_date",
        params![p.payment_id, p.company_id, p.member_id, p.status, p.amount, p.due_date, p.paid_date],
    )?;
    Ok(())
}

/// Payments with status `paid` whose `paid_date` is inside `[start, end]`.
pub fn list_paid_payments(
    conn: &Connection,
    company_id: &str,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<Payment>, rusqlite::Error> {
    let mut stmt = conn.prepare(
        "SELECT payment_id, company_id, member_id, status, amount, due_date, paid_date
         FROM payments
         WHERE company_id = ?1 AND status = ?2
           AND paid_date >= ?3 AND paid_date <= ?4
         ORDER BY paid_date, payment_id",
    )?;
    let rows = stmt.query_map(
        params![company_id, PaymentStatus::Paid, start, end],
        |row| {
            Ok(Payment {
                payment_id: row.get(0)?,
                company_id: row.get(1)?,
                member_id: row.get(2)?,
                status: row.get(3)?,
                amount: row.get(4)?,
                due_date: row.get(5)?,
                paid_date: row.get(6)?,
            })
        },
    )?;
    rows.collect()
}

// ── Schedule ───────────────────────────────────────────────────────

pub fn upsert_class(conn: &Connection, class: &ScheduledClass) -> Result<(), rusqlite::Error> {
    conn.execute(
        "INSERT INTO classes (class_id, company_id, name, date, max_capacity)
         VALUES (?1, ?2, ?3, ?4, ?5)
         ON CONFLICT(class_id) DO UPDATE SET
            company_id = excluded.company_id, name = excluded.name,
            date = excluded.date, max_capacity = excluded.max_capacity",
        params![class.class_id, class.company_id, class.name, class.date, class.max_capacity],
    )?;
    Ok(())
}

pub fn upsert_booking(conn: &Connection, booking: &Booking) -> Result<(), rusqlite::Error> {
    conn.execute(
        "INSERT OR REPLACE INTO bookings (booking_id, class_id, member_id) VALUES (?1, ?2, ?3)",
        params![booking.booking_id, booking.class_id, booking.member_id],
    )?;
    Ok(())
}

/// Classes dated inside `[start, end]`, each with its bookings attached.
pub fn list_classes_with_bookings(
    conn: &Connection,
    company_id: &str,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<ScheduledClass>, rusqlite::Error> {
    let mut stmt = conn.prepare(
        "SELECT b.booking_id, b.class_id, b.member_id
         FROM bookings b
         JOIN classes c ON c.class_id = b.class_id
         WHERE c.company_id = ?1 AND c.date >= ?2 AND c.date <= ?3
         ORDER BY b.booking_id",
    )?;
    let mut bookings_by_class: HashMap<String, Vec<Booking>> = HashMap::new();
    let rows = stmt.query_map(params![company_id, start, end], |row| {
        Ok(Booking {
            booking_id: row.get(0)?,
            class_id: row.get(1)?,
            member_id: row.get(2)?,
        })
    })?;
    for booking in rows {
        let booking = booking?;
        bookings_by_class
            .entry(booking.class_id.clone())
            .or_default()
            .push(booking);
    }

    let mut stmt = conn.prepare(
        "SELECT class_id, company_id, name, date, max_capacity
         FROM classes
         WHERE company_id = ?1 AND date >= ?2 AND date <= ?3
         ORDER BY date, class_id",
    )?;
    let rows = stmt.query_map(params![company_id, start, end], |row| {
        Ok(ScheduledClass {
            class_id: row.get(0)?,
            company_id: row.get(1)?,
            name: row.get(2)?,
            date: row.get(3)?,
            max_capacity: row.get(4)?,
            bookings: Vec::new(),
        })
    })?;
    rows.map(|class| {
        let mut class = class?;
        class.bookings = bookings_by_class.remove(&class.class_id).unwrap_or_default();
        Ok(class)
    })
    .collect()
}

// ── Attendance ─────────────────────────────────────────────────────

pub fn upsert_check_in(conn: &Connection, check_in: &CheckIn) -> Result<(), rusqlite::Error> {
    conn.execute(
        "INSERT OR REPLACE INTO check_ins (check_in_id, company_id, member_id, check_in_time)
         VALUES (?1, ?2, ?3, ?4)",
        params![
            check_in.check_in_id,
            check_in.company_id,
            check_in.member_id,
            check_in.check_in_time,
        ],
    )?;
    Ok(())
}

/// Check-ins whose calendar date is inside `[start, end]`.
pub fn list_check_ins(
    conn: &Connection,
    company_id: &str,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<CheckIn>, rusqlite::Error> {
    let mut stmt = conn.prepare(
        "SELECT check_in_id, company_id, member_id, check_in_time
         FROM check_ins
         WHERE company_id = ?1 AND date(check_in_time) >= ?2 AND date(check_in_time) <= ?3
         ORDER BY check_in_time, check_in_id",
    )?;
    let rows = stmt.query_map(params![company_id, start, end], |row| {
        Ok(CheckIn {
            check_in_id: row.get(0)?,
            company_id: row.get(1)?,
            member_id: row.get(2)?,
            check_in_time: row.get(3)?,
        })
    })?;
    rows.collect()
}

// ── Config ─────────────────────────────────────────────────────────

pub fn get_config(conn: &Connection, key: &str) -> Result<Option<String>, rusqlite::Error> {
    conn.query_row(
        "SELECT value FROM app_config WHERE key = ?1",
        params![key],
        |row| row.get(0),
    )
    .optional()
}

pub fn set_config(conn: &Connection, key: &str, value: &str) -> Result<(), rusqlite::Error> {
    conn.execute(
        "INSERT OR REPLACE INTO app_config (key, value, updated_at)
         VALUES (?1, ?2, datetime('now'))",
        params![key, value],
    )?;
    Ok(())
}

pub fn list_config(conn: &Connection) -> Result<Vec<(String, String)>, rusqlite::Error> {
    let mut stmt = conn.prepare("SELECT key, value FROM app_config ORDER BY key")?;
    let rows = stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?;
    rows.collect()
}

// ── Status ─────────────────────────────────────────────────────────

/// Row counts per table, in a fixed order.
pub fn table_counts(conn: &Connection) -> Result<Vec<(&'static str, u64)>, rusqlite::Error> {
    const TABLES: [&str; 9] = [
        "companies",
        "plans",
        "members",
        "subscriptions",
        "transactions",
        "payments",
        "classes",
        "bookings",
        "check_ins",
    ];
    TABLES
        .iter()
        .map(|table| {
            let count: i64 =
                conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))?;
            Ok((*table, count as u64))
        })
        .collect()
}
