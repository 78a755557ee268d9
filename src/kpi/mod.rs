pub mod calc;
pub mod types;
pub mod window;

pub use calc::{calculate, growth};
pub use types::*;
pub use window::ReportWindow;

use chrono::NaiveDate;

use crate::error::{Error, Result};
use crate::period::DateRange;
use crate::storage::{repository, Database};

/// Compute the KPI snapshot for a tenant. Without a range, the window is
/// the current calendar month.
pub async fn compute_company_kpis(
    db: &Database,
    company_id: &str,
    range: Option<DateRange>,
) -> Result<KpiSnapshot> {
    compute_company_kpis_at(db, company_id, range, chrono::Local::now().date_naive()).await
}

/// Same as [`compute_company_kpis`], with an explicit "today" for the
/// default window.
pub async fn compute_company_kpis_at(
    db: &Database,
    company_id: &str,
    range: Option<DateRange>,
    today: NaiveDate,
) -> Result<KpiSnapshot> {
    let company_id = company_id.trim();
    if company_id.is_empty() {
        return Err(Error::InvalidIdentifier("company id is empty".into()));
    }

    let window = ReportWindow::resolve(range, today);
    let inputs = fetch_inputs(db, company_id, &window).await?;
    Ok(calculate(company_id, &window, &inputs))
}

/// Run one read on the reader connection.
async fn read<T, F>(db: &Database, f: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce(&rusqlite::Connection) -> std::result::Result<T, rusqlite::Error> + Send + 'static,
{
    Ok(db.reader().call(move |conn| f(conn)).await?)
}

/// Issue the eight tenant-scoped reads concurrently and join them. The
/// first failure aborts the whole fetch.
pub async fn fetch_inputs(
    db: &Database,
    company_id: &str,
    window: &ReportWindow,
) -> Result<KpiInputs> {
    let (cur, prev) = (window.current(), window.previous());
    log::debug!(
        "Fetching KPI inputs for {company_id}: current {}..{}, previous {}..{}",
        cur.from,
        cur.to,
        prev.from,
        prev.to
    );

    let id = company_id.to_string();
    let (
        (company_name, members),
        current_transactions,
        previous_transactions,
        current_payments,
        previous_payments,
        classes,
        current_check_ins,
        previous_check_ins,
    ) = tokio::try_join!(
        read(db, {
            let id = id.clone();
            move |conn| {
                let name = repository::get_company_name(conn, &id)?;
                Ok((name, repository::list_members(conn, &id)?))
            }
        }),
        read(db, {
            let id = id.clone();
            move |conn| repository::list_transactions(conn, &id, cur.from, cur.to)
        }),
        read(db, {
            let id = id.clone();
            move |conn| repository::list_transactions(conn, &id, prev.from, prev.to)
        }),
        read(db, {
            let id = id.clone();
            move |conn| repository::list_paid_payments(conn, &id, cur.from, cur.to)
        }),
        read(db, {
            let id = id.clone();
            move |conn| repository::list_paid_payments(conn, &id, prev.from, prev.to)
        }),
        read(db, {
            let id = id.clone();
            move |conn| repository::list_classes_with_bookings(conn, &id, cur.from, cur.to)
        }),
        read(db, {
            let id = id.clone();
            move |conn| repository::list_check_ins(conn, &id, cur.from, cur.to)
        }),
        read(db, {
            let id = id.clone();
            move |conn| repository::list_check_ins(conn, &id, prev.from, prev.to)
        }),
    )?;

    if company_name.is_none() {
        log::warn!("Company {company_id} not found; KPIs will be empty");
    }
    log::debug!(
        "Fetched {} members, {} transactions, {} payments, {} classes, {} check-ins for {company_id}",
        members.len(),
        current_transactions.len(),
        current_payments.len(),
        classes.len(),
        current_check_ins.len()
    );

    Ok(KpiInputs {
        company_name,
        members,
        current_transactions,
        previous_transactions,
        current_payments,
        previous_payments,
        classes,
        current_check_ins,
        previous_check_ins,
    })
}
