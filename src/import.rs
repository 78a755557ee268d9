//! Load a JSON export of tenant data into the store.
//!
//! The whole dataset is written inside one transaction with upsert
//! semantics, so re-importing a newer export of the same tenant refreshes
//! it in place and a rejected file leaves the store untouched.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::models::{
    Booking, CheckIn, Company, Member, Payment, Plan, ScheduledClass, Subscription, Transaction,
};
use crate::storage::{repository, Database};

/// One export file. Every section is optional. Timestamps may be naive or
/// carry a UTC offset; offset values are stored as their local wall time.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Dataset {
    pub companies: Vec<Company>,
    pub plans: Vec<Plan>,
    pub members: Vec<Member>,
    pub subscriptions: Vec<Subscription>,
    pub transactions: Vec<Transaction>,
    pub payments: Vec<Payment>,
    /// Classes may carry their bookings inline.
    pub classes: Vec<ScheduledClass>,
    pub bookings: Vec<Booking>,
    pub check_ins: Vec<CheckIn>,
}

impl Dataset {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Reject values the store schema would otherwise accept silently or
    /// fail on with an opaque constraint error.
    pub fn validate(&self) -> Result<()> {
        let negative = |what: &str, id: &str, amount: f64| {
            if amount < 0.0 || !amount.is_finite() {
                Err(Error::Import(format!("{what} {id} has invalid amount {amount}")))
            } else {
                Ok(())
            }
        };
        for p in &self.plans {
            negative("plan", &p.plan_id, p.price)?;
        }
        for t in &self.transactions {
            negative("transaction", &t.transaction_id, t.amount)?;
        }
        for p in &self.payments {
            negative("payment", &p.payment_id, p.amount)?;
        }
        for c in &self.classes {
            if let Some(b) = c.bookings.iter().find(|b| b.class_id != c.class_id) {
                return Err(Error::Import(format!(
                    "booking {} is nested under class {} but references class {}",
                    b.booking_id, c.class_id, b.class_id
                )));
            }
        }
        Ok(())
    }
}

/// Rows written per entity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    pub companies: u64,
    pub plans: u64,
    pub members: u64,
    pub subscriptions: u64,
    pub transactions: u64,
    pub payments: u64,
    pub classes: u64,
    pub bookings: u64,
    pub check_ins: u64,
}

impl ImportReport {
    pub fn total(&self) -> u64 {
        self.companies
            + self.plans
            + self.members
            + self.subscriptions
            + self.transactions
            + self.payments
            + self.classes
            + self.bookings
            + self.check_ins
    }
}

/// Validate and write a dataset. Parents are written before children so
/// foreign keys hold.
pub async fn import_dataset(db: &Database, dataset: Dataset) -> Result<ImportReport> {
    dataset.validate()?;

    let report = db
        .writer()
        .call(move |conn| {
            let tx = conn.transaction()?;
            let mut report = ImportReport::default();

            for c in &dataset.companies {
                repository::upsert_company(&tx, c)?;
                report.companies += 1;
            }
            for p in &dataset.plans {
                repository::upsert_plan(&tx, p)?;
                report.plans += 1;
            }
            for m in &dataset.members {
                repository::upsert_member(&tx, m)?;
                report.members += 1;
            }
            for s in &dataset.subscriptions {
                repository::upsert_subscription(&tx, s)?;
                report.subscriptions += 1;
            }
            for t in &dataset.transactions {
                repository::upsert_transaction(&tx, t)?;
                report.transactions += 1;
            }
            for p in &dataset.payments {
                repository::upsert_payment(&tx, p)?;
                report.payments += 1;
            }
            for c in &dataset.classes {
                repository::upsert_class(&tx, c)?;
                report.classes += 1;
                for b in &c.bookings {
                    repository::upsert_booking(&tx, b)?;
                    report.bookings += 1;
                }
            }
            for b in &dataset.bookings {
                repository::upsert_booking(&tx, b)?;
                report.bookings += 1;
            }
            for ci in &dataset.check_ins {
                repository::upsert_check_in(&tx, ci)?;
                report.check_ins += 1;
            }

            tx.commit()?;
            Ok::<ImportReport, rusqlite::Error>(report)
        })
        .await?;

    log::info!("Imported {} rows: {report:?}", report.total());
    Ok(report)
}

/// Read a JSON export from disk and import it.
pub async fn import_file(db: &Database, path: impl AsRef<Path>) -> Result<ImportReport> {
    let path = path.as_ref();
    log::debug!("Reading dataset from {}", path.display());
    let dataset = Dataset::from_path(path)?;
    import_dataset(db, dataset).await
}
