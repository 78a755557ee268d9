pub mod date_util;
pub mod error;
pub mod import;
pub mod kpi;
pub mod models;
pub mod period;
pub mod storage;

pub use error::{Error, Result};
pub use import::{Dataset, ImportReport};
pub use kpi::{KpiSnapshot, ReportWindow};
pub use period::{DateRange, Period};
pub use storage::repository::CompanySummary;
pub use storage::Database;

use storage::repository;

/// Config key holding the tenant used when none is given.
pub const DEFAULT_COMPANY_KEY: &str = "default_company";

/// Main entry point: a KPI store for one or more gym tenants.
pub struct BoxKpi {
    db: Database,
}

impl BoxKpi {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Resolve the tenant to report on: the explicit id if given, otherwise
    /// the configured default.
    pub async fn resolve_company(&self, explicit: Option<&str>) -> Result<String> {
        if let Some(id) = explicit {
            return Ok(id.to_string());
        }
        self.config_get(DEFAULT_COMPANY_KEY).await?.ok_or_else(|| {
            Error::Config(format!(
                "no company given. Pass --company or run: boxkpi config set {DEFAULT_COMPANY_KEY} <ID>"
            ))
        })
    }

    // ── KPIs ───────────────────────────────────────────────────────

    pub async fn company_kpis(
        &self,
        company_id: &str,
        range: Option<DateRange>,
    ) -> Result<KpiSnapshot> {
        kpi::compute_company_kpis(&self.db, company_id, range).await
    }

    // ── Data ───────────────────────────────────────────────────────

    pub async fn import_file(&self, path: impl AsRef<std::path::Path>) -> Result<ImportReport> {
        import::import_file(&self.db, path).await
    }

    pub async fn companies(&self) -> Result<Vec<CompanySummary>> {
        Ok(self.db.reader().call(|conn| repository::list_companies(conn)).await?)
    }

    pub async fn table_counts(&self) -> Result<Vec<(&'static str, u64)>> {
        Ok(self.db.reader().call(|conn| repository::table_counts(conn)).await?)
    }

    // ── Config ─────────────────────────────────────────────────────

    pub async fn config_get(&self, key: &str) -> Result<Option<String>> {
        self.db
            .reader()
            .call({
                let key = key.to_string();
                move |conn| repository::get_config(conn, &key)
            })
            .await
            .map_err(|e| Error::Database(e.to_string()))
    }

    pub async fn config_set(&self, key: &str, value: &str) -> Result<()> {
        self.db
            .writer()
            .call({
                let key = key.to_string();
                let value = value.to_string();
                move |conn| repository::set_config(conn, &key, &value)
            })
            .await
            .map_err(|e| Error::Database(e.to_string()))
    }

    pub async fn config_list(&self) -> Result<Vec<(String, String)>> {
        self.db
            .reader()
            .call(|conn| repository::list_config(conn))
            .await
            .map_err(|e| Error::Database(e.to_string()))
    }
}
