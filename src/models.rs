//! Typed rows for the tenant-scoped entities the KPI roll-up reads.
//!
//! Status columns are closed sets. They are narrowed into enums at the
//! storage boundary so the calculator never matches on raw strings.

use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Declares a lowercase string-backed enum that round-trips through SQLite
/// TEXT columns and serde.
macro_rules! text_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "lowercase")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    other => Err(Error::InvalidIdentifier(format!(
                        "unknown {} value: {other}",
                        stringify!($name)
                    ))),
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl ToSql for $name {
            fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
                Ok(ToSqlOutput::from(self.as_str()))
            }
        }

        impl FromSql for $name {
            fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
                value
                    .as_str()?
                    .parse()
                    .map_err(|e: Error| FromSqlError::Other(Box::new(e)))
            }
        }
    };
}

text_enum!(
    /// Lifecycle state of an athlete.
    MemberStatus {
        Active => "active",
        Inactive => "inactive",
        Suspended => "suspended",
        Pending => "pending",
    }
);

text_enum!(
    SubscriptionStatus {
        Active => "active",
        Canceled => "canceled",
        Expired => "expired",
        Paused => "paused",
    }
);

text_enum!(
    BillingCycle {
        Monthly => "monthly",
        Quarterly => "quarterly",
        Semiannual => "semiannual",
        Annual => "annual",
    }
);

text_enum!(
    /// Direction of a ledger entry.
    TransactionType {
        Income => "income",
        Expense => "expense",
    }
);

text_enum!(
    TransactionStatus {
        Completed => "completed",
        Pending => "pending",
        Cancelled => "cancelled",
    }
);

text_enum!(
    PaymentStatus {
        Paid => "paid",
        Pending => "pending",
        Overdue => "overdue",
    }
);

/// Timestamps in exports come either naive (`2025-03-01T08:00:00`) or with
/// a UTC offset (`2025-03-01T08:00:00-03:00`). Offset values keep their
/// local wall-clock time, which is what the day-granular windows compare.
mod timestamp {
    use chrono::{DateTime, NaiveDateTime};
    use serde::{de, Deserialize, Deserializer};

    pub fn parse(s: &str) -> Option<NaiveDateTime> {
        let s = s.trim();
        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return Some(dt.naive_local());
        }
        ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveDateTime, D::Error> {
        let s = String::deserialize(d)?;
        parse(&s).ok_or_else(|| de::Error::custom(format!("invalid timestamp: {s}")))
    }
}

/// Transaction category that counts toward acquisition cost.
pub const MARKETING_CATEGORY: &str = "marketing";

/// A gym/studio account. Every other row belongs to exactly one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Company {
    pub company_id: String,
    pub name: String,
    #[serde(deserialize_with = "timestamp::deserialize")]
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    pub plan_id: String,
    pub company_id: String,
    pub name: String,
    pub price: f64,
    pub billing_cycle: BillingCycle,
}

/// An athlete as read for KPI purposes: the row itself plus the price of
/// the plan behind their active subscription, if any.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Member {
    pub member_id: String,
    pub company_id: String,
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    pub status: MemberStatus,
    #[serde(deserialize_with = "timestamp::deserialize")]
    pub created_at: NaiveDateTime,
    #[serde(deserialize_with = "timestamp::deserialize")]
    pub updated_at: NaiveDateTime,
    #[serde(skip)]
    pub active_plan_price: Option<f64>,
}

impl Member {
    pub fn is_active(&self) -> bool {
        self.status == MemberStatus::Active
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subscription {
    pub subscription_id: String,
    pub company_id: String,
    pub member_id: String,
    pub plan_id: String,
    pub status: SubscriptionStatus,
    pub start_date: NaiveDate,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
}

/// A financial ledger entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub transaction_id: String,
    pub company_id: String,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    pub status: TransactionStatus,
    pub amount: f64,
    pub transaction_date: NaiveDate,
    pub category: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl Transaction {
    pub fn is_completed(&self, kind: TransactionType) -> bool {
        self.kind == kind && self.status == TransactionStatus::Completed
    }
}

/// A member-specific payment record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    pub payment_id: String,
    pub company_id: String,
    pub member_id: String,
    pub status: PaymentStatus,
    pub amount: f64,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub paid_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Booking {
    pub booking_id: String,
    pub class_id: String,
    pub member_id: String,
}

/// A scheduled class with the bookings made against it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduledClass {
    pub class_id: String,
    pub company_id: String,
    pub name: String,
    pub date: NaiveDate,
    pub max_capacity: u32,
    #[serde(default)]
    pub bookings: Vec<Booking>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckIn {
    pub check_in_id: String,
    pub company_id: String,
    pub member_id: String,
    #[serde(deserialize_with = "timestamp::deserialize")]
    pub check_in_time: NaiveDateTime,
}
