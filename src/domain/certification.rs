//! Certification records and their lifecycle evaluation.
//!
//! The lifecycle status is always derived from the record and an explicit
//! `now`; nothing here reads the system clock or caches a result.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Deserializer, Serialize};

use crate::domain::types::{CertificateNumber, CertificationType};

/// Certificates expiring within this many days are flagged `expiring_soon`.
pub const EXPIRING_SOON_DAYS: i64 = 30;

/// Certification record attached to a supplier profile.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct SupplierCertification {
    pub certification_type: CertificationType,
    #[serde(default, deserialize_with = "deserialize_optional_date")]
    pub issued_date: Option<NaiveDate>,
    /// Expiry instant in UTC. Plain dates expire at midnight.
    #[serde(default, deserialize_with = "deserialize_optional_instant")]
    pub expiry_date: Option<NaiveDateTime>,
    #[serde(default)]
    pub is_verified: bool,
    #[serde(default)]
    pub certificate_number: Option<CertificateNumber>,
}

impl SupplierCertification {
    #[must_use]
    pub fn new(certification_type: CertificationType, is_verified: bool) -> Self {
        Self {
            certification_type,
            issued_date: None,
            expiry_date: None,
            is_verified,
            certificate_number: None,
        }
    }

    /// Expires at midnight UTC of `expiry_date`.
    #[must_use]
    pub fn expires_on(self, expiry_date: NaiveDate) -> Self {
        self.expires_at(expiry_date.and_time(NaiveTime::MIN))
    }

    #[must_use]
    pub fn expires_at(mut self, expiry: NaiveDateTime) -> Self {
        self.expiry_date = Some(expiry);
        self
    }

    /// Evaluates this record against `now`.
    pub fn evaluate(&self, now: NaiveDateTime) -> CertificationEvaluation {
        evaluate(self, now)
    }
}

/// Display status derived from a certification at a point in time.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum CertificationStatus {
    Verified,
    Pending,
    ExpiringSoon,
    Expired,
}

impl CertificationStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            CertificationStatus::Verified => "verified",
            CertificationStatus::Pending => "pending",
            CertificationStatus::ExpiringSoon => "expiring_soon",
            CertificationStatus::Expired => "expired",
        }
    }
}

/// Derived lifecycle state. `is_verified` mirrors the record so widgets can
/// show the verification fact even when the status is an expiry override.
#[derive(Clone, Copy, Debug, Serialize, PartialEq, Eq)]
pub struct CertificationEvaluation {
    pub status: CertificationStatus,
    pub days_until_expiry: Option<i64>,
    pub is_verified: bool,
}

/// Derives the lifecycle status of `certification` at `now`.
pub fn evaluate(certification: &SupplierCertification, now: NaiveDateTime) -> CertificationEvaluation {
    let base = if certification.is_verified {
        CertificationStatus::Verified
    } else {
        CertificationStatus::Pending
    };

    let days_until_expiry = certification
        .expiry_date
        .map(|expiry| days_between(now, expiry));

    let status = match days_until_expiry {
        Some(days) if days <= 0 => CertificationStatus::Expired,
        Some(days) if days <= EXPIRING_SOON_DAYS => CertificationStatus::ExpiringSoon,
        _ => base,
    };

    CertificationEvaluation {
        status,
        days_until_expiry,
        is_verified: certification.is_verified,
    }
}

/// Whole days from `now` to `expiry`, rounded up.
fn days_between(now: NaiveDateTime, expiry: NaiveDateTime) -> i64 {
    let delta = expiry - now;
    let days = delta.num_days();
    if delta - Duration::days(days) > Duration::zero() {
        days + 1
    } else {
        days
    }
}

/// Accepts `YYYY-MM-DD` as well as RFC 3339 timestamps.
fn deserialize_optional_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(deserialize_optional_instant(deserializer)?.map(|instant| instant.date()))
}

/// `YYYY-MM-DD` becomes midnight UTC; timestamps keep their time, shifted to
/// UTC when they carry an offset.
fn deserialize_optional_instant<'de, D>(
    deserializer: D,
) -> Result<Option<NaiveDateTime>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    let Some(raw) = raw.map(|s| s.trim().to_string()).filter(|s| !s.is_empty()) else {
        return Ok(None);
    };

    if let Ok(date) = NaiveDate::parse_from_str(&raw, "%Y-%m-%d") {
        return Ok(Some(date.and_time(NaiveTime::MIN)));
    }
    if let Ok(instant) = NaiveDateTime::parse_from_str(&raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Ok(Some(instant));
    }

    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| Some(dt.naive_utc()))
        .map_err(serde::de::Error::custom)
}
