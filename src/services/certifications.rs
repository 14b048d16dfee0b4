use chrono::NaiveDateTime;
use serde::Serialize;

use crate::domain::certification::{CertificationStatus, SupplierCertification};
use crate::domain::types::SupplierId;
use crate::dto::certification::CertificationBadge;
use crate::repository::CertificationReader;
use crate::services::ServiceResult;

/// Evaluates every certification once at `now`.
pub fn badges_at(
    certifications: Vec<SupplierCertification>,
    now: NaiveDateTime,
) -> Vec<CertificationBadge> {
    certifications
        .into_iter()
        .map(|certification| {
            let evaluation = certification.evaluate(now);
            CertificationBadge {
                certification,
                evaluation,
            }
        })
        .collect()
}

/// Loads a supplier's certifications and evaluates them at `now`.
pub async fn load_certification_badges<R>(
    repo: &R,
    supplier_id: SupplierId,
    now: NaiveDateTime,
) -> ServiceResult<Vec<CertificationBadge>>
where
    R: CertificationReader + ?Sized,
{
    let certifications = repo.list_certifications(supplier_id).await.map_err(|err| {
        log::error!("Failed to load certifications for supplier {supplier_id}: {err}");
        err
    })?;

    Ok(badges_at(certifications, now))
}

/// Per-status counts for headline widgets.
#[derive(Clone, Copy, Debug, Default, Serialize, PartialEq, Eq)]
pub struct CertificationSummary {
    pub verified: usize,
    pub pending: usize,
    pub expiring_soon: usize,
    pub expired: usize,
}

impl CertificationSummary {
    pub fn from_badges(badges: &[CertificationBadge]) -> Self {
        badges
            .iter()
            .fold(Self::default(), |mut summary, badge| {
                match badge.evaluation.status {
                    CertificationStatus::Verified => summary.verified += 1,
                    CertificationStatus::Pending => summary.pending += 1,
                    CertificationStatus::ExpiringSoon => summary.expiring_soon += 1,
                    CertificationStatus::Expired => summary.expired += 1,
                }
                summary
            })
    }

    /// Certifications that currently count as valid.
    pub fn active(&self) -> usize {
        self.verified + self.expiring_soon
    }

    pub fn needs_attention(&self) -> bool {
        self.expiring_soon > 0 || self.expired > 0
    }
}
