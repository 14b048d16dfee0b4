use serde::Serialize;

use crate::domain::certification::{CertificationEvaluation, SupplierCertification};

/// A certification together with its evaluation at a single instant, so
/// every widget rendering it shows the same status.
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct CertificationBadge {
    pub certification: SupplierCertification,
    pub evaluation: CertificationEvaluation,
}
