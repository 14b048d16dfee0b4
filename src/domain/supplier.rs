use serde::{Deserialize, Serialize};

use crate::domain::certification::SupplierCertification;
use crate::domain::types::{CertificationType, CompanyName, LocationName, ServiceType, SupplierId};

/// Read-only projection of a supplier as returned by the search endpoint.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Supplier {
    pub id: SupplierId,
    pub company_name: CompanyName,
    pub service_type: ServiceType,
    #[serde(default)]
    pub location: Option<LocationName>,
    #[serde(default)]
    pub certification_types: Vec<CertificationType>,
    #[serde(default)]
    pub is_verified: bool,
    #[serde(default)]
    pub is_featured: bool,
    #[serde(default)]
    pub minimum_order_quantity: Option<u32>,
    #[serde(default)]
    pub lead_time_days: Option<u32>,
    #[serde(default)]
    pub response_time_hours: Option<u32>,
    /// Saved flag as last reported by the backend. Only used to seed the
    /// shared saved-state store; views read the store instead.
    #[serde(default)]
    pub is_saved: bool,
}

impl Supplier {
    /// Creates a supplier with only the mandatory fields populated.
    #[must_use]
    pub fn new(id: SupplierId, company_name: CompanyName, service_type: ServiceType) -> Self {
        Self {
            id,
            company_name,
            service_type,
            location: None,
            certification_types: Vec::new(),
            is_verified: false,
            is_featured: false,
            minimum_order_quantity: None,
            lead_time_days: None,
            response_time_hours: None,
            is_saved: false,
        }
    }

    pub fn has_certification(&self, certification: CertificationType) -> bool {
        self.certification_types.contains(&certification)
    }
}

/// Supplier profile payload including the certification records.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SupplierProfile {
    #[serde(flatten)]
    pub supplier: Supplier,
    #[serde(default)]
    pub certifications: Vec<SupplierCertification>,
}
