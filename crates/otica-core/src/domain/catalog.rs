//! Catalog tables: small named lookup lists sharing one shape

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use otica_shared::utils::blank_to_none;
use otica_shared::EntityId;

use crate::error::DomainError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CatalogKind {
    LensFamily,
    LensTreatment,
    LensIndex,
    PaymentMethod,
    Role,
    Sector,
    Company,
}

impl CatalogKind {
    pub const ALL: [CatalogKind; 7] = [
        CatalogKind::LensFamily,
        CatalogKind::LensTreatment,
        CatalogKind::LensIndex,
        CatalogKind::PaymentMethod,
        CatalogKind::Role,
        CatalogKind::Sector,
        CatalogKind::Company,
    ];

    pub fn table(&self) -> &'static str {
        match self {
            CatalogKind::LensFamily => "lens_families",
            CatalogKind::LensTreatment => "lens_treatments",
            CatalogKind::LensIndex => "lens_indices",
            CatalogKind::PaymentMethod => "payment_methods",
            CatalogKind::Role => "roles",
            CatalogKind::Sector => "sectors",
            CatalogKind::Company => "companies",
        }
    }

    /// URL segment under `/api/v1`
    pub fn path(&self) -> &'static str {
        match self {
            CatalogKind::LensFamily => "lens-families",
            CatalogKind::LensTreatment => "lens-treatments",
            CatalogKind::LensIndex => "lens-indices",
            CatalogKind::PaymentMethod => "payment-methods",
            CatalogKind::Role => "roles",
            CatalogKind::Sector => "sectors",
            CatalogKind::Company => "companies",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            CatalogKind::LensFamily => "lens family",
            CatalogKind::LensTreatment => "lens treatment",
            CatalogKind::LensIndex => "lens index",
            CatalogKind::PaymentMethod => "payment method",
            CatalogKind::Role => "role",
            CatalogKind::Sector => "sector",
            CatalogKind::Company => "company",
        }
    }

    /// Writes to access-control catalogs are reserved to administrators.
    pub fn requires_admin(&self) -> bool {
        matches!(self, CatalogKind::Role | CatalogKind::Sector | CatalogKind::Company)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogItem {
    pub id: EntityId,
    pub name: String,
    pub description: Option<String>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Validate)]
pub struct CatalogInput {
    #[validate(length(min = 1, max = 100, message = "must have between 1 and 100 characters"))]
    pub name: String,
    #[serde(default)]
    #[validate(length(max = 255))]
    pub description: Option<String>,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

impl CatalogInput {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), description: None, active: true }
    }

    pub fn normalize(self) -> Result<Self, DomainError> {
        let input = Self {
            name: self.name.trim().to_string(),
            description: blank_to_none(self.description),
            active: self.active,
        };
        input.validate()?;
        Ok(input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_kinds_have_distinct_tables_and_paths() {
        let tables: HashSet<_> = CatalogKind::ALL.iter().map(|k| k.table()).collect();
        let paths: HashSet<_> = CatalogKind::ALL.iter().map(|k| k.path()).collect();
        assert_eq!(tables.len(), CatalogKind::ALL.len());
        assert_eq!(paths.len(), CatalogKind::ALL.len());
    }

    #[test]
    fn test_admin_only_kinds() {
        let admin_only: Vec<_> = CatalogKind::ALL.iter().filter(|k| k.requires_admin()).collect();
        assert_eq!(admin_only, vec![&CatalogKind::Role, &CatalogKind::Sector, &CatalogKind::Company]);
    }

    #[test]
    fn test_input_defaults_to_active() {
        let input: CatalogInput = serde_json::from_str(r#"{"name":"Multifocal"}"#).unwrap();
        assert!(input.active);
        assert_eq!(input.description, None);
    }

    #[test]
    fn test_blank_name_rejected() {
        assert!(CatalogInput::new("   ").normalize().is_err());
        assert_eq!(CatalogInput::new(" PIX ").normalize().unwrap().name, "PIX");
    }
}
