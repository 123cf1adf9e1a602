//! Lens catalog and mass price adjustments

use std::sync::Arc;

use tracing::info;

use otica_shared::{EntityId, Page};

use crate::domain::{CatalogKind, Lens, LensFilter, LensInput, PriceAdjustment};
use crate::error::DomainError;
use crate::repositories::{CatalogRepository, LensRepository, SupplierRepository};

pub struct LensService {
    lenses: Arc<dyn LensRepository>,
    catalogs: Arc<dyn CatalogRepository>,
    suppliers: Arc<dyn SupplierRepository>,
}

impl LensService {
    pub fn new(
        lenses: Arc<dyn LensRepository>,
        catalogs: Arc<dyn CatalogRepository>,
        suppliers: Arc<dyn SupplierRepository>,
    ) -> Self {
        Self { lenses, catalogs, suppliers }
    }

    pub async fn list(&self, filter: &LensFilter) -> Result<Page<Lens>, DomainError> {
        self.lenses.list(filter).await
    }

    pub async fn get(&self, id: EntityId) -> Result<Lens, DomainError> {
        self.lenses
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::not_found("lens", id))
    }

    pub async fn create(&self, input: LensInput) -> Result<Lens, DomainError> {
        let input = input.normalize()?;
        self.ensure_code_free(&input.code, None).await?;
        self.check_references(&input).await?;

        let id = self.lenses.create(&input).await?;
        info!("Lens {} ({}) created", id, input.code);
        self.get(id).await
    }

    pub async fn update(&self, id: EntityId, input: LensInput) -> Result<Lens, DomainError> {
        let input = input.normalize()?;
        self.ensure_code_free(&input.code, Some(id)).await?;
        self.check_references(&input).await?;

        if !self.lenses.update(id, &input).await? {
            return Err(DomainError::not_found("lens", id));
        }
        self.get(id).await
    }

    pub async fn delete(&self, id: EntityId) -> Result<(), DomainError> {
        if !self.lenses.delete(id).await? {
            return Err(DomainError::not_found("lens", id));
        }
        info!("Lens {} deleted", id);
        Ok(())
    }

    /// Returns the number of lenses adjusted.
    pub async fn adjust_prices(&self, adjustment: PriceAdjustment) -> Result<u64, DomainError> {
        adjustment.validate_target()?;
        let updated = self.lenses.adjust_prices(&adjustment).await?;
        info!(
            "Price adjustment {:?} {} applied to {} lenses",
            adjustment.mode, adjustment.value, updated
        );
        Ok(updated)
    }

    async fn ensure_code_free(&self, code: &str, current: Option<EntityId>) -> Result<(), DomainError> {
        match self.lenses.find_by_code(code).await? {
            Some(other) if Some(other.id) != current => {
                Err(DomainError::Conflict(format!("lens code {} already exists", code)))
            }
            _ => Ok(()),
        }
    }

    async fn check_references(&self, input: &LensInput) -> Result<(), DomainError> {
        self.ensure_catalog(CatalogKind::LensFamily, Some(input.family_id)).await?;
        self.ensure_catalog(CatalogKind::LensIndex, input.index_id).await?;
        self.ensure_catalog(CatalogKind::LensTreatment, input.treatment_id).await?;

        if let Some(supplier_id) = input.supplier_id {
            if self.suppliers.find_by_id(supplier_id).await?.is_none() {
                return Err(DomainError::InvalidReference(format!(
                    "supplier {} does not exist",
                    supplier_id
                )));
            }
        }
        Ok(())
    }

    async fn ensure_catalog(&self, kind: CatalogKind, id: Option<EntityId>) -> Result<(), DomainError> {
        let Some(id) = id else { return Ok(()) };
        if self.catalogs.find_by_id(kind, id).await?.is_none() {
            return Err(DomainError::InvalidReference(format!("{} {} does not exist", kind.label(), id)));
        }
        Ok(())
    }
}
