//! Supplier service

use std::sync::Arc;

use tracing::info;

use otica_shared::{EntityId, Page};

use crate::domain::{ListQuery, Supplier, SupplierInput};
use crate::error::DomainError;
use crate::repositories::SupplierRepository;

pub struct SupplierService {
    suppliers: Arc<dyn SupplierRepository>,
}

impl SupplierService {
    pub fn new(suppliers: Arc<dyn SupplierRepository>) -> Self {
        Self { suppliers }
    }

    pub async fn list(&self, query: &ListQuery) -> Result<Page<Supplier>, DomainError> {
        self.suppliers.list(query).await
    }

    pub async fn get(&self, id: EntityId) -> Result<Supplier, DomainError> {
        self.suppliers
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::not_found("supplier", id))
    }

    pub async fn create(&self, input: SupplierInput) -> Result<Supplier, DomainError> {
        let input = input.normalize()?;
        self.ensure_unique(&input, None).await?;

        let id = self.suppliers.create(&input).await?;
        info!("Supplier {} created", id);
        self.get(id).await
    }

    pub async fn update(&self, id: EntityId, input: SupplierInput) -> Result<Supplier, DomainError> {
        let input = input.normalize()?;
        self.ensure_unique(&input, Some(id)).await?;

        if !self.suppliers.update(id, &input).await? {
            return Err(DomainError::not_found("supplier", id));
        }
        self.get(id).await
    }

    pub async fn delete(&self, id: EntityId) -> Result<(), DomainError> {
        if !self.suppliers.delete(id).await? {
            return Err(DomainError::not_found("supplier", id));
        }
        info!("Supplier {} deleted", id);
        Ok(())
    }

    async fn ensure_unique(&self, input: &SupplierInput, current: Option<EntityId>) -> Result<(), DomainError> {
        if let Some(other) = self.suppliers.find_by_name(&input.name).await? {
            if Some(other.id) != current {
                return Err(DomainError::Conflict(format!("supplier '{}' already exists", input.name)));
            }
        }
        if let Some(cnpj) = &input.cnpj {
            if let Some(other) = self.suppliers.find_by_cnpj(cnpj).await? {
                if Some(other.id) != current {
                    return Err(DomainError::Conflict(format!(
                        "a supplier with CNPJ {} already exists",
                        cnpj
                    )));
                }
            }
        }
        Ok(())
    }
}
