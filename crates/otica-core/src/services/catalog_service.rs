//! Catalog service, shared by every catalog kind

use std::sync::Arc;

use tracing::info;

use otica_shared::{EntityId, Page};

use crate::domain::{CatalogInput, CatalogItem, CatalogKind, ListQuery};
use crate::error::DomainError;
use crate::repositories::CatalogRepository;

pub struct CatalogService {
    catalogs: Arc<dyn CatalogRepository>,
}

impl CatalogService {
    pub fn new(catalogs: Arc<dyn CatalogRepository>) -> Self {
        Self { catalogs }
    }

    pub async fn list(&self, kind: CatalogKind, query: &ListQuery) -> Result<Page<CatalogItem>, DomainError> {
        self.catalogs.list(kind, query).await
    }

    pub async fn get(&self, kind: CatalogKind, id: EntityId) -> Result<CatalogItem, DomainError> {
        self.catalogs
            .find_by_id(kind, id)
            .await?
            .ok_or_else(|| DomainError::not_found(kind.label(), id))
    }

    pub async fn create(&self, kind: CatalogKind, input: CatalogInput) -> Result<CatalogItem, DomainError> {
        let input = input.normalize()?;
        self.ensure_name_free(kind, &input.name, None).await?;

        let id = self.catalogs.create(kind, &input).await?;
        info!("{} {} created", kind.label(), id);
        self.get(kind, id).await
    }

    pub async fn update(&self, kind: CatalogKind, id: EntityId, input: CatalogInput) -> Result<CatalogItem, DomainError> {
        let input = input.normalize()?;
        self.ensure_name_free(kind, &input.name, Some(id)).await?;

        if !self.catalogs.update(kind, id, &input).await? {
            return Err(DomainError::not_found(kind.label(), id));
        }
        self.get(kind, id).await
    }

    pub async fn delete(&self, kind: CatalogKind, id: EntityId) -> Result<(), DomainError> {
        if !self.catalogs.delete(kind, id).await? {
            return Err(DomainError::not_found(kind.label(), id));
        }
        info!("{} {} deleted", kind.label(), id);
        Ok(())
    }

    async fn ensure_name_free(&self, kind: CatalogKind, name: &str, current: Option<EntityId>) -> Result<(), DomainError> {
        match self.catalogs.find_by_name(kind, name).await? {
            Some(other) if Some(other.id) != current => Err(DomainError::Conflict(format!(
                "{} '{}' already exists",
                kind.label(),
                name
            ))),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::MockCatalogRepository;
    use crate::services::fixtures;

    #[tokio::test]
    async fn test_create_duplicate_name() {
        let mut catalogs = MockCatalogRepository::new();
        catalogs
            .expect_find_by_name()
            .withf(|kind, name| *kind == CatalogKind::PaymentMethod && name == "PIX")
            .returning(|_, name| Ok(Some(fixtures::catalog_item(1, name))));
        catalogs.expect_create().never();

        let service = CatalogService::new(Arc::new(catalogs));
        let err = service
            .create(CatalogKind::PaymentMethod, CatalogInput::new(" PIX "))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "payment method 'PIX' already exists");
    }

    #[tokio::test]
    async fn test_create_then_reload() {
        let mut catalogs = MockCatalogRepository::new();
        catalogs.expect_find_by_name().returning(|_, _| Ok(None));
        catalogs.expect_create().returning(|_, _| Ok(3));
        catalogs
            .expect_find_by_id()
            .withf(|kind, id| *kind == CatalogKind::LensTreatment && *id == 3)
            .returning(|_, id| Ok(Some(fixtures::catalog_item(id, "Antirreflexo"))));

        let service = CatalogService::new(Arc::new(catalogs));
        let item = service
            .create(CatalogKind::LensTreatment, CatalogInput::new("Antirreflexo"))
            .await
            .unwrap();
        assert_eq!(item.id, 3);
    }

    #[tokio::test]
    async fn test_rename_onto_self_is_allowed() {
        let mut catalogs = MockCatalogRepository::new();
        catalogs
            .expect_find_by_name()
            .returning(|_, name| Ok(Some(fixtures::catalog_item(5, name))));
        catalogs.expect_update().returning(|_, _, _| Ok(true));
        catalogs
            .expect_find_by_id()
            .returning(|_, id| Ok(Some(fixtures::catalog_item(id, "Cartão"))));

        let service = CatalogService::new(Arc::new(catalogs));
        assert!(service.update(CatalogKind::PaymentMethod, 5, CatalogInput::new("Cartão")).await.is_ok());
    }

    #[tokio::test]
    async fn test_delete_missing() {
        let mut catalogs = MockCatalogRepository::new();
        catalogs.expect_delete().returning(|_, _| Ok(false));

        let service = CatalogService::new(Arc::new(catalogs));
        let err = service.delete(CatalogKind::Sector, 4).await.unwrap_err();
        assert_eq!(err.to_string(), "sector 4 not found");
    }
}
