//! Domain services

pub mod auth_service;
pub mod user_service;
pub mod client_service;
pub mod catalog_service;
pub mod supplier_service;
pub mod lens_service;
pub mod service_order_service;
pub mod sale_service;
pub mod cash_register_service;

pub use auth_service::{AuthService, AuthTokens};
pub use user_service::UserService;
pub use client_service::ClientService;
pub use catalog_service::CatalogService;
pub use supplier_service::SupplierService;
pub use lens_service::LensService;
pub use service_order_service::ServiceOrderService;
pub use sale_service::SaleService;
pub use cash_register_service::CashRegisterService;

use std::collections::{BTreeSet, HashMap};

use rust_decimal::Decimal;

use otica_shared::EntityId;

use crate::domain::{money, CatalogKind, PricedItem};
use crate::error::DomainError;
use crate::repositories::{CatalogRepository, LensRepository};

/// Resolves `(lens_id, quantity, unit_price)` lines against the lens table.
/// Lenses must exist and be active; a missing price defaults to the lens sale price.
pub(crate) async fn price_items(
    lenses: &dyn LensRepository,
    lines: Vec<(EntityId, i32, Option<Decimal>)>,
) -> Result<Vec<PricedItem>, DomainError> {
    let ids: Vec<EntityId> = lines
        .iter()
        .map(|(id, _, _)| *id)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let found: HashMap<EntityId, _> = lenses
        .find_by_ids(&ids)
        .await?
        .into_iter()
        .map(|lens| (lens.id, lens))
        .collect();

    lines
        .into_iter()
        .map(|(lens_id, quantity, unit_price)| {
            let lens = found
                .get(&lens_id)
                .ok_or_else(|| DomainError::InvalidReference(format!("lens {} does not exist", lens_id)))?;
            if !lens.active {
                return Err(DomainError::validation(format!("lens {} is inactive", lens.code)));
            }
            Ok(PricedItem {
                lens_id,
                quantity,
                unit_price: money::round(unit_price.unwrap_or(lens.sale_price)),
            })
        })
        .collect()
}

/// Every id must name a live row of the catalog.
pub(crate) async fn ensure_catalog_ids(
    catalogs: &dyn CatalogRepository,
    kind: CatalogKind,
    ids: &[EntityId],
) -> Result<(), DomainError> {
    if ids.is_empty() {
        return Ok(());
    }
    let unique: Vec<EntityId> = ids.iter().copied().collect::<BTreeSet<_>>().into_iter().collect();
    let existing = catalogs.count_existing(kind, &unique).await?;
    if existing != unique.len() as i64 {
        return Err(DomainError::InvalidReference(format!(
            "one or more {} ids do not exist",
            kind.label()
        )));
    }
    Ok(())
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::{MockCatalogRepository, MockLensRepository};
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_price_items_defaults_and_overrides() {
        let mut lenses = MockLensRepository::new();
        lenses
            .expect_find_by_ids()
            .withf(|ids| ids == [1, 2])
            .returning(|_| Ok(vec![fixtures::lens(1, dec!(300)), fixtures::lens(2, dec!(80))]));

        let items = price_items(&lenses, vec![(2, 1, None), (1, 2, Some(dec!(250))), (2, 1, None)])
            .await
            .unwrap();
        assert_eq!(items[0].unit_price, dec!(80));
        assert_eq!(items[1].unit_price, dec!(250));
        assert_eq!(items.len(), 3);
    }

    #[tokio::test]
    async fn test_price_items_unknown_or_inactive_lens() {
        let mut lenses = MockLensRepository::new();
        lenses.expect_find_by_ids().returning(|_| {
            let mut inactive = fixtures::lens(2, dec!(10));
            inactive.active = false;
            Ok(vec![inactive])
        });

        assert!(matches!(
            price_items(&lenses, vec![(1, 1, None)]).await,
            Err(DomainError::InvalidReference(_))
        ));
        assert!(matches!(
            price_items(&lenses, vec![(2, 1, None)]).await,
            Err(DomainError::ValidationError(_))
        ));
    }

    #[tokio::test]
    async fn test_ensure_catalog_ids_counts_unique_ids() {
        let mut catalogs = MockCatalogRepository::new();
        catalogs
            .expect_count_existing()
            .withf(|kind, ids| *kind == CatalogKind::Role && ids == [1, 3])
            .returning(|_, ids| Ok(ids.len() as i64 - 1));

        assert!(ensure_catalog_ids(&catalogs, CatalogKind::Role, &[]).await.is_ok());
        assert!(matches!(
            ensure_catalog_ids(&catalogs, CatalogKind::Role, &[3, 1, 3]).await,
            Err(DomainError::InvalidReference(_))
        ));
    }
}
