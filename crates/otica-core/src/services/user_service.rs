//! User management and first-run admin bootstrap

use std::sync::Arc;

use tracing::{info, warn};

use otica_security::password::PasswordService;
use otica_shared::utils::mask_email;
use otica_shared::{EntityId, Page};

use crate::domain::{CatalogInput, CatalogKind, ListQuery, NewUser, User, UserAssociations, UserInput, UserUpdate};
use crate::error::DomainError;
use crate::repositories::{CatalogRepository, UserRepository};
use crate::services::ensure_catalog_ids;

pub struct UserService {
    users: Arc<dyn UserRepository>,
    catalogs: Arc<dyn CatalogRepository>,
}

impl UserService {
    pub fn new(users: Arc<dyn UserRepository>, catalogs: Arc<dyn CatalogRepository>) -> Self {
        Self { users, catalogs }
    }

    pub async fn list(&self, query: &ListQuery) -> Result<Page<User>, DomainError> {
        self.users.list(query).await
    }

    pub async fn get(&self, id: EntityId) -> Result<User, DomainError> {
        self.users
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::not_found("user", id))
    }

    pub async fn create(&self, input: UserInput) -> Result<User, DomainError> {
        let input = input.normalize(true)?;

        if self.users.find_by_email(&input.email).await?.is_some() {
            warn!("User creation failed: email already exists: {}", mask_email(&input.email));
            return Err(DomainError::Conflict(format!("email {} is already in use", input.email)));
        }
        self.check_associations(&input.associations).await?;

        let password = input.password.as_deref().unwrap_or_default();
        let password_hash = hash_password(password)?;

        let id = self
            .users
            .create(&NewUser {
                name: input.name,
                email: input.email,
                password_hash,
                active: input.active,
                associations: input.associations,
            })
            .await?;

        info!("User {} created", id);
        self.get(id).await
    }

    pub async fn update(&self, id: EntityId, input: UserInput) -> Result<User, DomainError> {
        let input = input.normalize(false)?;
        self.get(id).await?;

        if let Some(other) = self.users.find_by_email(&input.email).await? {
            if other.id != id {
                return Err(DomainError::Conflict(format!("email {} is already in use", input.email)));
            }
        }
        self.check_associations(&input.associations).await?;

        let password_hash = input.password.as_deref().map(hash_password).transpose()?;
        let update = UserUpdate {
            name: input.name,
            email: input.email,
            password_hash,
            active: input.active,
            associations: input.associations,
        };
        if !self.users.update(id, &update).await? {
            return Err(DomainError::not_found("user", id));
        }

        info!("User {} updated", id);
        self.get(id).await
    }

    pub async fn delete(&self, id: EntityId, acting_user_id: EntityId) -> Result<(), DomainError> {
        if id == acting_user_id {
            return Err(DomainError::InvalidState("you cannot delete your own user".into()));
        }
        if !self.users.delete(id).await? {
            return Err(DomainError::not_found("user", id));
        }
        info!("User {} deleted by {}", id, acting_user_id);
        Ok(())
    }

    /// Creates the first administrator when the user table is empty.
    /// Returns the created user, or `None` when users already exist.
    pub async fn ensure_bootstrap_admin(
        &self,
        name: &str,
        email: &str,
        password: &str,
        admin_role: &str,
    ) -> Result<Option<User>, DomainError> {
        if self.users.count().await? > 0 {
            return Ok(None);
        }

        let role_id = match self.catalogs.find_by_name(CatalogKind::Role, admin_role).await? {
            Some(role) => role.id,
            None => {
                let id = self
                    .catalogs
                    .create(CatalogKind::Role, &CatalogInput::new(admin_role).normalize()?)
                    .await?;
                info!("Created role '{}' ({})", admin_role, id);
                id
            }
        };

        let input = UserInput {
            name: name.to_string(),
            email: email.to_string(),
            password: Some(password.to_string()),
            active: true,
            associations: UserAssociations {
                role_ids: vec![role_id],
                ..Default::default()
            },
        };
        let user = self.create(input).await?;
        info!("Bootstrap administrator {} created", mask_email(&user.email));
        Ok(Some(user))
    }

    async fn check_associations(&self, associations: &UserAssociations) -> Result<(), DomainError> {
        let catalogs = self.catalogs.as_ref();
        ensure_catalog_ids(catalogs, CatalogKind::Role, &associations.role_ids).await?;
        ensure_catalog_ids(catalogs, CatalogKind::Sector, &associations.sector_ids).await?;
        ensure_catalog_ids(catalogs, CatalogKind::Company, &associations.company_ids).await
    }
}

fn hash_password(password: &str) -> Result<String, DomainError> {
    PasswordService::hash(password).map_err(|e| DomainError::PasswordHashError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::{MockCatalogRepository, MockUserRepository};
    use crate::services::fixtures;
    use mockall::predicate::eq;

    fn input(email: &str, password: Option<&str>, role_ids: Vec<EntityId>) -> UserInput {
        UserInput {
            name: "Ana Lima".into(),
            email: email.into(),
            password: password.map(String::from),
            active: true,
            associations: UserAssociations { role_ids, ..Default::default() },
        }
    }

    #[tokio::test]
    async fn test_create_hashes_password_and_checks_roles() {
        let mut users = MockUserRepository::new();
        users.expect_find_by_email().returning(|_| Ok(None));
        users
            .expect_create()
            .withf(|u| {
                u.email == "ana@otica.com"
                    && u.password_hash.starts_with("$argon2")
                    && u.associations.role_ids == vec![1]
            })
            .times(1)
            .returning(|_| Ok(5));
        users
            .expect_find_by_id()
            .with(eq(5))
            .returning(|id| Ok(Some(fixtures::user(id, "ana@otica.com"))));

        let mut catalogs = MockCatalogRepository::new();
        catalogs.expect_count_existing().returning(|_, ids| Ok(ids.len() as i64));

        let service = UserService::new(Arc::new(users), Arc::new(catalogs));
        let user = service
            .create(input("ANA@otica.com", Some("long-enough"), vec![1]))
            .await
            .unwrap();
        assert_eq!(user.id, 5);
    }

    #[tokio::test]
    async fn test_create_duplicate_email() {
        let mut users = MockUserRepository::new();
        users
            .expect_find_by_email()
            .returning(|email| Ok(Some(fixtures::user(1, email))));
        users.expect_create().never();

        let service = UserService::new(Arc::new(users), Arc::new(MockCatalogRepository::new()));
        assert!(matches!(
            service.create(input("ana@otica.com", Some("long-enough"), vec![])).await,
            Err(DomainError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn test_create_unknown_role() {
        let mut users = MockUserRepository::new();
        users.expect_find_by_email().returning(|_| Ok(None));
        users.expect_create().never();

        let mut catalogs = MockCatalogRepository::new();
        catalogs.expect_count_existing().returning(|_, _| Ok(0));

        let service = UserService::new(Arc::new(users), Arc::new(catalogs));
        assert!(matches!(
            service.create(input("ana@otica.com", Some("long-enough"), vec![99])).await,
            Err(DomainError::InvalidReference(_))
        ));
    }

    #[tokio::test]
    async fn test_update_keeps_hash_without_new_password() {
        let mut users = MockUserRepository::new();
        users
            .expect_find_by_id()
            .returning(|id| Ok(Some(fixtures::user(id, "ana@otica.com"))));
        users
            .expect_find_by_email()
            .returning(|email| Ok(Some(fixtures::user(3, email))));
        users
            .expect_update()
            .withf(|id, u| *id == 3 && u.password_hash.is_none())
            .times(1)
            .returning(|_, _| Ok(true));

        let service = UserService::new(Arc::new(users), Arc::new(MockCatalogRepository::new()));
        service.update(3, input("ana@otica.com", None, vec![])).await.unwrap();
    }

    #[tokio::test]
    async fn test_update_email_taken_by_other_user() {
        let mut users = MockUserRepository::new();
        users
            .expect_find_by_id()
            .returning(|id| Ok(Some(fixtures::user(id, "ana@otica.com"))));
        users
            .expect_find_by_email()
            .returning(|email| Ok(Some(fixtures::user(4, email))));
        users.expect_update().never();

        let service = UserService::new(Arc::new(users), Arc::new(MockCatalogRepository::new()));
        assert!(matches!(
            service.update(3, input("bia@otica.com", None, vec![])).await,
            Err(DomainError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn test_delete_self_and_missing() {
        let mut users = MockUserRepository::new();
        users.expect_delete().with(eq(8)).returning(|_| Ok(false));

        let service = UserService::new(Arc::new(users), Arc::new(MockCatalogRepository::new()));
        assert!(matches!(service.delete(2, 2).await, Err(DomainError::InvalidState(_))));
        assert!(matches!(service.delete(8, 2).await, Err(DomainError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_bootstrap_skipped_when_users_exist() {
        let mut users = MockUserRepository::new();
        users.expect_count().returning(|| Ok(3));
        users.expect_create().never();

        let service = UserService::new(Arc::new(users), Arc::new(MockCatalogRepository::new()));
        let created = service
            .ensure_bootstrap_admin("Admin", "admin@otica.com", "change-me-now", "admin")
            .await
            .unwrap();
        assert!(created.is_none());
    }

    #[tokio::test]
    async fn test_bootstrap_creates_role_and_admin() {
        let mut users = MockUserRepository::new();
        users.expect_count().returning(|| Ok(0));
        users.expect_find_by_email().returning(|_| Ok(None));
        users
            .expect_create()
            .withf(|u| u.associations.role_ids == vec![1])
            .returning(|_| Ok(1));
        users
            .expect_find_by_id()
            .returning(|id| Ok(Some(fixtures::user(id, "admin@otica.com"))));

        let mut catalogs = MockCatalogRepository::new();
        catalogs
            .expect_find_by_name()
            .withf(|kind, name| *kind == CatalogKind::Role && name == "admin")
            .returning(|_, _| Ok(None));
        catalogs
            .expect_create()
            .withf(|kind, input| *kind == CatalogKind::Role && input.name == "admin")
            .times(1)
            .returning(|_, _| Ok(1));
        catalogs.expect_count_existing().returning(|_, ids| Ok(ids.len() as i64));

        let service = UserService::new(Arc::new(users), Arc::new(catalogs));
        let created = service
            .ensure_bootstrap_admin("Admin", "admin@otica.com", "change-me-now", "admin")
            .await
            .unwrap();
        assert_eq!(created.map(|u| u.id), Some(1));
    }
}
