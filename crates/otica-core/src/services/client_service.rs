//! Client service

use std::sync::Arc;

use tracing::info;

use otica_shared::{EntityId, Page};

use crate::domain::{Client, ClientInput, ListQuery};
use crate::error::DomainError;
use crate::repositories::ClientRepository;

pub struct ClientService {
    clients: Arc<dyn ClientRepository>,
}

impl ClientService {
    pub fn new(clients: Arc<dyn ClientRepository>) -> Self {
        Self { clients }
    }

    pub async fn list(&self, query: &ListQuery) -> Result<Page<Client>, DomainError> {
        self.clients.list(query).await
    }

    pub async fn get(&self, id: EntityId) -> Result<Client, DomainError> {
        self.clients
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::not_found("client", id))
    }

    pub async fn create(&self, input: ClientInput) -> Result<Client, DomainError> {
        let input = input.normalize()?;
        self.ensure_cpf_free(input.cpf.as_deref(), None).await?;

        let id = self.clients.create(&input).await?;
        info!("Client {} created", id);
        self.get(id).await
    }

    pub async fn update(&self, id: EntityId, input: ClientInput) -> Result<Client, DomainError> {
        let input = input.normalize()?;
        self.ensure_cpf_free(input.cpf.as_deref(), Some(id)).await?;

        if !self.clients.update(id, &input).await? {
            return Err(DomainError::not_found("client", id));
        }
        self.get(id).await
    }

    pub async fn delete(&self, id: EntityId) -> Result<(), DomainError> {
        if !self.clients.delete(id).await? {
            return Err(DomainError::not_found("client", id));
        }
        info!("Client {} deleted", id);
        Ok(())
    }

    async fn ensure_cpf_free(&self, cpf: Option<&str>, current: Option<EntityId>) -> Result<(), DomainError> {
        let Some(cpf) = cpf else { return Ok(()) };
        match self.clients.find_by_cpf(cpf).await? {
            Some(other) if Some(other.id) != current => Err(DomainError::Conflict(format!(
                "a client with CPF {} already exists",
                cpf
            ))),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::MockClientRepository;
    use crate::services::fixtures;
    use mockall::predicate::eq;

    fn input(cpf: Option<&str>) -> ClientInput {
        ClientInput {
            name: "Maria Souza".into(),
            cpf: cpf.map(String::from),
            phone: None,
            email: None,
            birth_date: None,
            address: None,
            notes: None,
        }
    }

    #[tokio::test]
    async fn test_create_with_duplicate_cpf() {
        let mut clients = MockClientRepository::new();
        clients
            .expect_find_by_cpf()
            .withf(|cpf| cpf == "52998224725")
            .returning(|_| Ok(Some(fixtures::client(1))));
        clients.expect_create().never();

        let service = ClientService::new(Arc::new(clients));
        assert!(matches!(
            service.create(input(Some("529.982.247-25"))).await,
            Err(DomainError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn test_create_without_cpf_skips_lookup() {
        let mut clients = MockClientRepository::new();
        clients.expect_find_by_cpf().never();
        clients.expect_create().times(1).returning(|_| Ok(4));
        clients
            .expect_find_by_id()
            .with(eq(4))
            .returning(|id| Ok(Some(fixtures::client(id))));

        let service = ClientService::new(Arc::new(clients));
        assert_eq!(service.create(input(None)).await.unwrap().id, 4);
    }

    #[tokio::test]
    async fn test_update_keeps_own_cpf() {
        let mut clients = MockClientRepository::new();
        clients.expect_find_by_cpf().returning(|_| Ok(Some(fixtures::client(4))));
        clients.expect_update().with(eq(4), mockall::predicate::always()).returning(|_, _| Ok(true));
        clients.expect_find_by_id().returning(|id| Ok(Some(fixtures::client(id))));

        let service = ClientService::new(Arc::new(clients));
        assert!(service.update(4, input(Some("52998224725"))).await.is_ok());
    }

    #[tokio::test]
    async fn test_missing_client() {
        let mut clients = MockClientRepository::new();
        clients.expect_find_by_id().returning(|_| Ok(None));
        clients.expect_delete().returning(|_| Ok(false));
        clients.expect_update().returning(|_, _| Ok(false));

        let service = ClientService::new(Arc::new(clients));
        assert!(matches!(service.get(9).await, Err(DomainError::NotFound(_))));
        assert!(matches!(service.delete(9).await, Err(DomainError::NotFound(_))));
        assert!(matches!(service.update(9, input(None)).await, Err(DomainError::NotFound(_))));
    }
}
