// ============================================================================
// Otica Infrastructure - MySQL User Repository
// File: crates/otica-infrastructure/src/database/mysql/user_repo_impl.rs
// ============================================================================

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, MySql, MySqlConnection, MySqlPool, QueryBuilder};
use tracing::info;

use otica_core::domain::{ListQuery, NewUser, User, UserAssociations, UserUpdate};
use otica_core::error::DomainError;
use otica_core::repositories::UserRepository;
use otica_shared::{EntityId, Page};

use super::support::{db_error, like_pattern, push_id_list, push_page, write_error};

const USER_COLUMNS: &str =
    "id, name, email, password_hash, active, last_login_at, created_at, updated_at";

const EMAIL_TAKEN: &str = "email is already in use";

pub struct MySqlUserRepository {
    pool: MySqlPool,
}

impl MySqlUserRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    /// Fills roles, sectors and companies for every user with one query per join table
    async fn load_associations(&self, users: &mut [User]) -> Result<(), DomainError> {
        if users.is_empty() {
            return Ok(());
        }
        let ids: Vec<i64> = users.iter().map(|u| u.id).collect();

        let mut roles = QueryBuilder::<MySql>::new(
            "SELECT ur.user_id, ur.role_id, r.name FROM user_roles ur \
             JOIN roles r ON r.id = ur.role_id WHERE ur.user_id IN ",
        );
        push_id_list(&mut roles, &ids);
        roles.push(" ORDER BY r.name");
        let role_rows: Vec<(i64, i64, String)> = roles
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("loading user roles"))?;

        let sector_rows = self.load_links("user_sectors", "sector_id", &ids).await?;
        let company_rows = self.load_links("user_companies", "company_id", &ids).await?;

        let mut by_user: HashMap<i64, &mut User> = users.iter_mut().map(|u| (u.id, u)).collect();
        for (user_id, role_id, name) in role_rows {
            if let Some(user) = by_user.get_mut(&user_id) {
                user.role_ids.push(role_id);
                user.roles.push(name);
            }
        }
        for (user_id, sector_id) in sector_rows {
            if let Some(user) = by_user.get_mut(&user_id) {
                user.sector_ids.push(sector_id);
            }
        }
        for (user_id, company_id) in company_rows {
            if let Some(user) = by_user.get_mut(&user_id) {
                user.company_ids.push(company_id);
            }
        }
        Ok(())
    }

    async fn load_links(
        &self,
        table: &'static str,
        column: &'static str,
        user_ids: &[i64],
    ) -> Result<Vec<(i64, i64)>, DomainError> {
        let mut builder = QueryBuilder::<MySql>::new(format!(
            "SELECT user_id, {column} FROM {table} WHERE user_id IN "
        ));
        push_id_list(&mut builder, user_ids);
        builder.push(format!(" ORDER BY {column}"));
        builder
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("loading user associations"))
    }

    async fn with_associations(&self, row: Option<UserRow>) -> Result<Option<User>, DomainError> {
        let Some(row) = row else { return Ok(None) };
        let mut users = vec![User::from(row)];
        self.load_associations(&mut users).await?;
        Ok(users.pop())
    }
}

#[derive(Debug, FromRow)]
struct UserRow {
    id: i64,
    name: String,
    email: String,
    password_hash: String,
    active: bool,
    last_login_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            name: row.name,
            email: row.email,
            password_hash: row.password_hash,
            active: row.active,
            last_login_at: row.last_login_at,
            roles: Vec::new(),
            role_ids: Vec::new(),
            sector_ids: Vec::new(),
            company_ids: Vec::new(),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Replaces the join rows of `user_id` with `associations`
async fn replace_associations(
    conn: &mut MySqlConnection,
    user_id: EntityId,
    associations: &UserAssociations,
) -> Result<(), DomainError> {
    let links: [(&str, &str, &[EntityId]); 3] = [
        ("user_roles", "role_id", &associations.role_ids),
        ("user_sectors", "sector_id", &associations.sector_ids),
        ("user_companies", "company_id", &associations.company_ids),
    ];

    for (table, column, ids) in links {
        sqlx::query(&format!("DELETE FROM {table} WHERE user_id = ?"))
            .bind(user_id)
            .execute(&mut *conn)
            .await
            .map_err(db_error("clearing user associations"))?;

        if ids.is_empty() {
            continue;
        }
        let mut insert = QueryBuilder::<MySql>::new(format!("INSERT INTO {table} (user_id, {column}) "));
        insert.push_values(ids.iter(), |mut row, id| {
            row.push_bind(user_id).push_bind(*id);
        });
        insert
            .build()
            .execute(&mut *conn)
            .await
            .map_err(write_error("saving user associations", "duplicate user association"))?;
    }
    Ok(())
}

#[async_trait]
impl UserRepository for MySqlUserRepository {
    async fn list(&self, query: &ListQuery) -> Result<Page<User>, DomainError> {
        let pagination = query.pagination();
        let pattern = query.search().map(like_pattern);

        let mut count = QueryBuilder::<MySql>::new("SELECT COUNT(*) FROM users WHERE deleted_at IS NULL");
        let mut select = QueryBuilder::<MySql>::new(format!(
            "SELECT {} FROM users WHERE deleted_at IS NULL",
            USER_COLUMNS
        ));
        if let Some(pattern) = &pattern {
            for builder in [&mut count, &mut select] {
                builder
                    .push(" AND (name LIKE ")
                    .push_bind(pattern.clone())
                    .push(" OR email LIKE ")
                    .push_bind(pattern.clone())
                    .push(")");
            }
        }

        let total: i64 = count
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(db_error("counting users"))?;

        select.push(" ORDER BY name, id");
        push_page(&mut select, pagination);
        let rows: Vec<UserRow> = select
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("listing users"))?;

        let mut users: Vec<User> = rows.into_iter().map(User::from).collect();
        self.load_associations(&mut users).await?;
        Ok(Page::new(users, total, pagination))
    }

    async fn find_by_id(&self, id: EntityId) -> Result<Option<User>, DomainError> {
        let row: Option<UserRow> = sqlx::query_as(&format!(
            "SELECT {} FROM users WHERE id = ? AND deleted_at IS NULL",
            USER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("finding user by id"))?;

        self.with_associations(row).await
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DomainError> {
        let row: Option<UserRow> = sqlx::query_as(&format!(
            "SELECT {} FROM users WHERE LOWER(email) = LOWER(?) AND deleted_at IS NULL",
            USER_COLUMNS
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("finding user by email"))?;

        self.with_associations(row).await
    }

    async fn count(&self) -> Result<i64, DomainError> {
        sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE deleted_at IS NULL")
            .fetch_one(&self.pool)
            .await
            .map_err(db_error("counting users"))
    }

    async fn create(&self, user: &NewUser) -> Result<EntityId, DomainError> {
        let mut tx = self.pool.begin().await.map_err(db_error("starting user creation"))?;

        let result = sqlx::query(
            "INSERT INTO users (name, email, password_hash, active) VALUES (?, ?, ?, ?)",
        )
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.active)
        .execute(&mut *tx)
        .await
        .map_err(write_error("creating user", EMAIL_TAKEN))?;
        let id = result.last_insert_id() as EntityId;

        replace_associations(&mut tx, id, &user.associations).await?;

        tx.commit().await.map_err(db_error("committing user creation"))?;
        info!("User {} created", id);
        Ok(id)
    }

    async fn update(&self, id: EntityId, user: &UserUpdate) -> Result<bool, DomainError> {
        let mut tx = self.pool.begin().await.map_err(db_error("starting user update"))?;

        let exists: Option<i64> =
            sqlx::query_scalar("SELECT id FROM users WHERE id = ? AND deleted_at IS NULL FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await
                .map_err(db_error("locking user"))?;
        if exists.is_none() {
            return Ok(false);
        }

        sqlx::query(
            r#"
            UPDATE users
            SET name = ?, email = ?, password_hash = COALESCE(?, password_hash), active = ?
            WHERE id = ?
            "#,
        )
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.active)
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(write_error("updating user", EMAIL_TAKEN))?;

        replace_associations(&mut tx, id, &user.associations).await?;

        // A deactivated user keeps no live sessions
        if !user.active {
            sqlx::query("UPDATE refresh_tokens SET revoked_at = NOW() WHERE user_id = ? AND revoked_at IS NULL")
                .bind(id)
                .execute(&mut *tx)
                .await
                .map_err(db_error("revoking refresh tokens"))?;
        }

        tx.commit().await.map_err(db_error("committing user update"))?;
        Ok(true)
    }

    async fn delete(&self, id: EntityId) -> Result<bool, DomainError> {
        let mut tx = self.pool.begin().await.map_err(db_error("starting user deletion"))?;

        let result = sqlx::query("UPDATE users SET deleted_at = NOW() WHERE id = ? AND deleted_at IS NULL")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(db_error("deleting user"))?;
        if result.rows_affected() == 0 {
            return Ok(false);
        }

        sqlx::query("UPDATE refresh_tokens SET revoked_at = NOW() WHERE user_id = ? AND revoked_at IS NULL")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(db_error("revoking refresh tokens"))?;

        tx.commit().await.map_err(db_error("committing user deletion"))?;
        info!("User {} deleted", id);
        Ok(true)
    }

    async fn record_login(&self, id: EntityId) -> Result<(), DomainError> {
        sqlx::query("UPDATE users SET last_login_at = NOW() WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_error("recording login"))?;
        Ok(())
    }
}
