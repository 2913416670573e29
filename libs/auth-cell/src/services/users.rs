use std::collections::BTreeMap;

use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use tracing::{debug, info};

use shared_database::AppState;
use shared_models::auth::{Role, User};
use shared_utils::pagination::{Paginated, Pagination};
use shared_utils::password::hash_password;

use crate::models::{AuthError, NewUser, UpdateUserRequest};

const USER_COLUMNS: &str =
    "id, email, password_hash, first_name, last_name, phone, role, is_active, created_at, updated_at";

pub struct UserService {
    db: SqlitePool,
}

impl UserService {
    pub fn new(state: &AppState) -> Self {
        Self { db: state.db.clone() }
    }

    pub async fn create(&self, input: NewUser) -> Result<User, AuthError> {
        let password_hash = hash_password(&input.password)?;
        let mut conn = self.db.acquire().await?;
        let user = Self::insert(&mut conn, &input, &password_hash).await?;
        info!("User {} created with role {}", user.id, user.role);
        Ok(user)
    }

    pub(crate) async fn insert(
        conn: &mut SqliteConnection,
        input: &NewUser,
        password_hash: &str,
    ) -> Result<User, AuthError> {
        let now = Utc::now();
        let user = sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (email, password_hash, first_name, last_name, phone, role, is_active, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, 1, ?, ?) RETURNING {}",
            USER_COLUMNS
        ))
        .bind(&input.email)
        .bind(password_hash)
        .bind(&input.first_name)
        .bind(&input.last_name)
        .bind(&input.phone)
        .bind(input.role)
        .bind(now)
        .bind(now)
        .fetch_one(&mut *conn)
        .await?;

        Ok(user)
    }

    pub async fn get(&self, id: i64) -> Result<User, AuthError> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE id = ? AND deleted_at IS NULL",
            USER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?
        .ok_or(AuthError::UserNotFound)
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, AuthError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE email = ? AND deleted_at IS NULL",
            USER_COLUMNS
        ))
        .bind(email.trim().to_lowercase())
        .fetch_optional(&self.db)
        .await?;

        Ok(user)
    }

    pub async fn list(
        &self,
        role: Option<Role>,
        search: Option<&str>,
        pagination: Pagination,
    ) -> Result<Paginated<User>, AuthError> {
        let pattern = search
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| format!("%{}%", s));

        let mut count_query = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM users WHERE deleted_at IS NULL");
        push_filters(&mut count_query, role, pattern.as_deref());
        let total = count_query.build_query_scalar::<i64>().fetch_one(&self.db).await?;

        let mut query = QueryBuilder::<Sqlite>::new(format!(
            "SELECT {} FROM users WHERE deleted_at IS NULL",
            USER_COLUMNS
        ));
        push_filters(&mut query, role, pattern.as_deref());
        query.push(" ORDER BY last_name, first_name, id LIMIT ");
        query.push_bind(pagination.limit());
        query.push(" OFFSET ");
        query.push_bind(pagination.offset());

        let items = query.build_query_as::<User>().fetch_all(&self.db).await?;
        Ok(Paginated::new(items, total, pagination))
    }

    pub async fn update(&self, id: i64, changes: UpdateUserRequest) -> Result<User, AuthError> {
        debug!("Updating user {}", id);

        let password_hash = changes.password.as_deref().map(hash_password).transpose()?;

        sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET
                email = COALESCE(?, email),
                first_name = COALESCE(?, first_name),
                last_name = COALESCE(?, last_name),
                phone = COALESCE(?, phone),
                role = COALESCE(?, role),
                is_active = COALESCE(?, is_active),
                password_hash = COALESCE(?, password_hash),
                updated_at = ?
             WHERE id = ? AND deleted_at IS NULL
             RETURNING {}",
            USER_COLUMNS
        ))
        .bind(changes.email)
        .bind(changes.first_name)
        .bind(changes.last_name)
        .bind(changes.phone)
        .bind(changes.role)
        .bind(changes.is_active)
        .bind(password_hash)
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(&self.db)
        .await?
        .ok_or(AuthError::UserNotFound)
    }

    pub async fn set_password_hash(&self, id: i64, password_hash: &str) -> Result<(), AuthError> {
        sqlx::query("UPDATE users SET password_hash = ?, updated_at = ? WHERE id = ? AND deleted_at IS NULL")
            .bind(password_hash)
            .bind(Utc::now())
            .bind(id)
            .execute(&self.db)
            .await?;
        Ok(())
    }

    /// Soft delete; the acting user cannot remove their own account.
    pub async fn soft_delete(&self, id: i64, acting_user_id: i64) -> Result<(), AuthError> {
        if id == acting_user_id {
            return Err(AuthError::SelfDeletion);
        }

        let result = sqlx::query(
            "UPDATE users SET deleted_at = ?, is_active = 0, updated_at = ? WHERE id = ? AND deleted_at IS NULL",
        )
        .bind(Utc::now())
        .bind(Utc::now())
        .bind(id)
        .execute(&self.db)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AuthError::UserNotFound);
        }

        info!("User {} deleted by {}", id, acting_user_id);
        Ok(())
    }

    /// Live user counts keyed by role; every role is present.
    pub async fn count_by_role(&self) -> Result<BTreeMap<String, i64>, AuthError> {
        let rows: Vec<(Role, i64)> =
            sqlx::query_as("SELECT role, COUNT(*) FROM users WHERE deleted_at IS NULL GROUP BY role")
                .fetch_all(&self.db)
                .await?;

        let mut counts: BTreeMap<String, i64> =
            Role::ALL.iter().map(|role| (role.as_str().to_string(), 0)).collect();
        for (role, count) in rows {
            counts.insert(role.as_str().to_string(), count);
        }
        Ok(counts)
    }

    pub async fn admin_exists(&self) -> Result<bool, AuthError> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM users WHERE role = 'administrator' AND deleted_at IS NULL",
        )
        .fetch_one(&self.db)
        .await?;
        Ok(count > 0)
    }
}

fn push_filters(query: &mut QueryBuilder<'_, Sqlite>, role: Option<Role>, pattern: Option<&str>) {
    if let Some(role) = role {
        query.push(" AND role = ").push_bind(role);
    }
    if let Some(pattern) = pattern {
        let pattern = pattern.to_string();
        query
            .push(" AND (email LIKE ")
            .push_bind(pattern.clone())
            .push(" OR first_name LIKE ")
            .push_bind(pattern.clone())
            .push(" OR last_name LIKE ")
            .push_bind(pattern)
            .push(")");
    }
}
