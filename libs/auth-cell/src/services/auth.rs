use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info, warn};

use patient_cell::{Client, ClientService};
use shared_config::AppConfig;
use shared_database::AppState;
use shared_models::auth::{AuthUser, Role, User};
use shared_utils::extractor::current_user;
use shared_utils::jwt::{create_token, validate_token};
use shared_utils::password::{hash_password, verify_password};

use crate::models::{AuthError, ChangePasswordRequest, NewUser, Registration};
use crate::services::users::UserService;

pub struct AuthService {
    db: SqlitePool,
    config: AppConfig,
    users: UserService,
    clients: ClientService,
}

impl AuthService {
    pub fn new(state: &AppState) -> Self {
        Self {
            db: state.db.clone(),
            config: state.config.clone(),
            users: UserService::new(state),
            clients: ClientService::new(state),
        }
    }

    pub fn issue_token(&self, user: &User) -> Result<String, AuthError> {
        Ok(create_token(
            user.id,
            &user.email,
            user.role,
            &self.config.jwt_secret,
            self.config.jwt_expiration_hours,
        )?)
    }

    pub fn token_lifetime_seconds(&self) -> i64 {
        self.config.jwt_expiration_hours * 3600
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<(String, User), AuthError> {
        debug!("Login attempt for {}", email);

        let user = self
            .users
            .find_by_email(email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if !verify_password(password, &user.password_hash)? {
            warn!("Failed login for user {}", user.id);
            return Err(AuthError::InvalidCredentials);
        }

        if !user.is_active {
            return Err(AuthError::AccountDisabled);
        }

        let token = self.issue_token(&user)?;
        info!("User {} logged in", user.id);
        Ok((token, user))
    }

    /// Creates the patient login and its record in one transaction. A record
    /// created earlier by staff with the same email and no login is claimed
    /// instead of duplicated.
    pub async fn register(&self, registration: Registration) -> Result<(String, User, Client), AuthError> {
        let Registration { password, mut client } = registration;
        let password_hash = hash_password(&password)?;

        let new_user = NewUser {
            email: client.email.clone(),
            password,
            first_name: client.first_name.clone(),
            last_name: client.last_name.clone(),
            phone: Some(client.phone.clone()),
            role: Role::Patient,
        };

        let mut tx = self.db.begin().await?;

        let user = UserService::insert(&mut tx, &new_user, &password_hash).await?;

        let unclaimed: Option<i64> = sqlx::query_scalar(
            "SELECT id FROM clients WHERE email = ? AND user_id IS NULL AND deleted_at IS NULL",
        )
        .bind(&client.email)
        .fetch_optional(&mut *tx)
        .await?;

        let client_id = match unclaimed {
            Some(client_id) => {
                sqlx::query("UPDATE clients SET user_id = ?, updated_at = ? WHERE id = ?")
                    .bind(user.id)
                    .bind(Utc::now())
                    .bind(client_id)
                    .execute(&mut *tx)
                    .await?;
                debug!("Registration for {} claimed patient record {}", user.id, client_id);
                client_id
            }
            None => {
                client.user_id = Some(user.id);
                ClientService::insert(&mut tx, &client).await?.id
            }
        };

        tx.commit().await?;

        let client = self.clients.get(client_id).await?;
        let token = self.issue_token(&user)?;

        info!("Patient {} registered", user.id);
        Ok((token, user, client))
    }

    /// Never fails: any decoding problem just reports `false`.
    pub async fn verify(&self, token: &str) -> Option<AuthUser> {
        let claims = validate_token(token, &self.config.jwt_secret).ok()?;
        current_user(&self.db, claims).await.ok()
    }

    pub async fn change_password(
        &self,
        user_id: i64,
        request: &ChangePasswordRequest,
    ) -> Result<(), AuthError> {
        let user = self.users.get(user_id).await?;

        if !verify_password(&request.current_password, &user.password_hash)? {
            return Err(AuthError::WrongPassword);
        }

        let password_hash = hash_password(&request.new_password)?;
        self.users.set_password_hash(user_id, &password_hash).await?;

        info!("Password changed for user {}", user_id);
        Ok(())
    }

    /// Creates the configured administrator when none exists yet.
    pub async fn bootstrap_admin(&self) -> Result<Option<User>, AuthError> {
        let Some((email, password)) = self.config.admin_bootstrap() else {
            debug!("No bootstrap administrator configured");
            return Ok(None);
        };

        if self.users.admin_exists().await? {
            return Ok(None);
        }

        let admin = self
            .users
            .create(NewUser {
                email: email.trim().to_lowercase(),
                password: password.to_string(),
                first_name: "Admin".to_string(),
                last_name: "MRMS".to_string(),
                phone: None,
                role: Role::Administrator,
            })
            .await?;

        info!("Bootstrap administrator {} created", admin.email);
        Ok(Some(admin))
    }
}
