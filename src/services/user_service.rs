//! User service - Handles user-related business logic.

use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::{CreateUser, NewUser, Password, UpdateUser, User, UserChanges};
use crate::errors::{AppError, AppResult, OptionExt};
use crate::infra::UserRepository;

fn not_found(id: Uuid) -> String {
    format!("Usuário com ID {} não encontrado", id)
}

fn email_taken(email: &str) -> AppError {
    AppError::conflict(format!("Email {} já está sendo usado", email))
}

/// User service trait for dependency injection.
#[async_trait]
pub trait UserService: Send + Sync {
    /// List every user
    async fn find_all(&self) -> AppResult<Vec<User>>;

    /// List active users only
    async fn find_all_active(&self) -> AppResult<Vec<User>>;

    /// Get user by ID
    async fn find_one(&self, id: Uuid) -> AppResult<User>;

    /// Get user by ID, only if active
    async fn find_active_by_id(&self, id: Uuid) -> AppResult<User>;

    /// Get user by email
    async fn find_by_email(&self, email: &str) -> AppResult<User>;

    /// Register a new user; the email must be unused
    async fn create(&self, input: CreateUser) -> AppResult<User>;

    /// Partially update a user
    async fn update(&self, id: Uuid, input: UpdateUser) -> AppResult<User>;

    /// Permanently delete a user
    async fn remove(&self, id: Uuid) -> AppResult<()>;

    /// Mark a user inactive
    async fn deactivate(&self, id: Uuid) -> AppResult<User>;
}

/// Concrete implementation of UserService using repository.
pub struct UserManager {
    repo: Arc<dyn UserRepository>,
}

impl UserManager {
    pub fn new(repo: Arc<dyn UserRepository>) -> Self {
        Self { repo }
    }
}

#[async_trait]
impl UserService for UserManager {
    async fn find_all(&self) -> AppResult<Vec<User>> {
        self.repo.list().await
    }

    async fn find_all_active(&self) -> AppResult<Vec<User>> {
        self.repo.list_active().await
    }

    async fn find_one(&self, id: Uuid) -> AppResult<User> {
        self.repo.find_by_id(id).await?.ok_or_not_found(not_found(id))
    }

    async fn find_active_by_id(&self, id: Uuid) -> AppResult<User> {
        self.repo
            .find_active_by_id(id)
            .await?
            .ok_or_not_found(format!("Usuário ativo com ID {} não encontrado", id))
    }

    async fn find_by_email(&self, email: &str) -> AppResult<User> {
        self.repo
            .find_by_email(email)
            .await?
            .ok_or_not_found(format!("Usuário com email {} não encontrado", email))
    }

    async fn create(&self, input: CreateUser) -> AppResult<User> {
        if self.repo.find_by_email(&input.email).await?.is_some() {
            return Err(email_taken(&input.email));
        }

        let password = Password::new(&input.password)?;
        let user = self
            .repo
            .create(NewUser {
                name: input.name,
                email: input.email,
                password_hash: password.into(),
            })
            .await?;

        tracing::info!(user_id = %user.id, "User created");
        Ok(user)
    }

    async fn update(&self, id: Uuid, input: UpdateUser) -> AppResult<User> {
        let current = self.find_one(id).await?;

        if let Some(email) = input.email.as_deref() {
            if let Some(owner) = self.repo.find_by_email(email).await? {
                if owner.id != id {
                    return Err(email_taken(email));
                }
            }
        }

        let password_hash = match input.password.as_deref() {
            Some(plain) => Some(Password::new(plain)?.into()),
            None => None,
        };

        let changes = UserChanges {
            name: input.name,
            email: input.email,
            password_hash,
            is_active: None,
        };

        if changes.is_empty() {
            return Ok(current);
        }

        self.repo.update(id, changes).await
    }

    async fn remove(&self, id: Uuid) -> AppResult<()> {
        if self.repo.delete(id).await? == 0 {
            return Err(AppError::not_found(not_found(id)));
        }

        tracing::info!(user_id = %id, "User removed");
        Ok(())
    }

    async fn deactivate(&self, id: Uuid) -> AppResult<User> {
        self.find_one(id).await?;
        self.repo.update(id, UserChanges::deactivate()).await
    }
}
