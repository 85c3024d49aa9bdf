use std::sync::Arc;

use async_trait::async_trait;
use auth::AuthenticationError;
use auth::Authenticator;
use chrono::Utc;

use crate::domain::user::models::AuthenticateCommand;
use crate::domain::user::models::AuthenticatedSession;
use crate::domain::user::models::CreateUserCommand;
use crate::domain::user::models::EmailAddress;
use crate::domain::user::models::UpdateUserCommand;
use crate::domain::user::models::User;
use crate::domain::user::models::UserId;
use crate::user::errors::UserError;
use crate::user::ports::UserRepository;
use crate::user::ports::UserServicePort;

/// Domain service implementation for user operations.
///
/// Orchestrates the repository and the authenticator: registration and
/// updates hash passwords, login verifies them and issues tokens.
pub struct UserService<UR>
where
    UR: UserRepository,
{
    repository: Arc<UR>,
    authenticator: Arc<Authenticator>,
}

impl<UR> UserService<UR>
where
    UR: UserRepository,
{
    /// Create a new user service with injected dependencies.
    ///
    /// # Arguments
    /// * `repository` - User persistence implementation
    /// * `authenticator` - Password hashing and token issuance
    pub fn new(repository: Arc<UR>, authenticator: Arc<Authenticator>) -> Self {
        Self {
            repository,
            authenticator,
        }
    }

    async fn ensure_email_available(
        &self,
        email: &EmailAddress,
        owner: Option<&UserId>,
    ) -> Result<(), UserError> {
        match self.repository.find_by_email(email).await? {
            Some(existing) if Some(&existing.id) != owner => {
                Err(UserError::EmailAlreadyExists(email.to_string()))
            }
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl<UR> UserServicePort for UserService<UR>
where
    UR: UserRepository,
{
    async fn register(&self, command: CreateUserCommand) -> Result<User, UserError> {
        if let Err(e) = self.ensure_email_available(&command.email, None).await {
            tracing::warn!(email = %command.email, "Registration rejected: email already exists");
            return Err(e);
        }

        let password_hash = self
            .authenticator
            .hash_password(command.password.as_str())?;

        let user = User {
            id: UserId::new(),
            name: command.name,
            email: command.email,
            password_hash,
            enabled: true,
            created_at: Utc::now(),
        };

        let created_user = self.repository.create(user).await?;
        tracing::info!(user_id = %created_user.id, email = %created_user.email, "User registered");

        Ok(created_user)
    }

    async fn authenticate(
        &self,
        command: AuthenticateCommand,
    ) -> Result<AuthenticatedSession, UserError> {
        let Some(user) = self.repository.find_by_email(&command.email).await? else {
            tracing::warn!(email = %command.email, "Login rejected: unknown email");
            self.authenticator.reject(&command.password);
            return Err(UserError::InvalidCredentials);
        };

        if !user.enabled {
            tracing::warn!(user_id = %user.id, "Login rejected: account disabled");
            self.authenticator.reject(&command.password);
            return Err(UserError::InvalidCredentials);
        }

        let result = self
            .authenticator
            .authenticate(&command.password, &user.password_hash, user.email.as_str())
            .map_err(|e| match e {
                AuthenticationError::InvalidCredentials => {
                    tracing::warn!(user_id = %user.id, "Login rejected: wrong password");
                    UserError::InvalidCredentials
                }
                AuthenticationError::TokenError(err) => UserError::Token(err),
            })?;

        tracing::info!(user_id = %user.id, "User authenticated");

        Ok(AuthenticatedSession {
            user,
            token: result.access_token,
        })
    }

    async fn get_user(&self, id: &UserId) -> Result<User, UserError> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or(UserError::NotFound(id.to_string()))
    }

    async fn get_user_by_email(&self, email: &EmailAddress) -> Result<User, UserError> {
        self.repository
            .find_by_email(email)
            .await?
            .ok_or(UserError::NotFoundByEmail(email.to_string()))
    }

    async fn list_users(&self) -> Result<Vec<User>, UserError> {
        self.repository.list_all().await
    }

    async fn update_user(
        &self,
        id: &UserId,
        command: UpdateUserCommand,
    ) -> Result<User, UserError> {
        let mut user = self
            .repository
            .find_by_id(id)
            .await?
            .ok_or(UserError::NotFound(id.to_string()))?;

        if let Some(new_email) = command.email {
            if new_email != user.email {
                self.ensure_email_available(&new_email, Some(&user.id))
                    .await?;
            }
            user.email = new_email;
        }

        if let Some(new_name) = command.name {
            user.name = new_name;
        }

        if let Some(enabled) = command.enabled {
            user.enabled = enabled;
        }

        if let Some(new_password) = command.password {
            user.password_hash = self.authenticator.hash_password(new_password.as_str())?;
        }

        let updated_user = self.repository.update(user).await?;
        tracing::info!(user_id = %updated_user.id, "User updated");

        Ok(updated_user)
    }

    async fn delete_user(&self, id: &UserId) -> Result<(), UserError> {
        self.repository.delete(id).await?;
        tracing::info!(user_id = %id, "User deleted");

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use auth::PasswordHasher;
    use auth::TokenService;
    use mockall::mock;

    use super::*;
    use crate::domain::user::models::Password;
    use crate::domain::user::models::PersonName;

    const SECRET: &str = "c3VwZXItc2VjcmV0LXNpZ25pbmcta2V5LWZvci10ZXN0cy0zMi1ieXRlcw==";

    mock! {
        pub TestUserRepository {}

        #[async_trait]
        impl UserRepository for TestUserRepository {
            async fn create(&self, user: User) -> Result<User, UserError>;
            async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserError>;
            async fn find_by_email(&self, email: &EmailAddress) -> Result<Option<User>, UserError>;
            async fn list_all(&self) -> Result<Vec<User>, UserError>;
            async fn update(&self, user: User) -> Result<User, UserError>;
            async fn delete(&self, id: &UserId) -> Result<(), UserError>;
        }
    }

    fn authenticator() -> Arc<Authenticator> {
        Arc::new(Authenticator::new(
            PasswordHasher::with_params(1024, 1, 1).unwrap(),
            TokenService::from_base64_secret(SECRET).unwrap(),
        ))
    }

    fn service(repository: MockTestUserRepository) -> UserService<MockTestUserRepository> {
        UserService::new(Arc::new(repository), authenticator())
    }

    fn email(value: &str) -> EmailAddress {
        EmailAddress::new(value.to_string()).unwrap()
    }

    fn stored_user(address: &str, password: &str) -> User {
        User {
            id: UserId::new(),
            name: PersonName::new("Test User".to_string()).unwrap(),
            email: email(address),
            password_hash: authenticator().hash_password(password).unwrap(),
            enabled: true,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_register_success() {
        let mut repository = MockTestUserRepository::new();

        repository
            .expect_find_by_email()
            .times(1)
            .returning(|_| Ok(None));
        repository
            .expect_create()
            .withf(|user| {
                user.email.as_str() == "a@x.com"
                    && user.enabled
                    && user.password_hash.starts_with("$argon2")
                    && user.password_hash != "password123"
            })
            .times(1)
            .returning(|user| Ok(user));

        let command = CreateUserCommand::new(
            PersonName::new("Alice".to_string()).unwrap(),
            email("a@x.com"),
            Password::new("password123".to_string()).unwrap(),
        );

        let user = service(repository).register(command).await.unwrap();
        assert_eq!(user.email.as_str(), "a@x.com");
        assert_eq!(user.name.as_str(), "Alice");
    }

    #[tokio::test]
    async fn test_register_duplicate_email() {
        let mut repository = MockTestUserRepository::new();
        let existing = stored_user("a@x.com", "password123");

        repository
            .expect_find_by_email()
            .times(1)
            .returning(move |_| Ok(Some(existing.clone())));
        repository.expect_create().times(0);

        let command = CreateUserCommand::new(
            PersonName::new("Alice".to_string()).unwrap(),
            email("a@x.com"),
            Password::new("other1234".to_string()).unwrap(),
        );

        let result = service(repository).register(command).await;
        assert!(matches!(result, Err(UserError::EmailAlreadyExists(_))));
    }

    #[tokio::test]
    async fn test_authenticate_success() {
        let mut repository = MockTestUserRepository::new();
        let user = stored_user("a@x.com", "password123");

        repository
            .expect_find_by_email()
            .withf(|e| e.as_str() == "a@x.com")
            .times(1)
            .returning(move |_| Ok(Some(user.clone())));

        let session = service(repository)
            .authenticate(AuthenticateCommand {
                email: email("a@x.com"),
                password: "password123".to_string(),
            })
            .await
            .unwrap();

        let tokens = TokenService::from_base64_secret(SECRET).unwrap();
        assert!(!session.token.is_empty());
        assert!(tokens.validate(&session.token, "a@x.com"));
        assert!(!tokens.is_expired(&session.token).unwrap());
        assert_eq!(session.user.email.as_str(), "a@x.com");
    }

    #[tokio::test]
    async fn test_authenticate_wrong_password() {
        let mut repository = MockTestUserRepository::new();
        let user = stored_user("a@x.com", "password123");

        repository
            .expect_find_by_email()
            .times(1)
            .returning(move |_| Ok(Some(user.clone())));

        let result = service(repository)
            .authenticate(AuthenticateCommand {
                email: email("a@x.com"),
                password: "wrongpass".to_string(),
            })
            .await;

        assert!(matches!(result, Err(UserError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn test_authenticate_unknown_email() {
        let mut repository = MockTestUserRepository::new();

        repository
            .expect_find_by_email()
            .times(1)
            .returning(|_| Ok(None));

        let result = service(repository)
            .authenticate(AuthenticateCommand {
                email: email("nobody@x.com"),
                password: "password123".to_string(),
            })
            .await;

        assert!(matches!(result, Err(UserError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn test_unknown_email_costs_like_wrong_password() {
        let slow = Arc::new(Authenticator::new(
            PasswordHasher::with_params(8 * 1024, 2, 1).unwrap(),
            TokenService::from_base64_secret(SECRET).unwrap(),
        ));
        let mut known = stored_user("a@x.com", "password123");
        known.password_hash = slow.hash_password("password123").unwrap();

        let mut repository = MockTestUserRepository::new();
        repository
            .expect_find_by_email()
            .returning(move |e| Ok((e.as_str() == "a@x.com").then(|| known.clone())));
        let service = UserService::new(Arc::new(repository), slow);

        let started = std::time::Instant::now();
        let wrong_password = service
            .authenticate(AuthenticateCommand {
                email: email("a@x.com"),
                password: "wrongpass".to_string(),
            })
            .await;
        let wrong_password_cost = started.elapsed();

        let started = std::time::Instant::now();
        let unknown_email = service
            .authenticate(AuthenticateCommand {
                email: email("nobody@x.com"),
                password: "wrongpass".to_string(),
            })
            .await;
        let unknown_email_cost = started.elapsed();

        assert!(matches!(wrong_password, Err(UserError::InvalidCredentials)));
        assert!(matches!(unknown_email, Err(UserError::InvalidCredentials)));
        assert!(unknown_email_cost * 4 >= wrong_password_cost);
    }

    #[tokio::test]
    async fn test_authenticate_disabled_account() {
        let mut repository = MockTestUserRepository::new();
        let mut user = stored_user("a@x.com", "password123");
        user.enabled = false;

        repository
            .expect_find_by_email()
            .times(1)
            .returning(move |_| Ok(Some(user.clone())));

        let result = service(repository)
            .authenticate(AuthenticateCommand {
                email: email("a@x.com"),
                password: "password123".to_string(),
            })
            .await;

        assert!(matches!(result, Err(UserError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn test_get_user_not_found() {
        let mut repository = MockTestUserRepository::new();

        repository
            .expect_find_by_id()
            .times(1)
            .returning(|_| Ok(None));

        let result = service(repository).get_user(&UserId::new()).await;
        assert!(matches!(result, Err(UserError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_get_user_by_email_not_found() {
        let mut repository = MockTestUserRepository::new();

        repository
            .expect_find_by_email()
            .times(1)
            .returning(|_| Ok(None));

        let result = service(repository)
            .get_user_by_email(&email("nobody@x.com"))
            .await;
        assert!(matches!(result, Err(UserError::NotFoundByEmail(_))));
    }

    #[tokio::test]
    async fn test_list_users() {
        let mut repository = MockTestUserRepository::new();
        let users = vec![
            stored_user("a@x.com", "password123"),
            stored_user("b@x.com", "password123"),
        ];

        repository
            .expect_list_all()
            .times(1)
            .returning(move || Ok(users.clone()));

        let result = service(repository).list_users().await.unwrap();
        assert_eq!(result.len(), 2);
    }

    #[tokio::test]
    async fn test_update_user_rehashes_new_password() {
        let mut repository = MockTestUserRepository::new();
        let existing = stored_user("a@x.com", "password123");
        let user_id = existing.id;
        let old_hash = existing.password_hash.clone();

        repository
            .expect_find_by_id()
            .withf(move |id| *id == user_id)
            .times(1)
            .returning(move |_| Ok(Some(existing.clone())));
        repository
            .expect_update()
            .withf(move |user| {
                user.password_hash != old_hash && user.password_hash.starts_with("$argon2")
            })
            .times(1)
            .returning(|user| Ok(user));

        let command = UpdateUserCommand {
            password: Some(Password::new("newpassword".to_string()).unwrap()),
            ..Default::default()
        };

        let updated = service(repository)
            .update_user(&user_id, command)
            .await
            .unwrap();
        assert!(authenticator()
            .authenticate("newpassword", &updated.password_hash, "a@x.com")
            .is_ok());
    }

    #[tokio::test]
    async fn test_update_user_keeps_hash_without_password() {
        let mut repository = MockTestUserRepository::new();
        let existing = stored_user("a@x.com", "password123");
        let user_id = existing.id;
        let old_hash = existing.password_hash.clone();

        repository
            .expect_find_by_id()
            .times(1)
            .returning(move |_| Ok(Some(existing.clone())));
        repository
            .expect_update()
            .withf(move |user| user.password_hash == old_hash && user.name.as_str() == "Renamed")
            .times(1)
            .returning(|user| Ok(user));

        let command = UpdateUserCommand {
            name: Some(PersonName::new("Renamed".to_string()).unwrap()),
            ..Default::default()
        };

        let result = service(repository).update_user(&user_id, command).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_update_user_email_taken_by_other_user() {
        let mut repository = MockTestUserRepository::new();
        let existing = stored_user("a@x.com", "password123");
        let other = stored_user("b@x.com", "password123");
        let user_id = existing.id;

        repository
            .expect_find_by_id()
            .times(1)
            .returning(move |_| Ok(Some(existing.clone())));
        repository
            .expect_find_by_email()
            .withf(|e| e.as_str() == "b@x.com")
            .times(1)
            .returning(move |_| Ok(Some(other.clone())));
        repository.expect_update().times(0);

        let command = UpdateUserCommand {
            email: Some(email("b@x.com")),
            ..Default::default()
        };

        let result = service(repository).update_user(&user_id, command).await;
        assert!(matches!(result, Err(UserError::EmailAlreadyExists(_))));
    }

    #[tokio::test]
    async fn test_update_user_not_found() {
        let mut repository = MockTestUserRepository::new();

        repository
            .expect_find_by_id()
            .times(1)
            .returning(|_| Ok(None));

        let command = UpdateUserCommand {
            name: Some(PersonName::new("Renamed".to_string()).unwrap()),
            ..Default::default()
        };

        let result = service(repository)
            .update_user(&UserId::new(), command)
            .await;
        assert!(matches!(result, Err(UserError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_delete_user_not_found() {
        let mut repository = MockTestUserRepository::new();
        let user_id = UserId::new();

        repository
            .expect_delete()
            .times(1)
            .returning(move |_| Err(UserError::NotFound(user_id.to_string())));

        let result = service(repository).delete_user(&user_id).await;
        assert!(matches!(result, Err(UserError::NotFound(_))));
    }
}
