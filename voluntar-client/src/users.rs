//! Account operations

use serde::Deserialize;
use serde_json::json;
use voluntar_core::domain::user::User;
use voluntar_core::dto::user::{CreateUser, LoginResponse, UserSummary};

use crate::VoluntarClient;
use crate::error::{ClientError, Result};

/// Cache key for the user list
pub const USERS_CACHE_KEY: &str = "users_list";

const USER_FIELDS: &str = "id name email role created_at: createdAt";

#[derive(Debug, Deserialize)]
struct LoginPayload {
    ok: bool,
    message: String,
    token: Option<String>,
    user: Option<User>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Ack {
    pub message: String,
}

impl VoluntarClient {
    // =============================================================================
    // Session
    // =============================================================================

    /// Log in and keep the token for later calls
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginResponse> {
        let query = format!(
            "mutation Login($email: String!, $password: String!) {{ \
             login(email: $email, password: $password) {{ ok message token user {{ {} }} }} }}",
            USER_FIELDS
        );

        let payload: LoginPayload = self
            .graphql(
                &query,
                json!({ "email": email, "password": password }),
                "login",
            )
            .await?;

        let (Some(token), Some(user), true) = (payload.token, payload.user, payload.ok) else {
            return Err(ClientError::LoginFailed(payload.message));
        };

        let user = UserSummary::from(user);

        {
            let mut session = self.session.write().await;
            session.token = Some(token.clone());
            session.user = Some(user.clone());
        }
        self.cache.lock().await.clear();

        tracing::info!("Logged in as {} ({})", user.email, user.role);

        Ok(LoginResponse { token, user })
    }

    /// Forget the token, the user and everything cached
    pub async fn logout(&self) {
        {
            let mut session = self.session.write().await;
            session.token = None;
            session.user = None;
        }
        self.cache.lock().await.clear();
    }

    /// The user logged in through [`VoluntarClient::login`], if any
    pub async fn current_user(&self) -> Option<UserSummary> {
        self.session.read().await.user.clone()
    }

    pub(crate) async fn require_token(&self) -> Result<()> {
        match self.token().await {
            Some(_) => Ok(()),
            None => Err(ClientError::NotLoggedIn),
        }
    }

    // =============================================================================
    // Users
    // =============================================================================

    /// Users visible to the caller (cached)
    pub async fn users(&self) -> Result<Vec<User>> {
        self.require_token().await?;

        let query = format!("query {{ users {{ {} }} }}", USER_FIELDS);

        self.cached(USERS_CACHE_KEY, || self.graphql(&query, json!({}), "users"))
            .await
    }

    pub async fn user(&self, email: &str) -> Result<User> {
        self.require_token().await?;

        let query = format!(
            "query User($email: String!) {{ user(email: $email) {{ {} }} }}",
            USER_FIELDS
        );

        self.graphql(&query, json!({ "email": email }), "user").await
    }

    /// Register an account; an admin token is needed to create an admin
    pub async fn create_user(&self, req: CreateUser) -> Result<User> {
        let query = format!(
            "mutation CreateUser($input: CreateUserInput!) {{ createUser(input: $input) {{ {} }} }}",
            USER_FIELDS
        );

        let mut input = json!({
            "name": req.name,
            "email": req.email,
            "password": req.password,
        });
        if let Some(role) = req.role {
            input["role"] = json!(role.as_str().to_uppercase());
        }

        let user = self
            .graphql(&query, json!({ "input": input }), "createUser")
            .await?;

        self.invalidate("users").await;

        Ok(user)
    }

    pub async fn delete_user(&self, email: &str) -> Result<String> {
        self.require_token().await?;

        let ack: Ack = self
            .graphql(
                "mutation DeleteUser($email: String!) { deleteUser(email: $email) { message } }",
                json!({ "email": email }),
                "deleteUser",
            )
            .await?;

        self.invalidate("users").await;

        Ok(ack.message)
    }
}
