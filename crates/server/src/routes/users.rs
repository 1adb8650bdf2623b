//! User listing endpoints.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::get,
};
use serde::{Deserialize, Serialize};

use shopchat_core::UserId;

use crate::db::users::DEFAULT_USER_PAGE_SIZE;
use crate::error::AppError;
use crate::models::User;
use crate::state::AppState;

use super::conversations::ConversationResponse;

/// Build the users router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users))
        .route("/users/{user_id}/conversations", get(list_conversations))
}

/// Pagination for user listings.
#[derive(Debug, Deserialize)]
pub struct Pagination {
    #[serde(default)]
    pub skip: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

const fn default_limit() -> i64 {
    DEFAULT_USER_PAGE_SIZE
}

/// Response for a user.
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: i32,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub age: Option<i32>,
    pub gender: Option<String>,
    pub state: Option<String>,
    pub street_address: Option<String>,
    pub postal_code: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub traffic_source: Option<String>,
    pub created_at: Option<String>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id.as_i32(),
            first_name: user.first_name,
            last_name: user.last_name,
            email: user.email,
            age: user.age,
            gender: user.gender,
            state: user.state,
            street_address: user.street_address,
            postal_code: user.postal_code,
            city: user.city,
            country: user.country,
            latitude: user.latitude,
            longitude: user.longitude,
            traffic_source: user.traffic_source,
            created_at: user.created_at.map(|t| t.to_rfc3339()),
        }
    }
}

/// List users.
///
/// GET /users?skip=0&limit=100
async fn list_users(
    State(state): State<AppState>,
    Query(page): Query<Pagination>,
) -> Result<Json<Vec<UserResponse>>, AppError> {
    let users = state.chat().list_users(page.skip, page.limit).await?;
    Ok(Json(users.into_iter().map(Into::into).collect()))
}

/// List a user's conversations, most recent first.
///
/// GET /users/{user_id}/conversations
async fn list_conversations(
    State(state): State<AppState>,
    Path(user_id): Path<i32>,
) -> Result<Json<Vec<ConversationResponse>>, AppError> {
    let conversations = state
        .chat()
        .list_conversations(UserId::new(user_id))
        .await?;
    Ok(Json(conversations.into_iter().map(Into::into).collect()))
}
