use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A user row as stored in the database.
///
/// Deliberately not `Serialize`: the password hash must never appear in a
/// response body. Convert to `UserResponse` before returning to a client.
#[derive(Debug, FromRow)]
pub struct User {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// The public shape of a user, returned by signup, login and `/me`.
#[derive(Debug, Serialize, Deserialize, FromRow)]
pub struct UserResponse {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            created_at: user.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_response_drops_password_hash() {
        let user = User {
            id: 7,
            name: "John".to_string(),
            email: "john@example.com".to_string(),
            password_hash: "$2b$12$abcdefghijklmnopqrstuv".to_string(),
            created_at: Utc::now(),
        };

        let response = UserResponse::from(user);
        let json = serde_json::to_value(&response).unwrap();

        assert_eq!(json["name"], "John");
        assert_eq!(json["email"], "john@example.com");
        assert!(json.get("password_hash").is_none());
    }
}
