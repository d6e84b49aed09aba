use anyhow::{Result, anyhow};

use sponda_protocol::{RoomSummary, User};

/// Thin wrappers over the marketplace REST API.
///
/// Only the two calls the realtime subsystem needs live here: the profile
/// fetch that re-triggers session binding, and the room listing that seeds
/// the chat screen.
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    /// Fetch the authenticated user's profile.
    pub async fn fetch_profile(&self, token: &str) -> Result<User> {
        let response = self
            .http
            .get(format!("{}/users/me", self.base_url))
            .bearer_auth(token)
            .send()
            .await?;
        let text = response.text().await?;
        let json: serde_json::Value = serde_json::from_str(&text)?;

        let field = |name: &str| -> Result<String> {
            json.get(name)
                .and_then(|v| v.as_str())
                .map(str::to_string)
                .ok_or_else(|| anyhow!("Profile response missing {}", name))
        };

        Ok(User {
            id: field("id")?,
            username: field("username")?,
            first_name: field("first_name")?,
            last_name: field("last_name")?,
        })
    }

    /// List the rooms the user is a member of.
    pub async fn fetch_rooms(&self, token: &str, user_id: &str) -> Result<Vec<RoomSummary>> {
        let rooms = self
            .http
            .get(format!("{}/users/{}/rooms", self.base_url, user_id))
            .bearer_auth(token)
            .send()
            .await?
            .json()
            .await?;
        Ok(rooms)
    }
}
