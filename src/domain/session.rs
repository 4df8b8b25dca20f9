use serde::{Deserialize, Serialize};

/// Authenticated user context handed to every workflow component.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    #[serde(rename = "authToken", default)]
    pub auth_token: Option<String>,
    #[serde(rename = "userId", default)]
    pub user_id: Option<i64>,
}

impl Session {
    pub fn new(auth_token: impl Into<String>) -> Self {
        Self {
            auth_token: Some(auth_token.into()),
            user_id: None,
        }
    }

    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn with_user(mut self, user_id: i64) -> Self {
        self.user_id = Some(user_id);
        self
    }

    /// The bearer credential, if one is present and non-empty.
    pub fn bearer(&self) -> Option<&str> {
        self.auth_token.as_deref().filter(|t| !t.is_empty())
    }

    pub fn is_authenticated(&self) -> bool {
        self.bearer().is_some()
    }
}
