use reqwest::Method;
use std::fmt;
use uuid::Uuid;

/// Every call the forwarder makes against the logsight service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiRoute {
    Login,
    UserInfo { user_id: Uuid },
    Applications { user_id: Uuid },
    CreateApplication { user_id: Uuid },
    SendLogs,
}

impl ApiRoute {
    pub fn method(&self) -> Method {
        match self {
            Self::UserInfo { .. } | Self::Applications { .. } => Method::GET,
            Self::Login | Self::CreateApplication { .. } | Self::SendLogs => Method::POST,
        }
    }

    pub fn path(&self) -> String {
        match self {
            Self::Login => "/api/v1/auth/login".to_string(),
            Self::UserInfo { user_id } => format!("/api/v1/users/{user_id}"),
            Self::Applications { user_id } | Self::CreateApplication { user_id } => {
                format!("/api/v1/users/{user_id}/applications")
            }
            Self::SendLogs => "/api/v1/logs".to_string(),
        }
    }

    /// Only the login call goes out without a bearer token.
    pub fn requires_auth(&self) -> bool {
        !matches!(self, Self::Login)
    }
}

impl fmt::Display for ApiRoute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method(), self.path())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_routes() {
        let user_id = Uuid::nil();
        assert_eq!(ApiRoute::Login.to_string(), "POST /api/v1/auth/login");
        assert_eq!(
            ApiRoute::Applications { user_id }.to_string(),
            format!("GET /api/v1/users/{user_id}/applications")
        );
        assert_eq!(
            ApiRoute::CreateApplication { user_id }.to_string(),
            format!("POST /api/v1/users/{user_id}/applications")
        );
        assert_eq!(ApiRoute::SendLogs.path(), "/api/v1/logs");
        assert!(!ApiRoute::Login.requires_auth());
        assert!(ApiRoute::SendLogs.requires_auth());
    }
}
