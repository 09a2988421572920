// ViewerContext - who is making the current request

use crate::models::User;

/// Request-scoped identity. Built once per request by the viewer middleware.
#[derive(Debug, Clone)]
pub struct ViewerContext {
    pub request_id: String,
    pub user: Option<User>,
}

impl ViewerContext {
    pub fn anonymous(request_id: String) -> Self {
        Self {
            request_id,
            user: None,
        }
    }

    pub fn authenticated(user: User, request_id: String) -> Self {
        Self {
            request_id,
            user: Some(user),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    pub fn username(&self) -> Option<&str> {
        self.user.as_ref().map(|user| user.username.as_str())
    }
}
