//! Why a session ended, as shown on the login screen.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The reason code carried to the login view after a forced logout.
///
/// Travels as a query parameter (`/login?reason=inactive`), so the wire
/// form is the snake_case code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogoutReason {
    /// No user interaction for the idle timeout.
    Inactive,
    /// The refresh token was rejected or is gone.
    SessionExpired,
}

impl LogoutReason {
    /// The query-string code.
    pub fn code(self) -> &'static str {
        match self {
            Self::Inactive => "inactive",
            Self::SessionExpired => "session_expired",
        }
    }

    /// Parses a query-string code. Unknown codes yield `None` and the login
    /// screen shows no banner.
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "inactive" => Some(Self::Inactive),
            "session_expired" => Some(Self::SessionExpired),
            _ => None,
        }
    }

    /// The banner text for the login screen.
    pub fn message(self) -> &'static str {
        match self {
            Self::Inactive => "You have been logged out due to inactivity",
            Self::SessionExpired => {
                "Your session has expired. Please sign in again."
            }
        }
    }
}

impl fmt::Display for LogoutReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_and_from_code_agree() {
        for reason in [LogoutReason::Inactive, LogoutReason::SessionExpired] {
            assert_eq!(LogoutReason::from_code(reason.code()), Some(reason));
        }
    }

    #[test]
    fn test_from_code_unknown_is_none() {
        assert_eq!(LogoutReason::from_code("banned"), None);
        assert_eq!(LogoutReason::from_code(""), None);
    }

    #[test]
    fn test_messages_match_login_banner() {
        assert!(LogoutReason::Inactive.message().contains("inactivity"));
        assert!(LogoutReason::SessionExpired.message().contains("expired"));
    }

    #[test]
    fn test_serde_uses_snake_case_code() {
        let json = serde_json::to_string(&LogoutReason::SessionExpired).unwrap();
        assert_eq!(json, r#""session_expired""#);
    }
}
