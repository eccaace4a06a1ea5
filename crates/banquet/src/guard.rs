//! Navigation decisions around the session.
//!
//! The dashboard never lets a signed-out user see a protected page, and
//! never leaves a signed-in user on the login screen. [`RouteGuard`] makes
//! that decision from the path and whether a session is stored;
//! [`login_redirect`] builds the login URL a forced logout sends the user
//! to, annotated with the [`LogoutReason`] the login screen explains.

use banquet_session::LogoutReason;
use url::form_urlencoded;

/// Where the login screen lives.
pub const LOGIN_ROUTE: &str = "/login";

/// Where a signed-in user lands.
pub const HOME_ROUTE: &str = "/dashboard";

/// Dashboard sections that need a session.
pub const PROTECTED_PREFIXES: &[&str] = &[
    "/analytics",
    "/catering-packages",
    "/consumables",
    "/customers",
    "/dashboard",
    "/equipment",
    "/events",
    "/maintenance",
    "/payments",
    "/reports",
    "/reservations",
    "/stock_levels",
    "/users",
    "/add-ons",
];

/// Paths the guard never looks at: the API itself and static assets.
const UNGUARDED_PREFIXES: &[&str] = &["/api", "/_next/", "/favicon.ico"];

/// What to do with a navigation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteDecision {
    /// Render the requested page.
    Allow,
    /// Send the user here instead.
    Redirect(String),
}

/// Decides whether a path may be shown.
#[derive(Debug, Clone)]
pub struct RouteGuard {
    protected: Vec<String>,
}

impl Default for RouteGuard {
    fn default() -> Self {
        Self::new(PROTECTED_PREFIXES.iter().copied())
    }
}

impl RouteGuard {
    /// A guard over a custom set of protected prefixes.
    pub fn new<I, P>(protected: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<String>,
    {
        Self {
            protected: protected.into_iter().map(Into::into).collect(),
        }
    }

    /// `true` if `path` needs a session.
    ///
    /// Prefix match, so `/users/7/edit` is protected by `/users`.
    pub fn is_protected(&self, path: &str) -> bool {
        self.protected.iter().any(|prefix| path.starts_with(prefix.as_str()))
    }

    /// Decides what happens when the user navigates to `path`.
    ///
    /// - protected path, no session → login, remembering `path` in `from`
    /// - `/login` with a session → dashboard
    /// - `/` → dashboard or login
    /// - anything else → allow
    pub fn decide(&self, path: &str, has_session: bool) -> RouteDecision {
        if UNGUARDED_PREFIXES.iter().any(|p| path.starts_with(p)) {
            return RouteDecision::Allow;
        }

        if self.is_protected(path) && !has_session {
            return RouteDecision::Redirect(login_redirect(None, Some(path)));
        }

        match (path, has_session) {
            (LOGIN_ROUTE, true) | ("/", true) => {
                RouteDecision::Redirect(HOME_ROUTE.to_owned())
            }
            ("/", false) => RouteDecision::Redirect(LOGIN_ROUTE.to_owned()),
            _ => RouteDecision::Allow,
        }
    }
}

/// Builds `/login`, optionally with `reason` and `from` query parameters.
///
/// ```rust
/// use banquet::guard::login_redirect;
/// use banquet::LogoutReason;
///
/// assert_eq!(
///     login_redirect(Some(LogoutReason::Inactive), Some("/users")),
///     "/login?reason=inactive&from=%2Fusers",
/// );
/// assert_eq!(login_redirect(None, None), "/login");
/// ```
pub fn login_redirect(reason: Option<LogoutReason>, from: Option<&str>) -> String {
    let mut query = form_urlencoded::Serializer::new(String::new());
    if let Some(reason) = reason {
        query.append_pair("reason", reason.code());
    }
    if let Some(from) = from {
        query.append_pair("from", from);
    }

    let query = query.finish();
    if query.is_empty() {
        LOGIN_ROUTE.to_owned()
    } else {
        format!("{LOGIN_ROUTE}?{query}")
    }
}

/// Reads the `reason` parameter back out of a login URL's query string.
///
/// Unknown codes are ignored; the login screen just shows no message.
pub fn logout_reason(query: &str) -> Option<LogoutReason> {
    form_urlencoded::parse(query.trim_start_matches('?').as_bytes())
        .find(|(key, _)| key == "reason")
        .and_then(|(_, code)| LogoutReason::from_code(&code))
}
