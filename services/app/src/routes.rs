//! Navigation targets and the view each one resolves to

use auth::{Access, AuthGate, Authorization, Role, guard};

/// A navigable screen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Login,
    Signup,
    Chat,
    Curriculum,
    Admin,
}

impl Route {
    /// Match a path; trailing slashes are ignored
    pub fn parse(path: &str) -> Option<Self> {
        let path = path.trim();
        let path = path.split(['?', '#']).next().unwrap_or_default();
        match path.trim_end_matches('/') {
            "" | "/chat" => Some(Route::Chat),
            "/login" => Some(Route::Login),
            "/signup" => Some(Route::Signup),
            "/curriculum" => Some(Route::Curriculum),
            "/admin" => Some(Route::Admin),
            _ => None,
        }
    }

    pub fn path(self) -> &'static str {
        match self {
            Route::Login => "/login",
            Route::Signup => "/signup",
            Route::Chat => "/",
            Route::Curriculum => "/curriculum",
            Route::Admin => "/admin",
        }
    }

    pub fn access(self) -> Access {
        match self {
            Route::Login | Route::Signup => Access::Public,
            Route::Chat | Route::Curriculum => Access::Authenticated,
            Route::Admin => Access::Role(Role::Admin),
        }
    }
}

/// What the shell shows for a requested path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Page(Route),
    Redirect(Route),
    Forbidden,
}

/// Resolve `path` for a caller in the given auth state
pub fn resolve(authenticated: bool, role: Option<&Role>, path: &str) -> View {
    let Some(route) = Route::parse(path) else {
        return if authenticated {
            View::Redirect(Route::Chat)
        } else {
            View::Redirect(Route::Login)
        };
    };

    match guard::authorize(authenticated, role, &route.access()) {
        Authorization::Allow => View::Page(route),
        Authorization::RedirectToLogin => View::Redirect(Route::Login),
        Authorization::Forbidden => View::Forbidden,
    }
}

/// Resolve `path` against the gate's current credential
pub fn resolve_for<S>(gate: &AuthGate<S>, path: &str) -> View
where
    S: common::PersistentStore,
{
    resolve(gate.is_authenticated(), gate.role(), path)
}
