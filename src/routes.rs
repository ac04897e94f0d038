//! Route table and guard

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Landing,
    Login,
    Editor,
    Terms,
    Privacy,
    NotFound(String),
}

impl Route {
    pub fn parse(path: &str) -> Self {
        let trimmed = path.trim();
        let normalized = match trimmed.trim_end_matches('/') {
            "" => "/",
            other => other,
        };
        match normalized {
            "/" => Route::Landing,
            "/login" => Route::Login,
            "/editor" => Route::Editor,
            "/terms" => Route::Terms,
            "/privacy" => Route::Privacy,
            _ => Route::NotFound(trimmed.to_string()),
        }
    }

    pub fn path(&self) -> &str {
        match self {
            Route::Landing => "/",
            Route::Login => "/login",
            Route::Editor => "/editor",
            Route::Terms => "/terms",
            Route::Privacy => "/privacy",
            Route::NotFound(path) => path,
        }
    }

    pub fn requires_auth(&self) -> bool {
        matches!(self, Route::Editor)
    }
}

/// Where a navigation actually lands given the sign-in state.
pub fn resolve(requested: Route, signed_in: bool) -> Route {
    match requested {
        route if route.requires_auth() && !signed_in => Route::Login,
        Route::Login if signed_in => Route::Editor,
        route => route,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_paths() {
        assert_eq!(Route::parse("/"), Route::Landing);
        assert_eq!(Route::parse(""), Route::Landing);
        assert_eq!(Route::parse("/login"), Route::Login);
        assert_eq!(Route::parse("/editor/"), Route::Editor);
        assert_eq!(Route::parse("/terms"), Route::Terms);
        assert_eq!(Route::parse("/privacy"), Route::Privacy);
        assert_eq!(
            Route::parse("/pricing"),
            Route::NotFound("/pricing".to_string())
        );
    }

    #[test]
    fn editor_is_guarded() {
        assert_eq!(resolve(Route::Editor, false), Route::Login);
        assert_eq!(resolve(Route::Editor, true), Route::Editor);
    }

    #[test]
    fn signed_in_login_goes_to_editor() {
        assert_eq!(resolve(Route::Login, true), Route::Editor);
        assert_eq!(resolve(Route::Login, false), Route::Login);
    }

    #[test]
    fn public_pages_pass_through() {
        for route in [Route::Landing, Route::Terms, Route::Privacy] {
            assert_eq!(resolve(route.clone(), false), route);
        }
        let missing = Route::parse("/nope");
        assert_eq!(resolve(missing.clone(), true), missing);
    }
}
