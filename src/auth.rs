// src/auth.rs
//! OAuth glue. The code exchange happens on the backend; the client only
//! stashes the role, forwards the code and stores what comes back.

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::core::{ApiClient, Navigator, Route, SessionStore};
use crate::notifications::{NotificationCenter, NotificationSource};
use crate::types::response::{AuthUrlResponse, LoginResponse, OAuthCallbackRequest, StoredUser};
use crate::utils::normalize_role;

const GOOGLE_LOGIN_ENDPOINT: &str = "/auth/google/login";
const OAUTH_CALLBACK_ENDPOINT: &str = "/auth/oauth_callback";

/// Ask the backend for the provider URL and remember the requested role
pub async fn login_url(api: &ApiClient, role: &str) -> Result<String> {
    let role = normalize_role(Some(role));
    api.session().set_login_role(&role)?;

    let response: AuthUrlResponse = api
        .get_public(GOOGLE_LOGIN_ENDPOINT, &[("role", role.as_str())])
        .await
        .context("Failed to fetch Google login URL")?;

    info!("Obtained OAuth login URL for role {}", role);
    Ok(response.auth_url)
}

/// Exchange the provider code for a session and decide where to land
pub async fn complete_login(api: &ApiClient, code: &str) -> Result<Route> {
    if code.trim().is_empty() {
        anyhow::bail!("No authorization code received");
    }

    let role = normalize_role(api.session().take_login_role()?.as_deref());
    let request = OAuthCallbackRequest {
        code: code.trim(),
        role: &role,
    };

    let response: LoginResponse = api
        .post_public(OAUTH_CALLBACK_ENDPOINT, &request)
        .await
        .context("OAuth callback failed")?;

    store_login(api.session(), &response)?;
    info!("Signed in as {} ({})", response.user.email, response.user.role);

    let route = landing_route(&response.user);
    api.navigator().navigate(&route);
    Ok(route)
}

/// Complete the login, then bring the unread badge up to date. A failed
/// count refresh is logged and does not undo the sign-in.
pub async fn sign_in<S: NotificationSource>(
    api: &ApiClient,
    code: &str,
    notifications: &mut NotificationCenter<S>,
) -> Result<Route> {
    let route = complete_login(api, code).await?;
    match notifications.refresh_count().await {
        Ok(true) => info!("Unread notifications after login: {}", notifications.unread()),
        Ok(false) => warn!("Session ended while refreshing unread count"),
        Err(e) => warn!("Unread count refresh after login failed: {:#}", e),
    }
    Ok(route)
}

pub fn store_login(session: &SessionStore, response: &LoginResponse) -> Result<()> {
    session.set_token(&response.access_token)?;
    session.set_user(&response.user)
}

/// Students without a completed profile go to the wizard first
pub fn landing_route(user: &StoredUser) -> Route {
    match user.role.as_str() {
        "institution" => Route::InstitutionDashboard,
        _ if !user.profile_completed => Route::CompleteProfile,
        _ => Route::StudentDashboard,
    }
}

pub fn logout(session: &SessionStore, navigator: &dyn Navigator) -> Result<()> {
    session.clear()?;
    navigator.navigate(&Route::Login);
    Ok(())
}

/// Page guard: redirect to login when no token is stored
pub fn require_login(session: &SessionStore, navigator: &dyn Navigator) -> bool {
    if session.is_logged_in() {
        true
    } else {
        warn!("No session token, redirecting to login");
        navigator.navigate(&Route::Login);
        false
    }
}
