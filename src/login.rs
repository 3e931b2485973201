use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use axum::{
    Form,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::{Cookie, SameSite, SignedCookieJar};
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};
use uuid::Uuid;

use crate::app::{AppState, render};
use crate::pages::LoginView;

/// Name of the cookie carrying the session id.
pub const SESSION_COOKIE: &str = "session";
const SESSION_HOURS: i64 = 24;

/// Login form data
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    /// A form posted without the field counts as an empty password.
    #[serde(default)]
    pub password: String,
}

/// Notice carried back to the login page through the query string
#[derive(Debug, Default, Deserialize)]
pub struct LoginQuery {
    pub notice: Option<String>,
}

/// User session data
///
/// A session only exists once the shared password has been given, so holding
/// one is what marks the browser as logged in.
#[derive(Debug, Clone)]
pub struct Session {
    pub expires_at: DateTime<Utc>,
}

/// Server-side table of logged-in sessions, keyed by session id.
#[derive(Debug)]
pub struct SessionStore {
    sessions: RwLock<HashMap<String, Session>>,
    ttl: Duration,
}

impl Default for SessionStore {
    fn default() -> Self {
        SessionStore::with_ttl(Duration::hours(SESSION_HOURS))
    }
}

impl SessionStore {
    pub fn with_ttl(ttl: Duration) -> Self {
        SessionStore {
            sessions: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    /// Create a new logged-in session and return its id.
    pub fn create(&self) -> String {
        let session_id = Uuid::new_v4().to_string();
        let now = Utc::now();
        let session = Session {
            expires_at: now + self.ttl,
        };

        let mut sessions = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
        sessions.retain(|_, s| s.expires_at > now);
        sessions.insert(session_id.clone(), session);

        session_id
    }

    /// Whether `session_id` names a live session.
    pub fn is_authenticated(&self, session_id: &str) -> bool {
        let sessions = self.sessions.read().unwrap_or_else(PoisonError::into_inner);
        sessions
            .get(session_id)
            .is_some_and(|session| session.expires_at > Utc::now())
    }

    pub fn remove(&self, session_id: &str) {
        let mut sessions = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
        sessions.remove(session_id);
    }

    pub fn len(&self) -> usize {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The single shared dashboard credential.
#[derive(Debug, Clone)]
pub struct PasswordGate {
    password_hash: String,
}

impl PasswordGate {
    /// `password_hash` must be an Argon2 PHC string.
    pub fn new(password_hash: impl Into<String>) -> Self {
        PasswordGate {
            password_hash: password_hash.into(),
        }
    }

    /// Check `password` against the shared credential.
    pub fn authenticate(&self, password: &str) -> bool {
        match verify_password(password, &self.password_hash) {
            Ok(matches) => matches,
            Err(e) => {
                log::error!("{}", e);
                false
            }
        }
    }
}

/// Hash a password using Argon2
///
/// # Errors
/// * Returns an error if the password hashing fails
pub fn hash_password(password: &str) -> Result<String, String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    match argon2.hash_password(password.as_bytes(), &salt) {
        Ok(hash) => Ok(hash.to_string()),
        Err(_) => Err("Password hashing failed".to_string()),
    }
}

/// Verify a password against a stored hash
///
/// # Returns
/// * `Result<bool, String>` - True if the password matches, false if not, or an error
fn verify_password(password: &str, hash: &str) -> Result<bool, String> {
    let parsed_hash = match PasswordHash::new(hash) {
        Ok(hash) => hash,
        Err(_) => return Err("Invalid password hash format".to_string()),
    };

    match Argon2::default().verify_password(password.as_bytes(), &parsed_hash) {
        Ok(_) => Ok(true),
        Err(_) => Ok(false), // Password didn't match
    }
}

fn session_id(jar: &SignedCookieJar) -> Option<String> {
    jar.get(SESSION_COOKIE).map(|cookie| cookie.value().to_string())
}

/// Serve the login page
///
/// Already logged-in browsers go straight to the orders board.
pub async fn serve_login_page(
    State(state): State<AppState>,
    jar: SignedCookieJar,
    Query(query): Query<LoginQuery>,
) -> Response {
    if session_id(&jar).is_some_and(|id| state.sessions.is_authenticated(&id)) {
        return Redirect::to("/orders").into_response();
    }

    render(state.pages.login(&LoginView {
        error: None,
        notice: query.notice,
    }))
}

/// Handle login requests
///
/// A correct password opens a session and redirects to the orders board.
/// A wrong one redisplays the form with a message.
pub async fn handle_login(
    State(state): State<AppState>,
    jar: SignedCookieJar,
    Form(form): Form<LoginForm>,
) -> Response {
    if !state.gate.authenticate(&form.password) {
        log::warn!("rejected dashboard login");
        return render(state.pages.login(&LoginView {
            error: Some("Incorrect password.".to_string()),
            notice: None,
        }));
    }

    let session_id = state.sessions.create();
    log::info!("dashboard login, {} active sessions", state.sessions.len());

    let cookie = Cookie::build((SESSION_COOKIE, session_id))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax);

    (jar.add(cookie), Redirect::to("/orders")).into_response()
}

/// Handle logout
///
/// Drops the server-side session, clears the cookie and returns to the login page.
pub async fn handle_logout(State(state): State<AppState>, jar: SignedCookieJar) -> Response {
    if let Some(id) = session_id(&jar) {
        state.sessions.remove(&id);
    }

    let jar = jar.remove(Cookie::build(SESSION_COOKIE).path("/"));
    let target = format!(
        "/login?notice={}",
        urlencoding::encode("You have been logged out.")
    );

    (jar, Redirect::to(&target)).into_response()
}

/// Authentication middleware
///
/// Lets the request through when it carries a live session, otherwise
/// redirects to the login page.
pub async fn require_auth(
    State(state): State<AppState>,
    jar: SignedCookieJar,
    request: axum::extract::Request,
    next: axum::middleware::Next,
) -> Response {
    if session_id(&jar).is_some_and(|id| state.sessions.is_authenticated(&id)) {
        return next.run(request).await;
    }

    Redirect::to("/login").into_response()
}
