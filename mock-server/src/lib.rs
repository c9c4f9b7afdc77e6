//! In-memory stand-in for the tracker backend's auth and user endpoints.
//!
//! Routes live under `/api`. Bodies are snake_case, errors are
//! `{"message": ...}`. Access tokens travel as `Authorization: Bearer`,
//! the refresh token as an HttpOnly `refresh_token` cookie.

pub mod error;

use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{delete, get, post, put},
    Json, Router,
};
use chrono::{Duration, NaiveDate, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::info;
use uuid::Uuid;

pub use error::AppError;

pub const DEFAULT_SECRET: &str = "mock-server-dev-secret";
pub const REFRESH_COOKIE: &str = "refresh_token";

const ACCESS_TTL_MINUTES: i64 = 15;
const REFRESH_TTL_DAYS: i64 = 30;
const ADULT_AGE: u32 = 18;

#[derive(Clone, Debug)]
pub struct User {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    pub birthdate: Option<NaiveDate>,
    pub has_menstruation: Option<bool>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    Access,
    Refresh,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: i64,
    pub kind: TokenKind,
}

pub type Db = Arc<RwLock<HashMap<String, User>>>;

#[derive(Clone)]
pub struct AppState {
    pub users: Db,
    secret: Arc<Vec<u8>>,
}

impl AppState {
    pub fn new(secret: &str) -> Self {
        Self {
            users: Arc::new(RwLock::new(HashMap::new())),
            secret: Arc::new(secret.as_bytes().to_vec()),
        }
    }

    pub fn issue(&self, email: &str, kind: TokenKind) -> Result<String, AppError> {
        let ttl = match kind {
            TokenKind::Access => Duration::minutes(ACCESS_TTL_MINUTES),
            TokenKind::Refresh => Duration::days(REFRESH_TTL_DAYS),
        };
        let claims = Claims {
            sub: email.to_string(),
            exp: (Utc::now() + ttl).timestamp(),
            kind,
        };
        jsonwebtoken::encode(&Header::default(), &claims, &EncodingKey::from_secret(&self.secret))
            .map_err(|e| AppError::Internal(e.to_string()))
    }

    /// Return the subject of a valid, unexpired token of the given kind.
    pub fn verify(&self, token: &str, kind: TokenKind) -> Result<String, AppError> {
        let data = jsonwebtoken::decode::<Claims>(
            token,
            &DecodingKey::from_secret(&self.secret),
            &Validation::default(),
        )
        .map_err(|_| AppError::Unauthorized("Invalid or expired token.".to_string()))?;
        if data.claims.kind != kind {
            return Err(AppError::Unauthorized("Wrong token type.".to_string()));
        }
        Ok(data.claims.sub)
    }

    fn identity(&self, headers: &HeaderMap) -> Result<String, AppError> {
        let token = headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .ok_or_else(|| AppError::Unauthorized("Missing Authorization Header".to_string()))?;
        self.verify(token, TokenKind::Access)
    }
}

pub fn app() -> Router {
    app_with_state(AppState::new(DEFAULT_SECRET))
}

pub fn app_with_state(state: AppState) -> Router {
    let api = Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh))
        .route("/user/profile", get(get_profile).put(update_profile))
        .route("/user/change-password", put(change_password))
        .route("/user/delete-account", delete(delete_account));
    Router::new().nest("/api", api).with_state(state)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    run_with_state(listener, AppState::new(DEFAULT_SECRET)).await
}

pub async fn run_with_state(listener: TcpListener, state: AppState) -> Result<(), std::io::Error> {
    axum::serve(listener, app_with_state(state)).await
}

fn str_field<'a>(data: &'a Value, field: &str) -> Option<&'a str> {
    data.get(field).and_then(Value::as_str)
}

fn required<'a>(data: &'a Value, field: &str) -> Result<&'a str, AppError> {
    str_field(data, field).ok_or_else(|| AppError::BadRequest(format!("{field} is required.")))
}

pub fn is_valid_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.split('.').count() >= 2
                && domain.split('.').all(|part| !part.is_empty())
        }
        None => false,
    }
}

pub fn is_adult(birthdate: NaiveDate, today: NaiveDate) -> bool {
    today.years_since(birthdate).is_some_and(|age| age >= ADULT_AGE)
}

fn parse_birthdate(raw: &str) -> Result<NaiveDate, AppError> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| AppError::BadRequest("Invalid birthdate format.".to_string()))
}

fn check_adult(birthdate: NaiveDate) -> Result<(), AppError> {
    if is_adult(birthdate, Utc::now().date_naive()) {
        Ok(())
    } else {
        Err(AppError::BadRequest("You must be at least 18 years old.".to_string()))
    }
}

/// Value of the named cookie from the `Cookie` request header.
pub fn cookie_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value)
}

async fn register(
    State(state): State<AppState>,
    Json(data): Json<Value>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    for field in ["first_name", "last_name", "email", "password"] {
        required(&data, field)?;
    }
    let email = required(&data, "email")?.to_string();

    let mut users = state.users.write().await;
    if users.contains_key(&email) {
        return Err(AppError::BadRequest("Email address already exists!".to_string()));
    }
    if !is_valid_email(&email) {
        return Err(AppError::BadRequest("Invalid email format.".to_string()));
    }
    let birthdate = str_field(&data, "birthdate").map(parse_birthdate).transpose()?;
    if let Some(birthdate) = birthdate {
        check_adult(birthdate)?;
    }

    let user = User {
        id: Uuid::new_v4(),
        first_name: required(&data, "first_name")?.to_string(),
        last_name: required(&data, "last_name")?.to_string(),
        email: email.clone(),
        password: required(&data, "password")?.to_string(),
        birthdate,
        has_menstruation: data.get("has_menstruation").and_then(Value::as_bool),
    };
    info!(user_id = %user.id, "Registered user");
    users.insert(email, user);

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Successfully registered! Please login." })),
    ))
}

async fn login(
    State(state): State<AppState>,
    Json(data): Json<Value>,
) -> Result<impl IntoResponse, AppError> {
    let (Some(email), Some(password)) = (str_field(&data, "email"), str_field(&data, "password")) else {
        return Err(AppError::BadRequest("Email and password are required.".to_string()));
    };

    let users = state.users.read().await;
    match users.get(email) {
        Some(user) if user.password == password => {}
        _ => {
            return Err(AppError::Unauthorized(
                "Invalid email or password. Login again.".to_string(),
            ))
        }
    }

    let access_token = state.issue(email, TokenKind::Access)?;
    let refresh_token = state.issue(email, TokenKind::Refresh)?;
    let cookie = format!("{REFRESH_COOKIE}={refresh_token}; HttpOnly; Path=/; SameSite=Lax");

    Ok((
        [(header::SET_COOKIE, cookie)],
        Json(json!({
            "message": "Successful login!",
            "access_token": access_token,
            "refresh_token": refresh_token,
        })),
    ))
}

async fn refresh(State(state): State<AppState>, headers: HeaderMap) -> Result<Json<Value>, AppError> {
    let token = cookie_value(&headers, REFRESH_COOKIE)
        .ok_or_else(|| AppError::Unauthorized("Missing refresh token.".to_string()))?;
    let email = state.verify(token, TokenKind::Refresh)?;
    let access_token = state.issue(&email, TokenKind::Access)?;
    Ok(Json(json!({
        "message": "Access token refreshed.",
        "access_token": access_token,
    })))
}

async fn get_profile(State(state): State<AppState>, headers: HeaderMap) -> Result<Json<Value>, AppError> {
    let email = state.identity(&headers)?;
    let users = state.users.read().await;
    let user = users.get(&email).ok_or_else(user_not_found)?;
    Ok(Json(json!({
        "data": {
            "first_name": user.first_name,
            "last_name": user.last_name,
            "email": user.email,
            "birthdate": user.birthdate.map(|d| d.format("%Y-%m-%d").to_string()),
            "has_menstruation": user.has_menstruation,
        },
        "message": "User profile retrieved successfully.",
    })))
}

async fn update_profile(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(data): Json<Value>,
) -> Result<Json<Value>, AppError> {
    let email = state.identity(&headers)?;
    let mut users = state.users.write().await;
    let user = users.get_mut(&email).ok_or_else(user_not_found)?;

    let birthdate = str_field(&data, "birthdate").map(parse_birthdate).transpose()?;
    if let Some(birthdate) = birthdate {
        check_adult(birthdate)?;
        user.birthdate = Some(birthdate);
    }
    if let Some(first_name) = str_field(&data, "first_name") {
        user.first_name = first_name.to_string();
    }
    if let Some(last_name) = str_field(&data, "last_name") {
        user.last_name = last_name.to_string();
    }
    if let Some(flag) = data.get("has_menstruation").and_then(Value::as_bool) {
        user.has_menstruation = Some(flag);
    }
    Ok(Json(json!({ "message": "Profile updated successfully." })))
}

async fn change_password(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(data): Json<Value>,
) -> Result<Json<Value>, AppError> {
    let email = state.identity(&headers)?;
    let mut users = state.users.write().await;
    let user = users.get_mut(&email).ok_or_else(user_not_found)?;

    let old_password = str_field(&data, "old_password").unwrap_or_default();
    let new_password = required(&data, "new_password")?;
    if user.password != old_password {
        return Err(AppError::Unauthorized("Old password is incorrect.".to_string()));
    }
    if old_password == new_password {
        return Err(AppError::BadRequest(
            "New password should be different from the old password.".to_string(),
        ));
    }
    user.password = new_password.to_string();
    Ok(Json(json!({ "message": "Password changed successfully." })))
}

async fn delete_account(State(state): State<AppState>, headers: HeaderMap) -> Result<Json<Value>, AppError> {
    let email = state.identity(&headers)?;
    let mut users = state.users.write().await;
    users.remove(&email).ok_or_else(user_not_found)?;
    info!("Deleted account");
    Ok(Json(json!({ "message": "Account deleted successfully." })))
}

fn user_not_found() -> AppError {
    AppError::NotFound("User not found.".to_string())
}
