use crate::{
    api::local_now,
    auth::{
        auth::AuthUser,
        jwt::{generate_access_token, generate_refresh_token, verify_token},
        password::verify_password,
    },
    config::Config,
    error::{AppError, AppResult},
    model::user::User,
    models::{LoginReqDto, RefreshReqDto, TokenPair, TokenType},
    store::Store,
};
use actix_web::{HttpResponse, web};
use chrono::{DateTime, Local, Utc};
use serde::Serialize;
use tracing::{debug, error, info, instrument};
use utoipa::ToSchema;

#[derive(Serialize, ToSchema)]
pub struct LoginResponse {
    pub access_token: String,
    pub refresh_token: String,
    #[schema(example = "bearer")]
    pub token_type: String,
    #[schema(example = 900)]
    pub expires_in: usize,
    pub user: User,
}

fn invalid_credentials() -> AppError {
    AppError::Auth("Invalid credentials".to_string())
}

/// Looks up the user and checks the password. Every failure reads the same
/// to the caller.
pub async fn authenticate(store: &dyn Store, username: &str, password: &str) -> AppResult<User> {
    let user = match store.find_user_by_username(username.trim()).await? {
        Some(user) => user,
        None => {
            info!("Invalid credentials: user not found");
            return Err(invalid_credentials());
        }
    };

    if let Err(e) = verify_password(password, &user.password_hash) {
        info!(error = %e, "Invalid credentials: password mismatch");
        return Err(invalid_credentials());
    }

    if !user.is_active {
        info!(user_id = user.id, "Login refused: account inactive");
        return Err(invalid_credentials());
    }

    Ok(user)
}

/// Signs an access token and a refresh token, persisting the refresh `jti`.
async fn issue_tokens(store: &dyn Store, config: &Config, user: &User) -> AppResult<TokenPair> {
    let access_token = generate_access_token(user, &config.jwt_secret, config.access_token_ttl)
        .map_err(|e| AppError::internal("Failed to sign access token", e))?;
    let (refresh_token, refresh_claims) =
        generate_refresh_token(user, &config.jwt_secret, config.refresh_token_ttl)
            .map_err(|e| AppError::internal("Failed to sign refresh token", e))?;

    let expires_at = DateTime::<Utc>::from_timestamp(refresh_claims.exp as i64, 0)
        .map(|t| t.with_timezone(&Local).naive_local())
        .ok_or_else(|| AppError::Internal("Refresh token expiry out of range".to_string()))?;

    debug!(user_id = user.id, jti = %refresh_claims.jti, "Storing refresh token");
    store
        .store_refresh_token(user.id, &refresh_claims.jti, expires_at)
        .await?;

    Ok(TokenPair {
        access_token,
        refresh_token,
        token_type: "bearer".to_string(),
        expires_in: config.access_token_ttl,
    })
}

#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginReqDto,
    responses(
        (status = 200, description = "Authenticated", body = LoginResponse),
        (status = 400, description = "Username or password missing"),
        (status = 401, description = "Invalid credentials")
    ),
    tag = "Auth"
)]
#[instrument(
    name = "auth_login",
    skip(store, config, body),
    fields(username = %body.username)
)]
pub async fn login(
    body: web::Json<LoginReqDto>,
    store: web::Data<dyn Store>,
    config: web::Data<Config>,
) -> AppResult<HttpResponse> {
    info!("Login request received");

    if body.username.trim().is_empty() || body.password.is_empty() {
        return Err(AppError::validation("Username or password required"));
    }

    let user = authenticate(store.get_ref(), &body.username, &body.password).await?;
    let tokens = issue_tokens(store.get_ref(), &config, &user).await?;

    // not fatal for the login
    if let Err(e) = store.touch_last_login(user.id, local_now()).await {
        error!(error = %e, "Failed to update last_login_at");
    }

    info!(user_id = user.id, "Login successful");

    Ok(HttpResponse::Ok().json(LoginResponse {
        access_token: tokens.access_token,
        refresh_token: tokens.refresh_token,
        token_type: tokens.token_type,
        expires_in: tokens.expires_in,
        user,
    }))
}

#[utoipa::path(
    post,
    path = "/auth/refresh",
    request_body = RefreshReqDto,
    responses(
        (status = 200, description = "Rotated token pair", body = TokenPair),
        (status = 401, description = "Refresh token invalid, expired or revoked")
    ),
    tag = "Auth"
)]
#[instrument(name = "auth_refresh", skip_all)]
pub async fn refresh_token(
    body: web::Json<RefreshReqDto>,
    store: web::Data<dyn Store>,
    config: web::Data<Config>,
) -> AppResult<HttpResponse> {
    let rejected = || AppError::Auth("Invalid refresh token".to_string());

    let claims = verify_token(&body.refresh_token, &config.jwt_secret).map_err(|e| {
        debug!(error = %e, "Refresh token rejected");
        rejected()
    })?;
    if claims.token_type != TokenType::Refresh {
        return Err(rejected());
    }

    // a revoked or unknown jti cannot be rotated twice
    if !store.revoke_refresh_token(&claims.jti).await? {
        info!(user_id = claims.user_id, "Refresh token already revoked");
        return Err(rejected());
    }

    let user = store
        .find_user(claims.user_id)
        .await?
        .filter(|u| u.is_active)
        .ok_or_else(rejected)?;

    let tokens = issue_tokens(store.get_ref(), &config, &user).await?;
    info!(user_id = user.id, "Refresh token rotated");

    Ok(HttpResponse::Ok().json(tokens))
}

#[utoipa::path(
    post,
    path = "/auth/logout",
    request_body = RefreshReqDto,
    responses(
        (status = 204, description = "Refresh token revoked (idempotent)")
    ),
    tag = "Auth"
)]
pub async fn logout(
    body: web::Json<RefreshReqDto>,
    store: web::Data<dyn Store>,
    config: web::Data<Config>,
) -> AppResult<HttpResponse> {
    // success even if the token didn't verify or was already revoked
    if let Ok(claims) = verify_token(&body.refresh_token, &config.jwt_secret) {
        if claims.token_type == TokenType::Refresh {
            store.revoke_refresh_token(&claims.jti).await?;
        }
    }

    Ok(HttpResponse::NoContent().finish())
}

#[utoipa::path(
    get,
    path = "/api/auth/me",
    responses(
        (status = 200, description = "Current user", body = User),
        (status = 401, description = "Not authenticated")
    ),
    tag = "Auth",
    security(("bearer_auth" = []))
)]
pub async fn me(auth: AuthUser) -> HttpResponse {
    HttpResponse::Ok().json(auth.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{jwt::generate_access_token, middleware::auth_middleware, password::hash_password};
    use crate::store::memory::MemoryStore;
    use crate::testing::{sample_store, user};
    use actix_web::{App, http::StatusCode, middleware::from_fn, test, web::Data};
    use serde_json::{Value, json};
    use std::sync::Arc;

    fn store_with_password(password: &str) -> Arc<MemoryStore> {
        let (store, _) = sample_store();
        let mut account = user(10, "employee", Some(1));
        account.username = "operator".into();
        account.password_hash = hash_password(password).unwrap();
        store.add_user(account);

        let mut inactive = user(11, "employee", Some(1));
        inactive.username = "former".into();
        inactive.password_hash = hash_password(password).unwrap();
        inactive.is_active = false;
        store.add_user(inactive);

        Arc::new(store)
    }

    macro_rules! auth_app {
        ($store:expr) => {{
            let store: Arc<dyn Store> = $store.clone();
            test::init_service(
                App::new()
                    .app_data(Data::from(store))
                    .app_data(Data::new(Config::for_tests()))
                    .route("/auth/login", web::post().to(login))
                    .route("/auth/refresh", web::post().to(refresh_token))
                    .route("/auth/logout", web::post().to(logout))
                    .service(
                        web::scope("/api")
                            .wrap(from_fn(auth_middleware))
                            .route("/auth/me", web::get().to(me)),
                    ),
            )
            .await
        }};
    }

    #[actix_web::test]
    async fn authenticate_checks_password_and_activity() {
        let store = store_with_password("password123");

        let ok = authenticate(store.as_ref(), " operator ", "password123").await.unwrap();
        assert_eq!(ok.id, 10);

        for (username, password) in [
            ("operator", "wrong"),
            ("nobody", "password123"),
            ("former", "password123"),
        ] {
            let err = authenticate(store.as_ref(), username, password).await.unwrap_err();
            assert!(matches!(err, AppError::Auth(_)), "{username}");
        }
    }

    #[actix_web::test]
    async fn login_refresh_logout_flow() {
        let store = store_with_password("password123");
        let app = auth_app!(store);

        let req = test::TestRequest::post()
            .uri("/auth/login")
            .set_json(json!({"username": "operator", "password": "password123"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["user"]["username"], "operator");
        assert!(body["user"].get("password_hash").is_none());
        assert!(store.last_login(10).is_some());

        let access = body["access_token"].as_str().unwrap().to_string();
        let refresh = body["refresh_token"].as_str().unwrap().to_string();

        let req = test::TestRequest::get()
            .uri("/api/auth/me")
            .insert_header(("Authorization", format!("Bearer {access}")))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        // a refresh token is not an access token
        let req = test::TestRequest::get()
            .uri("/api/auth/me")
            .insert_header(("Authorization", format!("Bearer {refresh}")))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

        let req = test::TestRequest::post()
            .uri("/auth/refresh")
            .set_json(json!({"refresh_token": refresh}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let rotated: Value = test::read_body_json(resp).await;
        let next_refresh = rotated["refresh_token"].as_str().unwrap().to_string();

        // the old one was revoked by the rotation
        let req = test::TestRequest::post()
            .uri("/auth/refresh")
            .set_json(json!({"refresh_token": refresh}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

        for _ in 0..2 {
            let req = test::TestRequest::post()
                .uri("/auth/logout")
                .set_json(json!({"refresh_token": next_refresh}))
                .to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::NO_CONTENT);
        }

        let req = test::TestRequest::post()
            .uri("/auth/refresh")
            .set_json(json!({"refresh_token": next_refresh}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn login_rejects_bad_input() {
        let store = store_with_password("password123");
        let app = auth_app!(store);

        let req = test::TestRequest::post()
            .uri("/auth/login")
            .set_json(json!({"username": "  ", "password": "x"}))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

        let req = test::TestRequest::post()
            .uri("/auth/login")
            .set_json(json!({"username": "operator", "password": "nope"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "auth_error");
    }

    #[actix_web::test]
    async fn middleware_uses_stored_role_and_status() {
        let store = store_with_password("password123");
        let app = auth_app!(store);
        let secret = Config::for_tests().jwt_secret;

        let mut account = user(10, "employee", Some(1));
        account.username = "operator".into();
        let token = generate_access_token(&account, &secret, 900).unwrap();

        store.set_user_role(10, "supervisor");
        let req = test::TestRequest::get()
            .uri("/api/auth/me")
            .insert_header(("Authorization", format!("Bearer {token}")))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::UNAUTHORIZED);

        let ghost = generate_access_token(&user(99, "admin", None), &secret, 900).unwrap();
        let req = test::TestRequest::get()
            .uri("/api/auth/me")
            .insert_header(("Authorization", format!("Bearer {ghost}")))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::UNAUTHORIZED);

        let req = test::TestRequest::get().uri("/api/auth/me").to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::UNAUTHORIZED);
    }
}
