use crate::{
    api::{attendance, dashboard, directory, employee, health, leave_request},
    auth::{handlers, middleware::auth_middleware},
    config::Config,
    error::AppError,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::{
    error::{JsonPayloadError, QueryPayloadError},
    middleware::from_fn,
    web,
};
use std::sync::Arc;

fn build_limiter(requests_per_min: u32) -> Governor<PeerIpKeyExtractor, NoOpMiddleware> {
    let requests_per_min = requests_per_min.max(1);
    let per_ms = (60_000 / requests_per_min as u64).max(1);
    // finish() only fails on a zero period or burst
    let cfg = GovernorConfigBuilder::default()
        .per_millisecond(per_ms)
        .burst_size(requests_per_min)
        .key_extractor(PeerIpKeyExtractor)
        .finish()
        .unwrap_or_default();
    Governor::new(&cfg)
}

/// Malformed query strings answer with the usual error body.
pub fn query_config() -> web::QueryConfig {
    web::QueryConfig::default().error_handler(|err: QueryPayloadError, _req| {
        AppError::validation(format!("Invalid query: {err}")).into()
    })
}

pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err: JsonPayloadError, _req| {
        AppError::validation(format!("Invalid JSON body: {err}")).into()
    })
}

/// Routes behind the auth middleware, relative to the API prefix.
pub fn api_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/auth/me", web::get().to(handlers::me))
        .service(
            web::scope("/attendance")
                // /attendance
                .service(web::resource("").route(web::get().to(attendance::list_attendance)))
                .service(web::resource("/check-in").route(web::post().to(attendance::check_in)))
                .service(web::resource("/check-out").route(web::post().to(attendance::check_out))),
        )
        .service(
            web::scope("/requests")
                // /requests
                .service(
                    web::resource("")
                        .route(web::get().to(leave_request::list_requests))
                        .route(web::post().to(leave_request::create_request)),
                )
                // /requests/{id}
                .service(web::resource("/{id}").route(web::get().to(leave_request::get_request)))
                .service(
                    web::resource("/{id}/approve")
                        .route(web::put().to(leave_request::approve_request)),
                )
                .service(
                    web::resource("/{id}/reject").route(web::put().to(leave_request::reject_request)),
                )
                .service(
                    web::resource("/{id}/cancel").route(web::put().to(leave_request::cancel_request)),
                ),
        )
        .service(
            web::scope("/employees")
                .service(web::resource("").route(web::get().to(employee::list_employees)))
                .service(web::resource("/{id}").route(web::get().to(employee::get_employee))),
        )
        .route("/divisions", web::get().to(directory::list_divisions))
        .route("/departments", web::get().to(directory::list_departments))
        .route("/shifts", web::get().to(directory::list_shifts))
        .route("/dashboard/stats", web::get().to(dashboard::dashboard_stats));
}

pub fn configure(cfg: &mut web::ServiceConfig, config: &Config) {
    let login_limiter = Arc::new(build_limiter(config.rate_login_per_min));
    let refresh_limiter = Arc::new(build_limiter(config.rate_refresh_per_min));
    let protected_limiter = Arc::new(build_limiter(config.rate_protected_per_min));

    cfg.app_data(query_config()).app_data(json_config());

    cfg.route("/health", web::get().to(health::health));

    // Public routes
    cfg.service(
        web::scope("/auth")
            .service(
                web::resource("/login")
                    .wrap(login_limiter.clone())
                    .route(web::post().to(handlers::login)),
            )
            .service(
                web::resource("/refresh")
                    .wrap(refresh_limiter)
                    .route(web::post().to(handlers::refresh_token)),
            )
            .service(
                web::resource("/logout")
                    .wrap(login_limiter)
                    .route(web::post().to(handlers::logout)),
            ),
    );

    // Protected routes
    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(from_fn(auth_middleware)) // authentication
            .wrap(protected_limiter) // rate limiting
            .configure(api_routes),
    );
}

// LOGIN
//  ├─ access_token (15 min)
//  └─ refresh_token (7 days)

// API REQUEST
//  └─ Authorization: Bearer access_token

// ACCESS EXPIRED
//  └─ POST /auth/refresh with refresh_token
//       └─ returns a rotated token pair
