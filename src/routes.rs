// src/routes.rs

use axum::{
    Json, Router,
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method, header},
    middleware,
    routing::{get, post, put},
};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};
use utoipa::{
    Modify, OpenApi,
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
};

use crate::{
    handlers::{
        adaptive, aptitude, auth, health, mock_interview, password, profile, resume, settings,
    },
    state::AppState,
    utils::jwt::auth_middleware,
};

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health,
        adaptive::get_question,
        adaptive::submit_answer,
        adaptive::final_report,
        auth::send_signup_otp,
        auth::verify_signup_otp,
        auth::signin,
        password::send_reset_otp,
        password::verify_reset_otp,
        password::reset_password,
        settings::update_profile,
        settings::change_password,
        profile::dashboard,
        resume::upload_resume,
        aptitude::create_test,
        aptitude::submit_answer,
        aptitude::complete_test,
        mock_interview::start_interview,
        mock_interview::evaluate,
        mock_interview::finish_interview,
    ),
    modifiers(&BearerSecurity),
    tags(
        (name = "health", description = "Liveness"),
        (name = "adaptive", description = "Adaptive question delivery"),
        (name = "auth", description = "Signup, signin and password reset"),
        (name = "settings", description = "Account settings"),
        (name = "profile", description = "Dashboard and resume upload"),
        (name = "aptitude", description = "Timed aptitude tests"),
        (name = "mock-interview", description = "Technical mock interviews")
    )
)]
pub struct ApiDoc;

struct BearerSecurity;

impl Modify for BearerSecurity {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin '{}'", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true)
}

/// Assembles the main application router.
///
/// * Public routes: health, adaptive questions, signup/signin and password reset.
/// * Bearer-protected routes: settings, dashboard, resume upload, aptitude tests
///   and mock interviews.
/// * Global middleware: Trace, CORS.
pub fn create_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.cors_origins);

    let public_routes = Router::new()
        .route("/", get(health::health))
        .route("/health", get(health::health))
        .route("/get_question", post(adaptive::get_question))
        .route("/submit_answer", post(adaptive::submit_answer))
        .route("/final_report/{category}", get(adaptive::final_report))
        .route("/auth/send-otp", post(auth::send_signup_otp))
        .route("/auth/verify-otp", post(auth::verify_signup_otp))
        .route("/auth/signin", post(auth::signin))
        .route("/forgot-password/send-otp", post(password::send_reset_otp))
        .route("/forgot-password/verify-otp", post(password::verify_reset_otp))
        .route(
            "/forgot-password/reset-password",
            post(password::reset_password),
        )
        .route(
            "/api-docs/openapi.json",
            get(|| async { Json(ApiDoc::openapi()) }),
        );

    let protected_routes = Router::new()
        .route("/settings/profile", put(settings::update_profile))
        .route("/settings/change-password", post(settings::change_password))
        .route("/user/dashboard", get(profile::dashboard))
        .route(
            "/upload/",
            post(resume::upload_resume).layer(DefaultBodyLimit::max(resume::MAX_RESUME_BYTES)),
        )
        .route("/aptitude/create-test", post(aptitude::create_test))
        .route("/aptitude/submit-answer", post(aptitude::submit_answer))
        .route(
            "/aptitude/complete-test/{test_id}",
            post(aptitude::complete_test),
        )
        .route("/mock-interview/", get(mock_interview::start_interview))
        .route("/mock-interview/evaluate", post(mock_interview::evaluate))
        .route("/mock-interview/finish", post(mock_interview::finish_interview))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        // Global Middleware (applied from outside in)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
