use axum::{
    http::{HeaderValue, Method},
    middleware as axum_middleware,
    routing::{get, post, put},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{docs::ApiDoc, handlers, middleware, state::AppState};

fn cors_layer(allow_origin: &str) -> CorsLayer {
    let origins: Vec<HeaderValue> = allow_origin
        .split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty() && *origin != "*")
        .filter_map(|origin| HeaderValue::from_str(origin).ok())
        .collect();
    let layer = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(Any)
        .max_age(std::time::Duration::from_secs(24 * 60 * 60));

    if origins.is_empty() {
        layer.allow_origin(Any)
    } else {
        layer.allow_origin(AllowOrigin::list(origins))
    }
}

pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/health", get(handlers::health::health))
        .route("/api/auth/login", post(handlers::auth::login))
        .route(
            "/api/auth/verify-setup-token",
            get(handlers::auth::verify_setup_token),
        )
        .route(
            "/api/auth/setup-account",
            post(handlers::auth::setup_account),
        );

    // Any authenticated account
    let user_routes = Router::new()
        .route(
            "/api/attendance/clock-in",
            post(handlers::attendance::clock_in),
        )
        .route(
            "/api/attendance/clock-out",
            post(handlers::attendance::clock_out).put(handlers::attendance::clock_out),
        )
        .route("/api/attendance/logs", get(handlers::attendance::get_logs))
        .route("/api/attendance/today", get(handlers::attendance::get_today))
        .route(
            "/api/attendance/{id}/history",
            get(handlers::attendance::get_history),
        )
        .route("/api/auth/profile", get(handlers::auth::profile))
        .route(
            "/api/auth/change-password",
            put(handlers::auth::change_password),
        )
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::auth,
        ));

    let manager_routes = Router::new()
        .route(
            "/api/departments",
            get(handlers::departments::list_departments),
        )
        .route(
            "/api/departments/{id}",
            get(handlers::departments::get_department),
        )
        .route("/api/employees", get(handlers::employees::list_employees))
        .route(
            "/api/employees/{employee_id}",
            get(handlers::employees::get_employee),
        )
        .route(
            "/api/reports/attendance",
            get(handlers::reports::attendance_report),
        )
        .route(
            "/api/reports/summary",
            get(handlers::reports::summary_report),
        )
        .route(
            "/api/reports/department/{id}",
            get(handlers::reports::department_report),
        )
        .route(
            "/api/reports/export/attendance",
            get(handlers::reports::export_attendance),
        )
        .route(
            "/api/reports/export/summary",
            get(handlers::reports::export_summary),
        )
        .route(
            "/api/reports/export/department/{id}",
            get(handlers::reports::export_department),
        )
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::auth_manager,
        ));

    let admin_routes = Router::new()
        .route(
            "/api/departments",
            post(handlers::departments::create_department),
        )
        .route(
            "/api/departments/{id}",
            put(handlers::departments::update_department)
                .delete(handlers::departments::delete_department),
        )
        .route("/api/employees", post(handlers::employees::create_employee))
        .route(
            "/api/employees/{employee_id}",
            put(handlers::employees::update_employee)
                .delete(handlers::employees::deactivate_employee),
        )
        .route(
            "/api/employees/{employee_id}/status",
            put(handlers::employees::update_employee_status)
                .patch(handlers::employees::update_employee_status),
        )
        .route(
            "/api/employees/{employee_id}/setup-token",
            get(handlers::employees::get_setup_token),
        )
        .route("/api/auth/register", post(handlers::auth::register))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::auth_admin,
        ));

    let cors = cors_layer(&state.config.cors_allow_origin);

    Router::new()
        .merge(public_routes)
        .merge(user_routes)
        .merge(manager_routes)
        .merge(admin_routes)
        .merge(SwaggerUi::new("/api/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(
            ServiceBuilder::new()
                .layer(axum_middleware::from_fn(middleware::request_id))
                .layer(TraceLayer::new_for_http())
                .layer(axum_middleware::from_fn(middleware::log_error_responses))
                .layer(cors),
        )
        .with_state(state)
}
