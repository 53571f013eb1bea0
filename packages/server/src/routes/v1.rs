use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::config::AppConfig;
use crate::handlers;
use crate::state::AppState;

pub fn routes(config: &AppConfig) -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .nest("/auth", auth_routes())
        .nest("/workshops", workshop_routes())
        .nest("/registrations", registration_routes())
        .nest("/payments", payment_routes())
        .nest("/admin", admin_routes())
        .nest("/upload", upload_routes(config.upload.max_bytes))
}

fn auth_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(handlers::auth::register))
        .routes(routes!(handlers::auth::login))
        .routes(routes!(handlers::auth::logout))
        .routes(routes!(handlers::auth::me))
}

fn workshop_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(
            handlers::workshop::list_workshops,
            handlers::workshop::create_workshop
        ))
        .routes(routes!(
            handlers::workshop::get_workshop,
            handlers::workshop::update_workshop,
            handlers::workshop::delete_workshop
        ))
}

fn registration_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(
            handlers::registration::list_registrations,
            handlers::registration::create_registration
        ))
        .routes(routes!(
            handlers::registration::get_registration,
            handlers::registration::update_registration,
            handlers::registration::delete_registration
        ))
}

fn payment_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(handlers::payment::verify_payment))
        .routes(routes!(handlers::payment::payment_webhook))
}

fn admin_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(handlers::admin::verify_payment_decision))
        .routes(routes!(handlers::admin::list_admin_registrations))
        .routes(routes!(handlers::admin::approve_registration))
        .routes(routes!(handlers::admin::reject_registration))
        .routes(routes!(handlers::admin::stats))
}

fn upload_routes(max_bytes: usize) -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(handlers::upload::upload_file))
        .layer(handlers::upload::upload_body_limit(max_bytes))
}
