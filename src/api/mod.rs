pub mod connectors;
pub mod health;
pub mod response;

use actix_web::web;

/// Configure all API routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    // Health endpoints
    cfg.route("/health", web::get().to(health::health_check))
        .route("/status", web::get().to(health::status));

    // Catalog routes are registered before /{id} so "types" is never read as a connector id
    cfg.service(
        web::scope("/api/connectors")
            .route("/types", web::get().to(connectors::list_types))
            .route("/types/{dialect}", web::get().to(connectors::get_type))
            .route("", web::get().to(connectors::list_connectors))
            .route("", web::post().to(connectors::create_connector))
            .route("/{id}", web::get().to(connectors::get_connector))
            .route("/{id}", web::put().to(connectors::update_connector))
            .route("/{id}", web::delete().to(connectors::delete_connector))
    );
}
