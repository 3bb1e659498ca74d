// Route table
// Maps HTTP routes to handler functions

use actix_web::web;

use super::{config, group, health, openapi};

/// Register every endpoint on the application
pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg
        // Configurations
        .route("/config", web::post().to(config::create_config))
        .route("/configs", web::get().to(config::list_configs))
        .route("/config/{id}", web::get().to(config::get_configs_by_id))
        .route("/config/{id}/{version}", web::get().to(config::get_configs))
        .route("/config/{id}/{version}", web::delete().to(config::delete_config))
        .route(
            "/config/{id}/{version}/{labels}",
            web::get().to(config::get_configs_by_label),
        )
        .route(
            "/config/{id}/{version}/{labels}",
            web::delete().to(config::delete_config_by_label),
        )
        // Groups
        .route("/group", web::post().to(group::create_group))
        .route("/groups", web::get().to(group::list_groups))
        .route("/group/{id}", web::get().to(group::get_groups_by_id))
        .route("/group/{id}", web::delete().to(group::delete_group_by_id))
        .route("/group/{id}/{version}", web::get().to(group::get_groups))
        .route("/group/{id}/{version}", web::delete().to(group::delete_group))
        // Group composition
        .route(
            "/group/{gid}/{gver}/config/{cid}/{cver}",
            web::put().to(group::attach_config),
        )
        .route(
            "/group/{gid}/config/{cid}",
            web::put().to(group::attach_config_by_id),
        )
        .route(
            "/group/{gid}/{gver}/config/{cid}",
            web::delete().to(group::detach_config),
        )
        .route(
            "/group/{gid}/config/{cid}",
            web::delete().to(group::detach_config_by_id),
        )
        // Operations
        .route("/health", web::get().to(health::health))
        .route("/metrics", web::get().to(health::metrics));

    // API documentation
    openapi::configure(cfg);
}
