//! OpenAPI documentation for the kvconf HTTP API
//!
//! The document is generated from the handler annotations. It is always
//! served as YAML at `/swagger.yaml`; the Swagger UI at `/docs` is behind the
//! `swagger` feature.

use actix_web::{HttpResponse, http::header, web};
use kvconf_common::KvconfError;
use kvconf_core::{Configuration, DeleteSummary, Group};
use utoipa::OpenApi;

use super::{config, group, health};
use super::health::HealthStatus;
use super::model::{CreateConfigRequest, CreateGroupRequest};
use crate::error::AppError;

pub const SWAGGER_YAML_PATH: &str = "/swagger.yaml";
pub const DOCS_PATH: &str = "/docs";
pub const OPENAPI_JSON_PATH: &str = "/api-docs/openapi.json";

#[derive(OpenApi)]
#[openapi(
    info(
        title = "kvconf API",
        description = "Versioned configurations and groups on a key-value store",
        license(name = "Apache-2.0", url = "https://www.apache.org/licenses/LICENSE-2.0")
    ),
    tags(
        (name = "config", description = "Configuration management APIs"),
        (name = "group", description = "Group management and composition APIs"),
        (name = "operations", description = "Health and metrics")
    ),
    paths(
        config::create_config,
        config::list_configs,
        config::get_configs_by_id,
        config::get_configs,
        config::get_configs_by_label,
        config::delete_config,
        config::delete_config_by_label,
        group::create_group,
        group::list_groups,
        group::get_groups_by_id,
        group::get_groups,
        group::delete_group_by_id,
        group::delete_group,
        group::attach_config,
        group::attach_config_by_id,
        group::detach_config,
        group::detach_config_by_id,
        health::health,
        health::metrics,
    ),
    components(schemas(
        Configuration,
        Group,
        DeleteSummary,
        CreateConfigRequest,
        CreateGroupRequest,
        HealthStatus,
    ))
)]
pub struct ApiDoc;

/// `GET /swagger.yaml`
pub async fn swagger_yaml() -> Result<HttpResponse, AppError> {
    let yaml = ApiDoc::openapi()
        .to_yaml()
        .map_err(|e| KvconfError::Serialization(e.to_string()))?;
    Ok(HttpResponse::Ok()
        .content_type("application/yaml")
        .body(yaml))
}

/// `GET /docs`: trailing slashes are trimmed before routing, so the bare
/// path is sent on to the UI's index page
pub async fn docs_index() -> HttpResponse {
    HttpResponse::Found()
        .insert_header((header::LOCATION, format!("{DOCS_PATH}/index.html")))
        .finish()
}

/// Register the document routes and, with the `swagger` feature, the UI
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route(SWAGGER_YAML_PATH, web::get().to(swagger_yaml));

    #[cfg(feature = "swagger")]
    {
        use utoipa_swagger_ui::SwaggerUi;

        cfg.route(DOCS_PATH, web::get().to(docs_index)).service(
            SwaggerUi::new(format!("{DOCS_PATH}/{{_:.*}}"))
                .url(OPENAPI_JSON_PATH, ApiDoc::openapi()),
        );
    }
}
