// Configuration API handlers

use actix_web::{HttpRequest, HttpResponse, web};
use kvconf_common::IDEMPOTENCY_KEY_HEADER;
use kvconf_core::{Configuration, DeleteSummary};

use super::{idempotency_token, json_body, model::CreateConfigRequest};
use crate::{error::AppError, model::app_state::AppState};

/// `POST /config`
#[utoipa::path(
    post,
    path = "/config",
    tag = "config",
    request_body(content = CreateConfigRequest, content_type = "application/json"),
    params(
        ("x-idempotency-key" = Option<String>, Header, description = "Client token; a repeated token is rejected")
    ),
    responses(
        (status = 201, description = "Configuration created", body = Configuration),
        (status = 400, description = "Invalid body or token"),
        (status = 409, description = "Idempotency key already used"),
        (status = 415, description = "Body is not application/json"),
        (status = 502, description = "Backend unavailable"),
        (status = 504, description = "Request deadline expired")
    )
)]
pub async fn create_config(
    req: HttpRequest,
    body: web::Bytes,
    data: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let request: CreateConfigRequest = json_body(&req, &body)?;
    let token = idempotency_token(&req)?;
    let ctx = data.op_context();

    let cfg = Configuration::from(request);
    let (created, token) = data
        .ledger
        .create_once(&ctx, token.as_deref(), || data.configs.create(&ctx, cfg))
        .await?;

    Ok(HttpResponse::Created()
        .insert_header((IDEMPOTENCY_KEY_HEADER, token))
        .json(created))
}

/// `GET /configs`
#[utoipa::path(
    get,
    path = "/configs",
    tag = "config",
    responses(
        (status = 200, description = "Matching entries, empty when none match", body = Vec<Configuration>),
        (status = 502, description = "Backend unavailable"),
        (status = 504, description = "Request deadline expired")
    )
)]
pub async fn list_configs(data: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    let configs = data.configs.list_all(&data.op_context()).await?;
    Ok(HttpResponse::Ok().json(configs))
}

/// `GET /config/{id}`, every version and label of the id
#[utoipa::path(
    get,
    path = "/config/{id}",
    tag = "config",
    params(
        ("id" = String, Path, description = "Entity id")
    ),
    responses(
        (status = 200, description = "Matching entries, empty when none match", body = Vec<Configuration>),
        (status = 400, description = "Invalid coordinates"),
        (status = 502, description = "Backend unavailable"),
        (status = 504, description = "Request deadline expired")
    )
)]
pub async fn get_configs_by_id(
    path: web::Path<String>,
    data: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let configs = data.configs.get_by_id(&data.op_context(), &id).await?;
    Ok(HttpResponse::Ok().json(configs))
}

/// `GET /config/{id}/{version}`, every label
#[utoipa::path(
    get,
    path = "/config/{id}/{version}",
    tag = "config",
    params(
        ("id" = String, Path, description = "Entity id"),
        ("version" = String, Path, description = "Version")
    ),
    responses(
        (status = 200, description = "Matching entries, empty when none match", body = Vec<Configuration>),
        (status = 400, description = "Invalid coordinates"),
        (status = 502, description = "Backend unavailable"),
        (status = 504, description = "Request deadline expired")
    )
)]
pub async fn get_configs(
    path: web::Path<(String, String)>,
    data: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let (id, version) = path.into_inner();
    let configs = data
        .configs
        .get_by_coordinates(&data.op_context(), &id, &version, "")
        .await?;
    Ok(HttpResponse::Ok().json(configs))
}

/// `GET /config/{id}/{version}/{labels}`
#[utoipa::path(
    get,
    path = "/config/{id}/{version}/{labels}",
    tag = "config",
    params(
        ("id" = String, Path, description = "Entity id"),
        ("version" = String, Path, description = "Version"),
        ("labels" = String, Path, description = "Label")
    ),
    responses(
        (status = 200, description = "Matching entries, empty when none match", body = Vec<Configuration>),
        (status = 400, description = "Invalid coordinates"),
        (status = 502, description = "Backend unavailable"),
        (status = 504, description = "Request deadline expired")
    )
)]
pub async fn get_configs_by_label(
    path: web::Path<(String, String, String)>,
    data: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let (id, version, labels) = path.into_inner();
    let configs = data
        .configs
        .get_by_coordinates(&data.op_context(), &id, &version, &labels)
        .await?;
    Ok(HttpResponse::Ok().json(configs))
}

/// `DELETE /config/{id}/{version}`
#[utoipa::path(
    delete,
    path = "/config/{id}/{version}",
    tag = "config",
    params(
        ("id" = String, Path, description = "Entity id"),
        ("version" = String, Path, description = "Version")
    ),
    responses(
        (status = 200, description = "Deleted, or nothing was stored", body = DeleteSummary),
        (status = 400, description = "Invalid coordinates"),
        (status = 502, description = "Backend unavailable"),
        (status = 504, description = "Request deadline expired")
    )
)]
pub async fn delete_config(
    path: web::Path<(String, String)>,
    data: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let (id, version) = path.into_inner();
    let deleted = data.configs.delete(&data.op_context(), &id, &version).await?;
    Ok(HttpResponse::Ok().json(deleted))
}

/// `DELETE /config/{id}/{version}/{labels}`
#[utoipa::path(
    delete,
    path = "/config/{id}/{version}/{labels}",
    tag = "config",
    params(
        ("id" = String, Path, description = "Entity id"),
        ("version" = String, Path, description = "Version"),
        ("labels" = String, Path, description = "Label")
    ),
    responses(
        (status = 200, description = "Deleted, or nothing was stored", body = DeleteSummary),
        (status = 400, description = "Invalid coordinates"),
        (status = 502, description = "Backend unavailable"),
        (status = 504, description = "Request deadline expired")
    )
)]
pub async fn delete_config_by_label(
    path: web::Path<(String, String, String)>,
    data: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let (id, version, labels) = path.into_inner();
    let deleted = data
        .configs
        .delete_by_label(&data.op_context(), &id, &version, &labels)
        .await?;
    Ok(HttpResponse::Ok().json(deleted))
}
