// Group API handlers

use actix_web::{HttpRequest, HttpResponse, web};
use kvconf_common::{IDEMPOTENCY_KEY_HEADER, KvconfError};
use kvconf_core::{DeleteSummary, DetachOutcome, Group, group_repo::CONFIG_NOT_FOUND_IN_GROUP};

use super::{idempotency_token, json_body, model::CreateGroupRequest};
use crate::{error::AppError, model::app_state::AppState};

/// `POST /group`
#[utoipa::path(
    post,
    path = "/group",
    tag = "group",
    request_body(content = CreateGroupRequest, content_type = "application/json"),
    params(
        ("x-idempotency-key" = Option<String>, Header, description = "Client token; a repeated token is rejected")
    ),
    responses(
        (status = 201, description = "Group created", body = Group),
        (status = 400, description = "Invalid body or token"),
        (status = 409, description = "Idempotency key already used"),
        (status = 415, description = "Body is not application/json"),
        (status = 502, description = "Backend unavailable"),
        (status = 504, description = "Request deadline expired")
    )
)]
pub async fn create_group(
    req: HttpRequest,
    body: web::Bytes,
    data: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let request: CreateGroupRequest = json_body(&req, &body)?;
    let token = idempotency_token(&req)?;
    let ctx = data.op_context();

    let grp = Group::from(request);
    let (created, token) = data
        .ledger
        .create_once(&ctx, token.as_deref(), || data.groups.create(&ctx, grp))
        .await?;

    Ok(HttpResponse::Created()
        .insert_header((IDEMPOTENCY_KEY_HEADER, token))
        .json(created))
}

/// `GET /groups`
#[utoipa::path(
    get,
    path = "/groups",
    tag = "group",
    responses(
        (status = 200, description = "Matching entries, empty when none match", body = Vec<Group>),
        (status = 502, description = "Backend unavailable"),
        (status = 504, description = "Request deadline expired")
    )
)]
pub async fn list_groups(data: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    let groups = data.groups.list_all(&data.op_context()).await?;
    Ok(HttpResponse::Ok().json(groups))
}

/// `GET /group/{id}`, every version of the group
#[utoipa::path(
    get,
    path = "/group/{id}",
    tag = "group",
    params(
        ("id" = String, Path, description = "Entity id")
    ),
    responses(
        (status = 200, description = "Matching entries, empty when none match", body = Vec<Group>),
        (status = 400, description = "Invalid coordinates"),
        (status = 502, description = "Backend unavailable"),
        (status = 504, description = "Request deadline expired")
    )
)]
pub async fn get_groups_by_id(
    path: web::Path<String>,
    data: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let groups = data.groups.get_by_id(&data.op_context(), &id).await?;
    Ok(HttpResponse::Ok().json(groups))
}

/// `GET /group/{id}/{version}`
#[utoipa::path(
    get,
    path = "/group/{id}/{version}",
    tag = "group",
    params(
        ("id" = String, Path, description = "Entity id"),
        ("version" = String, Path, description = "Version")
    ),
    responses(
        (status = 200, description = "Matching entries, empty when none match", body = Vec<Group>),
        (status = 400, description = "Invalid coordinates"),
        (status = 502, description = "Backend unavailable"),
        (status = 504, description = "Request deadline expired")
    )
)]
pub async fn get_groups(
    path: web::Path<(String, String)>,
    data: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let (id, version) = path.into_inner();
    let groups = data.groups.get(&data.op_context(), &id, &version).await?;
    Ok(HttpResponse::Ok().json(groups))
}

/// `DELETE /group/{id}`, every version
#[utoipa::path(
    delete,
    path = "/group/{id}",
    tag = "group",
    params(
        ("id" = String, Path, description = "Entity id")
    ),
    responses(
        (status = 200, description = "Deleted, or nothing was stored", body = DeleteSummary),
        (status = 400, description = "Invalid coordinates"),
        (status = 502, description = "Backend unavailable"),
        (status = 504, description = "Request deadline expired")
    )
)]
pub async fn delete_group_by_id(
    path: web::Path<String>,
    data: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let deleted = data.groups.delete_by_id(&data.op_context(), &id).await?;
    Ok(HttpResponse::Ok().json(deleted))
}

/// `DELETE /group/{id}/{version}`
#[utoipa::path(
    delete,
    path = "/group/{id}/{version}",
    tag = "group",
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
pub async fn delete_group(
    path: web::Path<(String, String)>,
    data: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let (id, version) = path.into_inner();
    let deleted = data.groups.delete(&data.op_context(), &id, &version).await?;
    Ok(HttpResponse::Ok().json(deleted))
}

/// `PUT /group/{gid}/{gver}/config/{cid}/{cver}`
#[utoipa::path(
    put,
    path = "/group/{gid}/{gver}/config/{cid}/{cver}",
    tag = "group",
    params(
        ("gid" = String, Path, description = "Group id"),
        ("gver" = String, Path, description = "Group version"),
        ("cid" = String, Path, description = "Configuration id"),
        ("cver" = String, Path, description = "Configuration version")
    ),
    responses(
        (status = 200, description = "Group as stored", body = Group),
        (status = 400, description = "Invalid coordinates"),
        (status = 404, description = "Group or configuration not found"),
        (status = 409, description = "Concurrent writers kept winning"),
        (status = 502, description = "Backend unavailable"),
        (status = 504, description = "Request deadline expired")
    )
)]
pub async fn attach_config(
    path: web::Path<(String, String, String, String)>,
    data: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let (gid, gver, cid, cver) = path.into_inner();
    let group = data
        .groups
        .attach_configuration(&data.op_context(), &gid, &gver, &cid, &cver)
        .await?;
    Ok(HttpResponse::Ok().json(group))
}

/// `PUT /group/{gid}/config/{cid}`
#[utoipa::path(
    put,
    path = "/group/{gid}/config/{cid}",
    tag = "group",
    params(
        ("gid" = String, Path, description = "Group id"),
        ("cid" = String, Path, description = "Configuration id")
    ),
    responses(
        (status = 200, description = "Group as stored", body = Group),
        (status = 400, description = "Invalid coordinates"),
        (status = 404, description = "Group or configuration not found"),
        (status = 409, description = "Concurrent writers kept winning"),
        (status = 502, description = "Backend unavailable"),
        (status = 504, description = "Request deadline expired")
    )
)]
pub async fn attach_config_by_id(
    path: web::Path<(String, String)>,
    data: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let (gid, cid) = path.into_inner();
    let group = data
        .groups
        .attach_configuration_by_id(&data.op_context(), &gid, &cid)
        .await?;
    Ok(HttpResponse::Ok().json(group))
}

/// `DELETE /group/{gid}/{gver}/config/{cid}`
#[utoipa::path(
    delete,
    path = "/group/{gid}/{gver}/config/{cid}",
    tag = "group",
    params(
        ("gid" = String, Path, description = "Group id"),
        ("gver" = String, Path, description = "Group version"),
        ("cid" = String, Path, description = "Configuration id")
    ),
    responses(
        (status = 200, description = "Group as stored", body = Group),
        (status = 400, description = "Invalid coordinates"),
        (status = 404, description = "Group not found, or the configuration is not a member"),
        (status = 409, description = "Concurrent writers kept winning"),
        (status = 502, description = "Backend unavailable"),
        (status = 504, description = "Request deadline expired")
    )
)]
pub async fn detach_config(
    path: web::Path<(String, String, String)>,
    data: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let (gid, gver, cid) = path.into_inner();
    let outcome = data
        .groups
        .detach_configuration(&data.op_context(), &gid, &gver, &cid)
        .await?;
    detach_response(outcome)
}

/// `DELETE /group/{gid}/config/{cid}`
#[utoipa::path(
    delete,
    path = "/group/{gid}/config/{cid}",
    tag = "group",
    params(
        ("gid" = String, Path, description = "Group id"),
        ("cid" = String, Path, description = "Configuration id")
    ),
    responses(
        (status = 200, description = "Group as stored", body = Group),
        (status = 400, description = "Invalid coordinates"),
        (status = 404, description = "Group not found, or the configuration is not a member"),
        (status = 409, description = "Concurrent writers kept winning"),
        (status = 502, description = "Backend unavailable"),
        (status = 504, description = "Request deadline expired")
    )
)]
pub async fn detach_config_by_id(
    path: web::Path<(String, String)>,
    data: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let (gid, cid) = path.into_inner();
    let outcome = data
        .groups
        .detach_configuration_by_id(&data.op_context(), &gid, &cid)
        .await?;
    detach_response(outcome)
}

// The group is already persisted either way; a miss is still reported to the caller
fn detach_response(outcome: DetachOutcome) -> Result<HttpResponse, AppError> {
    if !outcome.removed {
        return Err(KvconfError::not_found(CONFIG_NOT_FOUND_IN_GROUP).into());
    }
    Ok(HttpResponse::Ok().json(outcome.group))
}
