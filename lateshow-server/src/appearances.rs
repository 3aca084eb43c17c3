use axum::{extract::State, http::StatusCode, routing::get, Json};
use lateshow_catalog::{NewAppearance, UpdatedAppearance};

use crate::{
    auth::Session,
    context::ServerContext,
    errors::ServerResult,
    schemas::{IdPath, NewAppearanceSchema, UpdateAppearanceSchema, ValidatedJson},
    serialized::{Appearance, Message, ToSerialized},
    Router,
};

#[utoipa::path(
    get,
    path = "/appearances",
    tag = "appearances",
    responses(
        (status = 200, body = Vec<Appearance>)
    )
)]
async fn list_appearances(
    State(context): State<ServerContext>,
) -> ServerResult<Json<Vec<Appearance>>> {
    let appearances = context.catalog.db().list_appearances().await?;

    Ok(Json(appearances.to_serialized()))
}

#[utoipa::path(
    get,
    path = "/appearances/{id}",
    tag = "appearances",
    params(("id" = i32, Path, description = "Appearance id")),
    responses(
        (status = 200, body = Appearance),
        (status = 404, body = Message)
    )
)]
async fn appearance(
    State(context): State<ServerContext>,
    IdPath(id): IdPath,
) -> ServerResult<Json<Appearance>> {
    let appearance = context.catalog.db().appearance_by_id(id).await?;

    Ok(Json(appearance.to_serialized()))
}

#[utoipa::path(
    post,
    path = "/appearances",
    tag = "appearances",
    request_body = NewAppearanceSchema,
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 201, body = Appearance),
        (status = 401, body = Message),
        (status = 422, description = "Invalid rating, or the guest or episode doesn't exist", body = Message)
    )
)]
async fn create_appearance(
    _session: Session,
    State(context): State<ServerContext>,
    ValidatedJson(body): ValidatedJson<NewAppearanceSchema>,
) -> ServerResult<(StatusCode, Json<Appearance>)> {
    let appearance = context
        .catalog
        .db()
        .create_appearance(NewAppearance {
            rating: body.rating,
            guest_id: body.guest_id,
            episode_id: body.episode_id,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(appearance.to_serialized())))
}

#[utoipa::path(
    patch,
    path = "/appearances/{id}",
    tag = "appearances",
    request_body = UpdateAppearanceSchema,
    params(("id" = i32, Path, description = "Appearance id")),
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, body = Appearance),
        (status = 401, body = Message),
        (status = 404, body = Message),
        (status = 422, body = Message)
    )
)]
async fn update_appearance(
    _session: Session,
    State(context): State<ServerContext>,
    IdPath(id): IdPath,
    ValidatedJson(body): ValidatedJson<UpdateAppearanceSchema>,
) -> ServerResult<Json<Appearance>> {
    let appearance = context
        .catalog
        .db()
        .update_appearance(UpdatedAppearance {
            id,
            rating: body.rating,
            guest_id: body.guest_id,
            episode_id: body.episode_id,
        })
        .await?;

    Ok(Json(appearance.to_serialized()))
}

#[utoipa::path(
    delete,
    path = "/appearances/{id}",
    tag = "appearances",
    params(("id" = i32, Path, description = "Appearance id")),
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 204, description = "The appearance was deleted"),
        (status = 401, body = Message),
        (status = 404, body = Message)
    )
)]
async fn delete_appearance(
    _session: Session,
    State(context): State<ServerContext>,
    IdPath(id): IdPath,
) -> ServerResult<StatusCode> {
    context.catalog.db().delete_appearance(id).await?;

    Ok(StatusCode::NO_CONTENT)
}

pub fn router() -> Router {
    Router::new()
        .route("/appearances", get(list_appearances).post(create_appearance))
        .route(
            "/appearances/:id",
            get(appearance)
                .patch(update_appearance)
                .delete(delete_appearance),
        )
}
