use axum::{extract::State, http::StatusCode, routing::get, Json};
use lateshow_catalog::{NewEpisode, UpdatedEpisode};

use crate::{
    auth::Session,
    context::ServerContext,
    errors::ServerResult,
    schemas::{IdPath, NewEpisodeSchema, UpdateEpisodeSchema, ValidatedJson},
    serialized::{Episode, EpisodeDetail, Message, ToSerialized},
    Router,
};

#[utoipa::path(
    get,
    path = "/episodes",
    tag = "episodes",
    responses(
        (status = 200, body = Vec<Episode>)
    )
)]
async fn list_episodes(
    State(context): State<ServerContext>,
) -> ServerResult<Json<Vec<Episode>>> {
    let episodes = context.catalog.db().list_episodes().await?;

    Ok(Json(episodes.to_serialized()))
}

#[utoipa::path(
    get,
    path = "/episodes/{id}",
    tag = "episodes",
    params(("id" = i32, Path, description = "Episode id")),
    responses(
        (status = 200, description = "The episode with its appearances", body = EpisodeDetail),
        (status = 404, body = Message)
    )
)]
async fn episode(
    State(context): State<ServerContext>,
    IdPath(id): IdPath,
) -> ServerResult<Json<EpisodeDetail>> {
    let episode = context.catalog.db().episode_detail(id).await?;

    Ok(Json(episode.to_serialized()))
}

#[utoipa::path(
    post,
    path = "/episodes",
    tag = "episodes",
    request_body = NewEpisodeSchema,
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 201, body = Episode),
        (status = 401, body = Message),
        (status = 422, body = Message)
    )
)]
async fn create_episode(
    _session: Session,
    State(context): State<ServerContext>,
    ValidatedJson(body): ValidatedJson<NewEpisodeSchema>,
) -> ServerResult<(StatusCode, Json<Episode>)> {
    let episode = context
        .catalog
        .db()
        .create_episode(NewEpisode {
            date: body.date,
            number: body.number,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(episode.to_serialized())))
}

#[utoipa::path(
    patch,
    path = "/episodes/{id}",
    tag = "episodes",
    request_body = UpdateEpisodeSchema,
    params(("id" = i32, Path, description = "Episode id")),
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, body = Episode),
        (status = 401, body = Message),
        (status = 404, body = Message)
    )
)]
async fn update_episode(
    _session: Session,
    State(context): State<ServerContext>,
    IdPath(id): IdPath,
    ValidatedJson(body): ValidatedJson<UpdateEpisodeSchema>,
) -> ServerResult<Json<Episode>> {
    let episode = context
        .catalog
        .db()
        .update_episode(UpdatedEpisode {
            id,
            date: body.date,
            number: body.number,
        })
        .await?;

    Ok(Json(episode.to_serialized()))
}

#[utoipa::path(
    delete,
    path = "/episodes/{id}",
    tag = "episodes",
    params(("id" = i32, Path, description = "Episode id")),
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 204, description = "The episode and its appearances were deleted"),
        (status = 401, body = Message),
        (status = 404, body = Message)
    )
)]
async fn delete_episode(
    _session: Session,
    State(context): State<ServerContext>,
    IdPath(id): IdPath,
) -> ServerResult<StatusCode> {
    context.catalog.db().delete_episode(id).await?;

    Ok(StatusCode::NO_CONTENT)
}

pub fn router() -> Router {
    Router::new()
        .route("/episodes", get(list_episodes).post(create_episode))
        .route(
            "/episodes/:id",
            get(episode).patch(update_episode).delete(delete_episode),
        )
}
