use axum::{extract::State, http::StatusCode, routing::get, Json};
use lateshow_catalog::{NewGuest, UpdatedGuest};

use crate::{
    auth::Session,
    context::ServerContext,
    errors::ServerResult,
    schemas::{IdPath, NewGuestSchema, UpdateGuestSchema, ValidatedJson},
    serialized::{Guest, Message, ToSerialized},
    Router,
};

#[utoipa::path(
    get,
    path = "/guests",
    tag = "guests",
    responses(
        (status = 200, body = Vec<Guest>)
    )
)]
async fn list_guests(State(context): State<ServerContext>) -> ServerResult<Json<Vec<Guest>>> {
    let guests = context.catalog.db().list_guests().await?;

    Ok(Json(guests.to_serialized()))
}

#[utoipa::path(
    get,
    path = "/guests/{id}",
    tag = "guests",
    params(("id" = i32, Path, description = "Guest id")),
    responses(
        (status = 200, body = Guest),
        (status = 404, body = Message)
    )
)]
async fn guest(
    State(context): State<ServerContext>,
    IdPath(id): IdPath,
) -> ServerResult<Json<Guest>> {
    let guest = context.catalog.db().guest_by_id(id).await?;

    Ok(Json(guest.to_serialized()))
}

#[utoipa::path(
    post,
    path = "/guests",
    tag = "guests",
    request_body = NewGuestSchema,
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 201, body = Guest),
        (status = 401, body = Message),
        (status = 422, body = Message)
    )
)]
async fn create_guest(
    _session: Session,
    State(context): State<ServerContext>,
    ValidatedJson(body): ValidatedJson<NewGuestSchema>,
) -> ServerResult<(StatusCode, Json<Guest>)> {
    let guest = context
        .catalog
        .db()
        .create_guest(NewGuest {
            name: body.name,
            profession: body.profession,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(guest.to_serialized())))
}

#[utoipa::path(
    patch,
    path = "/guests/{id}",
    tag = "guests",
    request_body = UpdateGuestSchema,
    params(("id" = i32, Path, description = "Guest id")),
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, body = Guest),
        (status = 401, body = Message),
        (status = 404, body = Message)
    )
)]
async fn update_guest(
    _session: Session,
    State(context): State<ServerContext>,
    IdPath(id): IdPath,
    ValidatedJson(body): ValidatedJson<UpdateGuestSchema>,
) -> ServerResult<Json<Guest>> {
    let guest = context
        .catalog
        .db()
        .update_guest(UpdatedGuest {
            id,
            name: body.name,
            profession: body.profession,
        })
        .await?;

    Ok(Json(guest.to_serialized()))
}

#[utoipa::path(
    delete,
    path = "/guests/{id}",
    tag = "guests",
    params(("id" = i32, Path, description = "Guest id")),
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 204, description = "The guest and their appearances were deleted"),
        (status = 401, body = Message),
        (status = 404, body = Message)
    )
)]
async fn delete_guest(
    _session: Session,
    State(context): State<ServerContext>,
    IdPath(id): IdPath,
) -> ServerResult<StatusCode> {
    context.catalog.db().delete_guest(id).await?;

    Ok(StatusCode::NO_CONTENT)
}

pub fn router() -> Router {
    Router::new()
        .route("/guests", get(list_guests).post(create_guest))
        .route(
            "/guests/:id",
            get(guest).patch(update_guest).delete(delete_guest),
        )
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;

    use crate::testing::TestApp;

    #[tokio::test]
    async fn test_created_guest_can_be_fetched() {
        let app = TestApp::new();
        let token = app.token().await;

        let (status, created) = app
            .post(
                "/guests",
                Some(&token),
                json!({ "name": "Bill Murray", "profession": "actor" }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, fetched) = app.get(&format!("/guests/{}", created["id"])).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(fetched["name"], "Bill Murray");
        assert_eq!(fetched["profession"], "actor");
    }

    #[tokio::test]
    async fn test_create_requires_token() {
        let app = TestApp::new();

        let (status, body) = app
            .post(
                "/guests",
                None,
                json!({ "name": "Bill Murray", "profession": "actor" }),
            )
            .await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["message"], "Missing authorization");
        assert_eq!(app.get("/guests").await.1, json!([]));
    }

    #[tokio::test]
    async fn test_patch_and_delete_require_token() {
        let app = TestApp::new();
        let token = app.token().await;
        let guest = app.guest(&token, "Bill Murray").await;
        let uri = format!("/guests/{guest}");

        let (status, _) = app.patch(&uri, None, json!({ "name": "Nobody" })).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = app.delete(&uri, Some("not-a-token")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, fetched) = app.get(&uri).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(fetched["name"], "Bill Murray");
    }

    #[tokio::test]
    async fn test_whitespace_name_is_a_validation_error() {
        let app = TestApp::new();
        let token = app.token().await;

        let (status, _) = app
            .post(
                "/guests",
                Some(&token),
                json!({ "name": "   ", "profession": "actor" }),
            )
            .await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(app.get("/guests").await.1, json!([]));
    }

    #[tokio::test]
    async fn test_missing_field_is_a_validation_error() {
        let app = TestApp::new();
        let token = app.token().await;

        let (status, body) = app
            .post("/guests", Some(&token), json!({ "name": "Cher" }))
            .await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body["message"].as_str().unwrap().contains("profession"));
    }

    #[tokio::test]
    async fn test_patch_updates_only_given_fields() {
        let app = TestApp::new();
        let token = app.token().await;
        let (_, created) = app
            .post(
                "/guests",
                Some(&token),
                json!({ "name": "Bill Murray", "profession": "actor" }),
            )
            .await;

        let (status, updated) = app
            .patch(
                &format!("/guests/{}", created["id"]),
                Some(&token),
                json!({ "profession": "comedian" }),
            )
            .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["name"], "Bill Murray");
        assert_eq!(updated["profession"], "comedian");
    }

    #[tokio::test]
    async fn test_unknown_guest_is_not_found() {
        let app = TestApp::new();

        let (status, body) = app.get("/guests/404").await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["message"].is_string());
    }

    #[tokio::test]
    async fn test_non_numeric_id_is_a_bad_request() {
        let app = TestApp::new();

        let (status, body) = app.get("/guests/abc").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["message"].is_string());
    }
}
