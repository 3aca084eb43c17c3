use axum::{
    async_trait,
    extract::{FromRequestParts, State},
    http::{header, request::Parts, StatusCode},
    routing::{get, post},
    Json,
};
use lateshow_catalog::{Claims, Credentials};

use crate::{
    context::ServerContext,
    errors::{ServerError, ServerResult},
    schemas::{LoginSchema, RegisterSchema, ValidatedJson},
    serialized::{LoginResult, Message, ToSerialized, User},
    Router,
};

/// Wraps the verified [Claims] of a bearer token so [FromRequestParts] can be implemented for it
pub struct Session(Claims);

impl Session {
    pub fn claims(&self) -> &Claims {
        &self.0
    }
}

#[async_trait]
impl FromRequestParts<ServerContext> for Session {
    type Rejection = ServerError;

    async fn from_request_parts(
        parts: &mut Parts,
        context: &ServerContext,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|x| x.to_str().ok())
            .ok_or_else(|| ServerError::Unauthorized("Missing authorization".to_string()))?;

        let parts: Vec<_> = header.split_ascii_whitespace().collect();

        let token = match parts.as_slice() {
            [scheme, token] if scheme.eq_ignore_ascii_case("Bearer") => *token,
            _ => {
                return Err(ServerError::Unauthorized(
                    "Authorization must be Bearer".to_string(),
                ))
            }
        };

        let claims = context.catalog.auth.verify(token)?;

        Ok(Self(claims))
    }
}

#[utoipa::path(
    post,
    path = "/auth/register",
    tag = "auth",
    request_body = RegisterSchema,
    responses(
        (status = 201, body = User),
        (status = 409, description = "Username is taken", body = Message),
        (status = 422, description = "Request body is invalid", body = Message)
    )
)]
async fn register(
    State(context): State<ServerContext>,
    ValidatedJson(body): ValidatedJson<RegisterSchema>,
) -> ServerResult<(StatusCode, Json<User>)> {
    let user = context
        .catalog
        .auth
        .register(Credentials {
            username: body.username,
            password: body.password,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(user.to_serialized())))
}

#[utoipa::path(
    post,
    path = "/auth/login",
    tag = "auth",
    request_body = LoginSchema,
    responses(
        (status = 200, body = LoginResult),
        (status = 401, description = "Invalid credentials", body = Message)
    )
)]
async fn login(
    State(context): State<ServerContext>,
    ValidatedJson(body): ValidatedJson<LoginSchema>,
) -> ServerResult<Json<LoginResult>> {
    let issued = context
        .catalog
        .auth
        .login(Credentials {
            username: body.username,
            password: body.password,
        })
        .await?;

    Ok(Json(issued.to_serialized()))
}

#[utoipa::path(
    get,
    path = "/auth/me",
    tag = "auth",
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, body = User),
        (status = 401, description = "Missing or invalid token", body = Message)
    )
)]
async fn me(session: Session) -> Json<User> {
    Json(session.claims().to_serialized())
}

pub fn router() -> Router {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/me", get(me))
}

#[cfg(test)]
mod tests {
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
    };

    use crate::testing::{TestApp, USERNAME};

    fn me_with(authorization: &str) -> Request<Body> {
        Request::builder()
            .uri("/auth/me")
            .header(header::AUTHORIZATION, authorization)
            .body(Body::empty())
            .unwrap()
    }

    #[tokio::test]
    async fn test_bearer_scheme_is_case_insensitive() {
        let app = TestApp::new();
        let token = app.token().await;

        for scheme in ["Bearer", "bearer", "BEARER"] {
            let (status, me) = app.send(me_with(&format!("{scheme} {token}"))).await;

            assert_eq!(status, StatusCode::OK, "scheme {scheme}");
            assert_eq!(me["username"], USERNAME);
        }
    }

    #[tokio::test]
    async fn test_other_schemes_are_unauthorized() {
        let app = TestApp::new();
        let token = app.token().await;

        let (status, _) = app.send(me_with(&format!("Basic {token}"))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = app.send(me_with(&token)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
}
