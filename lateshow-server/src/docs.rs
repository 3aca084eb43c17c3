use axum::{response::IntoResponse, Json};
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};

use crate::{appearances, auth, episodes, guests, schemas, serialized};

#[derive(OpenApi)]
#[openapi(
    paths(
        guests::list_guests,
        guests::guest,
        guests::create_guest,
        guests::update_guest,
        guests::delete_guest,
        episodes::list_episodes,
        episodes::episode,
        episodes::create_episode,
        episodes::update_episode,
        episodes::delete_episode,
        appearances::list_appearances,
        appearances::appearance,
        appearances::create_appearance,
        appearances::update_appearance,
        appearances::delete_appearance,
        auth::register,
        auth::login,
        auth::me,
    ),
    components(schemas(
        serialized::Message,
        serialized::Guest,
        serialized::Episode,
        serialized::EpisodeDetail,
        serialized::Appearance,
        serialized::User,
        serialized::LoginResult,
        schemas::LoginSchema,
        schemas::RegisterSchema,
        schemas::NewGuestSchema,
        schemas::UpdateGuestSchema,
        schemas::NewEpisodeSchema,
        schemas::UpdateEpisodeSchema,
        schemas::NewAppearanceSchema,
        schemas::UpdateAppearanceSchema,
    )),
    modifiers(&Security),
    info(
        title = "Late Show API",
        description = "Exposes the guests, episodes and appearances of the Late Show"
    )
)]
pub struct ApiDoc;

struct Security;

impl Modify for Security {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            let scheme = HttpBuilder::new()
                .scheme(HttpAuthScheme::Bearer)
                .bearer_format("Bearer <token>")
                .build();

            components.add_security_scheme("BearerAuth", SecurityScheme::Http(scheme))
        }
    }
}

pub async fn docs() -> impl IntoResponse {
    Json(ApiDoc::openapi())
}
