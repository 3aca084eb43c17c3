//! All schemas that are exposed from endpoints are defined here
//! along with the conversions from catalog data

use chrono::{DateTime, Utc};
use lateshow_catalog::{
    AppearanceData, Claims, EpisodeData, EpisodeDetailData, GuestData, IssuedToken, UserData,
};
use serde::Serialize;
use utoipa::ToSchema;

/// A plain message, also used as the body of every error
#[derive(Debug, Serialize, ToSchema)]
pub struct Message {
    pub message: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct Guest {
    id: i32,
    name: String,
    profession: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct Episode {
    id: i32,
    date: String,
    number: i32,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct EpisodeDetail {
    id: i32,
    date: String,
    number: i32,
    appearances: Vec<Appearance>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct Appearance {
    id: i32,
    rating: i32,
    guest_id: i32,
    episode_id: i32,
    guest: Guest,
    episode: Episode,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct User {
    id: i32,
    username: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LoginResult {
    token: String,
    /// Always "Bearer"
    token_type: String,
    expires_at: DateTime<Utc>,
    user: User,
}

/// Helper trait to convert any type into a serialized version
pub trait ToSerialized<T>
where
    T: Serialize,
{
    fn to_serialized(&self) -> T;
}

impl<I, O> ToSerialized<Vec<O>> for Vec<I>
where
    I: ToSerialized<O>,
    O: Serialize,
{
    fn to_serialized(&self) -> Vec<O> {
        self.iter().map(|x| x.to_serialized()).collect()
    }
}

impl ToSerialized<Guest> for GuestData {
    fn to_serialized(&self) -> Guest {
        Guest {
            id: self.id,
            name: self.name.clone(),
            profession: self.profession.clone(),
        }
    }
}

impl ToSerialized<Episode> for EpisodeData {
    fn to_serialized(&self) -> Episode {
        Episode {
            id: self.id,
            date: self.date.clone(),
            number: self.number,
        }
    }
}

impl ToSerialized<EpisodeDetail> for EpisodeDetailData {
    fn to_serialized(&self) -> EpisodeDetail {
        EpisodeDetail {
            id: self.episode.id,
            date: self.episode.date.clone(),
            number: self.episode.number,
            appearances: self.appearances.to_serialized(),
        }
    }
}

impl ToSerialized<Appearance> for AppearanceData {
    fn to_serialized(&self) -> Appearance {
        Appearance {
            id: self.id,
            rating: self.rating,
            guest_id: self.guest.id,
            episode_id: self.episode.id,
            guest: self.guest.to_serialized(),
            episode: self.episode.to_serialized(),
        }
    }
}

impl ToSerialized<User> for UserData {
    fn to_serialized(&self) -> User {
        User {
            id: self.id,
            username: self.username.clone(),
        }
    }
}

impl ToSerialized<User> for Claims {
    fn to_serialized(&self) -> User {
        User {
            id: self.sub,
            username: self.username.clone(),
        }
    }
}

impl ToSerialized<LoginResult> for IssuedToken {
    fn to_serialized(&self) -> LoginResult {
        LoginResult {
            token: self.token.clone(),
            token_type: "Bearer".to_string(),
            expires_at: self.expires_at,
            user: self.user.to_serialized(),
        }
    }
}
