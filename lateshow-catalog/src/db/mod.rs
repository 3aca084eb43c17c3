use async_trait::async_trait;
use thiserror::Error;

mod data;
pub use data::*;

mod memory;
pub use memory::*;

mod pg;
pub use pg::*;

pub type Result<T> = std::result::Result<T, DatabaseError>;

#[derive(Debug, Error)]
pub enum DatabaseError {
    /// An unknown or internal error happened with the database
    #[error(transparent)]
    Internal(Box<dyn std::error::Error + Send + Sync>),
    /// A resource already exists
    #[error("{resource} with {field} of value {value} already exists")]
    Conflict {
        /// The resource in question
        resource: &'static str,
        /// The field that is conflicting
        field: &'static str,
        /// The conflicting value
        value: String,
    },
    /// A resource in the database doesn't exist
    #[error("{resource}:{identifier} doesn't exist")]
    NotFound {
        resource: &'static str,
        identifier: &'static str,
    },
    /// A write points at a row that doesn't exist
    #[error("{field} refers to a {resource} that doesn't exist: {value}")]
    InvalidReference {
        /// The referenced resource
        resource: &'static str,
        /// The field holding the reference
        field: &'static str,
        value: PrimaryKey,
    },
}

/// Helper trait to reduce boilerplate
pub trait IntoDatabaseError {
    fn not_found_or(self, resource: &'static str, identifier: &'static str) -> DatabaseError;
    fn any(self) -> DatabaseError;
}

/// Helper trait to reduce boilerplate
pub trait DatabaseResult {
    /// Turns the Result into a conflict error if it's Ok()
    fn conflict_or_ok(self, resource: &'static str, field: &'static str, value: &str)
        -> Result<()>;
}

impl<T> DatabaseResult for Result<T> {
    fn conflict_or_ok(
        self,
        resource: &'static str,
        field: &'static str,
        value: &str,
    ) -> Result<()> {
        match self {
            Ok(_) => Err(DatabaseError::Conflict {
                resource,
                field,
                value: value.to_string(),
            }),
            Err(e) => match e {
                DatabaseError::NotFound {
                    resource: _,
                    identifier: _,
                } => Ok(()),
                e => Err(e),
            },
        }
    }
}

/// Represents a type that can store and fetch Late Show data.
///
/// Listing operations return rows in ascending id order. Deleting a guest or an
/// episode also deletes every appearance referencing it.
#[async_trait]
pub trait Database: Send + Sync {
    async fn list_guests(&self) -> Result<Vec<GuestData>>;
    async fn guest_by_id(&self, guest_id: PrimaryKey) -> Result<GuestData>;
    async fn create_guest(&self, new_guest: NewGuest) -> Result<GuestData>;
    async fn update_guest(&self, updated_guest: UpdatedGuest) -> Result<GuestData>;
    async fn delete_guest(&self, guest_id: PrimaryKey) -> Result<()>;

    async fn list_episodes(&self) -> Result<Vec<EpisodeData>>;
    async fn episode_by_id(&self, episode_id: PrimaryKey) -> Result<EpisodeData>;
    async fn episode_detail(&self, episode_id: PrimaryKey) -> Result<EpisodeDetailData>;
    async fn create_episode(&self, new_episode: NewEpisode) -> Result<EpisodeData>;
    async fn update_episode(&self, updated_episode: UpdatedEpisode) -> Result<EpisodeData>;
    async fn delete_episode(&self, episode_id: PrimaryKey) -> Result<()>;

    async fn list_appearances(&self) -> Result<Vec<AppearanceData>>;
    async fn appearance_by_id(&self, appearance_id: PrimaryKey) -> Result<AppearanceData>;
    async fn create_appearance(&self, new_appearance: NewAppearance) -> Result<AppearanceData>;
    async fn update_appearance(
        &self,
        updated_appearance: UpdatedAppearance,
    ) -> Result<AppearanceData>;
    async fn delete_appearance(&self, appearance_id: PrimaryKey) -> Result<()>;

    async fn user_by_username(&self, username: &str) -> Result<UserData>;
    async fn create_user(&self, new_user: NewUser) -> Result<UserData>;
}

#[derive(Debug, Clone)]
pub struct NewGuest {
    pub name: String,
    pub profession: String,
}

#[derive(Debug, Default)]
pub struct UpdatedGuest {
    pub id: PrimaryKey,
    pub name: Option<String>,
    pub profession: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewEpisode {
    pub date: String,
    pub number: i32,
}

#[derive(Debug, Default)]
pub struct UpdatedEpisode {
    pub id: PrimaryKey,
    pub date: Option<String>,
    pub number: Option<i32>,
}

#[derive(Debug, Clone)]
pub struct NewAppearance {
    pub rating: i32,
    pub guest_id: PrimaryKey,
    pub episode_id: PrimaryKey,
}

#[derive(Debug, Default)]
pub struct UpdatedAppearance {
    pub id: PrimaryKey,
    pub rating: Option<i32>,
    pub guest_id: Option<PrimaryKey>,
    pub episode_id: Option<PrimaryKey>,
}

#[derive(Debug)]
pub struct NewUser {
    pub username: String,
    /// Already hashed
    pub password: String,
}
