use sqlx::FromRow;

/// The type used for primary keys in the database.
pub type PrimaryKey = i32;

/// A guest that has appeared, or will appear, on the show
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct GuestData {
    pub id: PrimaryKey,
    pub name: String,
    pub profession: String,
}

/// A single episode of the show
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct EpisodeData {
    pub id: PrimaryKey,
    /// The air date, as it was entered (e.g. "1/11/99")
    pub date: String,
    pub number: i32,
}

/// A guest appearing on an episode
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppearanceData {
    pub id: PrimaryKey,
    /// How the appearance was received, from 1 to 5
    pub rating: i32,
    pub guest: GuestData,
    pub episode: EpisodeData,
}

/// An episode along with every appearance on it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EpisodeDetailData {
    pub episode: EpisodeData,
    pub appearances: Vec<AppearanceData>,
}

/// An account that can log in to the API
#[derive(Debug, Clone, FromRow)]
pub struct UserData {
    pub id: PrimaryKey,
    pub username: String,
    /// The argon2 hash of the password
    pub password: String,
}
