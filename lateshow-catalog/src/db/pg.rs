use async_trait::async_trait;
use log::info;
use sqlx::{
    postgres::PgPoolOptions, query, query_as, Error as SqlxError, FromRow, PgPool, Postgres,
    Transaction,
};

use crate::{
    AppearanceData, Database, DatabaseError, DatabaseResult, EpisodeData, EpisodeDetailData,
    GuestData, IntoDatabaseError, NewAppearance, NewEpisode, NewGuest, NewUser, PrimaryKey,
    Result, UpdatedAppearance, UpdatedEpisode, UpdatedGuest, UserData,
};

/// A postgres database implementation for the Late Show API
pub struct PgDatabase {
    pool: PgPool,
}

/// An appearance joined with its guest and episode
#[derive(FromRow)]
struct AppearanceRow {
    id: PrimaryKey,
    rating: i32,
    guest_id: PrimaryKey,
    guest_name: String,
    guest_profession: String,
    episode_id: PrimaryKey,
    episode_date: String,
    episode_number: i32,
}

impl From<AppearanceRow> for AppearanceData {
    fn from(row: AppearanceRow) -> Self {
        Self {
            id: row.id,
            rating: row.rating,
            guest: GuestData {
                id: row.guest_id,
                name: row.guest_name,
                profession: row.guest_profession,
            },
            episode: EpisodeData {
                id: row.episode_id,
                date: row.episode_date,
                number: row.episode_number,
            },
        }
    }
}

fn appearance_query(filter: &str) -> String {
    format!(
        "
        SELECT
            appearances.id,
            appearances.rating,
            guests.id AS guest_id,
            guests.name AS guest_name,
            guests.profession AS guest_profession,
            episodes.id AS episode_id,
            episodes.date AS episode_date,
            episodes.number AS episode_number
        FROM appearances
            INNER JOIN guests ON appearances.guest_id = guests.id
            INNER JOIN episodes ON appearances.episode_id = episodes.id
        {filter}
        ORDER BY appearances.id"
    )
}

impl PgDatabase {
    pub async fn new(url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(url)
            .await
            .map_err(|e| e.any())?;

        Ok(Self { pool })
    }

    /// Applies the embedded migrations
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| DatabaseError::Internal(Box::new(e)))?;

        info!("Database schema is up to date");
        Ok(())
    }

    async fn appearances_where(
        &self,
        filter: &str,
        key: Option<PrimaryKey>,
    ) -> Result<Vec<AppearanceData>> {
        let sql = appearance_query(filter);
        let mut statement = query_as::<_, AppearanceRow>(&sql);

        if let Some(key) = key {
            statement = statement.bind(key);
        }

        let rows = statement
            .fetch_all(&self.pool)
            .await
            .map_err(|e| e.any())?;

        Ok(rows.into_iter().map(Into::into).collect())
    }
}

/// Locks a guest row so it can't be deleted before the transaction commits
async fn lock_guest(tx: &mut Transaction<'static, Postgres>, guest_id: PrimaryKey) -> Result<()> {
    query("SELECT id FROM guests WHERE id = $1 FOR KEY SHARE")
        .bind(guest_id)
        .fetch_optional(&mut **tx)
        .await
        .map_err(|e| e.any())?
        .map(|_| ())
        .ok_or(DatabaseError::InvalidReference {
            resource: "guest",
            field: "guest_id",
            value: guest_id,
        })
}

/// Locks an episode row so it can't be deleted before the transaction commits
async fn lock_episode(
    tx: &mut Transaction<'static, Postgres>,
    episode_id: PrimaryKey,
) -> Result<()> {
    query("SELECT id FROM episodes WHERE id = $1 FOR KEY SHARE")
        .bind(episode_id)
        .fetch_optional(&mut **tx)
        .await
        .map_err(|e| e.any())?
        .map(|_| ())
        .ok_or(DatabaseError::InvalidReference {
            resource: "episode",
            field: "episode_id",
            value: episode_id,
        })
}

async fn joined_appearance(
    tx: &mut Transaction<'static, Postgres>,
    appearance_id: PrimaryKey,
) -> Result<AppearanceData> {
    let sql = appearance_query("WHERE appearances.id = $1");

    query_as::<_, AppearanceRow>(&sql)
        .bind(appearance_id)
        .fetch_one(&mut **tx)
        .await
        .map(Into::into)
        .map_err(|e| e.not_found_or("appearance", "id"))
}

#[async_trait]
impl Database for PgDatabase {
    async fn list_guests(&self) -> Result<Vec<GuestData>> {
        query_as("SELECT * FROM guests ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| e.any())
    }

    async fn guest_by_id(&self, guest_id: PrimaryKey) -> Result<GuestData> {
        query_as("SELECT * FROM guests WHERE id = $1")
            .bind(guest_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| e.not_found_or("guest", "id"))
    }

    async fn create_guest(&self, new_guest: NewGuest) -> Result<GuestData> {
        query_as("INSERT INTO guests (name, profession) VALUES ($1, $2) RETURNING *")
            .bind(new_guest.name)
            .bind(new_guest.profession)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| e.any())
    }

    async fn update_guest(&self, updated_guest: UpdatedGuest) -> Result<GuestData> {
        query_as(
            "UPDATE guests SET
                name = COALESCE($1, name),
                profession = COALESCE($2, profession)
            WHERE id = $3
            RETURNING *",
        )
        .bind(updated_guest.name)
        .bind(updated_guest.profession)
        .bind(updated_guest.id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| e.not_found_or("guest", "id"))
    }

    async fn delete_guest(&self, guest_id: PrimaryKey) -> Result<()> {
        // Appearances go with it through ON DELETE CASCADE
        let result = query("DELETE FROM guests WHERE id = $1")
            .bind(guest_id)
            .execute(&self.pool)
            .await
            .map_err(|e| e.any())?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound {
                resource: "guest",
                identifier: "id",
            });
        }

        Ok(())
    }

    async fn list_episodes(&self) -> Result<Vec<EpisodeData>> {
        query_as("SELECT * FROM episodes ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| e.any())
    }

    async fn episode_by_id(&self, episode_id: PrimaryKey) -> Result<EpisodeData> {
        query_as("SELECT * FROM episodes WHERE id = $1")
            .bind(episode_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| e.not_found_or("episode", "id"))
    }

    async fn episode_detail(&self, episode_id: PrimaryKey) -> Result<EpisodeDetailData> {
        let episode = self.episode_by_id(episode_id).await?;
        let appearances = self
            .appearances_where("WHERE appearances.episode_id = $1", Some(episode_id))
            .await?;

        Ok(EpisodeDetailData {
            episode,
            appearances,
        })
    }

    async fn create_episode(&self, new_episode: NewEpisode) -> Result<EpisodeData> {
        query_as("INSERT INTO episodes (date, number) VALUES ($1, $2) RETURNING *")
            .bind(new_episode.date)
            .bind(new_episode.number)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| e.any())
    }

    async fn update_episode(&self, updated_episode: UpdatedEpisode) -> Result<EpisodeData> {
        query_as(
            "UPDATE episodes SET
                date = COALESCE($1, date),
                number = COALESCE($2, number)
            WHERE id = $3
            RETURNING *",
        )
        .bind(updated_episode.date)
        .bind(updated_episode.number)
        .bind(updated_episode.id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| e.not_found_or("episode", "id"))
    }

    async fn delete_episode(&self, episode_id: PrimaryKey) -> Result<()> {
        let result = query("DELETE FROM episodes WHERE id = $1")
            .bind(episode_id)
            .execute(&self.pool)
            .await
            .map_err(|e| e.any())?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound {
                resource: "episode",
                identifier: "id",
            });
        }

        Ok(())
    }

    async fn list_appearances(&self) -> Result<Vec<AppearanceData>> {
        self.appearances_where("", None).await
    }

    async fn appearance_by_id(&self, appearance_id: PrimaryKey) -> Result<AppearanceData> {
        self.appearances_where("WHERE appearances.id = $1", Some(appearance_id))
            .await?
            .pop()
            .ok_or(DatabaseError::NotFound {
                resource: "appearance",
                identifier: "id",
            })
    }

    async fn create_appearance(&self, new_appearance: NewAppearance) -> Result<AppearanceData> {
        let mut tx = self.pool.begin().await.map_err(|e| e.any())?;

        lock_guest(&mut tx, new_appearance.guest_id).await?;
        lock_episode(&mut tx, new_appearance.episode_id).await?;

        let (id,): (PrimaryKey,) = query_as(
            "INSERT INTO appearances (rating, guest_id, episode_id)
            VALUES ($1, $2, $3)
            RETURNING id",
        )
        .bind(new_appearance.rating)
        .bind(new_appearance.guest_id)
        .bind(new_appearance.episode_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| e.any())?;

        let appearance = joined_appearance(&mut tx, id).await?;
        tx.commit().await.map_err(|e| e.any())?;

        Ok(appearance)
    }

    async fn update_appearance(
        &self,
        updated_appearance: UpdatedAppearance,
    ) -> Result<AppearanceData> {
        let mut tx = self.pool.begin().await.map_err(|e| e.any())?;

        let (rating, guest_id, episode_id): (i32, PrimaryKey, PrimaryKey) = query_as(
            "SELECT rating, guest_id, episode_id FROM appearances WHERE id = $1 FOR UPDATE",
        )
        .bind(updated_appearance.id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| e.not_found_or("appearance", "id"))?;

        if let Some(guest_id) = updated_appearance.guest_id {
            lock_guest(&mut tx, guest_id).await?;
        }

        if let Some(episode_id) = updated_appearance.episode_id {
            lock_episode(&mut tx, episode_id).await?;
        }

        query("UPDATE appearances SET rating = $1, guest_id = $2, episode_id = $3 WHERE id = $4")
            .bind(updated_appearance.rating.unwrap_or(rating))
            .bind(updated_appearance.guest_id.unwrap_or(guest_id))
            .bind(updated_appearance.episode_id.unwrap_or(episode_id))
            .bind(updated_appearance.id)
            .execute(&mut *tx)
            .await
            .map_err(|e| e.any())?;

        let appearance = joined_appearance(&mut tx, updated_appearance.id).await?;
        tx.commit().await.map_err(|e| e.any())?;

        Ok(appearance)
    }

    async fn delete_appearance(&self, appearance_id: PrimaryKey) -> Result<()> {
        let result = query("DELETE FROM appearances WHERE id = $1")
            .bind(appearance_id)
            .execute(&self.pool)
            .await
            .map_err(|e| e.any())?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound {
                resource: "appearance",
                identifier: "id",
            });
        }

        Ok(())
    }

    async fn user_by_username(&self, username: &str) -> Result<UserData> {
        query_as("SELECT * FROM users WHERE username = $1")
            .bind(username)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| e.not_found_or("user", "username"))
    }

    async fn create_user(&self, new_user: NewUser) -> Result<UserData> {
        self.user_by_username(&new_user.username)
            .await
            .conflict_or_ok("user", "username", &new_user.username)?;

        query_as("INSERT INTO users (username, password) VALUES ($1, $2) RETURNING *")
            .bind(new_user.username.clone())
            .bind(new_user.password)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| match e {
                // Lost a race against another registration
                SqlxError::Database(db) if db.is_unique_violation() => DatabaseError::Conflict {
                    resource: "user",
                    field: "username",
                    value: new_user.username.clone(),
                },
                e => e.any(),
            })
    }
}

impl IntoDatabaseError for SqlxError {
    fn any(self) -> DatabaseError {
        DatabaseError::Internal(Box::new(self))
    }

    fn not_found_or(self, resource: &'static str, identifier: &'static str) -> DatabaseError {
        match self {
            SqlxError::RowNotFound => DatabaseError::NotFound {
                resource,
                identifier,
            },
            e => Self::any(e),
        }
    }
}
