use std::collections::BTreeMap;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::{
    AppearanceData, Database, DatabaseError, EpisodeData, EpisodeDetailData, GuestData,
    NewAppearance, NewEpisode, NewGuest, NewUser, PrimaryKey, Result, UpdatedAppearance,
    UpdatedEpisode, UpdatedGuest, UserData,
};

/// An appearance as it is stored, before being joined
#[derive(Debug, Clone)]
struct AppearanceRow {
    id: PrimaryKey,
    rating: i32,
    guest_id: PrimaryKey,
    episode_id: PrimaryKey,
}

/// A table keyed by id, handing out ids the way a serial column does
#[derive(Debug)]
struct Table<T> {
    rows: BTreeMap<PrimaryKey, T>,
    last_id: PrimaryKey,
}

impl<T> Default for Table<T> {
    fn default() -> Self {
        Self {
            rows: BTreeMap::new(),
            last_id: 0,
        }
    }
}

impl<T> Table<T> {
    fn insert_with(&mut self, make: impl FnOnce(PrimaryKey) -> T) -> &T {
        self.last_id += 1;
        let id = self.last_id;

        self.rows.entry(id).or_insert_with(|| make(id))
    }
}

#[derive(Debug, Default)]
struct Tables {
    guests: Table<GuestData>,
    episodes: Table<EpisodeData>,
    appearances: Table<AppearanceRow>,
    users: Table<UserData>,
}

impl Tables {
    fn guest(&self, guest_id: PrimaryKey) -> Result<&GuestData> {
        self.guests.rows.get(&guest_id).ok_or(DatabaseError::NotFound {
            resource: "guest",
            identifier: "id",
        })
    }

    fn episode(&self, episode_id: PrimaryKey) -> Result<&EpisodeData> {
        self.episodes
            .rows
            .get(&episode_id)
            .ok_or(DatabaseError::NotFound {
                resource: "episode",
                identifier: "id",
            })
    }

    fn ensure_references(&self, guest_id: PrimaryKey, episode_id: PrimaryKey) -> Result<()> {
        if !self.guests.rows.contains_key(&guest_id) {
            return Err(DatabaseError::InvalidReference {
                resource: "guest",
                field: "guest_id",
                value: guest_id,
            });
        }

        if !self.episodes.rows.contains_key(&episode_id) {
            return Err(DatabaseError::InvalidReference {
                resource: "episode",
                field: "episode_id",
                value: episode_id,
            });
        }

        Ok(())
    }

    fn join(&self, row: &AppearanceRow) -> Result<AppearanceData> {
        Ok(AppearanceData {
            id: row.id,
            rating: row.rating,
            guest: self.guest(row.guest_id)?.clone(),
            episode: self.episode(row.episode_id)?.clone(),
        })
    }

    fn appearance(&self, appearance_id: PrimaryKey) -> Result<AppearanceData> {
        let row = self
            .appearances
            .rows
            .get(&appearance_id)
            .ok_or(DatabaseError::NotFound {
                resource: "appearance",
                identifier: "id",
            })?;

        self.join(row)
    }
}

/// A database kept entirely in memory.
///
/// Behaves like [crate::PgDatabase]: ids are generated in ascending order,
/// references are checked on write, and deleting a guest or episode cascades
/// to its appearances. Every mutation holds the write lock for its whole duration.
#[derive(Debug, Default)]
pub struct MemoryDatabase {
    tables: RwLock<Tables>,
}

impl MemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Database for MemoryDatabase {
    async fn list_guests(&self) -> Result<Vec<GuestData>> {
        Ok(self.tables.read().guests.rows.values().cloned().collect())
    }

    async fn guest_by_id(&self, guest_id: PrimaryKey) -> Result<GuestData> {
        self.tables.read().guest(guest_id).cloned()
    }

    async fn create_guest(&self, new_guest: NewGuest) -> Result<GuestData> {
        let mut tables = self.tables.write();

        let guest = tables.guests.insert_with(|id| GuestData {
            id,
            name: new_guest.name,
            profession: new_guest.profession,
        });

        Ok(guest.clone())
    }

    async fn update_guest(&self, updated_guest: UpdatedGuest) -> Result<GuestData> {
        let mut tables = self.tables.write();

        let guest = tables
            .guests
            .rows
            .get_mut(&updated_guest.id)
            .ok_or(DatabaseError::NotFound {
                resource: "guest",
                identifier: "id",
            })?;

        if let Some(name) = updated_guest.name {
            guest.name = name;
        }

        if let Some(profession) = updated_guest.profession {
            guest.profession = profession;
        }

        Ok(guest.clone())
    }

    async fn delete_guest(&self, guest_id: PrimaryKey) -> Result<()> {
        let mut tables = self.tables.write();

        tables
            .guests
            .rows
            .remove(&guest_id)
            .ok_or(DatabaseError::NotFound {
                resource: "guest",
                identifier: "id",
            })?;

        tables
            .appearances
            .rows
            .retain(|_, appearance| appearance.guest_id != guest_id);

        Ok(())
    }

    async fn list_episodes(&self) -> Result<Vec<EpisodeData>> {
        Ok(self.tables.read().episodes.rows.values().cloned().collect())
    }

    async fn episode_by_id(&self, episode_id: PrimaryKey) -> Result<EpisodeData> {
        self.tables.read().episode(episode_id).cloned()
    }

    async fn episode_detail(&self, episode_id: PrimaryKey) -> Result<EpisodeDetailData> {
        let tables = self.tables.read();
        let episode = tables.episode(episode_id)?.clone();

        let appearances = tables
            .appearances
            .rows
            .values()
            .filter(|row| row.episode_id == episode_id)
            .map(|row| tables.join(row))
            .collect::<Result<Vec<_>>>()?;

        Ok(EpisodeDetailData {
            episode,
            appearances,
        })
    }

    async fn create_episode(&self, new_episode: NewEpisode) -> Result<EpisodeData> {
        let mut tables = self.tables.write();

        let episode = tables.episodes.insert_with(|id| EpisodeData {
            id,
            date: new_episode.date,
            number: new_episode.number,
        });

        Ok(episode.clone())
    }

    async fn update_episode(&self, updated_episode: UpdatedEpisode) -> Result<EpisodeData> {
        let mut tables = self.tables.write();

        let episode = tables
            .episodes
            .rows
            .get_mut(&updated_episode.id)
            .ok_or(DatabaseError::NotFound {
                resource: "episode",
                identifier: "id",
            })?;

        if let Some(date) = updated_episode.date {
            episode.date = date;
        }

        if let Some(number) = updated_episode.number {
            episode.number = number;
        }

        Ok(episode.clone())
    }

    async fn delete_episode(&self, episode_id: PrimaryKey) -> Result<()> {
        let mut tables = self.tables.write();

        tables
            .episodes
            .rows
            .remove(&episode_id)
            .ok_or(DatabaseError::NotFound {
                resource: "episode",
                identifier: "id",
            })?;

        tables
            .appearances
            .rows
            .retain(|_, appearance| appearance.episode_id != episode_id);

        Ok(())
    }

    async fn list_appearances(&self) -> Result<Vec<AppearanceData>> {
        let tables = self.tables.read();

        tables
            .appearances
            .rows
            .values()
            .map(|row| tables.join(row))
            .collect()
    }

    async fn appearance_by_id(&self, appearance_id: PrimaryKey) -> Result<AppearanceData> {
        self.tables.read().appearance(appearance_id)
    }

    async fn create_appearance(&self, new_appearance: NewAppearance) -> Result<AppearanceData> {
        let mut tables = self.tables.write();

        tables.ensure_references(new_appearance.guest_id, new_appearance.episode_id)?;

        let id = tables
            .appearances
            .insert_with(|id| AppearanceRow {
                id,
                rating: new_appearance.rating,
                guest_id: new_appearance.guest_id,
                episode_id: new_appearance.episode_id,
            })
            .id;

        tables.appearance(id)
    }

    async fn update_appearance(
        &self,
        updated_appearance: UpdatedAppearance,
    ) -> Result<AppearanceData> {
        let mut tables = self.tables.write();

        let current = tables
            .appearances
            .rows
            .get(&updated_appearance.id)
            .cloned()
            .ok_or(DatabaseError::NotFound {
                resource: "appearance",
                identifier: "id",
            })?;

        let updated = AppearanceRow {
            id: current.id,
            rating: updated_appearance.rating.unwrap_or(current.rating),
            guest_id: updated_appearance.guest_id.unwrap_or(current.guest_id),
            episode_id: updated_appearance.episode_id.unwrap_or(current.episode_id),
        };

        tables.ensure_references(updated.guest_id, updated.episode_id)?;
        tables.appearances.rows.insert(updated.id, updated);

        tables.appearance(updated_appearance.id)
    }

    async fn delete_appearance(&self, appearance_id: PrimaryKey) -> Result<()> {
        self.tables
            .write()
            .appearances
            .rows
            .remove(&appearance_id)
            .map(|_| ())
            .ok_or(DatabaseError::NotFound {
                resource: "appearance",
                identifier: "id",
            })
    }

    async fn user_by_username(&self, username: &str) -> Result<UserData> {
        self.tables
            .read()
            .users
            .rows
            .values()
            .find(|user| user.username == username)
            .cloned()
            .ok_or(DatabaseError::NotFound {
                resource: "user",
                identifier: "username",
            })
    }

    async fn create_user(&self, new_user: NewUser) -> Result<UserData> {
        let mut tables = self.tables.write();

        if tables
            .users
            .rows
            .values()
            .any(|user| user.username == new_user.username)
        {
            return Err(DatabaseError::Conflict {
                resource: "user",
                field: "username",
                value: new_user.username,
            });
        }

        let user = tables.users.insert_with(|id| UserData {
            id,
            username: new_user.username,
            password: new_user.password,
        });

        Ok(user.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn seeded() -> (MemoryDatabase, GuestData, EpisodeData) {
        let db = MemoryDatabase::new();

        let guest = db
            .create_guest(NewGuest {
                name: "Michael J. Fox".to_string(),
                profession: "actor".to_string(),
            })
            .await
            .unwrap();

        let episode = db
            .create_episode(NewEpisode {
                date: "1/11/99".to_string(),
                number: 1,
            })
            .await
            .unwrap();

        (db, guest, episode)
    }

    #[tokio::test]
    async fn test_created_guest_can_be_fetched() {
        let (db, guest, _) = seeded().await;

        let fetched = db.guest_by_id(guest.id).await.unwrap();

        assert_eq!(fetched.name, "Michael J. Fox");
        assert_eq!(fetched.profession, "actor");
    }

    #[tokio::test]
    async fn test_missing_guest_is_not_found() {
        let db = MemoryDatabase::new();

        let result = db.guest_by_id(42).await;

        assert!(matches!(
            result,
            Err(DatabaseError::NotFound {
                resource: "guest",
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_listing_is_ordered_by_id() {
        let db = MemoryDatabase::new();

        for name in ["Sandra Bernhard", "Tracey Ullman", "Gillian Anderson"] {
            db.create_guest(NewGuest {
                name: name.to_string(),
                profession: "comedian".to_string(),
            })
            .await
            .unwrap();
        }

        let ids: Vec<_> = db
            .list_guests()
            .await
            .unwrap()
            .into_iter()
            .map(|g| g.id)
            .collect();

        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_ids_are_not_reused_after_delete() {
        let (db, guest, _) = seeded().await;
        db.delete_guest(guest.id).await.unwrap();

        let next = db
            .create_guest(NewGuest {
                name: "David Alan Grier".to_string(),
                profession: "actor".to_string(),
            })
            .await
            .unwrap();

        assert!(next.id > guest.id);
    }

    #[tokio::test]
    async fn test_partial_update_keeps_other_fields() {
        let (db, guest, _) = seeded().await;

        let updated = db
            .update_guest(UpdatedGuest {
                id: guest.id,
                profession: Some("author".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(updated.name, guest.name);
        assert_eq!(updated.profession, "author");
    }

    #[tokio::test]
    async fn test_appearance_with_missing_guest_is_rejected() {
        let (db, _, episode) = seeded().await;

        let result = db
            .create_appearance(NewAppearance {
                rating: 4,
                guest_id: 999,
                episode_id: episode.id,
            })
            .await;

        assert!(matches!(
            result,
            Err(DatabaseError::InvalidReference {
                field: "guest_id",
                value: 999,
                ..
            })
        ));
        assert!(db.list_appearances().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_appearance_update_checks_references() {
        let (db, guest, episode) = seeded().await;
        let appearance = db
            .create_appearance(NewAppearance {
                rating: 4,
                guest_id: guest.id,
                episode_id: episode.id,
            })
            .await
            .unwrap();

        let result = db
            .update_appearance(UpdatedAppearance {
                id: appearance.id,
                episode_id: Some(77),
                ..Default::default()
            })
            .await;

        assert!(matches!(
            result,
            Err(DatabaseError::InvalidReference {
                field: "episode_id",
                ..
            })
        ));

        // The failed update left the row untouched
        let stored = db.appearance_by_id(appearance.id).await.unwrap();
        assert_eq!(stored, appearance);
    }

    #[tokio::test]
    async fn test_deleting_guest_cascades_to_appearances() {
        let (db, guest, episode) = seeded().await;
        db.create_appearance(NewAppearance {
            rating: 5,
            guest_id: guest.id,
            episode_id: episode.id,
        })
        .await
        .unwrap();

        db.delete_guest(guest.id).await.unwrap();

        assert!(db.list_appearances().await.unwrap().is_empty());
        assert!(db.episode_detail(episode.id).await.unwrap().appearances.is_empty());
    }

    #[tokio::test]
    async fn test_deleting_episode_cascades_to_appearances() {
        let (db, guest, episode) = seeded().await;
        let appearance = db
            .create_appearance(NewAppearance {
                rating: 2,
                guest_id: guest.id,
                episode_id: episode.id,
            })
            .await
            .unwrap();

        db.delete_episode(episode.id).await.unwrap();

        assert!(matches!(
            db.appearance_by_id(appearance.id).await,
            Err(DatabaseError::NotFound { .. })
        ));
        assert!(db.guest_by_id(guest.id).await.is_ok());
    }

    #[tokio::test]
    async fn test_duplicate_username_conflicts() {
        let db = MemoryDatabase::new();
        let new_user = || NewUser {
            username: "letterman".to_string(),
            password: "hash".to_string(),
        };

        db.create_user(new_user()).await.unwrap();
        let result = db.create_user(new_user()).await;

        assert!(matches!(result, Err(DatabaseError::Conflict { .. })));
    }
}
