//! SQLite-backed catalog implementation.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use super::{
    ActorFields, ActorRecord, ActorUpsert, CastEntry, CatalogError, CatalogStats, CatalogStore,
    CommentRecord, Favorite, FilmographyEntry, MovieFields, MovieRecord, MovieRef,
};

const MOVIE_COLUMNS: &str = "id, external_id, title, original_title, overview, poster_path,
    backdrop_path, release_date, vote_average, vote_count, popularity, genres_json,
    videos_json, cast_json, directors_json, created_at, last_updated";

const ACTOR_COLUMNS: &str = "id, external_id, name, profile_path, biography, birthday,
    place_of_birth, popularity, created_at, updated_at";

/// SQLite-backed catalog store.
pub struct SqliteCatalogStore {
    conn: Mutex<Connection>,
}

impl SqliteCatalogStore {
    /// Create a new SQLite catalog, creating the database file and tables if needed.
    pub fn new(path: &Path) -> Result<Self, CatalogError> {
        let conn = Connection::open(path).map_err(|e| CatalogError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory SQLite catalog (useful for testing).
    pub fn in_memory() -> Result<Self, CatalogError> {
        let conn =
            Connection::open_in_memory().map_err(|e| CatalogError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), CatalogError> {
        conn.execute_batch(
            r#"
            -- Movies (one row per provider movie)
            CREATE TABLE IF NOT EXISTS movies (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                external_id INTEGER NOT NULL UNIQUE,
                title TEXT NOT NULL,
                original_title TEXT,
                overview TEXT,
                poster_path TEXT,
                backdrop_path TEXT,
                release_date TEXT,
                vote_average REAL,
                vote_count INTEGER,
                popularity REAL,
                genres_json TEXT NOT NULL DEFAULT '[]',
                videos_json TEXT NOT NULL DEFAULT '[]',
                cast_json TEXT NOT NULL DEFAULT '[]',
                directors_json TEXT NOT NULL DEFAULT '[]',
                created_at TEXT NOT NULL,
                last_updated TEXT NOT NULL
            );

            -- Actors (created lazily on first credit, never deleted)
            CREATE TABLE IF NOT EXISTS actors (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                external_id INTEGER NOT NULL UNIQUE,
                name TEXT NOT NULL,
                profile_path TEXT,
                biography TEXT,
                birthday TEXT,
                place_of_birth TEXT,
                popularity REAL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            -- Actor side of the relationship, one row per (actor, movie)
            CREATE TABLE IF NOT EXISTS filmography (
                actor_id INTEGER NOT NULL,
                movie_id INTEGER NOT NULL,
                character_name TEXT NOT NULL,
                ord INTEGER NOT NULL DEFAULT 0,
                updated_at TEXT NOT NULL,
                PRIMARY KEY (actor_id, movie_id)
            );

            CREATE INDEX IF NOT EXISTS idx_filmography_movie ON filmography(movie_id);

            CREATE TABLE IF NOT EXISTS comments (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                movie_id INTEGER NOT NULL,
                user_id TEXT NOT NULL,
                body TEXT NOT NULL,
                created_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_comments_movie ON comments(movie_id);

            CREATE TABLE IF NOT EXISTS favorites (
                user_id TEXT NOT NULL,
                movie_id INTEGER NOT NULL,
                added_at TEXT NOT NULL,
                PRIMARY KEY (user_id, movie_id)
            );

            CREATE INDEX IF NOT EXISTS idx_favorites_movie ON favorites(movie_id);
            "#,
        )
        .map_err(|e| CatalogError::Database(e.to_string()))?;

        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, CatalogError> {
        self.conn
            .lock()
            .map_err(|_| CatalogError::Database("connection mutex poisoned".to_string()))
    }

    /// Add a comment on a movie.
    pub fn add_comment(
        &self,
        movie_id: i64,
        user_id: &str,
        body: &str,
    ) -> Result<CommentRecord, CatalogError> {
        let conn = self.lock()?;
        let now = Utc::now();
        conn.execute(
            "INSERT INTO comments (movie_id, user_id, body, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![movie_id, user_id, body, now.to_rfc3339()],
        )
        .map_err(|e| CatalogError::Database(e.to_string()))?;

        Ok(CommentRecord {
            id: conn.last_insert_rowid(),
            movie_ref: movie_id,
            user_id: user_id.to_string(),
            body: body.to_string(),
            created_at: now,
        })
    }

    /// Comments on a movie, oldest first.
    pub fn comments_for_movie(&self, movie_id: i64) -> Result<Vec<CommentRecord>, CatalogError> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare(
                "SELECT id, movie_id, user_id, body, created_at
                 FROM comments WHERE movie_id = ? ORDER BY id",
            )
            .map_err(|e| CatalogError::Database(e.to_string()))?;

        let rows = stmt
            .query_map(params![movie_id], |row| {
                let created_at: String = row.get(4)?;
                Ok(CommentRecord {
                    id: row.get(0)?,
                    movie_ref: row.get(1)?,
                    user_id: row.get(2)?,
                    body: row.get(3)?,
                    created_at: parse_timestamp(&created_at),
                })
            })
            .map_err(|e| CatalogError::Database(e.to_string()))?;

        let mut comments = Vec::new();
        for row in rows {
            comments.push(row.map_err(|e| CatalogError::Database(e.to_string()))?);
        }
        Ok(comments)
    }

    /// Add a movie to a user's favorites. Adding it twice is a no-op.
    pub fn add_favorite(&self, user_id: &str, movie_id: i64) -> Result<(), CatalogError> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO favorites (user_id, movie_id, added_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(user_id, movie_id) DO NOTHING",
            params![user_id, movie_id, Utc::now().to_rfc3339()],
        )
        .map_err(|e| CatalogError::Database(e.to_string()))?;
        Ok(())
    }

    /// A user's favorites, in the order they were added.
    pub fn favorites_for_user(&self, user_id: &str) -> Result<Vec<Favorite>, CatalogError> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare(
                "SELECT user_id, movie_id, added_at FROM favorites
                 WHERE user_id = ? ORDER BY rowid",
            )
            .map_err(|e| CatalogError::Database(e.to_string()))?;

        let rows = stmt
            .query_map(params![user_id], |row| {
                let added_at: String = row.get(2)?;
                Ok(Favorite {
                    user_id: row.get(0)?,
                    movie_ref: row.get(1)?,
                    added_at: parse_timestamp(&added_at),
                })
            })
            .map_err(|e| CatalogError::Database(e.to_string()))?;

        let mut favorites = Vec::new();
        for row in rows {
            favorites.push(row.map_err(|e| CatalogError::Database(e.to_string()))?);
        }
        Ok(favorites)
    }

    fn load_movie(
        conn: &Connection,
        where_clause: &str,
        key: i64,
    ) -> Result<Option<MovieRecord>, CatalogError> {
        let sql = format!("SELECT {} FROM movies WHERE {} = ?", MOVIE_COLUMNS, where_clause);
        let raw = conn
            .query_row(&sql, params![key], RawMovie::from_row)
            .optional()
            .map_err(|e| CatalogError::Database(e.to_string()))?;

        raw.map(RawMovie::into_record).transpose()
    }

    fn load_actor(
        conn: &Connection,
        where_clause: &str,
        key: i64,
    ) -> Result<Option<ActorRecord>, CatalogError> {
        let sql = format!("SELECT {} FROM actors WHERE {} = ?", ACTOR_COLUMNS, where_clause);
        let actor = conn
            .query_row(&sql, params![key], Self::row_to_actor)
            .optional()
            .map_err(|e| CatalogError::Database(e.to_string()))?;

        let Some(mut actor) = actor else {
            return Ok(None);
        };
        actor.filmography = Self::load_filmography(conn, actor.id)?;
        Ok(Some(actor))
    }

    /// Load an actor's filmography in insertion order. An upsert keeps the
    /// rowid, so a replaced entry stays where it was.
    fn load_filmography(
        conn: &Connection,
        actor_id: i64,
    ) -> Result<Vec<FilmographyEntry>, CatalogError> {
        let mut stmt = conn
            .prepare(
                "SELECT movie_id, character_name, ord FROM filmography
                 WHERE actor_id = ? ORDER BY rowid",
            )
            .map_err(|e| CatalogError::Database(e.to_string()))?;

        let rows = stmt
            .query_map(params![actor_id], |row| {
                Ok(FilmographyEntry {
                    movie_ref: row.get(0)?,
                    character: row.get(1)?,
                    order: row.get(2)?,
                })
            })
            .map_err(|e| CatalogError::Database(e.to_string()))?;

        let mut entries = Vec::new();
        for row in rows {
            entries.push(row.map_err(|e| CatalogError::Database(e.to_string()))?);
        }
        Ok(entries)
    }

    /// Convert a row to ActorRecord (without filmography).
    fn row_to_actor(row: &rusqlite::Row) -> rusqlite::Result<ActorRecord> {
        let created_at: String = row.get(8)?;
        let updated_at: String = row.get(9)?;

        Ok(ActorRecord {
            id: row.get(0)?,
            external_id: row.get(1)?,
            name: row.get(2)?,
            profile_path: row.get(3)?,
            biography: row.get(4)?,
            birthday: row.get(5)?,
            place_of_birth: row.get(6)?,
            popularity: row.get(7)?,
            filmography: Vec::new(), // Loaded separately
            created_at: parse_timestamp(&created_at),
            updated_at: parse_timestamp(&updated_at),
        })
    }
}

/// Movie row before the JSON columns are decoded.
struct RawMovie {
    id: i64,
    external_id: u32,
    title: String,
    original_title: Option<String>,
    overview: Option<String>,
    poster_path: Option<String>,
    backdrop_path: Option<String>,
    release_date: Option<String>,
    vote_average: Option<f32>,
    vote_count: Option<u32>,
    popularity: Option<f64>,
    genres_json: String,
    videos_json: String,
    cast_json: String,
    directors_json: String,
    created_at: String,
    last_updated: String,
}

impl RawMovie {
    fn from_row(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            external_id: row.get(1)?,
            title: row.get(2)?,
            original_title: row.get(3)?,
            overview: row.get(4)?,
            poster_path: row.get(5)?,
            backdrop_path: row.get(6)?,
            release_date: row.get(7)?,
            vote_average: row.get(8)?,
            vote_count: row.get(9)?,
            popularity: row.get(10)?,
            genres_json: row.get(11)?,
            videos_json: row.get(12)?,
            cast_json: row.get(13)?,
            directors_json: row.get(14)?,
            created_at: row.get(15)?,
            last_updated: row.get(16)?,
        })
    }

    fn into_record(self) -> Result<MovieRecord, CatalogError> {
        Ok(MovieRecord {
            id: self.id,
            external_id: self.external_id,
            title: self.title,
            original_title: self.original_title,
            overview: self.overview,
            poster_path: self.poster_path,
            backdrop_path: self.backdrop_path,
            release_date: self.release_date,
            vote_average: self.vote_average,
            vote_count: self.vote_count,
            popularity: self.popularity,
            genres: serde_json::from_str(&self.genres_json)?,
            videos: serde_json::from_str(&self.videos_json)?,
            cast: serde_json::from_str(&self.cast_json)?,
            directors: serde_json::from_str(&self.directors_json)?,
            created_at: parse_timestamp(&self.created_at),
            last_updated: parse_timestamp(&self.last_updated),
        })
    }
}

fn parse_timestamp(value: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

impl CatalogStore for SqliteCatalogStore {
    fn upsert_movie(
        &self,
        external_id: u32,
        fields: &MovieFields,
    ) -> Result<MovieRecord, CatalogError> {
        let conn = self.lock()?;
        let now = Utc::now().to_rfc3339();
        let genres_json = serde_json::to_string(&fields.genres)?;
        let videos_json = serde_json::to_string(&fields.videos)?;

        conn.execute(
            "INSERT INTO movies (external_id, title, original_title, overview, poster_path,
                backdrop_path, release_date, vote_average, vote_count, popularity,
                genres_json, videos_json, created_at, last_updated)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?13)
             ON CONFLICT(external_id) DO UPDATE SET
                title = excluded.title,
                original_title = excluded.original_title,
                overview = excluded.overview,
                poster_path = excluded.poster_path,
                backdrop_path = excluded.backdrop_path,
                release_date = excluded.release_date,
                vote_average = excluded.vote_average,
                vote_count = excluded.vote_count,
                popularity = excluded.popularity,
                genres_json = excluded.genres_json,
                videos_json = excluded.videos_json,
                last_updated = excluded.last_updated",
            params![
                external_id,
                fields.title,
                fields.original_title,
                fields.overview,
                fields.poster_path,
                fields.backdrop_path,
                fields.release_date,
                fields.vote_average,
                fields.vote_count,
                fields.popularity,
                genres_json,
                videos_json,
                now,
            ],
        )
        .map_err(|e| CatalogError::Database(e.to_string()))?;

        Self::load_movie(&conn, "external_id", i64::from(external_id))?
            .ok_or_else(|| CatalogError::NotFound(format!("movie external_id={}", external_id)))
    }

    fn find_movie_by_external_id(
        &self,
        external_id: u32,
    ) -> Result<Option<MovieRecord>, CatalogError> {
        let conn = self.lock()?;
        Self::load_movie(&conn, "external_id", i64::from(external_id))
    }

    fn get_movie(&self, movie_id: i64) -> Result<Option<MovieRecord>, CatalogError> {
        let conn = self.lock()?;
        Self::load_movie(&conn, "id", movie_id)
    }

    fn list_movie_refs(&self) -> Result<Vec<MovieRef>, CatalogError> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare("SELECT id, external_id FROM movies ORDER BY id")
            .map_err(|e| CatalogError::Database(e.to_string()))?;

        let rows = stmt
            .query_map([], |row| {
                Ok(MovieRef {
                    id: row.get(0)?,
                    external_id: row.get(1)?,
                })
            })
            .map_err(|e| CatalogError::Database(e.to_string()))?;

        let mut refs = Vec::new();
        for row in rows {
            refs.push(row.map_err(|e| CatalogError::Database(e.to_string()))?);
        }
        Ok(refs)
    }

    fn set_movie_credits(
        &self,
        movie_id: i64,
        cast: &[CastEntry],
        directors: &[i64],
    ) -> Result<(), CatalogError> {
        let conn = self.lock()?;
        let cast_json = serde_json::to_string(cast)?;
        let directors_json = serde_json::to_string(directors)?;

        let updated = conn
            .execute(
                "UPDATE movies SET cast_json = ?1, directors_json = ?2, last_updated = ?3
                 WHERE id = ?4",
                params![cast_json, directors_json, Utc::now().to_rfc3339(), movie_id],
            )
            .map_err(|e| CatalogError::Database(e.to_string()))?;

        if updated == 0 {
            return Err(CatalogError::NotFound(format!("movie id={}", movie_id)));
        }
        Ok(())
    }

    fn upsert_actor(
        &self,
        external_id: u32,
        fields: &ActorFields,
    ) -> Result<ActorUpsert, CatalogError> {
        let conn = self.lock()?;
        let now = Utc::now().to_rfc3339();

        let inserted = conn
            .execute(
                "INSERT INTO actors (external_id, name, profile_path, biography, birthday,
                    place_of_birth, popularity, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)
                 ON CONFLICT(external_id) DO NOTHING",
                params![
                    external_id,
                    fields.name,
                    fields.profile_path,
                    fields.biography,
                    fields.birthday,
                    fields.place_of_birth,
                    fields.popularity,
                    now,
                ],
            )
            .map_err(|e| CatalogError::Database(e.to_string()))?;

        let created = inserted > 0;
        if !created {
            conn.execute(
                "UPDATE actors SET
                    name = ?2,
                    profile_path = COALESCE(?3, profile_path),
                    biography = COALESCE(?4, biography),
                    birthday = COALESCE(?5, birthday),
                    place_of_birth = COALESCE(?6, place_of_birth),
                    popularity = COALESCE(?7, popularity),
                    updated_at = ?8
                 WHERE external_id = ?1",
                params![
                    external_id,
                    fields.name,
                    fields.profile_path,
                    fields.biography,
                    fields.birthday,
                    fields.place_of_birth,
                    fields.popularity,
                    now,
                ],
            )
            .map_err(|e| CatalogError::Database(e.to_string()))?;
        }

        let actor = Self::load_actor(&conn, "external_id", i64::from(external_id))?
            .ok_or_else(|| CatalogError::NotFound(format!("actor external_id={}", external_id)))?;

        Ok(ActorUpsert { actor, created })
    }

    fn find_actor_by_external_id(
        &self,
        external_id: u32,
    ) -> Result<Option<ActorRecord>, CatalogError> {
        let conn = self.lock()?;
        Self::load_actor(&conn, "external_id", i64::from(external_id))
    }

    fn replace_filmography_entry(
        &self,
        actor_id: i64,
        movie_id: i64,
        entry: &FilmographyEntry,
    ) -> Result<(), CatalogError> {
        let conn = self.lock()?;

        // Keyed on (actor_id, movie_id): never a second entry for the same movie.
        let changed = conn
            .execute(
                "INSERT INTO filmography (actor_id, movie_id, character_name, ord, updated_at)
                 SELECT ?1, ?2, ?3, ?4, ?5
                 WHERE EXISTS (SELECT 1 FROM actors WHERE id = ?1)
                   AND EXISTS (SELECT 1 FROM movies WHERE id = ?2)
                 ON CONFLICT(actor_id, movie_id) DO UPDATE SET
                    character_name = excluded.character_name,
                    ord = excluded.ord,
                    updated_at = excluded.updated_at",
                params![
                    actor_id,
                    movie_id,
                    entry.character,
                    entry.order,
                    Utc::now().to_rfc3339()
                ],
            )
            .map_err(|e| CatalogError::Database(e.to_string()))?;

        if changed == 0 {
            return Err(CatalogError::NotFound(format!(
                "actor id={} or movie id={}",
                actor_id, movie_id
            )));
        }
        Ok(())
    }

    fn prune_filmographies(
        &self,
        movie_id: i64,
        keep_actor_ids: &[i64],
    ) -> Result<u64, CatalogError> {
        let conn = self.lock()?;
        let keep_json = serde_json::to_string(keep_actor_ids)?;

        let removed = conn
            .execute(
                "DELETE FROM filmography WHERE movie_id = ?1
                 AND actor_id NOT IN (SELECT value FROM json_each(?2))",
                params![movie_id, keep_json],
            )
            .map_err(|e| CatalogError::Database(e.to_string()))?;

        Ok(removed as u64)
    }

    fn delete_movie(&self, movie_id: i64) -> Result<bool, CatalogError> {
        let conn = self.lock()?;
        let deleted = conn
            .execute("DELETE FROM movies WHERE id = ?", params![movie_id])
            .map_err(|e| CatalogError::Database(e.to_string()))?;
        Ok(deleted > 0)
    }

    fn pull_movie_from_all_filmographies(&self, movie_id: i64) -> Result<u64, CatalogError> {
        let conn = self.lock()?;
        let removed = conn
            .execute("DELETE FROM filmography WHERE movie_id = ?", params![movie_id])
            .map_err(|e| CatalogError::Database(e.to_string()))?;
        Ok(removed as u64)
    }

    fn pull_movie_from_all_favorites(&self, movie_id: i64) -> Result<u64, CatalogError> {
        let conn = self.lock()?;
        let removed = conn
            .execute("DELETE FROM favorites WHERE movie_id = ?", params![movie_id])
            .map_err(|e| CatalogError::Database(e.to_string()))?;
        Ok(removed as u64)
    }

    fn delete_comments_for_movie(&self, movie_id: i64) -> Result<u64, CatalogError> {
        let conn = self.lock()?;
        let removed = conn
            .execute("DELETE FROM comments WHERE movie_id = ?", params![movie_id])
            .map_err(|e| CatalogError::Database(e.to_string()))?;
        Ok(removed as u64)
    }

    fn stats(&self) -> Result<CatalogStats, CatalogError> {
        let conn = self.lock()?;
        conn.query_row(
            "SELECT
                (SELECT COUNT(*) FROM movies),
                (SELECT COUNT(*) FROM actors),
                (SELECT COUNT(*) FROM filmography),
                (SELECT COUNT(*) FROM comments),
                (SELECT COUNT(*) FROM favorites)",
            [],
            |row| {
                let movies: i64 = row.get(0)?;
                let actors: i64 = row.get(1)?;
                let filmography_entries: i64 = row.get(2)?;
                let comments: i64 = row.get(3)?;
                let favorites: i64 = row.get(4)?;
                Ok(CatalogStats {
                    movies: movies as u64,
                    actors: actors as u64,
                    filmography_entries: filmography_entries as u64,
                    comments: comments as u64,
                    favorites: favorites as u64,
                })
            },
        )
        .map_err(|e| CatalogError::Database(e.to_string()))
    }
}
