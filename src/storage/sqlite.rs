//! SQLite storage backend

use super::traits::{BlogStore, OpenStore, StorageError, StorageResult};
use crate::blog::{Label, LabelId, LabelKind, Post, PostId, Tagging};
use crate::query::{PostOrder, PostQuery};
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension, ToSql};
use std::path::Path;
use std::sync::Mutex;

const POST_COLUMNS: &str =
    "p.id, p.title, p.slug, p.year, p.month, p.content, p.is_published, p.created_at, p.updated_at";

/// Raw `posts` row before id and timestamp parsing
struct PostRow {
    id: String,
    title: String,
    slug: String,
    year: i32,
    month: u32,
    content: String,
    is_published: bool,
    created_at: String,
    updated_at: String,
}

impl PostRow {
    /// Read a row selected with `POST_COLUMNS`
    fn read(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            title: row.get(1)?,
            slug: row.get(2)?,
            year: row.get(3)?,
            month: row.get(4)?,
            content: row.get(5)?,
            is_published: row.get(6)?,
            created_at: row.get(7)?,
            updated_at: row.get(8)?,
        })
    }
}

/// SQLite-backed blog store
///
/// Uses a single SQLite database file with tables for posts, labels and
/// taggings. Thread-safe via internal mutex on the connection.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Initialize the database schema
    fn init_schema(conn: &Connection) -> StorageResult<()> {
        conn.execute_batch(
            r#"
            -- Posts; (slug, year, month) identifies a permalink
            CREATE TABLE IF NOT EXISTS posts (
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                slug TEXT NOT NULL,
                year INTEGER NOT NULL,
                month INTEGER NOT NULL,
                content TEXT NOT NULL,
                is_published INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE UNIQUE INDEX IF NOT EXISTS idx_posts_permalink
                ON posts(slug, year, month);
            CREATE INDEX IF NOT EXISTS idx_posts_created_at
                ON posts(created_at);
            CREATE INDEX IF NOT EXISTS idx_posts_year_month
                ON posts(year, month);

            -- Labels; names are unique across tags and categories
            CREATE TABLE IF NOT EXISTS labels (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL UNIQUE,
                is_category INTEGER NOT NULL DEFAULT 0
            );

            -- Post/label associations, owned by the post
            CREATE TABLE IF NOT EXISTS taggings (
                post_id TEXT NOT NULL,
                label_id TEXT NOT NULL,
                created_at TEXT NOT NULL,
                FOREIGN KEY (post_id) REFERENCES posts(id) ON DELETE CASCADE,
                FOREIGN KEY (label_id) REFERENCES labels(id)
            );

            CREATE INDEX IF NOT EXISTS idx_taggings_post
                ON taggings(post_id);
            CREATE INDEX IF NOT EXISTS idx_taggings_label
                ON taggings(label_id);

            -- Enable foreign keys
            PRAGMA foreign_keys = ON;

            -- Enable WAL mode for concurrent reads during writes
            PRAGMA journal_mode = WAL;
            "#,
        )?;

        Ok(())
    }

    /// Fixed-width RFC 3339 so that text order is time order
    fn format_time(time: &DateTime<Utc>) -> String {
        time.to_rfc3339_opts(SecondsFormat::Micros, true)
    }

    fn parse_time(raw: &str) -> StorageResult<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(raw)
            .map(|t| t.with_timezone(&Utc))
            .map_err(|e| StorageError::DateParse(format!("{}: {}", raw, e)))
    }

    fn parse_post_id(raw: &str) -> StorageResult<PostId> {
        raw.parse()
            .map_err(|e| StorageError::InvalidId(format!("{}: {}", raw, e)))
    }

    fn parse_label_id(raw: &str) -> StorageResult<LabelId> {
        raw.parse()
            .map_err(|e| StorageError::InvalidId(format!("{}: {}", raw, e)))
    }

    fn row_to_post(row: PostRow) -> StorageResult<Post> {
        let mut post = Post::new(row.title, row.content);
        post.id = Self::parse_post_id(&row.id)?;
        post.slug = Some(row.slug);
        post.year = Some(row.year);
        post.month = Some(row.month);
        post.is_published = row.is_published;
        post.created_at = Some(Self::parse_time(&row.created_at)?);
        post.updated_at = Some(Self::parse_time(&row.updated_at)?);
        Ok(post)
    }

    fn row_to_label(id: String, name: String, is_category: bool) -> StorageResult<Label> {
        Ok(Label {
            id: Self::parse_label_id(&id)?,
            name,
            kind: LabelKind::from_is_category(is_category),
        })
    }

    /// Unique and primary key violations become `Conflict`
    fn map_write_error(err: rusqlite::Error) -> StorageError {
        if let rusqlite::Error::SqliteFailure(code, message) = &err {
            if code.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                || code.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
            {
                return StorageError::Conflict(
                    message.clone().unwrap_or_else(|| code.to_string()),
                );
            }
        }
        StorageError::Database(err)
    }

    /// `FROM`/`WHERE` clauses for a query, with positional parameters
    fn filter_clause(query: &PostQuery) -> (String, Vec<Box<dyn ToSql>>) {
        let mut sql = String::from(" FROM posts p WHERE 1 = 1");
        let mut params_vec: Vec<Box<dyn ToSql>> = Vec::new();

        if let Some(published) = query.published {
            sql.push_str(" AND p.is_published = ?");
            params_vec.push(Box::new(published));
        }

        if let Some(year) = query.year {
            sql.push_str(" AND p.year = ?");
            params_vec.push(Box::new(year));
        }

        if let Some(month) = query.month {
            sql.push_str(" AND p.month = ?");
            params_vec.push(Box::new(month));
        }

        // Existence checks rather than joins, so duplicate taggings never
        // duplicate result rows
        for scope in &query.labels {
            sql.push_str(
                " AND EXISTS (SELECT 1 FROM taggings t JOIN labels l ON l.id = t.label_id \
                 WHERE t.post_id = p.id AND l.name = ? AND l.is_category = ?)",
            );
            params_vec.push(Box::new(scope.name.clone()));
            params_vec.push(Box::new(scope.kind.is_category()));
        }

        (sql, params_vec)
    }

    fn order_clause(order: PostOrder) -> &'static str {
        match order {
            PostOrder::NewestFirst => " ORDER BY p.created_at DESC, p.rowid DESC",
            PostOrder::OldestFirst => " ORDER BY p.created_at ASC, p.rowid ASC",
            PostOrder::Title => " ORDER BY p.title COLLATE NOCASE ASC, p.created_at DESC",
        }
    }
}

impl OpenStore for SqliteStore {
    fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        Self::init_schema(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn open_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init_schema(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

impl BlogStore for SqliteStore {
    // === Post Operations ===

    fn save_post(&self, post: &Post) -> StorageResult<()> {
        let conn = self.conn.lock().unwrap();

        conn.execute(
            r#"
            INSERT INTO posts (id, title, slug, year, month, content, is_published, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            ON CONFLICT(id) DO UPDATE SET
                title = excluded.title,
                slug = excluded.slug,
                year = excluded.year,
                month = excluded.month,
                content = excluded.content,
                is_published = excluded.is_published,
                updated_at = excluded.updated_at
            "#,
            params![
                post.id.to_string(),
                post.title,
                post.slug,
                post.year,
                post.month,
                post.content,
                post.is_published,
                post.created_at.as_ref().map(Self::format_time),
                post.updated_at.as_ref().map(Self::format_time),
            ],
        )
        .map_err(Self::map_write_error)?;

        Ok(())
    }

    fn load_post(&self, id: &PostId) -> StorageResult<Option<Post>> {
        let conn = self.conn.lock().unwrap();

        let row = conn
            .query_row(
                &format!("SELECT {} FROM posts p WHERE p.id = ?1", POST_COLUMNS),
                params![id.to_string()],
                PostRow::read,
            )
            .optional()?;

        row.map(Self::row_to_post).transpose()
    }

    fn delete_post(&self, id: &PostId) -> StorageResult<bool> {
        let conn = self.conn.lock().unwrap();

        // Taggings go with it through ON DELETE CASCADE
        let rows = conn.execute("DELETE FROM posts WHERE id = ?1", params![id.to_string()])?;

        Ok(rows > 0)
    }

    fn slug_taken(
        &self,
        slug: &str,
        year: i32,
        month: u32,
        excluding: Option<&PostId>,
    ) -> StorageResult<bool> {
        let conn = self.conn.lock().unwrap();

        let excluded = excluding.map(|id| id.to_string()).unwrap_or_default();
        let taken: bool = conn.query_row(
            "SELECT EXISTS (SELECT 1 FROM posts WHERE slug = ?1 AND year = ?2 AND month = ?3 AND id != ?4)",
            params![slug, year, month, excluded],
            |row| row.get(0),
        )?;

        Ok(taken)
    }

    fn find_posts(&self, query: &PostQuery) -> StorageResult<Vec<Post>> {
        let conn = self.conn.lock().unwrap();

        let (filter, params_vec) = Self::filter_clause(query);
        let mut sql = format!("SELECT {}{}", POST_COLUMNS, filter);
        sql.push_str(Self::order_clause(query.order));

        match (query.limit, query.offset) {
            (Some(limit), Some(offset)) => sql.push_str(&format!(" LIMIT {} OFFSET {}", limit, offset)),
            (Some(limit), None) => sql.push_str(&format!(" LIMIT {}", limit)),
            (None, Some(offset)) => sql.push_str(&format!(" LIMIT -1 OFFSET {}", offset)),
            (None, None) => {}
        }

        let mut stmt = conn.prepare(&sql)?;
        let params_refs: Vec<&dyn ToSql> = params_vec.iter().map(|b| b.as_ref()).collect();
        let rows = stmt.query_map(params_refs.as_slice(), PostRow::read)?;

        let mut posts = Vec::new();
        for row in rows {
            posts.push(Self::row_to_post(row?)?);
        }

        Ok(posts)
    }

    fn count_posts(&self, query: &PostQuery) -> StorageResult<usize> {
        let conn = self.conn.lock().unwrap();

        let (filter, params_vec) = Self::filter_clause(query);
        let sql = format!("SELECT COUNT(*){}", filter);
        let params_refs: Vec<&dyn ToSql> = params_vec.iter().map(|b| b.as_ref()).collect();
        let count: i64 = conn.query_row(&sql, params_refs.as_slice(), |row| row.get(0))?;

        Ok(count as usize)
    }

    // === Label Operations ===

    fn create_label(&self, label: &Label) -> StorageResult<()> {
        let conn = self.conn.lock().unwrap();

        conn.execute(
            "INSERT INTO labels (id, name, is_category) VALUES (?1, ?2, ?3)",
            params![label.id.to_string(), label.name, label.is_category()],
        )
        .map_err(Self::map_write_error)?;

        Ok(())
    }

    fn load_label(&self, id: &LabelId) -> StorageResult<Option<Label>> {
        let conn = self.conn.lock().unwrap();

        let row: Option<(String, String, bool)> = conn
            .query_row(
                "SELECT id, name, is_category FROM labels WHERE id = ?1",
                params![id.to_string()],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .optional()?;

        row.map(|(id, name, is_category)| Self::row_to_label(id, name, is_category))
            .transpose()
    }

    fn find_label_by_name(&self, name: &str) -> StorageResult<Option<Label>> {
        let conn = self.conn.lock().unwrap();

        let row: Option<(String, String, bool)> = conn
            .query_row(
                "SELECT id, name, is_category FROM labels WHERE name = ?1",
                params![name],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .optional()?;

        row.map(|(id, name, is_category)| Self::row_to_label(id, name, is_category))
            .transpose()
    }

    fn find_category(&self, id: &LabelId) -> StorageResult<Option<Label>> {
        let conn = self.conn.lock().unwrap();

        let row: Option<(String, String, bool)> = conn
            .query_row(
                "SELECT id, name, is_category FROM labels WHERE id = ?1 AND is_category = 1",
                params![id.to_string()],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .optional()?;

        row.map(|(id, name, is_category)| Self::row_to_label(id, name, is_category))
            .transpose()
    }

    fn list_labels(&self, kind: Option<LabelKind>) -> StorageResult<Vec<Label>> {
        let conn = self.conn.lock().unwrap();

        let mut sql = String::from("SELECT id, name, is_category FROM labels");
        let mut params_vec: Vec<Box<dyn ToSql>> = Vec::new();
        if let Some(kind) = kind {
            sql.push_str(" WHERE is_category = ?");
            params_vec.push(Box::new(kind.is_category()));
        }
        sql.push_str(" ORDER BY name");

        let mut stmt = conn.prepare(&sql)?;
        let params_refs: Vec<&dyn ToSql> = params_vec.iter().map(|b| b.as_ref()).collect();
        let rows = stmt.query_map(params_refs.as_slice(), |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, bool>(2)?,
            ))
        })?;

        let mut labels = Vec::new();
        for row in rows {
            let (id, name, is_category) = row?;
            labels.push(Self::row_to_label(id, name, is_category)?);
        }

        Ok(labels)
    }

    // === Tagging Operations ===

    fn create_tagging(&self, tagging: &Tagging) -> StorageResult<()> {
        let conn = self.conn.lock().unwrap();

        conn.execute(
            "INSERT INTO taggings (post_id, label_id, created_at) VALUES (?1, ?2, ?3)",
            params![
                tagging.post_id.to_string(),
                tagging.label_id.to_string(),
                Self::format_time(&tagging.created_at),
            ],
        )?;

        Ok(())
    }

    fn tagging_count(&self, post_id: &PostId, label_id: &LabelId) -> StorageResult<usize> {
        let conn = self.conn.lock().unwrap();

        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM taggings WHERE post_id = ?1 AND label_id = ?2",
            params![post_id.to_string(), label_id.to_string()],
            |row| row.get(0),
        )?;

        Ok(count as usize)
    }

    fn delete_taggings(&self, post_id: &PostId, kind: LabelKind) -> StorageResult<usize> {
        let conn = self.conn.lock().unwrap();

        let rows = conn.execute(
            "DELETE FROM taggings
             WHERE post_id = ?1
               AND label_id IN (SELECT id FROM labels WHERE is_category = ?2)",
            params![post_id.to_string(), kind.is_category()],
        )?;

        Ok(rows)
    }

    fn delete_tagging(
        &self,
        post_id: &PostId,
        label_id: &LabelId,
        kind: LabelKind,
    ) -> StorageResult<usize> {
        let conn = self.conn.lock().unwrap();

        let rows = conn.execute(
            "DELETE FROM taggings
             WHERE post_id = ?1
               AND label_id = ?2
               AND label_id IN (SELECT id FROM labels WHERE is_category = ?3)",
            params![post_id.to_string(), label_id.to_string(), kind.is_category()],
        )?;

        Ok(rows)
    }

    fn labels_for_post(&self, post_id: &PostId, kind: Option<LabelKind>) -> StorageResult<Vec<Label>> {
        let conn = self.conn.lock().unwrap();

        // One row per label, in the order the post first gained it
        let mut sql = String::from(
            "SELECT l.id, l.name, l.is_category
             FROM taggings t JOIN labels l ON l.id = t.label_id
             WHERE t.post_id = ?",
        );
        let mut params_vec: Vec<Box<dyn ToSql>> = vec![Box::new(post_id.to_string())];
        if let Some(kind) = kind {
            sql.push_str(" AND l.is_category = ?");
            params_vec.push(Box::new(kind.is_category()));
        }
        sql.push_str(" GROUP BY l.id, l.name, l.is_category ORDER BY MIN(t.rowid)");

        let mut stmt = conn.prepare(&sql)?;
        let params_refs: Vec<&dyn ToSql> = params_vec.iter().map(|b| b.as_ref()).collect();
        let rows = stmt.query_map(params_refs.as_slice(), |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, bool>(2)?,
            ))
        })?;

        let mut labels = Vec::new();
        for row in rows {
            let (id, name, is_category) = row?;
            labels.push(Self::row_to_label(id, name, is_category)?);
        }

        Ok(labels)
    }
}
