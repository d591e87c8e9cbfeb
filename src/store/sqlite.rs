use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, Row, params};

use super::Store;
use super::schema::SCHEMA;
use crate::error::{Error, Result};
use crate::types::*;

const USER_COLUMNS: &str = "id, github_id, username, email, fullname, organization, \
     profile_image_url, intro, github_token, role, created_at, updated_at";

const EXPORTER_COLUMNS: &str =
    "id, name, repository_url, logo_url, category, official, description, stars, recent_release";

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let conn = Connection::open(db_path)?;

        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.pragma_update(None, "journal_mode", "WAL")?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn parse_datetime(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| {
            // Handle SQLite's default datetime format: "YYYY-MM-DD HH:MM:SS"
            chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            tracing::error!("Invalid datetime in database: '{}' - {}", s, e);
            Utc::now()
        })
}

fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

fn is_constraint_violation(e: &rusqlite::Error) -> bool {
    matches!(
        e,
        rusqlite::Error::SqliteFailure(err, _) if err.code == rusqlite::ErrorCode::ConstraintViolation
    )
}

/// Lifts an unparseable stored role out of rusqlite's conversion error.
fn map_row_error(e: rusqlite::Error) -> Error {
    if let rusqlite::Error::FromSqlConversionFailure(_, _, source) = &e {
        if let Some(unknown) = source.downcast_ref::<UnknownRole>() {
            return Error::UnknownRole(unknown.clone());
        }
    }
    Error::from(e)
}

fn row_to_user(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        github_id: row.get(1)?,
        username: row.get(2)?,
        email: row.get(3)?,
        fullname: row.get(4)?,
        organization: row.get(5)?,
        profile_image_url: row.get(6)?,
        intro: row.get(7)?,
        github_token: row.get(8)?,
        role: row.get(9)?,
        created_at: parse_datetime(&row.get::<_, String>(10)?),
        updated_at: parse_datetime(&row.get::<_, String>(11)?),
    })
}

fn row_to_exporter(row: &Row<'_>) -> rusqlite::Result<Exporter> {
    Ok(Exporter {
        id: row.get(0)?,
        name: row.get(1)?,
        repository_url: row.get(2)?,
        logo_url: row.get(3)?,
        category: row.get(4)?,
        official: row.get(5)?,
        description: row.get(6)?,
        stars: row.get(7)?,
        recent_release: row.get(8)?,
    })
}

impl SqliteStore {
    fn query_user(&self, filter: &str, param: &dyn rusqlite::ToSql) -> Result<Option<User>> {
        let conn = self.conn();
        conn.query_row(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE {filter}"),
            [param],
            row_to_user,
        )
        .optional()
        .map_err(map_row_error)
    }

    fn query_users(&self, filter: &str, param: &dyn rusqlite::ToSql) -> Result<Vec<User>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE {filter} ORDER BY username"
        ))?;

        let rows = stmt.query_map([param], row_to_user)?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(map_row_error)
    }
}

impl Store for SqliteStore {
    fn initialize(&self) -> Result<()> {
        self.conn().execute_batch(SCHEMA)?;
        Ok(())
    }

    // User operations

    fn create_user(&self, user: &NewUser) -> Result<User> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;

        let claimed = tx.execute(
            "INSERT OR IGNORE INTO bootstrap (id, user_id, created_at) VALUES (1, ?1, ?2)",
            params![user.id, format_datetime(&user.created_at)],
        )? == 1;
        let role = Role::initial(claimed);

        let result = tx.execute(
            "INSERT INTO users (id, github_id, username, email, fullname, organization,
                                profile_image_url, intro, github_token, role, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?11)",
            params![
                user.id,
                user.github_id,
                user.username,
                user.email,
                user.fullname,
                user.organization,
                user.profile_image_url,
                user.intro,
                user.github_token,
                role,
                format_datetime(&user.created_at),
            ],
        );

        match result {
            Ok(_) => {}
            Err(e) if is_constraint_violation(&e) => return Err(Error::AlreadyExists),
            Err(e) => return Err(Error::from(e)),
        }

        tx.commit()?;

        if claimed {
            tracing::info!("Bootstrap: '{}' is the first user and becomes admin", user.username);
        }

        Ok(User {
            id: user.id.clone(),
            github_id: user.github_id,
            username: user.username.clone(),
            email: user.email.clone(),
            fullname: user.fullname.clone(),
            organization: user.organization.clone(),
            profile_image_url: user.profile_image_url.clone(),
            intro: user.intro.clone(),
            github_token: user.github_token.clone(),
            role,
            created_at: user.created_at,
            updated_at: user.created_at,
        })
    }

    fn get_user(&self, id: &str) -> Result<Option<User>> {
        self.query_user("id = ?1", &id)
    }

    fn get_user_by_github_id(&self, github_id: i64) -> Result<Option<User>> {
        self.query_user("github_id = ?1", &github_id)
    }

    fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        self.query_user("username = ?1", &username)
    }

    fn search_users(&self, keyword: &str) -> Result<Vec<User>> {
        self.query_users("instr(lower(username), lower(?1)) > 0", &keyword)
    }

    fn list_users_by_role(&self, role: Role) -> Result<Vec<User>> {
        self.query_users("role = ?1", &role)
    }

    fn update_user(&self, user: &User) -> Result<()> {
        let result = self.conn().execute(
            "UPDATE users SET username = ?1, email = ?2, fullname = ?3, organization = ?4,
                              profile_image_url = ?5, intro = ?6, github_token = ?7, updated_at = ?8
             WHERE id = ?9",
            params![
                user.username,
                user.email,
                user.fullname,
                user.organization,
                user.profile_image_url,
                user.intro,
                user.github_token,
                format_datetime(&user.updated_at),
                user.id,
            ],
        );

        match result {
            Ok(0) => Err(Error::NotFound),
            Ok(_) => Ok(()),
            Err(e) if is_constraint_violation(&e) => Err(Error::AlreadyExists),
            Err(e) => Err(Error::from(e)),
        }
    }

    fn delete_user(&self, id: &str) -> Result<bool> {
        let rows = self
            .conn()
            .execute("DELETE FROM users WHERE id = ?1", params![id])?;
        Ok(rows > 0)
    }

    fn has_bootstrapped(&self) -> Result<bool> {
        let conn = self.conn();
        let count: i32 = conn.query_row("SELECT COUNT(*) FROM bootstrap", [], |row| row.get(0))?;
        Ok(count > 0)
    }

    // Role operations

    fn transition_role(&self, id: &str, from: Role, to: Role) -> Result<bool> {
        let rows = self.conn().execute(
            "UPDATE users SET role = ?1, updated_at = ?2 WHERE id = ?3 AND role = ?4",
            params![to, format_datetime(&Utc::now()), id, from],
        )?;
        Ok(rows > 0)
    }

    fn set_role_by_username(&self, username: &str, role: Role) -> Result<bool> {
        let rows = self.conn().execute(
            "UPDATE users SET role = ?1, updated_at = ?2 WHERE username = ?3",
            params![role, format_datetime(&Utc::now()), username],
        )?;
        Ok(rows > 0)
    }

    // Exporter operations

    fn create_exporter(&self, exporter: &Exporter) -> Result<i64> {
        let conn = self.conn();
        conn.execute(
            "INSERT INTO exporters (name, repository_url, logo_url, category, official, description, stars, recent_release)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                exporter.name,
                exporter.repository_url,
                exporter.logo_url,
                exporter.category,
                exporter.official,
                exporter.description,
                exporter.stars,
                exporter.recent_release,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    fn get_exporter(&self, id: i64) -> Result<Option<Exporter>> {
        let conn = self.conn();
        conn.query_row(
            &format!("SELECT {EXPORTER_COLUMNS} FROM exporters WHERE id = ?1"),
            params![id],
            row_to_exporter,
        )
        .optional()
        .map_err(Error::from)
    }

    fn update_exporter_stars(&self, id: i64, stars: i64) -> Result<()> {
        let rows = self.conn().execute(
            "UPDATE exporters SET stars = ?1 WHERE id = ?2",
            params![stars, id],
        )?;

        if rows == 0 {
            return Err(Error::NotFound);
        }
        Ok(())
    }

    // Star operations

    fn has_star(&self, user_id: &str, exporter_id: i64) -> Result<bool> {
        let conn = self.conn();
        let exists: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM stars WHERE user_id = ?1 AND exporter_id = ?2)",
            params![user_id, exporter_id],
            |row| row.get(0),
        )?;
        Ok(exists)
    }

    fn add_star(&self, user_id: &str, exporter_id: i64) -> Result<()> {
        self.conn().execute(
            "INSERT OR IGNORE INTO stars (user_id, exporter_id, created_at) VALUES (?1, ?2, ?3)",
            params![user_id, exporter_id, format_datetime(&Utc::now())],
        )?;
        Ok(())
    }

    fn remove_star(&self, user_id: &str, exporter_id: i64) -> Result<bool> {
        let rows = self.conn().execute(
            "DELETE FROM stars WHERE user_id = ?1 AND exporter_id = ?2",
            params![user_id, exporter_id],
        )?;
        Ok(rows > 0)
    }

    // Bucket operations

    fn create_bucket(&self, bucket: &Bucket) -> Result<()> {
        let result = self.conn().execute(
            "INSERT INTO buckets (user_id, exporter_id, forked_repository_url, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                bucket.user_id,
                bucket.exporter_id,
                bucket.forked_repository_url,
                format_datetime(&bucket.created_at),
            ],
        );

        match result {
            Ok(_) => Ok(()),
            Err(e) if is_constraint_violation(&e) => Err(Error::AlreadyExists),
            Err(e) => Err(Error::from(e)),
        }
    }

    fn get_bucket(&self, user_id: &str, exporter_id: i64) -> Result<Option<Bucket>> {
        let conn = self.conn();
        conn.query_row(
            "SELECT user_id, exporter_id, forked_repository_url, created_at
             FROM buckets WHERE user_id = ?1 AND exporter_id = ?2",
            params![user_id, exporter_id],
            |row| {
                Ok(Bucket {
                    user_id: row.get(0)?,
                    exporter_id: row.get(1)?,
                    forked_repository_url: row.get(2)?,
                    created_at: parse_datetime(&row.get::<_, String>(3)?),
                })
            },
        )
        .optional()
        .map_err(Error::from)
    }

    fn delete_bucket(&self, user_id: &str, exporter_id: i64) -> Result<bool> {
        let rows = self.conn().execute(
            "DELETE FROM buckets WHERE user_id = ?1 AND exporter_id = ?2",
            params![user_id, exporter_id],
        )?;
        Ok(rows > 0)
    }

    fn list_user_buckets(&self, user_id: &str) -> Result<Vec<BucketedExporter>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT e.id, e.name, e.repository_url, e.logo_url, e.category, e.official,
                    e.description, e.stars, e.recent_release, b.forked_repository_url,
                    EXISTS(SELECT 1 FROM stars s WHERE s.user_id = b.user_id AND s.exporter_id = e.id)
             FROM buckets b
             JOIN exporters e ON e.id = b.exporter_id
             WHERE b.user_id = ?1
             ORDER BY e.id DESC",
        )?;

        let rows = stmt.query_map(params![user_id], |row| {
            Ok(BucketedExporter {
                exporter: row_to_exporter(row)?,
                forked_repository_url: row.get(9)?,
                is_star: row.get(10)?,
            })
        })?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }
}
