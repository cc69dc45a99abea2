//! sqlite-adapter: SQLite implementation of the TestimonialRepository port.
//!
//! Purpose
//! - Provide a lightweight, file-based testimonial collection so the server
//!   keeps visitor submissions across restarts without cloud dependencies.
//! - Implements the `TestimonialRepository` trait from the `domain` crate.
//!
//! Notes
//! - Uses `rusqlite` with the `bundled` feature for portability.
//! - Stores timestamps as milliseconds since UNIX_EPOCH so submissions made
//!   in the same second still order correctly.
//! - Ids are random UUIDs assigned on insert, prefixed with `t-`.

use std::path::Path;
use std::sync::Mutex;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use domain::{
    Clock, CoreError, ListOrder, NewTestimonial, Rating, Source, SystemClock, Testimonial,
    TestimonialRepository,
};
use rusqlite::{params, Connection};

/// SQLite-backed testimonial collection.
pub struct SqliteTestimonialRepo {
    conn: Mutex<Connection>,
    clock: Box<dyn Clock>,
}

impl SqliteTestimonialRepo {
    /// Open (or create) a SQLite database at the given path and ensure schema.
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, CoreError> {
        Self::with_clock(path, SystemClock)
    }

    pub fn with_clock<P: AsRef<Path>, C: Clock + 'static>(
        path: P,
        clock: C,
    ) -> Result<Self, CoreError> {
        let conn = Connection::open(path).map_err(map_sqerr)?;
        init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
            clock: Box::new(clock),
        })
    }

    /// Open at `path`, creating missing parent directories first.
    pub fn open_creating_dirs<P: AsRef<Path>>(path: P) -> Result<Self, CoreError> {
        if let Some(dir) = path.as_ref().parent() {
            std::fs::create_dir_all(dir).map_err(map_sqerr)?;
        }
        Self::new(path)
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>, CoreError> {
        self.conn
            .lock()
            .map_err(|_| CoreError::Repository("mutex poisoned".into()))
    }
}

fn init_schema(conn: &Connection) -> Result<(), CoreError> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS testimonials (
            seq INTEGER PRIMARY KEY AUTOINCREMENT,
            id TEXT NOT NULL UNIQUE,
            name TEXT NOT NULL,
            role TEXT,
            company TEXT,
            content TEXT NOT NULL,
            rating INTEGER NOT NULL CHECK (rating BETWEEN 1 AND 5),
            created_at INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_testimonials_created_at ON testimonials(created_at);
        "#,
    )
    .map_err(map_sqerr)
}

fn map_sqerr<E: std::fmt::Display>(e: E) -> CoreError {
    CoreError::Repository(format!("sqlite error: {e}"))
}

fn system_time_to_millis(t: SystemTime) -> i64 {
    t.duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::from_secs(0))
        .as_millis() as i64
}

fn millis_to_system_time(ms: i64) -> SystemTime {
    UNIX_EPOCH + Duration::from_millis(ms.max(0) as u64)
}

fn row_to_testimonial(row: &rusqlite::Row) -> Result<Testimonial, CoreError> {
    let id: String = row.get(0).map_err(map_sqerr)?;
    let name: String = row.get(1).map_err(map_sqerr)?;
    let role: Option<String> = row.get(2).map_err(map_sqerr)?;
    let company: Option<String> = row.get(3).map_err(map_sqerr)?;
    let content: String = row.get(4).map_err(map_sqerr)?;
    let rating: i64 = row.get(5).map_err(map_sqerr)?;
    let created_at: i64 = row.get(6).map_err(map_sqerr)?;

    let rating = u8::try_from(rating)
        .ok()
        .and_then(|r| Rating::new(r).ok())
        .ok_or_else(|| CoreError::Repository(format!("bad rating in db for {id}: {rating}")))?;
    Ok(Testimonial {
        id,
        name,
        role,
        company,
        content,
        rating,
        created_at: millis_to_system_time(created_at),
        source: Source::Remote,
    })
}

impl TestimonialRepository for SqliteTestimonialRepo {
    fn list(&self, order: ListOrder) -> Result<Vec<Testimonial>, CoreError> {
        let sql = match order {
            ListOrder::CreatedAtDesc => "SELECT id, name, role, company, content, rating, created_at FROM testimonials ORDER BY created_at DESC, seq DESC",
            ListOrder::CreatedAtAsc => "SELECT id, name, role, company, content, rating, created_at FROM testimonials ORDER BY created_at ASC, seq ASC",
        };
        let conn = self.lock()?;
        let mut stmt = conn.prepare(sql).map_err(map_sqerr)?;
        let mut rows = stmt.query([]).map_err(map_sqerr)?;
        let mut out = Vec::new();
        while let Some(row) = rows.next().map_err(map_sqerr)? {
            out.push(row_to_testimonial(row)?);
        }
        Ok(out)
    }

    fn insert(&self, candidate: NewTestimonial) -> Result<Testimonial, CoreError> {
        let testimonial = Testimonial {
            id: format!("t-{}", uuid::Uuid::new_v4().simple()),
            name: candidate.name,
            role: candidate.role,
            company: candidate.company,
            content: candidate.content,
            rating: candidate.rating,
            created_at: self.clock.now(),
            source: Source::Remote,
        };
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO testimonials(id, name, role, company, content, rating, created_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                testimonial.id,
                testimonial.name,
                testimonial.role,
                testimonial.company,
                testimonial.content,
                testimonial.rating.get() as i64,
                system_time_to_millis(testimonial.created_at),
            ],
        )
        .map_err(map_sqerr)?;
        // Millisecond storage; hand back exactly what a later list() returns.
        Ok(Testimonial {
            created_at: millis_to_system_time(system_time_to_millis(testimonial.created_at)),
            ..testimonial
        })
    }
}
