/*!
Database interaction module.

The Postgres database to which this connects holds the following three
tables.

```sql

CREATE TABLE courses (
    id          BIGSERIAL PRIMARY KEY,
    name        TEXT NOT NULL,
    description TEXT NOT NULL DEFAULT ''
);

CREATE TABLE teachers (
    id     BIGSERIAL PRIMARY KEY,
    name   TEXT NOT NULL,
    email  TEXT UNIQUE NOT NULL,
    course BIGINT UNIQUE REFERENCES courses(id)  /* NULL: no course claimed */
);

CREATE TABLE students (
    id     BIGSERIAL PRIMARY KEY,
    name   TEXT NOT NULL,
    email  TEXT UNIQUE NOT NULL,
    course BIGINT NOT NULL REFERENCES courses(id)
);
```

The UNIQUE and REFERENCES constraints do the real work: email
collisions, double-claimed courses, and dangling course references are
all caught at commit time by the database, and the resulting errors are
mapped to the appropriate `DbError` variant. Callers should insert or
update directly and match on the result rather than querying first.
*/
use std::fmt::Write;

use tokio_postgres::{Client, NoTls, error::SqlState};

pub mod courses;
pub mod students;
pub mod teachers;

static SCHEMA: &[(&str, &str, &str)] = &[
    // Creation order matters: teachers and students both reference
    // courses. Drops run in reverse.

    (
        "SELECT FROM information_schema.tables WHERE table_name = 'courses'",
        "CREATE TABLE courses (
            id          BIGSERIAL PRIMARY KEY,
            name        TEXT NOT NULL,
            description TEXT NOT NULL DEFAULT ''
        )",
        "DROP TABLE courses",
    ),

    (
        "SELECT FROM information_schema.tables WHERE table_name = 'teachers'",
        "CREATE TABLE teachers (
            id     BIGSERIAL PRIMARY KEY,
            name   TEXT NOT NULL,
            email  TEXT UNIQUE NOT NULL,
            course BIGINT UNIQUE REFERENCES courses(id)
        )",
        "DROP TABLE teachers",
    ),

    (
        "SELECT FROM information_schema.tables WHERE table_name = 'students'",
        "CREATE TABLE students (
            id     BIGSERIAL PRIMARY KEY,
            name   TEXT NOT NULL,
            email  TEXT UNIQUE NOT NULL,
            course BIGINT NOT NULL REFERENCES courses(id)
        )",
        "DROP TABLE students",
    ),
];

/// Sample rows inserted on first startup. Seed teachers start with no
/// claimed course; there are no seed students.
static SEED_TEACHERS: &[(&str, &str)] = &[
    ("Mr. Sharma", "sharma@gmail.com"),
    ("Ms. Khan", "khan@gmail.com"),
];

static SEED_COURSES: &[(&str, &str)] = &[
    ("Python Basics", "Learn Python fundamentals"),
    ("Web Development", "HTML, CSS, and HTTP"),
    ("Data Science", "Data analysis with Python"),
];

#[derive(Debug, PartialEq)]
pub enum DbError {
    /// A lookup, update, or delete addressed an id that isn't there.
    NoSuchRecord,
    /// An insert or update would duplicate a teacher's or student's
    /// email address.
    DuplicateEmail,
    /// An insert would claim a course that already has a teacher.
    CourseTaken,
    /// A course reference points at a course id that doesn't exist.
    NoSuchCourse,
    Other(String),
}

impl DbError {
    /// Prepend some contextual `annotation` for the error.
    ///
    /// The typed variants already say everything there is to say, so
    /// annotation only touches `Other`.
    fn annotate(self, annotation: &str) -> Self {
        match self {
            DbError::Other(s) => DbError::Other(format!("{}: {}", annotation, &s)),
            e => e,
        }
    }
}

impl std::fmt::Display for DbError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            DbError::NoSuchRecord => write!(f, "no record with that id"),
            DbError::DuplicateEmail => write!(f, "email address already in use"),
            DbError::CourseTaken => write!(f, "course already has an assigned teacher"),
            DbError::NoSuchCourse => write!(f, "referenced course does not exist"),
            DbError::Other(s) => write!(f, "{}", s),
        }
    }
}

impl From<tokio_postgres::error::Error> for DbError {
    fn from(e: tokio_postgres::error::Error) -> DbError {
        if let Some(dbe) = e.as_db_error() {
            let code = dbe.code();
            if *code == SqlState::UNIQUE_VIOLATION {
                // The only unique constraint that isn't an email
                // column is the teachers.course claim.
                match dbe.constraint() {
                    Some("teachers_course_key") => { return DbError::CourseTaken; },
                    Some(_) => { return DbError::DuplicateEmail; },
                    None => {},
                }
            } else if *code == SqlState::FOREIGN_KEY_VIOLATION {
                return DbError::NoSuchCourse;
            }
            let mut s = format!("Data DB: {}", &e);
            write!(&mut s, "; {}", dbe).unwrap();
            return DbError::Other(s);
        }
        DbError::Other(format!("Data DB: {}", &e))
    }
}

impl From<String> for DbError {
    fn from(s: String) -> DbError { DbError::Other(s) }
}

#[derive(Debug)]
pub struct Store {
    connection_string: String,
}

impl Store {
    pub fn new(connection_string: String) -> Self {
        log::trace!("Store::new( {:?} ) called.", &connection_string);

        Self { connection_string }
    }

    async fn connect(&self) -> Result<Client, DbError> {
        log::trace!(
            "Store::connect() called w/connection string {:?}",
            &self.connection_string
        );

        match tokio_postgres::connect(&self.connection_string, NoTls).await {
            Ok((client, connection)) => {
                log::trace!("    ...connection successful.");
                tokio::spawn(async move {
                    if let Err(e) = connection.await {
                        log::error!("Data DB connection error: {}", &e);
                    } else {
                        log::trace!("tokio connection runtime drops.");
                    }
                });
                Ok(client)
            },
            Err(e) => {
                let dberr = DbError::from(e);
                log::trace!("    ...connection failed: {:?}", &dberr);
                Err(dberr.annotate("Unable to connect"))
            }
        }
    }

    pub async fn ensure_db_schema(&self) -> Result<(), DbError> {
        log::trace!("Store::ensure_db_schema() called.");

        let mut client = self.connect().await?;
        let t = client.transaction().await
            .map_err(|e| DbError::from(e)
                .annotate("Data DB unable to begin transaction"))?;

        for (test_stmt, create_stmt, _) in SCHEMA.iter() {
            if t.query_opt(test_stmt.to_owned(), &[]).await?.is_none() {
                log::info!(
                    "{:?} returned no results; attempting to insert table.",
                    test_stmt
                );
                t.execute(create_stmt.to_owned(), &[]).await?;
            }
        }

        t.commit().await
            .map_err(|e| DbError::from(e)
                .annotate("Error committing transaction"))
    }

    /**
    Inserts the sample teachers and courses, but only into tables that
    are empty. Each seed step is gated by its own emptiness check, so
    running this any number of times leaves exactly one copy of the
    sample rows.
    */
    pub async fn ensure_seed_data(&self) -> Result<(), DbError> {
        log::trace!("Store::ensure_seed_data() called.");

        let mut client = self.connect().await?;
        let t = client.transaction().await?;

        let row = t.query_one("SELECT count(*) FROM teachers", &[]).await?;
        let n_teachers: i64 = row.try_get(0)?;
        if n_teachers == 0 {
            log::info!(
                "teachers table empty; inserting {} sample teachers.",
                SEED_TEACHERS.len()
            );
            for (name, email) in SEED_TEACHERS.iter().copied() {
                t.execute(
                    "INSERT INTO teachers (name, email) VALUES ($1, $2)",
                    &[&name, &email]
                ).await?;
            }
        }

        let row = t.query_one("SELECT count(*) FROM courses", &[]).await?;
        let n_courses: i64 = row.try_get(0)?;
        if n_courses == 0 {
            log::info!(
                "courses table empty; inserting {} sample courses.",
                SEED_COURSES.len()
            );
            for (name, description) in SEED_COURSES.iter().copied() {
                t.execute(
                    "INSERT INTO courses (name, description) VALUES ($1, $2)",
                    &[&name, &description]
                ).await?;
            }
        }

        t.commit().await
            .map_err(|e| DbError::from(e)
                .annotate("Error committing seed transaction"))
    }

    /**
    Drop all database tables to fully reset database state.

    This is only meant for cleanup after testing. It is advisable to look at
    the ERROR level log output when testing to ensure this method did its job.
    */
    #[cfg(test)]
    pub async fn nuke_database(&self) -> Result<(), DbError> {
        log::trace!("Store::nuke_database() called.");

        let client = self.connect().await?;

        for (_, _, drop_stmt) in SCHEMA.iter().rev() {
            if let Err(e) = client.execute(drop_stmt.to_owned(), &[]).await {
                let err = DbError::from(e);
                log::error!("Error dropping: {:?}: {}", &drop_stmt, &err);
            }
        }

        log::trace!("    ...nuking complete.");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    /*!
    These tests assume you have a Postgres instance running on your local
    machine with resources named according to what you see in the
    `static TEST_CONNECTION &str`:

    ```text
    user: registrar_test
    password: registrar_test

    with write access to:

    database: registrar_test
    ```

    Because they need that live database, they are all `#[ignore]`d;
    run them with

    ```bash
    cargo test -- --ignored
    ```
    */
    use super::*;
    use crate::tests::ensure_logging;

    use serial_test::serial;

    pub static TEST_CONNECTION: &str = "host=localhost user=registrar_test password='registrar_test' dbname=registrar_test";

    /**
    This function is for getting the database back in a blank slate state if
    a test panics partway through and leaves it munged.

    ```bash
    cargo test reset_store -- --ignored
    ```
    */
    #[tokio::test]
    #[ignore]
    #[serial]
    async fn reset_store() {
        ensure_logging();
        let db = Store::new(TEST_CONNECTION.to_owned());
        db.nuke_database().await.unwrap();
    }

    #[tokio::test]
    #[ignore]
    #[serial]
    async fn create_store() {
        ensure_logging();

        let db = Store::new(TEST_CONNECTION.to_owned());
        db.ensure_db_schema().await.unwrap();
        db.nuke_database().await.unwrap();
    }

    #[tokio::test]
    #[ignore]
    #[serial]
    async fn seed_is_idempotent() {
        ensure_logging();

        let db = Store::new(TEST_CONNECTION.to_owned());
        db.ensure_db_schema().await.unwrap();

        db.ensure_seed_data().await.unwrap();
        db.ensure_seed_data().await.unwrap();

        let teachers = db.get_teachers().await.unwrap();
        assert_eq!(teachers.len(), SEED_TEACHERS.len());
        for t in teachers.iter() {
            assert!(t.course.is_none());
        }

        let courses = db.get_courses().await.unwrap();
        assert_eq!(courses.len(), SEED_COURSES.len());

        db.nuke_database().await.unwrap();
    }
}
