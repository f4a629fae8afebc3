/*
`Store` methods for the `students` table.

Inserts and updates run as single constrained statements; the UNIQUE
and REFERENCES constraints on the table turn email collisions and bad
course references into `DbError::DuplicateEmail` / `NoSuchCourse`
without any read-before-write window.
*/
use tokio_postgres::Row;

use super::{DbError, Store};
use crate::school::Student;

pub(super) fn student_from_row(row: &Row) -> Result<Student, DbError> {
    Ok(Student {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        email: row.try_get("email")?,
        course: row.try_get("course")?,
    })
}

impl Store {
    pub async fn insert_student(
        &self,
        name: &str,
        email: &str,
        course: i64,
    ) -> Result<i64, DbError> {
        log::trace!(
            "Store::insert_student( {:?}, {:?}, {} ) called.",
            name, email, &course
        );

        let client = self.connect().await?;
        let row = client.query_one(
            "INSERT INTO students (name, email, course)
                VALUES ($1, $2, $3)
                RETURNING id",
            &[&name, &email, &course]
        ).await?;

        let id: i64 = row.try_get("id")?;
        log::trace!("Inserted student {:?} ({}) with id {}.", name, email, &id);
        Ok(id)
    }

    pub async fn get_students(&self) -> Result<Vec<Student>, DbError> {
        log::trace!("Store::get_students() called.");

        let client = self.connect().await?;
        let rows = client.query(
            "SELECT * FROM students ORDER BY id",
            &[]
        ).await?;

        let mut students: Vec<Student> = Vec::with_capacity(rows.len());
        for row in rows.iter() {
            students.push(student_from_row(row)?);
        }

        Ok(students)
    }

    pub async fn get_student(&self, id: i64) -> Result<Student, DbError> {
        log::trace!("Store::get_student( {} ) called.", &id);

        let client = self.connect().await?;
        match client.query_opt(
            "SELECT * FROM students WHERE id = $1",
            &[&id]
        ).await? {
            None => Err(DbError::NoSuchRecord),
            Some(row) => student_from_row(&row),
        }
    }

    /// Overwrites every editable field of the addressed student.
    /// There are no partial-update semantics.
    pub async fn update_student(
        &self,
        id: i64,
        name: &str,
        email: &str,
        course: i64,
    ) -> Result<(), DbError> {
        log::trace!(
            "Store::update_student( {}, {:?}, {:?}, {} ) called.",
            &id, name, email, &course
        );

        let client = self.connect().await?;
        let n = client.execute(
            "UPDATE students SET name = $2, email = $3, course = $4
                WHERE id = $1",
            &[&id, &name, &email, &course]
        ).await?;

        match n {
            0 => Err(DbError::NoSuchRecord),
            1 => Ok(()),
            n => {
                log::warn!(
                    "Updating single student {} affected {} rows.",
                    &id, &n
                );
                Ok(())
            },
        }
    }

    pub async fn delete_student(&self, id: i64) -> Result<(), DbError> {
        log::trace!("Store::delete_student( {} ) called.", &id);

        let client = self.connect().await?;
        let n = client.execute(
            "DELETE FROM students WHERE id = $1",
            &[&id]
        ).await?;

        match n {
            0 => Err(DbError::NoSuchRecord),
            1 => Ok(()),
            n => {
                log::warn!(
                    "Deleting single student {} affected {} rows.",
                    &id, &n
                );
                Ok(())
            },
        }
    }

    /// Substring match on student name. The empty keyword matches
    /// every student. Matching is whatever SQL `LIKE` does, which on
    /// Postgres is case-sensitive.
    pub async fn search_students(
        &self,
        keyword: &str,
    ) -> Result<Vec<Student>, DbError> {
        log::trace!("Store::search_students( {:?} ) called.", keyword);

        let client = self.connect().await?;
        let rows = client.query(
            "SELECT * FROM students
                WHERE name LIKE '%' || $1 || '%'
                ORDER BY id",
            &[&keyword]
        ).await?;

        let mut students: Vec<Student> = Vec::with_capacity(rows.len());
        for row in rows.iter() {
            students.push(student_from_row(row)?);
        }

        Ok(students)
    }

    /// The first `n` students in id order. No semantic ordering is
    /// promised; id order just keeps the result stable.
    pub async fn get_first_students(
        &self,
        n: i64,
    ) -> Result<Vec<Student>, DbError> {
        log::trace!("Store::get_first_students( {} ) called.", &n);

        let client = self.connect().await?;
        let rows = client.query(
            "SELECT * FROM students ORDER BY id LIMIT $1",
            &[&n]
        ).await?;

        let mut students: Vec<Student> = Vec::with_capacity(rows.len());
        for row in rows.iter() {
            students.push(student_from_row(row)?);
        }

        Ok(students)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use serial_test::serial;

    use crate::tests::ensure_logging;
    use crate::store::tests::TEST_CONNECTION;

    static STUDENTS: &[(&str, &str)] = &[
        ("Ann Teak", "ann@school.test"),
        ("Ben Dover", "ben@school.test"),
        ("Cyd Down", "cyd@school.test"),
        ("Dee Zaster", "dee@school.test"),
    ];

    #[tokio::test]
    #[ignore]
    #[serial]
    async fn insert_and_constraints() {
        ensure_logging();

        let db = Store::new(TEST_CONNECTION.to_owned());
        db.ensure_db_schema().await.unwrap();

        let crs = db.insert_course("Algebra", "").await.unwrap();

        for (name, email) in STUDENTS.iter().copied() {
            db.insert_student(name, email, crs).await.unwrap();
        }

        // Same email again: conflict, and no new row.
        assert_eq!(
            db.insert_student("Ann Again", "ann@school.test", crs).await,
            Err(DbError::DuplicateEmail)
        );
        // Course that isn't there: also a typed conflict.
        assert_eq!(
            db.insert_student("Ed Lost", "ed@school.test", crs + 1000).await,
            Err(DbError::NoSuchCourse)
        );
        assert_eq!(db.get_students().await.unwrap().len(), STUDENTS.len());

        db.nuke_database().await.unwrap();
    }

    #[tokio::test]
    #[ignore]
    #[serial]
    async fn search_and_first_n() {
        ensure_logging();

        let db = Store::new(TEST_CONNECTION.to_owned());
        db.ensure_db_schema().await.unwrap();

        let crs = db.insert_course("Algebra", "").await.unwrap();
        for (name, email) in STUDENTS.iter().copied() {
            db.insert_student(name, email, crs).await.unwrap();
        }

        // Empty keyword matches the whole listing.
        let all = db.get_students().await.unwrap();
        assert_eq!(db.search_students("").await.unwrap(), all);

        let hits = db.search_students("D").await.unwrap();
        let names: Vec<&str> = hits.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Ben Dover", "Cyd Down", "Dee Zaster"]);

        // LIKE is case-sensitive here.
        assert!(db.search_students("dOvEr").await.unwrap().is_empty());
        assert!(db.search_students("nomatch").await.unwrap().is_empty());

        let top = db.get_first_students(3).await.unwrap();
        assert_eq!(top.as_slice(), &all[..3]);

        db.nuke_database().await.unwrap();
    }

    #[tokio::test]
    #[ignore]
    #[serial]
    async fn update_and_delete() {
        ensure_logging();

        let db = Store::new(TEST_CONNECTION.to_owned());
        db.ensure_db_schema().await.unwrap();

        let crs = db.insert_course("Algebra", "").await.unwrap();
        let shop = db.insert_course("Woodworking", "").await.unwrap();
        let mut ids: Vec<i64> = Vec::new();
        for (name, email) in STUDENTS.iter().copied() {
            ids.push(db.insert_student(name, email, crs).await.unwrap());
        }

        db.update_student(ids[0], "Ann Teak", "ann.t@school.test", shop)
            .await.unwrap();
        let ann = db.get_student(ids[0]).await.unwrap();
        assert_eq!(
            (ann.email.as_str(), ann.course),
            ("ann.t@school.test", shop)
        );

        // The unique constraint also guards the update path.
        assert_eq!(
            db.update_student(ids[0], "Ann Teak", "ben@school.test", shop).await,
            Err(DbError::DuplicateEmail)
        );

        assert_eq!(
            db.update_student(0, "No One", "no.one@school.test", crs).await,
            Err(DbError::NoSuchRecord)
        );

        db.delete_student(ids[1]).await.unwrap();
        assert_eq!(db.delete_student(ids[1]).await, Err(DbError::NoSuchRecord));
        let remaining = db.get_students().await.unwrap();
        let left: Vec<i64> = remaining.iter().map(|s| s.id).collect();
        assert_eq!(left, vec![ids[0], ids[2], ids[3]]);

        db.nuke_database().await.unwrap();
    }
}
