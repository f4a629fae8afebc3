/*
`Store` methods for the `teachers` table.

The one-teacher-per-course rule lives in the UNIQUE constraint on the
nullable `course` column (Postgres permits any number of NULLs there),
so an insert claiming a taken course fails atomically with
`DbError::CourseTaken`.
*/
use tokio_postgres::Row;

use super::{DbError, Store};
use crate::school::Teacher;

pub(super) fn teacher_from_row(row: &Row) -> Result<Teacher, DbError> {
    Ok(Teacher {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        email: row.try_get("email")?,
        course: row.try_get("course")?,
    })
}

impl Store {
    pub async fn insert_teacher(
        &self,
        name: &str,
        email: &str,
        course: Option<i64>,
    ) -> Result<i64, DbError> {
        log::trace!(
            "Store::insert_teacher( {:?}, {:?}, {:?} ) called.",
            name, email, &course
        );

        let client = self.connect().await?;
        let row = client.query_one(
            "INSERT INTO teachers (name, email, course)
                VALUES ($1, $2, $3)
                RETURNING id",
            &[&name, &email, &course]
        ).await?;

        let id: i64 = row.try_get("id")?;
        log::trace!("Inserted teacher {:?} ({}) with id {}.", name, email, &id);
        Ok(id)
    }

    /// All teachers. No particular order is promised.
    pub async fn get_teachers(&self) -> Result<Vec<Teacher>, DbError> {
        log::trace!("Store::get_teachers() called.");

        let client = self.connect().await?;
        let rows = client.query("SELECT * FROM teachers", &[]).await?;

        let mut teachers: Vec<Teacher> = Vec::with_capacity(rows.len());
        for row in rows.iter() {
            teachers.push(teacher_from_row(row)?);
        }

        Ok(teachers)
    }

    pub async fn get_teacher(&self, id: i64) -> Result<Teacher, DbError> {
        log::trace!("Store::get_teacher( {} ) called.", &id);

        let client = self.connect().await?;
        match client.query_opt(
            "SELECT * FROM teachers WHERE id = $1",
            &[&id]
        ).await? {
            None => Err(DbError::NoSuchRecord),
            Some(row) => teacher_from_row(&row),
        }
    }

    /// Overwrites a teacher's name and email. The course claim is not
    /// editable through this method.
    pub async fn update_teacher(
        &self,
        id: i64,
        name: &str,
        email: &str,
    ) -> Result<(), DbError> {
        log::trace!(
            "Store::update_teacher( {}, {:?}, {:?} ) called.",
            &id, name, email
        );

        let client = self.connect().await?;
        let n = client.execute(
            "UPDATE teachers SET name = $2, email = $3 WHERE id = $1",
            &[&id, &name, &email]
        ).await?;

        match n {
            0 => Err(DbError::NoSuchRecord),
            1 => Ok(()),
            n => {
                log::warn!(
                    "Updating single teacher {} affected {} rows.",
                    &id, &n
                );
                Ok(())
            },
        }
    }

    /// Removes the teacher row. Any course claim goes with it, since
    /// the teacher row is the side holding the foreign key.
    pub async fn delete_teacher(&self, id: i64) -> Result<(), DbError> {
        log::trace!("Store::delete_teacher( {} ) called.", &id);

        let client = self.connect().await?;
        let n = client.execute(
            "DELETE FROM teachers WHERE id = $1",
            &[&id]
        ).await?;

        match n {
            0 => Err(DbError::NoSuchRecord),
            1 => Ok(()),
            n => {
                log::warn!(
                    "Deleting single teacher {} affected {} rows.",
                    &id, &n
                );
                Ok(())
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use serial_test::serial;

    use crate::tests::ensure_logging;
    use crate::store::tests::TEST_CONNECTION;

    #[tokio::test]
    #[ignore]
    #[serial]
    async fn email_and_course_exclusivity() {
        ensure_logging();

        let db = Store::new(TEST_CONNECTION.to_owned());
        db.ensure_db_schema().await.unwrap();

        let shop = db.insert_course("Woodworking", "").await.unwrap();
        let math = db.insert_course("Algebra", "").await.unwrap();

        let plank = db.insert_teacher("Mr. Plank", "plank@school.test", Some(shop))
            .await.unwrap();

        // Same email, different course.
        assert_eq!(
            db.insert_teacher("Ms. Plank", "plank@school.test", Some(math)).await,
            Err(DbError::DuplicateEmail)
        );
        // Different email, already-claimed course.
        assert_eq!(
            db.insert_teacher("Ms. Board", "board@school.test", Some(shop)).await,
            Err(DbError::CourseTaken)
        );
        assert_eq!(db.get_teachers().await.unwrap().len(), 1);

        // More than one teacher with no claim at all is fine.
        db.insert_teacher("Ms. Board", "board@school.test", None).await.unwrap();
        db.insert_teacher("Mr. Idle", "idle@school.test", None).await.unwrap();
        assert_eq!(db.get_teachers().await.unwrap().len(), 3);

        let t = db.get_teacher(plank).await.unwrap();
        assert_eq!(t.course, Some(shop));

        db.nuke_database().await.unwrap();
    }

    #[tokio::test]
    #[ignore]
    #[serial]
    async fn update_and_delete() {
        ensure_logging();

        let db = Store::new(TEST_CONNECTION.to_owned());
        db.ensure_db_schema().await.unwrap();

        let shop = db.insert_course("Woodworking", "").await.unwrap();
        let plank = db.insert_teacher("Mr. Plank", "plank@school.test", Some(shop))
            .await.unwrap();

        db.update_teacher(plank, "Dr. Plank", "dr.plank@school.test")
            .await.unwrap();
        let t = db.get_teacher(plank).await.unwrap();
        // Name and email change; the course claim is untouched.
        assert_eq!(t.name.as_str(), "Dr. Plank");
        assert_eq!(t.course, Some(shop));

        assert_eq!(
            db.update_teacher(0, "No One", "no.one@school.test").await,
            Err(DbError::NoSuchRecord)
        );

        // Deleting the teacher frees the course for a new claimant.
        db.delete_teacher(plank).await.unwrap();
        assert_eq!(db.delete_teacher(plank).await, Err(DbError::NoSuchRecord));
        db.insert_teacher("Ms. Board", "board@school.test", Some(shop))
            .await.unwrap();

        db.nuke_database().await.unwrap();
    }
}
