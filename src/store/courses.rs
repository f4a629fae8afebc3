/*
`Store` methods for the `courses` table, including the explicit
relationship queries (who teaches a course, who is enrolled in it).
*/
use tokio_postgres::Row;

use super::{DbError, Store};
use super::students::student_from_row;
use super::teachers::teacher_from_row;
use crate::school::{Course, Student, Teacher};

pub(super) fn course_from_row(row: &Row) -> Result<Course, DbError> {
    Ok(Course {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        description: row.try_get("description")?,
    })
}

impl Store {
    /// Inserts a new course and returns its id. Course names are not
    /// required to be unique.
    pub async fn insert_course(
        &self,
        name: &str,
        description: &str,
    ) -> Result<i64, DbError> {
        log::trace!(
            "Store::insert_course( {:?}, {:?} ) called.",
            name, description
        );

        let client = self.connect().await?;
        let row = client.query_one(
            "INSERT INTO courses (name, description)
                VALUES ($1, $2)
                RETURNING id",
            &[&name, &description]
        ).await?;

        let id: i64 = row.try_get("id")?;
        log::trace!("Inserted course {:?} with id {}.", name, &id);
        Ok(id)
    }

    /// All courses, ordered ascending by name.
    pub async fn get_courses(&self) -> Result<Vec<Course>, DbError> {
        log::trace!("Store::get_courses() called.");

        let client = self.connect().await?;
        let rows = client.query(
            "SELECT * FROM courses ORDER BY name",
            &[]
        ).await?;

        let mut courses: Vec<Course> = Vec::with_capacity(rows.len());
        for row in rows.iter() {
            courses.push(course_from_row(row)?);
        }

        Ok(courses)
    }

    pub async fn get_course(&self, id: i64) -> Result<Course, DbError> {
        log::trace!("Store::get_course( {} ) called.", &id);

        let client = self.connect().await?;
        match client.query_opt(
            "SELECT * FROM courses WHERE id = $1",
            &[&id]
        ).await? {
            None => Err(DbError::NoSuchRecord),
            Some(row) => course_from_row(&row),
        }
    }

    /// All students enrolled in the given course.
    pub async fn get_students_for_course(
        &self,
        id: i64,
    ) -> Result<Vec<Student>, DbError> {
        log::trace!("Store::get_students_for_course( {} ) called.", &id);

        let client = self.connect().await?;
        let rows = client.query(
            "SELECT * FROM students WHERE course = $1 ORDER BY id",
            &[&id]
        ).await?;

        let mut students: Vec<Student> = Vec::with_capacity(rows.len());
        for row in rows.iter() {
            students.push(student_from_row(row)?);
        }

        Ok(students)
    }

    /// The teacher who has claimed the given course, if anyone has.
    pub async fn get_teacher_for_course(
        &self,
        id: i64,
    ) -> Result<Option<Teacher>, DbError> {
        log::trace!("Store::get_teacher_for_course( {} ) called.", &id);

        let client = self.connect().await?;
        match client.query_opt(
            "SELECT * FROM teachers WHERE course = $1",
            &[&id]
        ).await? {
            None => Ok(None),
            Some(row) => Ok(Some(teacher_from_row(&row)?)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use serial_test::serial;

    use crate::tests::ensure_logging;
    use crate::store::tests::TEST_CONNECTION;

    // Deliberately out of lexical order.
    static COURSES: &[(&str, &str)] = &[
        ("Woodworking", "Saws and sawdust"),
        ("Algebra", "Letters that are secretly numbers"),
        ("Music Theory", ""),
    ];

    #[tokio::test]
    #[ignore]
    #[serial]
    async fn courses_ordered_by_name() {
        ensure_logging();

        let db = Store::new(TEST_CONNECTION.to_owned());
        db.ensure_db_schema().await.unwrap();

        for (name, descr) in COURSES.iter().copied() {
            db.insert_course(name, descr).await.unwrap();
        }

        let courses = db.get_courses().await.unwrap();
        assert_eq!(courses.len(), COURSES.len());
        let names: Vec<&str> = courses.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Algebra", "Music Theory", "Woodworking"]);

        db.nuke_database().await.unwrap();
    }

    #[tokio::test]
    #[ignore]
    #[serial]
    async fn relationship_queries() {
        ensure_logging();

        let db = Store::new(TEST_CONNECTION.to_owned());
        db.ensure_db_schema().await.unwrap();

        let shop = db.insert_course("Woodworking", "Saws and sawdust").await.unwrap();
        let math = db.insert_course("Algebra", "").await.unwrap();

        let a = db.insert_student("Ann", "ann@school.test", shop).await.unwrap();
        let b = db.insert_student("Ben", "ben@school.test", shop).await.unwrap();
        db.insert_student("Cyd", "cyd@school.test", math).await.unwrap();

        let enrolled = db.get_students_for_course(shop).await.unwrap();
        let ids: Vec<i64> = enrolled.iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![a, b]);

        assert!(db.get_teacher_for_course(shop).await.unwrap().is_none());
        let t = db.insert_teacher("Mr. Plank", "plank@school.test", Some(shop))
            .await.unwrap();
        let claimant = db.get_teacher_for_course(shop).await.unwrap().unwrap();
        assert_eq!(claimant.id, t);

        assert_eq!(db.get_course(0).await, Err(DbError::NoSuchRecord));

        db.nuke_database().await.unwrap();
    }
}
