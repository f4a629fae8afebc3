/*!
The three record types the school keeps: courses, the teachers who
teach them, and the students enrolled in them.

A `Teacher` may hold a claim on at most one `Course` (and a `Course`
may be claimed by at most one `Teacher`); a `Student` always belongs
to exactly one `Course`. Both of those rules are enforced by the
database schema (see `crate::store`), not here; these are plain data.
*/
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Course {
    pub id: i64,
    pub name: String,
    pub description: String,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Teacher {
    pub id: i64,
    pub name: String,
    pub email: String,
    /// id of the course this teacher has claimed, if any.
    pub course: Option<i64>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Student {
    pub id: i64,
    pub name: String,
    pub email: String,
    /// id of the course this student is enrolled in.
    pub course: i64,
}
