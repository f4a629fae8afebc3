/*!
Handlers for the teacher pages: the listing, adding a teacher (which
may claim a course), editing name and email, and deletion.
*/
use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    Form,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::{
    config::Glob,
    school::{Course, Teacher},
    store::DbError,
};
use super::*;

#[derive(Debug, Serialize)]
pub(super) struct TeacherRow<'a> {
    id: i64,
    name: &'a str,
    email: &'a str,
    course_name: Option<&'a str>,
}

pub(super) fn teacher_rows<'a>(
    teachers: &'a [Teacher],
    courses: &'a [Course],
) -> Vec<TeacherRow<'a>> {
    let names: HashMap<i64, &str> = courses.iter()
        .map(|c| (c.id, c.name.as_str()))
        .collect();

    teachers.iter()
        .map(|t| TeacherRow {
            id: t.id,
            name: &t.name,
            email: &t.email,
            course_name: t.course.and_then(|id| names.get(&id).copied()),
        }).collect()
}

/// Data type to read the form data from an add-teacher submission.
/// A course claim is required here, matching the add form.
#[derive(Debug, Deserialize)]
pub struct TeacherForm {
    name: Option<String>,
    email: Option<String>,
    course: Option<String>,
}

impl TeacherForm {
    fn validated(&self) -> Option<(&str, &str, i64)> {
        let name = required(&self.name)?;
        let email = required(&self.email)?;
        let course = required(&self.course)?.parse::<i64>().ok()?;
        Some((name, email, course))
    }
}

/// Data type for an edit-teacher submission; the course claim is not
/// editable through this form.
#[derive(Debug, Deserialize)]
pub struct TeacherEditForm {
    name: Option<String>,
    email: Option<String>,
}

/// GET `/teachers`: the teacher listing.
pub async fn teachers(
    Query(params): Query<FlashParams>,
    Extension(glob): Extension<Arc<Glob>>,
) -> Response {
    log::trace!("teacher::teachers() called.");

    let teachers = match glob.db.get_teachers().await {
        Ok(t) => t,
        Err(e) => {
            log::error!("Store::get_teachers(): {}", &e);
            return html_500();
        },
    };
    let courses = match glob.db.get_courses().await {
        Ok(c) => c,
        Err(e) => {
            log::error!("Store::get_courses(): {}", &e);
            return html_500();
        },
    };

    let flash = params.flash();
    let data = json!({
        "teachers": teacher_rows(&teachers, &courses),
        "flash_message": flash.map(|f| f.message()),
        "flash_category": flash.map(|f| f.category()),
    });

    serve_template(StatusCode::OK, "teachers", &data)
}

/// GET `/add_teacher`: the new-teacher form.
pub async fn add_form(
    Query(params): Query<FlashParams>,
    Extension(glob): Extension<Arc<Glob>>,
) -> Response {
    log::trace!("teacher::add_form() called.");

    let courses = match glob.db.get_courses().await {
        Ok(c) => c,
        Err(e) => {
            log::error!("Store::get_courses(): {}", &e);
            return html_500();
        },
    };

    let flash = params.flash();
    let data = json!({
        "courses": &courses,
        "flash_message": flash.map(|f| f.message()),
        "flash_category": flash.map(|f| f.category()),
    });

    serve_template(StatusCode::OK, "add_teacher", &data)
}

/// POST `/add_teacher`: insert a new teacher with a course claim.
///
/// The email-uniqueness and one-teacher-per-course rules are both
/// enforced by the insert itself; this handler just translates the
/// typed conflicts into flash messages.
pub async fn add(
    Extension(glob): Extension<Arc<Glob>>,
    Form(form): Form<TeacherForm>,
) -> Response {
    log::trace!("teacher::add( {:?} ) called.", &form);

    let (name, email, course) = match form.validated() {
        Some(fields) => fields,
        None => { return redirect_flash("/add_teacher", Flash::MissingField); },
    };

    match glob.db.insert_teacher(name, email, Some(course)).await {
        Ok(_) => redirect_flash("/", Flash::TeacherAdded),
        Err(DbError::DuplicateEmail) => redirect_flash("/add_teacher", Flash::DuplicateEmail),
        Err(DbError::CourseTaken) => redirect_flash("/add_teacher", Flash::CourseTaken),
        Err(DbError::NoSuchCourse) => redirect_flash("/add_teacher", Flash::NoSuchCourse),
        Err(e) => {
            log::error!(
                "Store::insert_teacher( {:?}, {:?}, {} ): {}",
                name, email, &course, &e
            );
            html_500()
        },
    }
}

/// GET `/edit-teacher/:id`: the edit form, or 404.
pub async fn edit_form(
    Path(id): Path<i64>,
    Query(params): Query<FlashParams>,
    Extension(glob): Extension<Arc<Glob>>,
) -> Response {
    log::trace!("teacher::edit_form( {} ) called.", &id);

    let teacher = match glob.db.get_teacher(id).await {
        Ok(t) => t,
        Err(DbError::NoSuchRecord) => { return respond_not_found(); },
        Err(e) => {
            log::error!("Store::get_teacher( {} ): {}", &id, &e);
            return html_500();
        },
    };

    let flash = params.flash();
    let data = json!({
        "teacher": &teacher,
        "flash_message": flash.map(|f| f.message()),
        "flash_category": flash.map(|f| f.category()),
    });

    serve_template(StatusCode::OK, "edit_teacher", &data)
}

/// POST `/edit-teacher/:id`: overwrite a teacher's name and email.
pub async fn edit(
    Path(id): Path<i64>,
    Extension(glob): Extension<Arc<Glob>>,
    Form(form): Form<TeacherEditForm>,
) -> Response {
    log::trace!("teacher::edit( {}, {:?} ) called.", &id, &form);

    let (name, email) = match (required(&form.name), required(&form.email)) {
        (Some(n), Some(e)) => (n, e),
        _ => {
            return redirect_flash(
                &format!("/edit-teacher/{}", id),
                Flash::MissingField
            );
        },
    };

    match glob.db.update_teacher(id, name, email).await {
        Ok(()) => redirect_flash("/", Flash::TeacherUpdated),
        Err(DbError::NoSuchRecord) => respond_not_found(),
        Err(DbError::DuplicateEmail) => redirect_flash(
            &format!("/edit-teacher/{}", id),
            Flash::DuplicateEmail
        ),
        Err(e) => {
            log::error!("Store::update_teacher( {}, ... ): {}", &id, &e);
            html_500()
        },
    }
}

/// GET `/delete-teacher/:id`: remove the row, or 404. The deleted
/// teacher's course claim disappears with the row.
pub async fn delete(
    Path(id): Path<i64>,
    Extension(glob): Extension<Arc<Glob>>,
) -> Response {
    log::trace!("teacher::delete( {} ) called.", &id);

    match glob.db.delete_teacher(id).await {
        Ok(()) => redirect_flash("/", Flash::TeacherDeleted),
        Err(DbError::NoSuchRecord) => respond_not_found(),
        Err(e) => {
            log::error!("Store::delete_teacher( {} ): {}", &id, &e);
            html_500()
        },
    }
}
