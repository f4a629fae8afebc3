/*!
Handlers for the student-facing pages: the combined listing, the
top-students and search views, and the add/edit/delete operations.
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
    school::{Course, Student},
    store::DbError,
};
use super::*;

/// How many rows the "top students" view shows.
const TOP_STUDENT_COUNT: i64 = 3;

#[derive(Debug, Serialize)]
struct StudentRow<'a> {
    id: i64,
    name: &'a str,
    email: &'a str,
    course: i64,
    course_name: Option<&'a str>,
}

fn student_rows<'a>(
    students: &'a [Student],
    courses: &'a [Course],
) -> Vec<StudentRow<'a>> {
    let names: HashMap<i64, &str> = courses.iter()
        .map(|c| (c.id, c.name.as_str()))
        .collect();

    students.iter()
        .map(|s| StudentRow {
            id: s.id,
            name: &s.name,
            email: &s.email,
            course: s.course,
            course_name: names.get(&s.course).copied(),
        }).collect()
}

/// Data type to read the form data from an add- or edit-student
/// submission. Everything is optional so that a half-filled form
/// gets a flash message instead of an extractor rejection.
#[derive(Debug, Deserialize)]
pub struct StudentForm {
    name: Option<String>,
    email: Option<String>,
    course: Option<String>,
}

impl StudentForm {
    fn validated(&self) -> Option<(&str, &str, i64)> {
        let name = required(&self.name)?;
        let email = required(&self.email)?;
        let course = required(&self.course)?.parse::<i64>().ok()?;
        Some((name, email, course))
    }
}

/// GET `/`: the combined student and teacher listing.
pub async fn index(
    Query(params): Query<FlashParams>,
    Extension(glob): Extension<Arc<Glob>>,
) -> Response {
    log::trace!("student::index() called.");

    let students = match glob.db.get_students().await {
        Ok(s) => s,
        Err(e) => {
            log::error!("Store::get_students(): {}", &e);
            return html_500();
        },
    };
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
        "students": student_rows(&students, &courses),
        "teachers": teacher::teacher_rows(&teachers, &courses),
        "flash_message": flash.map(|f| f.message()),
        "flash_category": flash.map(|f| f.category()),
    });

    serve_template(StatusCode::OK, "index", &data)
}

/// GET `/top-students`: the first few students, in storage (id) order.
pub async fn top_students(
    Extension(glob): Extension<Arc<Glob>>,
) -> Response {
    log::trace!("student::top_students() called.");

    let students = match glob.db.get_first_students(TOP_STUDENT_COUNT).await {
        Ok(s) => s,
        Err(e) => {
            log::error!("Store::get_first_students( {} ): {}", TOP_STUDENT_COUNT, &e);
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

    let data = json!({
        "students": student_rows(&students, &courses),
    });

    serve_template(StatusCode::OK, "index", &data)
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    q: Option<String>,
}

/// GET `/search?q=kw`: substring match on student name. An absent or
/// empty keyword matches everyone.
pub async fn search(
    Query(params): Query<SearchParams>,
    Extension(glob): Extension<Arc<Glob>>,
) -> Response {
    let keyword = params.q.as_deref().unwrap_or("");
    log::trace!("student::search( {:?} ) called.", keyword);

    let students = match glob.db.search_students(keyword).await {
        Ok(s) => s,
        Err(e) => {
            log::error!("Store::search_students( {:?} ): {}", keyword, &e);
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

    let data = json!({
        "students": student_rows(&students, &courses),
        "query": keyword,
    });

    serve_template(StatusCode::OK, "index", &data)
}

/// GET `/add`: the new-student form.
pub async fn add_form(
    Query(params): Query<FlashParams>,
    Extension(glob): Extension<Arc<Glob>>,
) -> Response {
    log::trace!("student::add_form() called.");

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

    serve_template(StatusCode::OK, "add_student", &data)
}

/// POST `/add`: insert a new student, or flash why not.
pub async fn add(
    Extension(glob): Extension<Arc<Glob>>,
    Form(form): Form<StudentForm>,
) -> Response {
    log::trace!("student::add( {:?} ) called.", &form);

    let (name, email, course) = match form.validated() {
        Some(fields) => fields,
        None => { return redirect_flash("/add", Flash::MissingField); },
    };

    match glob.db.insert_student(name, email, course).await {
        Ok(_) => redirect_flash("/", Flash::StudentAdded),
        Err(DbError::DuplicateEmail) => redirect_flash("/add", Flash::DuplicateEmail),
        Err(DbError::NoSuchCourse) => redirect_flash("/add", Flash::NoSuchCourse),
        Err(e) => {
            log::error!(
                "Store::insert_student( {:?}, {:?}, {} ): {}",
                name, email, &course, &e
            );
            html_500()
        },
    }
}

/// GET `/edit-student/:id`: the edit form, or 404.
pub async fn edit_form(
    Path(id): Path<i64>,
    Query(params): Query<FlashParams>,
    Extension(glob): Extension<Arc<Glob>>,
) -> Response {
    log::trace!("student::edit_form( {} ) called.", &id);

    let student = match glob.db.get_student(id).await {
        Ok(s) => s,
        Err(DbError::NoSuchRecord) => { return respond_not_found(); },
        Err(e) => {
            log::error!("Store::get_student( {} ): {}", &id, &e);
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

    // Each option carries its own "selected" flag so the template
    // stays logic-free.
    let course_opts: Vec<serde_json::Value> = courses.iter()
        .map(|c| json!({
            "id": c.id,
            "name": &c.name,
            "selected": c.id == student.course,
        })).collect();

    let flash = params.flash();
    let data = json!({
        "student": &student,
        "courses": course_opts,
        "flash_message": flash.map(|f| f.message()),
        "flash_category": flash.map(|f| f.category()),
    });

    serve_template(StatusCode::OK, "edit_student", &data)
}

/// POST `/edit-student/:id`: overwrite all of a student's fields.
pub async fn edit(
    Path(id): Path<i64>,
    Extension(glob): Extension<Arc<Glob>>,
    Form(form): Form<StudentForm>,
) -> Response {
    log::trace!("student::edit( {}, {:?} ) called.", &id, &form);

    let (name, email, course) = match form.validated() {
        Some(fields) => fields,
        None => {
            return redirect_flash(
                &format!("/edit-student/{}", id),
                Flash::MissingField
            );
        },
    };

    match glob.db.update_student(id, name, email, course).await {
        Ok(()) => redirect_flash("/", Flash::StudentUpdated),
        Err(DbError::NoSuchRecord) => respond_not_found(),
        Err(DbError::DuplicateEmail) => redirect_flash(
            &format!("/edit-student/{}", id),
            Flash::DuplicateEmail
        ),
        Err(DbError::NoSuchCourse) => redirect_flash(
            &format!("/edit-student/{}", id),
            Flash::NoSuchCourse
        ),
        Err(e) => {
            log::error!("Store::update_student( {}, ... ): {}", &id, &e);
            html_500()
        },
    }
}

/// GET `/delete-student/:id`: remove the row, or 404.
pub async fn delete(
    Path(id): Path<i64>,
    Extension(glob): Extension<Arc<Glob>>,
) -> Response {
    log::trace!("student::delete( {} ) called.", &id);

    match glob.db.delete_student(id).await {
        Ok(()) => redirect_flash("/", Flash::StudentDeleted),
        Err(DbError::NoSuchRecord) => respond_not_found(),
        Err(e) => {
            log::error!("Store::delete_student( {} ): {}", &id, &e);
            html_500()
        },
    }
}
