/*!
Handlers for the course pages: the name-ordered listing and the
add-course form. Courses can't be edited or deleted through the web
surface; both teacher and student rows reference them, and the
foreign-key constraints would restrict a delete anyway.
*/
use std::sync::Arc;

use axum::{
    extract::{Extension, Query},
    Form,
};
use serde::Deserialize;
use serde_json::json;

use crate::config::Glob;
use super::*;

/// Data type to read the form data from an add-course submission.
#[derive(Debug, Deserialize)]
pub struct CourseForm {
    name: Option<String>,
    description: Option<String>,
}

/// GET `/courses`: all courses, ordered ascending by name.
pub async fn courses(
    Query(params): Query<FlashParams>,
    Extension(glob): Extension<Arc<Glob>>,
) -> Response {
    log::trace!("course::courses() called.");

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

    serve_template(StatusCode::OK, "courses", &data)
}

/// GET `/add-course`: the new-course form.
pub async fn add_form(
    Query(params): Query<FlashParams>,
) -> Response {
    log::trace!("course::add_form() called.");

    let flash = params.flash();
    let data = json!({
        "flash_message": flash.map(|f| f.message()),
        "flash_category": flash.map(|f| f.category()),
    });

    serve_template(StatusCode::OK, "add_course", &data)
}

/// POST `/add-course`: insert a new course. Only the name is
/// required; the description defaults to empty. Course names don't
/// have to be unique, so this can't conflict.
pub async fn add(
    Extension(glob): Extension<Arc<Glob>>,
    Form(form): Form<CourseForm>,
) -> Response {
    log::trace!("course::add( {:?} ) called.", &form);

    let name = match required(&form.name) {
        Some(name) => name,
        None => { return redirect_flash("/add-course", Flash::MissingField); },
    };
    let description = form.description.as_deref().map(str::trim).unwrap_or("");

    match glob.db.insert_course(name, description).await {
        Ok(_) => redirect_flash("/courses", Flash::CourseAdded),
        Err(e) => {
            log::error!(
                "Store::insert_course( {:?}, {:?} ): {}",
                name, description, &e
            );
            html_500()
        },
    }
}
