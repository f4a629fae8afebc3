/*!
Interoperation between the client (user) and server.

(Not the application and the database; that's covered by `store`.)

Handlers render pages through `serve_template()`; mutating handlers
finish with `redirect_flash()`, which sends the browser back to a
listing page with a one-shot status token in the query string. The
next page render decodes the token into message text and a category.
*/
use std::fmt::Debug;
use std::path::Path;

use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
};
use handlebars::Handlebars;
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};

pub mod course;
pub mod student;
pub mod teacher;

static TEMPLATES: OnceCell<Handlebars> = OnceCell::new();

static HTML_500: &str = r#"<!doctype html>
<html>
<head>
<meta charset="utf-8">
<title>registrar | Error</title>
<link rel="stylesheet" href="/static/registrar.css">
</head>
<body>
<h1>Internal Server Error</h1>
<p>(Error 500)</p>
<p>Something went wrong on our end. No further or more
helpful information is available about the problem.</p>
</body>
</html>"#;

static HTML_404: &str = r#"<!doctype html>
<html>
<head>
<meta charset="utf-8">
<title>registrar | Not Found</title>
<link rel="stylesheet" href="/static/registrar.css">
</head>
<body>
<h1>Not Found</h1>
<p>(Error 404)</p>
<p>There is no record here by that id. It may have been deleted,
or it may never have existed.</p>
</body>
</html>"#;

/**
Initializes the resources used in this module. This function should be
called before any functionality of this module or any of its submodules
is used.

Currently the only thing that happens here is loading the templates used
by `serve_template()`, which will panic unless `init()` has been called
first.

The argument is the path to the directory where the templates used by
`serve_template()` can be found.
*/
pub fn init<P: AsRef<Path>>(template_dir: P) -> Result<(), String> {
    if TEMPLATES.get().is_some() {
        log::warn!("Templates directory already initialized; ignoring.");
        return Ok(())
    }

    let template_dir = template_dir.as_ref();

    let mut h = Handlebars::new();
    #[cfg(debug_assertions)]
    h.set_dev_mode(true);
    h.register_templates_directory(".html", template_dir)
        .map_err(|e| format!(
            "Error registering templates directory {}: {}",
            template_dir.display(), &e
        ))?;

    TEMPLATES.set(h)
        .map_err(|old_h| {
            let mut estr = String::from("Templates directory already registered w/templates:");
            for template_name in old_h.get_templates().keys() {
                estr.push('\n');
                estr.push_str(template_name.as_str());
            }
            estr
        })?;

    Ok(())
}

/**
Return an HTML response in the case of an unrecoverable* error.

(*"Unrecoverable" from the perspective of fielding the current request,
not from the perspective of the program crashing.)
*/
pub fn html_500() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Html(HTML_500)
    ).into_response()
}

/// Return the 404 page; used whenever a path addresses a record id
/// that isn't in the database.
pub fn respond_not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        Html(HTML_404)
    ).into_response()
}

pub fn serve_template<S>(
    code: StatusCode,
    template_name: &str,
    data: &S,
) -> Response
where
    S: Serialize + Debug
{
    log::trace!("serve_template( {}, {:?}, ... ) called.", &code, template_name);

    match TEMPLATES.get().unwrap().render(template_name, data) {
        Ok(response_body) => (
            code,
            Html(response_body)
        ).into_response(),
        Err(e) => {
            log::error!(
                "Error rendering template {:?} with data {:?}:\n{}",
                template_name, data, &e
            );
            html_500()
        },
    }
}

/**
One-shot status messages shown on the page after a redirect.

Each variant has a stable token form (`Display`/`FromStr`) that rides
in the `flash` query parameter of the redirect target; the rendering
handler decodes it back and hands message text and category to the
template. Unknown tokens simply fail to parse and no message shows.
*/
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Flash {
    StudentAdded,
    StudentUpdated,
    StudentDeleted,
    TeacherAdded,
    TeacherUpdated,
    TeacherDeleted,
    CourseAdded,
    DuplicateEmail,
    CourseTaken,
    NoSuchCourse,
    MissingField,
}

impl Flash {
    pub fn message(&self) -> &'static str {
        match self {
            Flash::StudentAdded   => "Student added successfully!",
            Flash::StudentUpdated => "Student updated!",
            Flash::StudentDeleted => "Student deleted!",
            Flash::TeacherAdded   => "Teacher added successfully!",
            Flash::TeacherUpdated => "Teacher updated!",
            Flash::TeacherDeleted => "Teacher deleted!",
            Flash::CourseAdded    => "Course added!",
            Flash::DuplicateEmail => "Email already exists! Please use a different email.",
            Flash::CourseTaken    => "This course is already assigned to another teacher!",
            Flash::NoSuchCourse   => "That course doesn't exist.",
            Flash::MissingField   => "All required fields must be filled in.",
        }
    }

    pub fn category(&self) -> &'static str {
        match self {
            Flash::StudentAdded
            | Flash::StudentUpdated
            | Flash::TeacherAdded
            | Flash::TeacherUpdated
            | Flash::CourseAdded => "success",
            _ => "danger",
        }
    }
}

impl std::fmt::Display for Flash {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let token = match self {
            Flash::StudentAdded   => "student-added",
            Flash::StudentUpdated => "student-updated",
            Flash::StudentDeleted => "student-deleted",
            Flash::TeacherAdded   => "teacher-added",
            Flash::TeacherUpdated => "teacher-updated",
            Flash::TeacherDeleted => "teacher-deleted",
            Flash::CourseAdded    => "course-added",
            Flash::DuplicateEmail => "duplicate-email",
            Flash::CourseTaken    => "course-taken",
            Flash::NoSuchCourse   => "no-such-course",
            Flash::MissingField   => "missing-field",
        };

        write!(f, "{}", token)
    }
}

impl std::str::FromStr for Flash {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "student-added"   => Ok(Flash::StudentAdded),
            "student-updated" => Ok(Flash::StudentUpdated),
            "student-deleted" => Ok(Flash::StudentDeleted),
            "teacher-added"   => Ok(Flash::TeacherAdded),
            "teacher-updated" => Ok(Flash::TeacherUpdated),
            "teacher-deleted" => Ok(Flash::TeacherDeleted),
            "course-added"    => Ok(Flash::CourseAdded),
            "duplicate-email" => Ok(Flash::DuplicateEmail),
            "course-taken"    => Ok(Flash::CourseTaken),
            "no-such-course"  => Ok(Flash::NoSuchCourse),
            "missing-field"   => Ok(Flash::MissingField),
            _ => Err(format!("{:?} is not a valid Flash token.", s)),
        }
    }
}

/// A required form field: present, and nonblank once trimmed.
pub(crate) fn required(field: &Option<String>) -> Option<&str> {
    field.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// Query-string parameters common to the page-rendering handlers.
#[derive(Debug, Deserialize)]
pub struct FlashParams {
    pub flash: Option<String>,
}

impl FlashParams {
    /// The decoded flash token, if one rode in and it's recognizable.
    pub fn flash(&self) -> Option<Flash> {
        self.flash.as_deref().and_then(|t| t.parse().ok())
    }
}

/// 303 the browser to `dest`, carrying `flash` for the next render.
pub fn redirect_flash(dest: &str, flash: Flash) -> Response {
    log::trace!("redirect_flash( {:?}, {} ) called.", dest, &flash);

    Redirect::to(&format!("{}?flash={}", dest, flash)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::ensure_logging;

    static ALL_FLASHES: &[Flash] = &[
        Flash::StudentAdded,
        Flash::StudentUpdated,
        Flash::StudentDeleted,
        Flash::TeacherAdded,
        Flash::TeacherUpdated,
        Flash::TeacherDeleted,
        Flash::CourseAdded,
        Flash::DuplicateEmail,
        Flash::CourseTaken,
        Flash::NoSuchCourse,
        Flash::MissingField,
    ];

    #[test]
    fn flash_tokens_round_trip() {
        ensure_logging();

        for f in ALL_FLASHES.iter().copied() {
            let token = f.to_string();
            assert_eq!(token.parse::<Flash>(), Ok(f));
        }
    }

    #[test]
    fn bad_flash_tokens() {
        ensure_logging();

        assert!("".parse::<Flash>().is_err());
        assert!("student_added".parse::<Flash>().is_err());
        assert!("no-such-token".parse::<Flash>().is_err());

        let p = FlashParams { flash: Some("nonsense".to_owned()) };
        assert!(p.flash().is_none());
        let p = FlashParams { flash: Some("course-taken".to_owned()) };
        assert_eq!(p.flash(), Some(Flash::CourseTaken));
    }

    #[test]
    fn register_and_render_templates() {
        ensure_logging();

        init("templates/").unwrap();
        // A second call is harmless; it just warns and keeps the
        // already-registered set.
        init("templates/").unwrap();

        let data = serde_json::json!({
            "students": [],
            "flash_message": Flash::StudentAdded.message(),
            "flash_category": Flash::StudentAdded.category(),
        });
        let r = serve_template(StatusCode::OK, "index", &data);
        assert_eq!(r.status(), StatusCode::OK);
    }

    #[test]
    fn flash_categories() {
        ensure_logging();

        assert_eq!(Flash::StudentAdded.category(), "success");
        // Deletions report in the "danger" category, like failures.
        assert_eq!(Flash::StudentDeleted.category(), "danger");
        assert_eq!(Flash::DuplicateEmail.category(), "danger");
    }
}
