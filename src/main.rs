/*!
Startup: logging, configuration, database schema and seed rows, then
the router.
*/
use std::sync::Arc;

use axum::{
    Router,
    routing::get,
    extract::Extension,
};
use simplelog::{ColorChoice, TerminalMode, TermLogger};
use tower_http::services::fs::ServeDir;

use registrar::config;
use registrar::inter;

/// Path to the optional configuration file; fields it omits (or its
/// absence altogether) fall back to `Cfg::default()`.
const CONFIG_ENV_VAR: &str = "REGISTRAR_CONFIG";

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let log_cfg = simplelog::ConfigBuilder::new()
        .add_filter_allow_str("registrar")
        .build();
    TermLogger::init(
        registrar::log_level_from_env(),
        log_cfg,
        TerminalMode::Stdout,
        ColorChoice::Auto
    ).unwrap();
    log::info!("Logging started.");

    let cfg = match std::env::var(CONFIG_ENV_VAR) {
        Ok(path) => config::Cfg::from_file(&path).unwrap(),
        Err(_) => config::Cfg::default(),
    };
    log::info!("Configuration:\n{:#?}", &cfg);

    let glob = config::load_configuration(&cfg).await.unwrap();
    let glob = Arc::new(glob);

    inter::init("templates/").unwrap();

    let app = Router::new()
        .route("/", get(inter::student::index))
        .route("/courses", get(inter::course::courses))
        .route("/teachers", get(inter::teacher::teachers))
        .route("/top-students", get(inter::student::top_students))
        .route("/search", get(inter::student::search))
        .route("/add", get(inter::student::add_form).post(inter::student::add))
        .route(
            "/edit-student/:id",
            get(inter::student::edit_form).post(inter::student::edit)
        )
        .route("/delete-student/:id", get(inter::student::delete))
        .route("/add-course", get(inter::course::add_form).post(inter::course::add))
        .route("/add_teacher", get(inter::teacher::add_form).post(inter::teacher::add))
        .route(
            "/edit-teacher/:id",
            get(inter::teacher::edit_form).post(inter::teacher::edit)
        )
        .route("/delete-teacher/:id", get(inter::teacher::delete))
        .nest_service("/static", ServeDir::new("static"))
        .layer(Extension(glob));

    log::info!("Listening on {}", &cfg.addr);

    axum::Server::bind(&cfg.addr)
        .serve(app.into_make_service())
        .await
        .unwrap();
}
