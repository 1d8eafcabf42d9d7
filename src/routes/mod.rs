pub mod auth;
pub mod health;
pub mod tasks;

use crate::auth::AuthGate;
use actix_web::web;

/// Mounts the API surface under the caller's scope (`/api` in `main`).
/// The auth endpoints are open; the task scope sits behind the gate.
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/auth")
            .service(auth::register)
            .service(auth::login)
            .service(auth::refresh)
            .service(auth::logout),
    )
    .service(
        web::scope("/tasks")
            .wrap(AuthGate)
            .service(tasks::list_tasks)
            .service(tasks::create_task)
            .service(tasks::get_task)
            .service(tasks::update_task)
            .service(tasks::delete_task),
    );
}
