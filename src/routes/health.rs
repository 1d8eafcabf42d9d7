use actix_web::{get, HttpResponse, Responder};

/// Liveness probe. Plain text so load balancers and humans can read it
/// without parsing anything.
#[get("/")]
pub async fn index() -> impl Responder {
    HttpResponse::Ok().body("taskdeck API is running")
}
