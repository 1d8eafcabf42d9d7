use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use sqlx::PgPool;

use taskdeck::config::Config;
use taskdeck::routes::{self, health};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init();

    let config = Config::from_env();
    let pool = PgPool::connect(&config.database_url)
        .await
        .expect("Failed to connect to database");

    log::info!("Starting taskdeck server at {}", config.server_url());

    let server_pool = pool.clone();
    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(server_pool.clone()))
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allow_any_method()
                    .allow_any_header()
                    .max_age(3600),
            )
            .wrap(Logger::default())
            .service(health::index)
            .service(web::scope("/api").configure(routes::config))
    })
    .bind((config.server_host.clone(), config.server_port))?
    .run()
    .await?;

    // run() resolves once the listener has stopped and in-flight requests
    // have drained; release the store connections before exiting.
    pool.close().await;
    log::info!("taskdeck server stopped");

    Ok(())
}
