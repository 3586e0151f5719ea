use actix_web::middleware::Logger;
use actix_web::web::Data;
use actix_web::{App, HttpServer};
use anyhow::Context;
use env_logger::Env;
use modgate::moderation::ModerationEngine;
use modgate::{app_config, db};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    init_lib_mods();
    app_config::init();

    let server = app_config::server();
    let database = app_config::database();
    let identity = app_config::identity();
    let moderation = app_config::moderation();

    let pool = db::connect(&database)
        .await
        .with_context(|| {
            format!(
                "Failed to connect to database {}",
                db::redacted_url(&database.url)
            )
        })?;

    if database.create_schema {
        db::create_schema(&pool)
            .await
            .context("Failed to create database schema")?;
    }

    let engine = Data::new(ModerationEngine::new(pool, moderation));
    let identity = Data::new(identity);

    let mut http = HttpServer::new(move || {
        App::new()
            .app_data(engine.clone())
            .app_data(identity.clone())
            .wrap(Logger::new("%a %r %s %Dms"))
            .configure(modgate::web::configure)
    });

    if server.workers > 0 {
        http = http.workers(server.workers);
    }

    log::info!(
        "Listening on {}:{}",
        server.bind_address,
        server.port
    );

    http.bind((server.bind_address.as_str(), server.port))
        .with_context(|| format!("Failed to bind {}:{}", server.bind_address, server.port))?
        .run()
        .await
        .context("HTTP server stopped with an error")?;

    Ok(())
}

/// Initialize third party crates we rely on but don't have control over.
fn init_lib_mods() {
    // A missing .env is fine; everything has a default.
    dotenv::dotenv().ok();
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
}
