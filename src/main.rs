use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use std::sync::Arc;

use learntrack::auth::{GoogleDisabled, GoogleOAuth, IdentityProvider, TokenService};
use learntrack::bootstrap;
use learntrack::config::Config;
use learntrack::routes;
use learntrack::store::{PgUserStore, UserStore};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init();

    let config = Config::from_env();

    let pool = sqlx::PgPool::connect(&config.database_url)
        .await
        .expect("Failed to connect to database");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run database migrations");

    let store: Arc<dyn UserStore> = Arc::new(PgUserStore::new(pool));

    // The admin account is a required operational invariant; refuse to serve
    // without it.
    match bootstrap::ensure_admin_user(store.as_ref(), &config.admin_password).await {
        Ok(admin) => log::info!("admin account ready: {}", admin.email),
        Err(err) => {
            log::error!("admin bootstrap failed: {}", err);
            std::process::exit(1);
        }
    }

    let tokens = TokenService::new(&config.jwt_secret);
    let provider: Arc<dyn IdentityProvider> = match &config.google {
        Some(google) => Arc::new(
            GoogleOAuth::new(google).expect("Failed to initialise the Google OAuth client"),
        ),
        None => {
            log::warn!("Google OAuth is not configured; Google sign-in is disabled");
            Arc::new(GoogleDisabled)
        }
    };

    let frontend_origins: Vec<String> = config
        .frontend_url
        .split(',')
        .map(|origin| origin.trim().to_string())
        .collect();

    let bind_addr = (config.server_host.clone(), config.server_port);
    log::info!("Starting LearnTrack server at {}", config.server_url());

    HttpServer::new(move || {
        let mut cors = Cors::default()
            .allow_any_method()
            .allow_any_header()
            .supports_credentials()
            .max_age(3600);
        for origin in &frontend_origins {
            cors = cors.allowed_origin(origin);
        }

        App::new()
            .app_data(web::Data::from(store.clone()))
            .app_data(web::Data::new(tokens.clone()))
            .app_data(web::Data::from(provider.clone()))
            .app_data(web::Data::new(config.clone()))
            .wrap(cors)
            .wrap(Logger::default())
            .service(routes::health::welcome)
            .service(routes::health::health)
            .service(web::scope("/api").configure(routes::config))
    })
    .bind(bind_addr)?
    .run()
    .await
}
