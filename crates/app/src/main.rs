use migration::{Migrator, MigratorTrait};
use settings::Database;

mod settings;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let settings = settings::Settings::new()?;

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "kantor={level},server={level},engine={level}",
            level = settings.app.level
        ))
        .init();

    if settings.server.auth.jwt_secret.is_empty() {
        // Better to refuse startup than to issue tokens nothing can verify.
        return Err("jwt_secret must not be empty; set [server.auth] in settings.toml".into());
    }

    let db = parse_database(&settings.server.database).await?;
    let engine = engine::Engine::builder().database(db).build().await?;

    let config = server::ServerConfig {
        jwt_secret: settings.server.auth.jwt_secret,
        token_ttl_secs: settings.server.auth.token_ttl_secs.unwrap_or(3600),
        nbp_base_url: settings
            .server
            .nbp_base_url
            .unwrap_or_else(|| "https://api.nbp.pl/api/".to_string()),
    };

    let bind = settings.server.bind.unwrap_or_else(|| "127.0.0.1".to_string());
    let addr = format!("{}:{}", bind, settings.server.port);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    server::run_with_listener(engine, config, listener).await?;

    Ok(())
}

async fn parse_database(
    config: &Database,
) -> Result<sea_orm::DatabaseConnection, Box<dyn std::error::Error + Send + Sync>> {
    let url = match config {
        Database::Memory => String::from("sqlite::memory:"),
        Database::Sqlite(path) => format!("sqlite:{}?mode=rwc", path),
    };

    let database = sea_orm::Database::connect(url).await?;
    Migrator::up(&database, None).await?;
    Ok(database)
}
