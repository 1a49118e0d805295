use sqlx::MySqlPool;
use sqlx::mysql::MySqlPoolOptions;

/// One pool per process, created in `main` and handed to handlers as `web::Data`.
pub async fn init_db(database_url: &str) -> MySqlPool {
    MySqlPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await
        .expect("Failed to connect to database")
}
