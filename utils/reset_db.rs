use anyhow::Context;
use migration::{Migrator, MigratorTrait};
use sea_orm::Database;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;

    let db = Database::connect(database_url)
        .await
        .context("failed to connect to database")?;

    Migrator::reset(&db).await.context("failed to roll back migrations")?;
    println!("Database reset successfully");
    Ok(())
}
