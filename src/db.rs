use std::sync::Arc;

use sqlx::{migrate::MigrateDatabase, sqlite::SqlitePoolOptions, Sqlite, SqlitePool};
use tracing::info;

use crate::config::{self, AppConfig, DatabaseConfig, ProductBackend, TodoBackend};
use crate::models::{Product, Todo};
use crate::store::{DocumentStore, MemoryStore, SqlStore, Storer};

fn is_in_memory(url: &str) -> bool {
    url.contains(":memory:") || url.contains("mode=memory")
}

/// Opens the SQLite pool, creating the database file (and its directory) if missing.
pub async fn connect_sqlite(cfg: &DatabaseConfig) -> anyhow::Result<SqlitePool> {
    let db_url = &cfg.url;
    if !is_in_memory(db_url) {
        config::ensure_sqlite_parent_dir(db_url)?;
        if !Sqlite::database_exists(db_url).await.unwrap_or(false) {
            info!("Creating SQLite database at {}", db_url);
            Sqlite::create_database(db_url).await?;
        }
    }
    let pool = SqlitePoolOptions::new()
        .max_connections(cfg.max_connections)
        .after_connect(|conn, _meta| {
            Box::pin(async move {
                let _ = sqlx::query("PRAGMA busy_timeout=10000;").execute(&mut *conn).await;
                let _ = sqlx::query("PRAGMA temp_store=MEMORY;").execute(&mut *conn).await;
                Ok(())
            })
        })
        .connect(db_url)
        .await?;
    Ok(pool)
}

pub async fn init_db(pool: &SqlitePool) -> anyhow::Result<()> {
    // Pragmas for better durability/performance
    if let Err(e) = sqlx::query("PRAGMA journal_mode=WAL;").execute(pool).await {
        tracing::warn!("Failed to set WAL journal mode: {}", e);
    }
    if let Err(e) = sqlx::query("PRAGMA synchronous=NORMAL;").execute(pool).await {
        tracing::warn!("Failed to set synchronous mode: {}", e);
    }

    sqlx::query(
        r#"CREATE TABLE IF NOT EXISTS todos (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT NOT NULL,
            completed INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NULL,
            updated_at TEXT NULL
        )"#,
    )
    .execute(pool)
    .await?;

    if let Err(e) = sqlx::query("CREATE INDEX IF NOT EXISTS idx_todos_completed ON todos(completed)")
        .execute(pool)
        .await
    {
        tracing::warn!("Failed to create index idx_todos_completed: {}", e);
    }

    Ok(())
}

/// The stores serving each resource, as selected by `[storage]`.
pub struct Stores {
    pub todos: Arc<dyn Storer<Todo>>,
    pub products: Arc<dyn Storer<Product>>,
}

pub async fn open_stores(cfg: &AppConfig) -> anyhow::Result<Stores> {
    let todos: Arc<dyn Storer<Todo>> = match cfg.storage.todos {
        TodoBackend::Sqlite => {
            let pool = connect_sqlite(&cfg.database).await?;
            init_db(&pool).await?;
            info!(url = %cfg.database.url, "todos stored in SQLite");
            Arc::new(SqlStore::new(pool))
        }
        TodoBackend::Memory => {
            info!("todos stored in memory");
            Arc::new(MemoryStore::<Todo>::new())
        }
    };

    let products: Arc<dyn Storer<Product>> = match cfg.storage.products {
        ProductBackend::Surreal => {
            let docs = &cfg.documents;
            Arc::new(DocumentStore::connect(&docs.url, &docs.namespace, &docs.database).await?)
        }
        ProductBackend::Memory => {
            info!("products stored in memory");
            Arc::new(MemoryStore::<Product>::new())
        }
    };

    Ok(Stores { todos, products })
}
