pub mod memory;
pub mod models;
pub mod postgres;
pub mod record;
pub mod schema;

use std::sync::Arc;
use std::time::{Duration, Instant};

use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::error::AppError;
use memory::MemoryStore;
use models::{Service, ServiceDraft, Session};
use record::{Draft, ListFilter, Lookup, Record};

#[derive(Debug, Clone)]
pub struct DbConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connect_timeout_secs: u64,
    pub idle_timeout_secs: u64,
}

fn parse_or<T: std::str::FromStr>(value: Option<String>, default: T) -> T {
    value.and_then(|s| s.trim().parse().ok()).unwrap_or(default)
}

impl DbConfig {
    /// `None` when `DATABASE_URL` is unset or blank.
    pub fn from_vars(get: impl Fn(&str) -> Option<String>) -> Option<Self> {
        let url = get("DATABASE_URL").filter(|u| !u.trim().is_empty())?;
        Some(Self {
            url,
            max_connections: parse_or(get("DB_POOL_MAX"), 10),
            min_connections: parse_or(get("DB_POOL_MIN"), 2),
            connect_timeout_secs: parse_or(get("DB_CONNECT_TIMEOUT"), 10),
            idle_timeout_secs: parse_or(get("DB_IDLE_TIMEOUT"), 300),
        })
    }

    pub fn redacted_url(&self) -> String {
        match (self.url.find("://"), self.url.rfind('@')) {
            (Some(scheme), Some(at)) if at > scheme => {
                format!("{}://***{}", &self.url[..scheme], &self.url[at..])
            }
            _ => self.url.clone(),
        }
    }
}

pub async fn init_pool(config: &DbConfig) -> Result<PgPool, sqlx::Error> {
    tracing::info!("Initializing database connection pool...");
    tracing::debug!("Database URL: {}", config.redacted_url());

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.connect_timeout_secs))
        .idle_timeout(Duration::from_secs(config.idle_timeout_secs))
        .max_lifetime(Duration::from_secs(1800))
        .test_before_acquire(true)
        .connect(&config.url)
        .await?;

    sqlx::query("SELECT 1").fetch_one(&pool).await?;

    tracing::info!("Database connection pool initialized successfully");

    Ok(pool)
}

/// Persistence handle shared by every handler.
#[derive(Debug, Clone)]
pub enum Store {
    Postgres(PgPool),
    Memory(Arc<MemoryStore>),
}

impl Store {
    pub fn memory() -> Self {
        Store::Memory(Arc::new(MemoryStore::new()))
    }

    pub fn backend(&self) -> &'static str {
        match self {
            Store::Postgres(_) => "postgres",
            Store::Memory(_) => "memory",
        }
    }

    pub async fn ping(&self) -> Result<Duration, AppError> {
        let start = Instant::now();
        match self {
            Store::Postgres(pool) => {
                sqlx::query("SELECT 1").fetch_one(pool).await?;
            }
            Store::Memory(mem) => mem.ping()?,
        }
        Ok(start.elapsed())
    }

    /// Services must go through `list_services`, which attaches child rows.
    pub async fn list<R: Record>(&self, filter: &ListFilter) -> Result<Vec<R>, AppError> {
        match self {
            Store::Postgres(pool) => Ok(postgres::list(pool, filter).await?),
            Store::Memory(mem) => mem.list(filter).await,
        }
    }

    pub async fn find<R: Record>(&self, lookup: &Lookup) -> Result<Option<R>, AppError> {
        match self {
            Store::Postgres(pool) => Ok(postgres::find(pool, lookup).await?),
            Store::Memory(mem) => mem.find(lookup).await,
        }
    }

    pub async fn count<R: Record>(&self) -> Result<i64, AppError> {
        match self {
            Store::Postgres(pool) => Ok(postgres::count::<R>(pool).await?),
            Store::Memory(mem) => mem.count::<R>().await,
        }
    }

    pub async fn insert<D: Draft>(&self, draft: &D) -> Result<D::Record, AppError> {
        match self {
            Store::Postgres(pool) => Ok(postgres::insert(pool, draft).await?),
            Store::Memory(mem) => mem.insert(draft).await,
        }
    }

    pub async fn update<D: Draft>(&self, id: i64, draft: &D) -> Result<Option<D::Record>, AppError> {
        match self {
            Store::Postgres(pool) => Ok(postgres::update(pool, id, draft).await?),
            Store::Memory(mem) => mem.update(id, draft).await,
        }
    }

    pub async fn delete<R: Record>(&self, id: i64) -> Result<bool, AppError> {
        match self {
            Store::Postgres(pool) => Ok(postgres::delete::<R>(pool, id).await?),
            Store::Memory(mem) => mem.delete::<R>(id).await,
        }
    }

    pub async fn list_services(&self, filter: &ListFilter) -> Result<Vec<Service>, AppError> {
        match self {
            Store::Postgres(pool) => Ok(postgres::list_services(pool, filter).await?),
            Store::Memory(mem) => mem.list(filter).await,
        }
    }

    pub async fn find_service(&self, lookup: &Lookup) -> Result<Option<Service>, AppError> {
        match self {
            Store::Postgres(pool) => Ok(postgres::find_service(pool, lookup).await?),
            Store::Memory(mem) => mem.find(lookup).await,
        }
    }

    pub async fn insert_service(&self, draft: &ServiceDraft) -> Result<Service, AppError> {
        match self {
            Store::Postgres(pool) => Ok(postgres::insert_service(pool, draft).await?),
            Store::Memory(mem) => mem.insert(draft).await,
        }
    }

    pub async fn update_service(
        &self,
        id: i64,
        draft: &ServiceDraft,
    ) -> Result<Option<Service>, AppError> {
        match self {
            Store::Postgres(pool) => Ok(postgres::update_service(pool, id, draft).await?),
            Store::Memory(mem) => mem.update(id, draft).await,
        }
    }

    pub async fn delete_service(&self, id: i64) -> Result<bool, AppError> {
        match self {
            Store::Postgres(pool) => Ok(postgres::delete_service(pool, id).await?),
            Store::Memory(mem) => mem.delete::<Service>(id).await,
        }
    }

    pub async fn create_session(&self, session: &Session) -> Result<(), AppError> {
        match self {
            Store::Postgres(pool) => Ok(postgres::create_session(pool, session).await?),
            Store::Memory(mem) => mem.create_session(session).await,
        }
    }

    /// Only unexpired sessions are returned.
    pub async fn find_session(&self, sid: &str) -> Result<Option<Session>, AppError> {
        match self {
            Store::Postgres(pool) => Ok(postgres::find_session(pool, sid).await?),
            Store::Memory(mem) => mem.find_session(sid).await,
        }
    }

    pub async fn delete_session(&self, sid: &str) -> Result<bool, AppError> {
        match self {
            Store::Postgres(pool) => Ok(postgres::delete_session(pool, sid).await?),
            Store::Memory(mem) => mem.delete_session(sid).await,
        }
    }

    pub async fn purge_expired_sessions(&self) -> Result<u64, AppError> {
        match self {
            Store::Postgres(pool) => Ok(postgres::purge_expired_sessions(pool).await?),
            Store::Memory(mem) => mem.purge_expired_sessions().await,
        }
    }

    /// Test hook: make a table (or `"*"` for all) fail like an unreachable database.
    #[cfg(test)]
    pub fn set_offline(&self, table: &'static str, offline: bool) {
        if let Store::Memory(mem) = self {
            mem.set_offline(table, offline);
        }
    }
}
