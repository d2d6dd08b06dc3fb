//! PostgreSQL implementation of the store, written once against `Record`/`Draft`.

use std::collections::HashMap;

use sqlx::{PgConnection, PgExecutor, PgPool, Postgres, QueryBuilder};

use super::models::{ProcessStep, Service, ServiceDraft, ServiceFeature, Session};
use super::record::{Draft, ListFilter, Lookup, Record};

pub async fn list<'e, R: Record>(
    exec: impl PgExecutor<'e>,
    filter: &ListFilter,
) -> Result<Vec<R>, sqlx::Error> {
    let mut qb = QueryBuilder::<Postgres>::new(format!("SELECT * FROM {}", R::TABLE));
    let mut has_where = false;

    if filter.active_only && R::HAS_ACTIVE {
        qb.push(" WHERE active = TRUE");
        has_where = true;
    }
    if R::HAS_CATEGORY {
        if let Some(category) = &filter.category {
            qb.push(if has_where { " AND " } else { " WHERE " });
            qb.push("category = ").push_bind(category.clone());
        }
    }

    qb.push(" ORDER BY ").push(R::ORDER_BY);
    if let Some(limit) = filter.limit {
        qb.push(" LIMIT ").push_bind(i64::from(limit));
    }
    if filter.offset > 0 {
        qb.push(" OFFSET ").push_bind(i64::from(filter.offset));
    }

    qb.build_query_as::<R>().fetch_all(exec).await
}

pub async fn find<'e, R: Record>(
    exec: impl PgExecutor<'e>,
    lookup: &Lookup,
) -> Result<Option<R>, sqlx::Error> {
    let mut qb = QueryBuilder::<Postgres>::new(format!("SELECT * FROM {} WHERE ", R::TABLE));
    match (lookup, R::UNIQUE) {
        (Lookup::Id(id), _) => {
            qb.push("id = ").push_bind(*id);
        }
        (Lookup::Unique(key), Some(column)) => {
            qb.push(column).push(" = ").push_bind(key.clone());
        }
        (Lookup::Unique(_), None) => return Ok(None),
    }
    qb.build_query_as::<R>().fetch_optional(exec).await
}

pub async fn count<'e, R: Record>(exec: impl PgExecutor<'e>) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", R::TABLE))
        .fetch_one(exec)
        .await
}

pub async fn insert<'e, D: Draft>(
    exec: impl PgExecutor<'e>,
    draft: &D,
) -> Result<D::Record, sqlx::Error> {
    let mut qb = QueryBuilder::<Postgres>::new(format!(
        "INSERT INTO {} ({}) VALUES (",
        D::Record::TABLE,
        D::COLUMNS.join(", ")
    ));
    {
        let mut values = qb.separated(", ");
        draft.push_values(&mut values);
    }
    qb.push(") RETURNING *");

    qb.build_query_as::<D::Record>().fetch_one(exec).await
}

/// Full replace of the draft's columns; `updated_at` is always refreshed.
pub async fn update<'e, D: Draft>(
    exec: impl PgExecutor<'e>,
    id: i64,
    draft: &D,
) -> Result<Option<D::Record>, sqlx::Error> {
    let mut qb = QueryBuilder::<Postgres>::new(format!(
        "UPDATE {} SET ({}, updated_at) = ROW(",
        D::Record::TABLE,
        D::COLUMNS.join(", ")
    ));
    {
        let mut values = qb.separated(", ");
        draft.push_values(&mut values);
        values.push("now()");
    }
    qb.push(") WHERE id = ").push_bind(id).push(" RETURNING *");

    qb.build_query_as::<D::Record>().fetch_optional(exec).await
}

pub async fn delete<'e, R: Record>(exec: impl PgExecutor<'e>, id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(&format!("DELETE FROM {} WHERE id = $1", R::TABLE))
        .bind(id)
        .execute(exec)
        .await?;
    Ok(result.rows_affected() > 0)
}

// ============================================================================
// Services and their child rows
// ============================================================================

/// Attach features and process steps to already-loaded services.
async fn load_children(conn: &mut PgConnection, services: &mut [Service]) -> Result<(), sqlx::Error> {
    if services.is_empty() {
        return Ok(());
    }
    let ids: Vec<i64> = services.iter().map(|s| s.id).collect();
    let index: HashMap<i64, usize> = ids.iter().enumerate().map(|(i, id)| (*id, i)).collect();

    let features: Vec<(i64, String, Option<String>)> = sqlx::query_as(
        "SELECT service_id, title, description FROM service_features
         WHERE service_id = ANY($1) ORDER BY id",
    )
    .bind(&ids[..])
    .fetch_all(&mut *conn)
    .await?;

    let steps: Vec<(i64, i32, String, Option<String>)> = sqlx::query_as(
        "SELECT service_id, step_order, title, description FROM process_steps
         WHERE service_id = ANY($1) ORDER BY step_order, id",
    )
    .bind(&ids[..])
    .fetch_all(&mut *conn)
    .await?;

    for (service_id, title, description) in features {
        if let Some(&i) = index.get(&service_id) {
            services[i].features.push(ServiceFeature { title, description });
        }
    }
    for (service_id, step_order, title, description) in steps {
        if let Some(&i) = index.get(&service_id) {
            services[i].process_steps.push(ProcessStep {
                step_order,
                title,
                description,
            });
        }
    }
    for service in services.iter_mut() {
        service.normalize();
    }
    Ok(())
}

async fn replace_children(
    conn: &mut PgConnection,
    service_id: i64,
    draft: &ServiceDraft,
) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM service_features WHERE service_id = $1")
        .bind(service_id)
        .execute(&mut *conn)
        .await?;
    sqlx::query("DELETE FROM process_steps WHERE service_id = $1")
        .bind(service_id)
        .execute(&mut *conn)
        .await?;

    if !draft.features.is_empty() {
        let mut qb = QueryBuilder::<Postgres>::new(
            "INSERT INTO service_features (service_id, title, description) ",
        );
        qb.push_values(&draft.features, |mut row, f| {
            row.push_bind(service_id)
                .push_bind(f.title.clone())
                .push_bind(f.description.clone());
        });
        qb.build().execute(&mut *conn).await?;
    }

    if !draft.process_steps.is_empty() {
        let mut qb = QueryBuilder::<Postgres>::new(
            "INSERT INTO process_steps (service_id, step_order, title, description) ",
        );
        qb.push_values(&draft.process_steps, |mut row, s| {
            row.push_bind(service_id)
                .push_bind(s.step_order)
                .push_bind(s.title.clone())
                .push_bind(s.description.clone());
        });
        qb.build().execute(&mut *conn).await?;
    }
    Ok(())
}

pub async fn list_services(pool: &PgPool, filter: &ListFilter) -> Result<Vec<Service>, sqlx::Error> {
    let mut conn = pool.acquire().await?;
    let mut services = list::<Service>(&mut *conn, filter).await?;
    load_children(&mut conn, &mut services).await?;
    Ok(services)
}

pub async fn find_service(pool: &PgPool, lookup: &Lookup) -> Result<Option<Service>, sqlx::Error> {
    let mut conn = pool.acquire().await?;
    let Some(service) = find::<Service>(&mut *conn, lookup).await? else {
        return Ok(None);
    };
    let mut found = [service];
    load_children(&mut conn, &mut found).await?;
    let [service] = found;
    Ok(Some(service))
}

pub async fn insert_service(pool: &PgPool, draft: &ServiceDraft) -> Result<Service, sqlx::Error> {
    let mut tx = pool.begin().await?;
    let mut service = insert(&mut *tx, draft).await?;
    replace_children(&mut tx, service.id, draft).await?;
    tx.commit().await?;

    service.features = draft.features.clone();
    service.process_steps = draft.process_steps.clone();
    service.normalize();
    Ok(service)
}

pub async fn update_service(
    pool: &PgPool,
    id: i64,
    draft: &ServiceDraft,
) -> Result<Option<Service>, sqlx::Error> {
    let mut tx = pool.begin().await?;
    let Some(mut service) = update(&mut *tx, id, draft).await? else {
        return Ok(None);
    };
    replace_children(&mut tx, id, draft).await?;
    tx.commit().await?;

    service.features = draft.features.clone();
    service.process_steps = draft.process_steps.clone();
    service.normalize();
    Ok(Some(service))
}

/// Removes the service with its features and steps; gallery items that
/// pointed at it are kept and detached.
pub async fn delete_service(pool: &PgPool, id: i64) -> Result<bool, sqlx::Error> {
    let mut tx = pool.begin().await?;
    sqlx::query("DELETE FROM service_features WHERE service_id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM process_steps WHERE service_id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("UPDATE gallery_items SET service_id = NULL, updated_at = now() WHERE service_id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    let deleted = delete::<Service>(&mut *tx, id).await?;
    tx.commit().await?;
    Ok(deleted)
}

// ============================================================================
// Sessions
// ============================================================================

pub async fn create_session(pool: &PgPool, session: &Session) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO sessions (sid, sess, expire) VALUES ($1, $2, $3)
         ON CONFLICT (sid) DO UPDATE SET sess = EXCLUDED.sess, expire = EXCLUDED.expire",
    )
    .bind(&session.sid)
    .bind(&session.sess)
    .bind(session.expire)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn find_session(pool: &PgPool, sid: &str) -> Result<Option<Session>, sqlx::Error> {
    sqlx::query_as::<_, Session>(
        "SELECT sid, sess, expire FROM sessions WHERE sid = $1 AND expire > now()",
    )
    .bind(sid)
    .fetch_optional(pool)
    .await
}

pub async fn delete_session(pool: &PgPool, sid: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM sessions WHERE sid = $1")
        .bind(sid)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn purge_expired_sessions(pool: &PgPool) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM sessions WHERE expire <= now()")
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}
