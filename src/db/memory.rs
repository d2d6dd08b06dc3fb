//! In-process store used for local development without PostgreSQL and for tests.
//!
//! Rows are kept as the record's JSON form, so one implementation serves every
//! table. Unique keys, references and delete detachment mirror the SQL schema.

use std::collections::HashMap;

use chrono::Utc;
use serde_json::{json, Value};
use tokio::sync::RwLock;

use super::models::Session;
use super::record::{Draft, ListFilter, Lookup, Record};
use crate::error::AppError;

#[derive(Debug, Default)]
struct MemTable {
    next_id: i64,
    rows: Vec<Value>,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<HashMap<&'static str, MemTable>>,
    sessions: RwLock<HashMap<String, Session>>,
    #[cfg(test)]
    offline: std::sync::Mutex<std::collections::HashSet<&'static str>>,
}

fn row_id(row: &Value) -> Option<i64> {
    row.get("id").and_then(Value::as_i64)
}

fn decode<R: Record>(row: &Value) -> Result<R, AppError> {
    let mut record: R = serde_json::from_value(row.clone())?;
    record.normalize();
    Ok(record)
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make a table (or every table, with `"*"`) fail as if the database were down.
    #[cfg(test)]
    pub fn set_offline(&self, table: &'static str, offline: bool) {
        let mut set = self.offline.lock().unwrap();
        if offline {
            set.insert(table);
        } else {
            set.remove(table);
        }
    }

    #[cfg_attr(not(test), allow(unused_variables))]
    fn check_online(&self, table: &str) -> Result<(), AppError> {
        #[cfg(test)]
        {
            let down = self
                .offline
                .lock()
                .map(|set| set.contains(table) || set.contains("*"))
                .unwrap_or(false);
            if down {
                return Err(AppError::Database(sqlx::Error::PoolTimedOut));
            }
        }
        Ok(())
    }

    pub fn ping(&self) -> Result<(), AppError> {
        self.check_online("*")
    }

    pub async fn list<R: Record>(&self, filter: &ListFilter) -> Result<Vec<R>, AppError> {
        self.check_online(R::TABLE)?;
        let tables = self.tables.read().await;
        let mut rows = match tables.get(R::TABLE) {
            Some(table) => table
                .rows
                .iter()
                .map(decode::<R>)
                .collect::<Result<Vec<_>, _>>()?,
            None => Vec::new(),
        };
        drop(tables);

        rows.retain(|r| {
            let active_ok = !(filter.active_only && R::HAS_ACTIVE) || r.active();
            let category_ok = match (&filter.category, R::HAS_CATEGORY) {
                (Some(want), true) => r.category() == Some(want.as_str()),
                _ => true,
            };
            active_ok && category_ok
        });
        rows.sort_by(|a, b| a.display_cmp(b));

        let limit = filter.limit.map(|l| l as usize).unwrap_or(usize::MAX);
        Ok(rows
            .into_iter()
            .skip(filter.offset as usize)
            .take(limit)
            .collect())
    }

    pub async fn find<R: Record>(&self, lookup: &Lookup) -> Result<Option<R>, AppError> {
        self.check_online(R::TABLE)?;
        let tables = self.tables.read().await;
        let Some(table) = tables.get(R::TABLE) else {
            return Ok(None);
        };
        let found = match (lookup, R::UNIQUE) {
            (Lookup::Id(id), _) => table.rows.iter().find(|row| row_id(row) == Some(*id)),
            (Lookup::Unique(key), Some(column)) => table
                .rows
                .iter()
                .find(|row| row.get(column).and_then(Value::as_str) == Some(key.as_str())),
            (Lookup::Unique(_), None) => None,
        };
        found.map(decode::<R>).transpose()
    }

    pub async fn count<R: Record>(&self) -> Result<i64, AppError> {
        self.check_online(R::TABLE)?;
        let tables = self.tables.read().await;
        Ok(tables.get(R::TABLE).map(|t| t.rows.len() as i64).unwrap_or(0))
    }

    pub async fn insert<D: Draft>(&self, draft: &D) -> Result<D::Record, AppError> {
        let table_name = D::Record::TABLE;
        self.check_online(table_name)?;
        let mut value = serde_json::to_value(draft)?;

        let mut tables = self.tables.write().await;
        if D::Record::SINGLETON && tables.get(table_name).is_some_and(|t| !t.rows.is_empty()) {
            return Err(AppError::Conflict(format!(
                "duplicate value violates {}_singleton_key",
                table_name
            )));
        }
        check_references::<D::Record>(&tables, &value)?;
        check_unique::<D::Record>(&tables, &value, None)?;

        let table = tables.entry(table_name).or_default();
        let id = table.next_id + 1;
        let now = json!(Utc::now());
        let fields = value
            .as_object_mut()
            .ok_or_else(|| AppError::Internal(format!("{} payload is not an object", table_name)))?;
        fields.insert("id".to_string(), json!(id));
        fields.insert("createdAt".to_string(), now.clone());
        fields.insert("updatedAt".to_string(), now);

        let record: D::Record = decode(&value)?;
        table.rows.push(serde_json::to_value(&record)?);
        table.next_id = id;
        Ok(record)
    }

    /// Overwrites every key the draft carries; keys it does not own are kept.
    pub async fn update<D: Draft>(&self, id: i64, draft: &D) -> Result<Option<D::Record>, AppError> {
        let table_name = D::Record::TABLE;
        self.check_online(table_name)?;
        let patch = serde_json::to_value(draft)?;

        let mut tables = self.tables.write().await;
        let exists = tables
            .get(table_name)
            .is_some_and(|table| table.rows.iter().any(|row| row_id(row) == Some(id)));
        if !exists {
            return Ok(None);
        }
        check_references::<D::Record>(&tables, &patch)?;
        check_unique::<D::Record>(&tables, &patch, Some(id))?;

        let Some(table) = tables.get_mut(table_name) else {
            return Ok(None);
        };
        let Some(row) = table.rows.iter_mut().find(|row| row_id(row) == Some(id)) else {
            return Ok(None);
        };

        let mut merged = row.clone();
        if let (Some(dst), Value::Object(src)) = (merged.as_object_mut(), patch) {
            dst.extend(src);
            dst.insert("updatedAt".to_string(), json!(Utc::now()));
        }
        let record: D::Record = decode(&merged)?;
        *row = serde_json::to_value(&record)?;
        Ok(Some(record))
    }

    pub async fn delete<R: Record>(&self, id: i64) -> Result<bool, AppError> {
        self.check_online(R::TABLE)?;
        let mut tables = self.tables.write().await;
        let Some(table) = tables.get_mut(R::TABLE) else {
            return Ok(false);
        };
        let before = table.rows.len();
        table.rows.retain(|row| row_id(row) != Some(id));
        if table.rows.len() == before {
            return Ok(false);
        }

        for (dependent, key) in R::DETACH_ON_DELETE {
            if let Some(dependent) = tables.get_mut(dependent) {
                for row in dependent.rows.iter_mut() {
                    if row.get(*key).and_then(Value::as_i64) == Some(id) {
                        row[*key] = Value::Null;
                    }
                }
            }
        }
        Ok(true)
    }

    pub async fn create_session(&self, session: &Session) -> Result<(), AppError> {
        self.check_online("sessions")?;
        self.sessions
            .write()
            .await
            .insert(session.sid.clone(), session.clone());
        Ok(())
    }

    pub async fn find_session(&self, sid: &str) -> Result<Option<Session>, AppError> {
        self.check_online("sessions")?;
        let sessions = self.sessions.read().await;
        Ok(sessions
            .get(sid)
            .filter(|s| s.expire > Utc::now())
            .cloned())
    }

    pub async fn delete_session(&self, sid: &str) -> Result<bool, AppError> {
        self.check_online("sessions")?;
        Ok(self.sessions.write().await.remove(sid).is_some())
    }

    pub async fn purge_expired_sessions(&self) -> Result<u64, AppError> {
        self.check_online("sessions")?;
        let mut sessions = self.sessions.write().await;
        let now = Utc::now();
        let before = sessions.len();
        sessions.retain(|_, s| s.expire > now);
        Ok((before - sessions.len()) as u64)
    }
}

fn check_references<R: Record>(
    tables: &HashMap<&'static str, MemTable>,
    value: &Value,
) -> Result<(), AppError> {
    for (key, target) in R::REFERENCES {
        let Some(id) = value.get(*key).and_then(Value::as_i64) else {
            continue;
        };
        let exists = tables
            .get(target)
            .map(|t| t.rows.iter().any(|row| row_id(row) == Some(id)))
            .unwrap_or(false);
        if !exists {
            return Err(AppError::field(*key, "references a row that does not exist"));
        }
    }
    Ok(())
}

fn check_unique<R: Record>(
    tables: &HashMap<&'static str, MemTable>,
    value: &Value,
    exclude: Option<i64>,
) -> Result<(), AppError> {
    let Some(column) = R::UNIQUE else {
        return Ok(());
    };
    let Some(wanted) = value.get(column).and_then(Value::as_str) else {
        return Ok(());
    };
    let taken = tables
        .get(R::TABLE)
        .map(|t| {
            t.rows.iter().any(|row| {
                row.get(column).and_then(Value::as_str) == Some(wanted) && row_id(row) != exclude
            })
        })
        .unwrap_or(false);
    if taken {
        return Err(AppError::Conflict(format!(
            "duplicate value violates {}_{}_key",
            R::TABLE,
            column
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::{
        AboutDraft, GalleryDraft, GalleryItem, Service, ServiceDraft, Slide, SlideDraft,
    };

    fn slide(title: &str, order: i32, active: bool) -> SlideDraft {
        serde_json::from_value(json!({
            "title": title,
            "imageUrl": "https://img.example/a.jpg",
            "order": order,
            "active": active
        }))
        .unwrap()
    }

    fn service(slug: &str) -> ServiceDraft {
        serde_json::from_value(json!({ "slug": slug, "title": slug })).unwrap()
    }

    #[tokio::test]
    async fn test_list_orders_by_order_then_id_and_filters_inactive() {
        let store = MemoryStore::new();
        store.insert(&slide("b", 2, true)).await.unwrap();
        store.insert(&slide("a", 1, true)).await.unwrap();
        store.insert(&slide("hidden", 0, false)).await.unwrap();
        store.insert(&slide("c", 2, true)).await.unwrap();

        let public: Vec<Slide> = store.list(&ListFilter::public()).await.unwrap();
        let titles: Vec<_> = public.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, vec!["a", "b", "c"]);

        let admin: Vec<Slide> = store.list(&ListFilter::admin()).await.unwrap();
        assert_eq!(admin.len(), 4);
        assert_eq!(admin[0].title, "hidden");
    }

    #[tokio::test]
    async fn test_unique_key_conflicts_but_allows_self_update() {
        let store = MemoryStore::new();
        let first = store.insert(&service("weddings")).await.unwrap();
        let err = store.insert(&service("weddings")).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        let same = store.update(first.id, &service("weddings")).await.unwrap();
        assert!(same.is_some());

        let second = store.insert(&service("corporate")).await.unwrap();
        let err = store.update(second.id, &service("weddings")).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_update_of_missing_row_is_none_even_when_slug_is_taken() {
        let store = MemoryStore::new();
        store.insert(&service("weddings")).await.unwrap();
        let missing = store.update(999, &service("weddings")).await.unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_ids_are_not_reused_after_delete() {
        let store = MemoryStore::new();
        let a = store.insert(&service("a")).await.unwrap();
        assert!(store.delete::<Service>(a.id).await.unwrap());
        let b = store.insert(&service("b")).await.unwrap();
        assert!(b.id > a.id);
        assert!(!store.delete::<Service>(a.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_singleton_table_refuses_a_second_row() {
        let store = MemoryStore::new();
        let about: AboutDraft =
            serde_json::from_value(json!({ "mission": "Plan well", "vision": "Everywhere" })).unwrap();
        let first = store.insert(&about).await.unwrap();
        let err = store.insert(&about).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
        assert!(store.update(first.id, &about).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_gallery_reference_and_detach() {
        let store = MemoryStore::new();
        let photo = |service_id: i64| -> GalleryDraft {
            serde_json::from_value(json!({
                "title": "Mandap",
                "category": "weddings",
                "imageUrl": "https://img.example/m.jpg",
                "serviceId": service_id
            }))
            .unwrap()
        };

        let err = store.insert(&photo(99)).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let svc = store.insert(&service("weddings")).await.unwrap();
        let item = store.insert(&photo(svc.id)).await.unwrap();
        assert_eq!(item.service_id, Some(svc.id));

        store.delete::<Service>(svc.id).await.unwrap();
        let kept: Option<GalleryItem> = store.find(&Lookup::Id(item.id)).await.unwrap();
        assert_eq!(kept.unwrap().service_id, None);
    }

    #[tokio::test]
    async fn test_offline_table_reports_database_error() {
        let store = MemoryStore::new();
        store.set_offline("slides", true);
        let err = store.list::<Slide>(&ListFilter::public()).await.unwrap_err();
        assert!(matches!(err, AppError::Database(_)));
        store.set_offline("slides", false);
        assert!(store.list::<Slide>(&ListFilter::public()).await.is_ok());
    }
}
