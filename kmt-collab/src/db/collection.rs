use std::sync::Arc;

use async_trait::async_trait;
use log::warn;
use parking_lot::RwLock;
use serde_json::Value;

use super::{DatabaseError, IntoDatabaseError, Predicate, Record, Repository, Result, Storage};

/// A list of records stored as one JSON array under a storage key.
///
/// The array is read once on load, after which the in-memory copy is the source of truth.
/// Every change writes the whole array back.
pub struct Collection<T, S> {
    key: &'static str,
    storage: Arc<S>,
    records: RwLock<Vec<T>>,
}

impl<T, S> Collection<T, S>
where
    T: Record,
    S: Storage,
{
    /// Loads the collection, using `seed` if nothing is stored.
    ///
    /// Records that don't deserialize are skipped. If the stored value isn't a JSON array
    /// the seed is used in memory, but the stored value is left alone until the next change.
    pub fn load<F>(key: &'static str, storage: Arc<S>, seed: F) -> Result<Self>
    where
        F: FnOnce() -> Vec<T>,
    {
        let collection = Self {
            key,
            storage,
            records: Default::default(),
        };

        let Some(raw) = collection.storage.get(key)? else {
            let records = seed();
            collection.persist(&records)?;
            *collection.records.write() = records;

            return Ok(collection);
        };

        let records = match serde_json::from_str::<Vec<Value>>(&raw) {
            Ok(values) => values
                .into_iter()
                .enumerate()
                .filter_map(|(index, value)| match serde_json::from_value(value) {
                    Ok(record) => Some(record),
                    Err(e) => {
                        warn!("Skipping malformed entry {} of {}: {}", index, key, e);
                        None
                    }
                })
                .collect(),
            Err(e) => {
                warn!("Stored {} are malformed, using defaults: {}", key, e);
                seed()
            }
        };

        *collection.records.write() = records;
        Ok(collection)
    }

    /// Returns a copy of every record, in stored order.
    pub fn snapshot(&self) -> Vec<T> {
        self.records.read().clone()
    }

    fn persist(&self, records: &[T]) -> Result<()> {
        let raw = serde_json::to_string(records).map_err(|e| e.any())?;
        self.storage.set(self.key, raw)
    }

    /// Applies `change` to a copy of the records and stores it.
    /// Memory is only updated once the write succeeded.
    fn commit<F>(&self, change: F) -> Result<()>
    where
        F: FnOnce(&mut Vec<T>) -> Result<()>,
    {
        let mut records = self.records.write();
        let mut next = records.clone();

        change(&mut next)?;
        self.persist(&next)?;

        *records = next;
        Ok(())
    }
}

#[async_trait]
impl<T, S> Repository<T> for Collection<T, S>
where
    T: Record,
    S: Storage,
{
    async fn get(&self, id: &T::Id) -> Result<T> {
        self.records
            .read()
            .iter()
            .find(|r| r.id() == id)
            .cloned()
            .ok_or_else(|| DatabaseError::not_found(T::RESOURCE, id))
    }

    async fn list(&self, predicate: Predicate<'_, T>) -> Result<Vec<T>> {
        Ok(self
            .records
            .read()
            .iter()
            .filter(|r| predicate(*r))
            .cloned()
            .collect())
    }

    async fn save(&self, record: T) -> Result<T> {
        self.commit(|records| {
            match records.iter_mut().find(|r| r.id() == record.id()) {
                Some(existing) => *existing = record.clone(),
                None => records.push(record.clone()),
            }

            Ok(())
        })?;

        Ok(record)
    }

    async fn delete(&self, id: &T::Id) -> Result<()> {
        self.commit(|records| {
            let index = records
                .iter()
                .position(|r| r.id() == id)
                .ok_or_else(|| DatabaseError::not_found(T::RESOURCE, id))?;

            records.remove(index);
            Ok(())
        })
    }
}
