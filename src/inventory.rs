// Parts inventory kept in the local database

use anyhow::Context;
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::error::{ClientError, Result};
use crate::storage::open_database;
use crate::validation;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryItem {
    pub id: i64,
    pub name: String,
    pub quantity: u32,
    /// Cost per unit in dollars
    pub cost: f64,
}

impl InventoryItem {
    /// Stock value of this line (quantity × unit cost)
    pub fn value(&self) -> f64 {
        f64::from(self.quantity) * self.cost
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            name: row.get(1)?,
            quantity: row.get(2)?,
            cost: row.get(3)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewInventoryItem {
    pub name: String,
    pub quantity: u32,
    pub cost: f64,
}

/// Fields to change on an existing item; `None` keeps the current value
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InventoryUpdate {
    pub name: Option<String>,
    pub quantity: Option<u32>,
    pub cost: Option<f64>,
}

/// Totals shown above the inventory table
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct InventorySummary {
    /// Sum of quantities
    pub total_items: u64,
    /// Sum of quantity × unit cost
    pub total_value: f64,
}

impl InventorySummary {
    pub fn from_items(items: &[InventoryItem]) -> Self {
        Self {
            total_items: items.iter().map(|i| u64::from(i.quantity)).sum(),
            total_value: items.iter().map(InventoryItem::value).sum(),
        }
    }
}

fn validate_item(name: &str, cost: f64) -> Result<()> {
    validation::require_field("name", name)?;
    if !cost.is_finite() || cost < 0.0 {
        return Err(ClientError::validation(
            "cost",
            "must be a non-negative amount",
        ));
    }
    Ok(())
}

/// Handle to the `inventory` table
#[derive(Clone)]
pub struct InventoryStore {
    conn: Arc<Mutex<Connection>>,
}

impl InventoryStore {
    pub fn open(path: &Path) -> Result<Self> {
        Self::from_connection(open_database(path)?)
    }

    pub fn in_memory() -> Result<Self> {
        let conn =
            Connection::open_in_memory().context("Failed to open in-memory inventory store")?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS inventory (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                quantity INTEGER NOT NULL,
                cost REAL NOT NULL
            )",
            [],
        )
        .context("Failed to initialize inventory table")?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| anyhow::anyhow!("Inventory store lock poisoned").into())
    }

    pub fn list(&self) -> Result<Vec<InventoryItem>> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare("SELECT id, name, quantity, cost FROM inventory ORDER BY id")
            .context("Failed to query inventory")?;
        let items = stmt
            .query_map([], InventoryItem::from_row)
            .context("Failed to query inventory")?
            .collect::<rusqlite::Result<Vec<_>>>()
            .context("Failed to read inventory row")?;
        Ok(items)
    }

    pub fn get(&self, id: i64) -> Result<Option<InventoryItem>> {
        let conn = self.lock()?;
        let item = conn
            .query_row(
                "SELECT id, name, quantity, cost FROM inventory WHERE id = ?1",
                [id],
                InventoryItem::from_row,
            )
            .optional()
            .context("Failed to read inventory item")?;
        Ok(item)
    }

    pub fn add(&self, item: &NewInventoryItem) -> Result<InventoryItem> {
        let name = item.name.trim();
        validate_item(name, item.cost)?;

        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO inventory (name, quantity, cost) VALUES (?1, ?2, ?3)",
            params![name, item.quantity, item.cost],
        )
        .context("Failed to add inventory item")?;
        let id = conn.last_insert_rowid();
        tracing::info!("Added inventory item {} ({})", id, name);

        Ok(InventoryItem {
            id,
            name: name.to_string(),
            quantity: item.quantity,
            cost: item.cost,
        })
    }

    /// Apply `update` to item `id` and return the stored result
    pub fn update(&self, id: i64, update: &InventoryUpdate) -> Result<InventoryItem> {
        let mut item = self.get(id)?.ok_or_else(|| not_found(id))?;
        if let Some(name) = &update.name {
            item.name = name.trim().to_string();
        }
        if let Some(quantity) = update.quantity {
            item.quantity = quantity;
        }
        if let Some(cost) = update.cost {
            item.cost = cost;
        }
        validate_item(&item.name, item.cost)?;

        let conn = self.lock()?;
        conn.execute(
            "UPDATE inventory SET name = ?1, quantity = ?2, cost = ?3 WHERE id = ?4",
            params![item.name, item.quantity, item.cost, id],
        )
        .context("Failed to update inventory item")?;
        tracing::info!("Updated inventory item {}", id);

        Ok(item)
    }

    pub fn delete(&self, id: i64) -> Result<()> {
        let conn = self.lock()?;
        let removed = conn
            .execute("DELETE FROM inventory WHERE id = ?1", [id])
            .context("Failed to delete inventory item")?;
        if removed == 0 {
            return Err(not_found(id));
        }
        tracing::info!("Deleted inventory item {}", id);
        Ok(())
    }

    pub fn summary(&self) -> Result<InventorySummary> {
        Ok(InventorySummary::from_items(&self.list()?))
    }
}

fn not_found(id: i64) -> ClientError {
    ClientError::validation("item", format!("no inventory item with id {}", id))
}

impl std::fmt::Debug for InventoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InventoryStore").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_item(name: &str, quantity: u32, cost: f64) -> NewInventoryItem {
        NewInventoryItem {
            name: name.to_string(),
            quantity,
            cost,
        }
    }

    #[test]
    fn test_add_and_list() {
        let store = InventoryStore::in_memory().unwrap();
        let oil = store.add(&new_item(" Oil Filter ", 50, 15.0)).unwrap();
        let pads = store.add(&new_item("Brake Pads", 30, 40.0)).unwrap();

        assert_eq!(oil.name, "Oil Filter");
        assert_ne!(oil.id, pads.id);
        assert_eq!(store.list().unwrap(), vec![oil, pads]);
    }

    #[test]
    fn test_summary_totals() {
        let store = InventoryStore::in_memory().unwrap();
        store.add(&new_item("Oil Filter", 50, 15.0)).unwrap();
        store.add(&new_item("Brake Pads", 30, 40.0)).unwrap();
        store.add(&new_item("Air Filter", 40, 20.0)).unwrap();
        store.add(&new_item("Spark Plugs", 100, 5.0)).unwrap();

        let summary = store.summary().unwrap();
        assert_eq!(summary.total_items, 220);
        assert!((summary.total_value - 3250.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_summary() {
        let store = InventoryStore::in_memory().unwrap();
        assert_eq!(store.summary().unwrap(), InventorySummary::default());
    }

    #[test]
    fn test_update_changes_only_given_fields() {
        let store = InventoryStore::in_memory().unwrap();
        let item = store.add(&new_item("Spark Plugs", 100, 5.0)).unwrap();

        let updated = store
            .update(
                item.id,
                &InventoryUpdate {
                    quantity: Some(80),
                    ..Default::default()
                },
            )
            .unwrap();

        assert_eq!(updated.name, "Spark Plugs");
        assert_eq!(updated.quantity, 80);
        assert_eq!(updated.cost, 5.0);
        assert_eq!(store.get(item.id).unwrap(), Some(updated));
    }

    #[test]
    fn test_delete() {
        let store = InventoryStore::in_memory().unwrap();
        let item = store.add(&new_item("Air Filter", 40, 20.0)).unwrap();

        store.delete(item.id).unwrap();
        assert!(store.list().unwrap().is_empty());

        let err = store.delete(item.id).unwrap_err();
        assert!(matches!(err, ClientError::Validation { field: "item", .. }));
    }

    #[test]
    fn test_missing_item_cannot_be_updated() {
        let store = InventoryStore::in_memory().unwrap();
        let err = store.update(42, &InventoryUpdate::default()).unwrap_err();
        assert_eq!(err.to_string(), "Invalid item: no inventory item with id 42");
    }

    #[test]
    fn test_rejects_blank_name_and_negative_cost() {
        let store = InventoryStore::in_memory().unwrap();

        let err = store.add(&new_item("  ", 1, 1.0)).unwrap_err();
        assert!(matches!(err, ClientError::Validation { field: "name", .. }));

        let err = store.add(&new_item("Wipers", 1, -2.5)).unwrap_err();
        assert!(matches!(err, ClientError::Validation { field: "cost", .. }));

        let err = store.add(&new_item("Wipers", 1, f64::NAN)).unwrap_err();
        assert!(matches!(err, ClientError::Validation { field: "cost", .. }));

        assert!(store.list().unwrap().is_empty());
    }

    #[test]
    fn test_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("parkease.sqlite3");

        {
            let store = InventoryStore::open(&path).unwrap();
            store.add(&new_item("Brake Pads", 30, 40.0)).unwrap();
        }

        let reopened = InventoryStore::open(&path).unwrap();
        assert_eq!(reopened.list().unwrap().len(), 1);
    }
}
