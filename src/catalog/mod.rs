//! Table registry for the SQL front end
//!
//! Maps table names to their schema and backing LSM engine. SQL tables
//! are two-dimensional: one POINT/GEOMETRY column carries the location,
//! an optional numeric column the payload.

use crate::config::EngineConfig;
use crate::error::{Result, StorageError};
use crate::storage::lsm::LsmEngine;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Column types recognized by the front end
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnType {
    Int,
    Double,
    Text,
    Point,
    Geometry,
}

impl ColumnType {
    pub fn is_spatial(&self) -> bool {
        matches!(self, ColumnType::Point | ColumnType::Geometry)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnDef {
    pub name: String,
    pub column_type: ColumnType,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableSchema {
    pub name: String,
    pub columns: Vec<ColumnDef>,
}

impl TableSchema {
    /// The table's spatial column, if any
    pub fn spatial_column(&self) -> Option<&ColumnDef> {
        self.columns.iter().find(|c| c.column_type.is_spatial())
    }
}

/// A registered table: schema plus its backing engine
pub struct Table {
    pub schema: TableSchema,
    pub engine: LsmEngine<f64>,
}

/// Name -> table map shared across the executor and the REPL
pub struct TableRegistry {
    tables: DashMap<String, Arc<Table>>,
    engine_config: EngineConfig,
}

impl TableRegistry {
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    /// All engines created by this registry share one configuration
    pub fn with_config(engine_config: EngineConfig) -> Self {
        Self {
            tables: DashMap::new(),
            engine_config,
        }
    }

    pub fn create_table(&self, schema: TableSchema) -> Result<()> {
        if schema.spatial_column().is_none() {
            return Err(StorageError::InvalidArgument(format!(
                "table '{}' needs a POINT or GEOMETRY column",
                schema.name
            )));
        }
        if self.tables.contains_key(&schema.name) {
            return Err(StorageError::TableAlreadyExists(schema.name));
        }
        let engine = LsmEngine::with_config(2, self.engine_config)?;
        let name = schema.name.clone();
        self.tables.insert(name, Arc::new(Table { schema, engine }));
        Ok(())
    }

    pub fn get(&self, name: &str) -> Result<Arc<Table>> {
        self.tables
            .get(name)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| StorageError::TableNotFound(name.to_string()))
    }

    pub fn table_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tables.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }
}

impl Default for TableRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cities_schema() -> TableSchema {
        TableSchema {
            name: "cities".into(),
            columns: vec![
                ColumnDef {
                    name: "location".into(),
                    column_type: ColumnType::Point,
                },
                ColumnDef {
                    name: "population".into(),
                    column_type: ColumnType::Double,
                },
            ],
        }
    }

    #[test]
    fn test_create_and_lookup() {
        let registry = TableRegistry::new();
        registry.create_table(cities_schema()).unwrap();

        let table = registry.get("cities").unwrap();
        assert_eq!(table.schema.spatial_column().unwrap().name, "location");
        assert!(registry.get("missing").is_err());
        assert_eq!(registry.table_names(), vec!["cities".to_string()]);
    }

    #[test]
    fn test_duplicate_table_rejected() {
        let registry = TableRegistry::new();
        registry.create_table(cities_schema()).unwrap();
        assert!(matches!(
            registry.create_table(cities_schema()),
            Err(StorageError::TableAlreadyExists(_))
        ));
    }

    #[test]
    fn test_spatial_column_required() {
        let registry = TableRegistry::new();
        let schema = TableSchema {
            name: "plain".into(),
            columns: vec![ColumnDef {
                name: "id".into(),
                column_type: ColumnType::Int,
            }],
        };
        assert!(registry.create_table(schema).is_err());
    }
}
