//! Query executor - runs parsed statements against the table registry
//!
//! The executor is the boundary between SQL and the engine: inserts
//! become `(Point, value)`, spatial predicates become an `Mbr`, and the
//! engine's typed errors bubble back up to the REPL.

use super::ast::*;
use crate::catalog::{ColumnDef, TableRegistry, TableSchema};
use crate::error::{Result, StorageError};
use crate::types::{Mbr, Point};
use std::sync::Arc;

/// Result of one executed statement
#[derive(Debug)]
pub enum QueryResult {
    Created { table: String },
    Inserted { count: usize },
    Count(usize),
    Rows {
        columns: Vec<String>,
        rows: Vec<Vec<f64>>,
    },
}

pub struct QueryExecutor {
    registry: Arc<TableRegistry>,
}

impl QueryExecutor {
    pub fn new(registry: Arc<TableRegistry>) -> Self {
        Self { registry }
    }

    pub fn execute(&self, statement: Statement) -> Result<QueryResult> {
        match statement {
            Statement::CreateTable(create) => self.execute_create_table(create),
            Statement::Insert(insert) => self.execute_insert(insert),
            Statement::Select(select) => self.execute_select(select),
        }
    }

    fn execute_create_table(&self, create: CreateTableStmt) -> Result<QueryResult> {
        let schema = TableSchema {
            name: create.table.clone(),
            columns: create
                .columns
                .into_iter()
                .map(|(name, column_type)| ColumnDef { name, column_type })
                .collect(),
        };
        self.registry.create_table(schema)?;
        Ok(QueryResult::Created {
            table: create.table,
        })
    }

    fn execute_insert(&self, insert: InsertStmt) -> Result<QueryResult> {
        let table = self.registry.get(&insert.table)?;

        // First two values are the point, an optional third the payload
        let point = Point::new(vec![insert.values[0], insert.values[1]]);
        let payload = insert.values.get(2).copied().unwrap_or(0.0);

        let stored = table.engine.insert(point, payload)?;
        Ok(QueryResult::Inserted {
            count: usize::from(stored),
        })
    }

    fn execute_select(&self, select: SelectStmt) -> Result<QueryResult> {
        let table = self.registry.get(&select.table)?;

        let query = match &select.filter {
            Some(filter) => {
                let spatial = table.schema.spatial_column().ok_or_else(|| {
                    StorageError::ColumnNotFound(format!(
                        "table '{}' has no spatial column",
                        select.table
                    ))
                })?;
                if !filter.column.eq_ignore_ascii_case(&spatial.name) {
                    return Err(StorageError::ColumnNotFound(filter.column.clone()));
                }
                Mbr::new(
                    Point::new(vec![filter.x1, filter.y1]),
                    Point::new(vec![filter.x2, filter.y2]),
                )?
            }
            None => Mbr::universe(2),
        };

        let records = table.engine.range_query(&query)?;
        match select.projection {
            Projection::Count => Ok(QueryResult::Count(records.len())),
            Projection::Star => Ok(QueryResult::Rows {
                columns: vec!["x".into(), "y".into(), "payload".into()],
                rows: records
                    .iter()
                    .map(|r| vec![r.point.coord(0), r.point.coord(1), r.value])
                    .collect(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sql::execute_sql;

    fn setup() -> Arc<TableRegistry> {
        let registry = Arc::new(TableRegistry::new());
        execute_sql(
            &registry,
            "CREATE TABLE cities (id INT, location POINT, population DOUBLE)",
        )
        .unwrap();
        registry
    }

    #[test]
    fn test_create_insert_select_roundtrip() {
        let registry = setup();
        execute_sql(&registry, "INSERT INTO cities VALUES (0.1, 0.1, 100)").unwrap();
        execute_sql(&registry, "INSERT INTO cities VALUES (0.5, 0.5, 200)").unwrap();
        execute_sql(&registry, "INSERT INTO cities VALUES (0.9, 0.9, 300)").unwrap();

        let result = execute_sql(
            &registry,
            "SELECT COUNT(*) FROM cities WHERE spatial_intersect(location, 0, 0, 0.5, 0.5)",
        )
        .unwrap();
        assert!(matches!(result, QueryResult::Count(2)));

        let result = execute_sql(&registry, "SELECT * FROM cities").unwrap();
        match result {
            QueryResult::Rows { columns, rows } => {
                assert_eq!(columns, vec!["x", "y", "payload"]);
                assert_eq!(rows.len(), 3);
            }
            other => panic!("expected rows, got {:?}", other),
        }
    }

    #[test]
    fn test_select_missing_table() {
        let registry = Arc::new(TableRegistry::new());
        let err = execute_sql(&registry, "SELECT * FROM nowhere").unwrap_err();
        assert!(matches!(err, StorageError::TableNotFound(_)));
    }

    #[test]
    fn test_filter_on_wrong_column() {
        let registry = setup();
        let err = execute_sql(
            &registry,
            "SELECT * FROM cities WHERE spatial_intersect(population, 0, 0, 1, 1)",
        )
        .unwrap_err();
        assert!(matches!(err, StorageError::ColumnNotFound(_)));
    }

    #[test]
    fn test_invalid_filter_box() {
        let registry = setup();
        let err = execute_sql(
            &registry,
            "SELECT * FROM cities WHERE spatial_intersect(location, 1, 1, 0, 0)",
        )
        .unwrap_err();
        assert!(matches!(err, StorageError::InvalidMbr(_)));
    }

    #[test]
    fn test_insert_without_payload() {
        let registry = setup();
        execute_sql(&registry, "INSERT INTO cities VALUES (0.3, 0.4)").unwrap();
        let result = execute_sql(&registry, "SELECT * FROM cities").unwrap();
        match result {
            QueryResult::Rows { rows, .. } => {
                assert_eq!(rows, vec![vec![0.3, 0.4, 0.0]]);
            }
            other => panic!("expected rows, got {:?}", other),
        }
    }
}
