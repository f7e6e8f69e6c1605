//! Abstract syntax tree for the SQL front end
//!
//! The grammar is deliberately small: table DDL, point inserts, and
//! range-filtered selects. Everything below the executor speaks
//! `(Point, value)` and `Mbr`; nothing about SQL leaks into the engine.

use crate::catalog::ColumnType;

/// Top-level SQL statement
#[derive(Debug, Clone)]
pub enum Statement {
    CreateTable(CreateTableStmt),
    Insert(InsertStmt),
    Select(SelectStmt),
}

/// CREATE TABLE name (col TYPE, ...)
#[derive(Debug, Clone)]
pub struct CreateTableStmt {
    pub table: String,
    pub columns: Vec<(String, ColumnType)>,
}

/// INSERT INTO name VALUES (x, y [, payload])
#[derive(Debug, Clone)]
pub struct InsertStmt {
    pub table: String,
    pub values: Vec<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Projection {
    Star,
    Count,
}

/// WHERE spatial_intersect(col, x1, y1, x2, y2)
#[derive(Debug, Clone)]
pub struct SpatialFilter {
    pub column: String,
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

/// SELECT COUNT(*)|* FROM name [WHERE spatial_intersect(...)]
#[derive(Debug, Clone)]
pub struct SelectStmt {
    pub projection: Projection,
    pub table: String,
    pub filter: Option<SpatialFilter>,
}
