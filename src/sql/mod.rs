//! Lightweight SQL front end over the spatial engine
//!
//! Architecture:
//! - Lexer: tokenizes SQL strings
//! - Parser: builds the AST from tokens
//! - Executor: runs statements against the table registry
//!
//! Grammar: `CREATE TABLE name (col TYPE, ...)` with one POINT/GEOMETRY
//! column, `INSERT INTO name VALUES (x, y [, payload])`, and
//! `SELECT COUNT(*)|* FROM name [WHERE spatial_intersect(col, x1, y1,
//! x2, y2)]`.

pub mod ast;
pub mod executor;
pub mod lexer;
pub mod parser;
pub mod token;

pub use ast::{Projection, SelectStmt, SpatialFilter, Statement};
pub use executor::{QueryExecutor, QueryResult};
pub use lexer::Lexer;
pub use parser::Parser;
pub use token::{Token, TokenType};

use crate::catalog::TableRegistry;
use crate::error::Result;
use std::sync::Arc;

/// Parse and execute a single SQL statement
pub fn execute_sql(registry: &Arc<TableRegistry>, sql: &str) -> Result<QueryResult> {
    let tokens = Lexer::new(sql).tokenize()?;
    let statement = Parser::new(tokens).parse()?;
    QueryExecutor::new(registry.clone()).execute(statement)
}
