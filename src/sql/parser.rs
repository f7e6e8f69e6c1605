//! Recursive-descent parser building the AST from tokens

use super::ast::*;
use super::token::{Token, TokenType};
use crate::error::{Result, StorageError};

pub struct Parser {
    tokens: Vec<Token>,
    position: usize,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            position: 0,
        }
    }

    pub fn parse(&mut self) -> Result<Statement> {
        let statement = match self.current().token_type {
            TokenType::Create => self.parse_create_table(),
            TokenType::Insert => self.parse_insert(),
            TokenType::Select => self.parse_select(),
            ref other => Err(StorageError::ParseError(format!(
                "Expected statement, found {:?}",
                other
            ))),
        }?;

        // Optional trailing semicolon, then EOF
        if matches!(self.current().token_type, TokenType::Semicolon) {
            self.advance();
        }
        self.expect_eof()?;
        Ok(statement)
    }

    fn parse_create_table(&mut self) -> Result<Statement> {
        self.expect(TokenType::Create)?;
        self.expect(TokenType::Table)?;
        let table = self.expect_identifier()?;
        self.expect(TokenType::LParen)?;

        let mut columns = Vec::new();
        loop {
            let name = self.expect_identifier()?;
            let column_type = match self.current().token_type.clone() {
                TokenType::TypeName(t) => {
                    self.advance();
                    t
                }
                other => {
                    return Err(StorageError::ParseError(format!(
                        "Expected column type, found {:?}",
                        other
                    )))
                }
            };
            columns.push((name, column_type));

            if matches!(self.current().token_type, TokenType::Comma) {
                self.advance();
            } else {
                break;
            }
        }
        self.expect(TokenType::RParen)?;

        Ok(Statement::CreateTable(CreateTableStmt { table, columns }))
    }

    fn parse_insert(&mut self) -> Result<Statement> {
        self.expect(TokenType::Insert)?;
        self.expect(TokenType::Into)?;
        let table = self.expect_identifier()?;
        self.expect(TokenType::Values)?;
        self.expect(TokenType::LParen)?;

        let mut values = Vec::new();
        loop {
            values.push(self.expect_number()?);
            if matches!(self.current().token_type, TokenType::Comma) {
                self.advance();
            } else {
                break;
            }
        }
        self.expect(TokenType::RParen)?;

        if values.len() < 2 {
            return Err(StorageError::ParseError(
                "INSERT needs at least x and y values".into(),
            ));
        }

        Ok(Statement::Insert(InsertStmt { table, values }))
    }

    fn parse_select(&mut self) -> Result<Statement> {
        self.expect(TokenType::Select)?;

        let projection = match self.current().token_type {
            TokenType::Star => {
                self.advance();
                Projection::Star
            }
            TokenType::Count => {
                self.advance();
                self.expect(TokenType::LParen)?;
                self.expect(TokenType::Star)?;
                self.expect(TokenType::RParen)?;
                Projection::Count
            }
            ref other => {
                return Err(StorageError::ParseError(format!(
                    "Expected * or COUNT(*), found {:?}",
                    other
                )))
            }
        };

        self.expect(TokenType::From)?;
        let table = self.expect_identifier()?;

        let filter = if matches!(self.current().token_type, TokenType::Where) {
            self.advance();
            Some(self.parse_spatial_filter()?)
        } else {
            None
        };

        Ok(Statement::Select(SelectStmt {
            projection,
            table,
            filter,
        }))
    }

    fn parse_spatial_filter(&mut self) -> Result<SpatialFilter> {
        let function = self.expect_identifier()?;
        if !function.eq_ignore_ascii_case("spatial_intersect") {
            return Err(StorageError::ParseError(format!(
                "Unknown predicate '{}' (expected spatial_intersect)",
                function
            )));
        }
        self.expect(TokenType::LParen)?;
        let column = self.expect_identifier()?;
        self.expect(TokenType::Comma)?;
        let x1 = self.expect_number()?;
        self.expect(TokenType::Comma)?;
        let y1 = self.expect_number()?;
        self.expect(TokenType::Comma)?;
        let x2 = self.expect_number()?;
        self.expect(TokenType::Comma)?;
        let y2 = self.expect_number()?;
        self.expect(TokenType::RParen)?;

        Ok(SpatialFilter {
            column,
            x1,
            y1,
            x2,
            y2,
        })
    }

    fn current(&self) -> &Token {
        &self.tokens[self.position.min(self.tokens.len() - 1)]
    }

    fn advance(&mut self) {
        if self.position < self.tokens.len() - 1 {
            self.position += 1;
        }
    }

    fn expect(&mut self, expected: TokenType) -> Result<()> {
        let token = self.current();
        if std::mem::discriminant(&token.token_type) == std::mem::discriminant(&expected) {
            self.advance();
            Ok(())
        } else {
            Err(StorageError::ParseError(format!(
                "Expected {:?}, found {:?} at {}:{}",
                expected, token.token_type, token.line, token.column
            )))
        }
    }

    fn expect_identifier(&mut self) -> Result<String> {
        match self.current().token_type.clone() {
            TokenType::Identifier(name) => {
                self.advance();
                Ok(name)
            }
            other => Err(StorageError::ParseError(format!(
                "Expected identifier, found {:?}",
                other
            ))),
        }
    }

    fn expect_number(&mut self) -> Result<f64> {
        match self.current().token_type {
            TokenType::Number(n) => {
                self.advance();
                Ok(n)
            }
            ref other => Err(StorageError::ParseError(format!(
                "Expected number, found {:?}",
                other
            ))),
        }
    }

    fn expect_eof(&self) -> Result<()> {
        match self.current().token_type {
            TokenType::Eof => Ok(()),
            ref other => Err(StorageError::ParseError(format!(
                "Unexpected trailing input: {:?}",
                other
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ColumnType;
    use crate::sql::lexer::Lexer;

    fn parse(sql: &str) -> Result<Statement> {
        let tokens = Lexer::new(sql).tokenize()?;
        Parser::new(tokens).parse()
    }

    #[test]
    fn test_parse_create_table() {
        let stmt = parse("CREATE TABLE cities (id INT, location POINT, population DOUBLE)")
            .unwrap();
        match stmt {
            Statement::CreateTable(create) => {
                assert_eq!(create.table, "cities");
                assert_eq!(create.columns.len(), 3);
                assert_eq!(create.columns[1], ("location".to_string(), ColumnType::Point));
            }
            other => panic!("expected CREATE TABLE, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_insert() {
        let stmt = parse("INSERT INTO cities VALUES (0.5, 0.25, 1000000)").unwrap();
        match stmt {
            Statement::Insert(insert) => {
                assert_eq!(insert.table, "cities");
                assert_eq!(insert.values, vec![0.5, 0.25, 1_000_000.0]);
            }
            other => panic!("expected INSERT, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_insert_requires_point() {
        assert!(parse("INSERT INTO cities VALUES (0.5)").is_err());
    }

    #[test]
    fn test_parse_select_star_with_filter() {
        let stmt =
            parse("SELECT * FROM cities WHERE spatial_intersect(location, 0, 0, 0.5, 0.5)")
                .unwrap();
        match stmt {
            Statement::Select(select) => {
                assert_eq!(select.projection, Projection::Star);
                assert_eq!(select.table, "cities");
                let filter = select.filter.unwrap();
                assert_eq!(filter.column, "location");
                assert_eq!((filter.x2, filter.y2), (0.5, 0.5));
            }
            other => panic!("expected SELECT, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_select_count() {
        let stmt = parse("SELECT COUNT(*) FROM cities;").unwrap();
        match stmt {
            Statement::Select(select) => {
                assert_eq!(select.projection, Projection::Count);
                assert!(select.filter.is_none());
            }
            other => panic!("expected SELECT, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_unknown_predicate() {
        assert!(parse("SELECT * FROM cities WHERE nearest(location, 1, 2)").is_err());
    }

    #[test]
    fn test_parse_trailing_garbage() {
        assert!(parse("SELECT * FROM cities extra").is_err());
    }
}
