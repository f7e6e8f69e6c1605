//! SQL Lexer - converts a SQL string into tokens

use super::token::{Token, TokenType};
use crate::error::{Result, StorageError};

pub struct Lexer {
    input: Vec<char>,
    position: usize,
    line: usize,
    column: usize,
}

impl Lexer {
    pub fn new(input: &str) -> Self {
        Self {
            input: input.chars().collect(),
            position: 0,
            line: 1,
            column: 1,
        }
    }

    pub fn tokenize(&mut self) -> Result<Vec<Token>> {
        let mut tokens = Vec::new();

        loop {
            let token = self.next_token()?;
            let is_eof = matches!(token.token_type, TokenType::Eof);
            tokens.push(token);
            if is_eof {
                break;
            }
        }

        Ok(tokens)
    }

    pub fn next_token(&mut self) -> Result<Token> {
        self.skip_whitespace();

        let line = self.line;
        let column = self.column;

        if self.is_eof() {
            return Ok(Token::new(TokenType::Eof, line, column));
        }

        let ch = self.current_char();

        // Skip -- line comments
        if ch == '-' && self.peek_char() == Some('-') {
            self.skip_line_comment();
            return self.next_token();
        }

        let token_type = match ch {
            '\'' | '"' => self.read_string(ch)?,
            '0'..='9' => self.read_number()?,
            'a'..='z' | 'A'..='Z' | '_' => self.read_identifier(),
            '-' | '+' => self.read_number()?,
            '*' => {
                self.advance();
                TokenType::Star
            }
            '(' => {
                self.advance();
                TokenType::LParen
            }
            ')' => {
                self.advance();
                TokenType::RParen
            }
            ',' => {
                self.advance();
                TokenType::Comma
            }
            ';' => {
                self.advance();
                TokenType::Semicolon
            }
            _ => {
                return Err(StorageError::ParseError(format!(
                    "Unexpected character '{}' at {}:{}",
                    ch, line, column
                )))
            }
        };

        Ok(Token::new(token_type, line, column))
    }

    fn is_eof(&self) -> bool {
        self.position >= self.input.len()
    }

    fn current_char(&self) -> char {
        self.input[self.position]
    }

    fn peek_char(&self) -> Option<char> {
        self.input.get(self.position + 1).copied()
    }

    fn advance(&mut self) {
        if !self.is_eof() {
            if self.current_char() == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
            self.position += 1;
        }
    }

    fn skip_whitespace(&mut self) {
        while !self.is_eof() && self.current_char().is_whitespace() {
            self.advance();
        }
    }

    fn skip_line_comment(&mut self) {
        while !self.is_eof() && self.current_char() != '\n' {
            self.advance();
        }
    }

    fn read_string(&mut self, quote: char) -> Result<TokenType> {
        let line = self.line;
        let column = self.column;
        self.advance(); // opening quote

        let mut value = String::new();
        while !self.is_eof() && self.current_char() != quote {
            value.push(self.current_char());
            self.advance();
        }
        if self.is_eof() {
            return Err(StorageError::ParseError(format!(
                "Unterminated string starting at {}:{}",
                line, column
            )));
        }
        self.advance(); // closing quote
        Ok(TokenType::StringLit(value))
    }

    fn read_number(&mut self) -> Result<TokenType> {
        let line = self.line;
        let column = self.column;
        let mut value = String::new();

        if self.current_char() == '-' || self.current_char() == '+' {
            value.push(self.current_char());
            self.advance();
        }
        while !self.is_eof()
            && (self.current_char().is_ascii_digit()
                || self.current_char() == '.'
                || self.current_char() == 'e'
                || self.current_char() == 'E')
        {
            value.push(self.current_char());
            self.advance();
            // Exponent sign
            if (value.ends_with('e') || value.ends_with('E'))
                && matches!(self.current_char_opt(), Some('-') | Some('+'))
            {
                value.push(self.current_char());
                self.advance();
            }
        }

        value.parse::<f64>().map(TokenType::Number).map_err(|_| {
            StorageError::ParseError(format!("Invalid number '{}' at {}:{}", value, line, column))
        })
    }

    fn current_char_opt(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    fn read_identifier(&mut self) -> TokenType {
        let mut value = String::new();
        while !self.is_eof()
            && (self.current_char().is_alphanumeric() || self.current_char() == '_')
        {
            value.push(self.current_char());
            self.advance();
        }

        TokenType::from_keyword(&value).unwrap_or(TokenType::Identifier(value))
    }
}
