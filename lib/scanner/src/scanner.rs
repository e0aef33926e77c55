use cursor::{Col, Cursor, Line};
use log::{debug, trace};

pub mod token;
pub use token::{CompareOp, Keyword, Operator, Token, TokenData, TokenKind};

use TokenData::*;

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
#[error("[line {line}:{col}] Error: {error}")]
pub struct ScanError {
    pub error: ScanErrorType,
    pub line: Line,
    pub col: Col,
}

impl ScanError {
    fn at(error: ScanErrorType, cursor: &Cursor) -> Self {
        Self { error, line: cursor.line(), col: cursor.col() }
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ScanErrorType {
    #[error("Unexpected character '{0}'.")]
    UnexpectedCharacter(char),
    #[error("Unterminated string.")]
    UnterminatedString,
    #[error("Number literal {0} is too large.")]
    NumberTooLarge(String),
}

/// Lazily scans `source`, yielding one token (or one error) per call to `next()`.
#[derive(Debug, Clone)]
pub struct TokenStream<'a> {
    cursor: Cursor<'a>,
}

impl<'a> TokenStream<'a> {
    pub fn new(source: &'a str) -> Self {
        Self { cursor: Cursor::new(source) }
    }

    fn skip_whitespace(&mut self) {
        self.cursor.consume_while(|c| matches!(c, ' ' | '\t' | '\r' | '\n'));
    }

    fn token_from(&self, data: TokenData<'a>, start: Cursor<'a>) -> Token<'a> {
        Token::new(data, (start, self.cursor.clone()))
    }

    fn scan_token(&mut self, start: Cursor<'a>, c: char) -> Result<Token<'a>, ScanError> {
        let data = match c {
            '(' => LParen,
            ')' => RParen,
            '{' => LBrace,
            '}' => RBrace,
            ';' => Semicolon,
            '+' => Op(Operator::Add),
            '-' => Op(Operator::Subtract),
            '*' => Op(Operator::Multiply),
            '/' => Op(Operator::Divide),

            // Comparisons are tried before the single '=', so '==' never becomes two assignments
            '=' if self.cursor.consume_if('=') => CompareOp(CompareOp::Equal),
            '=' => Assign,
            '!' if self.cursor.consume_if('=') => CompareOp(CompareOp::NotEqual),
            '<' if self.cursor.consume_if('=') => CompareOp(CompareOp::LessEqual),
            '<' => CompareOp(CompareOp::Less),
            '>' if self.cursor.consume_if('=') => CompareOp(CompareOp::GreaterEqual),
            '>' => CompareOp(CompareOp::Greater),

            '"' => return self.string(start),
            d if d.is_ascii_digit() => return self.number(start),
            c if c.is_ascii_alphabetic() || c == '_' => return Ok(self.identifier(start)),

            c => return Err(ScanError::at(ScanErrorType::UnexpectedCharacter(c), &start)),
        };
        Ok(self.token_from(data, start))
    }

    fn string(&mut self, start: Cursor<'a>) -> Result<Token<'a>, ScanError> {
        let contents_start = self.cursor.clone();
        self.cursor.consume_while(|c| c != '"');
        let contents = contents_start.slice_until(&self.cursor);

        if !self.cursor.consume_if('"') {
            return Err(ScanError::at(ScanErrorType::UnterminatedString, &start));
        }
        Ok(self.token_from(Str(contents), start))
    }

    fn number(&mut self, start: Cursor<'a>) -> Result<Token<'a>, ScanError> {
        self.cursor.consume_while(|c| c.is_ascii_digit());
        let lexeme = start.slice_until(&self.cursor);
        let value = lexeme
            .parse()
            .map_err(|_| ScanError::at(ScanErrorType::NumberTooLarge(lexeme.to_string()), &start))?;
        Ok(self.token_from(Number(value), start))
    }

    fn identifier(&mut self, start: Cursor<'a>) -> Token<'a> {
        self.cursor.consume_while(|c| c.is_ascii_alphanumeric() || c == '_');
        let data = match start.slice_until(&self.cursor).parse::<Keyword>() {
            Ok(keyword) => Keyword(keyword),
            Err(_) => Identifier,
        };
        self.token_from(data, start)
    }
}

impl<'a> Iterator for TokenStream<'a> {
    type Item = Result<Token<'a>, ScanError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.skip_whitespace();
        let start = self.cursor.clone();
        let c = self.cursor.next()?;
        let token = self.scan_token(start, c);
        if let Ok(token) = &token {
            trace!("Scanned {:?} '{}' at {}:{}", token.kind(), token, token.line(), token.col());
        }
        Some(token)
    }
}

/// Scans the whole of `source`, stopping at the first lexical error.
pub fn tokenize(source: &str) -> Result<Vec<Token<'_>>, ScanError> {
    let tokens = TokenStream::new(source).collect::<Result<Vec<_>, _>>()?;
    debug!("Scanned {} tokens", tokens.len());
    Ok(tokens)
}
