use std::fmt::Display;

use cursor::{Col, Line, SourceRange};

#[derive(Debug, Clone, PartialEq)]
pub struct Token<'a> {
    pub data: TokenData<'a>,
    pub range: SourceRange<'a>,
}

impl<'a> Token<'a> {
    pub fn new(data: TokenData<'a>, range: impl Into<SourceRange<'a>>) -> Token<'a> {
        Self { data, range: range.into() }
    }

    pub fn kind(&self) -> TokenKind {
        self.data.kind()
    }

    pub fn lexeme(&self) -> &'a str {
        self.range.lexeme()
    }

    pub fn line(&self) -> Line {
        self.range.line()
    }

    pub fn col(&self) -> Col {
        self.range.col()
    }
}

impl Display for Token<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.lexeme())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TokenData<'a> {
    Keyword(Keyword),
    Number(i64),
    Identifier,
    CompareOp(CompareOp),
    Assign,
    Op(Operator),
    Semicolon,
    LParen,
    RParen,
    LBrace,
    RBrace,
    /// Contents between the quotes.
    Str(&'a str),
}

impl TokenData<'_> {
    pub fn kind(&self) -> TokenKind {
        match self {
            TokenData::Keyword(_) => TokenKind::Keyword,
            TokenData::Number(_) => TokenKind::Number,
            TokenData::Identifier => TokenKind::Identifier,
            TokenData::CompareOp(_) => TokenKind::CompareOp,
            TokenData::Assign => TokenKind::Assign,
            TokenData::Op(_) => TokenKind::Op,
            TokenData::Semicolon => TokenKind::Semicolon,
            TokenData::LParen => TokenKind::LParen,
            TokenData::RParen => TokenKind::RParen,
            TokenData::LBrace => TokenKind::LBrace,
            TokenData::RBrace => TokenKind::RBrace,
            TokenData::Str(_) => TokenKind::String,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
pub enum TokenKind {
    Keyword,
    Number,
    Identifier,
    CompareOp,
    Assign,
    Op,
    Semicolon,
    LParen,
    RParen,
    LBrace,
    RBrace,
    String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::EnumString, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum Keyword {
    Gimme,
    Yo,
    Nah,
    Keepdoing,
    Say,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display, serde::Serialize)]
pub enum Operator {
    #[strum(serialize = "+")]
    #[serde(rename = "+")]
    Add,
    #[strum(serialize = "-")]
    #[serde(rename = "-")]
    Subtract,
    #[strum(serialize = "*")]
    #[serde(rename = "*")]
    Multiply,
    #[strum(serialize = "/")]
    #[serde(rename = "/")]
    Divide,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display, serde::Serialize)]
pub enum CompareOp {
    #[strum(serialize = "<")]
    #[serde(rename = "<")]
    Less,
    #[strum(serialize = ">")]
    #[serde(rename = ">")]
    Greater,
    #[strum(serialize = "==")]
    #[serde(rename = "==")]
    Equal,
    #[strum(serialize = "!=")]
    #[serde(rename = "!=")]
    NotEqual,
    #[strum(serialize = "<=")]
    #[serde(rename = "<=")]
    LessEqual,
    #[strum(serialize = ">=")]
    #[serde(rename = ">=")]
    GreaterEqual,
}

impl CompareOp {
    /// Only equality is defined between strings.
    pub fn is_equality(self) -> bool {
        matches!(self, CompareOp::Equal | CompareOp::NotEqual)
    }
}
