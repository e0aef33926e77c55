use std::fmt::{self, Display, Formatter};

use itertools::Itertools;
use scanner::{CompareOp, Operator};
use serde::Serialize;

/// Root of the tree. Serializes as `{"type": "Program", "body": [...]}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type")]
pub struct Program {
    pub body: Vec<Statement>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type")]
pub enum Statement {
    Declaration { identifier: String, value: Expression },
    Assignment { identifier: String, value: Expression },
    IfStatement { condition: Condition, if_body: Vec<Statement>, else_body: Vec<Statement> },
    WhileLoop { condition: Condition, body: Vec<Statement> },
    /// Only ever holds the literal text, it is never evaluated.
    Print { value: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type")]
pub struct Condition {
    pub left: Expression,
    pub operator: CompareOp,
    pub right: Expression,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type")]
pub enum Expression {
    Number {
        value: i64,
    },
    #[serde(rename = "String")]
    Str {
        value: String,
    },
    Variable {
        name: String,
    },
    Operation {
        operator: Operator,
        left: Box<Expression>,
        right: Box<Expression>,
    },
}

impl Expression {
    pub fn operation(operator: Operator, left: Expression, right: Expression) -> Self {
        Expression::Operation { operator, left: Box::new(left), right: Box::new(right) }
    }
}

// The Display impls print source code that parses back into the same tree.

impl Display for Program {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.body.iter().join("\n"))
    }
}

fn block(statements: &[Statement]) -> String {
    if statements.is_empty() {
        "{ }".to_string()
    } else {
        format!("{{ {} }}", statements.iter().join(" "))
    }
}

impl Display for Statement {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Statement::Declaration { identifier, value } => {
                write!(f, "gimme {} = {};", identifier, value)
            }
            Statement::Assignment { identifier, value } => write!(f, "{} = {};", identifier, value),
            Statement::IfStatement { condition, if_body, else_body } => {
                write!(f, "yo ({}) {}", condition, block(if_body))?;
                if !else_body.is_empty() {
                    write!(f, " nah {}", block(else_body))?;
                }
                Ok(())
            }
            Statement::WhileLoop { condition, body } => {
                write!(f, "keepdoing ({}) {}", condition, block(body))
            }
            Statement::Print { value } => write!(f, "say \"{}\";", value),
        }
    }
}

impl Display for Condition {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.left, self.operator, self.right)
    }
}

impl Display for Expression {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Number { value } => write!(f, "{}", value),
            Expression::Str { value } => write!(f, "\"{}\"", value),
            Expression::Variable { name } => write!(f, "{}", name),
            Expression::Operation { operator, left, right } => match right.as_ref() {
                // Grouping is strictly left to right, so only a nested right operand needs parens
                Expression::Operation { .. } => write!(f, "{} {} ({})", left, operator, right),
                _ => write!(f, "{} {} {}", left, operator, right),
            },
        }
    }
}
