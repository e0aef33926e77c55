use cursor::{Col, Line};
use log::{debug, trace};
use scanner::{Keyword, Token, TokenData, TokenKind};

mod ast;
pub use ast::{Condition, Expression, Program, Statement};

use TokenData::*;

pub type Result<T> = std::result::Result<T, ParseError>;

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
#[error("[line {line}:{col}] Error at {at}: {error}")]
pub struct ParseError {
    pub error: ParseErrorType,
    pub line: Line,
    pub col: Col,
    /// The offending lexeme in quotes, or `end` if the input ran out.
    pub at: String,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ParseErrorType {
    #[error("Expect statement.")]
    ExpectedStatement,
    #[error("Expect variable name after 'gimme'.")]
    ExpectedVariableName,
    #[error("Expect '=' after variable name.")]
    ExpectedAssign,
    #[error("Expect '(' after '{0}'.")]
    ExpectedLeftParen(&'static str),
    #[error("Expect ')' after {0}.")]
    ExpectedRightParen(&'static str),
    #[error("Expect '{{' {0}.")]
    ExpectedLeftBrace(&'static str),
    #[error("Expect '}}' after block.")]
    ExpectedRightBrace,
    #[error("Expect string literal after 'say'.")]
    ExpectedString,
    #[error("Expect comparison operator in condition.")]
    ExpectedComparison,
    #[error("Expect expression.")]
    ExpectedExpression,
    #[error("Expression too deeply nested.")]
    ExpressionTooDeep,
    #[error("Blocks too deeply nested.")]
    BlocksTooDeep,
}

/// Bounds expression tree depth, parenthesis nesting and block nesting. Execution, `Display` and
/// serialization all recurse over the tree.
pub const MAX_NESTING: usize = 200;

#[derive(Debug)]
pub struct Parser<'a> {
    tokens: Vec<Token<'a>>,
    current: usize,
    /// Where "end of input" errors are reported.
    end: (Line, Col),
    parens: usize,
    blocks: usize,
}

impl<'a> Parser<'a> {
    pub fn new(tokens: Vec<Token<'a>>) -> Self {
        let end = tokens
            .last()
            .map(|t| (t.range.end().line(), t.range.end().col()))
            .unwrap_or((Line(1), Col(1)));
        Self { tokens, current: 0, end, parens: 0, blocks: 0 }
    }

    pub fn parse(mut self) -> Result<Program> {
        let mut body = Vec::new();
        while self.peek().is_some() {
            body.push(self.statement()?);
        }
        debug!("Parsed {} top-level statements", body.len());
        Ok(Program { body })
    }

    fn statement(&mut self) -> Result<Statement> {
        let statement = match self.peek().map(|t| t.data) {
            Some(Keyword(Keyword::Gimme)) => self.declaration()?,
            Some(Keyword(Keyword::Yo)) => self.if_statement()?,
            Some(Keyword(Keyword::Keepdoing)) => self.while_loop()?,
            Some(Keyword(Keyword::Say)) => self.print()?,
            Some(Identifier) if self.peek_next().map(Token::kind) == Some(TokenKind::Assign) => {
                self.assignment()?
            }
            Some(Identifier) => {
                return Err(self.error_at(ParseErrorType::ExpectedAssign, self.peek_next()))
            }
            _ => return Err(self.error(ParseErrorType::ExpectedStatement)),
        };

        // A single trailing semicolon is optional
        self.consume(TokenKind::Semicolon);

        trace!("Parsed statement: {}", statement);
        Ok(statement)
    }

    fn declaration(&mut self) -> Result<Statement> {
        self.advance(); // gimme
        let identifier = self
            .consume_or_error(TokenKind::Identifier, ParseErrorType::ExpectedVariableName)?
            .lexeme()
            .to_string();
        self.consume_or_error(TokenKind::Assign, ParseErrorType::ExpectedAssign)?;
        let value = self.expression()?;
        Ok(Statement::Declaration { identifier, value })
    }

    fn assignment(&mut self) -> Result<Statement> {
        let identifier = self
            .consume_or_error(TokenKind::Identifier, ParseErrorType::ExpectedVariableName)?
            .lexeme()
            .to_string();
        self.consume_or_error(TokenKind::Assign, ParseErrorType::ExpectedAssign)?;
        let value = self.expression()?;
        Ok(Statement::Assignment { identifier, value })
    }

    fn if_statement(&mut self) -> Result<Statement> {
        self.advance(); // yo
        let condition = self.parenthesized_condition("yo")?;
        let if_body = self.block("before 'yo' body")?;

        let else_body = if matches!(self.peek().map(|t| t.data), Some(Keyword(Keyword::Nah))) {
            self.advance();
            self.block("after 'nah'")?
        } else {
            Vec::new()
        };

        Ok(Statement::IfStatement { condition, if_body, else_body })
    }

    fn while_loop(&mut self) -> Result<Statement> {
        self.advance(); // keepdoing
        let condition = self.parenthesized_condition("keepdoing")?;
        let body = self.block("before 'keepdoing' body")?;
        Ok(Statement::WhileLoop { condition, body })
    }

    fn print(&mut self) -> Result<Statement> {
        self.advance(); // say
        match self.peek().map(|t| t.data) {
            Some(Str(value)) => {
                self.advance();
                Ok(Statement::Print { value: value.to_string() })
            }
            _ => Err(self.error(ParseErrorType::ExpectedString)),
        }
    }

    fn block(&mut self, context: &'static str) -> Result<Vec<Statement>> {
        let brace =
            self.consume_or_error(TokenKind::LBrace, ParseErrorType::ExpectedLeftBrace(context))?;
        if self.blocks == MAX_NESTING {
            return Err(self.error_at(ParseErrorType::BlocksTooDeep, Some(&brace)));
        }

        self.blocks += 1;
        let mut statements = Vec::new();
        while !matches!(self.peek().map(|t| t.data), Some(RBrace) | None) {
            statements.push(self.statement()?);
        }
        self.blocks -= 1;

        self.consume_or_error(TokenKind::RBrace, ParseErrorType::ExpectedRightBrace)?;
        Ok(statements)
    }

    fn parenthesized_condition(&mut self, keyword: &'static str) -> Result<Condition> {
        self.consume_or_error(TokenKind::LParen, ParseErrorType::ExpectedLeftParen(keyword))?;
        let condition = self.condition()?;
        self.consume_or_error(TokenKind::RParen, ParseErrorType::ExpectedRightParen("condition"))?;
        Ok(condition)
    }

    fn condition(&mut self) -> Result<Condition> {
        let left = self.expression()?;
        let operator = match self.peek().map(|t| t.data) {
            Some(CompareOp(operator)) => {
                self.advance();
                operator
            }
            _ => return Err(self.error(ParseErrorType::ExpectedComparison)),
        };
        let right = self.expression()?;
        Ok(Condition { left, operator, right })
    }

    /// All four operators share one precedence level and group left to right,
    /// so `2 + 3 * 4` is `(2 + 3) * 4`.
    fn expression(&mut self) -> Result<Expression> {
        self.operation_chain().map(|(expression, _)| expression)
    }

    /// Returns the expression together with the depth of its tree.
    fn operation_chain(&mut self) -> Result<(Expression, usize)> {
        let (mut left, mut depth) = self.term()?;
        while let Some(Op(operator)) = self.peek().map(|t| t.data) {
            let operator_token = self.advance();
            let (right, right_depth) = self.term()?;

            depth = depth.max(right_depth) + 1;
            if depth > MAX_NESTING {
                return Err(
                    self.error_at(ParseErrorType::ExpressionTooDeep, operator_token.as_ref())
                );
            }
            left = Expression::operation(operator, left, right);
        }
        Ok((left, depth))
    }

    fn term(&mut self) -> Result<(Expression, usize)> {
        let expression = match self.peek().map(|t| (t.data, t.lexeme())) {
            Some((Number(value), _)) => Expression::Number { value },
            Some((Str(value), _)) => Expression::Str { value: value.to_string() },
            Some((Identifier, name)) => Expression::Variable { name: name.to_string() },
            Some((LParen, _)) => {
                if self.parens == MAX_NESTING {
                    return Err(self.error(ParseErrorType::ExpressionTooDeep));
                }
                self.advance();
                self.parens += 1;
                let grouped = self.operation_chain()?;
                self.parens -= 1;
                self.consume_or_error(
                    TokenKind::RParen,
                    ParseErrorType::ExpectedRightParen("expression"),
                )?;
                return Ok(grouped);
            }
            _ => return Err(self.error(ParseErrorType::ExpectedExpression)),
        };
        self.advance();
        Ok((expression, 1))
    }
}

// Helpers
impl<'a> Parser<'a> {
    fn peek(&self) -> Option<&Token<'a>> {
        self.tokens.get(self.current)
    }

    fn peek_next(&self) -> Option<&Token<'a>> {
        self.tokens.get(self.current + 1)
    }

    fn advance(&mut self) -> Option<Token<'a>> {
        let token = self.tokens.get(self.current).cloned();
        if token.is_some() {
            self.current += 1;
        }
        token
    }

    fn consume(&mut self, kind: TokenKind) -> Option<Token<'a>> {
        match self.peek() {
            Some(t) if t.kind() == kind => self.advance(),
            _ => None,
        }
    }

    fn consume_or_error(&mut self, kind: TokenKind, error: ParseErrorType) -> Result<Token<'a>> {
        match self.consume(kind) {
            Some(token) => Ok(token),
            None => Err(self.error(error)),
        }
    }

    fn error(&self, error: ParseErrorType) -> ParseError {
        self.error_at(error, self.peek())
    }

    fn error_at(&self, error: ParseErrorType, token: Option<&Token>) -> ParseError {
        let error = match token {
            Some(token) => ParseError {
                error,
                line: token.line(),
                col: token.col(),
                at: format!("'{}'", token.lexeme()),
            },
            None => ParseError { error, line: self.end.0, col: self.end.1, at: "end".to_string() },
        };
        trace!("Parse error: {:?}", error);
        error
    }
}

pub fn parse(tokens: Vec<Token<'_>>) -> Result<Program> {
    Parser::new(tokens).parse()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use scanner::{CompareOp, Operator};
    use serde_json::json;

    use super::*;

    fn parse_source(source: &str) -> Result<Program> {
        parse(scanner::tokenize(source).unwrap())
    }

    fn number(value: i64) -> Expression {
        Expression::Number { value }
    }

    fn variable(name: &str) -> Expression {
        Expression::Variable { name: name.to_string() }
    }

    fn error(source: &str) -> (ParseErrorType, String) {
        let e = parse_source(source).unwrap_err();
        (e.error, e.at)
    }

    #[test]
    fn declaration_and_print() {
        assert_eq!(
            parse_source("gimme x = 5; say \"start\";").unwrap(),
            Program {
                body: vec![
                    Statement::Declaration { identifier: "x".to_string(), value: number(5) },
                    Statement::Print { value: "start".to_string() },
                ]
            }
        );
    }

    #[test]
    fn empty_program() {
        assert_eq!(parse_source("").unwrap(), Program { body: vec![] });
        assert_eq!(parse_source("  \n ").unwrap(), Program { body: vec![] });
    }

    #[test]
    fn flat_precedence() {
        let program = parse_source("gimme x = 2 + 3 * 4 - y").unwrap();
        assert_eq!(
            program.body[0],
            Statement::Declaration {
                identifier: "x".to_string(),
                value: Expression::operation(
                    Operator::Subtract,
                    Expression::operation(
                        Operator::Multiply,
                        Expression::operation(Operator::Add, number(2), number(3)),
                        number(4),
                    ),
                    variable("y"),
                ),
            }
        );
    }

    #[test]
    fn parentheses_group() {
        let program = parse_source("x = 2 + (3 * (4))").unwrap();
        assert_eq!(
            program.body[0],
            Statement::Assignment {
                identifier: "x".to_string(),
                value: Expression::operation(
                    Operator::Add,
                    number(2),
                    Expression::operation(Operator::Multiply, number(3), number(4)),
                ),
            }
        );
    }

    #[test]
    fn if_else() {
        let program = parse_source("yo (1 > 2) { say \"a\"; } nah { say \"b\"; }").unwrap();
        assert_eq!(
            program.body,
            vec![Statement::IfStatement {
                condition: Condition {
                    left: number(1),
                    operator: CompareOp::Greater,
                    right: number(2)
                },
                if_body: vec![Statement::Print { value: "a".to_string() }],
                else_body: vec![Statement::Print { value: "b".to_string() }],
            }]
        );
    }

    #[test]
    fn if_without_else() {
        let program = parse_source("yo (a == \"x\") { } say \"after\"").unwrap();
        assert_eq!(
            program.body,
            vec![
                Statement::IfStatement {
                    condition: Condition {
                        left: variable("a"),
                        operator: CompareOp::Equal,
                        right: Expression::Str { value: "x".to_string() },
                    },
                    if_body: vec![],
                    else_body: vec![],
                },
                Statement::Print { value: "after".to_string() },
            ]
        );
    }

    #[test]
    fn while_loop() {
        let program = parse_source("keepdoing (x < 3) { x = x + 1; }").unwrap();
        assert_eq!(
            program.body,
            vec![Statement::WhileLoop {
                condition: Condition {
                    left: variable("x"),
                    operator: CompareOp::Less,
                    right: number(3),
                },
                body: vec![Statement::Assignment {
                    identifier: "x".to_string(),
                    value: Expression::operation(Operator::Add, variable("x"), number(1)),
                }],
            }]
        );
    }

    #[test]
    fn nested_blocks() {
        let program = parse_source(
            "keepdoing (i < 10) { yo (i == 5) { say \"five\" } \
             nah { keepdoing (0 > 1) { } } i = i + 1 }",
        )
        .unwrap();
        let Statement::WhileLoop { body, .. } = &program.body[0] else {
            panic!("expected a loop, got {:?}", program.body[0]);
        };
        assert_eq!(body.len(), 2);
        assert!(matches!(
            &body[0],
            Statement::IfStatement { else_body, .. } if else_body.len() == 1
        ));
    }

    #[test]
    fn semicolons_are_optional() {
        let with = parse_source("gimme x = 1; gimme y = 2;").unwrap();
        let without = parse_source("gimme x = 1\ngimme y = 2").unwrap();
        assert_eq!(with, without);
        assert_eq!(with.body.len(), 2);
    }

    #[test]
    fn condition_sides_are_expressions() {
        let program = parse_source("yo ((1 + 2) * 3 >= x - 1) { }").unwrap();
        let Statement::IfStatement { condition, .. } = &program.body[0] else {
            panic!("expected an if statement");
        };
        assert_eq!(condition.operator, CompareOp::GreaterEqual);
        assert_eq!(
            condition.right,
            Expression::operation(Operator::Subtract, variable("x"), number(1))
        );
    }

    #[test]
    fn syntax_errors() {
        use ParseErrorType::*;

        assert_eq!(error("say x"), (ExpectedString, "'x'".to_string()));
        assert_eq!(error("say 5"), (ExpectedString, "'5'".to_string()));
        assert_eq!(error("gimme = 5"), (ExpectedVariableName, "'='".to_string()));
        assert_eq!(error("gimme x 5"), (ExpectedAssign, "'5'".to_string()));
        assert_eq!(error("gimme x = "), (ExpectedExpression, "end".to_string()));
        assert_eq!(error("gimme x = +"), (ExpectedExpression, "'+'".to_string()));
        assert_eq!(error("gimme x = 1 +"), (ExpectedExpression, "end".to_string()));
        assert_eq!(
            error("gimme x = (1 + 2"),
            (ExpectedRightParen("expression"), "end".to_string())
        );
        assert_eq!(error("x + 1;"), (ExpectedAssign, "'+'".to_string()));
        assert_eq!(error("x"), (ExpectedAssign, "end".to_string()));
        assert_eq!(error(";"), (ExpectedStatement, "';'".to_string()));
        assert_eq!(error("gimme x = 1;;"), (ExpectedStatement, "';'".to_string()));
        assert_eq!(error("nah { }"), (ExpectedStatement, "'nah'".to_string()));
        assert_eq!(error("5"), (ExpectedStatement, "'5'".to_string()));
        assert_eq!(error("}"), (ExpectedStatement, "'}'".to_string()));
        assert_eq!(error("yo (x) { }"), (ExpectedComparison, "')'".to_string()));
        assert_eq!(error("yo x < 1 { }"), (ExpectedLeftParen("yo"), "'x'".to_string()));
        assert_eq!(
            error("keepdoing x < 3 { }"),
            (ExpectedLeftParen("keepdoing"), "'x'".to_string())
        );
        assert_eq!(error("yo (x < 1 { }"), (ExpectedRightParen("condition"), "'{'".to_string()));
        assert_eq!(
            error("yo (x < 1) say \"a\""),
            (ExpectedLeftBrace("before 'yo' body"), "'say'".to_string())
        );
        assert_eq!(
            error("yo (x < 1) { } nah say \"a\""),
            (ExpectedLeftBrace("after 'nah'"), "'say'".to_string())
        );
        assert_eq!(error("yo (1 > 2) { say \"a\";"), (ExpectedRightBrace, "end".to_string()));
        assert_eq!(error("yo (1 > 2) { gimme }"), (ExpectedVariableName, "'}'".to_string()));
    }

    #[test]
    fn nesting_limits() {
        use ParseErrorType::*;

        let deepest_chain = format!("gimme x = 1{}", " + 1".repeat(MAX_NESTING - 1));
        assert!(parse_source(&deepest_chain).is_ok());

        let e = parse_source(&format!("gimme x = 1{}", " + 1".repeat(20_000))).unwrap_err();
        assert_eq!((e.error, e.at.as_str()), (ExpressionTooDeep, "'+'"));
        assert_eq!(e.col, Col(4 * MAX_NESTING + 9));

        let parens = |n: usize| format!("gimme x = {}1{}", "(".repeat(n), ")".repeat(n));
        assert!(parse_source(&parens(MAX_NESTING)).is_ok());
        assert_eq!(error(&parens(MAX_NESTING + 1)), (ExpressionTooDeep, "'('".to_string()));
        assert_eq!(error(&parens(5_000)), (ExpressionTooDeep, "'('".to_string()));

        // Grouping on the left keeps adding to the depth of the tree
        let grouped = |n: usize| format!("gimme x = {}1{}", "(".repeat(n), " + 1)".repeat(n));
        assert!(parse_source(&grouped(MAX_NESTING - 1)).is_ok());
        assert_eq!(error(&grouped(MAX_NESTING)).0, ExpressionTooDeep);

        let blocks = |n: usize| format!("{}{}", "yo (1 < 2) { ".repeat(n), "}".repeat(n));
        assert!(parse_source(&blocks(MAX_NESTING)).is_ok());
        assert_eq!(error(&blocks(MAX_NESTING + 1)), (BlocksTooDeep, "'{'".to_string()));
        assert_eq!(error(&blocks(5_000)), (BlocksTooDeep, "'{'".to_string()));
    }

    #[test]
    fn error_messages() {
        assert_eq!(
            parse_source("\nsay x").unwrap_err().to_string(),
            "[line 2:5] Error at 'x': Expect string literal after 'say'."
        );
        assert_eq!(
            parse_source("gimme x =").unwrap_err().to_string(),
            "[line 1:10] Error at end: Expect expression."
        );
        assert_eq!(
            parse_source("keepdoing (1 < 2) {").unwrap_err().to_string(),
            "[line 1:20] Error at end: Expect '}' after block."
        );
    }

    #[test]
    fn serializes_as_tagged_tree() {
        let program = parse_source("gimme x = 1 + y; yo (x != \"a\") { say \"hi\" }").unwrap();
        assert_eq!(
            serde_json::to_value(&program).unwrap(),
            json!({
                "type": "Program",
                "body": [
                    {
                        "type": "Declaration",
                        "identifier": "x",
                        "value": {
                            "type": "Operation",
                            "operator": "+",
                            "left": { "type": "Number", "value": 1 },
                            "right": { "type": "Variable", "name": "y" }
                        }
                    },
                    {
                        "type": "IfStatement",
                        "condition": {
                            "type": "Condition",
                            "left": { "type": "Variable", "name": "x" },
                            "operator": "!=",
                            "right": { "type": "String", "value": "a" }
                        },
                        "if_body": [{ "type": "Print", "value": "hi" }],
                        "else_body": []
                    }
                ]
            })
        );
    }

    #[test]
    fn parsing_is_deterministic() {
        let source = "gimme i = 0\n\
            keepdoing (i < 3) { yo (i == 1) { say \"one\" } nah { say \"other\" } i = i + 1 }";
        let first = parse_source(source).unwrap();
        let second = parse_source(source).unwrap();
        assert_eq!(first, second);
        assert_eq!(serde_json::to_string(&first).unwrap(), serde_json::to_string(&second).unwrap());
    }

    #[test]
    fn display_parses_back_to_the_same_tree() {
        let source = r#"
            gimme a = 10 - (2 - 3) * 4
            gimme s = "x" + a
            yo (a / 2 <= (a)) { say "small"; } nah { a = a - 1 }
            keepdoing (a > 0) { a = a - 1; yo (s == "x") { } }
        "#;
        let program = parse_source(source).unwrap();
        let printed = program.to_string();
        assert_eq!(parse_source(&printed).unwrap(), program);
        assert_eq!(printed.lines().next(), Some("gimme a = 10 - (2 - 3) * 4;"));
    }
}
