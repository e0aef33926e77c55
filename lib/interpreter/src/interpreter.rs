use std::time::Duration;

use log::{debug, trace};
use parser::{Condition, Expression, ParseError, Program, Statement};
use scanner::{CompareOp, Operator, ScanError};

mod environment;
pub use environment::Environment;

mod limits;
use limits::Budget;
pub use limits::{CancellationToken, Limits};

mod sink;
pub use sink::{LogSink, OutputSink, WriterSink};

mod value;
pub use value::Value;

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum RuntimeError {
    #[error("Variable '{0}' already declared.")]
    AlreadyDeclared(String),
    #[error("Variable '{0}' not declared.")]
    Undeclared(String),
    #[error("Only + operator is supported for strings, got '{0}'.")]
    UnsupportedStringOperator(Operator),
    #[error("String comparisons only support == and != operators, got '{0}'.")]
    UnsupportedStringComparison(CompareOp),
    #[error("Division by zero.")]
    DivisionByZero,
    #[error("Integer overflow in {left} {operator} {right}.")]
    IntegerOverflow { left: i64, operator: Operator, right: i64 },
    #[error("Loop iteration limit of {0} exceeded.")]
    IterationLimitExceeded(u64),
    #[error("Execution took longer than {0:?}.")]
    TimedOut(Duration),
    #[error("Execution cancelled.")]
    Cancelled,
    #[error("Failed to emit output: {0}")]
    Output(String),
}

/// Failure of any pipeline stage.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum InterpretError {
    #[error(transparent)]
    Scan(#[from] ScanError),
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error("Runtime error: {0}")]
    Runtime(#[from] RuntimeError),
}

/// What a successful run leaves behind.
#[derive(Debug, Clone, PartialEq)]
pub struct Execution {
    /// Every printed line, in order.
    pub output: Vec<String>,
    pub environment: Environment,
}

#[derive(Debug)]
pub struct Interpreter<S> {
    environment: Environment,
    output: Vec<String>,
    sink: S,
    budget: Budget,
}

impl<S: OutputSink> Interpreter<S> {
    pub fn new(sink: S) -> Self {
        Self::with_limits(sink, Limits::default())
    }

    pub fn with_limits(sink: S, limits: Limits) -> Self {
        Self {
            environment: Environment::default(),
            output: Vec::new(),
            sink,
            budget: Budget::new(limits),
        }
    }

    /// Runs `program` to completion. The first error aborts the run.
    pub fn execute(mut self, program: &Program) -> Result<Execution, RuntimeError> {
        self.budget.start();
        self.execute_block(&program.body)?;

        debug!(
            "Finished run: {} lines printed, {} variables, {} loop iterations",
            self.output.len(),
            self.environment.len(),
            self.budget.iterations()
        );
        Ok(Execution { output: self.output, environment: self.environment })
    }

    fn execute_block(&mut self, statements: &[Statement]) -> Result<(), RuntimeError> {
        statements.iter().try_for_each(|statement| self.execute_statement(statement))
    }

    fn execute_statement(&mut self, statement: &Statement) -> Result<(), RuntimeError> {
        use Statement::*;
        match statement {
            Declaration { identifier, value } => {
                let value = self.evaluate(value)?;
                self.environment.declare(identifier, value)
            }
            Assignment { identifier, value } => {
                let value = self.evaluate(value)?;
                self.environment.assign(identifier, value)
            }
            IfStatement { condition, if_body, else_body } => {
                if self.evaluate_condition(condition)? {
                    self.execute_block(if_body)
                } else {
                    self.execute_block(else_body)
                }
            }
            WhileLoop { condition, body } => {
                while self.evaluate_condition(condition)? {
                    self.budget.tick()?;
                    self.execute_block(body)?;
                }
                Ok(())
            }
            Print { value } => {
                trace!("Printing {:?}", value);
                self.sink.emit(value).map_err(|e| RuntimeError::Output(e.to_string()))?;
                self.output.push(value.clone());
                Ok(())
            }
        }
    }

    fn evaluate(&self, expression: &Expression) -> Result<Value, RuntimeError> {
        match expression {
            Expression::Number { value } => Ok(Value::Integer(*value)),
            Expression::Str { value } => Ok(Value::Str(value.clone())),
            Expression::Variable { name } => self.environment.lookup(name).cloned(),
            Expression::Operation { operator, left, right } => {
                let left = self.evaluate(left)?;
                let right = self.evaluate(right)?;
                left.apply(*operator, right)
            }
        }
    }

    fn evaluate_condition(&self, condition: &Condition) -> Result<bool, RuntimeError> {
        let left = self.evaluate(&condition.left)?;
        let right = self.evaluate(&condition.right)?;
        let result = left.compare(condition.operator, &right)?;
        trace!("Condition {} is {}", condition, result);
        Ok(result)
    }
}

/// A successful pass through the whole pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct Run {
    pub program: Program,
    pub execution: Execution,
}

/// Tokenizes, parses and executes `source`. Each stage finishes before the next one starts.
pub fn run_source<S: OutputSink>(
    source: &str,
    sink: S,
    limits: Limits,
) -> Result<Run, InterpretError> {
    let tokens = scanner::tokenize(source)?;
    let program = parser::parse(tokens)?;
    let execution = Interpreter::with_limits(sink, limits).execute(&program)?;
    Ok(Run { program, execution })
}
