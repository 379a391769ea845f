//! Arithmetic evaluation.
//!
//! The built-in evaluator understands numbers, `+ - * /`, unary signs and
//! parentheses. Nothing else is accepted: there are no identifiers, calls or
//! attribute lookups to abuse.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{AgentflowError, Result};

const MAX_DEPTH: usize = 256;

/// Outcome of an evaluation. A malformed expression is a normal outcome,
/// not an adapter failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Calculation {
    Value(f64),
    Error(String),
}

#[async_trait]
pub trait CalculatorAdapter: Send + Sync {
    /// Evaluates `expression`, rounding the result to `precision` decimals.
    async fn evaluate(
        &self,
        expression: &str,
        precision: u32,
    ) -> Result<Calculation>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ArithmeticCalculator;

impl ArithmeticCalculator {
    /// Evaluates without rounding.
    pub fn eval(expression: &str) -> Result<f64> {
        let tokens = tokenize(expression)?;
        if tokens.is_empty() {
            return Err(AgentflowError::Expression("empty expression".to_string()));
        }

        let mut parser = Parser {
            tokens,
            pos: 0,
            depth: 0,
        };
        let value = parser.expr()?;
        if let Some((token, at)) = parser.peek() {
            return Err(AgentflowError::Expression(format!("unexpected token '{}' at position {}", token, at)));
        }
        if !value.is_finite() {
            return Err(AgentflowError::Expression("result is not a finite number".to_string()));
        }
        Ok(value)
    }
}

#[async_trait]
impl CalculatorAdapter for ArithmeticCalculator {
    async fn evaluate(
        &self,
        expression: &str,
        precision: u32,
    ) -> Result<Calculation> {
        match Self::eval(expression) {
            Ok(value) => Ok(Calculation::Value(round(value, precision))),
            Err(AgentflowError::Expression(msg)) => Ok(Calculation::Error(msg)),
            Err(e) => Err(e),
        }
    }
}

pub(crate) fn round(
    value: f64,
    precision: u32,
) -> f64 {
    let factor = 10f64.powi(precision.min(15) as i32);
    let rounded = (value * factor).round() / factor;
    if rounded.is_finite() { rounded } else { value }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Token {
    Num(f64),
    Plus,
    Minus,
    Star,
    Slash,
    LParen,
    RParen,
}

impl std::fmt::Display for Token {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        match self {
            Token::Num(n) => write!(f, "{}", n),
            Token::Plus => write!(f, "+"),
            Token::Minus => write!(f, "-"),
            Token::Star => write!(f, "*"),
            Token::Slash => write!(f, "/"),
            Token::LParen => write!(f, "("),
            Token::RParen => write!(f, ")"),
        }
    }
}

fn tokenize(input: &str) -> Result<Vec<(Token, usize)>> {
    let chars: Vec<char> = input.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        let token = match c {
            c if c.is_whitespace() => {
                i += 1;
                continue;
            }
            '+' => Token::Plus,
            '-' => Token::Minus,
            '*' => Token::Star,
            '/' => Token::Slash,
            '(' => Token::LParen,
            ')' => Token::RParen,
            c if c.is_ascii_digit() || c == '.' => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                    i += 1;
                }
                if i < chars.len() && (chars[i] == 'e' || chars[i] == 'E') {
                    i += 1;
                    if i < chars.len() && (chars[i] == '+' || chars[i] == '-') {
                        i += 1;
                    }
                    while i < chars.len() && chars[i].is_ascii_digit() {
                        i += 1;
                    }
                }
                let text: String = chars[start..i].iter().collect();
                let n = text
                    .parse::<f64>()
                    .map_err(|_| AgentflowError::Expression(format!("invalid number '{}' at position {}", text, start)))?;
                tokens.push((Token::Num(n), start));
                continue;
            }
            other => {
                return Err(AgentflowError::Expression(format!("unexpected character '{}' at position {}", other, i)));
            }
        };
        tokens.push((token, i));
        i += 1;
    }

    Ok(tokens)
}

struct Parser {
    tokens: Vec<(Token, usize)>,
    pos: usize,
    depth: usize,
}

impl Parser {
    fn peek(&self) -> Option<(Token, usize)> {
        self.tokens.get(self.pos).copied()
    }

    fn next(&mut self) -> Result<(Token, usize)> {
        let token = self.peek().ok_or_else(|| AgentflowError::Expression("unexpected end of expression".to_string()))?;
        self.pos += 1;
        Ok(token)
    }

    // expr := term (('+' | '-') term)*
    fn expr(&mut self) -> Result<f64> {
        let mut value = self.term()?;
        while let Some((token, _)) = self.peek() {
            match token {
                Token::Plus => {
                    self.pos += 1;
                    value += self.term()?;
                }
                Token::Minus => {
                    self.pos += 1;
                    value -= self.term()?;
                }
                _ => break,
            }
        }
        Ok(value)
    }

    // term := unary (('*' | '/') unary)*
    fn term(&mut self) -> Result<f64> {
        let mut value = self.unary()?;
        while let Some((token, _)) = self.peek() {
            match token {
                Token::Star => {
                    self.pos += 1;
                    value *= self.unary()?;
                }
                Token::Slash => {
                    self.pos += 1;
                    let divisor = self.unary()?;
                    if divisor == 0.0 {
                        return Err(AgentflowError::Expression("division by zero".to_string()));
                    }
                    value /= divisor;
                }
                _ => break,
            }
        }
        Ok(value)
    }

    // unary := ('+' | '-') unary | primary
    fn unary(&mut self) -> Result<f64> {
        self.enter()?;
        let value = match self.peek() {
            Some((Token::Plus, _)) => {
                self.pos += 1;
                self.unary()
            }
            Some((Token::Minus, _)) => {
                self.pos += 1;
                self.unary().map(|v| -v)
            }
            _ => self.primary(),
        };
        self.depth -= 1;
        value
    }

    // primary := number | '(' expr ')'
    fn primary(&mut self) -> Result<f64> {
        match self.next()? {
            (Token::Num(n), _) => Ok(n),
            (Token::LParen, _) => {
                let value = self.expr()?;
                match self.next()? {
                    (Token::RParen, _) => Ok(value),
                    (token, at) => Err(AgentflowError::Expression(format!("expected ')' but found '{}' at position {}", token, at))),
                }
            }
            (token, at) => Err(AgentflowError::Expression(format!("unexpected token '{}' at position {}", token, at))),
        }
    }

    fn enter(&mut self) -> Result<()> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(AgentflowError::Expression("expression is nested too deeply".to_string()));
        }
        Ok(())
    }
}
