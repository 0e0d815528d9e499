//! A small expression language for formula fields.
//!
//! Grammar (lowest precedence first):
//!
//! ```text
//! expr    := concat
//! concat  := sum ('&' sum)*
//! sum     := product (('+' | '-') product)*
//! product := unary (('*' | '/') unary)*
//! unary   := '-' unary | atom
//! atom    := number | string | '{' uuid '}' | '(' expr ')'
//! ```
//!
//! Field references resolve against the record's current cell values.
//! Missing or null references evaluate to null, which renders as zero in
//! arithmetic and the empty string in concatenation.

use std::collections::HashMap;

use uuid::Uuid;

/// Error produced while parsing or evaluating a formula expression.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FormulaError {
    #[error("unexpected character `{0}` at offset {1}")]
    UnexpectedChar(char, usize),
    #[error("unexpected end of expression")]
    UnexpectedEnd,
    #[error("malformed field reference")]
    BadFieldRef,
    #[error("unterminated string literal")]
    UnterminatedString,
    #[error("trailing input after expression")]
    TrailingInput,
    #[error("division by zero")]
    DivisionByZero,
    #[error("operand is not numeric")]
    NotNumeric,
}

/// A parsed formula expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(f64),
    Text(String),
    FieldRef(Uuid),
    Neg(Box<Expr>),
    Add(Box<Expr>, Box<Expr>),
    Sub(Box<Expr>, Box<Expr>),
    Mul(Box<Expr>, Box<Expr>),
    Div(Box<Expr>, Box<Expr>),
    Concat(Box<Expr>, Box<Expr>),
}

impl Expr {
    /// Parses an expression from its source text.
    pub fn parse(source: &str) -> Result<Self, FormulaError> {
        let mut parser = Parser {
            chars: source.char_indices().collect(),
            pos: 0,
        };
        let expr = parser.concat()?;
        parser.skip_whitespace();
        if parser.pos < parser.chars.len() {
            return Err(FormulaError::TrailingInput);
        }
        Ok(expr)
    }

    /// Collects every field id the expression references.
    pub fn dependencies(&self) -> Vec<Uuid> {
        let mut deps = Vec::new();
        self.collect_dependencies(&mut deps);
        deps
    }

    fn collect_dependencies(&self, deps: &mut Vec<Uuid>) {
        match self {
            Self::FieldRef(id) => {
                if !deps.contains(id) {
                    deps.push(*id);
                }
            }
            Self::Neg(inner) => inner.collect_dependencies(deps),
            Self::Add(lhs, rhs)
            | Self::Sub(lhs, rhs)
            | Self::Mul(lhs, rhs)
            | Self::Div(lhs, rhs)
            | Self::Concat(lhs, rhs) => {
                lhs.collect_dependencies(deps);
                rhs.collect_dependencies(deps);
            }
            Self::Number(_) | Self::Text(_) => {}
        }
    }

    /// Evaluates the expression against a record's cell values.
    pub fn evaluate(
        &self,
        values: &HashMap<Uuid, serde_json::Value>,
    ) -> Result<serde_json::Value, FormulaError> {
        Ok(self.eval_inner(values)?.into_json())
    }

    fn eval_inner(
        &self,
        values: &HashMap<Uuid, serde_json::Value>,
    ) -> Result<Operand, FormulaError> {
        match self {
            Self::Number(n) => Ok(Operand::Number(*n)),
            Self::Text(s) => Ok(Operand::Text(s.clone())),
            Self::FieldRef(id) => Ok(Operand::from_json(values.get(id))),
            Self::Neg(inner) => {
                let value = inner.eval_inner(values)?.as_number()?;
                Ok(Operand::Number(-value))
            }
            Self::Add(lhs, rhs) => Ok(Operand::Number(
                lhs.eval_inner(values)?.as_number()? + rhs.eval_inner(values)?.as_number()?,
            )),
            Self::Sub(lhs, rhs) => Ok(Operand::Number(
                lhs.eval_inner(values)?.as_number()? - rhs.eval_inner(values)?.as_number()?,
            )),
            Self::Mul(lhs, rhs) => Ok(Operand::Number(
                lhs.eval_inner(values)?.as_number()? * rhs.eval_inner(values)?.as_number()?,
            )),
            Self::Div(lhs, rhs) => {
                let divisor = rhs.eval_inner(values)?.as_number()?;
                if divisor == 0.0 {
                    return Err(FormulaError::DivisionByZero);
                }
                Ok(Operand::Number(lhs.eval_inner(values)?.as_number()? / divisor))
            }
            Self::Concat(lhs, rhs) => {
                let mut text = lhs.eval_inner(values)?.into_text();
                text.push_str(&rhs.eval_inner(values)?.into_text());
                Ok(Operand::Text(text))
            }
        }
    }
}

/// Runtime operand during evaluation.
enum Operand {
    Number(f64),
    Text(String),
    Null,
}

impl Operand {
    fn from_json(value: Option<&serde_json::Value>) -> Self {
        match value {
            Some(serde_json::Value::Number(n)) => {
                Self::Number(n.as_f64().unwrap_or_default())
            }
            Some(serde_json::Value::String(s)) => Self::Text(s.clone()),
            Some(serde_json::Value::Bool(b)) => Self::Number(if *b { 1.0 } else { 0.0 }),
            _ => Self::Null,
        }
    }

    fn as_number(&self) -> Result<f64, FormulaError> {
        match self {
            Self::Number(n) => Ok(*n),
            Self::Null => Ok(0.0),
            Self::Text(s) => s.trim().parse().map_err(|_| FormulaError::NotNumeric),
        }
    }

    fn into_text(self) -> String {
        match self {
            Self::Number(n) => format_number(n),
            Self::Text(s) => s,
            Self::Null => String::new(),
        }
    }

    fn into_json(self) -> serde_json::Value {
        match self {
            Self::Number(n) => serde_json::json!(n),
            Self::Text(s) => serde_json::Value::String(s),
            Self::Null => serde_json::Value::Null,
        }
    }
}

/// Renders a number without a trailing `.0` for integral values.
fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

struct Parser {
    chars: Vec<(usize, char)>,
    pos: usize,
}

impl Parser {
    fn skip_whitespace(&mut self) {
        while self
            .chars
            .get(self.pos)
            .is_some_and(|(_, c)| c.is_whitespace())
        {
            self.pos += 1;
        }
    }

    fn peek(&mut self) -> Option<char> {
        self.skip_whitespace();
        self.chars.get(self.pos).map(|(_, c)| *c)
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        Some(c)
    }

    fn concat(&mut self) -> Result<Expr, FormulaError> {
        let mut lhs = self.sum()?;
        while self.peek() == Some('&') {
            self.bump();
            let rhs = self.sum()?;
            lhs = Expr::Concat(Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn sum(&mut self) -> Result<Expr, FormulaError> {
        let mut lhs = self.product()?;
        loop {
            match self.peek() {
                Some('+') => {
                    self.bump();
                    let rhs = self.product()?;
                    lhs = Expr::Add(Box::new(lhs), Box::new(rhs));
                }
                Some('-') => {
                    self.bump();
                    let rhs = self.product()?;
                    lhs = Expr::Sub(Box::new(lhs), Box::new(rhs));
                }
                _ => return Ok(lhs),
            }
        }
    }

    fn product(&mut self) -> Result<Expr, FormulaError> {
        let mut lhs = self.unary()?;
        loop {
            match self.peek() {
                Some('*') => {
                    self.bump();
                    let rhs = self.unary()?;
                    lhs = Expr::Mul(Box::new(lhs), Box::new(rhs));
                }
                Some('/') => {
                    self.bump();
                    let rhs = self.unary()?;
                    lhs = Expr::Div(Box::new(lhs), Box::new(rhs));
                }
                _ => return Ok(lhs),
            }
        }
    }

    fn unary(&mut self) -> Result<Expr, FormulaError> {
        if self.peek() == Some('-') {
            self.bump();
            return Ok(Expr::Neg(Box::new(self.unary()?)));
        }
        self.atom()
    }

    fn atom(&mut self) -> Result<Expr, FormulaError> {
        match self.peek() {
            Some('(') => {
                self.bump();
                let expr = self.concat()?;
                if self.bump() != Some(')') {
                    return Err(FormulaError::UnexpectedEnd);
                }
                Ok(expr)
            }
            Some('{') => self.field_ref(),
            Some('"') => self.string_literal(),
            Some(c) if c.is_ascii_digit() || c == '.' => self.number(),
            Some(c) => {
                let offset = self.chars.get(self.pos).map(|(i, _)| *i).unwrap_or(0);
                Err(FormulaError::UnexpectedChar(c, offset))
            }
            None => Err(FormulaError::UnexpectedEnd),
        }
    }

    fn field_ref(&mut self) -> Result<Expr, FormulaError> {
        self.bump(); // consume '{'
        let mut raw = String::new();
        loop {
            match self.chars.get(self.pos).map(|(_, c)| *c) {
                Some('}') => {
                    self.pos += 1;
                    break;
                }
                Some(c) => {
                    raw.push(c);
                    self.pos += 1;
                }
                None => return Err(FormulaError::BadFieldRef),
            }
        }
        let id = Uuid::parse_str(raw.trim()).map_err(|_| FormulaError::BadFieldRef)?;
        Ok(Expr::FieldRef(id))
    }

    fn string_literal(&mut self) -> Result<Expr, FormulaError> {
        self.bump(); // consume opening quote
        let mut text = String::new();
        loop {
            match self.chars.get(self.pos).map(|(_, c)| *c) {
                Some('"') => {
                    self.pos += 1;
                    return Ok(Expr::Text(text));
                }
                Some(c) => {
                    text.push(c);
                    self.pos += 1;
                }
                None => return Err(FormulaError::UnterminatedString),
            }
        }
    }

    fn number(&mut self) -> Result<Expr, FormulaError> {
        self.skip_whitespace();
        let start = self.pos;
        while self
            .chars
            .get(self.pos)
            .is_some_and(|(_, c)| c.is_ascii_digit() || *c == '.')
        {
            self.pos += 1;
        }
        let raw: String = self.chars[start..self.pos].iter().map(|(_, c)| *c).collect();
        raw.parse()
            .map(Expr::Number)
            .map_err(|_| FormulaError::NotNumeric)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval(source: &str, values: &HashMap<Uuid, serde_json::Value>) -> serde_json::Value {
        Expr::parse(source).unwrap().evaluate(values).unwrap()
    }

    #[test]
    fn arithmetic_precedence() {
        let values = HashMap::new();
        assert_eq!(eval("1 + 2 * 3", &values), serde_json::json!(7.0));
        assert_eq!(eval("(1 + 2) * 3", &values), serde_json::json!(9.0));
        assert_eq!(eval("-4 + 10", &values), serde_json::json!(6.0));
    }

    #[test]
    fn field_references_resolve() {
        let id = Uuid::new_v4();
        let mut values = HashMap::new();
        values.insert(id, serde_json::json!(21));

        assert_eq!(
            eval(&format!("{{{}}} * 2", id), &values),
            serde_json::json!(42.0)
        );
    }

    #[test]
    fn missing_reference_is_zero_in_arithmetic() {
        let id = Uuid::new_v4();
        let values = HashMap::new();
        assert_eq!(
            eval(&format!("{{{}}} + 5", id), &values),
            serde_json::json!(5.0)
        );
    }

    #[test]
    fn concat_stringifies() {
        let id = Uuid::new_v4();
        let mut values = HashMap::new();
        values.insert(id, serde_json::json!("Ana"));

        assert_eq!(
            eval(&format!("\"Hi \" & {{{}}}", id), &values),
            serde_json::json!("Hi Ana")
        );
        assert_eq!(eval("1 + 1 & \"!\"", &values), serde_json::json!("2!"));
    }

    #[test]
    fn division_by_zero_fails() {
        let values = HashMap::new();
        let expr = Expr::parse("1 / 0").unwrap();
        assert_eq!(expr.evaluate(&values), Err(FormulaError::DivisionByZero));
    }

    #[test]
    fn dependencies_are_deduplicated() {
        let id = Uuid::new_v4();
        let expr = Expr::parse(&format!("{{{id}}} + {{{id}}}")).unwrap();
        assert_eq!(expr.dependencies(), vec![id]);
    }

    #[test]
    fn rejects_malformed_input() {
        assert!(Expr::parse("1 +").is_err());
        assert!(Expr::parse("{not-a-uuid}").is_err());
        assert!(Expr::parse("\"open").is_err());
        assert!(Expr::parse("1 2").is_err());
    }
}
