//! A small recursive-descent parser and direct interpreter for the
//! arithmetic/comparison/boolean expressions `eval`/`where` accept, e.g.
//! `"x<5"` or `"(f2>.9) & ((f8>.3) & (f8<.4))"`.

use crate::error::{BlzError, Result};
use std::collections::HashMap;
use std::iter::Peekable;
use std::str::Chars;

#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    Num(f64),
    Ident(String),
    Neg(Box<Expr>),
    Not(Box<Expr>),
    Binary(BinOp, Box<Expr>, Box<Expr>),
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
    And,
    Or,
}

impl Expr {
    /// Evaluates this expression for one row, given the named column values
    /// for that row. Booleans are represented as `0.0`/`1.0`.
    pub fn eval_row(&self, row: &HashMap<&str, f64>) -> Result<f64> {
        Ok(match self {
            Expr::Num(n) => *n,
            Expr::Ident(name) => *row.get(name.as_str()).ok_or_else(|| {
                BlzError::Value(format!("unknown identifier '{name}' in expression"))
            })?,
            Expr::Neg(e) => -e.eval_row(row)?,
            Expr::Not(e) => {
                if e.eval_row(row)? == 0.0 {
                    1.0
                } else {
                    0.0
                }
            }
            Expr::Binary(op, l, r) => {
                let lv = l.eval_row(row)?;
                let rv = r.eval_row(row)?;
                match op {
                    BinOp::Add => lv + rv,
                    BinOp::Sub => lv - rv,
                    BinOp::Mul => lv * rv,
                    BinOp::Div => lv / rv,
                    BinOp::Pow => lv.powf(rv),
                    BinOp::Lt => bool_f64(lv < rv),
                    BinOp::Le => bool_f64(lv <= rv),
                    BinOp::Gt => bool_f64(lv > rv),
                    BinOp::Ge => bool_f64(lv >= rv),
                    BinOp::Eq => bool_f64(lv == rv),
                    BinOp::Ne => bool_f64(lv != rv),
                    BinOp::And => bool_f64(lv != 0.0 && rv != 0.0),
                    BinOp::Or => bool_f64(lv != 0.0 || rv != 0.0),
                }
            }
        })
    }
}

fn bool_f64(b: bool) -> f64 {
    if b {
        1.0
    } else {
        0.0
    }
}

pub fn parse(input: &str) -> Result<Expr> {
    let mut p = Parser {
        chars: input.chars().peekable(),
    };
    let expr = p.parse_or()?;
    p.skip_ws();
    if p.chars.peek().is_some() {
        return Err(BlzError::Value(format!(
            "unexpected trailing input in expression '{input}'"
        )));
    }
    Ok(expr)
}

struct Parser<'a> {
    chars: Peekable<Chars<'a>>,
}

impl<'a> Parser<'a> {
    fn skip_ws(&mut self) {
        while matches!(self.chars.peek(), Some(c) if c.is_whitespace()) {
            self.chars.next();
        }
    }

    fn peek_char(&mut self) -> Option<char> {
        self.skip_ws();
        self.chars.peek().copied()
    }

    fn eat(&mut self, c: char) -> bool {
        if self.peek_char() == Some(c) {
            self.chars.next();
            true
        } else {
            false
        }
    }

    fn eat_str(&mut self, s: &str) -> bool {
        let save = self.chars.clone();
        for expected in s.chars() {
            if self.chars.next() != Some(expected) {
                self.chars = save;
                return false;
            }
        }
        true
    }

    // or := and (('|' | "&&"...) and)*
    fn parse_or(&mut self) -> Result<Expr> {
        let mut lhs = self.parse_and()?;
        loop {
            self.skip_ws();
            if self.eat('|') {
                let rhs = self.parse_and()?;
                lhs = Expr::Binary(BinOp::Or, Box::new(lhs), Box::new(rhs));
            } else {
                break;
            }
        }
        Ok(lhs)
    }

    fn parse_and(&mut self) -> Result<Expr> {
        let mut lhs = self.parse_cmp()?;
        loop {
            self.skip_ws();
            if self.eat('&') {
                let rhs = self.parse_cmp()?;
                lhs = Expr::Binary(BinOp::And, Box::new(lhs), Box::new(rhs));
            } else {
                break;
            }
        }
        Ok(lhs)
    }

    fn parse_cmp(&mut self) -> Result<Expr> {
        let lhs = self.parse_add()?;
        self.skip_ws();
        let op = if self.eat_str("<=") {
            Some(BinOp::Le)
        } else if self.eat_str(">=") {
            Some(BinOp::Ge)
        } else if self.eat_str("==") {
            Some(BinOp::Eq)
        } else if self.eat_str("!=") {
            Some(BinOp::Ne)
        } else if self.eat('<') {
            Some(BinOp::Lt)
        } else if self.eat('>') {
            Some(BinOp::Gt)
        } else {
            None
        };
        match op {
            Some(op) => {
                let rhs = self.parse_add()?;
                Ok(Expr::Binary(op, Box::new(lhs), Box::new(rhs)))
            }
            None => Ok(lhs),
        }
    }

    fn parse_add(&mut self) -> Result<Expr> {
        let mut lhs = self.parse_mul()?;
        loop {
            self.skip_ws();
            if self.eat('+') {
                let rhs = self.parse_mul()?;
                lhs = Expr::Binary(BinOp::Add, Box::new(lhs), Box::new(rhs));
            } else if self.eat('-') {
                let rhs = self.parse_mul()?;
                lhs = Expr::Binary(BinOp::Sub, Box::new(lhs), Box::new(rhs));
            } else {
                break;
            }
        }
        Ok(lhs)
    }

    fn parse_mul(&mut self) -> Result<Expr> {
        let mut lhs = self.parse_pow()?;
        loop {
            self.skip_ws();
            if self.eat_str("**") {
                // Belongs to the next `parse_pow`, not a mul operator; undo
                // is impossible on a char iterator so re-parse as exponent
                // of `lhs` instead, preserving right-associativity.
                let rhs = self.parse_pow()?;
                lhs = Expr::Binary(BinOp::Pow, Box::new(lhs), Box::new(rhs));
                continue;
            }
            if self.peek_char() == Some('*') {
                self.chars.next();
                let rhs = self.parse_pow()?;
                lhs = Expr::Binary(BinOp::Mul, Box::new(lhs), Box::new(rhs));
            } else if self.peek_char() == Some('/') {
                self.chars.next();
                let rhs = self.parse_pow()?;
                lhs = Expr::Binary(BinOp::Div, Box::new(lhs), Box::new(rhs));
            } else {
                break;
            }
        }
        Ok(lhs)
    }

    fn parse_pow(&mut self) -> Result<Expr> {
        let base = self.parse_unary()?;
        self.skip_ws();
        if self.eat_str("**") {
            let exp = self.parse_pow()?;
            return Ok(Expr::Binary(BinOp::Pow, Box::new(base), Box::new(exp)));
        }
        Ok(base)
    }

    fn parse_unary(&mut self) -> Result<Expr> {
        self.skip_ws();
        if self.eat('-') {
            return Ok(Expr::Neg(Box::new(self.parse_unary()?)));
        }
        if self.eat('~') || self.eat('!') {
            return Ok(Expr::Not(Box::new(self.parse_unary()?)));
        }
        self.parse_atom()
    }

    fn parse_atom(&mut self) -> Result<Expr> {
        self.skip_ws();
        if self.eat('(') {
            let inner = self.parse_or()?;
            if !self.eat(')') {
                return Err(BlzError::Value("unmatched '(' in expression".to_string()));
            }
            return Ok(inner);
        }

        match self.peek_char() {
            Some(c) if c.is_ascii_digit() || c == '.' => self.parse_number(),
            Some(c) if c.is_ascii_alphabetic() || c == '_' => self.parse_ident(),
            other => Err(BlzError::Value(format!(
                "unexpected character {other:?} in expression"
            ))),
        }
    }

    fn parse_number(&mut self) -> Result<Expr> {
        let mut s = String::new();
        while let Some(c) = self.chars.peek().copied() {
            if c.is_ascii_digit() || c == '.' {
                s.push(c);
                self.chars.next();
            } else {
                break;
            }
        }
        s.parse::<f64>()
            .map(Expr::Num)
            .map_err(|_| BlzError::Value(format!("invalid number literal '{s}'")))
    }

    fn parse_ident(&mut self) -> Result<Expr> {
        let mut s = String::new();
        while let Some(c) = self.chars.peek().copied() {
            if c.is_ascii_alphanumeric() || c == '_' {
                s.push(c);
                self.chars.next();
            } else {
                break;
            }
        }
        Ok(Expr::Ident(s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(pairs: &[(&str, f64)]) -> HashMap<&str, f64> {
        pairs.iter().cloned().collect()
    }

    #[test]
    fn simple_comparison() {
        let e = parse("x<5").unwrap();
        assert_eq!(e.eval_row(&row(&[("x", 3.0)])).unwrap(), 1.0);
        assert_eq!(e.eval_row(&row(&[("x", 7.0)])).unwrap(), 0.0);
    }

    #[test]
    fn arithmetic_precedence() {
        let e = parse("2*x*x*x+.3*y**2+z+1").unwrap();
        let v = e
            .eval_row(&row(&[("x", 2.0), ("y", 1.0), ("z", 1.0)]))
            .unwrap();
        assert_eq!(v, 2.0 * 8.0 + 0.3 + 1.0 + 1.0);
    }

    #[test]
    fn boolean_combination() {
        let e = parse("(f2>.9) & ((f8>.3) & (f8<.4))").unwrap();
        assert_eq!(
            e.eval_row(&row(&[("f2", 0.95), ("f8", 0.35)])).unwrap(),
            1.0
        );
        assert_eq!(
            e.eval_row(&row(&[("f2", 0.5), ("f8", 0.35)])).unwrap(),
            0.0
        );
    }
}
