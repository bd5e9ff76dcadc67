//! WHERE-filter grammar: `Expr := Rel ( 'AND' Rel )*`,
//! `Rel := Path Op Literal`.
//!
//! Anchored token regexes, applied left-to-right; whitespace between tokens
//! is optional except around `AND`. Booleans only combine with `=` and `!=`.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{Error, Result};
use crate::path::PathExpr;

static PATH_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9@*?|/_~.:\-]*").unwrap());
static OP_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(!=|<=|>=|=|<|>)").unwrap());
static INT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9]{1,10}").unwrap());
static BOOL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(true|false)\b").unwrap());
static STR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^'([^'\x22\\]{0,255})'").unwrap());
static AND_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[ \t]+AND[ \t]+").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl CompareOp {
    pub fn is_equality(self) -> bool {
        matches!(self, CompareOp::Eq | CompareOp::Ne)
    }
}

/// A literal, typed by its lexical form.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Int(i64),
    Bool(bool),
    Str(String),
}

/// One `path op literal` clause.
#[derive(Debug, Clone)]
pub struct Relational {
    pub raw_path: String,
    pub path: PathExpr,
    pub op: CompareOp,
    pub literal: Literal,
}

/// A parsed conjunction of relationals.
#[derive(Debug, Clone)]
pub struct WhereFilter {
    raw: String,
    pub relationals: Vec<Relational>,
}

impl WhereFilter {
    pub fn parse(input: &str) -> Result<WhereFilter> {
        let mut rest = input;
        let mut relationals = Vec::new();
        loop {
            let (rel, after) = parse_relational(rest)?;
            relationals.push(rel);
            rest = after;
            match AND_RE.find(rest) {
                Some(m) => rest = &rest[m.end()..],
                None => break,
            }
        }
        if !skip_space(rest).is_empty() {
            return Err(syntax(skip_space(rest)));
        }
        Ok(WhereFilter {
            raw: input.to_string(),
            relationals,
        })
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }
}

fn skip_space(input: &str) -> &str {
    input.trim_start_matches(|c: char| c == ' ' || c == '\t')
}

fn parse_relational(input: &str) -> Result<(Relational, &str)> {
    let rest = skip_space(input);
    let path_match = PATH_RE.find(rest).ok_or_else(|| syntax(rest))?;
    let raw_path = path_match.as_str().to_string();
    let path = PathExpr::parse(&raw_path)?;
    let rest = skip_space(&rest[path_match.end()..]);

    let op_match = OP_RE.find(rest).ok_or_else(|| syntax(rest))?;
    let op = match op_match.as_str() {
        "=" => CompareOp::Eq,
        "!=" => CompareOp::Ne,
        "<" => CompareOp::Lt,
        "<=" => CompareOp::Le,
        ">" => CompareOp::Gt,
        ">=" => CompareOp::Ge,
        _ => unreachable!("operator alternation is closed"),
    };
    let rest = skip_space(&rest[op_match.end()..]);

    let (literal, rest) = parse_literal(rest)?;

    if matches!(literal, Literal::Bool(_)) && !op.is_equality() {
        return Err(Error::Type(format!(
            "boolean operand for {} only combines with = and !=",
            raw_path
        )));
    }

    Ok((
        Relational {
            raw_path,
            path,
            op,
            literal,
        },
        rest,
    ))
}

fn parse_literal(input: &str) -> Result<(Literal, &str)> {
    if let Some(caps) = STR_RE.captures(input) {
        let end = caps.get(0).expect("group 0 always participates").end();
        return Ok((Literal::Str(caps[1].to_string()), &input[end..]));
    }
    if let Some(caps) = BOOL_RE.captures(input) {
        let end = caps.get(0).expect("group 0 always participates").end();
        return Ok((Literal::Bool(&caps[1] == "true"), &input[end..]));
    }
    if let Some(m) = INT_RE.find(input) {
        let value: i64 = m.as_str().parse().map_err(|_| {
            Error::Type(format!("integer literal out of range: {}", m.as_str()))
        })?;
        return Ok((Literal::Int(value), &input[m.end()..]));
    }
    Err(syntax(input))
}

fn syntax(offending: &str) -> Error {
    Error::Syntax {
        context: "where-filter",
        offending: offending.to_string(),
    }
}
