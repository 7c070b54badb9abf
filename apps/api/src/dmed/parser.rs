//! DMED record parser.
//!
//! Rebuilds the holder → dependent hierarchy from the flat, pipe-delimited
//! export. Only two record types matter here:
//!
//! ```text
//! TOP|cpf|name|amount_in_cents|...
//! DTOP|cpf|birth_date|name|relationship|amount_in_cents|...
//! ```
//!
//! Every other record (`DMED`, `RESPO`, `DECPJ`, `RTOP`, `FIMDmed`, ...) is skipped.
//! Problems with individual records never abort the run; they are collected
//! as [`ParseWarning`]s next to the holders that did parse.

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, warn};

use crate::dmed::models::{Cpf, DependentRecord, HolderRecord};

const DELIMITER: char = '|';

/// Fifteen digits of cents, just under a trillion reais.
pub const MAX_CENTS: i64 = 999_999_999_999_999;

const HOLDER_MIN_FIELDS: usize = 4;
const DEPENDENT_MIN_FIELDS: usize = 6;

// ────────────────────────────────────────────────────────────────────────────
// Types
// ────────────────────────────────────────────────────────────────────────────

/// Record tag, matched against the whole first field (never as a prefix).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RecordTag {
    #[serde(rename = "TOP")]
    Holder,
    #[serde(rename = "DTOP")]
    Dependent,
}

impl RecordTag {
    fn from_field(field: &str) -> Option<Self> {
        match field.trim() {
            "TOP" => Some(RecordTag::Holder),
            "DTOP" => Some(RecordTag::Dependent),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RecordTag::Holder => "TOP",
            RecordTag::Dependent => "DTOP",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WarningKind {
    InvalidCpf { value: String },
    MissingFields { found: usize, required: usize },
    InvalidAmount { value: String },
}

/// A rejected record. The line number is 1-based.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParseWarning {
    pub line: usize,
    pub tag: RecordTag,
    #[serde(flatten)]
    pub kind: WarningKind,
    pub message: String,
}

impl ParseWarning {
    fn new(line: usize, tag: RecordTag, kind: WarningKind) -> Self {
        let message = match &kind {
            WarningKind::InvalidCpf { value } => format!("CPF inválido encontrado: {value}"),
            WarningKind::MissingFields { found, required } => format!(
                "Linha {line}: registro {} com {found} campos (mínimo {required})",
                tag.as_str()
            ),
            WarningKind::InvalidAmount { value } => format!(
                "Linha {line}: valor inválido no registro {}: {value}",
                tag.as_str()
            ),
        };
        Self {
            line,
            tag,
            kind,
            message,
        }
    }
}

impl fmt::Display for ParseWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ParseOutcome {
    pub holders: Vec<HolderRecord>,
    pub warnings: Vec<ParseWarning>,
}

// ────────────────────────────────────────────────────────────────────────────
// Parser
// ────────────────────────────────────────────────────────────────────────────

/// Parses the full text of a DMED export.
///
/// A `TOP` line always finalizes the open holder before it is validated, so a
/// malformed `TOP` drops only itself: the previous holder is kept and no
/// holder stays open (its `DTOP` lines are then ignored). `DTOP` lines with no
/// open holder are skipped without a warning.
pub fn parse_dmed(content: &str) -> ParseOutcome {
    let mut outcome = ParseOutcome::default();
    let mut current: Option<HolderRecord> = None;

    for (idx, raw_line) in content.split('\n').enumerate() {
        let line_no = idx + 1;
        let line = raw_line.trim();
        if line.is_empty() {
            continue;
        }

        let fields: Vec<&str> = line.split(DELIMITER).map(str::trim).collect();
        let Some(tag) = RecordTag::from_field(fields[0]) else {
            continue;
        };

        match tag {
            RecordTag::Holder => {
                if let Some(done) = current.take() {
                    outcome.holders.push(done);
                }
                match parse_holder(&fields) {
                    Ok(holder) => current = Some(holder),
                    Err(kind) => reject(&mut outcome, line_no, tag, kind),
                }
            }
            RecordTag::Dependent => {
                let Some(holder) = current.as_mut() else {
                    debug!(line = line_no, "DTOP without an open holder, skipping");
                    continue;
                };
                match parse_dependent(&fields) {
                    Ok(dependent) => holder.push_dependent(dependent),
                    Err(kind) => reject(&mut outcome, line_no, tag, kind),
                }
            }
        }
    }

    if let Some(done) = current.take() {
        outcome.holders.push(done);
    }
    outcome
}

fn reject(outcome: &mut ParseOutcome, line: usize, tag: RecordTag, kind: WarningKind) {
    let warning = ParseWarning::new(line, tag, kind);
    warn!(line, tag = tag.as_str(), "{}", warning.message);
    outcome.warnings.push(warning);
}

fn parse_holder(fields: &[&str]) -> Result<HolderRecord, WarningKind> {
    require_fields(fields, HOLDER_MIN_FIELDS)?;
    let cpf = parse_cpf(fields[1])?;
    let amount = parse_cents(fields[3])?;
    Ok(HolderRecord::new(cpf, fields[2], amount))
}

fn parse_dependent(fields: &[&str]) -> Result<DependentRecord, WarningKind> {
    require_fields(fields, DEPENDENT_MIN_FIELDS)?;
    let cpf = parse_cpf(fields[1])?;
    let amount = parse_cents(fields[5])?;
    Ok(DependentRecord {
        cpf,
        name: fields[3].to_string(),
        amount,
    })
}

fn require_fields(fields: &[&str], required: usize) -> Result<(), WarningKind> {
    if fields.len() < required {
        return Err(WarningKind::MissingFields {
            found: fields.len(),
            required,
        });
    }
    Ok(())
}

fn parse_cpf(field: &str) -> Result<Cpf, WarningKind> {
    Cpf::parse(field).ok_or_else(|| WarningKind::InvalidCpf {
        value: field.to_string(),
    })
}

/// Converts an amount stored in cents into currency units (`12345` → `123.45`).
///
/// Fields beyond [`MAX_CENTS`] in magnitude are rejected, which keeps every
/// holder total far inside `Decimal`'s range.
pub fn parse_cents(field: &str) -> Result<Decimal, WarningKind> {
    let invalid = || WarningKind::InvalidAmount {
        value: field.to_string(),
    };
    let cents = Decimal::from_str(field.trim()).map_err(|_| invalid())?;
    if cents.abs() > Decimal::from(MAX_CENTS) {
        return Err(invalid());
    }
    Ok(cents / Decimal::ONE_HUNDRED)
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
