use std::fmt;

use rust_decimal::Decimal;
use serde::{Serialize, Serializer};

// ────────────────────────────────────────────────────────────────────────────
// CPF
// ────────────────────────────────────────────────────────────────────────────

/// Number of digits in a CPF (Brazilian individual taxpayer registry number).
pub const CPF_LEN: usize = 11;

/// A CPF that passed the shape check: exactly 11 ASCII digits.
///
/// Check digits are not verified; the DMED export is trusted for that.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Cpf(String);

impl Cpf {
    /// Parses a raw field. Surrounding whitespace is ignored; anything else
    /// (punctuation, 10 or 12 digits, empty) is rejected.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if is_valid_cpf(raw) {
            Some(Cpf(raw.to_string()))
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Cpf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for Cpf {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

/// Returns true iff `s` is exactly 11 ASCII digits.
pub fn is_valid_cpf(s: &str) -> bool {
    s.len() == CPF_LEN && s.bytes().all(|b| b.is_ascii_digit())
}

// ────────────────────────────────────────────────────────────────────────────
// Records
// ────────────────────────────────────────────────────────────────────────────

/// A dependent covered under a holder's registration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DependentRecord {
    pub cpf: Cpf,
    pub name: String,
    pub amount: Decimal,
}

/// The primary beneficiary (titular) of a registration, with its dependents.
///
/// Fields are private so `total_amount` can only move through
/// [`HolderRecord::push_dependent`]: it always equals `own_amount` plus the
/// sum of the dependents' amounts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HolderRecord {
    cpf: Cpf,
    name: String,
    own_amount: Decimal,
    dependents: Vec<DependentRecord>,
    total_amount: Decimal,
}

impl HolderRecord {
    pub fn new(cpf: Cpf, name: impl Into<String>, own_amount: Decimal) -> Self {
        Self {
            cpf,
            name: name.into(),
            own_amount,
            dependents: Vec::new(),
            total_amount: own_amount,
        }
    }

    /// Appends a dependent and adds its amount to the running total.
    pub fn push_dependent(&mut self, dependent: DependentRecord) {
        self.total_amount += dependent.amount;
        self.dependents.push(dependent);
    }

    pub fn cpf(&self) -> &Cpf {
        &self.cpf
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn own_amount(&self) -> Decimal {
        self.own_amount
    }

    pub fn dependents(&self) -> &[DependentRecord] {
        &self.dependents
    }

    pub fn total_amount(&self) -> Decimal {
        self.total_amount
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
