use serde::Serialize;

use crate::dmed::format::format_cpf;
use crate::dmed::models::{Cpf, HolderRecord};

pub const NOT_FOUND_MESSAGE: &str = "CPF do titular não foi encontrado.";

#[derive(Debug, Clone, Serialize)]
pub struct HolderMatch {
    /// Position of the holder in the session; tells repeated CPFs apart.
    pub index: usize,
    pub cpf: Cpf,
    pub cpf_formatted: String,
    pub name: String,
    /// Label for the action that generates this holder's declaration.
    pub action_label: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchResult {
    pub query_digits: String,
    pub matches: Vec<HolderMatch>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Keeps only ASCII digits, so `"123.456"` and `"123456"` search the same way.
pub fn extract_digits(query: &str) -> String {
    query.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Substring search over holder CPFs, in parse order.
///
/// A query without digits returns no matches and no message.
pub fn search_holders(holders: &[HolderRecord], query: &str) -> SearchResult {
    let query_digits = extract_digits(query);
    if query_digits.is_empty() {
        return SearchResult {
            query_digits,
            matches: vec![],
            message: None,
        };
    }

    let matches: Vec<HolderMatch> = holders
        .iter()
        .enumerate()
        .filter(|(_, h)| h.cpf().as_str().contains(query_digits.as_str()))
        .map(|(index, h)| {
            let cpf_formatted = format_cpf(h.cpf());
            HolderMatch {
                index,
                action_label: format!("Gerar PDF para {} ({})", h.name(), cpf_formatted),
                cpf: h.cpf().clone(),
                cpf_formatted,
                name: h.name().to_string(),
            }
        })
        .collect();

    let message = matches
        .is_empty()
        .then(|| NOT_FOUND_MESSAGE.to_string());

    SearchResult {
        query_digits,
        matches,
        message,
    }
}
