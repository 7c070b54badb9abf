//! pt-BR display formatting for CPFs, currency and dates.

use chrono::{Datelike, NaiveDate};
use rust_decimal::{Decimal, RoundingStrategy};

use crate::dmed::models::Cpf;

const MONTHS_PT_BR: [&str; 12] = [
    "janeiro",
    "fevereiro",
    "março",
    "abril",
    "maio",
    "junho",
    "julho",
    "agosto",
    "setembro",
    "outubro",
    "novembro",
    "dezembro",
];

/// `12345678901` → `123.456.789-01`
pub fn format_cpf(cpf: &Cpf) -> String {
    let d = cpf.as_str();
    format!("{}.{}.{}-{}", &d[0..3], &d[3..6], &d[6..9], &d[9..11])
}

/// Brazilian real, e.g. `R$ 1.234,56`. Rounds half away from zero to centavos.
pub fn format_brl(value: Decimal) -> String {
    let rounded = value
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
        .abs();
    // Text-based, so every `Decimal` formats, `Decimal::MAX` included.
    let text = rounded.to_string();
    let (int_part, frac) = text.split_once('.').unwrap_or((text.as_str(), ""));
    let frac_part = format!("{frac:0<2}");

    let sign = if value.is_sign_negative() && !rounded.is_zero() {
        "-"
    } else {
        ""
    };
    format!("{sign}R$ {},{frac_part}", group_thousands(int_part))
}

fn group_thousands(int_part: &str) -> String {
    let mut out = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            out.push('.');
        }
        out.push(ch);
    }
    out
}

/// `18 de outubro de 2026`
pub fn format_long_date_pt_br(date: NaiveDate) -> String {
    let month = MONTHS_PT_BR[date.month0() as usize];
    format!("{} de {} de {}", date.day(), month, date.year())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_cpf_mask() {
        let cpf = Cpf::parse("12345678901").unwrap();
        assert_eq!(format_cpf(&cpf), "123.456.789-01");
    }

    #[test]
    fn test_format_brl_small_values() {
        assert_eq!(format_brl(Decimal::ZERO), "R$ 0,00");
        assert_eq!(format_brl(Decimal::new(5, 2)), "R$ 0,05");
        assert_eq!(format_brl(Decimal::new(12345, 2)), "R$ 123,45");
    }

    #[test]
    fn test_format_brl_groups_thousands() {
        assert_eq!(format_brl(Decimal::new(123456, 2)), "R$ 1.234,56");
        assert_eq!(format_brl(Decimal::new(123456789, 2)), "R$ 1.234.567,89");
        assert_eq!(format_brl(Decimal::new(100000000, 2)), "R$ 1.000.000,00");
    }

    #[test]
    fn test_format_brl_rounds_and_signs() {
        assert_eq!(format_brl(Decimal::new(10005, 3)), "R$ 10,01");
        assert_eq!(format_brl(Decimal::new(-2550, 2)), "-R$ 25,50");
        assert_eq!(format_brl(Decimal::new(80, 0)), "R$ 80,00");
    }

    #[test]
    fn test_format_brl_extreme_values() {
        assert_eq!(
            format_brl(Decimal::MAX),
            "R$ 79.228.162.514.264.337.593.543.950.335,00"
        );
        assert_eq!(
            format_brl(Decimal::new(999_999_999_999_999, 2)),
            "R$ 9.999.999.999.999,99"
        );
        assert_eq!(format_brl(Decimal::new(-1, 3)), "R$ 0,00");
    }

    #[test]
    fn test_format_long_date() {
        let date = NaiveDate::from_ymd_opt(2026, 10, 18).unwrap();
        assert_eq!(format_long_date_pt_br(date), "18 de outubro de 2026");
        let date = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
        assert_eq!(format_long_date_pt_br(date), "1 de março de 2025");
    }
}
