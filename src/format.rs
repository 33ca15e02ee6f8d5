//! Display formatting for amounts, dates and check numbers.

use chrono::NaiveDate;

/// The number of digits in a check number.
pub const CHECK_NUMBER_DIGITS: usize = 8;

/// Formats `amount` as Argentine pesos: `$ 1.234,56`, with a leading `-` for negative amounts.
pub fn format_currency(amount: f64) -> String {
    let sign = if amount < 0.0 { "-" } else { "" };
    let grouped = format_num::format_num!(",.2", amount.abs());
    // es-AR swaps the roles of the separators.
    let localized: String = grouped
        .chars()
        .map(|c| match c {
            ',' => '.',
            '.' => ',',
            other => other,
        })
        .collect();
    format!("{sign}$ {localized}")
}

/// Formats a date as `DD/MM/YYYY`.
pub fn format_date(date: NaiveDate) -> String {
    date.format("%d/%m/%Y").to_string()
}

/// Strips everything but digits and pads with leading zeros to eight digits. Longer inputs are
/// not truncated.
pub fn pad_check_number(value: &str) -> String {
    let digits: String = value.chars().filter(|c| c.is_ascii_digit()).collect();
    format!("{digits:0>width$}", width = CHECK_NUMBER_DIGITS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_currency() {
        assert_eq!(format_currency(1234.56), "$ 1.234,56");
        assert_eq!(format_currency(-60000.0), "-$ 60.000,00");
        assert_eq!(format_currency(0.0), "$ 0,00");
        assert_eq!(format_currency(1234567.891), "$ 1.234.567,89");
    }

    #[test]
    fn test_format_date() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
        assert_eq!(format_date(date), "05/03/2024");
    }

    #[test]
    fn test_pad_check_number() {
        assert_eq!(pad_check_number("12345"), "00012345");
        assert_eq!(pad_check_number("12-34"), "00001234");
        assert_eq!(pad_check_number("00012345"), "00012345");
        assert_eq!(pad_check_number("123456789"), "123456789");
        assert_eq!(pad_check_number(""), "00000000");
    }
}
