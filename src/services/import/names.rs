//! Counterparty name splitting
//!
//! 1C stores a customer as one free-text "Контрагент" value. The split is
//! positional: "Surname Name Patronymic...", with every token after the
//! second folded into the patronymic. A "Name Surname" source ends up with
//! swapped fields; nothing here tries to detect that ordering.

use serde::Serialize;

/// Values that mean "no value" in spreadsheet exports
const NULL_MARKERS: &[&str] = &["none", "null", "nan"];

/// Result of splitting a counterparty string
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ParsedName {
    pub name: Option<String>,
    pub surname: Option<String>,
    pub patronymic: Option<String>,
}

impl ParsedName {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.surname.is_none() && self.patronymic.is_none()
    }
}

/// True for "none"/"null"/"nan" in any letter case
pub fn is_null_marker(value: &str) -> bool {
    let value = value.trim();
    NULL_MARKERS.iter().any(|m| value.eq_ignore_ascii_case(m))
}

/// True for values made only of digits, `.`, `,`, `-` and spaces,
/// e.g. a numeric total that landed in the name column
pub fn is_disguised_number(value: &str) -> bool {
    let value = value.trim();
    !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '.' | ',' | '-' | ' '))
}

/// Whether a counterparty cell carries something worth splitting
pub fn is_usable_counterparty(value: &str) -> bool {
    let value = value.trim();
    !value.is_empty() && !is_null_marker(value) && !is_disguised_number(value)
}

/// Split a counterparty value into (name, surname, patronymic).
///
/// Total over all inputs: anything that is not a name yields an empty
/// [`ParsedName`].
pub fn parse_counterparty(value: &str) -> ParsedName {
    let tokens: Vec<&str> = value.split_whitespace().collect();
    let collapsed = tokens.join(" ");

    if collapsed.is_empty() || is_null_marker(&collapsed) || is_disguised_number(&collapsed) {
        return ParsedName::default();
    }

    match tokens.as_slice() {
        [] => ParsedName::default(),
        [surname] => ParsedName {
            name: None,
            surname: Some(surname.to_string()),
            patronymic: None,
        },
        [surname, name] => ParsedName {
            name: Some(name.to_string()),
            surname: Some(surname.to_string()),
            patronymic: None,
        },
        [surname, name, rest @ ..] => ParsedName {
            name: Some(name.to_string()),
            surname: Some(surname.to_string()),
            patronymic: Some(rest.join(" ")),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parsed(name: Option<&str>, surname: Option<&str>, patronymic: Option<&str>) -> ParsedName {
        ParsedName {
            name: name.map(str::to_string),
            surname: surname.map(str::to_string),
            patronymic: patronymic.map(str::to_string),
        }
    }

    #[test]
    fn three_tokens_are_surname_name_patronymic() {
        assert_eq!(
            parse_counterparty("Иванов Иван Петрович"),
            parsed(Some("Иван"), Some("Иванов"), Some("Петрович"))
        );
    }

    #[test]
    fn trailing_tokens_fold_into_patronymic() {
        assert_eq!(
            parse_counterparty("Məmmədov Əli Həsən oğlu"),
            parsed(Some("Əli"), Some("Məmmədov"), Some("Həsən oğlu"))
        );
    }

    #[test]
    fn two_tokens_are_surname_then_name() {
        assert_eq!(
            parse_counterparty("Иванов Иван"),
            parsed(Some("Иван"), Some("Иванов"), None)
        );
    }

    #[test]
    fn single_token_is_surname() {
        assert_eq!(parse_counterparty("Иванов"), parsed(None, Some("Иванов"), None));
    }

    #[test]
    fn whitespace_is_collapsed() {
        assert_eq!(
            parse_counterparty("  Иванов \t Иван   Петрович  "),
            parsed(Some("Иван"), Some("Иванов"), Some("Петрович"))
        );
    }

    #[test]
    fn empty_and_null_markers_yield_nothing() {
        for value in ["", "   ", "None", "NULL", "nan", " NaN "] {
            assert!(parse_counterparty(value).is_empty(), "{value:?}");
        }
    }

    #[test]
    fn disguised_numbers_yield_nothing() {
        for value in ["0.0", "123,456", "--", "100", "12 345.00", "-5"] {
            assert!(parse_counterparty(value).is_empty(), "{value:?}");
        }
    }

    #[test]
    fn digits_inside_a_name_are_kept() {
        assert_eq!(parse_counterparty("ООО Аптека 5"), parsed(Some("Аптека"), Some("ООО"), Some("5")));
    }

    #[test]
    fn usable_counterparty_checks() {
        assert!(is_usable_counterparty("Иванов"));
        assert!(!is_usable_counterparty("  "));
        assert!(!is_usable_counterparty("null"));
        assert!(!is_usable_counterparty("0.0"));
    }
}
