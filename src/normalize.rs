// 🧹 Value normalization
// Locale amounts ("1.234,56") → f64, noise tokens stripped from free text

use thiserror::Error;

/// Why an amount string was rejected
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AmountError {
    #[error("empty amount")]
    Empty,

    #[error("not a number")]
    NotANumber,

    #[error("not a finite number")]
    NotFinite,
}

/// Parse a Danish-formatted amount.
///
/// `.` is a thousands separator and is dropped, `,` is the decimal mark.
/// Surrounding whitespace is ignored. Infinity and NaN are rejected so
/// every accepted amount is finite.
///
/// ```
/// use ledger_ingest::parse_amount;
/// assert_eq!(parse_amount("1.234,56").unwrap(), 1234.56);
/// assert_eq!(parse_amount("-50,00").unwrap(), -50.0);
/// ```
pub fn parse_amount(raw: &str) -> Result<f64, AmountError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(AmountError::Empty);
    }

    let canonical = trimmed.replace('.', "").replace(',', ".");
    let value: f64 = canonical.parse().map_err(|_| AmountError::NotANumber)?;

    if value.is_finite() {
        Ok(value)
    } else {
        Err(AmountError::NotFinite)
    }
}

/// Remove every noise token from `text`, one token at a time in the given order.
pub fn strip_tokens<S: AsRef<str>>(text: &str, tokens: &[S]) -> String {
    let mut cleaned = text.to_string();
    for token in tokens {
        let token = token.as_ref();
        if !token.is_empty() && cleaned.contains(token) {
            cleaned = cleaned.replace(token, "");
        }
    }
    cleaned
}

/// Strip the statement export's stray `))))` and `)))` runs.
pub fn clean_text(text: &str) -> String {
    strip_tokens(text, &["))))", ")))"])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_amount_thousands_and_decimals() {
        assert_eq!(parse_amount("1.234,56"), Ok(1234.56));
        assert_eq!(parse_amount("-50,00"), Ok(-50.0));
        assert_eq!(parse_amount("0,00"), Ok(0.0));
        assert_eq!(parse_amount("-1.000.000,5"), Ok(-1_000_000.5));
        assert_eq!(parse_amount("42"), Ok(42.0));
    }

    #[test]
    fn test_parse_amount_trims_whitespace() {
        assert_eq!(parse_amount("  -12,30 "), Ok(-12.3));
    }

    #[test]
    fn test_parse_amount_rejects_garbage() {
        assert_eq!(parse_amount("abc"), Err(AmountError::NotANumber));
        assert_eq!(parse_amount(""), Err(AmountError::Empty));
        assert_eq!(parse_amount("   "), Err(AmountError::Empty));
        assert_eq!(parse_amount("12,3,4"), Err(AmountError::NotANumber));
        assert_eq!(parse_amount("kr 10,00"), Err(AmountError::NotANumber));
    }

    #[test]
    fn test_parse_amount_rejects_non_finite() {
        assert_eq!(parse_amount("inf"), Err(AmountError::NotFinite));
        assert_eq!(parse_amount("-infinity"), Err(AmountError::NotFinite));
        assert_eq!(parse_amount("NaN"), Err(AmountError::NotFinite));
    }

    #[test]
    fn test_amount_error_messages() {
        assert_eq!(AmountError::Empty.to_string(), "empty amount");
        assert_eq!(AmountError::NotANumber.to_string(), "not a number");
        assert_eq!(AmountError::NotFinite.to_string(), "not a finite number");
    }

    #[test]
    fn test_clean_text_examples() {
        assert_eq!(clean_text("Payment))))"), "Payment");
        assert_eq!(clean_text("Payment)))"), "Payment");
        assert_eq!(clean_text("Fee)))) extra)))"), "Fee extra");
    }

    #[test]
    fn test_clean_text_leaves_other_text_alone() {
        assert_eq!(clean_text("  Netto (Aarhus) "), "  Netto (Aarhus) ");
        assert_eq!(clean_text("a))b"), "a))b");
        assert_eq!(clean_text("LIDL"), "LIDL");
    }

    #[test]
    fn test_clean_text_long_runs() {
        // 4s go first, a leftover run of 3 goes next, shorter leftovers stay
        assert_eq!(clean_text(")))))"), ")");
        assert_eq!(clean_text("))))))"), "))");
        assert_eq!(clean_text(")))))))"), "");
    }

    #[test]
    fn test_clean_text_idempotent() {
        let samples = [
            "Payment))))",
            "Fee)))) extra)))",
            ")))))",
            "))))))",
            "x)) ))) ))))y",
            "Dankort-køb 7-Eleven))))",
            "",
        ];
        for s in samples {
            let once = clean_text(s);
            assert_eq!(clean_text(&once), once, "not idempotent for {s:?}");
        }
    }

    #[test]
    fn test_strip_tokens_order_matters() {
        // Short token first eats into the long one
        assert_eq!(strip_tokens("A))))", &[")))", "))))"]), "A)");
        assert_eq!(strip_tokens("A))))", &["))))", ")))"]), "A");
        // Empty tokens are ignored
        assert_eq!(strip_tokens("A", &[""]), "A");
    }
}
