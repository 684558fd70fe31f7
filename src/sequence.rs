use crate::error::AppError;

pub const ORDER_ID_PREFIX: &str = "ORD";
pub const ORDER_ID_WIDTH: usize = 5;

/// Identifier issued when the order history is empty.
pub const FIRST_ORDER_ID: &str = "ORD00201";

/// Number of times order creation re-reads the latest id after losing an
/// insert race on the `orders.order_id` unique index.
pub const ALLOCATION_ATTEMPTS: u32 = 3;

/// Compute the identifier that follows `latest`.
///
/// Identifiers are the fixed alphabetic prefix followed by a zero-padded
/// decimal counter. The padding is a minimum width: once the counter outgrows
/// five digits the rendered id simply gets longer.
pub fn next_order_id(latest: Option<&str>) -> Result<String, AppError> {
    let Some(latest) = latest else {
        return Ok(FIRST_ORDER_ID.to_string());
    };
    let sequence = parse_sequence(latest)?;
    Ok(format_order_id(sequence + 1))
}

pub fn format_order_id(sequence: u64) -> String {
    format!("{ORDER_ID_PREFIX}{sequence:0width$}", width = ORDER_ID_WIDTH)
}

fn parse_sequence(id: &str) -> Result<u64, AppError> {
    let digits = id.strip_prefix(ORDER_ID_PREFIX).ok_or_else(|| {
        AppError::InvalidIdentifierFormat(format!(
            "stored order id {id:?} does not start with {ORDER_ID_PREFIX:?}"
        ))
    })?;

    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(AppError::InvalidIdentifierFormat(format!(
            "stored order id {id:?} has a non-numeric counter"
        )));
    }

    digits.parse::<u64>().map_err(|_| {
        AppError::InvalidIdentifierFormat(format!("stored order id {id:?} counter out of range"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_history_yields_seed() {
        assert_eq!(next_order_id(None).unwrap(), FIRST_ORDER_ID);
    }

    #[test]
    fn increments_and_keeps_padding() {
        assert_eq!(next_order_id(Some("ORD00201")).unwrap(), "ORD00202");
        assert_eq!(next_order_id(Some("ORD00999")).unwrap(), "ORD01000");
    }

    #[test]
    fn counter_grows_past_the_padding_width() {
        assert_eq!(next_order_id(Some("ORD99999")).unwrap(), "ORD100000");
        assert_eq!(next_order_id(Some("ORD100000")).unwrap(), "ORD100001");
    }

    #[test]
    fn rejects_foreign_prefix() {
        let err = next_order_id(Some("CBC00201")).unwrap_err();
        assert!(matches!(err, AppError::InvalidIdentifierFormat(_)));
    }

    #[test]
    fn rejects_non_numeric_counter() {
        for bad in ["ORD", "ORD12A34", "ORD 0001"] {
            let err = next_order_id(Some(bad)).unwrap_err();
            assert!(matches!(err, AppError::InvalidIdentifierFormat(_)), "{bad}");
        }
    }
}
