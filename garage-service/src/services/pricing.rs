//! Line item pricing.
//!
//! Amounts are stored as `NUMERIC(12, 2)`, so every submitted amount is
//! rounded to cents before any arithmetic and anything larger than the
//! column can hold is refused.

use crate::models::{LineItemInput, NewLineItem};
use rust_decimal::{Decimal, RoundingStrategy};
use thiserror::Error;

/// Upper bound on a line's quantity.
pub const MAX_LINE_QUANTITY: i32 = 1_000_000;

/// Largest magnitude a stored amount can have.
pub fn max_amount() -> Decimal {
    Decimal::new(999_999_999_999, 2)
}

pub fn in_range(value: Decimal) -> bool {
    value.abs() <= max_amount()
}

/// Round to cents, half away from zero, matching the database.
pub fn to_cents(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Why a line could not be priced.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PricingError {
    #[error("must be between 0 and 1000000")]
    Quantity,

    #[error("is out of range")]
    Amount(&'static str),

    #[error("is out of range")]
    Total,
}

impl PricingError {
    /// Input field the error is about.
    pub fn field(&self) -> &'static str {
        match self {
            PricingError::Quantity => "quantity",
            PricingError::Amount(field) => *field,
            PricingError::Total => "line_total",
        }
    }
}

fn checked_amount(
    field: &'static str,
    value: Option<Decimal>,
) -> Result<Option<Decimal>, PricingError> {
    match value {
        Some(amount) if !in_range(amount) => Err(PricingError::Amount(field)),
        other => Ok(other.map(to_cents)),
    }
}

/// Unit price before discount: the explicit original price, then the unit
/// `price`, then the manual selling price, then zero.
pub fn original_price(input: &LineItemInput) -> Decimal {
    input
        .original_price
        .or(input.price)
        .or(input.manual_selling_price)
        .unwrap_or(Decimal::ZERO)
}

/// `quantity * (original_price - discount_value)`, or `None` when the result
/// does not fit a stored amount.
pub fn line_total(quantity: i32, original_price: Decimal, discount_value: Decimal) -> Option<Decimal> {
    original_price
        .checked_sub(discount_value)?
        .checked_mul(Decimal::from(quantity))
        .filter(|total| in_range(*total))
}

/// Price a submitted line. `discounted_price` mirrors `line_total`.
pub fn price_line_item(input: &LineItemInput, sort_order: i32) -> Result<NewLineItem, PricingError> {
    let quantity = input.quantity.unwrap_or(0);
    if !(0..=MAX_LINE_QUANTITY).contains(&quantity) {
        return Err(PricingError::Quantity);
    }

    let manual_acquisition_price =
        checked_amount("manual_acquisition_price", input.manual_acquisition_price)?;
    let manual_selling_price = checked_amount("manual_selling_price", input.manual_selling_price)?;
    checked_amount("original_price", input.original_price)?;
    checked_amount("price", input.price)?;
    let discount = checked_amount("discount_value", input.discount_value)?.unwrap_or(Decimal::ZERO);

    let original = to_cents(original_price(input));
    let total = line_total(quantity, original, discount).ok_or(PricingError::Total)?;

    Ok(NewLineItem {
        part_id: input.part_id,
        manual_part_name: input.manual_part_name.clone(),
        manual_serial_number: input.manual_serial_number.clone(),
        manual_acquisition_price,
        manual_selling_price,
        quantity,
        original_price: original,
        discount_value: discount,
        discounted_price: total,
        line_total: total,
        sort_order,
    })
}
