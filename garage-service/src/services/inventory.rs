//! Inventory ledger: stock deduction for paid documents.

use crate::models::LineItem;
use crate::services::metrics::{STOCK_DEDUCTIONS_TOTAL, STOCK_UNITS_DEDUCTED};
use crate::services::store::InventoryRepo;
use service_core::error::AppError;
use tracing::{info, instrument, warn};

/// What a deduction pass did.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DeductionSummary {
    pub deducted_lines: usize,
    pub units: i64,
    pub skipped_lines: usize,
}

/// Take each linked part's quantity out of stock.
///
/// Lines without a part are ignored. A part that no longer exists is
/// skipped and counted, never an error. Stock may go negative.
#[instrument(skip(repo, items), fields(items = items.len()))]
pub async fn deduct_for_items<R>(repo: &mut R, items: &[LineItem]) -> Result<DeductionSummary, AppError>
where
    R: InventoryRepo + ?Sized,
{
    let mut summary = DeductionSummary::default();

    for item in items {
        let Some(part_id) = item.part_id else {
            continue;
        };

        match repo.deduct_quantity(part_id, item.quantity).await? {
            Some(remaining) => {
                summary.deducted_lines += 1;
                summary.units += i64::from(item.quantity);
                STOCK_DEDUCTIONS_TOTAL.with_label_values(&["deducted"]).inc();
                if let Ok(units) = u64::try_from(item.quantity) {
                    STOCK_UNITS_DEDUCTED.inc_by(units);
                }
                if remaining < 0 {
                    warn!(%part_id, remaining, "Part stock is negative");
                }
            }
            None => {
                summary.skipped_lines += 1;
                STOCK_DEDUCTIONS_TOTAL.with_label_values(&["skipped"]).inc();
                warn!(%part_id, line_item_id = %item.line_item_id, "Part not found, stock deduction skipped");
            }
        }
    }

    info!(
        deducted_lines = summary.deducted_lines,
        units = summary.units,
        skipped_lines = summary.skipped_lines,
        "Stock deducted for paid document"
    );

    Ok(summary)
}
