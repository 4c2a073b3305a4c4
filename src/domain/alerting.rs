//! Alert rule evaluation
//!
//! Two independent rules are applied to every observation; both may fire for
//! the same target on the same day.
//!
//! - **Undercut**: the competitor price beats ours by strictly more than the
//!   configured percentage. A delta of exactly the threshold does not alert.
//! - **Stock gap**: the competitor is out of stock. This is an opportunity
//!   signal and fires regardless of the price delta.

use chrono::NaiveDate;

use crate::domain::model::{Alert, AlertReason, StockStatus, Target};

/// Evaluate the alert rules for one target's reading.
pub fn evaluate(
    target: &Target,
    date: NaiveDate,
    competitor_price: Option<f64>,
    diff_pct: Option<f64>,
    stock: StockStatus,
    threshold_pct: f64,
) -> Vec<Alert> {
    let mut alerts = Vec::new();

    if let (Some(price), Some(pct)) = (competitor_price, diff_pct) {
        if pct < -threshold_pct.abs() {
            alerts.push(Alert {
                date,
                sku: target.sku.clone(),
                name: target.name.clone(),
                our_price: target.our_price,
                competitor_price: Some(price),
                delta_pct: Some(pct),
                reason: AlertReason::PriceUndercut,
            });
        }
    }

    if stock == StockStatus::OutOfStock {
        alerts.push(Alert {
            date,
            sku: target.sku.clone(),
            name: target.name.clone(),
            our_price: target.our_price,
            competitor_price,
            delta_pct: diff_pct,
            reason: AlertReason::StockGap,
        });
    }

    alerts
}
