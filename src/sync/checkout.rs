use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::collections::{CartItem, CartStore, LicenseTier, PurchaseStore};
use crate::{
    http::{ApiError, ApiService},
    model::TrackId,
};

/// Opaque signals from the payment provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckoutSignal {
    OrderCreated { order_id: String },
    PaymentVerified { order_id: String },
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckoutOutcome {
    AwaitingPayment,
    Completed { cleared: usize },
    Aborted(String),
}

#[derive(Debug, Serialize)]
struct OrderLine<'a> {
    track_id: &'a TrackId,
    license: LicenseTier,
}

#[derive(Debug, Deserialize)]
struct OrderReceipt {
    order_id: String,
    #[serde(default)]
    paid: bool,
}

/// Places an order for `items`. The provider either settles it at once
/// or leaves it awaiting payment.
pub async fn submit_order(api: &ApiService, items: &[CartItem]) -> Result<CheckoutSignal, ApiError> {
    let lines: Vec<_> = items
        .iter()
        .map(|item| OrderLine {
            track_id: &item.track.id,
            license: item.license,
        })
        .collect();
    let receipt: OrderReceipt = api.post_for("orders", &lines).await?;
    Ok(if receipt.paid {
        CheckoutSignal::PaymentVerified {
            order_id: receipt.order_id,
        }
    } else {
        CheckoutSignal::OrderCreated {
            order_id: receipt.order_id,
        }
    })
}

/// Only a verified payment empties the cart; the purchase list is then
/// re-read from the server, which owns purchase records.
pub async fn apply_checkout_signal(
    cart: &CartStore,
    purchases: &PurchaseStore,
    signal: CheckoutSignal,
) -> CheckoutOutcome {
    match signal {
        CheckoutSignal::OrderCreated { order_id } => {
            info!(order_id, items = cart.len(), "checkout_order_created");
            CheckoutOutcome::AwaitingPayment
        }
        CheckoutSignal::PaymentVerified { order_id } => {
            let cleared = cart.len();
            cart.clear_local();
            info!(order_id, cleared, "checkout_payment_verified");
            if let Err(e) = purchases.fetch_from_server().await {
                warn!(order_id, error = %e, "checkout_purchases_refresh_failed");
            }
            CheckoutOutcome::Completed { cleared }
        }
        CheckoutSignal::Failed(reason) => {
            warn!(reason, "checkout_failed");
            CheckoutOutcome::Aborted(reason)
        }
    }
}
