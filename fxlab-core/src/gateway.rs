//! Execution-adapter seam.
//!
//! The host framework owns routing and execution reporting; this trait is
//! the narrow surface strategies' actions are translated through.
//! Submission is fire-and-forget: an `Err` is not retried, and callers
//! leave protective state untouched so the next bar re-evaluates it.

use thiserror::Error;

use crate::domain::{ExitReason, OrderId, OrderSide};

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("order rejected: {reason}")]
    Rejected { reason: String },

    #[error("gateway unavailable")]
    Unavailable,
}

/// Market-order primitives offered by the host.
pub trait OrderGateway {
    /// Submit a market order. Returns the host-assigned id on acceptance.
    fn market_order(
        &mut self,
        symbol: &str,
        side: OrderSide,
        volume: f64,
    ) -> Result<OrderId, GatewayError>;

    /// Close the open net position in `symbol`, tagged with the reason.
    fn close_position(&mut self, symbol: &str, reason: ExitReason)
        -> Result<OrderId, GatewayError>;
}
