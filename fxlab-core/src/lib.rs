//! fxlab core — domain types, pip math, and the protective-order controller.
//!
//! This crate contains everything the strategy collection shares:
//! - Domain types (bars, instruments, positions, order vocabulary)
//! - Pip/point distance conversion with the 3/5-digit retail-FX convention
//! - The protective-order controller (stop / take-profit / break-even /
//!   trailing) with the tighten-only stop ratchet
//! - The `StrategyCore` lifecycle trait and per-bar context
//! - Declarative parameter specs for optimizer UIs
//! - Position sizers and the order-gateway seam
//! - Injected configuration (instrument catalog, carry table)
//! - A deterministic bar-replay harness used by the test suites

pub mod config;
pub mod context;
pub mod domain;
pub mod gateway;
pub mod history;
pub mod params;
pub mod protect;
pub mod replay;
pub mod sizers;
pub mod strategy;

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: shared types are Send + Sync.
    ///
    /// Strategies run single-threaded, but hosts commonly move instances
    /// across threads at setup time. If any type fails this check, the
    /// build breaks immediately.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        require_send::<domain::Bar>();
        require_sync::<domain::Bar>();
        require_send::<domain::Instrument>();
        require_sync::<domain::Instrument>();
        require_send::<domain::Position>();
        require_sync::<domain::Position>();
        require_send::<domain::Side>();
        require_sync::<domain::Side>();

        require_send::<protect::ProtectionConfig>();
        require_sync::<protect::ProtectionConfig>();
        require_send::<protect::ProtectionController>();
        require_sync::<protect::ProtectionController>();
        require_send::<protect::ProtectIntent>();
        require_sync::<protect::ProtectIntent>();

        require_send::<params::ParamSpec>();
        require_sync::<params::ParamSpec>();
        require_send::<params::ParamValues>();
        require_sync::<params::ParamValues>();

        require_send::<config::InstrumentCatalog>();
        require_sync::<config::InstrumentCatalog>();
        require_send::<config::CarryTable>();
        require_sync::<config::CarryTable>();
    }

    /// Architecture contract: `StrategyCore::on_bar` receives a read-only
    /// context and communicates exclusively through returned actions.
    ///
    /// If the trait ever grows a mutable gateway parameter, this stops
    /// compiling — strategies must not submit orders themselves.
    #[test]
    fn strategy_trait_emits_actions_only() {
        fn _check_trait_object_builds(
            strategy: &mut dyn strategy::StrategyCore,
            ctx: &context::BarContext<'_>,
        ) -> Vec<strategy::Action> {
            strategy.on_bar(ctx)
        }
    }
}
