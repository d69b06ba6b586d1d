//! Deterministic bar-replay harness.
//!
//! Test tooling, not a backtest product: drives one strategy over a bar
//! series with an in-memory gateway and a single net position, applying
//! intents in the documented order — protective controller first (it may
//! use the bar's intrabar extremes), then the signal evaluator at the
//! close. CSV fixtures and a seeded random walk provide the bars.

use chrono::{DateTime, TimeZone, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

use crate::context::{BarContext, IndicatorSnapshot};
use crate::domain::{Bar, ExitReason, Instrument, OrderId, OrderSide, Position, Side, Timeframe};
use crate::gateway::{GatewayError, OrderGateway};
use crate::protect::{ProtectIntent, ProtectionController};
use crate::sizers::PositionSizer;
use crate::strategy::{Action, ConfigError, StrategyCore};

/// Computes the indicator snapshot for one bar. Implemented by tests
/// with whatever arithmetic the strategy under test needs; production
/// indicator computation belongs to the host.
pub trait IndicatorFeed {
    fn snapshot(&self, bars: &[Bar], index: usize) -> IndicatorSnapshot;
}

/// Feed for strategies that read only bar data.
pub struct NoIndicators;

impl IndicatorFeed for NoIndicators {
    fn snapshot(&self, _bars: &[Bar], _index: usize) -> IndicatorSnapshot {
        IndicatorSnapshot::new()
    }
}

/// In-memory gateway that accepts everything by default. Tests can queue
/// rejections to exercise the no-retry failure semantics.
#[derive(Debug, Default)]
pub struct PaperGateway {
    next_id: u64,
    reject_next: usize,
    pub orders_accepted: usize,
    pub orders_rejected: usize,
}

impl PaperGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject the next `n` submissions.
    pub fn reject_next(&mut self, n: usize) {
        self.reject_next = n;
    }

    fn submit(&mut self) -> Result<OrderId, GatewayError> {
        if self.reject_next > 0 {
            self.reject_next -= 1;
            self.orders_rejected += 1;
            return Err(GatewayError::Rejected {
                reason: "paper rejection".into(),
            });
        }
        self.next_id += 1;
        self.orders_accepted += 1;
        Ok(OrderId(self.next_id))
    }
}

impl OrderGateway for PaperGateway {
    fn market_order(
        &mut self,
        symbol: &str,
        side: OrderSide,
        volume: f64,
    ) -> Result<OrderId, GatewayError> {
        let result = self.submit();
        tracing::debug!(symbol, ?side, volume, ok = result.is_ok(), "market order");
        result
    }

    fn close_position(
        &mut self,
        symbol: &str,
        reason: ExitReason,
    ) -> Result<OrderId, GatewayError> {
        let result = self.submit();
        tracing::debug!(symbol, %reason, ok = result.is_ok(), "close position");
        result
    }
}

/// One completed round trip.
#[derive(Debug, Clone)]
pub struct ClosedTrade {
    pub side: Side,
    pub volume: f64,
    pub entry_price: f64,
    pub exit_price: f64,
    pub reason: ExitReason,
    pub opened_at: DateTime<Utc>,
    pub closed_at: DateTime<Utc>,
}

impl ClosedTrade {
    pub fn pnl(&self) -> f64 {
        self.side.sign() * (self.exit_price - self.entry_price) * self.volume
    }
}

#[derive(Debug)]
pub struct ReplayReport {
    pub trades: Vec<ClosedTrade>,
    pub final_equity: f64,
    pub bars_processed: usize,
    /// True if a position was still open after the last bar.
    pub open_at_end: bool,
}

#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("strategy failed to start: {0}")]
    Start(#[from] ConfigError),

    #[error("failed to read bar fixture: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse bar fixture: {0}")]
    Csv(#[from] csv::Error),
}

/// Aggregates trading-timeframe bars into finished higher-timeframe bars.
struct HigherTfAggregator {
    timeframe: Timeframe,
    current_key: Option<i64>,
    current: Option<Bar>,
    finished: Option<Bar>,
}

impl HigherTfAggregator {
    fn new(timeframe: Timeframe) -> Self {
        Self {
            timeframe,
            current_key: None,
            current: None,
            finished: None,
        }
    }

    fn push(&mut self, bar: &Bar) {
        let secs = self.timeframe.duration().num_seconds();
        let key = bar.open_time.timestamp().div_euclid(secs);
        if self.current_key != Some(key) {
            self.finished = self.current.take();
            self.current_key = Some(key);
            self.current = Some(Bar {
                symbol: bar.symbol.clone(),
                open_time: Utc
                    .timestamp_opt(key * secs, 0)
                    .single()
                    .unwrap_or(bar.open_time),
                open: bar.open,
                high: bar.high,
                low: bar.low,
                close: bar.close,
                volume: bar.volume,
            });
        } else if let Some(current) = &mut self.current {
            current.high = current.high.max(bar.high);
            current.low = current.low.min(bar.low);
            current.close = bar.close;
            current.volume += bar.volume;
        }
    }

    fn last_finished(&self) -> Option<&Bar> {
        self.finished.as_ref()
    }
}

/// Single-strategy, single-instrument replay.
pub struct Replay {
    instrument: Instrument,
    initial_equity: f64,
    higher_tf: Option<Timeframe>,
    sizer: Option<Box<dyn PositionSizer>>,
}

impl Replay {
    pub fn new(instrument: Instrument, initial_equity: f64) -> Self {
        Self {
            instrument,
            initial_equity,
            higher_tf: None,
            sizer: None,
        }
    }

    /// Also deliver the latest finished bar of `timeframe` each callback.
    pub fn with_higher_timeframe(mut self, timeframe: Timeframe) -> Self {
        self.higher_tf = Some(timeframe);
        self
    }

    /// Size entries with `sizer` instead of the volume carried by the
    /// strategy's actions.
    pub fn with_sizer(mut self, sizer: Box<dyn PositionSizer>) -> Self {
        self.sizer = Some(sizer);
        self
    }

    pub fn run(
        &self,
        strategy: &mut dyn StrategyCore,
        bars: &[Bar],
        feed: &dyn IndicatorFeed,
        gateway: &mut dyn OrderGateway,
    ) -> Result<ReplayReport, ReplayError> {
        strategy.on_start(&self.instrument)?;

        let mut controller = ProtectionController::new(strategy.protection());
        let mut position: Option<Position> = None;
        let mut equity = self.initial_equity;
        let mut trades: Vec<ClosedTrade> = Vec::new();
        let mut aggregator = self.higher_tf.map(HigherTfAggregator::new);
        let warmup = strategy.warmup_bars();

        for (index, bar) in bars.iter().enumerate() {
            if let Some(agg) = &mut aggregator {
                agg.push(bar);
            }

            // Protective ladder first: exits may trigger on intrabar
            // extremes before the evaluator ever sees the close.
            let intent = position
                .as_ref()
                .map(|pos| controller.on_bar(pos, bar, &self.instrument));
            if let Some(ProtectIntent::Exit { reason, price }) = intent {
                let pos = position.as_ref().expect("intent implies open position");
                match gateway.close_position(&pos.symbol, reason) {
                    Ok(_) => {
                        Self::book_exit(
                            &mut position,
                            &mut controller,
                            strategy,
                            &mut trades,
                            &mut equity,
                            price,
                            reason,
                            bar.open_time,
                        );
                    }
                    Err(err) => {
                        // No retry; stale levels re-evaluate next bar.
                        tracing::warn!(%err, %reason, "protective exit rejected");
                    }
                }
            }

            if index < warmup {
                continue;
            }

            let snapshot = feed.snapshot(bars, index);
            let higher_tf_bar = aggregator.as_ref().and_then(|a| a.last_finished());
            let ctx = BarContext {
                instrument: &self.instrument,
                bar,
                higher_tf_bar,
                position: position.as_ref(),
                indicators: &snapshot,
                equity,
            };
            let actions = strategy.on_bar(&ctx);

            for action in actions {
                self.apply(
                    action,
                    bar,
                    strategy,
                    gateway,
                    &mut controller,
                    &mut position,
                    &mut trades,
                    &mut equity,
                );
            }
        }

        Ok(ReplayReport {
            open_at_end: position.is_some(),
            trades,
            final_equity: equity,
            bars_processed: bars.len(),
        })
    }

    #[allow(clippy::too_many_arguments)]
    fn apply(
        &self,
        action: Action,
        bar: &Bar,
        strategy: &mut dyn StrategyCore,
        gateway: &mut dyn OrderGateway,
        controller: &mut ProtectionController,
        position: &mut Option<Position>,
        trades: &mut Vec<ClosedTrade>,
        equity: &mut f64,
    ) {
        let (side, volume) = match action {
            Action::EnterLong { volume } => (Side::Long, volume),
            Action::EnterShort { volume } => (Side::Short, volume),
            Action::Close { reason } => {
                if position.is_some()
                    && gateway.close_position(&bar.symbol, reason).is_ok()
                {
                    Self::book_exit(
                        position, controller, strategy, trades, equity, bar.close, reason,
                        bar.open_time,
                    );
                }
                return;
            }
        };

        // Same-direction signal while holding: nothing to do.
        if position.as_ref().is_some_and(|p| p.side == side) {
            return;
        }

        // Opposite position: flip closes first, then re-enters.
        if position.is_some() {
            if gateway.close_position(&bar.symbol, ExitReason::Flip).is_err() {
                return;
            }
            Self::book_exit(
                position,
                controller,
                strategy,
                trades,
                equity,
                bar.close,
                ExitReason::Flip,
                bar.open_time,
            );
        }

        let order_side = match side {
            Side::Long => OrderSide::Buy,
            Side::Short => OrderSide::Sell,
        };
        let volume = match &self.sizer {
            Some(sizer) => {
                let stop = controller.initial_stop(side, bar.close, &self.instrument);
                sizer.volume(*equity, bar.close, stop, &self.instrument)
            }
            None => self.instrument.snap_volume(volume),
        };
        match gateway.market_order(&bar.symbol, order_side, volume) {
            Ok(id) => {
                let pos = Position::new(bar.symbol.clone(), side, volume, bar.close, bar.open_time);
                controller.arm(&pos, &self.instrument);
                strategy.on_position_changed(Some(&pos));
                tracing::info!(%id, ?side, volume, price = bar.close, "entered");
                *position = Some(pos);
            }
            Err(err) => {
                tracing::warn!(%err, ?side, "entry rejected");
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn book_exit(
        position: &mut Option<Position>,
        controller: &mut ProtectionController,
        strategy: &mut dyn StrategyCore,
        trades: &mut Vec<ClosedTrade>,
        equity: &mut f64,
        price: f64,
        reason: ExitReason,
        at: DateTime<Utc>,
    ) {
        let pos = position.take().expect("book_exit requires open position");
        let trade = ClosedTrade {
            side: pos.side,
            volume: pos.volume,
            entry_price: pos.entry_price,
            exit_price: price,
            reason,
            opened_at: pos.opened_at,
            closed_at: at,
        };
        *equity += trade.pnl();
        tracing::info!(
            side = ?trade.side,
            entry = trade.entry_price,
            exit = trade.exit_price,
            %reason,
            pnl = trade.pnl(),
            "closed"
        );
        trades.push(trade);
        controller.disarm();
        strategy.on_position_changed(None);
    }
}

#[derive(Debug, Deserialize)]
struct BarRecord {
    time: DateTime<Utc>,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: u64,
}

/// Load bars from a CSV fixture with columns
/// `time,open,high,low,close,volume` (RFC 3339 timestamps).
pub fn load_bars_csv(path: impl AsRef<Path>, symbol: &str) -> Result<Vec<Bar>, ReplayError> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut bars = Vec::new();
    for record in reader.deserialize() {
        let record: BarRecord = record?;
        bars.push(Bar {
            symbol: symbol.to_string(),
            open_time: record.time,
            open: record.open,
            high: record.high,
            low: record.low,
            close: record.close,
            volume: record.volume,
        });
    }
    Ok(bars)
}

/// Seeded random-walk bar generator for smoke tests.
///
/// Each bar moves by up to `vol_points` pips with small wicks; the walk
/// is fully determined by `seed`.
pub fn synthetic_walk(
    instrument: &Instrument,
    bars: usize,
    start_price: f64,
    vol_points: f64,
    seed: u64,
) -> Vec<Bar> {
    let mut rng = StdRng::seed_from_u64(seed);
    let pip = instrument.pip_size();
    let mut price = start_price;
    let start = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();

    (0..bars)
        .map(|i| {
            let open = price;
            let drift: f64 = rng.gen_range(-vol_points..=vol_points) * pip;
            let close = instrument.round_price((open + drift).max(pip));
            let wick_up: f64 = rng.gen_range(0.0..=vol_points * 0.5) * pip;
            let wick_down: f64 = rng.gen_range(0.0..=vol_points * 0.5) * pip;
            price = close;
            Bar {
                symbol: instrument.symbol.clone(),
                open_time: start + chrono::Duration::hours(i as i64),
                open,
                high: open.max(close) + wick_up,
                low: (open.min(close) - wick_down).max(pip),
                close,
                volume: 1_000,
            }
        })
        .collect()
}
