//! Domain types shared by every strategy: bars, instruments, positions,
//! and the thin order vocabulary spoken to the execution adapter.

pub mod bar;
pub mod instrument;
pub mod order;
pub mod position;

pub use bar::{Bar, Timeframe};
pub use instrument::{Instrument, InstrumentError};
pub use order::{ExitReason, OrderId, OrderSide};
pub use position::{Position, Side};
