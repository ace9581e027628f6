//! # Corner Terminal
//!
//! Till-side orchestration for Corner POS: staff sessions with multi-tab
//! carts, the checkout commit path, returns, and the hardware seams for
//! the receipt printer and card terminal.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          corner-terminal                                │
//! │                                                                         │
//! │   SessionStore ──── Cart (corner-core, pure)                            │
//! │        │                                                                │
//! │        ▼ snapshot                                                       │
//! │   CheckoutService ──► CardTerminal / ReceiptPrinter (trait seams)       │
//! │   ReturnService   ──► corner-db (sqlite)                                │
//! │                                                                         │
//! │   Every fallible operation returns ServiceError { code, message }.      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The engine computes, this crate decides when to touch the database and
//! the devices, and the database enforces the last-moment invariants
//! (stock and balance conditional updates).

pub mod checkout;
pub mod error;
pub mod hardware;
pub mod receipt;
pub mod returns;
pub mod session;

pub use checkout::{CheckoutOutcome, CheckoutService};
pub use error::{ErrorCode, ServiceError, ServiceResult};
pub use hardware::{
    CardTerminal, ChargeOutcome, HardwareError, MockCardTerminal, NullPrinter, ReceiptPrinter,
};
pub use receipt::{ReceiptLine, ReceiptPayload};
pub use returns::{ReturnRequest, ReturnService};
pub use session::SessionStore;
