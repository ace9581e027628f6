//! # Hardware Contracts
//!
//! Trait seams for the physical till peripherals: receipt printer (with
//! cash drawer kick) and external card terminal.
//!
//! ## Why Traits?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  CheckoutService holds `Arc<dyn CardTerminal>` / `Arc<dyn Printer>`:    │
//! │                                                                         │
//! │    production  →  ESC/POS driver over USB, provider SDK bridge          │
//! │    tests       →  MockCardTerminal / NullPrinter below                  │
//! │                                                                         │
//! │  Card provider credentials are opaque config handed to the concrete     │
//! │  implementation; nothing else in the system sees them.                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Print failures after a committed sale are non-fatal: the sale stands,
//! the response carries a `printed: false` flag, and the till offers a
//! reprint.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use thiserror::Error;

use corner_core::Money;

use crate::receipt::ReceiptPayload;

/// Errors from physical peripherals.
#[derive(Debug, Clone, Error)]
pub enum HardwareError {
    /// Device is not connected or not responding.
    #[error("device not connected")]
    NotConnected,

    /// Device-level failure (paper out, comms error, provider timeout).
    #[error("device error: {0}")]
    Device(String),
}

/// Result of asking the card terminal to take a payment.
#[derive(Debug, Clone)]
pub enum ChargeOutcome {
    /// Charge went through; `reference` is the provider's authorisation id.
    Approved { reference: String },
    /// Charge was actively declined (insufficient funds, cancelled on pad).
    Declined { reason: String },
}

// =============================================================================
// Contracts
// =============================================================================

/// A receipt printer with an attached cash drawer.
#[async_trait]
pub trait ReceiptPrinter: Send + Sync {
    /// Establishes the device connection.
    async fn connect(&self) -> Result<(), HardwareError>;

    /// Prints one receipt.
    async fn print(&self, payload: &ReceiptPayload) -> Result<(), HardwareError>;

    /// Kicks the cash drawer open.
    async fn open_cash_drawer(&self) -> Result<(), HardwareError>;

    /// Releases the device.
    async fn disconnect(&self) -> Result<(), HardwareError>;
}

/// An external card terminal.
#[async_trait]
pub trait CardTerminal: Send + Sync {
    /// Asks the terminal to take `amount`. An `Err` is a transport/device
    /// failure; a decline comes back as `Ok(ChargeOutcome::Declined)`.
    async fn process_payment(&self, amount: Money) -> Result<ChargeOutcome, HardwareError>;

    /// Pings the terminal.
    async fn test_connection(&self) -> Result<(), HardwareError>;
}

// =============================================================================
// Test Doubles
// =============================================================================
// Also usable when running a till with no hardware attached.

/// Printer that records what it was asked to print. Can be switched into
/// a failing state to exercise the non-fatal print path.
#[derive(Default)]
pub struct NullPrinter {
    fail: AtomicBool,
    printed: Mutex<Vec<ReceiptPayload>>,
    drawer_kicks: AtomicBool,
}

impl NullPrinter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent print fail.
    pub fn set_failing(&self, failing: bool) {
        self.fail.store(failing, Ordering::SeqCst);
    }

    /// Receipts printed so far.
    pub fn printed(&self) -> Vec<ReceiptPayload> {
        self.printed.lock().unwrap_or_else(|p| p.into_inner()).clone()
    }

    /// Whether the cash drawer was kicked.
    pub fn drawer_opened(&self) -> bool {
        self.drawer_kicks.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ReceiptPrinter for NullPrinter {
    async fn connect(&self) -> Result<(), HardwareError> {
        Ok(())
    }

    async fn print(&self, payload: &ReceiptPayload) -> Result<(), HardwareError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(HardwareError::Device("paper out".to_string()));
        }
        self.printed
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .push(payload.clone());
        Ok(())
    }

    async fn open_cash_drawer(&self) -> Result<(), HardwareError> {
        self.drawer_kicks.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), HardwareError> {
        Ok(())
    }
}

/// Card terminal that approves or declines everything.
pub struct MockCardTerminal {
    decline: AtomicBool,
    charges: Mutex<Vec<i64>>,
}

impl MockCardTerminal {
    /// Terminal that approves every charge.
    pub fn approving() -> Self {
        MockCardTerminal {
            decline: AtomicBool::new(false),
            charges: Mutex::new(Vec::new()),
        }
    }

    /// Terminal that declines every charge.
    pub fn declining() -> Self {
        MockCardTerminal {
            decline: AtomicBool::new(true),
            charges: Mutex::new(Vec::new()),
        }
    }

    /// Amounts (in cents) this terminal was asked to charge.
    pub fn charges(&self) -> Vec<i64> {
        self.charges.lock().unwrap_or_else(|p| p.into_inner()).clone()
    }
}

#[async_trait]
impl CardTerminal for MockCardTerminal {
    async fn process_payment(&self, amount: Money) -> Result<ChargeOutcome, HardwareError> {
        self.charges
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .push(amount.cents());

        if self.decline.load(Ordering::SeqCst) {
            return Ok(ChargeOutcome::Declined {
                reason: "declined by issuer".to_string(),
            });
        }
        Ok(ChargeOutcome::Approved {
            reference: format!("AUTH-{}", uuid::Uuid::new_v4()),
        })
    }

    async fn test_connection(&self) -> Result<(), HardwareError> {
        Ok(())
    }
}
