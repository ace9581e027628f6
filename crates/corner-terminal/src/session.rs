//! # Staff Sessions and Transaction Tabs
//!
//! Explicit per-staff state: each logged-in staff member owns a session,
//! each session owns one or more transaction tabs, and each tab is a
//! [`Cart`]. Nothing here is global; carts live inside the store and die
//! with the session that owns them.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  SessionStore                                                           │
//! │    ├── "staff-amy"   → tabs { tab-1: Cart, tab-2: Cart }                │
//! │    └── "staff-ben"   → tabs { tab-1: Cart }                             │
//! │                                                                         │
//! │  Operations on one tab never touch another; a staff switch tears the    │
//! │  old session down rather than leaving carts behind for the next login.  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Thread Safety
//! The store is wrapped in a `Mutex` because till commands can run
//! concurrently. Mutations go through `with_cart_mut`, which holds the
//! lock for the duration of the closure, so each cart operation is atomic
//! from the caller's point of view.

use std::collections::HashMap;
use std::sync::Mutex;

use tracing::{debug, info};

use corner_core::{Cart, EngineResult};

use crate::error::{ServiceError, ServiceResult};

/// One staff member's open tabs.
#[derive(Debug, Default)]
struct StaffSession {
    tabs: HashMap<String, Cart>,
}

/// Store of all live staff sessions.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: Mutex<HashMap<String, StaffSession>>,
}

impl SessionStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens a session for a staff member with one empty tab, returning
    /// the tab id. Logging in again replaces any previous session.
    pub fn open_session(&self, staff_id: &str) -> String {
        info!(staff = %staff_id, "Opening staff session");

        let mut session = StaffSession::default();
        let cart = Cart::new();
        let tab_id = cart.id.clone();
        session.tabs.insert(tab_id.clone(), cart);

        self.lock().insert(staff_id.to_string(), session);
        tab_id
    }

    /// Tears down a staff member's session and all of its tabs.
    /// Idempotent.
    pub fn close_session(&self, staff_id: &str) {
        info!(staff = %staff_id, "Closing staff session");
        self.lock().remove(staff_id);
    }

    /// Opens an additional tab in an existing session.
    pub fn open_tab(&self, staff_id: &str) -> ServiceResult<String> {
        let mut sessions = self.lock();
        let session = sessions
            .get_mut(staff_id)
            .ok_or_else(|| ServiceError::not_found(format!("no session for staff {staff_id}")))?;

        let cart = Cart::new();
        let tab_id = cart.id.clone();
        session.tabs.insert(tab_id.clone(), cart);

        debug!(staff = %staff_id, tab = %tab_id, "Opened tab");
        Ok(tab_id)
    }

    /// Closes one tab, discarding its cart. Idempotent within a session.
    pub fn close_tab(&self, staff_id: &str, tab_id: &str) -> ServiceResult<()> {
        let mut sessions = self.lock();
        let session = sessions
            .get_mut(staff_id)
            .ok_or_else(|| ServiceError::not_found(format!("no session for staff {staff_id}")))?;

        session.tabs.remove(tab_id);
        debug!(staff = %staff_id, tab = %tab_id, "Closed tab");
        Ok(())
    }

    /// Tab ids currently open for a staff member.
    pub fn tab_ids(&self, staff_id: &str) -> ServiceResult<Vec<String>> {
        let sessions = self.lock();
        let session = sessions
            .get(staff_id)
            .ok_or_else(|| ServiceError::not_found(format!("no session for staff {staff_id}")))?;

        Ok(session.tabs.keys().cloned().collect())
    }

    /// Runs a read-only closure against one tab's cart.
    pub fn with_cart<T>(
        &self,
        staff_id: &str,
        tab_id: &str,
        f: impl FnOnce(&Cart) -> T,
    ) -> ServiceResult<T> {
        let sessions = self.lock();
        let cart = Self::find(&sessions, staff_id, tab_id)?;
        Ok(f(cart))
    }

    /// Runs a mutating closure against one tab's cart. Engine errors from
    /// the closure surface as `ServiceError` with the matching code; the
    /// cart is left as the engine left it (engine operations are
    /// all-or-nothing on failure).
    pub fn with_cart_mut<T>(
        &self,
        staff_id: &str,
        tab_id: &str,
        f: impl FnOnce(&mut Cart) -> EngineResult<T>,
    ) -> ServiceResult<T> {
        let mut sessions = self.lock();
        let session = sessions
            .get_mut(staff_id)
            .ok_or_else(|| ServiceError::not_found(format!("no session for staff {staff_id}")))?;
        let cart = session
            .tabs
            .get_mut(tab_id)
            .ok_or_else(|| ServiceError::not_found(format!("no tab {tab_id}")))?;

        f(cart).map_err(ServiceError::from)
    }

    /// Takes a snapshot clone of one tab's cart (for commit).
    pub fn snapshot(&self, staff_id: &str, tab_id: &str) -> ServiceResult<Cart> {
        self.with_cart(staff_id, tab_id, Cart::clone)
    }

    fn find<'a>(
        sessions: &'a HashMap<String, StaffSession>,
        staff_id: &str,
        tab_id: &str,
    ) -> ServiceResult<&'a Cart> {
        sessions
            .get(staff_id)
            .ok_or_else(|| ServiceError::not_found(format!("no session for staff {staff_id}")))?
            .tabs
            .get(tab_id)
            .ok_or_else(|| ServiceError::not_found(format!("no tab {tab_id}")))
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, StaffSession>> {
        // A poisoned lock only means another till command panicked while
        // holding it; the map itself is still coherent.
        self.sessions.lock().unwrap_or_else(|p| p.into_inner())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
