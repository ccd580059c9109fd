//! Alert delivery for the VIP client monitor.
//!
//! This crate provides:
//! - `Notifier` trait for pluggable alert channels
//! - SMTP email notifier via lettre
//! - `dispatch_all` — sequential fan-out over configured channels
//!   where individual failures don't block the rest

pub mod dispatch;
pub mod email;
pub mod traits;

pub use dispatch::dispatch_all;
pub use email::EmailNotifier;
pub use traits::{DispatchResult, Notification, Notifier, NotifyError};
