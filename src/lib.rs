//! Notification daemon core.
//!
//! The pieces are usable on their own: the modifier [`modifiers::Pipeline`],
//! the [`disposition`] placement engine and the [`center::NotificationCenter`]
//! that ties them to an overflow queue and per-popup expiration. The
//! [`dbus`] and [`daemon`] modules put the center on the session bus.

pub mod center;
pub mod config;
pub mod daemon;
pub mod dbus;
pub mod disposition;
pub mod expiration;
pub mod icons;
pub mod modifiers;
pub mod notification;

pub use config::Config;
