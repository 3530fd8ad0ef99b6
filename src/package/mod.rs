//! Detection and dispatch for the supported package managers.
//!
//! - [`Detector`] picks exactly one [`PackageManager`] for a run, either the
//!   one the user named or the first that resolves in priority order.
//! - [`Dispatcher`] looks the [`Action`] up in the [`CommandTable`], builds
//!   the native command lines and runs them through an [`Executor`](dispatch::Executor).
//!
//! Both sides talk to the host through a trait ([`Probe`], [`Executor`](dispatch::Executor)) so
//! tests can swap in fakes.

mod action;
pub mod detect;
pub mod dispatch;
mod manager;
pub mod prompt;
pub mod search;
mod table;

pub use action::Action;
pub use detect::{Detector, Probe, SystemProbe};
pub use dispatch::{DispatchOptions, Dispatcher, DuctExecutor};
pub use manager::PackageManager;
pub use table::{CommandTable, Step};
