//! Reactive state on top of a small, single-threaded observable runtime.
//!
//! The centerpiece is [`StateObservable`](state::StateObservable): a
//! multicast stream that replays its latest value to late subscribers, keeps
//! one producer subscription alive while anyone listens, and exposes the
//! current value synchronously (or as a [`PendingValue`](state::PendingValue)
//! when nothing has been emitted yet).
//!
//! Around it live:
//!
//! - the effect channel operators ([`sink_effects`](observable::Observable::sink_effects),
//!   [`lift_effects`](observable::Observable::lift_effects) and their suspense
//!   counterparts), which route selected values through the error channel so
//!   everything between the sink and the lift restarts,
//! - [`StateFactory`](state::StateFactory), a keyed cache of state
//!   observables with eviction and transparent redirection of stale handles,
//! - [`with_default`](observable::Observable::with_default), which attaches a
//!   fallback value.
//!
//! ```rust
//! use rxstate::prelude::*;
//!
//! let mut source = Subject::<i32, StateError<()>>::default();
//! let counter = state(source.clone());
//!
//! let sub = counter.clone().subscribe(|_| {});
//! source.next(1);
//! assert_eq!(counter.get_value().ok().and_then(Snapshot::ready), Some(1));
//! sub.unsubscribe();
//! ```

macro_rules! debug_event {
  ($($arg:tt)*) => {
    #[cfg(feature = "tracing")]
    ::tracing::debug!(target: "rxstate", $($arg)*);
  };
}

macro_rules! trace_event {
  ($($arg:tt)*) => {
    #[cfg(feature = "tracing")]
    ::tracing::trace!(target: "rxstate", $($arg)*);
  };
}

pub mod effects;
pub mod error;
pub mod observable;
pub mod observer;
pub mod ops;
pub mod prelude;
pub mod rc;
pub mod state;
pub mod subject;
pub mod subscriber;
pub mod subscription;
pub mod suspense;
mod type_hint;
