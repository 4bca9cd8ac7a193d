//! The state observable and the keyed cache built on top of it.
//!
//! A [`StateObservable`] wraps a producer sequence and turns it into a
//! shared piece of state:
//!
//! - the producer is subscribed once, when the first consumer arrives, and
//!   released as soon as the last one leaves,
//! - late consumers receive the latest value before anything else,
//! - the latest value can be read synchronously with
//!   [`get_value`](StateObservable::get_value).
//!
//! Completion of the producer is swallowed: a state that already holds a
//! value keeps serving it to new consumers without subscribing the producer
//! again. Errors on the other hand reset everything, so the next consumer
//! starts the producer from scratch.

mod defaulted;
mod factory;
mod inner;
mod pending;

pub use defaulted::*;
pub use factory::*;
pub use inner::{Completion, StateObservable};
pub use pending::{PendingValue, Snapshot};

use crate::{error::StateErr, observable::Observable, suspense::Suspendable};

/// Wrap `source` in a [`StateObservable`] without a default value.
pub fn state<S>(source: S) -> StateObservable<S::Item, S::Err>
where
  S: Observable,
  S::Item: Suspendable + Clone,
  S::Err: StateErr,
{
  StateObservable::new(source)
}

/// Wrap `source` in a state observable that emits `default` whenever it
/// activates without a value.
pub fn state_with_default<S>(source: S, default: S::Item) -> DefaultedStateObservable<S::Item, S::Err>
where
  S: Observable,
  S::Item: Suspendable + Clone,
  S::Err: StateErr,
{
  DefaultedStateObservable::new(source, default)
}
