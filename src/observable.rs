//! The `Observable` trait, creation functions and the combinator surface.
//!
//! Observables in this crate are cold, cloneable descriptions of a push
//! sequence. Subscribing consumes a clone; operators that must resubscribe
//! (the lift operators, the state observable after a reset) simply clone
//! their source again.

mod boxed;
mod create;
mod defer;
mod from_iter;
mod trivial;

pub use boxed::*;
pub use create::*;
pub use defer::*;
pub use from_iter::*;
pub use trivial::*;

use crate::{
  effects::{Effects, Lift, MapEffect, Sink, Suspend},
  error::{Effect, EffectErr, StateErr},
  observer::{Observer, ObserverAll, ObserverErr, ObserverNext},
  ops::{
    filter::FilterOp, map::MapOp, map_err::MapErrOp, merge::MergeOp, scan::ScanOp,
    start_with::StartWithOp, take::TakeOp, tap::TapOp,
  },
  state::{DefaultedStateObservable, StateObservable},
  subscriber::Subscriber,
  subscription::Subscription,
  suspense::{Suspendable, Suspensible},
};

pub trait Observable: Clone + 'static {
  type Item: 'static;
  type Err: 'static;

  /// Connect `observer` to this sequence and return the handle that tears
  /// the connection down. Operators implement this; consumers call one of
  /// the `subscribe*` methods instead.
  fn actual_subscribe<O>(self, observer: O) -> Subscription
  where
    O: Observer<Self::Item, Self::Err> + 'static;

  /// Turn this sequence into a [`StateObservable`] without a default value.
  ///
  /// State observables return themselves, which is what lets
  /// [`StateObservable::pipe_state`] hand back a chain that already ends in
  /// a state observable untouched.
  fn into_state(self) -> StateObservable<Self::Item, Self::Err>
  where
    Self::Item: Suspendable + Clone,
    Self::Err: StateErr,
  {
    StateObservable::new(self)
  }

  // ==========================================================================
  // Subscribing
  // ==========================================================================

  fn subscribe_with<O>(self, observer: O) -> Subscription
  where
    O: Observer<Self::Item, Self::Err> + 'static,
  {
    let subscriber = Subscriber::new(observer);
    let handle = subscriber.subscription().clone();
    let upstream = self.actual_subscribe(subscriber);
    handle.add(upstream);
    handle
  }

  /// Subscribe to values only; errors and completion are ignored.
  fn subscribe<N>(self, next: N) -> Subscription
  where
    N: FnMut(Self::Item) + 'static,
  {
    self.subscribe_with(ObserverNext(next))
  }

  fn subscribe_err<N, E>(self, next: N, error: E) -> Subscription
  where
    N: FnMut(Self::Item) + 'static,
    E: FnOnce(Self::Err) + 'static,
  {
    self.subscribe_with(ObserverErr { next, error })
  }

  fn subscribe_all<N, E, C>(self, next: N, error: E, complete: C) -> Subscription
  where
    N: FnMut(Self::Item) + 'static,
    E: FnOnce(Self::Err) + 'static,
    C: FnOnce() + 'static,
  {
    self.subscribe_with(ObserverAll { next, error, complete })
  }

  fn box_it(self) -> BoxedObservable<Self::Item, Self::Err> { BoxedObservable::new(self) }

  // ==========================================================================
  // Operators
  // ==========================================================================

  /// Creates a new stream which calls a closure on each element and uses
  /// its return as the value.
  fn map<B, F>(self, f: F) -> MapOp<Self, F>
  where
    F: Fn(Self::Item) -> B + Clone + 'static,
    B: 'static,
  {
    MapOp { source: self, func: f }
  }

  fn map_err<E2, F>(self, f: F) -> MapErrOp<Self, F>
  where
    F: Fn(Self::Err) -> E2 + Clone + 'static,
    E2: 'static,
  {
    MapErrOp { source: self, func: f }
  }

  /// Emit only those items that pass the predicate.
  fn filter<F>(self, filter: F) -> FilterOp<Self, F>
  where
    F: Fn(&Self::Item) -> bool + Clone + 'static,
  {
    FilterOp { source: self, filter }
  }

  /// Running accumulation, emitting every intermediate result. Each
  /// subscription starts again from `initial`.
  fn scan<Acc, F>(self, initial: Acc, f: F) -> ScanOp<Self, F, Acc>
  where
    Acc: Clone + 'static,
    F: Fn(Acc, Self::Item) -> Acc + Clone + 'static,
  {
    ScanOp { source: self, func: f, initial }
  }

  /// Emit the first `count` items, then complete.
  fn take(self, count: usize) -> TakeOp<Self> { TakeOp { source: self, count } }

  /// Run a side effect on each item without changing it.
  fn tap<F>(self, f: F) -> TapOp<Self, F>
  where
    F: Fn(&Self::Item) + Clone + 'static,
  {
    TapOp { source: self, func: f }
  }

  fn start_with(self, value: Self::Item) -> StartWithOp<Self>
  where
    Self::Item: Clone,
  {
    StartWithOp { source: self, value }
  }

  /// Interleave items of `self` and `other`; completes when both complete.
  fn merge<S>(self, other: S) -> MergeOp<Self, S>
  where
    S: Observable<Item = Self::Item, Err = Self::Err>,
  {
    MergeOp { source1: self, source2: other }
  }

  // ==========================================================================
  // Effect channel
  // ==========================================================================

  /// Route items equal to one of `values` through the error channel as
  /// [`Effect`] signals. See [`crate::effects`] for the hand-off protocol.
  fn sink_effects<I>(self, values: I) -> Sink<Self, Effects<Self::Item>>
  where
    I: IntoIterator<Item = Self::Item>,
    Self::Item: PartialEq,
    Self::Err: EffectErr<Self::Item>,
  {
    Sink::new(self, Effects::new(values))
  }

  /// Map every item; `Err(effect)` results are routed through the error
  /// channel like [`sink_effects`](Observable::sink_effects) does.
  fn map_effect<Out, V, F>(self, mapper: F) -> Sink<Self, MapEffect<F>>
  where
    F: Fn(Self::Item) -> Result<Out, Effect<V>> + Clone + 'static,
    Out: 'static,
    Self::Err: EffectErr<V>,
  {
    Sink::new(self, MapEffect(mapper))
  }

  /// Turn [`Effect`] errors carrying one of `values` (any value if `values`
  /// is empty) back into items, resubscribing upstream each time.
  fn lift_effects<I>(self, values: I) -> Lift<Self, Effects<Self::Item>>
  where
    I: IntoIterator<Item = Self::Item>,
    Self::Item: PartialEq,
    Self::Err: EffectErr<Self::Item>,
  {
    Lift::new(self, Effects::new(values))
  }

  fn sink_suspense<T>(self) -> Sink<Self, Suspend>
  where
    Self: Observable<Item = Suspensible<T>>,
    T: 'static,
    Self::Err: StateErr,
  {
    Sink::new(self, Suspend)
  }

  fn lift_suspense(self) -> Lift<Self, Suspend>
  where
    Self::Err: StateErr,
  {
    Lift::new(self, Suspend)
  }

  // ==========================================================================
  // State
  // ==========================================================================

  /// Wrap this sequence in a state observable carrying `value` as its
  /// default.
  fn with_default(self, value: Self::Item) -> DefaultedStateObservable<Self::Item, Self::Err>
  where
    Self::Item: Suspendable + Clone,
    Self::Err: StateErr,
  {
    DefaultedStateObservable::new(self, value)
  }
}
