//! Errors raised by state observables and the effect channel.
//!
//! Every error channel that flows into a [`StateObservable`] must be able to
//! carry the two state-level failures ([`NoSubscribersError`] and
//! [`EmptyObservableError`]) and recognize the suspense signal. That contract
//! is [`StateErr`]. [`StateError`] is the ready-made implementation that wraps
//! an application error `E` and, optionally, effect values of type `S`.
//!
//! [`StateObservable`]: crate::state::StateObservable

use std::convert::Infallible;

use thiserror::Error;

/// The state observable had no subscribers: either its value was requested
/// while inactive, or a pending value was abandoned because the last
/// subscriber left.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[error("state observable has no subscribers")]
pub struct NoSubscribersError;

/// The source completed without ever producing a value, and no default value
/// was available.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[error("state observable completed without emitting a value")]
pub struct EmptyObservableError;

/// A value travelling through the error channel on purpose.
///
/// `sink_effects` wraps matching values in an `Effect`, `lift_effects` turns
/// them back into values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Effect<T>(T);

impl<T> Effect<T> {
  pub fn new(value: T) -> Self { Effect(value) }

  #[inline]
  pub fn value(&self) -> &T { &self.0 }

  #[inline]
  pub fn into_value(self) -> T { self.0 }
}

/// Shorthand for [`Effect::new`], handy inside `map_effect` mappers.
pub fn effect<T>(value: T) -> Effect<T> { Effect::new(value) }

/// Error type used across the crate.
///
/// `E` is the application error, `S` the type of values routed through the
/// effect channel (uninhabited by default).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StateError<E, S = Infallible> {
  #[error("{0}")]
  Source(E),
  #[error("effect signal")]
  Effect(Effect<S>),
  #[error("suspense signal")]
  Suspense,
  #[error(transparent)]
  NoSubscribers(#[from] NoSubscribersError),
  #[error(transparent)]
  EmptyObservable(#[from] EmptyObservableError),
}

impl<E, S> StateError<E, S> {
  pub fn is_no_subscribers(&self) -> bool { matches!(self, StateError::NoSubscribers(_)) }

  pub fn is_empty_observable(&self) -> bool { matches!(self, StateError::EmptyObservable(_)) }

  /// The application error, if this is one.
  pub fn as_source(&self) -> Option<&E> {
    match self {
      StateError::Source(e) => Some(e),
      _ => None,
    }
  }
}

// ============================================================================
// Error channel contracts
// ============================================================================

/// Requirements on the error type of a state observable.
pub trait StateErr: Clone + From<NoSubscribersError> + From<EmptyObservableError> + 'static {
  /// The error used to signal a reset (see [`crate::suspense`]).
  fn suspense() -> Self;

  fn is_suspense(&self) -> bool;
}

/// Error types that can carry effect values of type `V`.
pub trait EffectErr<V>: Sized {
  fn effect(effect: Effect<V>) -> Self;

  /// Split out the effect, handing the error back untouched if it is not
  /// one.
  fn into_effect(self) -> Result<Effect<V>, Self>;
}

impl<E, S> StateErr for StateError<E, S>
where
  E: Clone + 'static,
  S: Clone + 'static,
{
  #[inline]
  fn suspense() -> Self { StateError::Suspense }

  #[inline]
  fn is_suspense(&self) -> bool { matches!(self, StateError::Suspense) }
}

impl<E, S> EffectErr<S> for StateError<E, S> {
  #[inline]
  fn effect(effect: Effect<S>) -> Self { StateError::Effect(effect) }

  fn into_effect(self) -> Result<Effect<S>, Self> {
    match self {
      StateError::Effect(effect) => Ok(effect),
      other => Err(other),
    }
  }
}
