//! Routing values through the error channel.
//!
//! A *sink* operator turns selected values into error signals. Every
//! operator between the sink and the matching *lift* sees an error and tears
//! down its per-subscription state; the lift turns the signal back into a
//! value and resubscribes upstream. When the resubscription reaches the sink
//! synchronously, from inside the error delivery, the sink hands its still
//! running upstream subscription to the new subscriber instead of
//! subscribing to the source again. Only when nobody resubscribes does the
//! sink release its upstream.
//!
//! What counts as a signal is decided by a policy:
//!
//! - [`Effects`]: values equal to one of a given set travel as
//!   [`Effect`](crate::error::Effect) errors,
//! - [`Suspend`]: `Suspensible::Suspense` travels as the suspense error,
//! - [`MapEffect`]: a mapper decides per value.

mod lift;
mod sink;

use std::rc::Rc;

pub use lift::*;
pub use sink::*;

use crate::{
  error::{Effect, EffectErr, StateErr},
  suspense::Suspensible,
};

/// Decides, for every value reaching a sink, whether it passes through or
/// turns into an error signal.
pub trait SinkPolicy<In, Err> {
  type Out;

  fn route(&self, value: In) -> Result<Self::Out, Err>;
}

/// Decides which errors a lift turns back into values.
pub trait LiftPolicy<In, Err> {
  type Out;

  fn pass(&self, value: In) -> Self::Out;

  /// `Ok` lifts the error into a value (and makes the lift resubscribe),
  /// `Err` forwards it downstream.
  fn lift(&self, err: Err) -> Result<Self::Out, Err>;
}

// ============================================================================
// Effects
// ============================================================================

/// A set of values that travel as effects. An empty set lifts every effect.
pub struct Effects<T>(Rc<[T]>);

impl<T> Effects<T> {
  pub fn new(values: impl IntoIterator<Item = T>) -> Self { Effects(values.into_iter().collect()) }

  #[inline]
  pub fn is_empty(&self) -> bool { self.0.is_empty() }
}

impl<T: PartialEq> Effects<T> {
  #[inline]
  pub fn contains(&self, value: &T) -> bool { self.0.contains(value) }
}

impl<T> Clone for Effects<T> {
  fn clone(&self) -> Self { Effects(self.0.clone()) }
}

impl<T, Err> SinkPolicy<T, Err> for Effects<T>
where
  T: PartialEq,
  Err: EffectErr<T>,
{
  type Out = T;

  fn route(&self, value: T) -> Result<T, Err> {
    if self.contains(&value) {
      Err(Err::effect(Effect::new(value)))
    } else {
      Ok(value)
    }
  }
}

impl<T, Err> LiftPolicy<T, Err> for Effects<T>
where
  T: PartialEq,
  Err: EffectErr<T>,
{
  type Out = T;

  #[inline]
  fn pass(&self, value: T) -> T { value }

  fn lift(&self, err: Err) -> Result<T, Err> {
    match err.into_effect() {
      Ok(effect) if self.is_empty() || self.contains(effect.value()) => Ok(effect.into_value()),
      Ok(effect) => Err(Err::effect(effect)),
      Err(err) => Err(err),
    }
  }
}

// ============================================================================
// Suspense
// ============================================================================

/// Policy for `sink_suspense`/`lift_suspense`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Suspend;

impl<T, Err: StateErr> SinkPolicy<Suspensible<T>, Err> for Suspend {
  type Out = T;

  fn route(&self, value: Suspensible<T>) -> Result<T, Err> {
    match value {
      Suspensible::Ready(v) => Ok(v),
      Suspensible::Suspense => Err(Err::suspense()),
    }
  }
}

impl<T, Err: StateErr> LiftPolicy<T, Err> for Suspend {
  type Out = Suspensible<T>;

  #[inline]
  fn pass(&self, value: T) -> Suspensible<T> { Suspensible::Ready(value) }

  fn lift(&self, err: Err) -> Result<Suspensible<T>, Err> {
    if err.is_suspense() {
      Ok(Suspensible::Suspense)
    } else {
      Err(err)
    }
  }
}

// ============================================================================
// MapEffect
// ============================================================================

/// Mapper-driven sink: `Err(effect)` results become effect signals.
#[derive(Clone)]
pub struct MapEffect<F>(pub(crate) F);

impl<In, Out, V, F, Err> SinkPolicy<In, Err> for MapEffect<F>
where
  F: Fn(In) -> Result<Out, Effect<V>>,
  Err: EffectErr<V>,
{
  type Out = Out;

  fn route(&self, value: In) -> Result<Out, Err> { (self.0)(value).map_err(Err::effect) }
}
