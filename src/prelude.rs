//! Prelude module for convenient imports
//!
//! This module re-exports commonly used types and traits for easy access.

// Effect channel
pub use crate::effects::{Effects, LiftPolicy, MapEffect, SinkPolicy, Suspend};
// Errors
pub use crate::error::{
  effect, Effect, EffectErr, EmptyObservableError, NoSubscribersError, StateErr, StateError,
};
// Core traits
pub use crate::observable::{self, BoxedObservable, Observable};
pub use crate::observer::{Emitter, Observer};
// State
pub use crate::state::{
  state, state_with_default, Args, Completion, DefaultedStateObservable, FactoryDefault,
  PendingValue, Snapshot, StateFactory, StateObservable, WeakStateFactory,
};
// Subject
pub use crate::subject::Subject;
// Subscription
pub use crate::subscription::{Subscription, SubscriptionGuard};
// Suspense
pub use crate::suspense::{Suspendable, Suspense, Suspensible, SUSPENSE};
