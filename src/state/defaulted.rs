use super::{Completion, Snapshot, StateObservable};
use crate::{
  error::StateErr,
  observable::Observable,
  observer::Observer,
  subscription::Subscription,
  suspense::Suspendable,
};

/// A [`StateObservable`] that always has a value to show.
///
/// Returned by [`with_default`](Observable::with_default) and
/// [`state_with_default`](super::state_with_default). Because a default is
/// present, [`get_value`](Self::get_value) never has to wait or fail.
pub struct DefaultedStateObservable<T, Err> {
  state: StateObservable<T, Err>,
  default: T,
}

impl<T: Clone, Err> Clone for DefaultedStateObservable<T, Err> {
  fn clone(&self) -> Self { DefaultedStateObservable { state: self.state.clone(), default: self.default.clone() } }
}

impl<T, Err> DefaultedStateObservable<T, Err>
where
  T: Suspendable + Clone + 'static,
  Err: StateErr,
{
  pub fn new<S>(source: S, default: T) -> Self
  where
    S: Observable<Item = T, Err = Err>,
  {
    DefaultedStateObservable { state: StateObservable::with_default_value(source, default.clone()), default }
  }

  /// The latest value, or the default while there is none.
  pub fn get_value(&self) -> T {
    match self.state.get_value() {
      Ok(Snapshot::Ready(value)) => value,
      _ => self.default.clone(),
    }
  }

  #[inline]
  pub fn default_value(&self) -> T { self.default.clone() }

  #[inline]
  pub fn get_ref_count(&self) -> usize { self.state.get_ref_count() }

  #[inline]
  pub fn is_active(&self) -> bool { self.state.is_active() }

  pub fn completion(&self) -> Completion<T, Err> { self.state.completion() }

  /// See [`StateObservable::pipe_state`].
  pub fn pipe_state<F, R>(self, f: F) -> StateObservable<R::Item, R::Err>
  where
    F: FnOnce(Self) -> R,
    R: Observable,
    R::Item: Suspendable + Clone,
    R::Err: StateErr,
  {
    f(self).into_state()
  }

  #[inline]
  pub fn as_state(&self) -> &StateObservable<T, Err> { &self.state }
}

impl<T, Err> Observable for DefaultedStateObservable<T, Err>
where
  T: Suspendable + Clone + 'static,
  Err: StateErr,
{
  type Item = T;
  type Err = Err;

  fn actual_subscribe<O>(self, observer: O) -> Subscription
  where
    O: Observer<T, Err> + 'static,
  {
    self.state.actual_subscribe(observer)
  }

  fn into_state(self) -> StateObservable<T, Err>
  where
    Self::Item: Suspendable + Clone,
    Self::Err: StateErr,
  {
    self.state
  }
}
