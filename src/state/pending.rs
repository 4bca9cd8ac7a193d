use std::{
  fmt::{Debug, Formatter},
  future::{Future, IntoFuture},
  pin::Pin,
  rc::Rc,
  task::{Context, Poll},
};

use futures::{
  channel::oneshot,
  future::{self, Either, FutureExt, Shared},
};

use crate::error::{NoSubscribersError, StateErr};

/// A value that is not available yet.
///
/// Returned by [`get_value`](super::StateObservable::get_value) when the
/// state observable has subscribers but has not produced a usable value.
/// Clones share one settlement: they all resolve with the same value or fail
/// with the same error. Dropping every clone does not affect the state
/// observable.
pub struct PendingValue<T, Err> {
  inner: Shared<oneshot::Receiver<Result<T, Err>>>,
}

impl<T, Err> Clone for PendingValue<T, Err> {
  fn clone(&self) -> Self { PendingValue { inner: self.inner.clone() } }
}

impl<T, Err> PendingValue<T, Err>
where
  T: Clone,
  Err: Clone,
{
  /// Whether both handles stand for the same pending request.
  #[inline]
  pub fn ptr_eq(&self, other: &Self) -> bool { self.inner.ptr_eq(&other.inner) }

  /// The outcome, if the value already settled.
  pub fn settled(&self) -> Option<Result<T, Err>>
  where
    Err: From<NoSubscribersError>,
  {
    self.inner.clone().now_or_never().map(flatten)
  }
}

impl<T, Err> Future for PendingValue<T, Err>
where
  T: Clone,
  Err: Clone + From<NoSubscribersError>,
{
  type Output = Result<T, Err>;

  fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
    self.inner.poll_unpin(cx).map(flatten)
  }
}

impl<T, Err> Debug for PendingValue<T, Err> {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result { f.write_str("PendingValue") }
}

/// A sender dropped without a result means the state observable went away
/// before settling: nobody is subscribed any more.
fn flatten<T, Err: From<NoSubscribersError>>(
  outcome: Result<Result<T, Err>, oneshot::Canceled>,
) -> Result<T, Err> {
  outcome.unwrap_or_else(|_| Err(NoSubscribersError.into()))
}

/// The producing side of a [`PendingValue`], owned by the state core.
pub(crate) struct PendingSlot<T, Err> {
  sender: oneshot::Sender<Result<T, Err>>,
  value: PendingValue<T, Err>,
  filter: Option<Rc<dyn Fn(&T) -> bool>>,
  /// Set once a suspense error reached the slot. From then on the slot can
  /// only fail with the suspense error, whatever error comes next.
  pub(crate) suspended: bool,
}

impl<T: Clone, Err: StateErr> PendingSlot<T, Err> {
  pub(crate) fn new(filter: Option<Rc<dyn Fn(&T) -> bool>>) -> Self {
    let (sender, receiver) = oneshot::channel();
    PendingSlot { sender, value: PendingValue { inner: receiver.shared() }, filter, suspended: false }
  }

  #[inline]
  pub(crate) fn value(&self) -> PendingValue<T, Err> { self.value.clone() }

  pub(crate) fn accepts(&self, value: &T) -> bool { self.filter.as_ref().map_or(true, |f| f(value)) }

  pub(crate) fn resolve(self, value: T) {
    // Nobody waiting any more is fine.
    let _ = self.sender.send(Ok(value));
  }

  pub(crate) fn reject(self, err: Err) {
    let err = if self.suspended { Err::suspense() } else { err };
    let _ = self.sender.send(Err(err));
  }
}

/// Result of reading a state observable synchronously.
#[derive(Debug, Clone)]
pub enum Snapshot<T, Err> {
  Ready(T),
  Pending(PendingValue<T, Err>),
}

impl<T, Err> Snapshot<T, Err> {
  pub fn ready(self) -> Option<T> {
    match self {
      Snapshot::Ready(v) => Some(v),
      Snapshot::Pending(_) => None,
    }
  }

  pub fn pending(self) -> Option<PendingValue<T, Err>> {
    match self {
      Snapshot::Ready(_) => None,
      Snapshot::Pending(p) => Some(p),
    }
  }

  #[inline]
  pub fn is_pending(&self) -> bool { matches!(self, Snapshot::Pending(_)) }
}

impl<T, Err> IntoFuture for Snapshot<T, Err>
where
  T: Clone,
  Err: Clone + From<NoSubscribersError>,
{
  type Output = Result<T, Err>;
  type IntoFuture = Either<future::Ready<Result<T, Err>>, PendingValue<T, Err>>;

  fn into_future(self) -> Self::IntoFuture {
    match self {
      Snapshot::Ready(v) => Either::Left(future::ready(Ok(v))),
      Snapshot::Pending(p) => Either::Right(p),
    }
  }
}
