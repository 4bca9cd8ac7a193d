use smallvec::SmallVec;
use std::{
  cell::RefCell,
  fmt::{Debug, Formatter},
  rc::Rc,
};

/// Cancellation handle returned by every `subscribe` call.
///
/// A `Subscription` is a cheap, cloneable handle to a shared teardown list.
/// Clones observe the same state: unsubscribing one of them closes all of
/// them. Unsubscribing is idempotent and may happen from inside a
/// notification that the subscription itself is delivering.
#[derive(Clone, Default)]
pub struct Subscription(Rc<RefCell<Inner>>);

enum Teardown {
  Fn(Box<dyn FnOnce()>),
  Child(Subscription),
}

#[derive(Default)]
struct Inner {
  closed: bool,
  teardown: SmallVec<[Teardown; 1]>,
}

impl Subscription {
  pub fn new() -> Self { Self::default() }

  /// A subscription that is already closed, for sources that finished
  /// synchronously.
  pub fn closed() -> Self {
    let subscription = Self::default();
    subscription.0.borrow_mut().closed = true;
    subscription
  }

  pub fn from_fn(f: impl FnOnce() + 'static) -> Self {
    let subscription = Self::default();
    subscription.add_fn(f);
    subscription
  }

  /// Attach a child subscription. If `self` is already closed the child is
  /// unsubscribed right away.
  pub fn add(&self, child: Subscription) {
    if Rc::ptr_eq(&self.0, &child.0) {
      return;
    }
    let child = {
      let mut inner = self.0.borrow_mut();
      if inner.closed {
        Some(child)
      } else {
        inner.teardown.retain(|t| !matches!(t, Teardown::Child(c) if c.is_closed()));
        inner.teardown.push(Teardown::Child(child));
        None
      }
    };
    if let Some(child) = child {
      child.unsubscribe();
    }
  }

  /// Attach a teardown closure. If `self` is already closed it runs right
  /// away.
  pub fn add_fn(&self, f: impl FnOnce() + 'static) {
    let mut inner = self.0.borrow_mut();
    if inner.closed {
      drop(inner);
      f();
    } else {
      inner.teardown.push(Teardown::Fn(Box::new(f)));
    }
  }

  pub fn unsubscribe(&self) {
    let teardown = {
      let mut inner = self.0.borrow_mut();
      if inner.closed {
        return;
      }
      inner.closed = true;
      std::mem::take(&mut inner.teardown)
    };
    for t in teardown {
      match t {
        Teardown::Fn(f) => f(),
        Teardown::Child(child) => child.unsubscribe(),
      }
    }
  }

  #[inline]
  pub fn is_closed(&self) -> bool { self.0.borrow().closed }

  pub fn teardown_size(&self) -> usize { self.0.borrow().teardown.len() }

  /// Returns a guard that unsubscribes when dropped.
  pub fn unsubscribe_when_dropped(self) -> SubscriptionGuard { SubscriptionGuard(self) }
}

impl Debug for Subscription {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    match self.0.try_borrow() {
      Ok(inner) => f
        .debug_struct("Subscription")
        .field("closed", &inner.closed)
        .field("teardown_count", &inner.teardown.len())
        .finish(),
      Err(_) => f.write_str("Subscription(<busy>)"),
    }
  }
}

/// An RAII implementation of a "scoped subscribed" of a subscription.
/// When this structure is dropped (falls out of scope), the subscription will
/// be unsubscribed.
///
/// This structure is created by the
/// [`unsubscribe_when_dropped`](Subscription::unsubscribe_when_dropped)
/// method on [`Subscription`].
#[derive(Debug)]
#[must_use]
pub struct SubscriptionGuard(Subscription);

impl SubscriptionGuard {
  pub fn new(subscription: Subscription) -> Self { Self(subscription) }
}

impl Drop for SubscriptionGuard {
  #[inline]
  fn drop(&mut self) { self.0.unsubscribe() }
}

#[cfg(test)]
mod test {
  use super::*;
  use std::cell::Cell;

  #[test]
  fn unsubscribe_runs_teardown_once() {
    let hits = Rc::new(Cell::new(0));
    let c = hits.clone();
    let sub = Subscription::from_fn(move || c.set(c.get() + 1));
    sub.unsubscribe();
    sub.clone().unsubscribe();
    assert!(sub.is_closed());
    assert_eq!(hits.get(), 1);
  }

  #[test]
  fn add_to_closed_tears_down_child() {
    let parent = Subscription::closed();
    let child = Subscription::new();
    parent.add(child.clone());
    assert!(child.is_closed());
  }

  #[test]
  fn add_same_is_ignored() {
    let sub = Subscription::new();
    sub.add(sub.clone());
    assert_eq!(sub.teardown_size(), 0);
  }

  #[test]
  fn closed_children_are_pruned() {
    let parent = Subscription::new();
    let first = Subscription::new();
    parent.add(first.clone());
    first.unsubscribe();
    parent.add(Subscription::new());
    assert_eq!(parent.teardown_size(), 1);
  }

  #[test]
  fn reentrant_unsubscribe_from_teardown() {
    let sub = Subscription::new();
    let inner = sub.clone();
    sub.add_fn(move || inner.unsubscribe());
    sub.unsubscribe();
    assert!(sub.is_closed());
  }

  #[test]
  fn guard_unsubscribes_on_drop() {
    let sub = Subscription::new();
    {
      let _guard = sub.clone().unsubscribe_when_dropped();
    }
    assert!(sub.is_closed());
  }
}
