//! Observer trait and implementations
//!
//! The Observer trait defines the consumer of data in the reactive pattern.
//! It provides three methods: next (for values), error (for errors), and
//! complete (for stream completion).

// ============================================================================
// Observer Trait
// ============================================================================

/// Observer trait: The consumer of data in reactive programming
///
/// An Observer receives values, errors, and completion notifications from
/// an Observable.
pub trait Observer<Item, Err> {
  /// Receive the next value from the observable
  fn next(&mut self, value: Item);

  /// Handle an error from the observable
  ///
  /// This consumes the observer, as no more values can be emitted after an
  /// error
  fn error(self, err: Err);

  /// Handle completion of the observable
  ///
  /// This consumes the observer, as no more values can be emitted after
  /// completion
  fn complete(self);

  /// Checks if the observer is closed.
  ///
  /// Synchronous sources (like `from_iter`) poll this between emissions and
  /// stop early once it returns `true`, for example after `take` is done or
  /// after the last consumer of a state observable went away.
  fn is_closed(&self) -> bool;
}

// ============================================================================
// Emitter Trait
// ============================================================================

/// The producer-side facade handed to [`create`](crate::observable::create).
///
/// Unlike `Observer`, every method takes `&mut self`, so the producer closure
/// can be written against `&mut dyn Emitter` without knowing the concrete
/// observer chain behind it. Notifications after a terminal one are ignored.
pub trait Emitter<Item, Err> {
  fn next(&mut self, value: Item);

  fn error(&mut self, err: Err);

  fn complete(&mut self);

  fn is_closed(&self) -> bool;
}

// ============================================================================
// Type erasure
// ============================================================================

/// Object-safe mirror of [`Observer`], so observers can be stored in
/// collections (subjects, state channels, sink links).
pub trait DynObserver<Item, Err> {
  fn box_next(&mut self, value: Item);

  fn box_error(self: Box<Self>, err: Err);

  fn box_complete(self: Box<Self>);

  fn box_is_closed(&self) -> bool;
}

pub type BoxedObserver<Item, Err> = Box<dyn DynObserver<Item, Err>>;

impl<Item, Err, O> DynObserver<Item, Err> for O
where
  O: Observer<Item, Err>,
{
  #[inline]
  fn box_next(&mut self, value: Item) { self.next(value) }

  #[inline]
  fn box_error(self: Box<Self>, err: Err) { (*self).error(err) }

  #[inline]
  fn box_complete(self: Box<Self>) { (*self).complete() }

  #[inline]
  fn box_is_closed(&self) -> bool { self.is_closed() }
}

impl<Item, Err> Observer<Item, Err> for BoxedObserver<Item, Err> {
  #[inline]
  fn next(&mut self, value: Item) { (**self).box_next(value) }

  #[inline]
  fn error(self, err: Err) { self.box_error(err) }

  #[inline]
  fn complete(self) { self.box_complete() }

  #[inline]
  fn is_closed(&self) -> bool { (**self).box_is_closed() }
}

// ============================================================================
// Closure observers
// ============================================================================

/// Observer that only cares about values; errors and completion are dropped.
#[derive(Clone)]
pub struct ObserverNext<N>(pub N);

impl<Item, Err, N> Observer<Item, Err> for ObserverNext<N>
where
  N: FnMut(Item),
{
  #[inline]
  fn next(&mut self, value: Item) { (self.0)(value) }

  fn error(self, _err: Err) {}

  fn complete(self) {}

  #[inline]
  fn is_closed(&self) -> bool { false }
}

/// Observer built from a value handler and an error handler.
#[derive(Clone)]
pub struct ObserverErr<N, E> {
  pub next: N,
  pub error: E,
}

impl<Item, Err, N, E> Observer<Item, Err> for ObserverErr<N, E>
where
  N: FnMut(Item),
  E: FnOnce(Err),
{
  #[inline]
  fn next(&mut self, value: Item) { (self.next)(value) }

  fn error(self, err: Err) { (self.error)(err) }

  fn complete(self) {}

  #[inline]
  fn is_closed(&self) -> bool { false }
}

/// Observer built from handlers for all three notifications.
#[derive(Clone)]
pub struct ObserverAll<N, E, C> {
  pub next: N,
  pub error: E,
  pub complete: C,
}

impl<Item, Err, N, E, C> Observer<Item, Err> for ObserverAll<N, E, C>
where
  N: FnMut(Item),
  E: FnOnce(Err),
  C: FnOnce(),
{
  #[inline]
  fn next(&mut self, value: Item) { (self.next)(value) }

  fn error(self, err: Err) { (self.error)(err) }

  fn complete(self) { (self.complete)() }

  #[inline]
  fn is_closed(&self) -> bool { false }
}

#[cfg(test)]
mod test {
  use super::*;
  use std::{cell::RefCell, rc::Rc};

  #[test]
  fn boxed_observer_forwards_everything() {
    let log = Rc::new(RefCell::new(vec![]));
    let (l1, l2, l3) = (log.clone(), log.clone(), log.clone());
    let mut boxed: BoxedObserver<i32, &str> = Box::new(ObserverAll {
      next: move |v: i32| l1.borrow_mut().push(format!("next {v}")),
      error: move |e: &str| l2.borrow_mut().push(format!("error {e}")),
      complete: move || l3.borrow_mut().push("complete".to_string()),
    });
    boxed.next(1);
    assert!(!boxed.is_closed());
    boxed.error("boom");
    assert_eq!(*log.borrow(), vec!["next 1", "error boom"]);
  }

  #[test]
  fn boxed_observer_reports_its_inner_state() {
    let log = Rc::new(RefCell::new(vec![]));
    let (l1, l2) = (log.clone(), log.clone());
    let mut boxed: BoxedObserver<i32, ()> = Box::new(ObserverAll {
      next: move |v: i32| l1.borrow_mut().push(v),
      error: |_: ()| {},
      complete: move || l2.borrow_mut().push(-1),
    });
    for v in 0..3 {
      boxed.next(v);
    }
    assert!(!Observer::<i32, ()>::is_closed(&boxed));
    boxed.complete();
    assert_eq!(*log.borrow(), vec![0, 1, 2, -1]);
  }

  #[test]
  fn next_only_observer_ignores_terminals() {
    let mut sum = 0;
    let mut observer = ObserverNext(|v: i32| sum += v);
    Observer::<i32, ()>::next(&mut observer, 2);
    Observer::<i32, ()>::next(&mut observer, 3);
    Observer::<i32, ()>::complete(observer);
    assert_eq!(sum, 5);
  }
}
