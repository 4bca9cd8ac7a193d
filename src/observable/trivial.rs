use crate::{
  observable::Observable, observer::Observer, subscription::Subscription, type_hint::TypeHint,
};

/// Creates an observable that emits no items, just terminates with an error.
///
/// # Arguments
///
/// * `e` - An error to emit and terminate with
pub fn throw_err<Item, Err: Clone>(e: Err) -> ThrowErr<Item, Err> { ThrowErr { err: e, _hint: TypeHint::new() } }

pub struct ThrowErr<Item, Err> {
  err: Err,
  _hint: TypeHint<Item>,
}

impl<Item, Err: Clone> Clone for ThrowErr<Item, Err> {
  fn clone(&self) -> Self { ThrowErr { err: self.err.clone(), _hint: TypeHint::new() } }
}

impl<Item: 'static, Err: Clone + 'static> Observable for ThrowErr<Item, Err> {
  type Item = Item;
  type Err = Err;

  fn actual_subscribe<O>(self, observer: O) -> Subscription
  where
    O: Observer<Item, Err> + 'static,
  {
    observer.error(self.err);
    Subscription::closed()
  }
}

/// Creates an observable that produces no values.
///
/// Completes immediately. Never emits an error.
pub fn empty<Item, Err>() -> Empty<Item, Err> { Empty(TypeHint::new()) }

pub struct Empty<Item, Err>(TypeHint<(Item, Err)>);

impl<Item, Err> Clone for Empty<Item, Err> {
  fn clone(&self) -> Self { Empty(TypeHint::new()) }
}

impl<Item: 'static, Err: 'static> Observable for Empty<Item, Err> {
  type Item = Item;
  type Err = Err;

  fn actual_subscribe<O>(self, observer: O) -> Subscription
  where
    O: Observer<Item, Err> + 'static,
  {
    observer.complete();
    Subscription::closed()
  }
}

/// Creates an observable that never emits anything and never terminates.
///
/// The subscription stays open until it is unsubscribed.
pub fn never<Item, Err>() -> Never<Item, Err> { Never(TypeHint::new()) }

pub struct Never<Item, Err>(TypeHint<(Item, Err)>);

impl<Item, Err> Clone for Never<Item, Err> {
  fn clone(&self) -> Self { Never(TypeHint::new()) }
}

impl<Item: 'static, Err: 'static> Observable for Never<Item, Err> {
  type Item = Item;
  type Err = Err;

  fn actual_subscribe<O>(self, _observer: O) -> Subscription
  where
    O: Observer<Item, Err> + 'static,
  {
    Subscription::new()
  }
}

#[cfg(test)]
mod test {
  use crate::prelude::*;
  use std::{cell::Cell, rc::Rc};

  #[test]
  fn throw() {
    let value_emitted = Rc::new(Cell::new(false));
    let completed = Rc::new(Cell::new(false));
    let error_emitted = Rc::new(Cell::new(String::new()));
    let (v, c, e) = (value_emitted.clone(), completed.clone(), error_emitted.clone());
    observable::throw_err::<i32, _>(String::from("error")).subscribe_all(
      move |_| v.set(true),
      move |err| e.set(err),
      move || c.set(true),
    );
    assert!(!value_emitted.get());
    assert!(!completed.get());
    assert_eq!(error_emitted.take(), "error");
  }

  #[test]
  fn empty() {
    let hits = Rc::new(Cell::new(0));
    let completed = Rc::new(Cell::new(false));
    let (h, c) = (hits.clone(), completed.clone());
    observable::empty::<i32, ()>().subscribe_all(
      move |_| h.set(h.get() + 1),
      |_| {},
      move || c.set(true),
    );
    assert_eq!(hits.get(), 0);
    assert!(completed.get());
  }

  #[test]
  fn never_stays_open() {
    let sub = observable::never::<i32, ()>().subscribe(|_| {});
    assert!(!sub.is_closed());
    sub.unsubscribe();
    assert!(sub.is_closed());
  }
}
