use crate::{
  observable::Observable,
  observer::{Emitter, Observer},
  subscriber::Subscriber,
  subscription::Subscription,
  type_hint::TypeHint,
};

/// Observable created from a function.
///
/// The function runs once per subscription and pushes notifications through
/// the [`Emitter`] it receives. It returns the teardown for that
/// subscription: either `()` for none, or a [`Subscription`].
///
/// ```rust
/// use rxstate::prelude::*;
///
/// let source = observable::create(|emitter: &mut dyn Emitter<i32, ()>| {
///   for i in 0..10 {
///     if emitter.is_closed() {
///       break;
///     }
///     emitter.next(i);
///   }
/// });
///
/// let collected = std::rc::Rc::new(std::cell::RefCell::new(vec![]));
/// let c = collected.clone();
/// source.take(3).subscribe(move |v| c.borrow_mut().push(v));
/// assert_eq!(*collected.borrow(), vec![0, 1, 2]);
/// ```
pub fn create<Item, Err, F, U>(f: F) -> Create<F, Item, Err>
where
  F: Fn(&mut dyn Emitter<Item, Err>) -> U + Clone + 'static,
  U: Into<Subscription>,
{
  Create { func: f, _hint: TypeHint::new() }
}

pub struct Create<F, Item, Err> {
  func: F,
  _hint: TypeHint<(Item, Err)>,
}

impl<F: Clone, Item, Err> Clone for Create<F, Item, Err> {
  fn clone(&self) -> Self { Create { func: self.func.clone(), _hint: TypeHint::new() } }
}

impl From<()> for Subscription {
  fn from(_: ()) -> Self { Subscription::closed() }
}

impl<F, Item, Err, U> Observable for Create<F, Item, Err>
where
  F: Fn(&mut dyn Emitter<Item, Err>) -> U + Clone + 'static,
  U: Into<Subscription>,
  Item: 'static,
  Err: 'static,
{
  type Item = Item;
  type Err = Err;

  fn actual_subscribe<O>(self, observer: O) -> Subscription
  where
    O: Observer<Item, Err> + 'static,
  {
    let mut subscriber = Subscriber::new(observer);
    let teardown: Subscription = (self.func)(&mut subscriber).into();
    let handle = subscriber.subscription().clone();
    if !teardown.is_closed() {
      handle.add(teardown);
    }
    handle
  }
}

#[cfg(test)]
mod test {
  use crate::prelude::*;
  use std::{
    cell::{Cell, RefCell},
    rc::Rc,
  };

  #[test]
  fn emits_and_completes() {
    let values = Rc::new(RefCell::new(vec![]));
    let completed = Rc::new(Cell::new(false));
    let (v, c) = (values.clone(), completed.clone());
    observable::create(|emitter: &mut dyn Emitter<i32, ()>| {
      emitter.next(1);
      emitter.next(2);
      emitter.complete();
      emitter.next(3);
    })
    .subscribe_all(move |x| v.borrow_mut().push(x), |_| {}, move || c.set(true));
    assert_eq!(*values.borrow(), vec![1, 2]);
    assert!(completed.get());
  }

  #[test]
  fn returned_teardown_runs_on_unsubscribe() {
    let torn_down = Rc::new(Cell::new(false));
    let t = torn_down.clone();
    let sub = observable::create(move |_: &mut dyn Emitter<i32, ()>| {
      let t = t.clone();
      Subscription::from_fn(move || t.set(true))
    })
    .subscribe(|_| {});
    assert!(!torn_down.get());
    sub.unsubscribe();
    assert!(torn_down.get());
  }

  #[test]
  fn teardown_runs_after_synchronous_completion() {
    let torn_down = Rc::new(Cell::new(false));
    let t = torn_down.clone();
    observable::create(move |emitter: &mut dyn Emitter<i32, ()>| {
      emitter.complete();
      let t = t.clone();
      Subscription::from_fn(move || t.set(true))
    })
    .subscribe(|_| {});
    assert!(torn_down.get());
  }
}
