use crate::{observable::Observable, observer::Observer, subscription::Subscription};

/// Creates an observable that will on subscription defer to another observable
/// that is supplied by a supplier-function which will be run once at each
/// subscription
///
/// ```rust
/// # use rxstate::prelude::*;
///
/// observable::defer(|| {
///   println!("Hi!");
///   observable::of::<_, ()>("Hello!")
/// })
///   .subscribe(move |v| {
///     println!("{}", v);
///   });
/// // Prints: Hi!\nHello!\n
/// ```
pub fn defer<F, S>(observable_supplier: F) -> Defer<F>
where
  F: Fn() -> S + Clone + 'static,
  S: Observable,
{
  Defer(observable_supplier)
}

#[derive(Clone)]
pub struct Defer<F>(F);

impl<F, S> Observable for Defer<F>
where
  F: Fn() -> S + Clone + 'static,
  S: Observable,
{
  type Item = S::Item;
  type Err = S::Err;

  fn actual_subscribe<O>(self, observer: O) -> Subscription
  where
    O: Observer<S::Item, S::Err> + 'static,
  {
    (self.0)().actual_subscribe(observer)
  }
}

#[cfg(test)]
mod test {
  use crate::prelude::*;
  use std::{cell::Cell, rc::Rc};

  #[test]
  fn supplier_runs_per_subscription() {
    let calls = Rc::new(Cell::new(0));
    let c = calls.clone();
    let deferred = observable::defer(move || {
      c.set(c.get() + 1);
      observable::of::<_, ()>(1)
    });
    assert_eq!(calls.get(), 0);
    deferred.clone().subscribe(|_| {});
    deferred.subscribe(|_| {});
    assert_eq!(calls.get(), 2);
  }
}
