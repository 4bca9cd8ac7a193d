use std::rc::Rc;

use crate::{
  observable::Observable,
  observer::{BoxedObserver, Observer},
  subscription::Subscription,
};

/// Object-safe view of an observable, subscribed through a shared reference.
pub trait DynObservable<Item, Err> {
  fn dyn_subscribe(&self, observer: BoxedObserver<Item, Err>) -> Subscription;
}

impl<S: Observable> DynObservable<S::Item, S::Err> for S {
  fn dyn_subscribe(&self, observer: BoxedObserver<S::Item, S::Err>) -> Subscription {
    self.clone().actual_subscribe(observer)
  }
}

/// Type-erased observable, used where sources of different concrete types
/// must share one type (factory producers, heterogeneous collections).
pub struct BoxedObservable<Item, Err>(Rc<dyn DynObservable<Item, Err>>);

impl<Item, Err> BoxedObservable<Item, Err> {
  pub fn new<S>(source: S) -> Self
  where
    S: Observable<Item = Item, Err = Err>,
  {
    BoxedObservable(Rc::new(source))
  }
}

impl<Item, Err> Clone for BoxedObservable<Item, Err> {
  fn clone(&self) -> Self { BoxedObservable(self.0.clone()) }
}

impl<Item: 'static, Err: 'static> Observable for BoxedObservable<Item, Err> {
  type Item = Item;
  type Err = Err;

  fn actual_subscribe<O>(self, observer: O) -> Subscription
  where
    O: Observer<Item, Err> + 'static,
  {
    self.0.dyn_subscribe(Box::new(observer))
  }

  fn box_it(self) -> BoxedObservable<Item, Err> { self }
}

#[cfg(test)]
mod test {
  use crate::prelude::*;
  use std::{cell::RefCell, rc::Rc};

  #[test]
  fn different_sources_share_one_type() {
    let sources: Vec<BoxedObservable<i32, ()>> = vec![
      observable::of(1).box_it(),
      observable::from_iter(vec![2, 3]).map(|v| v * 10).box_it(),
      observable::empty().box_it(),
    ];
    let values = Rc::new(RefCell::new(vec![]));
    for source in sources {
      let v = values.clone();
      source.subscribe(move |x| v.borrow_mut().push(x));
    }
    assert_eq!(*values.borrow(), vec![1, 20, 30]);
  }
}
