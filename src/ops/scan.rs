use crate::{observable::Observable, observer::Observer, subscription::Subscription};

/// Running accumulation. The accumulator lives in the observer, so every
/// subscription (and every resubscription after a reset) starts over from
/// the initial value.
#[derive(Clone)]
pub struct ScanOp<S, F, Acc> {
  pub(crate) source: S,
  pub(crate) func: F,
  pub(crate) initial: Acc,
}

impl<S, F, Acc> Observable for ScanOp<S, F, Acc>
where
  S: Observable,
  F: Fn(Acc, S::Item) -> Acc + Clone + 'static,
  Acc: Clone + 'static,
{
  type Item = Acc;
  type Err = S::Err;

  fn actual_subscribe<O>(self, observer: O) -> Subscription
  where
    O: Observer<Acc, S::Err> + 'static,
  {
    self.source.actual_subscribe(ScanObserver { observer, func: self.func, acc: self.initial })
  }
}

pub struct ScanObserver<O, F, Acc> {
  observer: O,
  func: F,
  acc: Acc,
}

impl<Item, Err, O, F, Acc> Observer<Item, Err> for ScanObserver<O, F, Acc>
where
  O: Observer<Acc, Err>,
  F: Fn(Acc, Item) -> Acc,
  Acc: Clone,
{
  fn next(&mut self, value: Item) {
    self.acc = (self.func)(self.acc.clone(), value);
    self.observer.next(self.acc.clone());
  }

  #[inline]
  fn error(self, err: Err) { self.observer.error(err) }

  #[inline]
  fn complete(self) { self.observer.complete() }

  #[inline]
  fn is_closed(&self) -> bool { self.observer.is_closed() }
}

#[cfg(test)]
mod test {
  use crate::prelude::*;
  use std::{cell::RefCell, rc::Rc};

  #[test]
  fn scan_initial() {
    let values = Rc::new(RefCell::new(vec![]));
    let v = values.clone();
    observable::from_iter::<_, ()>(vec![1, 1, 1, 1, 1])
      .scan(100, |acc, v| acc + v)
      .subscribe(move |x| v.borrow_mut().push(x));
    assert_eq!(*values.borrow(), vec![101, 102, 103, 104, 105]);
  }

  #[test]
  fn each_subscription_restarts() {
    let values = Rc::new(RefCell::new(vec![]));
    let running = observable::from_iter::<_, ()>(vec![1, 2]).scan(0, |acc, v| acc + v);
    for _ in 0..2 {
      let v = values.clone();
      running.clone().subscribe(move |x| v.borrow_mut().push(x));
    }
    assert_eq!(*values.borrow(), vec![1, 3, 1, 3]);
  }
}
