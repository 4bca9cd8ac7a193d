use crate::{observable::Observable, observer::Observer, subscription::Subscription};

/// Emits only the first `count` values emitted by the source Observable.
///
/// After that, it completes, regardless if the source completes. A `count`
/// of zero completes immediately on subscription.
#[derive(Clone)]
pub struct TakeOp<S> {
  pub(crate) source: S,
  pub(crate) count: usize,
}

impl<S: Observable> Observable for TakeOp<S> {
  type Item = S::Item;
  type Err = S::Err;

  fn actual_subscribe<O>(self, observer: O) -> Subscription
  where
    O: Observer<S::Item, S::Err> + 'static,
  {
    if self.count == 0 {
      observer.complete();
      return Subscription::closed();
    }
    self.source.actual_subscribe(TakeObserver { observer: Some(observer), remaining: self.count })
  }
}

pub struct TakeObserver<O> {
  observer: Option<O>,
  remaining: usize,
}

impl<Item, Err, O> Observer<Item, Err> for TakeObserver<O>
where
  O: Observer<Item, Err>,
{
  fn next(&mut self, value: Item) {
    if let Some(observer) = self.observer.as_mut() {
      observer.next(value);
      self.remaining -= 1;
      if self.remaining == 0 {
        if let Some(observer) = self.observer.take() {
          observer.complete();
        }
      }
    }
  }

  fn error(self, err: Err) {
    if let Some(observer) = self.observer {
      observer.error(err)
    }
  }

  fn complete(self) {
    if let Some(observer) = self.observer {
      observer.complete()
    }
  }

  fn is_closed(&self) -> bool { self.observer.as_ref().map_or(true, |o| o.is_closed()) }
}

#[cfg(test)]
mod test {
  use crate::prelude::*;
  use std::{
    cell::{Cell, RefCell},
    rc::Rc,
  };

  #[test]
  fn base_function() {
    let completed = Rc::new(Cell::new(false));
    let next_count = Rc::new(Cell::new(0));
    let (c, n) = (completed.clone(), next_count.clone());
    observable::from_iter::<_, ()>(0..100).take(5).subscribe_all(
      move |_| n.set(n.get() + 1),
      |_| {},
      move || c.set(true),
    );
    assert!(completed.get());
    assert_eq!(next_count.get(), 5);
  }

  #[test]
  fn take_completes_hot_source_subscription() {
    let mut subject = Subject::<i32, ()>::new();
    let values = Rc::new(RefCell::new(vec![]));
    let v = values.clone();
    let sub = subject.clone().take(2).subscribe(move |x| v.borrow_mut().push(x));
    subject.next(1);
    subject.next(2);
    subject.next(3);
    assert_eq!(*values.borrow(), vec![1, 2]);
    assert!(sub.is_closed());
    assert_eq!(subject.observer_count(), 0);
  }
}
