use crate::{observable::Observable, observer::Observer, subscription::Subscription};

/// Emits `value` on subscription, then everything the source emits.
#[derive(Clone)]
pub struct StartWithOp<S: Observable> {
  pub(crate) source: S,
  pub(crate) value: S::Item,
}

impl<S> Observable for StartWithOp<S>
where
  S: Observable,
  S::Item: Clone,
{
  type Item = S::Item;
  type Err = S::Err;

  fn actual_subscribe<O>(self, mut observer: O) -> Subscription
  where
    O: Observer<S::Item, S::Err> + 'static,
  {
    observer.next(self.value);
    if observer.is_closed() {
      return Subscription::closed();
    }
    self.source.actual_subscribe(observer)
  }
}

#[cfg(test)]
mod test {
  use crate::prelude::*;
  use std::{cell::RefCell, rc::Rc};

  #[test]
  fn simple_integer() {
    let values = Rc::new(RefCell::new(vec![]));
    let v = values.clone();
    observable::from_iter::<_, ()>(1..4).start_with(0).subscribe(move |x| v.borrow_mut().push(x));
    assert_eq!(*values.borrow(), vec![0, 1, 2, 3]);
  }

  #[test]
  fn source_is_skipped_once_closed() {
    let values = Rc::new(RefCell::new(vec![]));
    let v = values.clone();
    observable::from_iter::<_, ()>(1..4)
      .start_with(0)
      .take(1)
      .subscribe(move |x| v.borrow_mut().push(x));
    assert_eq!(*values.borrow(), vec![0]);
  }
}
