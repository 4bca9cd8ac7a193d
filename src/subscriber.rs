use crate::{
  observer::{Emitter, Observer},
  subscription::Subscription,
};

/// Binds a downstream observer to the [`Subscription`] handed back to the
/// caller.
///
/// Once the subscription is closed no more notifications reach the observer.
/// After a terminal notification the subscriber unsubscribes itself, which
/// releases whatever upstream resources were attached to the handle.
pub struct Subscriber<O> {
  observer: Option<O>,
  subscription: Subscription,
}

impl<O> Subscriber<O> {
  pub fn new(observer: O) -> Self { Self { observer: Some(observer), subscription: Subscription::new() } }

  #[inline]
  pub fn subscription(&self) -> &Subscription { &self.subscription }
}

impl<Item, Err, O> Observer<Item, Err> for Subscriber<O>
where
  O: Observer<Item, Err>,
{
  fn next(&mut self, value: Item) {
    if self.subscription.is_closed() {
      return;
    }
    if let Some(observer) = self.observer.as_mut() {
      observer.next(value);
    }
  }

  fn error(mut self, err: Err) { Emitter::<Item, Err>::error(&mut self, err) }

  fn complete(mut self) { Emitter::<Item, Err>::complete(&mut self) }

  fn is_closed(&self) -> bool {
    self.subscription.is_closed() || self.observer.as_ref().map_or(true, |o| o.is_closed())
  }
}

impl<Item, Err, O> Emitter<Item, Err> for Subscriber<O>
where
  O: Observer<Item, Err>,
{
  #[inline]
  fn next(&mut self, value: Item) { Observer::<Item, Err>::next(self, value) }

  fn error(&mut self, err: Err) {
    if self.subscription.is_closed() {
      return;
    }
    if let Some(observer) = self.observer.take() {
      observer.error(err);
      self.subscription.unsubscribe();
    }
  }

  fn complete(&mut self) {
    if self.subscription.is_closed() {
      return;
    }
    if let Some(observer) = self.observer.take() {
      observer.complete();
      self.subscription.unsubscribe();
    }
  }

  #[inline]
  fn is_closed(&self) -> bool { Observer::<Item, Err>::is_closed(self) }
}

#[cfg(test)]
mod test {
  use super::*;
  use crate::observer::ObserverAll;
  use std::{cell::RefCell, rc::Rc};

  #[test]
  fn stops_after_unsubscribe() {
    let values = Rc::new(RefCell::new(vec![]));
    let v = values.clone();
    let mut subscriber = Subscriber::new(ObserverAll {
      next: move |x: i32| v.borrow_mut().push(x),
      error: |_: ()| {},
      complete: || {},
    });
    Observer::<i32, ()>::next(&mut subscriber, 1);
    subscriber.subscription().unsubscribe();
    Observer::<i32, ()>::next(&mut subscriber, 2);
    assert!(Observer::<i32, ()>::is_closed(&subscriber));
    assert_eq!(*values.borrow(), vec![1]);
  }

  #[test]
  fn terminal_notification_closes_the_handle() {
    let completed = Rc::new(RefCell::new(false));
    let c = completed.clone();
    let mut subscriber = Subscriber::new(ObserverAll {
      next: |_: i32| {},
      error: |_: ()| {},
      complete: move || *c.borrow_mut() = true,
    });
    let handle = subscriber.subscription().clone();
    Emitter::<i32, ()>::complete(&mut subscriber);
    Emitter::<i32, ()>::complete(&mut subscriber);
    assert!(*completed.borrow());
    assert!(handle.is_closed());
  }
}
