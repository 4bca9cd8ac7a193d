//! Hot multicast channel.
//!
//! A [`Subject`] is both an [`Observer`] and an [`Observable`]: whatever is
//! pushed into it is broadcast to every observer subscribed at that moment.
//! The state observable uses one subject per activation as its multicast
//! channel; tests and applications use subjects as controllable producers.
//!
//! Broadcasting is reentrancy safe. Observers may subscribe, unsubscribe, or
//! push new values into the same subject from inside a notification:
//!
//! - observers that join during a broadcast do not receive the value being
//!   broadcast,
//! - an observer that is still busy with a previous notification gets the new
//!   one queued and delivered in order once it returns,
//! - observers that report `is_closed` after a value are dropped.

mod subscribers;

pub(crate) use subscribers::Notification;
use subscribers::Subscribers;

use crate::{
  observable::Observable,
  observer::{BoxedObserver, Observer},
  rc::MutRc,
  subscription::Subscription,
};

enum Stopped<Err> {
  Errored(Err),
  Completed,
}

struct SubjectInner<Item, Err> {
  subscribers: Subscribers<Item, Err>,
  stopped: Option<Stopped<Err>>,
}

pub struct Subject<Item, Err> {
  inner: MutRc<SubjectInner<Item, Err>>,
}

impl<Item, Err> Default for Subject<Item, Err> {
  fn default() -> Self { Self { inner: MutRc::own(SubjectInner { subscribers: Subscribers::default(), stopped: None }) } }
}

impl<Item, Err> Clone for Subject<Item, Err> {
  fn clone(&self) -> Self { Self { inner: self.inner.clone() } }
}

impl<Item, Err> Subject<Item, Err> {
  pub fn new() -> Self { Self::default() }

  /// Number of observers currently subscribed.
  pub fn observer_count(&self) -> usize { self.inner.rc_deref().subscribers.len() }

  pub fn is_stopped(&self) -> bool { self.inner.rc_deref().stopped.is_some() }

  pub(crate) fn register(&self, observer: BoxedObserver<Item, Err>) -> usize {
    self.inner.rc_deref_mut().subscribers.add(observer)
  }

  pub(crate) fn unregister(&self, id: usize) { self.inner.rc_deref_mut().subscribers.remove(id); }

  #[inline]
  pub(crate) fn is_empty(&self) -> bool { self.observer_count() == 0 }

  /// Deliver one notification to one observer, draining whatever queues up
  /// for it while it runs.
  pub(crate) fn notify(&self, id: usize, notification: Notification<Item, Err>) {
    let mut current = self.inner.rc_deref_mut().subscribers.checkout(id, notification);
    while let Some((mut observer, notification)) = current.take() {
      match notification {
        Notification::Next(value) => {
          observer.next(value);
          if observer.is_closed() {
            self.unregister(id);
            return;
          }
          current = self.inner.rc_deref_mut().subscribers.checkin(id, observer);
        }
        Notification::Error(err) => {
          self.unregister(id);
          observer.error(err);
          return;
        }
        Notification::Complete => {
          self.unregister(id);
          observer.complete();
          return;
        }
      }
    }
  }

  fn ids(&self) -> smallvec::SmallVec<[usize; 4]> { self.inner.rc_deref().subscribers.ids() }
}

impl<Item: Clone, Err: Clone> Subject<Item, Err> {
  pub(crate) fn broadcast_next(&self, value: Item) {
    let ids = self.ids();
    let mut iter = ids.into_iter().peekable();
    while let Some(id) = iter.next() {
      if iter.peek().is_some() {
        self.notify(id, Notification::Next(value.clone()));
      } else {
        self.notify(id, Notification::Next(value));
        break;
      }
    }
  }

  pub(crate) fn broadcast_error(&self, err: Err) {
    self.inner.rc_deref_mut().stopped = Some(Stopped::Errored(err.clone()));
    for id in self.ids() {
      self.notify(id, Notification::Error(err.clone()));
    }
  }

  pub(crate) fn broadcast_complete(&self) {
    self.inner.rc_deref_mut().stopped = Some(Stopped::Completed);
    for id in self.ids() {
      self.notify(id, Notification::Complete);
    }
  }
}

impl<Item: Clone, Err: Clone> Observer<Item, Err> for Subject<Item, Err> {
  fn next(&mut self, value: Item) {
    if !self.is_stopped() {
      self.broadcast_next(value)
    }
  }

  fn error(self, err: Err) {
    if !self.is_stopped() {
      self.broadcast_error(err)
    }
  }

  fn complete(self) {
    if !self.is_stopped() {
      self.broadcast_complete()
    }
  }

  #[inline]
  fn is_closed(&self) -> bool { self.is_stopped() }
}

impl<Item, Err> Observable for Subject<Item, Err>
where
  Item: Clone + 'static,
  Err: Clone + 'static,
{
  type Item = Item;
  type Err = Err;

  fn actual_subscribe<O>(self, observer: O) -> Subscription
  where
    O: Observer<Item, Err> + 'static,
  {
    let stopped = match &self.inner.rc_deref().stopped {
      Some(Stopped::Errored(err)) => Some(Some(err.clone())),
      Some(Stopped::Completed) => Some(None),
      None => None,
    };
    match stopped {
      Some(Some(err)) => {
        observer.error(err);
        Subscription::closed()
      }
      Some(None) => {
        observer.complete();
        Subscription::closed()
      }
      None => {
        let id = self.register(Box::new(observer));
        let weak = self.inner.downgrade();
        Subscription::from_fn(move || {
          if let Some(inner) = weak.upgrade() {
            inner.rc_deref_mut().subscribers.remove(id);
          }
        })
      }
    }
  }
}

#[cfg(test)]
mod test {
  use crate::prelude::*;
  use std::{cell::RefCell, rc::Rc};

  #[test]
  fn multicasts_in_order() {
    let mut subject = Subject::<i32, ()>::new();
    let log = Rc::new(RefCell::new(vec![]));
    let (a, b) = (log.clone(), log.clone());
    subject.clone().subscribe(move |v| a.borrow_mut().push(("a", v)));
    subject.clone().subscribe(move |v| b.borrow_mut().push(("b", v)));
    subject.next(1);
    subject.next(2);
    assert_eq!(*log.borrow(), vec![("a", 1), ("b", 1), ("a", 2), ("b", 2)]);
  }

  #[test]
  fn unsubscribe_removes_observer() {
    let mut subject = Subject::<i32, ()>::new();
    let hits = Rc::new(RefCell::new(0));
    let h = hits.clone();
    let sub = subject.clone().subscribe(move |_| *h.borrow_mut() += 1);
    subject.next(1);
    sub.unsubscribe();
    subject.next(2);
    assert_eq!(*hits.borrow(), 1);
    assert_eq!(subject.observer_count(), 0);
  }

  #[test]
  fn late_subscriber_gets_error() {
    let subject = Subject::<i32, &'static str>::new();
    subject.clone().error("boom");
    let err = Rc::new(RefCell::new(None));
    let e = err.clone();
    subject.subscribe_err(|_| {}, move |x| *e.borrow_mut() = Some(x));
    assert_eq!(*err.borrow(), Some("boom"));
  }

  #[test]
  fn reentrant_next_is_queued_per_observer() {
    let subject = Subject::<i32, ()>::new();
    let log = Rc::new(RefCell::new(vec![]));
    let (l1, l2) = (log.clone(), log.clone());
    let mut feedback = subject.clone();
    subject.clone().subscribe(move |v| {
      l1.borrow_mut().push(("first", v));
      if v == 1 {
        feedback.next(2);
      }
    });
    subject.clone().subscribe(move |v| l2.borrow_mut().push(("second", v)));
    let mut source = subject.clone();
    source.next(1);
    assert_eq!(
      *log.borrow(),
      vec![("first", 1), ("second", 2), ("first", 2), ("second", 1)]
    );
  }

  #[test]
  fn subscribe_during_broadcast_skips_current_value() {
    let subject = Subject::<i32, ()>::new();
    let late = Rc::new(RefCell::new(vec![]));
    let l = late.clone();
    let s = subject.clone();
    subject.clone().subscribe(move |v| {
      if v == 1 {
        let l = l.clone();
        s.clone().subscribe(move |v| l.borrow_mut().push(v));
      }
    });
    let mut source = subject.clone();
    source.next(1);
    source.next(2);
    assert_eq!(*late.borrow(), vec![2]);
  }
}
