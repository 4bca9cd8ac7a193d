use std::{cell::RefCell, rc::Rc};

use super::SinkPolicy;
use crate::{
  observable::Observable,
  observer::{BoxedObserver, Observer},
  rc::MutRc,
  subscription::Subscription,
};

/// The upstream connection of one sink subscription, shared between the
/// observer fed by the source and the teardown handed downstream.
///
/// `inner` is the downstream observer currently attached. A resubscription
/// that happens while a signal is being delivered replaces it and bumps
/// `inner_id`, so teardowns belonging to the replaced observer become no-ops.
struct SinkLink<Item, Err> {
  inner: Option<BoxedObserver<Item, Err>>,
  inner_id: usize,
  upstream: Option<Subscription>,
  closed: bool,
}

type Waiting<Item, Err> = Rc<RefCell<Option<MutRc<SinkLink<Item, Err>>>>>;

/// Operator returned by `sink_effects`, `sink_suspense` and `map_effect`.
pub struct Sink<S, P>
where
  S: Observable,
  P: SinkPolicy<S::Item, S::Err>,
{
  source: S,
  policy: P,
  waiting: Waiting<P::Out, S::Err>,
}

impl<S, P> Sink<S, P>
where
  S: Observable,
  P: SinkPolicy<S::Item, S::Err>,
{
  pub fn new(source: S, policy: P) -> Self { Sink { source, policy, waiting: Rc::new(RefCell::new(None)) } }
}

impl<S, P> Clone for Sink<S, P>
where
  S: Observable,
  P: SinkPolicy<S::Item, S::Err> + Clone,
{
  fn clone(&self) -> Self {
    Sink { source: self.source.clone(), policy: self.policy.clone(), waiting: self.waiting.clone() }
  }
}

impl<S, P> Observable for Sink<S, P>
where
  S: Observable,
  P: SinkPolicy<S::Item, S::Err> + Clone + 'static,
  P::Out: 'static,
{
  type Item = P::Out;
  type Err = S::Err;

  fn actual_subscribe<O>(self, observer: O) -> Subscription
  where
    O: Observer<P::Out, S::Err> + 'static,
  {
    let waiting = self.waiting.borrow().clone();
    if let Some(link) = waiting {
      let id = {
        let mut link = link.rc_deref_mut();
        link.inner = Some(Box::new(observer));
        link.inner_id += 1;
        link.inner_id
      };
      trace_event!(inner_id = id, "sink handed its upstream to a resubscriber");
      return release_on_unsubscribe(link, id);
    }

    let link = MutRc::own(SinkLink { inner: Some(Box::new(observer)), inner_id: 0, upstream: None, closed: false });
    let upstream = self.source.actual_subscribe(SinkObserver {
      link: link.clone(),
      policy: self.policy,
      waiting: self.waiting.clone(),
    });
    let released = {
      let mut l = link.rc_deref_mut();
      if !l.closed {
        l.upstream = Some(upstream.clone());
      }
      l.closed
    };
    if released {
      upstream.unsubscribe();
    }
    release_on_unsubscribe(link, 0)
  }
}

fn release_on_unsubscribe<Item: 'static, Err: 'static>(link: MutRc<SinkLink<Item, Err>>, id: usize) -> Subscription {
  Subscription::from_fn(move || {
    let (inner, upstream) = {
      let mut l = link.rc_deref_mut();
      if l.inner_id != id {
        return;
      }
      l.closed = true;
      (l.inner.take(), l.upstream.take())
    };
    drop(inner);
    if let Some(upstream) = upstream {
      upstream.unsubscribe();
    }
  })
}

pub struct SinkObserver<P, Item, Err> {
  link: MutRc<SinkLink<Item, Err>>,
  policy: P,
  waiting: Waiting<Item, Err>,
}

impl<P, Item, Err> SinkObserver<P, Item, Err> {
  fn take_inner(&self) -> Option<BoxedObserver<Item, Err>> {
    let mut link = self.link.rc_deref_mut();
    link.closed = true;
    link.inner.take()
  }

  /// Deliver `signal` as an error. A resubscription made during delivery
  /// inherits the upstream; otherwise the upstream is released.
  fn signal(&self, signal: Err) {
    let (inner, id) = {
      let mut link = self.link.rc_deref_mut();
      (link.inner.take(), link.inner_id)
    };
    let Some(inner) = inner else { return };

    let previous = self.waiting.borrow_mut().replace(self.link.clone());
    inner.error(signal);
    *self.waiting.borrow_mut() = previous;

    let upstream = {
      let mut link = self.link.rc_deref_mut();
      if link.inner_id != id {
        return;
      }
      link.closed = true;
      link.upstream.take()
    };
    debug_event!("sink signal had no resubscriber, releasing upstream");
    if let Some(upstream) = upstream {
      upstream.unsubscribe();
    }
  }
}

impl<In, Item, Err, P> Observer<In, Err> for SinkObserver<P, Item, Err>
where
  P: SinkPolicy<In, Err, Out = Item>,
{
  fn next(&mut self, value: In) {
    match self.policy.route(value) {
      Ok(value) => {
        let (inner, id) = {
          let mut link = self.link.rc_deref_mut();
          if link.closed {
            return;
          }
          (link.inner.take(), link.inner_id)
        };
        if let Some(mut inner) = inner {
          inner.next(value);
          let mut link = self.link.rc_deref_mut();
          if !link.closed && link.inner_id == id && link.inner.is_none() {
            link.inner = Some(inner);
          }
        }
      }
      Err(signal) => self.signal(signal),
    }
  }

  fn error(self, err: Err) {
    if let Some(inner) = self.take_inner() {
      inner.error(err)
    }
  }

  fn complete(self) {
    if let Some(inner) = self.take_inner() {
      inner.complete()
    }
  }

  fn is_closed(&self) -> bool {
    let link = self.link.rc_deref();
    link.closed || link.inner.as_ref().map_or(false, |o| o.is_closed())
  }
}

#[cfg(test)]
mod test {
  use crate::prelude::*;
  use std::{
    cell::{Cell, RefCell},
    rc::Rc,
  };

  type Err = StateError<i32, Option<i32>>;

  fn counting_source(subscriptions: Rc<Cell<usize>>) -> impl Observable<Item = i32, Err = StateError<i32, i32>> {
    observable::create(move |emitter: &mut dyn Emitter<i32, StateError<i32, i32>>| {
      subscriptions.set(subscriptions.get() + 1);
      for i in 0..10 {
        if emitter.is_closed() {
          break;
        }
        emitter.next(i);
      }
    })
  }

  #[test]
  fn propagates_sinked_effects_as_errors() {
    let values = Rc::new(RefCell::new(vec![]));
    let errors = Rc::new(RefCell::new(vec![]));
    let (v, e) = (values.clone(), errors.clone());
    observable::from_iter::<_, Err>(vec![Some(1), None, Some(3), None, Some(5)])
      .sink_effects([None])
      .subscribe_err(move |x| v.borrow_mut().push(x), move |x| e.borrow_mut().push(x));
    assert_eq!(*values.borrow(), vec![Some(1)]);
    assert_eq!(*errors.borrow(), vec![StateError::Effect(effect(None))]);
  }

  #[test]
  fn synchronous_resubscription_keeps_the_source_alive() {
    let subscriptions = Rc::new(Cell::new(0));
    let values = Rc::new(RefCell::new(vec![]));
    let errors = Rc::new(RefCell::new(vec![]));
    let sinked = counting_source(subscriptions.clone()).sink_effects([3]);

    let (v, e, late) = (values.clone(), errors.clone(), values.clone());
    let resubscribe = sinked.clone();
    sinked.subscribe_err(
      move |x| v.borrow_mut().push(x),
      move |err| {
        let is_effect = matches!(err, StateError::Effect(_));
        e.borrow_mut().push(err);
        if is_effect {
          resubscribe.subscribe(move |x| late.borrow_mut().push(x));
        }
      },
    );

    assert_eq!(subscriptions.get(), 1);
    assert_eq!(*values.borrow(), vec![0, 1, 2, 4, 5, 6, 7, 8, 9]);
    assert_eq!(*errors.borrow(), vec![StateError::Effect(effect(3))]);
  }

  #[test]
  fn without_resubscription_the_source_is_released() {
    let pulled = Rc::new(RefCell::new(vec![]));
    let p = pulled.clone();
    let source = observable::create(move |emitter: &mut dyn Emitter<i32, StateError<(), i32>>| {
      for i in 0..10 {
        if emitter.is_closed() {
          break;
        }
        p.borrow_mut().push(i);
        emitter.next(i);
      }
    });
    source.sink_effects([2]).subscribe_err(|_| {}, |_| {});
    assert_eq!(*pulled.borrow(), vec![0, 1, 2]);
  }

  #[test]
  fn propagates_errors() {
    let subscriptions = Rc::new(Cell::new(0));
    let s = subscriptions.clone();
    let source = observable::create(move |emitter: &mut dyn Emitter<i32, StateError<i32, i32>>| {
      s.set(s.get() + 1);
      for i in 0..10 {
        if emitter.is_closed() {
          break;
        }
        if i == 2 {
          emitter.error(StateError::Source(2));
        }
        emitter.next(i);
      }
    });
    let values = Rc::new(RefCell::new(vec![]));
    let errors = Rc::new(RefCell::new(vec![]));
    let (v, e) = (values.clone(), errors.clone());
    source.sink_effects([3]).subscribe_err(move |x| v.borrow_mut().push(x), move |x| e.borrow_mut().push(x));
    assert_eq!(subscriptions.get(), 1);
    assert_eq!(*values.borrow(), vec![0, 1]);
    assert_eq!(*errors.borrow(), vec![StateError::Source(2)]);
  }

  #[test]
  fn propagates_completion() {
    let completed = Rc::new(Cell::new(false));
    let values = Rc::new(RefCell::new(vec![]));
    let (v, c) = (values.clone(), completed.clone());
    let source = observable::create(|emitter: &mut dyn Emitter<i32, StateError<(), i32>>| {
      for i in 0..10 {
        if i == 2 {
          emitter.complete();
        }
        emitter.next(i);
      }
    });
    source.sink_effects([3]).subscribe_all(move |x| v.borrow_mut().push(x), |_| {}, move || c.set(true));
    assert_eq!(*values.borrow(), vec![0, 1]);
    assert!(completed.get());
  }

  #[test]
  fn sink_suspense_forwards_suspense_as_error() {
    let values = Rc::new(RefCell::new(vec![]));
    let errors = Rc::new(RefCell::new(vec![]));
    let (v, e) = (values.clone(), errors.clone());
    observable::from_iter::<_, StateError<()>>(vec![
      Suspensible::Ready(1),
      Suspensible::Suspense,
      Suspensible::Ready(3),
    ])
    .sink_suspense()
    .subscribe_err(move |x| v.borrow_mut().push(x), move |x| e.borrow_mut().push(x));
    assert_eq!(*values.borrow(), vec![1]);
    assert_eq!(*errors.borrow(), vec![StateError::Suspense]);
  }

  #[test]
  fn map_effect_routes_mapper_effects() {
    let values = Rc::new(RefCell::new(vec![]));
    let errors = Rc::new(RefCell::new(vec![]));
    let (v, e) = (values.clone(), errors.clone());
    observable::from_iter::<_, StateError<(), ()>>(vec![Some(1), None, Some(3)])
      .map_effect(|value: Option<i32>| value.ok_or_else(|| effect(())))
      .subscribe_err(move |x| v.borrow_mut().push(x), move |x| e.borrow_mut().push(x));
    assert_eq!(*values.borrow(), vec![1]);
    assert_eq!(*errors.borrow(), vec![StateError::Effect(effect(()))]);
  }
}
