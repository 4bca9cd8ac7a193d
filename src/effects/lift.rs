use super::LiftPolicy;
use crate::{observable::Observable, observer::Observer, rc::MutRc, subscription::Subscription};

/// Operator returned by `lift_effects` and `lift_suspense`.
#[derive(Clone)]
pub struct Lift<S, P> {
  source: S,
  policy: P,
}

impl<S, P> Lift<S, P> {
  pub fn new(source: S, policy: P) -> Self { Lift { source, policy } }
}

/// Shared by every generation of upstream observers of one subscription.
/// Only the observer whose `generation` matches may talk to `observer`.
struct LiftState<O> {
  observer: Option<O>,
  upstream: Option<Subscription>,
  generation: usize,
  closed: bool,
}

impl<S, P> Observable for Lift<S, P>
where
  S: Observable,
  P: LiftPolicy<S::Item, S::Err> + Clone + 'static,
  P::Out: 'static,
{
  type Item = P::Out;
  type Err = S::Err;

  fn actual_subscribe<O>(self, observer: O) -> Subscription
  where
    O: Observer<P::Out, S::Err> + 'static,
  {
    let state = MutRc::own(LiftState { observer: Some(observer), upstream: None, generation: 0, closed: false });
    connect(&state, &self.source, &self.policy, 0);
    Subscription::from_fn(move || {
      let (observer, upstream) = {
        let mut state = state.rc_deref_mut();
        state.closed = true;
        (state.observer.take(), state.upstream.take())
      };
      drop(observer);
      if let Some(upstream) = upstream {
        upstream.unsubscribe();
      }
    })
  }
}

/// Subscribe `source` on behalf of `generation`. The subscription is kept
/// only if no newer generation took over while it was being established.
fn connect<S, P, O>(state: &MutRc<LiftState<O>>, source: &S, policy: &P, generation: usize)
where
  S: Observable,
  P: LiftPolicy<S::Item, S::Err> + Clone + 'static,
  O: Observer<P::Out, S::Err> + 'static,
{
  let subscription = source.clone().actual_subscribe(LiftObserver {
    state: state.clone(),
    source: source.clone(),
    policy: policy.clone(),
    generation,
  });
  let stale = {
    let mut state = state.rc_deref_mut();
    if state.closed || state.generation != generation {
      true
    } else {
      state.upstream = Some(subscription.clone());
      false
    }
  };
  if stale {
    subscription.unsubscribe();
  }
}

pub struct LiftObserver<S, P, O> {
  state: MutRc<LiftState<O>>,
  source: S,
  policy: P,
  generation: usize,
}

impl<S, P, O> LiftObserver<S, P, O> {
  fn is_current(&self) -> bool {
    let state = self.state.rc_deref();
    !state.closed && state.generation == self.generation
  }

  fn take_observer(&self) -> Option<O> {
    if !self.is_current() {
      return None;
    }
    self.state.rc_deref_mut().observer.take()
  }

  fn put_back(&self, observer: O) {
    let mut state = self.state.rc_deref_mut();
    if !state.closed && state.observer.is_none() {
      state.observer = Some(observer);
    }
  }

  fn finish(&self) -> Option<O> {
    let (observer, upstream) = {
      let mut state = self.state.rc_deref_mut();
      state.closed = true;
      (state.observer.take(), state.upstream.take())
    };
    if let Some(upstream) = upstream {
      upstream.unsubscribe();
    }
    observer
  }
}

impl<S, P, O> Observer<S::Item, S::Err> for LiftObserver<S, P, O>
where
  S: Observable,
  P: LiftPolicy<S::Item, S::Err> + Clone + 'static,
  O: Observer<P::Out, S::Err> + 'static,
{
  fn next(&mut self, value: S::Item) {
    if let Some(mut observer) = self.take_observer() {
      observer.next(self.policy.pass(value));
      self.put_back(observer);
    }
  }

  fn error(self, err: S::Err) {
    if !self.is_current() {
      return;
    }
    match self.policy.lift(err) {
      Ok(value) => {
        if let Some(mut observer) = self.take_observer() {
          observer.next(value);
          self.put_back(observer);
        }
        let (generation, previous) = {
          let mut state = self.state.rc_deref_mut();
          if state.closed || state.observer.as_ref().map_or(true, |o| o.is_closed()) {
            return;
          }
          state.generation += 1;
          (state.generation, state.upstream.take())
        };
        trace_event!(generation, "lift resubscribing upstream");
        connect(&self.state, &self.source, &self.policy, generation);
        if let Some(previous) = previous {
          previous.unsubscribe();
        }
      }
      Err(err) => {
        if let Some(observer) = self.finish() {
          observer.error(err)
        }
      }
    }
  }

  fn complete(self) {
    if !self.is_current() {
      return;
    }
    if let Some(observer) = self.finish() {
      observer.complete()
    }
  }

  fn is_closed(&self) -> bool {
    let state = self.state.rc_deref();
    state.closed
      || state.generation != self.generation
      || state.observer.as_ref().map_or(false, |o| o.is_closed())
  }
}

#[cfg(test)]
mod test {
  use crate::prelude::*;
  use std::{
    cell::{Cell, RefCell},
    rc::Rc,
  };

  fn counting_source<Err, T, F>(subscriptions: Rc<Cell<usize>>, item: F) -> impl Observable<Item = T, Err = Err>
  where
    Err: 'static,
    T: 'static,
    F: Fn(i32) -> T + Clone + 'static,
  {
    observable::create(move |emitter: &mut dyn Emitter<T, Err>| {
      subscriptions.set(subscriptions.get() + 1);
      for i in 0..10 {
        if emitter.is_closed() {
          break;
        }
        emitter.next(item(i));
      }
    })
  }

  #[test]
  fn lifts_the_effects() {
    let subscriptions = Rc::new(Cell::new(0));
    let values = Rc::new(RefCell::new(vec![]));
    let errors = Rc::new(RefCell::new(vec![]));
    let (v, e) = (values.clone(), errors.clone());
    counting_source::<StateError<(), i32>, _, _>(subscriptions.clone(), |i| i)
      .sink_effects([3, 6])
      .map(|x| x * 2)
      .lift_effects([3, 6])
      .take(9)
      .subscribe_err(move |x| v.borrow_mut().push(x), move |x| e.borrow_mut().push(x));
    assert_eq!(subscriptions.get(), 1);
    assert_eq!(*values.borrow(), vec![0, 2, 4, 3, 8, 10, 6, 14, 16]);
    assert!(errors.borrow().is_empty());
  }

  #[test]
  fn resets_stateful_operators_on_effect() {
    let values = Rc::new(RefCell::new(vec![]));
    let errors = Rc::new(RefCell::new(vec![]));
    let (v, e) = (values.clone(), errors.clone());
    observable::from_iter::<_, StateError<(), i32>>(1..=8)
      .sink_effects([3, 6])
      .scan(0, |acc, v| acc + v)
      .lift_effects([3, 6, 10])
      .subscribe_err(move |x| v.borrow_mut().push(x), move |x| e.borrow_mut().push(x));
    assert_eq!(*values.borrow(), vec![1, 3, 3, 4, 9, 6, 7, 15]);
    assert!(errors.borrow().is_empty());
  }

  #[test]
  fn lifts_all_effects_when_none_are_named() {
    let values = Rc::new(RefCell::new(vec![]));
    let v = values.clone();
    observable::from_iter::<_, StateError<(), i32>>(1..=8)
      .sink_effects([3, 6])
      .scan(0, |acc, v| acc + v)
      .lift_effects([])
      .subscribe(move |x| v.borrow_mut().push(x));
    assert_eq!(*values.borrow(), vec![1, 3, 3, 4, 9, 6, 7, 15]);
  }

  #[test]
  fn unmatched_effects_stay_errors() {
    let errors = Rc::new(RefCell::new(vec![]));
    let e = errors.clone();
    observable::from_iter::<_, StateError<(), i32>>(1..=4)
      .sink_effects([2])
      .lift_effects([7])
      .subscribe_err(|_| {}, move |x| e.borrow_mut().push(x));
    assert_eq!(*errors.borrow(), vec![StateError::Effect(effect(2))]);
  }

  #[test]
  fn effects_across_async_emissions() {
    let mut source = Subject::<Option<i32>, StateError<(), Option<i32>>>::new();
    let values = Rc::new(RefCell::new(vec![]));
    let errors = Rc::new(RefCell::new(vec![]));
    let (v, e) = (values.clone(), errors.clone());
    source
      .clone()
      .start_with(None)
      .sink_effects([None])
      .map(|x| x.map(|x| x + 10))
      .lift_effects([None])
      .subscribe_err(move |x| v.borrow_mut().push(x), move |x| e.borrow_mut().push(x));
    source.next(Some(0));
    source.clone().error(StateError::Source(()));
    assert_eq!(*values.borrow(), vec![None, Some(10)]);
    assert_eq!(*errors.borrow(), vec![StateError::Source(())]);
  }

  #[test]
  fn lifts_suspense() {
    let subscriptions = Rc::new(Cell::new(0));
    let values = Rc::new(RefCell::new(vec![]));
    let errors = Rc::new(RefCell::new(vec![]));
    let (v, e) = (values.clone(), errors.clone());
    counting_source::<StateError<()>, _, _>(subscriptions.clone(), |i| {
      if i == 3 || i == 6 {
        Suspensible::Suspense
      } else {
        Suspensible::Ready(i)
      }
    })
    .sink_suspense()
    .map(|x| x * 2)
    .lift_suspense()
    .take(9)
    .subscribe_err(move |x| v.borrow_mut().push(x), move |x| e.borrow_mut().push(x));

    use Suspensible::{Ready, Suspense};
    assert_eq!(subscriptions.get(), 1);
    assert_eq!(
      *values.borrow(),
      vec![Ready(0), Ready(2), Ready(4), Suspense, Ready(8), Ready(10), Suspense, Ready(14), Ready(16)]
    );
    assert!(errors.borrow().is_empty());
  }

  #[test]
  fn suspense_resets_scan() {
    use Suspensible::{Ready, Suspense};
    let values = Rc::new(RefCell::new(vec![]));
    let v = values.clone();
    observable::from_iter::<_, StateError<()>>(vec![
      Ready(1),
      Ready(2),
      Suspense,
      Ready(4),
      Ready(5),
      Suspense,
      Ready(7),
      Ready(8),
    ])
    .sink_suspense()
    .scan(0, |acc, v| acc + v)
    .lift_suspense()
    .subscribe(move |x| v.borrow_mut().push(x));
    assert_eq!(*values.borrow(), vec![Ready(1), Ready(3), Suspense, Ready(4), Ready(9), Suspense, Ready(7), Ready(15)]);
  }

  #[test]
  fn lift_suspense_forwards_other_errors() {
    let errors = Rc::new(RefCell::new(vec![]));
    let e = errors.clone();
    observable::throw_err::<i32, _>(StateError::<&str>::Source("foo"))
      .lift_suspense()
      .subscribe_err(|_| {}, move |x| e.borrow_mut().push(x));
    assert_eq!(*errors.borrow(), vec![StateError::Source("foo")]);
  }
}
