use std::collections::VecDeque;

use crate::{observable::Observable, observer::Observer, rc::MutRc, subscription::Subscription};

/// Combines two observables with the same item and error type.
///
/// Values are forwarded as either source emits them. The merged stream
/// errors as soon as either source errors and completes once both have
/// completed.
#[derive(Clone)]
pub struct MergeOp<S1, S2> {
  pub(crate) source1: S1,
  pub(crate) source2: S2,
}

impl<S1, S2> Observable for MergeOp<S1, S2>
where
  S1: Observable,
  S2: Observable<Item = S1::Item, Err = S1::Err>,
{
  type Item = S1::Item;
  type Err = S1::Err;

  fn actual_subscribe<O>(self, observer: O) -> Subscription
  where
    O: Observer<S1::Item, S1::Err> + 'static,
  {
    let state = MutRc::own(MergeState {
      observer: Some(observer),
      busy: false,
      done: false,
      backlog: VecDeque::new(),
      completed: 0,
    });
    let subscription = Subscription::new();
    subscription.add(self.source1.actual_subscribe(MergeObserver(state.clone())));
    if !MergeObserver(state.clone()).is_closed() {
      subscription.add(self.source2.actual_subscribe(MergeObserver(state)));
    }
    subscription
  }
}

enum Pending<Item, Err> {
  Next(Item),
  Error(Err),
  Complete,
}

struct MergeState<O, Item, Err> {
  observer: Option<O>,
  busy: bool,
  done: bool,
  backlog: VecDeque<Pending<Item, Err>>,
  completed: u8,
}

pub struct MergeObserver<O, Item, Err>(MutRc<MergeState<O, Item, Err>>);

impl<O, Item, Err> MergeObserver<O, Item, Err>
where
  O: Observer<Item, Err>,
{
  /// Feed one notification through, queueing it when a delivery is already
  /// running further up the stack.
  fn push(&self, pending: Pending<Item, Err>) {
    {
      let mut state = self.0.rc_deref_mut();
      if state.done {
        return;
      }
      state.backlog.push_back(pending);
      if state.busy {
        return;
      }
      state.busy = true;
    }
    loop {
      let (observer, pending) = {
        let mut state = self.0.rc_deref_mut();
        match state.backlog.pop_front() {
          Some(pending) => (state.observer.take(), pending),
          None => {
            state.busy = false;
            return;
          }
        }
      };
      let Some(mut observer) = observer else {
        self.finish();
        return;
      };
      match pending {
        Pending::Next(value) => {
          observer.next(value);
          self.0.rc_deref_mut().observer = Some(observer);
        }
        Pending::Error(err) => {
          self.finish();
          observer.error(err);
          return;
        }
        Pending::Complete => {
          let both = {
            let mut state = self.0.rc_deref_mut();
            state.completed += 1;
            state.completed == 2
          };
          if both {
            self.finish();
            observer.complete();
            return;
          }
          self.0.rc_deref_mut().observer = Some(observer);
        }
      }
    }
  }

  fn finish(&self) {
    let mut state = self.0.rc_deref_mut();
    state.backlog.clear();
    state.busy = false;
    state.done = true;
  }
}

impl<O, Item, Err> Observer<Item, Err> for MergeObserver<O, Item, Err>
where
  O: Observer<Item, Err>,
{
  fn next(&mut self, value: Item) { self.push(Pending::Next(value)) }

  fn error(self, err: Err) { self.push(Pending::Error(err)) }

  fn complete(self) { self.push(Pending::Complete) }

  fn is_closed(&self) -> bool {
    let state = self.0.rc_deref();
    state.done || state.observer.as_ref().map_or(false, |o| o.is_closed())
  }
}
