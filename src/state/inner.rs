use std::{
  cell::RefCell,
  rc::{Rc, Weak},
};

use super::pending::{PendingSlot, Snapshot};
use crate::{
  error::{EmptyObservableError, NoSubscribersError, StateErr},
  observable::{BoxedObservable, Observable},
  observer::{BoxedObserver, Observer},
  subject::{Notification, Subject},
  subscription::Subscription,
  suspense::Suspendable,
};

/// Resolves which core a handle talks to when the core belongs to a keyed
/// cache.
pub(crate) trait Route<T, Err> {
  /// The core that should serve a handle created for `own`. With `register`
  /// set, `own` takes the slot if it is vacant.
  fn canonical(&self, own: &Rc<StateCore<T, Err>>, register: bool) -> Rc<StateCore<T, Err>>;

  /// `core` just went idle.
  fn release(&self, core: &StateCore<T, Err>);
}

pub(crate) enum Producer<T, Err> {
  Ready(BoxedObservable<T, Err>),
  /// Built on first activation. `None` while the builder runs.
  Deferred(Option<Box<dyn FnOnce() -> BoxedObservable<T, Err>>>),
}

enum Phase<T, Err> {
  Idle,
  Active {
    epoch: u64,
    channel: Subject<T, Err>,
    producer: Option<Subscription>,
    done: bool,
  },
}

struct CoreState<T, Err> {
  phase: Phase<T, Err>,
  current: Option<T>,
  pending: Option<PendingSlot<T, Err>>,
  epochs: u64,
  watchers: Option<Subject<bool, Err>>,
}

pub(crate) struct StateCore<T, Err> {
  producer: RefCell<Producer<T, Err>>,
  default: Option<T>,
  route: Option<Rc<dyn Route<T, Err>>>,
  on_idle: RefCell<Vec<Rc<dyn Fn()>>>,
  state: RefCell<CoreState<T, Err>>,
}

impl<T, Err> StateCore<T, Err>
where
  T: Suspendable + Clone + 'static,
  Err: StateErr,
{
  pub(crate) fn new(producer: Producer<T, Err>, default: Option<T>, route: Option<Rc<dyn Route<T, Err>>>) -> Self {
    StateCore {
      producer: RefCell::new(producer),
      default,
      route,
      on_idle: RefCell::new(vec![]),
      state: RefCell::new(CoreState { phase: Phase::Idle, current: None, pending: None, epochs: 0, watchers: None }),
    }
  }

  fn source(&self) -> Option<BoxedObservable<T, Err>> {
    let build = match &mut *self.producer.borrow_mut() {
      Producer::Ready(source) => return Some(source.clone()),
      Producer::Deferred(build) => build.take()?,
    };
    let source = build();
    *self.producer.borrow_mut() = Producer::Ready(source.clone());
    Some(source)
  }

  pub(crate) fn ref_count(&self) -> usize {
    match &self.state.borrow().phase {
      Phase::Active { channel, .. } => channel.observer_count(),
      Phase::Idle => 0,
    }
  }

  #[inline]
  pub(crate) fn is_active(&self) -> bool { matches!(self.state.borrow().phase, Phase::Active { .. }) }

  #[inline]
  pub(crate) fn default_value(&self) -> Option<T> { self.default.clone() }

  fn is_serving(&self, epoch: u64) -> bool {
    matches!(
      &self.state.borrow().phase,
      Phase::Active { epoch: e, channel, .. } if *e == epoch && !channel.is_empty()
    )
  }

  // ==========================================================================
  // Consumers
  // ==========================================================================

  pub(crate) fn subscribe(self: &Rc<Self>, observer: BoxedObserver<T, Err>) -> Subscription {
    let joined = {
      let state = self.state.borrow();
      match &state.phase {
        Phase::Active { epoch, channel, .. } => Some((*epoch, channel.clone(), state.current.clone())),
        Phase::Idle => None,
      }
    };
    let Some((epoch, channel, current)) = joined else {
      return self.activate(observer);
    };
    let id = channel.register(observer);
    trace_event!(epoch, id, "consumer joined");
    if let Some(value) = current {
      channel.notify(id, Notification::Next(value));
    }
    self.release_if_unobserved(epoch);
    self.consumer_teardown(epoch, id)
  }

  fn activate(self: &Rc<Self>, observer: BoxedObserver<T, Err>) -> Subscription {
    let channel = Subject::new();
    let id = channel.register(observer);
    let epoch = {
      let mut state = self.state.borrow_mut();
      state.epochs += 1;
      state.phase = Phase::Active { epoch: state.epochs, channel, producer: None, done: false };
      state.epochs
    };
    debug_event!(epoch, "state activated");

    let producer = match self.source() {
      Some(source) => source.actual_subscribe(ProducerObserver { core: Rc::downgrade(self), epoch }),
      None => Subscription::closed(),
    };
    let stale = {
      let mut state = self.state.borrow_mut();
      match &mut state.phase {
        Phase::Active { epoch: e, producer: slot, .. } if *e == epoch => {
          *slot = Some(producer.clone());
          false
        }
        _ => true,
      }
    };
    if stale {
      producer.unsubscribe();
    } else {
      let unset = self.state.borrow().current.as_ref().map_or(true, Suspendable::is_suspense);
      if unset {
        if let Some(default) = self.default.clone() {
          self.on_next(epoch, default);
        }
      }
      self.release_if_unobserved(epoch);
    }
    self.consumer_teardown(epoch, id)
  }

  fn consumer_teardown(self: &Rc<Self>, epoch: u64, id: usize) -> Subscription {
    let core = self.clone();
    Subscription::from_fn(move || {
      let channel = match &core.state.borrow().phase {
        Phase::Active { epoch: e, channel, .. } if *e == epoch => Some(channel.clone()),
        _ => None,
      };
      if let Some(channel) = channel {
        channel.unregister(id);
        core.release_if_unobserved(epoch);
      }
    })
  }

  fn release_if_unobserved(&self, epoch: u64) {
    if matches!(
      &self.state.borrow().phase,
      Phase::Active { epoch: e, channel, .. } if *e == epoch && channel.is_empty()
    ) {
      self.deactivate();
    }
  }

  fn deactivate(&self) {
    let (producer, pending, watchers) = {
      let mut state = self.state.borrow_mut();
      let producer = match std::mem::replace(&mut state.phase, Phase::Idle) {
        Phase::Active { producer, .. } => producer,
        Phase::Idle => return,
      };
      state.current = None;
      (producer, state.pending.take(), state.watchers.take())
    };
    debug_event!("last consumer left, releasing the producer");
    if let Some(producer) = producer {
      producer.unsubscribe();
    }
    if let Some(pending) = pending {
      pending.reject(NoSubscribersError.into());
    }
    if let Some(watchers) = watchers {
      watchers.broadcast_next(true);
      watchers.broadcast_complete();
    }
    self.teardown();
  }

  fn teardown(&self) {
    let hooks = self.on_idle.borrow().clone();
    for hook in hooks {
      hook();
    }
    if let Some(route) = &self.route {
      route.release(self);
    }
  }

  pub(crate) fn add_teardown(&self, hook: Rc<dyn Fn()>) { self.on_idle.borrow_mut().push(hook); }

  // ==========================================================================
  // Producer notifications
  // ==========================================================================

  fn on_next(&self, epoch: u64, value: T) {
    let (channel, pending) = {
      let mut state = self.state.borrow_mut();
      let channel = match &state.phase {
        Phase::Active { epoch: e, channel, .. } if *e == epoch => channel.clone(),
        _ => return,
      };
      state.current = Some(value.clone());
      let pending = if value.is_suspense() { None } else { state.pending.take() };
      (channel, pending)
    };
    let pending = match pending {
      Some(slot) if !slot.accepts(&value) => {
        let mut state = self.state.borrow_mut();
        if state.pending.is_none() {
          state.pending = Some(slot);
        }
        None
      }
      settled => settled,
    };
    trace_event!(epoch, consumers = channel.observer_count(), "state value");
    match pending {
      Some(slot) => {
        channel.broadcast_next(value.clone());
        slot.resolve(value);
      }
      None => channel.broadcast_next(value),
    }
    self.release_if_unobserved(epoch);
  }

  fn on_error(&self, epoch: u64, err: Err) {
    let (channel, pending, watchers) = {
      let mut state = self.state.borrow_mut();
      // The producer handle is dropped, not unsubscribed: a sink upstream
      // may be handed over to whoever resubscribes during delivery.
      let channel = match std::mem::replace(&mut state.phase, Phase::Idle) {
        Phase::Active { epoch: e, channel, .. } if e == epoch => channel,
        other => {
          state.phase = other;
          return;
        }
      };
      state.current = None;
      let pending = if err.is_suspense() {
        if let Some(slot) = state.pending.as_mut() {
          slot.suspended = true;
        }
        None
      } else {
        state.pending.take()
      };
      (channel, pending, state.watchers.take())
    };
    debug_event!(epoch, suspense = err.is_suspense(), "state producer failed");
    channel.broadcast_error(err.clone());
    if let Some(slot) = pending {
      slot.reject(err.clone());
    }

    let idle = {
      let mut state = self.state.borrow_mut();
      matches!(state.phase, Phase::Idle).then(|| state.pending.take())
    };
    if let Some(pending) = idle {
      if let Some(slot) = pending {
        slot.reject(err.clone());
      }
      self.teardown();
    }
    if let Some(watchers) = watchers {
      watchers.broadcast_error(err);
    }
  }

  fn on_complete(&self, epoch: u64) {
    let materialized = {
      let mut state = self.state.borrow_mut();
      match &mut state.phase {
        Phase::Active { epoch: e, done, producer, .. } if *e == epoch => {
          *done = true;
          *producer = None;
        }
        _ => return,
      }
      state.current.is_some()
    };
    if materialized {
      let pending = self.state.borrow_mut().pending.take();
      if let Some(slot) = pending {
        slot.reject(EmptyObservableError.into());
      }
    } else if let Some(default) = self.default.clone() {
      self.on_next(epoch, default);
    } else {
      debug_event!(epoch, "state producer completed without a value");
      self.on_error(epoch, EmptyObservableError.into());
      return;
    }
    let watchers = self.state.borrow_mut().watchers.take();
    if let Some(watchers) = watchers {
      watchers.broadcast_next(true);
      watchers.broadcast_complete();
    }
  }

  // ==========================================================================
  // Accessors
  // ==========================================================================

  pub(crate) fn get_value(
    &self, filter: Option<Rc<dyn Fn(&T) -> bool>>,
  ) -> Result<Snapshot<T, Err>, NoSubscribersError> {
    let current = {
      let state = self.state.borrow();
      if let Some(pending) = &state.pending {
        return Ok(Snapshot::Pending(pending.value()));
      }
      state.current.clone()
    };
    if let Some(value) = current {
      if !value.is_suspense() && filter.as_ref().map_or(true, |f| f(&value)) {
        return Ok(Snapshot::Ready(value));
      }
    }
    if let Some(default) = &self.default {
      return Ok(Snapshot::Ready(default.clone()));
    }
    if self.ref_count() == 0 {
      return Err(NoSubscribersError);
    }
    let mut state = self.state.borrow_mut();
    let slot = state.pending.get_or_insert_with(|| PendingSlot::new(filter));
    Ok(Snapshot::Pending(slot.value()))
  }
}

/// The observer a core hands to its producer. It only speaks for the
/// activation it was created for.
struct ProducerObserver<T, Err> {
  core: Weak<StateCore<T, Err>>,
  epoch: u64,
}

impl<T, Err> Observer<T, Err> for ProducerObserver<T, Err>
where
  T: Suspendable + Clone + 'static,
  Err: StateErr,
{
  fn next(&mut self, value: T) {
    if let Some(core) = self.core.upgrade() {
      core.on_next(self.epoch, value);
    }
  }

  fn error(self, err: Err) {
    if let Some(core) = self.core.upgrade() {
      core.on_error(self.epoch, err);
    }
  }

  fn complete(self) {
    if let Some(core) = self.core.upgrade() {
      core.on_complete(self.epoch);
    }
  }

  fn is_closed(&self) -> bool { self.core.upgrade().map_or(true, |core| !core.is_serving(self.epoch)) }
}

// ============================================================================
// StateObservable
// ============================================================================

/// A multicast, replaying, reference counted view of a producer sequence.
///
/// Cloning is cheap: every clone is a handle to the same state. Handles
/// obtained from a [`StateFactory`](super::StateFactory) follow their key, so
/// a handle kept across an eviction talks to whichever instance currently
/// owns the key.
///
/// The producer never completes consumers. Once it completes, the state
/// keeps its last value and serves it to new consumers; once it errors, the
/// error reaches every consumer and the next subscription starts over.
pub struct StateObservable<T, Err> {
  pub(crate) core: Rc<StateCore<T, Err>>,
}

impl<T, Err> Clone for StateObservable<T, Err> {
  fn clone(&self) -> Self { StateObservable { core: self.core.clone() } }
}

impl<T, Err> StateObservable<T, Err>
where
  T: Suspendable + Clone + 'static,
  Err: StateErr,
{
  pub fn new<S>(source: S) -> Self
  where
    S: Observable<Item = T, Err = Err>,
  {
    Self::from_core(StateCore::new(Producer::Ready(source.box_it()), None, None))
  }

  pub(crate) fn with_default_value<S>(source: S, default: T) -> Self
  where
    S: Observable<Item = T, Err = Err>,
  {
    Self::from_core(StateCore::new(Producer::Ready(source.box_it()), Some(default), None))
  }

  pub(crate) fn from_core(core: StateCore<T, Err>) -> Self { StateObservable { core: Rc::new(core) } }

  fn target(&self, register: bool) -> Rc<StateCore<T, Err>> {
    match &self.core.route {
      Some(route) => route.canonical(&self.core, register),
      None => self.core.clone(),
    }
  }

  /// The current value.
  ///
  /// In order of preference: the value already being waited for, the latest
  /// value (unless it is the suspense marker), the default value, a new
  /// [`PendingValue`](super::PendingValue). Without consumers there is
  /// nothing to wait for, so the last case fails with
  /// [`NoSubscribersError`] instead.
  ///
  /// The pending value resolves with the next value that is not the suspense
  /// marker. It fails with the empty observable error if the producer
  /// completes first, and with [`NoSubscribersError`] if every consumer
  /// leaves first.
  pub fn get_value(&self) -> Result<Snapshot<T, Err>, NoSubscribersError> { self.target(false).get_value(None) }

  /// Like [`get_value`](Self::get_value), but the latest value only counts
  /// if it satisfies `predicate`, and a new pending value waits for a value
  /// that does. A pending value that is already outstanding is returned as
  /// is.
  pub fn get_value_where<F>(&self, predicate: F) -> Result<Snapshot<T, Err>, NoSubscribersError>
  where
    F: Fn(&T) -> bool + 'static,
  {
    self.target(false).get_value(Some(Rc::new(predicate)))
  }

  /// Number of live consumers.
  pub fn get_ref_count(&self) -> usize { self.target(false).ref_count() }

  pub fn default_value(&self) -> Option<T> { self.target(false).default_value() }

  /// Whether the producer is currently subscribed on behalf of consumers.
  pub fn is_active(&self) -> bool { self.target(false).is_active() }

  /// Whether both handles were created for the same state.
  pub fn ptr_eq(&self, other: &Self) -> bool { Rc::ptr_eq(&self.core, &other.core) }

  /// Apply `f` to this state and wrap the result in a state observable,
  /// unless it already is one.
  ///
  /// ```rust
  /// use rxstate::prelude::*;
  ///
  /// let mut source = Subject::<i32, StateError<()>>::new();
  /// let doubled = state(source.clone()).pipe_state(|s| s.map(|v| v * 2));
  /// let _sub = doubled.clone().subscribe(|_| {});
  /// source.next(4);
  /// assert_eq!(doubled.get_value().ok().and_then(Snapshot::ready), Some(8));
  /// ```
  pub fn pipe_state<F, R>(self, f: F) -> StateObservable<R::Item, R::Err>
  where
    F: FnOnce(Self) -> R,
    R: Observable,
    R::Item: Suspendable + Clone,
    R::Err: StateErr,
  {
    f(self).into_state()
  }

  /// Observe whether the producer has completed: `false` then `true` once
  /// it does, or just `true` if it already has. Fails with
  /// [`NoSubscribersError`] when nobody is subscribed.
  pub fn completion(&self) -> Completion<T, Err> { Completion { core: self.target(false) } }

  /// Run `hook` every time the state goes idle.
  pub fn with_teardown<F>(self, hook: F) -> Self
  where
    F: Fn() + 'static,
  {
    self.core.add_teardown(Rc::new(hook));
    self
  }
}

impl<T, Err> Observable for StateObservable<T, Err>
where
  T: Suspendable + Clone + 'static,
  Err: StateErr,
{
  type Item = T;
  type Err = Err;

  fn actual_subscribe<O>(self, observer: O) -> Subscription
  where
    O: Observer<T, Err> + 'static,
  {
    self.target(true).subscribe(Box::new(observer))
  }

  fn into_state(self) -> StateObservable<T, Err>
  where
    Self::Item: Suspendable + Clone,
    Self::Err: StateErr,
  {
    self
  }
}

enum Status<Err> {
  Idle,
  Done,
  Running(Subject<bool, Err>),
}

/// Observable returned by [`StateObservable::completion`].
pub struct Completion<T, Err> {
  core: Rc<StateCore<T, Err>>,
}

impl<T, Err> Clone for Completion<T, Err> {
  fn clone(&self) -> Self { Completion { core: self.core.clone() } }
}

impl<T, Err> Observable for Completion<T, Err>
where
  T: Suspendable + Clone + 'static,
  Err: StateErr,
{
  type Item = bool;
  type Err = Err;

  fn actual_subscribe<O>(self, mut observer: O) -> Subscription
  where
    O: Observer<bool, Err> + 'static,
  {
    let status = {
      let mut guard = self.core.state.borrow_mut();
      let state = &mut *guard;
      match &state.phase {
        Phase::Idle => Status::Idle,
        Phase::Active { done: true, .. } => Status::Done,
        Phase::Active { .. } => Status::Running(state.watchers.get_or_insert_with(Subject::new).clone()),
      }
    };
    match status {
      Status::Idle => observer.error(NoSubscribersError.into()),
      Status::Done => {
        observer.next(true);
        observer.complete();
      }
      Status::Running(watchers) => {
        observer.next(false);
        if !observer.is_closed() {
          return watchers.actual_subscribe(observer);
        }
      }
    }
    Subscription::closed()
  }
}
