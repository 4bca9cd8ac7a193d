//! End-to-end tests through the public prelude.

use std::{
  cell::{Cell, RefCell},
  future::IntoFuture,
  rc::Rc,
};

use futures::executor::block_on;
use rxstate::prelude::*;
use tracing_subscriber::filter::LevelFilter;

type Err = StateError<()>;

fn init_tracing() {
  let _ = tracing_subscriber::fmt().with_test_writer().with_max_level(LevelFilter::TRACE).try_init();
}

fn recorder<T: 'static>() -> (Rc<RefCell<Vec<T>>>, impl FnMut(T) + Clone + 'static) {
  let log = Rc::new(RefCell::new(vec![]));
  let l = log.clone();
  (log, move |v| l.borrow_mut().push(v))
}

#[test]
fn keyed_states_restart_after_eviction() {
  init_tracing();
  let starts = Rc::new(Cell::new(0));
  let s = starts.clone();
  let counters = StateFactory::with_default_fn(
    move |args: &Args<u32>| {
      s.set(s.get() + 1);
      let base = args.get(0).copied().unwrap_or_default();
      observable::from_iter::<_, Err>(vec![base, base + 1])
    },
    |_: &Args<u32>| 0,
  );

  let (first, push_first) = recorder();
  let sub = counters.get(Args::new([Some(5)])).subscribe(push_first);
  assert_eq!(*first.borrow(), vec![5, 6]);
  let current = counters.get(Args::new([Some(5), None])).get_value().ok().and_then(Snapshot::ready);
  assert_eq!(current, Some(6));
  sub.unsubscribe();
  assert!(!counters.contains(&Args::new([Some(5)])));

  let (second, push_second) = recorder();
  let sub = counters.get(Args::new([Some(5)])).subscribe(push_second);
  assert_eq!(*second.borrow(), vec![5, 6]);
  assert_eq!(starts.get(), 2);
  sub.unsubscribe();
  assert!(counters.is_empty());
}

#[test]
fn derived_factories_release_their_sources() {
  init_tracing();
  let mut feed = Subject::<(u32, u32), Err>::new();
  let prices = {
    let feed = feed.clone();
    StateFactory::new(move |id: &u32| {
      let id = *id;
      feed.clone().filter(move |(k, _)| *k == id).map(|(_, price)| price)
    })
  };
  let doubled = {
    let prices = prices.clone();
    StateFactory::new(move |id: &u32| prices.get(*id).map(|price| price * 2))
  };

  let (values, push) = recorder();
  let sub = doubled.get(1).subscribe(push);
  feed.next((2, 50));
  feed.next((1, 10));
  assert_eq!(*values.borrow(), vec![20]);
  assert!(prices.contains(&1));
  assert!(!prices.contains(&2));
  assert_eq!(feed.observer_count(), 1);

  sub.unsubscribe();
  assert!(doubled.is_empty());
  assert!(prices.is_empty());
  assert_eq!(feed.observer_count(), 0);
}

#[test]
fn running_total_restarts_on_effects_behind_a_state() {
  init_tracing();
  let mut input = Subject::<i32, StateError<(), i32>>::new();
  let total = state(input.clone().sink_effects([0]).scan(0, |acc, v| acc + v).lift_effects([0]));

  let (first, push_first) = recorder();
  let (second, push_second) = recorder();
  let sub1 = total.clone().subscribe(push_first);
  input.next(1);
  input.next(2);
  let sub2 = total.clone().subscribe(push_second);
  input.next(0);
  input.next(4);
  assert_eq!(*first.borrow(), vec![1, 3, 0, 4]);
  assert_eq!(*second.borrow(), vec![3, 0, 4]);
  assert_eq!(total.get_value().ok().and_then(Snapshot::ready), Some(4));
  sub1.unsubscribe();
  sub2.unsubscribe();
}

#[test]
fn pending_value_is_awaitable() {
  init_tracing();
  let mut input = Subject::<u32, Err>::new();
  let shared = state(input.clone());
  let _sub = shared.clone().subscribe(|_| {}).unsubscribe_when_dropped();
  let snapshot = shared.get_value().expect("has a consumer");
  assert!(snapshot.is_pending());
  input.next(7);
  assert_eq!(block_on(snapshot.into_future()), Ok(7));
}

#[test]
fn guard_releases_a_defaulted_state() {
  init_tracing();
  let input = Subject::<&'static str, Err>::new();
  let greeting = input.clone().with_default("hello");
  {
    let _guard = greeting.clone().subscribe(|_| {}).unsubscribe_when_dropped();
    assert_eq!(greeting.get_value(), "hello");
    assert_eq!(input.observer_count(), 1);
  }
  assert_eq!(input.observer_count(), 0);
  assert_eq!(greeting.get_ref_count(), 0);
  assert_eq!(greeting.get_value(), "hello");
}

#[test]
fn completion_follows_the_producer() {
  init_tracing();
  let input = Subject::<i32, Err>::new();
  let shared = state(input.clone().start_with(1));
  let sub = shared.clone().subscribe(|_| {});
  let (flags, push) = recorder();
  shared.completion().subscribe(push);
  input.complete();
  assert_eq!(*flags.borrow(), vec![false, true]);
  assert_eq!(shared.get_ref_count(), 1);
  sub.unsubscribe();
}
