use std::{
  cell::RefCell,
  collections::HashMap,
  fmt::{Debug, Formatter},
  hash::Hash,
  rc::{Rc, Weak},
};

use smallvec::SmallVec;

use super::{
  inner::{Producer, Route, StateCore},
  StateObservable,
};
use crate::{
  error::StateErr,
  observable::{BoxedObservable, Observable},
  suspense::Suspendable,
};

/// Default value of the states a [`StateFactory`] creates.
pub enum FactoryDefault<K, T> {
  None,
  Value(T),
  /// Computed from the key when a state is created.
  Fn(Rc<dyn Fn(&K) -> T>),
}

impl<K, T> FactoryDefault<K, T> {
  pub fn from_fn<F>(f: F) -> Self
  where
    F: Fn(&K) -> T + 'static,
  {
    FactoryDefault::Fn(Rc::new(f))
  }
}

impl<K, T: Clone> FactoryDefault<K, T> {
  fn resolve(&self, key: &K) -> Option<T> {
    match self {
      FactoryDefault::None => None,
      FactoryDefault::Value(value) => Some(value.clone()),
      FactoryDefault::Fn(f) => Some(f(key)),
    }
  }
}

impl<K, T> Default for FactoryDefault<K, T> {
  fn default() -> Self { FactoryDefault::None }
}

type Cache<K, T, Err> = RefCell<HashMap<K, Rc<StateCore<T, Err>>>>;

struct FactoryInner<K, T, Err> {
  cache: Cache<K, T, Err>,
  produce: Rc<dyn Fn(&K) -> BoxedObservable<T, Err>>,
  default: FactoryDefault<K, T>,
}

/// A keyed cache of [`StateObservable`]s.
///
/// Looking up a key returns the live state for it, creating one if needed.
/// The producer for a key is built lazily, on the first subscription, so a
/// producer that looks up its own key finds the entry instead of recursing.
/// A state leaves the cache once its last consumer leaves; the next lookup
/// builds a fresh one.
///
/// Handles outlive eviction. A handle whose state was evicted talks to the
/// state now cached for its key, or puts its own state back in the cache if
/// the key is vacant. Two live producers for one key never coexist.
///
/// ```rust
/// use rxstate::prelude::*;
///
/// let users = StateFactory::new(|id: &u32| observable::of::<_, StateError<()>>(format!("user {id}")));
/// let a = users.get(1);
/// assert!(users.get(1).ptr_eq(&a));
/// let _sub = a.clone().subscribe(|_| {});
/// assert_eq!(a.get_value().ok().and_then(Snapshot::ready), Some("user 1".to_string()));
/// ```
pub struct StateFactory<K, T, Err> {
  inner: Rc<FactoryInner<K, T, Err>>,
}

impl<K, T, Err> Clone for StateFactory<K, T, Err> {
  fn clone(&self) -> Self { StateFactory { inner: self.inner.clone() } }
}

/// Non-owning handle to a [`StateFactory`], for producers that refer back
/// to their own factory. See [`StateFactory::new_cyclic`].
pub struct WeakStateFactory<K, T, Err> {
  inner: Weak<FactoryInner<K, T, Err>>,
}

impl<K, T, Err> Clone for WeakStateFactory<K, T, Err> {
  fn clone(&self) -> Self { WeakStateFactory { inner: self.inner.clone() } }
}

impl<K, T, Err> WeakStateFactory<K, T, Err> {
  pub fn upgrade(&self) -> Option<StateFactory<K, T, Err>> { self.inner.upgrade().map(|inner| StateFactory { inner }) }
}

impl<K, T, Err> StateFactory<K, T, Err>
where
  K: Hash + Eq + Clone + 'static,
  T: Suspendable + Clone + 'static,
  Err: StateErr,
{
  pub fn new<F, S>(produce: F) -> Self
  where
    F: Fn(&K) -> S + 'static,
    S: Observable<Item = T, Err = Err>,
  {
    Self::with(FactoryDefault::None, produce)
  }

  pub fn with_default<F, S>(produce: F, default: T) -> Self
  where
    F: Fn(&K) -> S + 'static,
    S: Observable<Item = T, Err = Err>,
  {
    Self::with(FactoryDefault::Value(default), produce)
  }

  pub fn with_default_fn<F, S, D>(produce: F, default: D) -> Self
  where
    F: Fn(&K) -> S + 'static,
    S: Observable<Item = T, Err = Err>,
    D: Fn(&K) -> T + 'static,
  {
    Self::with(FactoryDefault::from_fn(default), produce)
  }

  pub fn with<F, S>(default: FactoryDefault<K, T>, produce: F) -> Self
  where
    F: Fn(&K) -> S + 'static,
    S: Observable<Item = T, Err = Err>,
  {
    let inner = FactoryInner { cache: RefCell::new(HashMap::new()), produce: boxed_producer(produce), default };
    StateFactory { inner: Rc::new(inner) }
  }

  /// Build a factory whose producer may look keys up in the factory itself.
  ///
  /// `build` receives a weak handle to the factory under construction and
  /// returns the producer. Holding the weak handle, rather than a clone of
  /// the factory, keeps the cache from owning itself.
  pub fn new_cyclic<B, F, S>(default: FactoryDefault<K, T>, build: B) -> Self
  where
    B: FnOnce(WeakStateFactory<K, T, Err>) -> F,
    F: Fn(&K) -> S + 'static,
    S: Observable<Item = T, Err = Err>,
  {
    let inner = Rc::new_cyclic(|weak| FactoryInner {
      cache: RefCell::new(HashMap::new()),
      produce: boxed_producer(build(WeakStateFactory { inner: weak.clone() })),
      default,
    });
    StateFactory { inner }
  }

  /// The state for `key`.
  pub fn get(&self, key: K) -> StateObservable<T, Err> {
    if let Some(core) = self.inner.cache.borrow().get(&key) {
      return StateObservable { core: core.clone() };
    }

    let produce = self.inner.produce.clone();
    let build_key = key.clone();
    let route = KeyRoute { factory: Rc::downgrade(&self.inner), key: key.clone() };
    let core = Rc::new(StateCore::new(
      Producer::Deferred(Some(Box::new(move || produce(&build_key)))),
      self.inner.default.resolve(&key),
      Some(Rc::new(route)),
    ));
    debug_event!(entries = self.len() + 1, "state factory created an entry");
    self.inner.cache.borrow_mut().insert(key, core.clone());
    StateObservable { core }
  }

  /// Number of keys with a live state.
  pub fn len(&self) -> usize { self.inner.cache.borrow().len() }

  pub fn is_empty(&self) -> bool { self.len() == 0 }

  pub fn contains(&self, key: &K) -> bool { self.inner.cache.borrow().contains_key(key) }

  pub fn downgrade(&self) -> WeakStateFactory<K, T, Err> { WeakStateFactory { inner: Rc::downgrade(&self.inner) } }
}

fn boxed_producer<K, F, S>(produce: F) -> Rc<dyn Fn(&K) -> BoxedObservable<S::Item, S::Err>>
where
  F: Fn(&K) -> S + 'static,
  S: Observable,
{
  Rc::new(move |key: &K| produce(key).box_it())
}

struct KeyRoute<K, T, Err> {
  factory: Weak<FactoryInner<K, T, Err>>,
  key: K,
}

impl<K, T, Err> Route<T, Err> for KeyRoute<K, T, Err>
where
  K: Hash + Eq + Clone + 'static,
  T: 'static,
  Err: 'static,
{
  fn canonical(&self, own: &Rc<StateCore<T, Err>>, register: bool) -> Rc<StateCore<T, Err>> {
    let Some(factory) = self.factory.upgrade() else {
      return own.clone();
    };
    let mut cache = factory.cache.borrow_mut();
    if let Some(core) = cache.get(&self.key) {
      return core.clone();
    }
    if register {
      debug_event!("stale state handle registered itself again");
      cache.insert(self.key.clone(), own.clone());
    }
    own.clone()
  }

  fn release(&self, core: &StateCore<T, Err>) {
    let Some(factory) = self.factory.upgrade() else {
      return;
    };
    let removed = {
      let mut cache = factory.cache.borrow_mut();
      match cache.get(&self.key) {
        Some(cached) if std::ptr::eq(Rc::as_ptr(cached), core) => cache.remove(&self.key),
        _ => None,
      }
    };
    if removed.is_some() {
      debug_event!("state factory evicted an idle entry");
    }
  }
}

// ============================================================================
// Argument lists
// ============================================================================

/// A factory key made of optional arguments.
///
/// Trailing `None`s are dropped on construction, so `[Some(5)]` and
/// `[Some(5), None]` are the same key. A `None` followed by a value is kept.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Args<A>(SmallVec<[Option<A>; 4]>);

impl<A> Args<A> {
  pub fn new(args: impl IntoIterator<Item = Option<A>>) -> Self {
    let mut args: SmallVec<[Option<A>; 4]> = args.into_iter().collect();
    while matches!(args.last(), Some(None)) {
      args.pop();
    }
    Args(args)
  }

  #[inline]
  pub fn len(&self) -> usize { self.0.len() }

  #[inline]
  pub fn is_empty(&self) -> bool { self.0.is_empty() }

  /// The argument at `index`, `None` when missing or past the end.
  pub fn get(&self, index: usize) -> Option<&A> { self.0.get(index).and_then(Option::as_ref) }

  pub fn iter(&self) -> impl Iterator<Item = Option<&A>> { self.0.iter().map(Option::as_ref) }
}

impl<A> FromIterator<Option<A>> for Args<A> {
  fn from_iter<I: IntoIterator<Item = Option<A>>>(iter: I) -> Self { Args::new(iter) }
}

impl<A> From<Vec<Option<A>>> for Args<A> {
  fn from(args: Vec<Option<A>>) -> Self { Args::new(args) }
}

impl<A: Debug> Debug for Args<A> {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result { f.debug_list().entries(self.0.iter()).finish() }
}
