//! The suspense sentinel.
//!
//! `SUSPENSE` marks "the value is being recomputed". A state observable never
//! stores it as its current value: while the latest emission is a suspense
//! marker, `get_value` keeps returning a pending value. Streams carry it
//! either as an item (`Suspensible::Suspense`) or, between `sink_suspense`
//! and `lift_suspense`, as the error returned by [`StateErr::suspense`].
//!
//! [`StateErr::suspense`]: crate::error::StateErr::suspense

use std::{borrow::Cow, rc::Rc, sync::Arc};

/// Unit marker for "no value yet, one is on its way".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Suspense;

pub const SUSPENSE: Suspense = Suspense;

/// An item that is either ready or suspended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Suspensible<T> {
  Suspense,
  Ready(T),
}

impl<T> Suspensible<T> {
  #[inline]
  pub fn is_ready(&self) -> bool { matches!(self, Suspensible::Ready(_)) }

  pub fn ready(self) -> Option<T> {
    match self {
      Suspensible::Ready(v) => Some(v),
      Suspensible::Suspense => None,
    }
  }

  pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Suspensible<U> {
    match self {
      Suspensible::Ready(v) => Suspensible::Ready(f(v)),
      Suspensible::Suspense => Suspensible::Suspense,
    }
  }
}

impl<T> From<Suspense> for Suspensible<T> {
  fn from(_: Suspense) -> Self { Suspensible::Suspense }
}

impl<T> PartialEq<Suspense> for Suspensible<T> {
  fn eq(&self, _: &Suspense) -> bool { matches!(self, Suspensible::Suspense) }
}

/// Item types a state observable can hold.
///
/// Only the suspense types answer `true`; everything else uses the default.
pub trait Suspendable {
  #[inline]
  fn is_suspense(&self) -> bool { false }
}

impl Suspendable for Suspense {
  #[inline]
  fn is_suspense(&self) -> bool { true }
}

impl<T> Suspendable for Suspensible<T> {
  #[inline]
  fn is_suspense(&self) -> bool { matches!(self, Suspensible::Suspense) }
}

macro_rules! impl_suspendable {
  ($($t:ty),* $(,)?) => {
    $(impl Suspendable for $t {})*
  };
}

impl_suspendable!(
  (),
  bool,
  char,
  u8,
  u16,
  u32,
  u64,
  u128,
  usize,
  i8,
  i16,
  i32,
  i64,
  i128,
  isize,
  f32,
  f64,
  String,
  &'static str,
);

impl<T> Suspendable for Vec<T> {}
impl<T> Suspendable for Option<T> {}
impl<T: ?Sized> Suspendable for Rc<T> {}
impl<T: ?Sized> Suspendable for Arc<T> {}
impl<T: ?Sized> Suspendable for Box<T> {}
impl Suspendable for Cow<'static, str> {}
impl<T, E> Suspendable for Result<T, E> {}

macro_rules! impl_suspendable_tuple {
  ($($name:ident),+) => {
    impl<$($name),+> Suspendable for ($($name,)+) {}
  };
}

impl_suspendable_tuple!(A);
impl_suspendable_tuple!(A, B);
impl_suspendable_tuple!(A, B, C);
impl_suspendable_tuple!(A, B, C, D);
