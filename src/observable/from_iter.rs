use crate::{
  observable::Observable,
  observer::{Emitter, Observer},
  subscriber::Subscriber,
  subscription::Subscription,
  type_hint::TypeHint,
};

/// Creates an observable that produces values from an iterator.
///
/// Completes when all elements have been emitted. Stops early once the
/// downstream observer reports it is closed.
///
/// # Examples
///
/// ```
/// use rxstate::prelude::*;
///
/// observable::from_iter::<_, ()>(vec![0, 1, 2, 3]).subscribe(|v| println!("{},", v));
/// ```
pub fn from_iter<Iter, Err>(iter: Iter) -> FromIter<Iter, Err>
where
  Iter: IntoIterator + Clone,
{
  FromIter { iter, _hint: TypeHint::new() }
}

/// Creates an observable producing a single value, then completing.
pub fn of<Item: Clone, Err>(value: Item) -> FromIter<std::iter::Once<Item>, Err> {
  from_iter(std::iter::once(value))
}

pub struct FromIter<Iter, Err> {
  iter: Iter,
  _hint: TypeHint<Err>,
}

impl<Iter: Clone, Err> Clone for FromIter<Iter, Err> {
  fn clone(&self) -> Self { FromIter { iter: self.iter.clone(), _hint: TypeHint::new() } }
}

impl<Iter, Err> Observable for FromIter<Iter, Err>
where
  Iter: IntoIterator + Clone + 'static,
  Iter::Item: 'static,
  Err: 'static,
{
  type Item = Iter::Item;
  type Err = Err;

  fn actual_subscribe<O>(self, observer: O) -> Subscription
  where
    O: Observer<Self::Item, Err> + 'static,
  {
    let mut subscriber = Subscriber::new(observer);
    let mut iter = self.iter.into_iter();
    while !Emitter::<Self::Item, Err>::is_closed(&subscriber) {
      let Some(v) = iter.next() else { break };
      Emitter::<Self::Item, Err>::next(&mut subscriber, v);
    }
    Emitter::<Self::Item, Err>::complete(&mut subscriber);
    subscriber.subscription().clone()
  }
}
