use smallvec::SmallVec;
use std::collections::VecDeque;

use crate::observer::BoxedObserver;

/// One notification on its way to a single observer.
pub(crate) enum Notification<Item, Err> {
  Next(Item),
  Error(Err),
  Complete,
}

/// A registered observer.
///
/// While a notification is being delivered the observer is checked out of
/// its slot (`observer` is `None`). Anything that arrives for the slot in the
/// meantime waits in `backlog` and is delivered, in order, as soon as the
/// running call returns.
struct Slot<Item, Err> {
  observer: Option<BoxedObserver<Item, Err>>,
  backlog: VecDeque<Notification<Item, Err>>,
}

/// Subscribers container with ID-based tracking.
///
/// - **SmallVec Optimization**: uses `SmallVec<[_; 2]>` to avoid heap
///   allocation for the common case of one or two consumers.
/// - **Stable IDs**: ids are never reused, so a stale id held by a teardown
///   closure can never remove a newer observer.
pub(crate) struct Subscribers<Item, Err> {
  next_id: usize,
  slots: SmallVec<[(usize, Slot<Item, Err>); 2]>,
}

impl<Item, Err> Default for Subscribers<Item, Err> {
  fn default() -> Self { Self { next_id: 0, slots: SmallVec::new() } }
}

impl<Item, Err> Subscribers<Item, Err> {
  /// Add an observer and return its unique ID.
  pub(crate) fn add(&mut self, observer: BoxedObserver<Item, Err>) -> usize {
    let id = self.next_id;
    self.next_id += 1;
    self.slots.push((id, Slot { observer: Some(observer), backlog: VecDeque::new() }));
    id
  }

  /// Remove an observer by ID. Returns true if it was still registered.
  pub(crate) fn remove(&mut self, id: usize) -> bool {
    match self.slots.iter().position(|(slot_id, _)| *slot_id == id) {
      Some(idx) => {
        self.slots.remove(idx);
        true
      }
      None => false,
    }
  }

  #[cfg(test)]
  pub(crate) fn contains(&self, id: usize) -> bool { self.slots.iter().any(|(slot_id, _)| *slot_id == id) }

  #[inline]
  pub(crate) fn len(&self) -> usize { self.slots.len() }

  /// Snapshot of the registered ids, in subscription order.
  pub(crate) fn ids(&self) -> SmallVec<[usize; 4]> { self.slots.iter().map(|(id, _)| *id).collect() }

  /// Take the observer out of its slot to deliver `notification` to it.
  ///
  /// Returns `None` if the id is gone, or if the observer is already busy
  /// with another notification; in the latter case `notification` is queued.
  pub(crate) fn checkout(
    &mut self, id: usize, notification: Notification<Item, Err>,
  ) -> Option<(BoxedObserver<Item, Err>, Notification<Item, Err>)> {
    let slot = self.slot_mut(id)?;
    match slot.observer.take() {
      Some(observer) => Some((observer, notification)),
      None => {
        slot.backlog.push_back(notification);
        None
      }
    }
  }

  /// Return an observer after a delivery. If notifications queued up in the
  /// meantime the observer is handed straight back with the oldest one.
  pub(crate) fn checkin(
    &mut self, id: usize, observer: BoxedObserver<Item, Err>,
  ) -> Option<(BoxedObserver<Item, Err>, Notification<Item, Err>)> {
    let slot = self.slot_mut(id)?;
    match slot.backlog.pop_front() {
      Some(notification) => Some((observer, notification)),
      None => {
        slot.observer = Some(observer);
        None
      }
    }
  }

  fn slot_mut(&mut self, id: usize) -> Option<&mut Slot<Item, Err>> {
    self.slots.iter_mut().find(|(slot_id, _)| *slot_id == id).map(|(_, slot)| slot)
  }
}
