//! Observable values
//!
//! An [`Observable<T>`] is a shared, single-threaded cell that pushes every
//! write to its subscribers. It replaces "published" view-model fields: the
//! scroll controller, the drag bridge and the host all hold clones of the same
//! observable, and the host re-renders from a subscription.
//!
//! Subscriptions are RAII handles. Dropping a [`Subscription`] (or calling
//! [`Subscription::unsubscribe`]) removes the callback. Callbacks run with no
//! internal borrows held, so a callback may read or write the observable and
//! may drop its own or any other subscription.
//!
//! ```rust
//! use std::cell::Cell;
//! use std::rc::Rc;
//! use whirl_core::Observable;
//!
//! let offset = Observable::new(0.0_f64);
//! let seen = Rc::new(Cell::new(0.0));
//! let sub = {
//!     let seen = Rc::clone(&seen);
//!     offset.subscribe(move |v| seen.set(*v))
//! };
//!
//! offset.set(4.0);
//! assert_eq!(seen.get(), 4.0);
//!
//! sub.unsubscribe();
//! offset.set(8.0);
//! assert_eq!(seen.get(), 4.0);
//! ```

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use slotmap::{new_key_type, SlotMap};
use smallvec::SmallVec;

new_key_type! {
    /// Identifier of a registered observer
    pub struct ObserverId;
}

type Observer<T> = Rc<dyn Fn(&T)>;

struct ObservableInner<T> {
    value: RefCell<T>,
    observers: RefCell<SlotMap<ObserverId, Observer<T>>>,
}

/// A shared value that notifies subscribers on every write
pub struct Observable<T> {
    inner: Rc<ObservableInner<T>>,
}

/// The scroll position shared between a carousel's drivers and its host
///
/// Offset encoding: the value is a length in points, unbounded in both
/// directions. Layout reduces it modulo the total content extent.
pub type ScrollPosition = Observable<f64>;

impl<T> Clone for Observable<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: Clone + 'static> Observable<T> {
    pub fn new(value: T) -> Self {
        Self {
            inner: Rc::new(ObservableInner {
                value: RefCell::new(value),
                observers: RefCell::new(SlotMap::with_key()),
            }),
        }
    }

    /// Current value
    pub fn get(&self) -> T {
        self.inner.value.borrow().clone()
    }

    /// Replace the value and notify every subscriber
    pub fn set(&self, value: T) {
        *self.inner.value.borrow_mut() = value;
        self.notify();
    }

    /// Modify the value in place and notify every subscriber
    pub fn update<F>(&self, f: F)
    where
        F: FnOnce(&mut T),
    {
        f(&mut self.inner.value.borrow_mut());
        self.notify();
    }

    /// Register a callback invoked after every write
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&T) + 'static,
    {
        let id = self
            .inner
            .observers
            .borrow_mut()
            .insert(Rc::new(callback));

        let weak: Weak<ObservableInner<T>> = Rc::downgrade(&self.inner);
        let weak: Weak<dyn Unsubscribe> = weak;
        Subscription {
            id,
            source: Some(weak),
        }
    }

    /// Number of live subscriptions
    pub fn subscriber_count(&self) -> usize {
        self.inner.observers.borrow().len()
    }

    /// Check whether two handles refer to the same cell
    pub fn ptr_eq(&self, other: &Observable<T>) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    fn notify(&self) {
        let ids: SmallVec<[ObserverId; 4]> = self.inner.observers.borrow().keys().collect();

        for id in ids {
            // Re-fetch per id: an earlier callback may have removed this one.
            let observer = self.inner.observers.borrow().get(id).cloned();
            if let Some(observer) = observer {
                let value = self.get();
                observer(&value);
            }
        }
    }
}

impl<T: Clone + Default + 'static> Default for Observable<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: fmt::Debug> fmt::Debug for Observable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observable")
            .field("value", &*self.inner.value.borrow())
            .field("subscribers", &self.inner.observers.borrow().len())
            .finish()
    }
}

trait Unsubscribe {
    fn remove(&self, id: ObserverId);
}

impl<T> Unsubscribe for ObservableInner<T> {
    fn remove(&self, id: ObserverId) {
        // Drop the callback after the borrow ends; it may own other subscriptions.
        let removed = self.observers.borrow_mut().remove(id);
        drop(removed);
    }
}

/// Handle to a registered observer
///
/// The observer stays registered while this handle is alive.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    id: ObserverId,
    source: Option<Weak<dyn Unsubscribe>>,
}

impl Subscription {
    pub fn id(&self) -> ObserverId {
        self.id
    }

    /// Remove the observer now
    pub fn unsubscribe(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if let Some(source) = self.source.take().and_then(|weak| weak.upgrade()) {
            source.remove(self.id);
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("attached", &self.source.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_observable_get_set() {
        let value = Observable::new(1.5_f64);
        assert_eq!(value.get(), 1.5);
        value.set(3.0);
        assert_eq!(value.get(), 3.0);
        value.update(|v| *v += 1.0);
        assert_eq!(value.get(), 4.0);
    }

    #[test]
    fn test_clones_share_state() {
        let a = Observable::new(0_i32);
        let b = a.clone();
        b.set(7);
        assert_eq!(a.get(), 7);
        assert!(a.ptr_eq(&b));
    }

    #[test]
    fn test_subscriber_notified_on_every_set() {
        let value = Observable::new(0.0_f32);
        let calls = Rc::new(Cell::new(0));
        let _sub = {
            let calls = Rc::clone(&calls);
            value.subscribe(move |_| calls.set(calls.get() + 1))
        };

        value.set(1.0);
        value.set(1.0);
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn test_drop_unsubscribes() {
        let value = Observable::new(0_u32);
        let calls = Rc::new(Cell::new(0));
        {
            let calls = Rc::clone(&calls);
            let _sub = value.subscribe(move |_| calls.set(calls.get() + 1));
            assert_eq!(value.subscriber_count(), 1);
        }
        assert_eq!(value.subscriber_count(), 0);
        value.set(1);
        assert_eq!(calls.get(), 0);
    }

    #[test]
    fn test_write_from_inside_callback() {
        let value = Observable::new(0_i32);
        let _sub = {
            let value_in = value.clone();
            value.subscribe(move |v| {
                if *v < 3 {
                    value_in.set(*v + 1);
                }
            })
        };

        value.set(0);
        assert_eq!(value.get(), 3);
    }

    #[test]
    fn test_unsubscribe_from_inside_callback() {
        let value = Observable::new(0_i32);
        let slot: Rc<RefCell<Option<Subscription>>> = Rc::new(RefCell::new(None));
        let calls = Rc::new(Cell::new(0));

        let sub = {
            let slot = Rc::clone(&slot);
            let calls = Rc::clone(&calls);
            value.subscribe(move |_| {
                calls.set(calls.get() + 1);
                slot.borrow_mut().take();
            })
        };
        *slot.borrow_mut() = Some(sub);

        value.set(1);
        value.set(2);
        assert_eq!(calls.get(), 1);
        assert_eq!(value.subscriber_count(), 0);
    }

    #[test]
    fn test_subscription_outlives_observable() {
        let sub = {
            let value = Observable::new(0_i32);
            value.subscribe(|_| {})
        };
        // Source is gone; dropping must be a no-op.
        sub.unsubscribe();
    }
}
