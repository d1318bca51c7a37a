#[cfg(feature = "loom")]
mod imp {
    pub(crate) use loom::{
        sync::atomic::{AtomicUsize, Ordering, fence},
        thread_local,
    };

    /// `loom` mutex exposing the `parking_lot` locking surface so call sites
    /// compile unchanged under model checking.
    pub(crate) struct Mutex<T>(loom::sync::Mutex<T>);

    impl<T> Mutex<T> {
        pub(crate) fn new(val: T) -> Self {
            Self(loom::sync::Mutex::new(val))
        }

        pub(crate) fn lock(&self) -> loom::sync::MutexGuard<'_, T> {
            self.0
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner)
        }
    }
}

#[cfg(not(feature = "loom"))]
mod imp {
    pub(crate) use core::sync::atomic::{AtomicUsize, Ordering, fence};
    pub(crate) use parking_lot::Mutex;
    pub(crate) use std::thread_local;
}

pub(crate) use imp::*;
