//! Refcounted native handles.
//!
//! A [`NativePtr`] stands for a pointer into the kernel's object graph. The
//! kernel keeps its own intrusive reference count on every object; the
//! handle exposes it through [`retain`](NativePtr::retain) and
//! [`release`](NativePtr::release). Cloning a `NativePtr` copies the pointer
//! and never touches the count.

use std::any::Any;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use parking_lot::Mutex;

static NEXT_IDENTITY: AtomicU64 = AtomicU64::new(1);

struct NativeObject {
    identity: u64,
    kind_tag: u32,
    family_tag: u32,
    refs: AtomicUsize,
    payload: Mutex<Box<dyn Any + Send>>,
}

/// Pointer to a refcounted kernel object.
#[derive(Clone)]
pub struct NativePtr(Arc<NativeObject>);

impl NativePtr {
    /// A new kernel object with a use count of one.
    pub fn new<T: Any + Send>(kind_tag: u32, family_tag: u32, payload: T) -> Self {
        NativePtr(Arc::new(NativeObject {
            identity: NEXT_IDENTITY.fetch_add(1, Ordering::Relaxed),
            kind_tag,
            family_tag,
            refs: AtomicUsize::new(1),
            payload: Mutex::new(Box::new(payload)),
        }))
    }

    /// Address-like identity; equal for every handle to the same object.
    pub fn identity(&self) -> u64 {
        self.0.identity
    }

    /// Concrete kind the object reports.
    pub fn kind_tag(&self) -> u32 {
        self.0.kind_tag
    }

    /// Family (abstract kind) the object reports.
    pub fn family_tag(&self) -> u32 {
        self.0.family_tag
    }

    /// Increment the kernel refcount. Returns the new count.
    pub fn retain(&self) -> usize {
        self.0.refs.fetch_add(1, Ordering::AcqRel) + 1
    }

    /// Decrement the kernel refcount. Returns the new count.
    pub fn release(&self) -> usize {
        let previous = self
            .0
            .refs
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1));
        match previous {
            Ok(1) => {
                log::trace!("native object {} released", self.0.identity);
                0
            }
            Ok(n) => n - 1,
            Err(_) => {
                log::warn!("release of native object {} with no references", self.0.identity);
                0
            }
        }
    }

    pub fn use_count(&self) -> usize {
        self.0.refs.load(Ordering::Acquire)
    }

    pub fn same_object(&self, other: &NativePtr) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Read the payload as `T`.
    pub fn with<T: Any, R>(&self, f: impl FnOnce(&T) -> R) -> Option<R> {
        let payload = self.0.payload.lock();
        payload.downcast_ref::<T>().map(f)
    }

    /// Mutate the payload as `T`.
    pub fn with_mut<T: Any, R>(&self, f: impl FnOnce(&mut T) -> R) -> Option<R> {
        let mut payload = self.0.payload.lock();
        payload.downcast_mut::<T>().map(f)
    }
}

impl PartialEq for NativePtr {
    fn eq(&self, other: &Self) -> bool {
        self.same_object(other)
    }
}

impl fmt::Debug for NativePtr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativePtr")
            .field("identity", &self.0.identity)
            .field("kind_tag", &self.0.kind_tag)
            .field("use_count", &self.use_count())
            .finish_non_exhaustive()
    }
}
