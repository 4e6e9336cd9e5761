//! Managed wrappers over native objects.

use std::cell::{Ref, RefCell, RefMut};
use std::fmt;
use std::sync::Arc;

use kernelbind_compiler::DestructorPlan;

use crate::handle::NativePtr;
use crate::library::NativeLibrary;
use crate::native::{NativeValue, PodValue};

/// What happens to the native handle when the wrapper goes away.
pub enum Teardown {
    None,
    Release,
    Free {
        function: String,
        library: Arc<dyn NativeLibrary>,
    },
}

impl Teardown {
    pub fn from_plan(plan: &DestructorPlan, library: &Arc<dyn NativeLibrary>) -> Self {
        match plan {
            DestructorPlan::None => Teardown::None,
            DestructorPlan::Release => Teardown::Release,
            DestructorPlan::FreeFunction(function) => Teardown::Free {
                function: function.clone(),
                library: Arc::clone(library),
            },
        }
    }
}

impl fmt::Debug for Teardown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Teardown::None => f.write_str("None"),
            Teardown::Release => f.write_str("Release"),
            Teardown::Free { function, .. } => write!(f, "Free({function})"),
        }
    }
}

/// The managed object for one native object or embedded value.
///
/// Dropping the last managed reference tears the wrapper down exactly once.
pub struct Wrapper {
    class: String,
    native: RefCell<NativeValue>,
    teardown: Teardown,
}

impl Wrapper {
    /// Wrap `ptr`; never copies and never changes the count.
    pub(crate) fn pointer(class: impl Into<String>, ptr: NativePtr, teardown: Teardown) -> Self {
        Self {
            class: class.into(),
            native: RefCell::new(NativeValue::Object(ptr)),
            teardown,
        }
    }

    /// Embed a value-type copy.
    pub(crate) fn value(class: impl Into<String>, pod: PodValue) -> Self {
        Self {
            class: class.into(),
            native: RefCell::new(NativeValue::Pod(pod)),
            teardown: Teardown::None,
        }
    }

    /// Managed class name.
    pub fn class(&self) -> &str {
        &self.class
    }

    pub fn is_value_type(&self) -> bool {
        matches!(*self.native.borrow(), NativeValue::Pod(_))
    }

    /// The native handle of a pointer wrapper.
    pub fn ptr(&self) -> Option<NativePtr> {
        self.native.borrow().as_ptr().cloned()
    }

    /// Copy of the embedded value of a value-type wrapper.
    pub fn pod(&self) -> Option<PodValue> {
        self.native.borrow().as_pod().cloned()
    }

    pub fn native(&self) -> Ref<'_, NativeValue> {
        self.native.borrow()
    }

    pub(crate) fn native_mut(&self) -> RefMut<'_, NativeValue> {
        self.native.borrow_mut()
    }

    pub fn teardown(&self) -> &Teardown {
        &self.teardown
    }
}

impl Drop for Wrapper {
    fn drop(&mut self) {
        let native = self.native.get_mut();
        let NativeValue::Object(ptr) = native else {
            return;
        };
        match &self.teardown {
            Teardown::None => {}
            Teardown::Release => {
                let left = ptr.release();
                log::trace!("{} wrapper released native {} ({left} left)", self.class, ptr.identity());
            }
            Teardown::Free { function, library } => {
                log::trace!("{} wrapper freeing native {} via {function}", self.class, ptr.identity());
                library.free(function, ptr);
            }
        }
    }
}

impl fmt::Debug for Wrapper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Wrapper")
            .field("class", &self.class)
            .field("native", &self.native.borrow())
            .field("teardown", &self.teardown)
            .finish()
    }
}
