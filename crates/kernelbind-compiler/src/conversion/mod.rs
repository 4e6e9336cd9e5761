//! Type Resolver: how each value crosses the binding.
//!
//! For every argument, return and field the resolver decides a
//! [`ConversionPlan`]: how a managed value becomes native data
//! ([`FromManaged`]) and how native data becomes a managed value
//! ([`ToManaged`]).
//!
//! ## Resolution Priority
//!
//! 1. Number / boolean: direct extraction, no allocation
//! 2. Enum: extracted as `u32` and cast, no range validation
//! 3. String: copied into an owned buffer of the declared kind
//! 4. Array of primitives: element-wise; nulls skipped, wrong types abort
//! 5. Array of wrapped objects: element-wise `instanceof` then unwrap
//! 6. Wrapped object: unwrap, with null handling decided up front
//! 7. Iterator adapter: temporary list plus an iterator bound to it
//!
//! ## Escape Rule
//!
//! Storage consumed by an async path, or passed by native pointer, is placed
//! on the heap. Storage consumed only synchronously may live on the stack.

use kernelbind_core::{ArgSpec, ManagedType, NumericKind, PlanError, StringKind};
use kernelbind_registry::ClassRegistry;

mod array;
mod object;
mod primitive;

pub use array::{ElementPlan, ElementStorage};
pub use object::{NullHandling, ObjectArg};

/// Who consumes the converted value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Consumer {
    /// Only the calling thread, within the call.
    Sync,
    /// A worker thread, after the calling frame is gone.
    Async,
}

/// Where native storage for a converted value lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Placement {
    /// Call-local; valid until the synchronous call returns.
    Stack,
    /// Owned allocation; may be moved to a worker.
    Heap,
}

/// Managed to native.
#[derive(Debug, Clone, PartialEq)]
pub enum FromManaged {
    Number(NumericKind),
    Boolean,
    /// Extracted as `u32` and cast to the named native enum.
    Enum(String),
    String {
        kind: StringKind,
        placement: Placement,
    },
    Array {
        element: ElementPlan,
        /// Null/undefined for the whole array becomes a native null.
        nullable: bool,
        placement: Placement,
    },
    Object(ObjectArg),
    /// Materialise a temporary list, then bind an iterator to it.
    Iterator {
        element: ElementPlan,
        placement: Placement,
    },
}

impl FromManaged {
    /// Placement of the native storage, for conversions that allocate.
    pub fn placement(&self) -> Option<Placement> {
        match self {
            FromManaged::Number(_) | FromManaged::Boolean | FromManaged::Enum(_) => None,
            FromManaged::String { placement, .. }
            | FromManaged::Array { placement, .. }
            | FromManaged::Iterator { placement, .. } => Some(*placement),
            FromManaged::Object(obj) => Some(obj.placement),
        }
    }

    /// Whether the conversion needs no allocation at all.
    pub fn is_direct(&self) -> bool {
        self.placement().is_none()
    }
}

/// Native to managed.
#[derive(Debug, Clone, PartialEq)]
pub enum ToManaged {
    Number(NumericKind),
    Boolean,
    /// Boxed as a managed number.
    Enum(String),
    String(StringKind),
    Array(ElementPlan),
    /// Wrap the returned pointer; shares identity, never copies.
    WrapPointer { class: String },
    /// Copy call-local storage to the heap, then wrap the copy.
    HeapCopyThenWrap { class: String },
    /// Embed a copy in a value-type wrapper.
    EmbedValue { class: String },
}

/// Both directions for one value.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionPlan {
    pub from_managed: FromManaged,
    pub to_managed: ToManaged,
}

/// Resolves conversion plans against the class registry.
pub struct TypeResolver<'r> {
    registry: &'r ClassRegistry,
}

impl<'r> TypeResolver<'r> {
    pub fn new(registry: &'r ClassRegistry) -> Self {
        Self { registry }
    }

    /// Decide how `arg` crosses the binding for the given consumer.
    pub fn resolve(&self, arg: &ArgSpec, consumer: Consumer) -> Result<ConversionPlan, PlanError> {
        let placement = escape_placement(arg, consumer);

        let plan = match &arg.managed_type {
            ManagedType::Number(_) | ManagedType::Boolean | ManagedType::Enum(_) => {
                primitive::plan_scalar(&arg.managed_type)
            }
            ManagedType::String(kind) => primitive::plan_string(*kind, placement),
            ManagedType::ArrayOf(_) if arg.is_iterator_adapter => {
                array::plan_iterator(self.registry, arg, placement)?
            }
            ManagedType::ArrayOf(_) => array::plan_array(self.registry, arg, placement)?,
            ManagedType::ObjectOf(class) => {
                object::plan_object(self.registry, arg, class, placement)?
            }
        };

        log::trace!(
            "resolved {} ({}) for {:?}: {:?}",
            arg.name,
            arg.managed_type,
            consumer,
            plan.from_managed
        );
        Ok(plan)
    }
}

/// Apply the escape rule.
pub fn escape_placement(arg: &ArgSpec, consumer: Consumer) -> Placement {
    if consumer == Consumer::Async || arg.is_pointer() {
        Placement::Heap
    } else {
        Placement::Stack
    }
}

/// Look up a class, reporting it as unresolved in `context`.
pub(crate) fn class_is_value_type(
    registry: &ClassRegistry,
    context: &str,
    class: &str,
) -> Result<bool, PlanError> {
    registry
        .get(class)
        .map(|spec| spec.is_value_type)
        .ok_or_else(|| PlanError::UnresolvedClass {
            context: context.to_string(),
            name: class.to_string(),
        })
}
