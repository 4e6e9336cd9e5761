//! Overload Resolver: runtime dispatch over overloaded signatures.
//!
//! The managed side has no static types, so an overloaded constructor or
//! method is exposed as one entry point that inspects its arguments and
//! forwards to exactly one native overload.
//!
//! ## Algorithm
//!
//! 1. Each overload becomes a [`Guard`]: an accepted arity range plus one
//!    [`TypePredicate`] per parameter
//! 2. Guards are tested in declaration order
//! 3. The first guard that holds selects its overload
//!
//! There is no ranking and no backtracking. Declaration order is preserved
//! verbatim, so an earlier, looser overload shadows a later, stricter one.

mod selection;

pub use selection::TypeOracle;

use kernelbind_core::{ArgSpec, ManagedType, OverloadSpec, PlanError};

/// Runtime type test for one argument.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypePredicate {
    IsNumber,
    IsBoolean,
    IsString,
    IsArray,
    /// `instanceof` against the named wrapper class (or a derived one).
    InstanceOf(String),
}

impl TypePredicate {
    /// Predicate testing for `ty`. Enums are carried as numbers.
    pub fn for_type(ty: &ManagedType) -> Self {
        match ty {
            ManagedType::Number(_) | ManagedType::Enum(_) => TypePredicate::IsNumber,
            ManagedType::Boolean => TypePredicate::IsBoolean,
            ManagedType::String(_) => TypePredicate::IsString,
            ManagedType::ArrayOf(_) => TypePredicate::IsArray,
            ManagedType::ObjectOf(class) => TypePredicate::InstanceOf(class.clone()),
        }
    }

    /// Name of the expected type in error messages.
    pub fn expected(&self) -> &str {
        match self {
            TypePredicate::IsNumber => "number",
            TypePredicate::IsBoolean => "boolean",
            TypePredicate::IsString => "string",
            TypePredicate::IsArray => "array",
            TypePredicate::InstanceOf(class) => class,
        }
    }
}

/// Test for a single parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamGuard {
    pub position: usize,
    pub name: String,
    pub predicate: TypePredicate,
    /// Null/undefined also passes.
    pub allows_nullish: bool,
}

impl ParamGuard {
    fn from_arg(arg: &ArgSpec) -> Self {
        Self {
            position: arg.position,
            name: arg.name.clone(),
            predicate: TypePredicate::for_type(&arg.managed_type),
            allows_nullish: arg.accepts_nullish(),
        }
    }

    /// Expected type, with "or null" when nullish values pass.
    pub fn expected(&self) -> String {
        if self.allows_nullish {
            format!("{} or null", self.predicate.expected())
        } else {
            self.predicate.expected().to_string()
        }
    }
}

/// Arity acceptance plus per-parameter predicates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Guard {
    pub min_arity: usize,
    pub max_arity: usize,
    /// Sorted by position.
    pub params: Vec<ParamGuard>,
}

impl Guard {
    pub fn accepts_arity(&self, count: usize) -> bool {
        count >= self.min_arity && count <= self.max_arity
    }

    /// Arity in error messages: `2` or `1..3`.
    pub fn arity_label(&self) -> String {
        if self.min_arity == self.max_arity {
            self.max_arity.to_string()
        } else {
            format!("{}..{}", self.min_arity, self.max_arity)
        }
    }
}

/// A guard and the overload it selects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuardedBranch {
    /// Index of the overload in declaration order.
    pub index: usize,
    pub guard: Guard,
}

/// Ordered branches of one overloaded entry point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dispatch {
    pub function: String,
    pub branches: Vec<GuardedBranch>,
}

impl Dispatch {
    /// A single branch needs no runtime discrimination beyond its guard.
    pub fn is_trivial(&self) -> bool {
        self.branches.len() == 1
    }

    /// Distinct accepted arities, in declaration order.
    pub fn arity_labels(&self) -> Vec<String> {
        let mut labels: Vec<String> = Vec::with_capacity(self.branches.len());
        for branch in &self.branches {
            let label = branch.guard.arity_label();
            if !labels.contains(&label) {
                labels.push(label);
            }
        }
        labels
    }
}

/// Build the dispatch for `function` from its overloads, in declaration order.
pub fn build_dispatch(function: &str, overloads: &[OverloadSpec]) -> Result<Dispatch, PlanError> {
    if overloads.is_empty() {
        return Err(PlanError::NoOverloads {
            function: function.to_string(),
        });
    }

    let branches = overloads
        .iter()
        .enumerate()
        .map(|(index, overload)| {
            let mut params: Vec<ParamGuard> =
                overload.params.iter().map(ParamGuard::from_arg).collect();
            params.sort_by_key(|p| p.position);
            GuardedBranch {
                index,
                guard: Guard {
                    min_arity: overload.required_arity(),
                    max_arity: overload.arity(),
                    params,
                },
            }
        })
        .collect();

    log::trace!("dispatch for {function}: {} branches", overloads.len());
    Ok(Dispatch {
        function: function.to_string(),
        branches,
    })
}
