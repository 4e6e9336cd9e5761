//! Selecting a branch for concrete arguments.

use kernelbind_core::CallError;

use super::{Dispatch, Guard, ParamGuard, TypePredicate};

/// Runtime type tests over some managed value representation.
pub trait TypeOracle {
    type Value;

    /// Null or undefined.
    fn is_nullish(&self, value: &Self::Value) -> bool;

    /// Whether a non-nullish value passes `predicate`.
    fn satisfies(&self, value: &Self::Value, predicate: &TypePredicate) -> bool;

    /// Type name of `value` in error messages.
    fn describe(&self, value: &Self::Value) -> String;
}

impl Dispatch {
    /// Select the overload for `args`, first match wins.
    ///
    /// Returns the overload index. Never selects more than one branch.
    pub fn select<O: TypeOracle>(&self, oracle: &O, args: &[O::Value]) -> Result<usize, CallError> {
        let got = args.len();
        let candidates: Vec<_> = self
            .branches
            .iter()
            .filter(|b| b.guard.accepts_arity(got))
            .collect();

        if candidates.is_empty() {
            return Err(CallError::ArityMismatch {
                function: self.function.clone(),
                expected: self.arity_labels().join(" or "),
                got,
            });
        }

        for branch in &candidates {
            if first_failure(&branch.guard, oracle, args).is_none() {
                log::trace!("{}: selected overload {}", self.function, branch.index);
                return Ok(branch.index);
            }
        }

        match candidates.as_slice() {
            [only] => {
                // Guaranteed to fail again; report the first offending argument.
                let param = first_failure(&only.guard, oracle, args)
                    .ok_or_else(|| CallError::Internal("guard flip-flopped".into()))?;
                Err(CallError::ArgumentTypeError {
                    function: self.function.clone(),
                    position: param.position,
                    name: param.name.clone(),
                    expected: param.expected(),
                    got: oracle.describe(&args[param.position]),
                })
            }
            _ => Err(CallError::NoMatchingOverload {
                function: self.function.clone(),
                got,
            }),
        }
    }
}

fn first_failure<'g, O: TypeOracle>(
    guard: &'g Guard,
    oracle: &O,
    args: &[O::Value],
) -> Option<&'g ParamGuard> {
    guard.params.iter().find(|param| match args.get(param.position) {
        // Omitted trailing argument; arity already accepted it.
        None => false,
        Some(value) if oracle.is_nullish(value) => !param.allows_nullish,
        Some(value) => !oracle.satisfies(value, &param.predicate),
    })
}
