//! Thread-boundary checks for shape plans.

use kernelbind_core::PlanError;

use super::{ArgPlan, ShapePlan, Thread};
use crate::conversion::{Consumer, Placement};

/// Check `shape` against the thread-boundary contract.
///
/// - stages appear in order, each at most once
/// - no stage that touches managed values runs on a worker
/// - every argument consumed asynchronously is heap-placed
pub fn validate_shape(function: &str, shape: &ShapePlan, params: &[ArgPlan]) -> Result<(), PlanError> {
    let shape_name = shape.shape.to_string();

    let mut previous = None;
    for stage in &shape.stages {
        if previous.is_some_and(|p| p >= stage.stage) {
            return Err(PlanError::StageOrder {
                function: function.to_string(),
                shape: shape_name,
                stage: stage.stage.to_string(),
            });
        }
        previous = Some(stage.stage);

        if stage.thread == Thread::Worker && stage.stage.touches_managed() {
            return Err(PlanError::ManagedStageOnWorker {
                function: function.to_string(),
                shape: shape_name,
                stage: stage.stage.to_string(),
            });
        }
    }

    if shape.consumer == Consumer::Async {
        let escaping = params
            .iter()
            .find(|p| p.conversion.from_managed.placement() == Some(Placement::Stack));
        if let Some(arg) = escaping {
            return Err(PlanError::StackPlacementEscapes {
                function: function.to_string(),
                shape: shape_name,
                arg: arg.name.clone(),
            });
        }
    }

    Ok(())
}
