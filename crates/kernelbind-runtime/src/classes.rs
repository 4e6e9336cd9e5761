//! Compiled classes indexed for the runtime.

use std::sync::Arc;

use kernelbind_compiler::ClassPlan;
use rustc_hash::FxHashMap;

/// Plans by managed class name, plus the is-base-of and cast tables.
#[derive(Debug, Default)]
pub struct ClassTable {
    plans: FxHashMap<String, ClassPlan>,
    lineages: FxHashMap<String, Arc<[String]>>,
    cast_table: FxHashMap<u32, String>,
}

impl ClassTable {
    pub fn new(plans: impl IntoIterator<Item = ClassPlan>) -> Self {
        let mut table = Self::default();
        for plan in plans {
            let lineage: Arc<[String]> = std::iter::once(plan.class.clone())
                .chain(plan.ownership.ancestors.iter().cloned())
                .collect();
            if let Some(tag) = plan.kind_tag {
                table.cast_table.insert(tag, plan.class.clone());
            }
            table.lineages.insert(plan.class.clone(), lineage);
            table.plans.insert(plan.class.clone(), plan);
        }
        table
    }

    pub fn get(&self, class: &str) -> Option<&ClassPlan> {
        self.plans.get(class)
    }

    /// The class followed by its ancestors, nearest first.
    pub fn lineage(&self, class: &str) -> Arc<[String]> {
        self.lineages
            .get(class)
            .cloned()
            .unwrap_or_else(|| Arc::from(vec![class.to_string()]))
    }

    /// `class` is `target` or derives from it.
    pub fn is_a(&self, class: &str, target: &str) -> bool {
        self.lineages
            .get(class)
            .is_some_and(|lineage| lineage.iter().any(|c| c == target))
    }

    /// Concrete class registered for a native kind tag.
    pub fn cast_target(&self, kind_tag: u32) -> Option<&str> {
        self.cast_table.get(&kind_tag).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.plans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plans.is_empty()
    }
}
