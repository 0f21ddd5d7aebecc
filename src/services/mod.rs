pub mod catalog;
pub mod cleanup;
pub mod configure;
pub mod import;

use crate::models::{Descriptor, ResourceKind};
use crate::netbox::{Outcome, Reconciler};

/// One reconciled or deleted resource
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    pub kind: ResourceKind,
    pub key: String,
    pub outcome: Outcome,
}

/// Outcomes of a command run, in execution order
#[derive(Debug, Default)]
pub struct Report {
    pub steps: Vec<Step>,
    /// Objects removed by collection sweeps, per kind
    pub swept: Vec<(ResourceKind, usize)>,
}

impl Report {
    /// Reconcile `descriptor`, record the outcome and hand it back
    pub async fn reconcile(&mut self, rec: &Reconciler<'_>, descriptor: Descriptor) -> Outcome {
        let outcome = rec.reconcile(&descriptor).await;
        self.steps.push(Step {
            kind: descriptor.kind(),
            key: descriptor.key().to_string(),
            outcome: outcome.clone(),
        });
        outcome
    }

    pub async fn delete(&mut self, rec: &Reconciler<'_>, kind: ResourceKind, key: &str) -> Outcome {
        let outcome = rec.delete(kind, key).await;
        self.steps.push(Step {
            kind,
            key: key.to_string(),
            outcome: outcome.clone(),
        });
        outcome
    }

    pub fn outcome(&self, kind: ResourceKind, key: &str) -> Option<&Outcome> {
        self.steps
            .iter()
            .find(|s| s.kind == kind && s.key == key)
            .map(|s| &s.outcome)
    }

    pub fn count(&self, pred: impl Fn(&Outcome) -> bool) -> usize {
        self.steps.iter().filter(|s| pred(&s.outcome)).count()
    }

    pub fn failed(&self) -> usize {
        self.count(Outcome::is_failed)
    }

    pub fn summary(&self) -> String {
        let swept: usize = self.swept.iter().map(|(_, n)| n).sum();
        let parts = [
            ("created", self.count(|o| matches!(o, Outcome::Created { .. }))),
            ("updated", self.count(|o| matches!(o, Outcome::Patched { .. }))),
            ("migrated", self.count(|o| matches!(o, Outcome::MigratedFromLegacy { .. }))),
            ("unchanged", self.count(|o| matches!(o, Outcome::Unchanged { .. }))),
            ("deleted", self.count(|o| matches!(o, Outcome::Deleted { .. })) + swept),
            ("not found", self.count(|o| matches!(o, Outcome::NotFound))),
            ("failed", self.failed()),
        ];
        parts
            .iter()
            .filter(|(_, n)| *n > 0)
            .map(|(label, n)| format!("{} {}", n, label))
            .collect::<Vec<_>>()
            .join(", ")
    }
}
