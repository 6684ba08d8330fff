// crates/jobs/src/kinds.rs
//! Per-kind stage plans and the registry that selects them.
//!
//! Everything that differs between job domains — stage names, budgets,
//! progress milestones, terminal payload — is configuration here, not
//! control flow. Swap a kind's plan or generator with
//! [`KindRegistry::register`].

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::generator::{CompletionSummary, ResultGenerator};
use crate::types::{JobKind, StageDefinition, StagePlan};

/// Stage plan + result generator for one job kind.
#[derive(Clone)]
pub struct KindConfig {
    pub plan: StagePlan,
    pub generator: Arc<dyn ResultGenerator>,
}

/// Maps a job kind to the configuration the sequencer runs.
pub struct KindRegistry {
    entries: HashMap<JobKind, KindConfig>,
}

impl KindRegistry {
    /// Registry with the default plan for every kind and the plain
    /// completion-summary generator.
    pub fn with_defaults() -> Self {
        let mut entries = HashMap::new();
        for kind in JobKind::ALL {
            entries.insert(
                kind,
                KindConfig {
                    plan: default_plan(kind),
                    generator: Arc::new(CompletionSummary),
                },
            );
        }
        Self { entries }
    }

    /// Replace a kind's plan and generator.
    pub fn register(
        &mut self,
        kind: JobKind,
        plan: StagePlan,
        generator: Arc<dyn ResultGenerator>,
    ) {
        self.entries.insert(kind, KindConfig { plan, generator });
    }

    pub fn config(&self, kind: JobKind) -> Option<KindConfig> {
        self.entries.get(&kind).cloned()
    }
}

impl Default for KindRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// Default stage plan for a kind.
pub fn default_plan(kind: JobKind) -> StagePlan {
    match kind {
        JobKind::Training => vec![
            StageDefinition::new("Data preprocessing", Duration::from_secs(2), 10),
            StageDefinition::new("Feature engineering", Duration::from_secs(3), 25),
            StageDefinition::new("Model initialization", Duration::from_secs(1), 30),
            StageDefinition::new("Training model", Duration::from_secs(5), 70),
            StageDefinition::new("Validation", Duration::from_secs(2), 85),
            StageDefinition::new("Generating results", Duration::from_secs(2), 95),
            StageDefinition::new("Finalizing", Duration::from_secs(1), 100),
        ],
        JobKind::Analysis => vec![
            StageDefinition::new(
                "Acquiring satellite and geological data",
                Duration::from_secs(2),
                30,
            ),
            StageDefinition::new("Extracting geological features", Duration::from_secs(2), 60),
            StageDefinition::new("Training regional model", Duration::from_secs(2), 90),
            StageDefinition::new("Generating final results", Duration::from_secs(1), 100),
        ],
        JobKind::Download => {
            let mut plan: StagePlan = (1..=10)
                .map(|chunk| {
                    StageDefinition::new(
                        format!("Downloading chunk {chunk}/10"),
                        Duration::from_secs(1),
                        chunk * 10,
                    )
                })
                .collect();
            plan.push(StageDefinition::new(
                "Processing",
                Duration::from_secs(2),
                100,
            ));
            plan
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::FailingGenerator;
    use crate::types::Job;
    use serde_json::json;

    #[test]
    fn test_defaults_cover_every_kind() {
        let registry = KindRegistry::with_defaults();
        for kind in JobKind::ALL {
            let config = registry.config(kind).expect("kind registered");
            assert!(!config.plan.is_empty());
        }
    }

    #[test]
    fn test_plans_are_monotonic_and_end_at_100() {
        for kind in JobKind::ALL {
            let plan = default_plan(kind);
            let mut last = 0u8;
            for stage in &plan {
                assert!(
                    stage.progress_after >= last,
                    "{kind}: {} regresses", stage.name
                );
                last = stage.progress_after;
            }
            assert_eq!(last, 100, "{kind} plan must finish at 100");
        }
    }

    #[test]
    fn test_download_milestones_step_by_ten() {
        let plan = default_plan(JobKind::Download);
        let milestones: Vec<u8> = plan.iter().map(|s| s.progress_after).collect();
        assert_eq!(
            milestones,
            vec![10, 20, 30, 40, 50, 60, 70, 80, 90, 100, 100]
        );
        assert_eq!(plan.last().unwrap().name, "Processing");
    }

    #[test]
    fn test_register_swaps_generator() {
        let mut registry = KindRegistry::with_defaults();
        registry.register(
            JobKind::Training,
            vec![],
            Arc::new(FailingGenerator::new("swapped")),
        );

        let config = registry.config(JobKind::Training).unwrap();
        assert!(config.plan.is_empty());
        let job = Job::new("job_r".into(), JobKind::Training, json!({}), 1);
        assert_eq!(config.generator.generate(&job).unwrap_err(), "swapped");
    }
}
