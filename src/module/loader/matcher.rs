//! Subsystem matching
//!
//! Pairs subsystem descriptors with the system whose declared name they target.
//! Registries are small and hand-curated, so matching is a linear scan per
//! system rather than an index.

use serde::Serialize;
use tracing::debug;

use crate::module::instance::SystemInstance;
use crate::module::loader::instantiator::{InstantiationError, Instantiator};
use crate::module::registry::{Registry, SubsystemDescriptor};

/// Result of attaching subsystems to one system
#[derive(Debug, Default)]
pub struct MatchOutcome {
    /// Templates of subsystems attached, in descriptor order
    pub attached: Vec<String>,
    /// Matching descriptors that failed to instantiate
    pub failed: Vec<(SubsystemDescriptor, InstantiationError)>,
}

/// Attaches matching subsystems to a freshly instantiated system
pub struct SubsystemMatcher;

impl SubsystemMatcher {
    /// Instantiate and attach every subsystem targeting `instance`
    ///
    /// A subsystem that fails to instantiate, or whose instance targets a
    /// different system than its descriptor, is recorded in the outcome and
    /// does not affect its siblings.
    pub fn attach(
        instance: &mut SystemInstance,
        descriptors: &[SubsystemDescriptor],
        instantiator: &dyn Instantiator,
    ) -> MatchOutcome {
        let mut outcome = MatchOutcome::default();
        let system_name = instance.name().to_string();
        let environment = instance.environment().to_string();

        for descriptor in descriptors.iter().filter(|d| d.targets(&system_name)) {
            let instantiated = instantiator
                .instantiate_subsystem(&descriptor.template, &environment)
                .and_then(|subsystem| {
                    if subsystem.target_system() == descriptor.system {
                        Ok(subsystem)
                    } else {
                        Err(InstantiationError::WrongTarget {
                            template: descriptor.template.clone(),
                            expected: descriptor.system.clone(),
                            actual: subsystem.target_system().to_string(),
                        })
                    }
                });

            match instantiated {
                Ok(subsystem) => {
                    debug!(
                        "Attaching subsystem {} to system {}",
                        descriptor.template, system_name
                    );
                    instance.attach(subsystem);
                    outcome.attached.push(descriptor.template.clone());
                }
                Err(e) => {
                    debug!("Not attaching subsystem {}: {}", descriptor.template, e);
                    outcome.failed.push((descriptor.clone(), e));
                }
            }
        }

        outcome
    }
}

/// One system in a load plan
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedSystem {
    pub name: String,
    pub template: String,
    /// Subsystem templates that would attach
    pub subsystems: Vec<String>,
}

/// What a run over a registry would do, computed without instantiating anything
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BootPlan {
    /// Systems in load order
    pub systems: Vec<PlannedSystem>,
    /// Subsystem descriptors no system will pick up
    pub inert: Vec<SubsystemDescriptor>,
}

impl BootPlan {
    pub fn from_registry(registry: &Registry) -> Self {
        let systems = registry
            .systems()
            .iter()
            .map(|d| PlannedSystem {
                name: d.name.clone(),
                template: d.template.clone(),
                subsystems: registry
                    .subsystems_for(&d.name)
                    .map(|s| s.template.clone())
                    .collect(),
            })
            .collect();

        let inert = registry
            .unmatched_subsystems()
            .into_iter()
            .cloned()
            .collect();

        Self { systems, inert }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module::registry::{SystemDescriptor, TemplateRegistry};
    use crate::module::traits::{LoadContext, ModuleError, Subsystem, System};
    use async_trait::async_trait;

    struct Host;

    #[async_trait]
    impl System for Host {
        fn name(&self) -> &str {
            "Host"
        }

        async fn load(&mut self, _ctx: LoadContext<'_>) -> Result<(), ModuleError> {
            Ok(())
        }
    }

    struct Plugin {
        name: &'static str,
        target: &'static str,
    }

    impl Subsystem for Plugin {
        fn name(&self) -> &str {
            self.name
        }

        fn target_system(&self) -> &str {
            self.target
        }
    }

    fn templates() -> TemplateRegistry {
        let mut templates = TemplateRegistry::new();
        templates
            .register_subsystem("alpha", || Plugin {
                name: "alpha",
                target: "Host",
            })
            .register_subsystem("beta", || Plugin {
                name: "beta",
                target: "Host",
            })
            .register_subsystem("stray", || Plugin {
                name: "stray",
                target: "Other",
            });
        templates
    }

    fn instance() -> SystemInstance {
        SystemInstance::new("Host", "host", "systems", Box::new(Host))
    }

    #[test]
    fn test_attaches_only_matching_subsystems() {
        let templates = templates();
        let mut instance = instance();
        let descriptors = vec![
            SubsystemDescriptor::new("alpha", "Host"),
            SubsystemDescriptor::new("beta", "Other"),
            SubsystemDescriptor::new("beta", "host"),
        ];

        let outcome = SubsystemMatcher::attach(&mut instance, &descriptors, &templates);

        assert_eq!(outcome.attached, vec!["alpha".to_string()]);
        assert!(outcome.failed.is_empty());
        assert_eq!(instance.subsystem_names(), vec!["alpha".to_string()]);
    }

    #[test]
    fn test_failed_subsystem_does_not_block_siblings() {
        let templates = templates();
        let mut instance = instance();
        let descriptors = vec![
            SubsystemDescriptor::new("alpha", "Host"),
            SubsystemDescriptor::new("missing", "Host"),
            SubsystemDescriptor::new("beta", "Host"),
        ];

        let outcome = SubsystemMatcher::attach(&mut instance, &descriptors, &templates);

        assert_eq!(outcome.attached, vec!["alpha".to_string(), "beta".to_string()]);
        assert_eq!(outcome.failed.len(), 1);
        assert_eq!(outcome.failed[0].0.template, "missing");
        assert_eq!(instance.subsystems().len(), 2);
    }

    #[test]
    fn test_subsystem_for_another_system_is_not_attached() {
        let templates = templates();
        let mut instance = instance();
        let descriptors = vec![
            SubsystemDescriptor::new("stray", "Host"),
            SubsystemDescriptor::new("alpha", "Host"),
        ];

        let outcome = SubsystemMatcher::attach(&mut instance, &descriptors, &templates);

        assert_eq!(outcome.attached, vec!["alpha".to_string()]);
        assert_eq!(instance.subsystem_names(), vec!["alpha".to_string()]);
        assert_eq!(outcome.failed.len(), 1);
        match &outcome.failed[0].1 {
            InstantiationError::WrongTarget {
                template,
                expected,
                actual,
            } => {
                assert_eq!(template, "stray");
                assert_eq!(expected, "Host");
                assert_eq!(actual, "Other");
            }
            other => panic!("expected a target mismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_boot_plan_lists_attachments_and_inert() {
        let registry = Registry::new(
            vec![
                SystemDescriptor::new("a", "A"),
                SystemDescriptor::new("b", "B"),
            ],
            vec![
                SubsystemDescriptor::new("b-plugin", "B"),
                SubsystemDescriptor::new("orphan", "C"),
            ],
        );

        let plan = BootPlan::from_registry(&registry);

        assert_eq!(plan.systems.len(), 2);
        assert!(plan.systems[0].subsystems.is_empty());
        assert_eq!(plan.systems[1].subsystems, vec!["b-plugin".to_string()]);
        assert_eq!(plan.inert, vec![SubsystemDescriptor::new("orphan", "C")]);
    }
}
