//! The migration runner: applies pending steps in ascending version order,
//! committing the new version after each one.

use crate::error::{MigrationError, SchemaError};
use crate::version::{SchemaVersion, VersionStore};

type ApplyFn<D> = Box<dyn Fn(&mut D) -> Result<(), SchemaError>>;

/// A single schema change gated by a target version.
///
/// The apply closure must guard its own mutations with the existence checks
/// of [crate::SchemaEdit]: a step can succeed while the version commit after
/// it fails, in which case the step runs again on the next invocation.
pub struct Step<D: ?Sized> {
    target: SchemaVersion,
    apply: ApplyFn<D>,
}

impl<D: ?Sized> Step<D> {
    pub fn new(
        target: SchemaVersion,
        apply: impl Fn(&mut D) -> Result<(), SchemaError> + 'static,
    ) -> Self {
        Self {
            target,
            apply: Box::new(apply),
        }
    }

    pub fn target(&self) -> SchemaVersion {
        self.target
    }
}

/// An ordered sequence of migration steps.
///
/// Steps are declared once, in ascending target order, and never reordered.
pub struct Plan<D: ?Sized> {
    steps: Vec<Step<D>>,
}

impl<D: ?Sized> Default for Plan<D> {
    fn default() -> Self {
        Self { steps: Vec::new() }
    }
}

impl<D: ?Sized> Plan<D> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a step targeting `target`.
    pub fn step(
        mut self,
        target: SchemaVersion,
        apply: impl Fn(&mut D) -> Result<(), SchemaError> + 'static,
    ) -> Self {
        self.steps.push(Step::new(target, apply));
        self
    }

    pub fn push(&mut self, step: Step<D>) {
        self.steps.push(step);
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Highest target version in the plan.
    pub fn latest(&self) -> Option<SchemaVersion> {
        self.steps.iter().map(Step::target).max()
    }

    /// The steps that would run when starting from `current`.
    pub fn pending(&self, current: SchemaVersion) -> impl Iterator<Item = &Step<D>> {
        self.steps.iter().filter(move |step| step.target > current)
    }

    fn validate(&self) -> Result<(), MigrationError> {
        for pair in self.steps.windows(2) {
            let (prev, next) = (pair[0].target, pair[1].target);
            if next == prev {
                return Err(MigrationError::DuplicateTarget(next));
            }
            if next < prev {
                return Err(MigrationError::UnsortedSteps { prev, next });
            }
        }
        Ok(())
    }
}

impl<D: VersionStore + ?Sized> Plan<D> {
    /// Apply every step whose target is above the stored version, in order.
    ///
    /// The new version is persisted immediately after each successful step,
    /// so an interrupted upgrade resumes from the last committed step rather
    /// than from scratch. The first failing step ends the run; steps already
    /// committed stay committed and later steps are not attempted. Retrying
    /// is simply calling `run` again.
    ///
    /// Returns the version the schema ends up at.
    pub fn run(&self, driver: &mut D) -> Result<SchemaVersion, MigrationError> {
        self.validate()?;

        let mut current = driver.current().map_err(MigrationError::ReadVersion)?;
        let pending = self.pending(current).count();
        if pending == 0 {
            log::debug!("schema is up to date at version {current}");
            return Ok(current);
        }
        log::info!("schema is at version {current}, {pending} step(s) pending");

        for step in &self.steps {
            if step.target <= current {
                log::debug!("step {} already applied, skipping", step.target);
                continue;
            }
            log::info!("migrating schema from version {current} to {}", step.target);
            (step.apply)(driver).map_err(|source| MigrationError::StepFailed {
                target: step.target,
                source,
            })?;
            driver.set(step.target).map_err(|source| MigrationError::SaveVersion {
                version: step.target,
                source,
            })?;
            current = step.target;
        }

        log::info!("schema migrated to version {current}");
        Ok(current)
    }
}
