//! The build pipeline.
//!
//! A [`Pipeline`] is an ordered list of [`PipelineStep`]s sharing one
//! [`PipelineContext`]. Steps run strictly one after another in the order
//! they were added. The first failing step aborts the run; nothing is rolled
//! back and the context is not meant to be reused.
//!
//! # Pipeline Position
//!
//! ```text
//! DiagramModel
//!     ↓ ValidateModel
//!     ↓ RunLayout    (stores a LayoutResult on the context)
//!     ↓ Render       (DrawCommands, then flush)
//! DrawingSurface
//! ```

mod context;
mod steps;

use log::{debug, info};

use crate::{cancel::CancellationToken, error::LimnError};

pub use context::PipelineContext;
pub use steps::{Render, RunLayout, ValidateModel};

/// One stage of a pipeline run.
pub trait PipelineStep {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Runs the step against the shared context.
    ///
    /// # Errors
    ///
    /// Any error aborts the pipeline run and reaches the caller unchanged.
    fn execute(
        &self,
        ctx: &mut PipelineContext<'_>,
        cancel: &CancellationToken,
    ) -> Result<(), LimnError>;
}

/// Ordered list of steps.
///
/// # Examples
///
/// ```
/// use limn::{
///     cancel::CancellationToken,
///     layout::GridLayout,
///     pipeline::{Pipeline, PipelineContext, Render, RunLayout, ValidateModel},
///     surface::RecordingSurface,
/// };
/// use limn_core::model::{DiagramModel, Node};
///
/// let pipeline = Pipeline::new()
///     .add(ValidateModel)
///     .add(RunLayout::new(GridLayout::new()))
///     .add(Render);
///
/// let mut model = DiagramModel::new();
/// model.add_node(Node::new("A", "Client"));
///
/// let mut surface = RecordingSurface::new();
/// let mut ctx = PipelineContext::new(model, &mut surface);
/// pipeline.run(&mut ctx, &CancellationToken::new()).unwrap();
/// assert!(ctx.layout().is_some());
/// drop(ctx);
///
/// assert_eq!(surface.commands().len(), 1);
/// assert_eq!(surface.flush_count(), 1);
/// ```
#[derive(Default)]
pub struct Pipeline {
    steps: Vec<Box<dyn PipelineStep>>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a step.
    pub fn add(mut self, step: impl PipelineStep + 'static) -> Self {
        self.steps.push(Box::new(step));
        self
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Names of the steps in run order.
    pub fn step_names(&self) -> impl Iterator<Item = &str> {
        self.steps.iter().map(|step| step.name())
    }

    /// Runs every step in order.
    ///
    /// Cancellation is checked before each step; a step that has started
    /// runs to completion.
    ///
    /// # Errors
    ///
    /// Returns the first step error, or [`LimnError::Cancelled`].
    pub fn run(
        &self,
        ctx: &mut PipelineContext<'_>,
        cancel: &CancellationToken,
    ) -> Result<(), LimnError> {
        info!(steps = self.steps.len(); "Running pipeline");
        for step in &self.steps {
            if cancel.is_cancelled() {
                info!(step = step.name(); "Pipeline cancelled");
                return Err(LimnError::Cancelled);
            }
            debug!(step = step.name(); "Running pipeline step");
            step.execute(ctx, cancel)?;
        }
        info!("Pipeline completed");
        Ok(())
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.step_names()).finish()
    }
}

#[cfg(test)]
mod tests {
    use std::{cell::RefCell, rc::Rc};

    use limn_core::model::{DiagramModel, Edge, Node};

    use super::*;
    use crate::{
        error::ModelError,
        layout::GridLayout,
        surface::RecordingSurface,
    };

    struct TracingStep {
        name: &'static str,
        log: Rc<RefCell<Vec<&'static str>>>,
        cancel_after: bool,
    }

    impl PipelineStep for TracingStep {
        fn name(&self) -> &str {
            self.name
        }

        fn execute(
            &self,
            _ctx: &mut PipelineContext<'_>,
            cancel: &CancellationToken,
        ) -> Result<(), LimnError> {
            self.log.borrow_mut().push(self.name);
            if self.cancel_after {
                cancel.cancel();
            }
            Ok(())
        }
    }

    fn tracing_step(name: &'static str, log: &Rc<RefCell<Vec<&'static str>>>) -> TracingStep {
        TracingStep {
            name,
            log: Rc::clone(log),
            cancel_after: false,
        }
    }

    #[test]
    fn test_steps_run_in_order() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let pipeline = Pipeline::new()
            .add(tracing_step("first", &log))
            .add(tracing_step("second", &log))
            .add(tracing_step("third", &log));

        let mut surface = RecordingSurface::new();
        let mut ctx = PipelineContext::new(DiagramModel::new(), &mut surface);
        pipeline.run(&mut ctx, &CancellationToken::new()).unwrap();

        assert_eq!(*log.borrow(), vec!["first", "second", "third"]);
    }

    #[test]
    fn test_cancellation_is_observed_between_steps() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let pipeline = Pipeline::new()
            .add(TracingStep {
                cancel_after: true,
                ..tracing_step("first", &log)
            })
            .add(tracing_step("second", &log));

        let mut surface = RecordingSurface::new();
        let mut ctx = PipelineContext::new(DiagramModel::new(), &mut surface);
        let err = pipeline.run(&mut ctx, &CancellationToken::new()).unwrap_err();

        assert!(matches!(err, LimnError::Cancelled));
        assert_eq!(*log.borrow(), vec!["first"]);
    }

    #[test]
    fn test_duplicate_id_stops_before_layout() {
        let model = DiagramModel::from_parts(
            [Node::new("X", "node"), Node::new("Y", "other")],
            [Edge::new("x", "X", "Y")],
        );
        let pipeline = Pipeline::new()
            .add(ValidateModel)
            .add(RunLayout::new(GridLayout::new()))
            .add(Render);

        let mut surface = RecordingSurface::new();
        let mut ctx = PipelineContext::new(model, &mut surface);
        let err = pipeline.run(&mut ctx, &CancellationToken::new()).unwrap_err();

        match err {
            LimnError::Model(err @ ModelError::DuplicateId { .. }) => {
                assert_eq!(err.id(), Some("x"));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(ctx.layout().is_none());
        drop(ctx);
        assert!(surface.commands().is_empty());
        assert_eq!(surface.flush_count(), 0);
    }

    #[test]
    fn test_debug_lists_step_names() {
        let pipeline = Pipeline::new().add(ValidateModel).add(Render);
        assert_eq!(format!("{pipeline:?}"), r#"["validate", "render"]"#);
    }
}
