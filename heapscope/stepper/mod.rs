//! Stepper - cooperative, bounded-batch driver of an abstract execution engine
//!
//! Design:
//! - Construction parses the program and constructs the machine; events reported while the
//!   machine is constructed are bootstrap events
//! - `run_batch` advances the machine at most `batch_size` times, then returns control to
//!   the host so it can interleave other work before resuming
//! - At every batch boundary a pending reachability collection is run before yielding or
//!   reporting completion
//! - The control-flow stepper and the instrumented stepper share this state machine and differ
//!   only in the hooks they feed engine events to

use tracing::{debug, trace};

use crate::{
    common::options::Options,
    engine::{Engine, EngineHooks, Machine, NoopHooks, ValueId},
    error::{EngineError, SessionError},
    graph::ObjectGraph,
};

/// Hooks driven by a `Stepper`. Extends the engine's event hooks with the stepper's own
/// lifecycle: the bootstrap phase and collections at batch boundaries.
pub trait StepHooks: EngineHooks {
    fn enter_bootstrap(&mut self) {}

    /// Bootstrap finished, reporting the machine's root prototype collection and root scope
    fn leave_bootstrap(&mut self, _builtins: &[ValueId], _global: Option<ValueId>) {}

    /// Whether a collection should run at this batch boundary
    fn collection_pending(&self) -> bool {
        false
    }

    /// Run a collection, returning the number of vertices removed
    fn collect_garbage(&mut self) -> usize {
        0
    }
}

impl StepHooks for NoopHooks {}

impl StepHooks for ObjectGraph {
    fn enter_bootstrap(&mut self) {
        self.begin_bootstrap();
    }

    fn leave_bootstrap(&mut self, builtins: &[ValueId], global: Option<ValueId>) {
        self.end_bootstrap();
        self.register_builtins(builtins);
        self.set_global(global);
    }

    fn collection_pending(&self) -> bool {
        self.changed_since_collection() && self.collection_due()
    }

    fn collect_garbage(&mut self) -> usize {
        self.collect().len()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StepperStatus {
    /// Constructed, no batch run yet
    Ready,
    Stepping,
    /// Advancement is exhausted
    Done,
    /// Parsing, construction or a step failed
    Error,
}

impl StepperStatus {
    #[inline]
    pub fn is_terminal(self) -> bool {
        matches!(self, StepperStatus::Done | StepperStatus::Error)
    }
}

/// Outcome of a single batch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Batch {
    /// The batch ran `batch_size` steps and more may follow
    Yielded,
    Done,
    Failed(SessionError),
}

pub struct Stepper<E: Engine, H: StepHooks> {
    /// The machine being advanced, or the error that ended the session
    session: Result<E::Machine, SessionError>,
    hooks: H,
    status: StepperStatus,

    batch_size: usize,
    collect_garbage: bool,

    /// Successful steps so far
    steps: usize,
    /// Batches that ended by yielding to the host
    yields: usize,
}

/// Plain control-flow stepper
pub type FlowStepper<E> = Stepper<E, NoopHooks>;

/// Stepper feeding graph-mutation events to an object graph
pub type GraphStepper<E> = Stepper<E, ObjectGraph>;

impl<E: Engine, H: StepHooks> Stepper<E, H> {
    /// Parse `source` and construct its machine. Failures leave the stepper in the `Error`
    /// state; they are reported by `error` and by the first `run_batch`.
    pub fn new(engine: &mut E, source: &str, mut hooks: H, options: &Options) -> Self {
        let session = Self::start(engine, source, &mut hooks);
        let status = match &session {
            Ok(_) => StepperStatus::Ready,
            Err(error) => {
                debug!(%error, "session failed before stepping");
                StepperStatus::Error
            }
        };

        Stepper {
            session,
            hooks,
            status,
            batch_size: options.batch_size.max(1),
            collect_garbage: options.collect_garbage,
            steps: 0,
            yields: 0,
        }
    }

    fn start(engine: &mut E, source: &str, hooks: &mut H) -> Result<E::Machine, SessionError> {
        let program = engine.parse(source)?;

        hooks.enter_bootstrap();
        let machine = match engine.construct(program, hooks) {
            Ok(machine) => machine,
            Err(error) => {
                hooks.leave_bootstrap(&[], None);
                return Err(error.into());
            }
        };
        hooks.leave_bootstrap(&machine.builtins(), machine.global());

        Ok(machine)
    }

    #[inline]
    pub fn status(&self) -> StepperStatus {
        self.status
    }

    /// The error that ended the session, if any
    pub fn error(&self) -> Option<&SessionError> {
        self.session.as_ref().err()
    }

    pub fn hooks(&self) -> &H {
        &self.hooks
    }

    pub fn hooks_mut(&mut self) -> &mut H {
        &mut self.hooks
    }

    #[inline]
    pub fn steps(&self) -> usize {
        self.steps
    }

    #[inline]
    pub fn yields(&self) -> usize {
        self.yields
    }

    #[inline]
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Advance the machine by up to `batch_size` steps.
    ///
    /// Once the stepper reached a terminal state every further call reports that state again.
    pub fn run_batch(&mut self) -> Batch {
        match self.status {
            StepperStatus::Done => return Batch::Done,
            StepperStatus::Ready => {
                debug!(batch_size = self.batch_size, "stepping started");
                self.status = StepperStatus::Stepping;
            }
            StepperStatus::Stepping | StepperStatus::Error => {}
        }

        let machine = match &mut self.session {
            Ok(machine) => machine,
            Err(error) => return Batch::Failed(error.clone()),
        };

        let mut exhausted = false;
        for _ in 0..self.batch_size {
            match machine.advance(&mut self.hooks) {
                Ok(true) => self.steps += 1,
                Ok(false) => {
                    exhausted = true;
                    break;
                }
                Err(error) => {
                    let stack_info = machine.stack_info();
                    return self.fail(error, stack_info);
                }
            }
        }

        self.collect_at_boundary();

        if exhausted {
            debug!(steps = self.steps, yields = self.yields, "stepping finished");
            self.status = StepperStatus::Done;
            Batch::Done
        } else {
            self.yields += 1;
            trace!(steps = self.steps, yields = self.yields, "batch yielded");
            Batch::Yielded
        }
    }

    /// Run batches until the session ends.
    pub fn run_to_completion(&mut self) -> Result<(), SessionError> {
        loop {
            match self.run_batch() {
                Batch::Yielded => continue,
                Batch::Done => return Ok(()),
                Batch::Failed(error) => return Err(error),
            }
        }
    }

    /// The machine's finished output, or the error that ended the session.
    pub fn into_output(self) -> Result<<E::Machine as Machine>::Output, SessionError> {
        self.session.map(Machine::finish)
    }

    fn collect_at_boundary(&mut self) {
        let due = cfg!(feature = "gc_stress_test") || self.hooks.collection_pending();
        if !self.collect_garbage || !due {
            return;
        }

        let removed = self.hooks.collect_garbage();
        debug!(removed, steps = self.steps, "collected at batch boundary");
    }

    fn fail(&mut self, error: EngineError, stack_info: String) -> Batch {
        let error = match SessionError::from(error) {
            SessionError::Execution(mut error) => {
                if error.stack_info.is_none() && !stack_info.is_empty() {
                    error.stack_info = Some(stack_info);
                }
                SessionError::Execution(error)
            }
            error => error,
        };

        debug!(%error, steps = self.steps, "stepping failed");
        self.status = StepperStatus::Error;
        self.session = Err(error.clone());
        Batch::Failed(error)
    }
}

impl<E: Engine> Stepper<E, NoopHooks> {
    /// A control-flow stepper that ignores graph events
    pub fn flow(engine: &mut E, source: &str, options: &Options) -> Self {
        Stepper::new(engine, source, NoopHooks, options)
    }
}

impl<E: Engine> Stepper<E, ObjectGraph> {
    /// A stepper maintaining a fresh object graph
    pub fn instrumented(engine: &mut E, source: &str, options: &Options) -> Self {
        Stepper::new(engine, source, ObjectGraph::new(), options)
    }

    #[inline]
    pub fn graph(&self) -> &ObjectGraph {
        &self.hooks
    }

    #[inline]
    pub fn graph_mut(&mut self) -> &mut ObjectGraph {
        &mut self.hooks
    }
}
