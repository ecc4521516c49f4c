//! Replay engine
//!
//! Replays a recorded event trace as if an abstract execution engine were producing it. The
//! program text is a JSON document:
//!
//! ```json
//! {
//!   "bootstrap": [{ "op": "create", "value": { "id": 1, "class": "Object.prototype" } }],
//!   "steps": [
//!     [{ "op": "create", "value": { "id": 2, "enumerable": true } },
//!      { "op": "link", "to": 2, "label": "a" }],
//!     [{ "op": "call_boundary" }]
//!   ]
//! }
//! ```
//!
//! Each entry of `steps` holds the events one `advance` reports.

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::{
    engine::{AbstractValue, Engine, EngineHooks, Machine, ValueId},
    error::{EngineError, ExecutionError, ParseError},
};

/// A single recorded engine event.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum TraceEvent {
    Create {
        value: AbstractValue,
    },
    Push {
        value: ValueId,
    },
    Pop {
        value: ValueId,
    },
    Link {
        #[serde(default)]
        from: Option<ValueId>,
        #[serde(default)]
        to: Option<ValueId>,
        label: String,
    },
    Unlink {
        #[serde(default)]
        from: Option<ValueId>,
        #[serde(default)]
        to: Option<ValueId>,
        label: String,
    },
    CallBoundary,
    /// The engine raises an execution error at this point
    Throw {
        message: String,
    },
}

impl TraceEvent {
    pub fn create(value: AbstractValue) -> TraceEvent {
        TraceEvent::Create { value }
    }

    pub fn push(value: u64) -> TraceEvent {
        TraceEvent::Push {
            value: ValueId(value),
        }
    }

    pub fn pop(value: u64) -> TraceEvent {
        TraceEvent::Pop {
            value: ValueId(value),
        }
    }

    pub fn link(from: Option<u64>, to: Option<u64>, label: &str) -> TraceEvent {
        TraceEvent::Link {
            from: from.map(ValueId),
            to: to.map(ValueId),
            label: label.to_owned(),
        }
    }

    pub fn unlink(from: Option<u64>, to: Option<u64>, label: &str) -> TraceEvent {
        TraceEvent::Unlink {
            from: from.map(ValueId),
            to: to.map(ValueId),
            label: label.to_owned(),
        }
    }

    pub fn throw(message: &str) -> TraceEvent {
        TraceEvent::Throw {
            message: message.to_owned(),
        }
    }

    /// Deliver this event to the hooks.
    pub fn dispatch(&self, hooks: &mut dyn EngineHooks) -> Result<(), EngineError> {
        match self {
            TraceEvent::Create { value } => hooks.on_value_created(value)?,
            TraceEvent::Push { value } => hooks.on_push(*value)?,
            TraceEvent::Pop { value } => hooks.on_pop(*value)?,
            TraceEvent::Link { from, to, label } => hooks.on_link(*from, *to, label)?,
            TraceEvent::Unlink { from, to, label } => hooks.on_unlink(*from, *to, label)?,
            TraceEvent::CallBoundary => hooks.on_call_boundary()?,
            TraceEvent::Throw { message } => {
                return Err(ExecutionError::new(message.clone()).into())
            }
        }

        Ok(())
    }
}

/// A recorded session: the bootstrap events followed by the events of each step.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trace {
    #[serde(default)]
    pub bootstrap: Vec<TraceEvent>,
    #[serde(default)]
    pub steps: Vec<Vec<TraceEvent>>,
    #[serde(default)]
    pub builtins: Vec<ValueId>,
    #[serde(default)]
    pub global: Option<ValueId>,
}

impl Trace {
    pub fn new() -> Trace {
        Trace::default()
    }

    pub fn bootstrap(mut self, event: TraceEvent) -> Trace {
        self.bootstrap.push(event);
        self
    }

    /// Append a step reporting `events`
    pub fn step(mut self, events: Vec<TraceEvent>) -> Trace {
        self.steps.push(events);
        self
    }

    /// Append `count` steps that report no events
    pub fn idle_steps(mut self, count: usize) -> Trace {
        self.steps.extend((0..count).map(|_| Vec::new()));
        self
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Engine that parses JSON traces and replays them.
#[derive(Default)]
pub struct ReplayEngine;

impl ReplayEngine {
    pub fn new() -> ReplayEngine {
        ReplayEngine
    }
}

impl Engine for ReplayEngine {
    type Program = Trace;
    type Machine = ReplayMachine;

    fn parse(&mut self, source: &str) -> Result<Trace, ParseError> {
        serde_json::from_str(source)
            .map_err(|error| ParseError::new(error.to_string(), error.line(), error.column()))
    }

    fn construct(
        &mut self,
        program: Trace,
        hooks: &mut dyn EngineHooks,
    ) -> Result<ReplayMachine, EngineError> {
        for event in &program.bootstrap {
            event.dispatch(hooks)?;
        }

        Ok(ReplayMachine {
            steps: program.steps,
            position: 0,
            builtins: program.builtins,
            global: program.global,
        })
    }
}

/// A trace being replayed one step per `advance`.
pub struct ReplayMachine {
    steps: Vec<Vec<TraceEvent>>,
    position: usize,
    builtins: Vec<ValueId>,
    global: Option<ValueId>,
}

impl Machine for ReplayMachine {
    /// Number of steps replayed
    type Output = usize;

    fn advance(&mut self, hooks: &mut dyn EngineHooks) -> Result<bool, EngineError> {
        let Some(events) = self.steps.get(self.position) else {
            return Ok(false);
        };

        trace!(step = self.position, events = events.len(), "replaying step");
        for event in events {
            event.dispatch(hooks)?;
        }

        self.position += 1;
        Ok(true)
    }

    fn finish(self) -> usize {
        self.position
    }

    fn builtins(&self) -> Vec<ValueId> {
        self.builtins.clone()
    }

    fn global(&self) -> Option<ValueId> {
        self.global
    }

    fn stack_info(&self) -> String {
        format!("replay step {} of {}", self.position, self.steps.len())
    }
}
