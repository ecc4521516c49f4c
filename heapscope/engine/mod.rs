//! Engine boundary
//!
//! The abstract execution engine is an external collaborator. It parses a program, constructs
//! a machine (populating builtins while doing so), and advances the machine one step at a
//! time. While constructing and advancing it reports graph mutations synchronously through
//! `EngineHooks`.

pub mod replay;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, GraphError, ParseError};

/// Identity of an abstract value, chosen by the engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValueId(pub u64);

/// An abstract value announced by the engine.
///
/// Capabilities are optional: `class` is the classification capability, `name` the name
/// capability and `enumerable` the name-enumeration capability (the value's named children
/// are the targets of the property links installed from it). A value with `outcomes` is a
/// union value that may resolve to any of them.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbstractValue {
    pub id: ValueId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub enumerable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outcomes: Option<Vec<AbstractValue>>,
}

impl AbstractValue {
    /// A value with no capabilities, e.g. a primitive
    pub fn plain(id: u64) -> AbstractValue {
        AbstractValue {
            id: ValueId(id),
            class: None,
            name: None,
            enumerable: false,
            outcomes: None,
        }
    }

    /// An object whose named children can be enumerated
    pub fn object(id: u64) -> AbstractValue {
        AbstractValue {
            enumerable: true,
            ..AbstractValue::plain(id)
        }
    }

    /// A value that may resolve to any of `outcomes`
    pub fn union(id: u64, outcomes: Vec<AbstractValue>) -> AbstractValue {
        AbstractValue {
            outcomes: Some(outcomes),
            ..AbstractValue::plain(id)
        }
    }

    pub fn with_class(mut self, class: impl Into<String>) -> AbstractValue {
        self.class = Some(class.into());
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> AbstractValue {
        self.name = Some(name.into());
        self
    }

    #[inline]
    pub fn is_union(&self) -> bool {
        self.outcomes.is_some()
    }
}

pub type HookResult = Result<(), GraphError>;

/// Event hooks invoked synchronously by the engine while it constructs or advances a machine.
///
/// An absent endpoint (`None`) in `on_link` and `on_unlink` stands for the root.
pub trait EngineHooks {
    fn on_value_created(&mut self, value: &AbstractValue) -> HookResult;

    fn on_push(&mut self, value: ValueId) -> HookResult;

    fn on_pop(&mut self, value: ValueId) -> HookResult;

    fn on_link(&mut self, from: Option<ValueId>, to: Option<ValueId>, label: &str) -> HookResult;

    fn on_unlink(&mut self, from: Option<ValueId>, to: Option<ValueId>, label: &str)
        -> HookResult;

    fn on_call_boundary(&mut self) -> HookResult;
}

/// Hooks that ignore every event. Used by the plain control-flow stepper.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopHooks;

impl EngineHooks for NoopHooks {
    fn on_value_created(&mut self, _: &AbstractValue) -> HookResult {
        Ok(())
    }

    fn on_push(&mut self, _: ValueId) -> HookResult {
        Ok(())
    }

    fn on_pop(&mut self, _: ValueId) -> HookResult {
        Ok(())
    }

    fn on_link(&mut self, _: Option<ValueId>, _: Option<ValueId>, _: &str) -> HookResult {
        Ok(())
    }

    fn on_unlink(&mut self, _: Option<ValueId>, _: Option<ValueId>, _: &str) -> HookResult {
        Ok(())
    }

    fn on_call_boundary(&mut self) -> HookResult {
        Ok(())
    }
}

/// The abstract execution engine.
pub trait Engine {
    type Program;
    type Machine: Machine;

    fn parse(&mut self, source: &str) -> Result<Self::Program, ParseError>;

    /// Build a machine for a parsed program. Events reported during construction are
    /// bootstrap events.
    fn construct(
        &mut self,
        program: Self::Program,
        hooks: &mut dyn EngineHooks,
    ) -> Result<Self::Machine, EngineError>;
}

/// A constructed program that can be advanced step by step.
pub trait Machine {
    /// The finished control-flow structure produced once advancement is exhausted
    type Output;

    /// Run one step. Returns false when there are no more steps.
    fn advance(&mut self, hooks: &mut dyn EngineHooks) -> Result<bool, EngineError>;

    fn finish(self) -> Self::Output;

    /// The root prototype collection
    fn builtins(&self) -> Vec<ValueId> {
        Vec::new()
    }

    /// The root scope value, if the engine models one separately from the root
    fn global(&self) -> Option<ValueId> {
        None
    }

    /// Diagnostic context used for failure reporting
    fn stack_info(&self) -> String {
        String::new()
    }
}
