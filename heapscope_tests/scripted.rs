//! A line-oriented scripted engine for driving the tracker in tests.
//!
//! ```text
//! @create 1 object class=Object.prototype    # bootstrap event
//! create 2 object class=Point
//! link - 2 p                                 # `-` is the root
//! ---                                        # ends a step
//! either 3 4 5                               # union 3 of objects 4 and 5
//! push 3
//! pop 3
//! call
//! ```
//!
//! Events before the first `---` form the first step. Every `---` ends a step, so consecutive
//! separators produce steps that report nothing.

#![allow(dead_code)]

use std::mem;

use heapscope::{
    common::time::ManualClock,
    engine::{replay::TraceEvent, Engine, EngineHooks, Machine},
    AbstractValue, EngineError, Options, ParseError, SessionError, Snapshot, SnapshotStream,
    ValueId,
};

pub struct ScriptedEngine;

pub struct Script {
    bootstrap: Vec<TraceEvent>,
    steps: Vec<Vec<TraceEvent>>,
}

impl Engine for ScriptedEngine {
    type Program = Script;
    type Machine = ScriptedMachine;

    fn parse(&mut self, source: &str) -> Result<Script, ParseError> {
        let mut script = Script {
            bootstrap: Vec::new(),
            steps: Vec::new(),
        };
        let mut current = Vec::new();

        for (index, line) in source.lines().enumerate() {
            let line = match line.split_once('#') {
                Some((code, _)) => code.trim(),
                None => line.trim(),
            };

            if line.is_empty() {
                continue;
            }

            if line == "---" {
                script.steps.push(mem::take(&mut current));
            } else if let Some(event) = line.strip_prefix('@') {
                script.bootstrap.push(parse_event(event.trim(), index + 1)?);
            } else {
                current.push(parse_event(line, index + 1)?);
            }
        }

        if !current.is_empty() {
            script.steps.push(current);
        }

        Ok(script)
    }

    fn construct(
        &mut self,
        script: Script,
        hooks: &mut dyn EngineHooks,
    ) -> Result<ScriptedMachine, EngineError> {
        for event in &script.bootstrap {
            event.dispatch(hooks)?;
        }

        Ok(ScriptedMachine {
            steps: script.steps,
            next: 0,
        })
    }
}

pub struct ScriptedMachine {
    steps: Vec<Vec<TraceEvent>>,
    next: usize,
}

impl Machine for ScriptedMachine {
    type Output = usize;

    fn advance(&mut self, hooks: &mut dyn EngineHooks) -> Result<bool, EngineError> {
        let Some(events) = self.steps.get(self.next) else {
            return Ok(false);
        };

        for event in events {
            event.dispatch(hooks)?;
        }

        self.next += 1;
        Ok(true)
    }

    fn finish(self) -> usize {
        self.next
    }

    fn stack_info(&self) -> String {
        format!("at script step {}", self.next + 1)
    }
}

fn parse_event(line: &str, line_number: usize) -> Result<TraceEvent, ParseError> {
    let error = |message: String| ParseError::new(message, line_number, 1);

    let mut words = line.split_whitespace();
    let op = words.next().unwrap_or_default();

    let event = match op {
        "create" => {
            let mut value = AbstractValue::plain(parse_id(words.next(), line_number)?);
            for word in words {
                if word == "object" {
                    value.enumerable = true;
                } else if let Some(class) = word.strip_prefix("class=") {
                    value = value.with_class(class);
                } else if let Some(name) = word.strip_prefix("name=") {
                    value = value.with_name(name);
                } else {
                    return Err(error(format!("unknown attribute `{word}`")));
                }
            }
            TraceEvent::create(value)
        }
        "either" => {
            let id = parse_id(words.next(), line_number)?;
            let outcomes = words
                .map(|word| parse_id(Some(word), line_number).map(AbstractValue::object))
                .collect::<Result<Vec<_>, _>>()?;
            TraceEvent::create(AbstractValue::union(id, outcomes))
        }
        "push" => TraceEvent::Push {
            value: ValueId(parse_id(words.next(), line_number)?),
        },
        "pop" => TraceEvent::Pop {
            value: ValueId(parse_id(words.next(), line_number)?),
        },
        "link" | "unlink" => {
            let from = parse_endpoint(words.next(), line_number)?;
            let to = parse_endpoint(words.next(), line_number)?;
            let label = words
                .next()
                .ok_or_else(|| error("missing label".to_owned()))?
                .to_owned();

            if op == "link" {
                TraceEvent::Link { from, to, label }
            } else {
                TraceEvent::Unlink { from, to, label }
            }
        }
        "call" => TraceEvent::CallBoundary,
        "throw" => TraceEvent::throw(&words.collect::<Vec<_>>().join(" ")),
        _ => return Err(error(format!("unknown operation `{op}`"))),
    };

    Ok(event)
}

fn parse_id(word: Option<&str>, line_number: usize) -> Result<u64, ParseError> {
    let word = word.ok_or_else(|| ParseError::new("missing value id", line_number, 1))?;
    word.parse()
        .map_err(|_| ParseError::new(format!("invalid value id `{word}`"), line_number, 1))
}

fn parse_endpoint(word: Option<&str>, line_number: usize) -> Result<Option<ValueId>, ParseError> {
    match word {
        Some("-") => Ok(None),
        word => parse_id(word, line_number).map(|id| Some(ValueId(id))),
    }
}

/// A stream over `script` whose clock never advances.
pub fn stream(script: &str, options: &Options) -> SnapshotStream<ScriptedEngine, ManualClock> {
    SnapshotStream::with_clock(&mut ScriptedEngine, script, options, ManualClock::new())
}

/// Every item the stream over `script` emits
pub fn run(script: &str, options: &Options) -> Vec<Result<Snapshot, SessionError>> {
    stream(script, options).collect()
}

/// The terminal snapshot of a successful run
pub fn final_snapshot(items: &[Result<Snapshot, SessionError>]) -> &Snapshot {
    match items.last() {
        Some(Ok(snapshot)) if snapshot.is_final() => snapshot,
        other => panic!("expected a final snapshot, got {other:?}"),
    }
}

/// Number of snapshot vertices carrying `label`
pub fn count_labelled(snapshot: &Snapshot, label: &str) -> usize {
    snapshot.vertices_labelled(label).count()
}
