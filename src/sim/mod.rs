//! Attack simulation: states, telemetry generation, event sinks, the
//! blue-team decision gate, and the progression state machine.

pub mod decision;
pub mod events;
pub mod machine;
pub mod sink;
pub mod state;

pub use decision::{ChoiceSource, DecisionGate, DecisionOutcome, ScriptedChoices, StdinChoice};
pub use events::{Event, EventGenerator};
pub use machine::{AttackStateMachine, Pacing, SimulationRun};
pub use sink::EventSink;
pub use state::{AttackState, PROGRESSION};
