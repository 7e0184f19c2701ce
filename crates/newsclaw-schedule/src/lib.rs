//! # NewsClaw Schedule
//!
//! Calendar-side logic: when a theme fires, and what its date-derived prompt
//! variables look like. Pure functions over dates, no I/O, no collaborators.

pub mod cadence;
pub mod vars;

pub use cadence::{Cadence, CadenceError, next_delivery_date, parse_cadence, should_deliver_on};
pub use vars::{PromptVariables, expand_prompt, prompt_variables};
