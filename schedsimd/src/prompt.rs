//! # Interactive Prompt
//!
//! Asks for whatever the command line left out, the way the classic menu
//! did. Generic over reader and writer so tests can script the answers.

use crate::runtime::HostError;
use core_types::SchedulingPolicy;
use std::io::{BufRead, Write};

fn read_answer<R: BufRead>(input: &mut R) -> Result<String, HostError> {
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Err(HostError::Config("Unexpected end of input".to_string()));
    }
    Ok(line.trim().to_string())
}

/// Shows the policy menu and reads a choice
///
/// Any number outside the menu selects FCFS. Policy names are accepted too.
pub fn prompt_policy<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
) -> Result<SchedulingPolicy, HostError> {
    writeln!(output, "Select scheduler type:")?;
    for (i, policy) in SchedulingPolicy::ALL.iter().enumerate() {
        writeln!(output, "{}. {}", i + 1, policy)?;
    }
    write!(output, "> ")?;
    output.flush()?;

    let answer = read_answer(input)?;
    if let Ok(choice) = answer.parse::<i64>() {
        return Ok(SchedulingPolicy::from_menu_choice(choice));
    }
    answer
        .parse::<SchedulingPolicy>()
        .map_err(|e| HostError::Config(e.to_string()))
}

/// Asks for the number of tasks to generate
pub fn prompt_task_count<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
) -> Result<usize, HostError> {
    write!(output, "Enter number of tasks: ")?;
    output.flush()?;

    let answer = read_answer(input)?;
    answer
        .parse::<usize>()
        .map_err(|_| HostError::Config(format!("Invalid task count: {}", answer)))
}
