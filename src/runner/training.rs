//! Interactive training session
//!
//! Commands are typed as `command,duration` lines and queued; `run` sends
//! the queue to the robot and clears it.

use crate::channel::DeviceChannel;
use crate::command::CommandQueue;
use crate::core::{Sleeper, MAX_DURATION};
use crate::hardware::SerialTransport;
use crate::runner::RunnerError;
use std::io::{BufRead, Write};

const PROMPT: &str = "BOW-WOW?>>> ";

/// Command word standing for a pure wait
const SLEEP_WORD: &str = "sleep";

/// One line of user input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrainingInput<'a> {
    Blank,
    Quit,
    Clear,
    DryRun,
    Run,
    /// `command,duration`; `sleep` as command becomes the empty command
    Add { command: &'a str, duration: &'a str },
    Unknown,
}

pub fn parse_input(line: &str) -> TrainingInput<'_> {
    match line.trim() {
        "" => TrainingInput::Blank,
        "quit" | "exit" => TrainingInput::Quit,
        "clear" => TrainingInput::Clear,
        "dry-run" => TrainingInput::DryRun,
        "run" => TrainingInput::Run,
        other => parse_add(other).unwrap_or(TrainingInput::Unknown),
    }
}

/// Accepts exactly one comma with a non-empty command before it and only
/// digits after it
fn parse_add(line: &str) -> Option<TrainingInput<'_>> {
    let (command, duration) = line.split_once(',')?;
    if command.is_empty() || duration.is_empty() || !duration.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    let command = command.trim();
    let command = if command == SLEEP_WORD { "" } else { command };
    Some(TrainingInput::Add { command, duration })
}

fn print_usage<W: Write>(out: &mut W) -> std::io::Result<()> {
    writeln!(out, "----------------------------")?;
    writeln!(out, "Ex) Sit 3sec, wait a 2sec.")?;
    writeln!(out, ">>> ksit,3")?;
    writeln!(out, ">>> sleep,2")?;
    writeln!(out, ">>> run")?;
    writeln!(out, "----------------------------")?;
    writeln!(out, "---Available commands---")?;
    writeln!(out, "[dry-run] Show the queued command list.")?;
    writeln!(out, "[run] Send all queued commands to the robot and clear them.")?;
    writeln!(out, "[clear] Clear all queued commands.")?;
    writeln!(out, "[exit] Quit the training.")?;
    writeln!(out, "[quit] Quit the training.")?;
    writeln!(out, "----------------------------")
}

fn print_rules<W: Write>(out: &mut W) -> std::io::Result<()> {
    writeln!(out, "Failed to add a command, see the validation rules below.")?;
    writeln!(out, "- The 'command' must be a string.")?;
    writeln!(out, "- The 'duration' should be an integer in the range 0 to {}.", MAX_DURATION)?;
    writeln!(out, "- The 'command' and 'duration' must be separated by a comma.")
}

pub struct TrainingSession {
    queue: CommandQueue,
    max_inputs: usize,
}

impl TrainingSession {
    pub fn new(max_inputs: usize) -> Self {
        Self {
            queue: CommandQueue::new(),
            max_inputs,
        }
    }

    pub fn queue(&self) -> &CommandQueue {
        &self.queue
    }

    /// Read commands from `input` until quit, end of input or the input
    /// limit, then shut the channel down.
    pub fn run<T, S, B, W>(
        &mut self,
        channel: &mut DeviceChannel<T, S>,
        input: B,
        out: &mut W,
    ) -> Result<(), RunnerError>
    where
        T: SerialTransport,
        S: Sleeper,
        B: BufRead,
        W: Write,
    {
        print_usage(out)?;

        let mut lines = input.lines();
        let mut input_count = 0;
        loop {
            input_count += 1;
            if input_count > self.max_inputs {
                break;
            }

            write!(out, "{}", PROMPT)?;
            out.flush()?;

            let line = match lines.next() {
                Some(line) => line?,
                None => break,
            };

            if !self.handle(channel, &line, out)? {
                break;
            }
        }

        channel.shutdown(true)?;
        Ok(())
    }

    /// Act on one input line. Returns false when the session should end.
    pub fn handle<T: SerialTransport, S: Sleeper, W: Write>(
        &mut self,
        channel: &mut DeviceChannel<T, S>,
        line: &str,
        out: &mut W,
    ) -> Result<bool, RunnerError> {
        match parse_input(line) {
            TrainingInput::Blank | TrainingInput::Unknown => {}
            TrainingInput::Quit => {
                writeln!(out, "Bye!")?;
                return Ok(false);
            }
            TrainingInput::Clear => {
                self.queue.clear();
                writeln!(out, "Cleared all commands.")?;
            }
            TrainingInput::DryRun => {
                writeln!(out, "Currently, the command is:")?;
                writeln!(out, "{}", self.queue)?;
            }
            TrainingInput::Run => {
                if self.queue.is_empty() {
                    writeln!(out, "There is no command.")?;
                } else {
                    channel.transmit(&self.queue)?;
                    if channel.has_error_response() {
                        writeln!(out, "The board rejected some of the commands.")?;
                    }
                    self.queue.clear();
                }
            }
            TrainingInput::Add { command, duration } => {
                if self.queue.append(command, duration) {
                    writeln!(out, "Added command as cmd:{} duration:{}sec", command, duration)?;
                } else {
                    print_rules(out)?;
                }
            }
        }

        Ok(true)
    }
}
