//! Replay command: a line-oriented interpreter over the navigator.
//!
//! Each input line is one command (`step`, `goto 12.5`, `where`, ...).
//! Navigation failures are printed and never end the session.

use super::models::ReplayArgs;
use super::utils::load_forest;
use crate::replay::Navigator;
use crate::utils::error::CommandError;
use anyhow::{Context, Result};
use log::{debug, info};
use std::fs::File;
use std::io::{self, BufRead, BufReader, IsTerminal, Write};
use std::str::FromStr;

/// One interpreter command
#[derive(Debug, Clone, PartialEq)]
pub enum ReplayCommand {
    Step,
    StepBack,
    Next,
    NextBack,
    Return,
    ReturnBack,
    Goto(f64),
    Timestamp,
    Where,
    Up,
    Down,
    Tid,
    Pid,
    SwitchTid(u64),
    SwitchPid(u64),
    Args,
    Show,
    Help,
    Quit,
}

impl FromStr for ReplayCommand {
    type Err = CommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let command = words.next().unwrap_or_default();
        let argument = words.next();

        let parsed = match command {
            "step" | "s" => Self::Step,
            "step_back" | "sb" => Self::StepBack,
            "next" | "n" => Self::Next,
            "next_back" | "nb" => Self::NextBack,
            "return" | "r" => Self::Return,
            "return_back" | "rb" => Self::ReturnBack,
            "goto" => Self::Goto(parse_argument(command, argument, "timestamp")?),
            "timestamp" | "ts" => Self::Timestamp,
            "where" | "w" => Self::Where,
            "up" | "u" => Self::Up,
            "down" | "d" => Self::Down,
            "tid" => Self::Tid,
            "pid" => Self::Pid,
            "switch_tid" => Self::SwitchTid(parse_argument(command, argument, "tid")?),
            "switch_pid" => Self::SwitchPid(parse_argument(command, argument, "pid")?),
            "args" => Self::Args,
            "show" => Self::Show,
            "help" | "h" => Self::Help,
            "quit" | "q" | "exit" => Self::Quit,
            other => return Err(CommandError::Unknown(other.to_string())),
        };
        Ok(parsed)
    }
}

fn parse_argument<T: FromStr>(
    command: &str,
    value: Option<&str>,
    argument: &'static str,
) -> Result<T, CommandError> {
    let value = value.ok_or_else(|| CommandError::MissingArgument {
        command: command.to_string(),
        argument,
    })?;
    value.parse().map_err(|_| CommandError::InvalidArgument {
        command: command.to_string(),
        value: value.to_string(),
    })
}

const HELP: &str = "\
Commands:
  step, s            step into the next call
  step_back, sb      step back into the previous call
  next, n            step over the next call
  next_back, nb      step back over the previous call
  return, r          run until the current call returns
  return_back, rb    go back to where the current call was made
  goto <ts>          jump to a timestamp
  timestamp, ts      print the current timestamp
  where, w           print the call stack
  up, u / down, d    select the caller / callee frame
  tid / pid          list threads / processes
  switch_tid <tid>   move to another thread at the current time
  switch_pid <pid>   move to another process at the current time
  args               print the arguments of the selected call
  show               print the current position
  quit, q            leave";

/// Outcome of one interpreter line
enum Reply {
    Text(String),
    Quit,
}

/// Current position: selected call, its location and the calling line
pub fn describe(nav: &Navigator) -> String {
    let node = nav.selected_node();
    let label = match node.location() {
        Some(location) => location.to_string(),
        None => node.name().to_string(),
    };

    let mut text = format!("[{}] {} @ {}", nav.key(), label, nav.get_timestamp());
    if let Some(line) = nav.current_line() {
        text.push_str(&format!(", line {}", line));
    }
    text
}

fn where_listing(nav: &Navigator) -> String {
    nav.where_stack()
        .iter()
        .map(|entry| {
            let marker = if entry.selected { ">" } else { " " };
            let label = match &entry.location {
                Some(location) => location.to_string(),
                None => entry.name.clone(),
            };
            match entry.line {
                Some(line) => format!("{} {}, line {}", marker, label, line),
                None => format!("{} {}", marker, label),
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn id_listing(ids: &[(u64, bool)]) -> String {
    ids.iter()
        .map(|(id, active)| format!("{} {}", if *active { ">" } else { " " }, id))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Run one command against the navigator
fn apply(nav: &mut Navigator, command: ReplayCommand) -> Reply {
    let moved = match command {
        ReplayCommand::Step => nav.step(),
        ReplayCommand::StepBack => nav.step_back(),
        ReplayCommand::Next => nav.next(),
        ReplayCommand::NextBack => nav.next_back(),
        ReplayCommand::Return => nav.func_return(),
        ReplayCommand::ReturnBack => nav.func_return_back(),
        ReplayCommand::Goto(ts) => nav.goto_timestamp(ts),
        ReplayCommand::Up => nav.up(),
        ReplayCommand::Down => nav.down(),
        ReplayCommand::SwitchTid(tid) => nav.switch_thread(tid),
        ReplayCommand::SwitchPid(pid) => nav.switch_process(pid),
        ReplayCommand::Show => Ok(()),

        ReplayCommand::Timestamp => return Reply::Text(nav.get_timestamp().to_string()),
        ReplayCommand::Where => return Reply::Text(where_listing(nav)),
        ReplayCommand::Tid => return Reply::Text(id_listing(&nav.thread_list())),
        ReplayCommand::Pid => return Reply::Text(id_listing(&nav.process_list())),
        ReplayCommand::Args => {
            let text = nav
                .args()
                .and_then(|args| serde_json::to_string_pretty(args).ok())
                .unwrap_or_else(|| "No args".to_string());
            return Reply::Text(text);
        }
        ReplayCommand::Help => return Reply::Text(HELP.to_string()),
        ReplayCommand::Quit => return Reply::Quit,
    };

    match moved {
        Ok(()) => Reply::Text(describe(nav)),
        Err(e) => Reply::Text(e.to_string()),
    }
}

/// Drive the navigator from `input`, writing replies to `output`
///
/// **Public** - used by execute_replay and tests
///
/// # Arguments
/// * `nav` - Navigator positioned at the session start
/// * `input` - One command per line; blank lines are ignored
/// * `output` - Receives one reply per command
/// * `prompt` - Print `(replay) ` before reading each line
pub fn run_session<R: BufRead, W: Write>(
    nav: &mut Navigator,
    input: R,
    output: &mut W,
    prompt: bool,
) -> io::Result<()> {
    writeln!(output, "{}", describe(nav))?;

    let mut lines = input.lines();
    loop {
        if prompt {
            write!(output, "(replay) ")?;
            output.flush()?;
        }

        let Some(line) = lines.next() else {
            break;
        };
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        debug!("replay command: {}", line);
        match line.parse::<ReplayCommand>() {
            Ok(command) => match apply(nav, command) {
                Reply::Text(text) => writeln!(output, "{}", text)?,
                Reply::Quit => break,
            },
            Err(e) => writeln!(output, "{}", e)?,
        }
    }

    Ok(())
}

/// Execute the replay command
///
/// **Public** - main entry point called from main.rs
pub fn execute_replay(args: ReplayArgs) -> Result<()> {
    info!("Replaying: {}", args.trace.display());

    let (_, forest, _) = load_forest(&args.trace, args.absolute)?;
    let mut nav = Navigator::new(&forest).context("Nothing to replay")?;
    let stdout = io::stdout();
    let mut output = stdout.lock();

    match &args.script {
        Some(script) => {
            let file = File::open(script)
                .with_context(|| format!("Failed to open script {}", script.display()))?;
            run_session(&mut nav, BufReader::new(file), &mut output, false)?;
        }
        None => {
            let stdin = io::stdin();
            let prompt = stdin.is_terminal();
            run_session(&mut nav, stdin.lock(), &mut output, prompt)?;
        }
    }

    Ok(())
}
