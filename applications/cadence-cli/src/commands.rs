//! Interactive console commands
//!
//! One command per input line. Queue positions are 1-based on the console
//! and converted to 0-based indices before they reach the playback service.

use crate::error::Result;
use cadence_playback::advancer::next_index;
use cadence_playback::{
    EnqueueMode, PlaybackStatus, Preferences, RepeatMode, ServiceHandle, Track,
};
use std::fmt::Write as _;
use std::time::Duration;
use thiserror::Error;

pub const HELP: &str = "\
Commands:
  add <title> [@secs]     append a track
  next <title> [@secs]    insert a track after the current one
  play [n]                play entry n (default: current or first)
  pause | resume | toggle | stop
  skip                    jump to the following entry
  seek <secs>             seek inside the current track
  remove <n>              remove entry n
  move <from> <to>        move an entry
  clear                   empty the queue
  repeat off|all|single   set repeat mode
  gapless on|off          toggle gapless pre-arming
  status | queue | help | quit";

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Add {
        title: String,
        duration: Option<Duration>,
        mode: EnqueueMode,
    },
    Play(Option<usize>),
    Pause,
    Resume,
    Toggle,
    Stop,
    Skip,
    Seek(Duration),
    Remove(usize),
    Move { from: usize, to: usize },
    Clear,
    Repeat(RepeatMode),
    Gapless(bool),
    Status,
    Queue,
    Help,
    Quit,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("empty input")]
    Empty,

    #[error("unknown command '{0}' (try 'help')")]
    Unknown(String),

    #[error("'{0}' needs an argument")]
    MissingArgument(&'static str),

    #[error("invalid value '{value}' for '{command}'")]
    InvalidArgument { command: &'static str, value: String },
}

impl Command {
    pub fn parse(line: &str) -> std::result::Result<Self, ParseError> {
        let line = line.trim();
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };

        match word.to_ascii_lowercase().as_str() {
            "" => Err(ParseError::Empty),
            "add" | "a" => parse_add("add", rest, EnqueueMode::Append),
            "next" => parse_add("next", rest, EnqueueMode::PlayNext),
            "play" | "p" => {
                if rest.is_empty() {
                    Ok(Command::Play(None))
                } else {
                    position("play", rest).map(|i| Command::Play(Some(i)))
                }
            }
            "pause" => Ok(Command::Pause),
            "resume" => Ok(Command::Resume),
            "toggle" | "t" => Ok(Command::Toggle),
            "stop" => Ok(Command::Stop),
            "skip" | "s" => Ok(Command::Skip),
            "seek" => {
                let secs = number("seek", rest)?;
                Ok(Command::Seek(Duration::from_secs(secs)))
            }
            "remove" | "rm" => position("remove", rest).map(Command::Remove),
            "move" | "mv" => {
                let (from, to) = rest
                    .split_once(char::is_whitespace)
                    .ok_or(ParseError::MissingArgument("move"))?;
                Ok(Command::Move {
                    from: position("move", from)?,
                    to: position("move", to.trim())?,
                })
            }
            "clear" => Ok(Command::Clear),
            "repeat" => match rest.to_ascii_lowercase().as_str() {
                "" => Err(ParseError::MissingArgument("repeat")),
                "off" => Ok(Command::Repeat(RepeatMode::Off)),
                "all" => Ok(Command::Repeat(RepeatMode::All)),
                "single" | "one" => Ok(Command::Repeat(RepeatMode::Single)),
                _ => Err(invalid("repeat", rest)),
            },
            "gapless" => match rest.to_ascii_lowercase().as_str() {
                "" => Err(ParseError::MissingArgument("gapless")),
                "on" | "true" => Ok(Command::Gapless(true)),
                "off" | "false" => Ok(Command::Gapless(false)),
                _ => Err(invalid("gapless", rest)),
            },
            "status" => Ok(Command::Status),
            "queue" | "q" | "ls" => Ok(Command::Queue),
            "help" | "?" => Ok(Command::Help),
            "quit" | "exit" => Ok(Command::Quit),
            other => Err(ParseError::Unknown(other.to_string())),
        }
    }
}

fn parse_add(
    command: &'static str,
    rest: &str,
    mode: EnqueueMode,
) -> std::result::Result<Command, ParseError> {
    if rest.is_empty() {
        return Err(ParseError::MissingArgument(command));
    }

    let (title, duration) = match rest.rsplit_once('@') {
        Some((title, secs)) if !title.trim().is_empty() => {
            let secs = number(command, secs.trim())?;
            (title.trim(), Some(Duration::from_secs(secs)))
        }
        _ => (rest, None),
    };

    Ok(Command::Add {
        title: title.to_string(),
        duration,
        mode,
    })
}

fn number(command: &'static str, value: &str) -> std::result::Result<u64, ParseError> {
    if value.is_empty() {
        return Err(ParseError::MissingArgument(command));
    }
    value.parse().map_err(|_| invalid(command, value))
}

/// 1-based console position to 0-based index
fn position(command: &'static str, value: &str) -> std::result::Result<usize, ParseError> {
    match number(command, value)? {
        0 => Err(invalid(command, value)),
        n => usize::try_from(n - 1).map_err(|_| invalid(command, value)),
    }
}

fn invalid(command: &'static str, value: &str) -> ParseError {
    ParseError::InvalidArgument {
        command,
        value: value.to_string(),
    }
}

/// What the main loop should do after a command
#[derive(Debug, PartialEq, Eq)]
pub enum Outcome {
    Continue(Option<String>),
    Quit,
}

/// Applies console commands to a running playback service
pub struct Console {
    handle: ServiceHandle,
    prefs: Preferences,
    next_id: u64,
}

impl Console {
    /// Console over `handle`; new track ids continue after those already queued
    pub fn new(handle: ServiceHandle, prefs: Preferences) -> Self {
        let queued = handle.queue().unwrap_or_else(|e| {
            tracing::warn!("Failed to read queue for id allocation: {}", e);
            Vec::new()
        });

        Self {
            next_id: first_free_id(&queued),
            handle,
            prefs,
        }
    }

    /// Parse and apply one input line
    pub fn run_line(&mut self, line: &str) -> Result<Outcome> {
        match Command::parse(line) {
            Ok(command) => self.apply(command),
            Err(ParseError::Empty) => Ok(Outcome::Continue(None)),
            Err(e) => Err(e.into()),
        }
    }

    pub fn apply(&mut self, command: Command) -> Result<Outcome> {
        tracing::debug!(?command, "Console command");

        match command {
            Command::Add {
                title,
                duration,
                mode,
            } => {
                let mut track = Track::new(format!("{}{}", LOCAL_ID_PREFIX, self.next_id), title);
                track.duration = duration;
                self.next_id += 1;
                self.handle.enqueue(vec![track], mode, false)?;
            }
            Command::Play(None) => self.handle.resume_or_play()?,
            Command::Play(Some(index)) => self.handle.play_index(index, true)?,
            Command::Pause => self.handle.pause()?,
            Command::Resume => self.handle.start()?,
            Command::Toggle => self.handle.toggle_play_pause()?,
            Command::Stop => self.handle.stop()?,
            Command::Skip => {
                let status = self.handle.status()?;
                match next_index(status.current_index, status.queue_len, self.prefs.repeat_mode()) {
                    // Single repeat would replay the same entry
                    Some(next) if Some(next) != status.current_index => {
                        self.handle.play_index(next, true)?;
                    }
                    _ => {
                        let following = status.current_index.map_or(0, |i| i + 1);
                        self.handle.play_index(following, true)?;
                    }
                }
            }
            Command::Seek(position) => self.handle.seek_to(position)?,
            Command::Remove(index) => self.handle.remove(index)?,
            Command::Move { from, to } => self.handle.reorder(from, to)?,
            Command::Clear => self.handle.clear(true)?,
            Command::Repeat(mode) => {
                self.prefs.set_repeat_mode(mode);
                // Re-arm under the new mode
                self.handle.set_next_playing()?;
            }
            Command::Gapless(enabled) => {
                self.prefs.update(|config| config.gapless = enabled);
                self.handle.set_next_playing()?;
            }
            Command::Status => {
                let status = self.handle.status()?;
                return Ok(Outcome::Continue(Some(format_status(&status, self.prefs.repeat_mode()))));
            }
            Command::Queue => {
                let status = self.handle.status()?;
                let tracks = self.handle.queue()?;
                return Ok(Outcome::Continue(Some(format_queue(&tracks, status.current_index))));
            }
            Command::Help => return Ok(Outcome::Continue(Some(HELP.to_string()))),
            Command::Quit => return Ok(Outcome::Quit),
        }

        Ok(Outcome::Continue(None))
    }
}

const LOCAL_ID_PREFIX: &str = "local-";

/// Smallest counter above every `local-<n>` id in `tracks`
fn first_free_id(tracks: &[Track]) -> u64 {
    tracks
        .iter()
        .filter_map(|t| t.id.strip_prefix(LOCAL_ID_PREFIX)?.parse::<u64>().ok())
        .max()
        .map_or(1, |n| n + 1)
}

pub fn format_status(status: &PlaybackStatus, repeat: RepeatMode) -> String {
    let mut out = String::new();
    match (&status.current, status.current_index) {
        (Some(track), Some(index)) => {
            let _ = write!(
                out,
                "[{}] {}/{} {} ({}",
                status.state,
                index + 1,
                status.queue_len,
                track.title,
                clock(status.position)
            );
            if let Some(duration) = status.duration {
                let _ = write!(out, " / {}", clock(duration));
            }
            out.push(')');
        }
        _ => {
            let _ = write!(out, "[{}] nothing selected ({} queued)", status.state, status.queue_len);
        }
    }

    if let Some(next) = &status.next {
        let _ = write!(out, ", next: {}", next.title);
    }
    let _ = write!(out, ", repeat {:?}", repeat);
    if status.remote {
        out.push_str(", remote");
    }
    out
}

pub fn format_queue(tracks: &[Track], current: Option<usize>) -> String {
    if tracks.is_empty() {
        return "Queue is empty".to_string();
    }

    tracks
        .iter()
        .enumerate()
        .map(|(i, track)| {
            let marker = if Some(i) == current { '>' } else { ' ' };
            let mut line = format!("{} {:>3}. {}", marker, i + 1, track.title);
            if let Some(duration) = track.duration {
                let _ = write!(line, " [{}]", clock(duration));
            }
            line
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn clock(duration: Duration) -> String {
    let secs = duration.as_secs();
    format!("{}:{:02}", secs / 60, secs % 60)
}
