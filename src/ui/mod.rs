use colored::*;
use lazy_static::lazy_static;
use serde::Serialize;
use std::io::{self, IsTerminal, Write};
use std::sync::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, Copy)]
pub enum Level {
    Info,
    Success,
    Warn,
    Error,
    /// Follow-up advice for an error; goes to stderr with it.
    Hint,
    Debug,
}

impl Level {
    fn as_str(self) -> &'static str {
        match self {
            Level::Info => "info",
            Level::Success => "success",
            Level::Warn => "warn",
            Level::Error => "error",
            Level::Hint => "hint",
            Level::Debug => "debug",
        }
    }

    fn prefix(self) -> &'static str {
        match self {
            Level::Info => "",
            Level::Success => "✓ ",
            Level::Warn => "⚠ ",
            Level::Error => "✗ ",
            Level::Hint => "hint: ",
            Level::Debug => "[debug] ",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Renderer {
    pub format: OutputFormat,
    pub color: bool,
}

impl Default for Renderer {
    fn default() -> Self {
        Self {
            format: OutputFormat::Text,
            color: true,
        }
    }
}

lazy_static! {
    static ref RENDERER: RwLock<Renderer> = RwLock::new(Renderer::default());
}

static DEBUG_MODE: AtomicBool = AtomicBool::new(false);

pub fn set_debug_mode(enabled: bool) {
    DEBUG_MODE.store(enabled, Ordering::Relaxed);
}

pub fn is_debug_enabled() -> bool {
    DEBUG_MODE.load(Ordering::Relaxed)
}

pub fn init(format: OutputFormat, color: bool) {
    if !color {
        colored::control::set_override(false);
    }
    if let Ok(mut r) = RENDERER.write() {
        r.format = format;
        r.color = color;
    }
}

/// Color is on for an interactive stdout unless `NO_COLOR` is set.
pub fn color_supported() -> bool {
    std::env::var_os("NO_COLOR").is_none() && io::stdout().is_terminal()
}

pub fn get_output_format() -> OutputFormat {
    renderer().format
}

fn renderer() -> Renderer {
    RENDERER
        .read()
        .map(|r| r.clone())
        .unwrap_or_default()
}

#[derive(Serialize)]
struct Event<'a> {
    level: &'a str,
    code: &'a str,
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<serde_json::Value>,
}

fn colorize(level: Level, s: &str, enable: bool) -> String {
    if !enable {
        return s.to_string();
    }
    match level {
        Level::Info => s.normal().to_string(),
        Level::Success => s.green().bold().to_string(),
        Level::Warn => s.yellow().bold().to_string(),
        Level::Error => s.red().bold().to_string(),
        Level::Hint => s.blue().to_string(),
        Level::Debug => s.cyan().to_string(),
    }
}

fn strip_ansi(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\x1b' && chars.peek() == Some(&'[') {
            chars.next();
            // CSI sequences end with a byte in '@'..='~'
            for next in chars.by_ref() {
                if ('@'..='~').contains(&next) {
                    break;
                }
            }
            continue;
        }
        out.push(c);
    }
    out
}

fn render_event(
    level: Level,
    code: &str,
    message: &str,
    data: Option<serde_json::Value>,
) -> String {
    let clean_msg = strip_ansi(message);
    let ev = Event {
        level: level.as_str(),
        code,
        message: &clean_msg,
        data,
    };
    serde_json::to_string(&ev).unwrap_or_else(|_| clean_msg.clone())
}

/// Write a message for the user. Warnings and errors go to stderr.
///
/// Debug messages are dropped unless debug mode is on.
pub fn emit(level: Level, code: &str, message: &str, data: Option<serde_json::Value>) {
    if matches!(level, Level::Debug) && !is_debug_enabled() {
        return;
    }

    let r = renderer();
    let line = match r.format {
        OutputFormat::Text => {
            let text = format!("{}{}", level.prefix(), message);
            colorize(level, &text, r.color)
        }
        OutputFormat::Json => render_event(level, code, message, data),
    };

    let mut out: Box<dyn Write> = match level {
        Level::Error | Level::Warn | Level::Hint | Level::Debug => Box::new(io::stderr()),
        _ => Box::new(io::stdout()),
    };
    let _ = writeln!(out, "{}", line);
}

/// Bold section header, only shown in text mode.
pub fn header(text: &str) {
    let r = renderer();
    if matches!(r.format, OutputFormat::Json) {
        return;
    }
    let line = if r.color {
        text.magenta().bold().to_string()
    } else {
        text.to_string()
    };
    let _ = writeln!(io::stdout(), "\n{}", line);
}

pub mod prelude {
    pub use super::{Level, OutputFormat, emit, get_output_format, header};
}
