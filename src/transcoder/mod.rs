//! Escape-sequence transcoding.
//!
//! Converts the portable escape grammar accepted on the command line
//! (`\n`, `\t`, `\xHH`, `\uHHHH`, ...) into what the target platform's
//! injector understands. A single scanner walks the input once and feeds a
//! [`Sink`]; the sink decides the output shape:
//!
//! - [`markup::MarkupSink`] builds one key-sequence string with `{ENTER}`,
//!   `{TAB}` and braced special characters (Windows).
//! - [`lines::LineSink`] splits the text into literal lines that are typed
//!   with an explicit line-break key between them (Linux, macOS).
//!
//! Malformed escapes never fail: they degrade to literal characters.

mod lines;
mod markup;

pub use lines::LineSink;
pub use markup::{MarkupSink, MARKUP_SPECIAL_CHARS};

use serde::{Deserialize, Serialize};

use crate::error::{PtsError, Result};

/// Desktop platform a delivery is aimed at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Windows,
    Linux,
    #[serde(rename = "macos")]
    #[value(name = "macos")]
    MacOs,
}

impl Platform {
    /// Detect the platform this process runs on.
    pub fn current() -> Result<Self> {
        Self::from_os_name(std::env::consts::OS)
    }

    /// Map a `std::env::consts::OS` style name to a platform.
    pub fn from_os_name(os: &str) -> Result<Self> {
        match os {
            "windows" => Ok(Self::Windows),
            "linux" => Ok(Self::Linux),
            "macos" => Ok(Self::MacOs),
            other => Err(PtsError::unsupported_platform(format!(
                "no key delivery backend for '{other}'"
            ))),
        }
    }

    /// Shape of transcoded output this platform's injector consumes.
    pub fn output_style(self) -> OutputStyle {
        match self {
            Self::Windows => OutputStyle::Markup,
            Self::Linux | Self::MacOs => OutputStyle::Lines,
        }
    }

    /// Line separator used for text placed on the clipboard.
    pub fn newline(self) -> &'static str {
        match self {
            Self::Windows => "\r\n",
            Self::Linux | Self::MacOs => "\n",
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Windows => "windows",
            Self::Linux => "linux",
            Self::MacOs => "macos",
        };
        f.write_str(name)
    }
}

/// Output strategy of the transcoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputStyle {
    /// One string with embedded key tokens.
    Markup,
    /// Literal lines, typed with a line-break key between them.
    Lines,
}

/// Result of transcoding one payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transcoded {
    Markup(String),
    Lines(Vec<String>),
}

impl Transcoded {
    /// Text as it should appear in the diagnostic log.
    pub fn describe(&self) -> String {
        match self {
            Self::Markup(text) => text.clone(),
            Self::Lines(lines) => format!("{lines:?}"),
        }
    }
}

/// Receives the decoded token stream.
pub trait Sink {
    type Output;

    fn line_break(&mut self);
    fn tab(&mut self);
    fn push(&mut self, c: char);
    fn finish(self) -> Self::Output;
}

/// One decoded unit at the cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token {
    LineBreak,
    Tab,
    Char(char),
}

impl Token {
    fn classify(c: char) -> Self {
        match c {
            '\n' => Self::LineBreak,
            '\t' => Self::Tab,
            other => Self::Char(other),
        }
    }
}

/// Transcode `input` for the given output style.
pub fn transcode(input: &str, style: OutputStyle) -> Transcoded {
    match style {
        OutputStyle::Markup => Transcoded::Markup(to_markup(input)),
        OutputStyle::Lines => Transcoded::Lines(to_lines(input)),
    }
}

/// Strategy A: a single markup key-sequence string.
pub fn to_markup(input: &str) -> String {
    run(input, MarkupSink::default())
}

/// Strategy B: literal lines, at least one.
pub fn to_lines(input: &str) -> Vec<String> {
    run(input, LineSink::default())
}

/// Decode escapes and join lines with `newline`; used for clipboard text.
pub fn to_plain_text(input: &str, newline: &str) -> String {
    to_lines(input).join(newline)
}

/// Drive `sink` over the decoded tokens of `input`.
pub fn run<S: Sink>(input: &str, mut sink: S) -> S::Output {
    let chars: Vec<char> = input.chars().collect();
    let mut index = 0;

    while index < chars.len() {
        let (token, consumed) = next_token(&chars, index);
        match token {
            Token::LineBreak => sink.line_break(),
            Token::Tab => sink.tab(),
            Token::Char(c) => sink.push(c),
        }
        index += consumed;
    }

    sink.finish()
}

/// Decode the token starting at `index` and report how many chars it spans.
fn next_token(chars: &[char], index: usize) -> (Token, usize) {
    let rest = &chars[index..];

    match rest {
        ['\\', escape, ..] => decode_escape(rest, *escape),
        ['\r', '\n', ..] => (Token::LineBreak, 2),
        ['\r', '\\', 'n', ..] => (Token::LineBreak, 3),
        ['\r', ..] => (Token::LineBreak, 1),
        // trailing lone backslash falls through here as a literal
        [c, ..] => (Token::classify(*c), 1),
        [] => unreachable!("next_token called past end of input"),
    }
}

/// `rest` starts with a backslash followed by `escape`.
fn decode_escape(rest: &[char], escape: char) -> (Token, usize) {
    match escape {
        'n' => (Token::LineBreak, 2),
        'r' => match &rest[2..] {
            ['\\', 'n', ..] => (Token::LineBreak, 4),
            _ => (Token::LineBreak, 2),
        },
        't' => (Token::Tab, 2),
        '\\' => (Token::Char('\\'), 2),
        'x' => decode_code_point(rest, 2, 'x'),
        'u' => decode_utf16_escape(rest),
        'U' => decode_code_point(rest, 8, 'U'),
        other => (Token::Char(other), 2),
    }
}

/// Decode `digits` hex digits after the two-char escape prefix. On short or
/// malformed input emit the escape letter and resume right after it.
fn decode_code_point(rest: &[char], digits: usize, letter: char) -> (Token, usize) {
    match hex_value(rest, 2, digits).and_then(char::from_u32) {
        Some(c) => (Token::classify(c), 2 + digits),
        None => (Token::Char(letter), 2),
    }
}

/// `\uHHHH`. A high surrogate directly followed by a `\uHHHH` low surrogate
/// is one character.
fn decode_utf16_escape(rest: &[char]) -> (Token, usize) {
    if let Some(high @ 0xD800..=0xDBFF) = hex_value(rest, 2, 4) {
        if matches!(rest.get(6..8), Some(['\\', 'u'])) {
            if let Some(low @ 0xDC00..=0xDFFF) = hex_value(rest, 8, 4) {
                let scalar = 0x1_0000 + ((high - 0xD800) << 10) + (low - 0xDC00);
                if let Some(c) = char::from_u32(scalar) {
                    return (Token::classify(c), 12);
                }
            }
        }
    }
    decode_code_point(rest, 4, 'u')
}

fn hex_value(rest: &[char], start: usize, digits: usize) -> Option<u32> {
    let hex = rest.get(start..start + digits)?;
    if !hex.iter().all(char::is_ascii_hexdigit) {
        return None;
    }
    u32::from_str_radix(&hex.iter().collect::<String>(), 16).ok()
}
