//! Parser for the markup key-sequence grammar.
//!
//! Windows payloads are delivered as markup: either the transcoder's output
//! or a literal payload written by the caller. This module turns such a
//! string into a flat list of [`KeyStroke`]s that an injector can play back.
//!
//! Grammar:
//!
//! | Markup | Meaning |
//! |---|---|
//! | `+` `^` `%` | Shift, Ctrl, Alt held for the next key or `( ... )` group |
//! | `~` | Enter |
//! | `{ENTER}`, `{TAB 3}`, ... | named key, repeat count up to [`MAX_REPEAT`] |
//! | `{c}`, `{c 4}` | literal character `c`, optional repeat count |
//! | anything else | literal character |

use crate::error::{PtsError, Result};

/// Largest repeat count accepted in `{KEY n}`.
pub const MAX_REPEAT: usize = 1000;

/// Modifier keys held while a stroke is pressed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
}

impl Modifiers {
    pub const NONE: Self = Self {
        shift: false,
        ctrl: false,
        alt: false,
    };

    pub fn is_empty(&self) -> bool {
        !(self.shift || self.ctrl || self.alt)
    }
}

/// Non-character keys reachable from markup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NamedKey {
    Enter,
    Tab,
    Escape,
    Backspace,
    Delete,
    Insert,
    Home,
    End,
    PageUp,
    PageDown,
    Up,
    Down,
    Left,
    Right,
    Space,
    F(u8),
}

impl NamedKey {
    fn from_name(name: &str) -> Option<Self> {
        let key = match name.to_ascii_uppercase().as_str() {
            "ENTER" => Self::Enter,
            "TAB" => Self::Tab,
            "ESC" | "ESCAPE" => Self::Escape,
            "BACKSPACE" | "BS" | "BKSP" => Self::Backspace,
            "DELETE" | "DEL" => Self::Delete,
            "INSERT" | "INS" => Self::Insert,
            "HOME" => Self::Home,
            "END" => Self::End,
            "PGUP" => Self::PageUp,
            "PGDN" => Self::PageDown,
            "UP" => Self::Up,
            "DOWN" => Self::Down,
            "LEFT" => Self::Left,
            "RIGHT" => Self::Right,
            "SPACE" => Self::Space,
            other => {
                let number = other.strip_prefix('F')?.parse::<u8>().ok()?;
                if !(1..=16).contains(&number) {
                    return None;
                }
                Self::F(number)
            }
        };
        Some(key)
    }
}

/// What a stroke presses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyCode {
    Char(char),
    Named(NamedKey),
}

/// One key press and release with modifiers held around it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyStroke {
    pub modifiers: Modifiers,
    pub key: KeyCode,
}

impl KeyStroke {
    pub fn char(c: char) -> Self {
        Self {
            modifiers: Modifiers::NONE,
            key: KeyCode::Char(c),
        }
    }

    pub fn named(key: NamedKey) -> Self {
        Self {
            modifiers: Modifiers::NONE,
            key: KeyCode::Named(key),
        }
    }
}

/// Parse a markup string into key strokes.
pub fn parse(markup: &str) -> Result<Vec<KeyStroke>> {
    let chars: Vec<char> = markup.chars().collect();
    let mut parser = Parser {
        input: markup,
        chars: &chars,
        pos: 0,
    };
    let mut strokes = Vec::new();
    parser.sequence(Modifiers::NONE, false, &mut strokes)?;
    Ok(strokes)
}

struct Parser<'a> {
    input: &'a str,
    chars: &'a [char],
    pos: usize,
}

impl Parser<'_> {
    fn error(&self, reason: impl Into<String>) -> PtsError {
        PtsError::invalid_markup(self.input, reason)
    }

    /// Parse until end of input, or until `)` when inside a group.
    fn sequence(
        &mut self,
        held: Modifiers,
        in_group: bool,
        out: &mut Vec<KeyStroke>,
    ) -> Result<()> {
        while let Some(&c) = self.chars.get(self.pos) {
            if c == ')' && in_group {
                self.pos += 1;
                return Ok(());
            }
            self.item(held, out)?;
        }
        if in_group {
            return Err(self.error("unterminated '(' group"));
        }
        Ok(())
    }

    /// One key, braced key or modified group.
    fn item(&mut self, held: Modifiers, out: &mut Vec<KeyStroke>) -> Result<()> {
        let mut modifiers = held;
        loop {
            match self.chars.get(self.pos) {
                Some('+') => modifiers.shift = true,
                Some('^') => modifiers.ctrl = true,
                Some('%') => modifiers.alt = true,
                _ => break,
            }
            self.pos += 1;
        }

        let Some(&c) = self.chars.get(self.pos) else {
            return Err(self.error("modifier without a key"));
        };
        self.pos += 1;

        match c {
            '(' => self.sequence(modifiers, true, out),
            '{' => {
                let (key, count) = self.braced()?;
                let stroke = KeyStroke { modifiers, key };
                out.extend(std::iter::repeat_n(stroke, count));
                Ok(())
            }
            '~' => {
                out.push(KeyStroke {
                    modifiers,
                    key: KeyCode::Named(NamedKey::Enter),
                });
                Ok(())
            }
            other => {
                out.push(KeyStroke {
                    modifiers,
                    key: KeyCode::Char(other),
                });
                Ok(())
            }
        }
    }

    /// Body of `{...}`; the opening brace is already consumed.
    fn braced(&mut self) -> Result<(KeyCode, usize)> {
        // The first char may itself be a brace: `{{}` and `{}}`.
        let start = self.pos;
        let search_from = start + 1;
        let close = self
            .chars
            .get(search_from..)
            .and_then(|rest| rest.iter().position(|&c| c == '}'))
            .map(|offset| search_from + offset)
            .ok_or_else(|| self.error("unterminated '{'"))?;

        let body: String = self.chars[start..close].iter().collect();
        self.pos = close + 1;

        let (name, count) = match body.rsplit_once(' ') {
            Some((name, count)) if !name.is_empty() => {
                let count = count
                    .parse::<usize>()
                    .map_err(|_| self.error(format!("invalid repeat count '{count}'")))?;
                if count > MAX_REPEAT {
                    return Err(self.error(format!("repeat count {count} exceeds {MAX_REPEAT}")));
                }
                (name.to_string(), count)
            }
            _ => (body, 1),
        };

        let mut name_chars = name.chars();
        let key = match (name_chars.next(), name_chars.next()) {
            (Some(c), None) => KeyCode::Char(c),
            _ => NamedKey::from_name(&name)
                .map(KeyCode::Named)
                .ok_or_else(|| self.error(format!("unknown key '{name}'")))?,
        };

        Ok((key, count))
    }
}
