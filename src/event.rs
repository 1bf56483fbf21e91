use crate::core::{EngineError, Result};
use serde::Serialize;
use std::fmt;

/// A tokenized scenario statement.
///
/// Atoms are bare words or quoted strings; parenthesised groups become nested
/// lists, so `PriceOracleProxy Deploy Admin (PriceOracle Address)` parses to
/// `[PriceOracleProxy, Deploy, Admin, [PriceOracle, Address]]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum Event {
    Atom(String),
    List(Vec<Event>),
}

impl Event {
    pub fn atom(text: impl Into<String>) -> Self {
        Self::Atom(text.into())
    }

    pub fn list(items: Vec<Event>) -> Self {
        Self::List(items)
    }

    /// Build a flat event from whitespace-free words.
    pub fn words(words: &[&str]) -> Self {
        Self::List(words.iter().map(|w| Self::atom(*w)).collect())
    }

    pub fn as_atom(&self) -> Option<&str> {
        match self {
            Self::Atom(text) => Some(text),
            Self::List(_) => None,
        }
    }

    /// Items of a list; an atom is viewed as a one-item list.
    pub fn items(&self) -> &[Event] {
        match self {
            Self::Atom(_) => std::slice::from_ref(self),
            Self::List(items) => items,
        }
    }

    /// Leading word of a list event.
    pub fn head(&self) -> Option<&str> {
        self.items().first().and_then(Event::as_atom)
    }

    /// Everything after the leading item.
    pub fn tail(&self) -> &[Event] {
        self.items().get(1..).unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Self::List(items) if items.is_empty())
    }

    /// Render a top-level event without the outer parentheses.
    pub fn to_line(&self) -> String {
        match self {
            Self::Atom(_) => self.to_string(),
            Self::List(items) => items
                .iter()
                .map(|item| item.to_string())
                .collect::<Vec<_>>()
                .join(" "),
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Atom(text) => {
                if text.is_empty() || text.chars().any(|c| c.is_whitespace() || "()\"".contains(c)) {
                    write!(f, "\"{}\"", text)
                } else {
                    f.write_str(text)
                }
            }
            Self::List(_) => write!(f, "({})", self.to_line()),
        }
    }
}

/// Parse one statement into a list event.
pub fn parse_event(input: &str) -> Result<Event> {
    let mut stack: Vec<Vec<Event>> = vec![Vec::new()];
    let mut open_columns: Vec<usize> = Vec::new();
    let mut chars = input.char_indices().peekable();

    while let Some((pos, c)) = chars.next() {
        match c {
            c if c.is_whitespace() => {}
            '(' => {
                stack.push(Vec::new());
                open_columns.push(column(input, pos));
            }
            ')' => {
                if stack.len() == 1 {
                    return Err(EngineError::Parse(format!(
                        "unexpected ')' at column {}",
                        column(input, pos)
                    )));
                }
                let group = stack.pop().unwrap_or_default();
                open_columns.pop();
                push(&mut stack, Event::List(group));
            }
            '"' => {
                let start = column(input, pos);
                let mut text = String::new();
                let mut closed = false;
                for (_, ch) in chars.by_ref() {
                    if ch == '"' {
                        closed = true;
                        break;
                    }
                    text.push(ch);
                }
                if !closed {
                    return Err(EngineError::Parse(format!(
                        "unterminated string starting at column {}",
                        start
                    )));
                }
                push(&mut stack, Event::Atom(text));
            }
            _ => {
                let mut word = String::from(c);
                while let Some(&(_, next)) = chars.peek() {
                    if next.is_whitespace() || next == '(' || next == ')' || next == '"' {
                        break;
                    }
                    word.push(next);
                    chars.next();
                }
                push(&mut stack, Event::Atom(word));
            }
        }
    }

    if let Some(open) = open_columns.last() {
        return Err(EngineError::Parse(format!("unclosed '(' at column {}", open)));
    }

    let items = stack.pop().unwrap_or_default();
    if items.is_empty() {
        return Err(EngineError::Parse("empty event".into()));
    }
    Ok(Event::List(items))
}

/// Parse a script: one event per non-blank line, `--` lines are comments.
/// Returns `(line_number, event)` pairs with 1-based line numbers.
pub fn parse_script(input: &str) -> Result<Vec<(usize, Event)>> {
    let mut events = Vec::new();
    for (idx, raw_line) in input.lines().enumerate() {
        let line = raw_line.trim();
        if line.is_empty() || line.starts_with("--") {
            continue;
        }
        let event = parse_event(line)
            .map_err(|err| EngineError::Parse(format!("line {}: {}", idx + 1, err)))?;
        events.push((idx + 1, event));
    }
    Ok(events)
}

fn push(stack: &mut [Vec<Event>], event: Event) {
    if let Some(top) = stack.last_mut() {
        top.push(event);
    }
}

fn column(input: &str, byte_pos: usize) -> usize {
    input[..byte_pos].chars().count() + 1
}
