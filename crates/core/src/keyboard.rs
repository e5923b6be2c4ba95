//! Key bindings for moving between questions and choosing options.

use crate::model::Direction;

/// What a key press asks the exam session to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyCommand {
    /// Move by a signed number of questions.
    Step(i64),
    /// Choose the option at this 0-based position.
    Choose(usize),
}

impl KeyCommand {
    /// Map a key name (`KeyboardEvent.key` spelling) under the exam's reading direction.
    ///
    /// Arrow keys step forward or back, mirrored for right-to-left exams.
    /// Digits `1`-`9` pick the option at that 1-based position.
    #[must_use]
    pub fn from_key(key: &str, dir: Direction) -> Option<Self> {
        let forward = dir.forward_step();
        match key {
            "ArrowRight" | "ArrowDown" => Some(Self::Step(forward)),
            "ArrowLeft" | "ArrowUp" => Some(Self::Step(-forward)),
            _ => digit_option(key).map(Self::Choose),
        }
    }
}

fn digit_option(key: &str) -> Option<usize> {
    let mut chars = key.chars();
    let digit = chars.next()?.to_digit(10)?;
    if chars.next().is_some() || digit == 0 {
        return None;
    }
    usize::try_from(digit - 1).ok()
}
