//! Interactive prompts
//!
//! The pipelines only need two things from the user: a line of input in
//! response to a question, and a place to print follow-up lines. [`Prompt`]
//! captures that, [`ConsolePrompt`] implements it over any reader/writer pair,
//! and [`ScriptedPrompt`] replays canned answers.

use std::collections::VecDeque;
use std::io::{self, BufRead, Write};

use crate::error::{SaveError, SaveResult};
use crate::i18n::Messages;

/// Line-oriented question/answer channel
pub trait Prompt {
    /// Print `question` and return the trimmed answer
    ///
    /// End of input is an error: callers loop until they get an answer
    /// they understand, so returning an empty line forever would hang.
    fn ask(&mut self, question: &str) -> SaveResult<String>;

    /// Print an informational line
    fn say(&mut self, line: &str) -> SaveResult<()>;
}

/// Ask a yes/no question until the answer is recognised
pub fn confirm(prompt: &mut dyn Prompt, messages: &Messages, question: &str) -> SaveResult<bool> {
    loop {
        let answer = prompt.ask(question)?;
        match messages.parse_answer(&answer) {
            Some(decision) => return Ok(decision),
            None => prompt.say(&messages.answer_invalid)?,
        }
    }
}

/// Show a numbered list and return the index of the chosen item
pub fn choose(
    prompt: &mut dyn Prompt,
    messages: &Messages,
    items: &[String],
) -> SaveResult<usize> {
    if items.is_empty() {
        return Err(SaveError::Validation("nothing to choose from".into()));
    }

    loop {
        prompt.say(&messages.select_profile_header)?;
        for (i, item) in items.iter().enumerate() {
            prompt.say(&format!("({}) \"{}\"", i + 1, item))?;
        }

        let answer = prompt.ask(&messages.select_profile_prompt)?;
        match answer.parse::<usize>() {
            Ok(n) if (1..=items.len()).contains(&n) => return Ok(n - 1),
            _ => prompt.say(&messages.select_profile_invalid)?,
        }
    }
}

/// Prompt over a reader/writer pair, normally stdin/stdout
pub struct ConsolePrompt<R, W> {
    input: R,
    output: W,
}

impl ConsolePrompt<io::StdinLock<'static>, io::Stdout> {
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> ConsolePrompt<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }
}

impl<R: BufRead, W: Write> Prompt for ConsolePrompt<R, W> {
    fn ask(&mut self, question: &str) -> SaveResult<String> {
        write!(self.output, "{}", question).map_err(|e| SaveError::Prompt(e.to_string()))?;
        self.output
            .flush()
            .map_err(|e| SaveError::Prompt(e.to_string()))?;

        let mut input = String::new();
        let read = self
            .input
            .read_line(&mut input)
            .map_err(|e| SaveError::Prompt(e.to_string()))?;
        if read == 0 {
            return Err(SaveError::Prompt("input closed".into()));
        }

        Ok(input.trim().to_string())
    }

    fn say(&mut self, line: &str) -> SaveResult<()> {
        writeln!(self.output, "{}", line).map_err(|e| SaveError::Prompt(e.to_string()))
    }
}

/// Prompt that replays a fixed list of answers and records the conversation
#[derive(Debug, Default)]
pub struct ScriptedPrompt {
    answers: VecDeque<String>,
    /// Questions asked, in order
    pub asked: Vec<String>,
    /// Lines printed, in order
    pub said: Vec<String>,
}

impl ScriptedPrompt {
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            answers: answers.into_iter().map(Into::into).collect(),
            asked: Vec::new(),
            said: Vec::new(),
        }
    }

    /// Answers not consumed yet
    pub fn remaining(&self) -> usize {
        self.answers.len()
    }
}

impl Prompt for ScriptedPrompt {
    fn ask(&mut self, question: &str) -> SaveResult<String> {
        self.asked.push(question.to_string());
        self.answers
            .pop_front()
            .map(|a| a.trim().to_string())
            .ok_or_else(|| SaveError::Prompt("no scripted answer left".into()))
    }

    fn say(&mut self, line: &str) -> SaveResult<()> {
        self.said.push(line.to_string());
        Ok(())
    }
}
