// File: src/review/console.rs
use super::{Flow, ReviewOutcome, ReviewPrompter, RevealStage};
use crate::core::types::{ConfidenceRange, Entry};
use crossterm::cursor::MoveTo;
use crossterm::queue;
use crossterm::style::Stylize;
use crossterm::terminal::{Clear, ClearType};
use std::io::{self, BufRead, Write};

const QUIT: &str = "q";

/// Line-oriented terminal front end for a review session.
pub struct ConsolePrompter<R: BufRead, W: Write> {
    input: R,
    output: W,
    clear_screen: bool,
}

impl<R: BufRead, W: Write> ConsolePrompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self {
            input,
            output,
            clear_screen: true,
        }
    }

    /// Keeps earlier cards on screen instead of clearing between them.
    pub fn without_clear(mut self) -> Self {
        self.clear_screen = false;
        self
    }

    pub fn into_output(self) -> W {
        self.output
    }

    /// `None` on end of input.
    fn read_line(&mut self) -> io::Result<Option<String>> {
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }

    fn field(&mut self, label: &str, value: &str) -> io::Result<()> {
        if value.is_empty() {
            return Ok(());
        }
        writeln!(self.output, "{} {}", format!("{label}:").bold(), value)
    }
}

impl<R: BufRead, W: Write> ReviewPrompter for ConsolePrompter<R, W> {
    fn reveal(&mut self, entry: &Entry, stage: RevealStage, position: usize, total: usize) -> io::Result<Flow> {
        match stage {
            RevealStage::Front => {
                if self.clear_screen {
                    queue!(self.output, Clear(ClearType::All), MoveTo(0, 0))?;
                }
                writeln!(self.output, "{}", format!("Card {position}/{total}").dark_grey())?;
                writeln!(self.output)?;
                writeln!(self.output, "    {}", entry.primary.as_str().bold())?;
                writeln!(self.output)?;
                write!(self.output, "{} ", "Press Enter to reveal, q to quit:".cyan())?;
                self.output.flush()?;
                match self.read_line()? {
                    Some(line) if line.eq_ignore_ascii_case(QUIT) => Ok(Flow::Abort),
                    Some(_) => Ok(Flow::Continue),
                    None => Ok(Flow::Abort),
                }
            }
            RevealStage::Details => {
                writeln!(self.output)?;
                self.field("Simplified", &entry.primary)?;
                self.field("Traditional", &entry.alternate)?;
                self.field("Pronunciation", &entry.pronunciation)?;
                self.field("Meaning", &entry.meaning)?;
                self.field("Translation", &entry.translation)?;
                self.field("Extra 1", &entry.extra1)?;
                self.field("Extra 2", &entry.extra2)?;
                writeln!(self.output)?;
                self.output.flush()?;
                Ok(Flow::Continue)
            }
        }
    }

    fn ask_confidence(&mut self, entry: &Entry, range: &ConfidenceRange) -> io::Result<Option<String>> {
        write!(
            self.output,
            "{} ",
            format!(
                "How confident are you that you'll remember {}? ({}=low, {}=high, q to quit):",
                entry.primary, range.min, range.max
            )
            .green()
        )?;
        self.output.flush()?;
        match self.read_line()? {
            Some(line) if line.eq_ignore_ascii_case(QUIT) => Ok(None),
            other => Ok(other),
        }
    }

    fn reject(&mut self, input: &str, range: &ConfidenceRange) -> io::Result<()> {
        writeln!(
            self.output,
            "{}",
            format!(
                "'{}' is not a whole number from {} to {}.",
                input, range.min, range.max
            )
            .red()
        )
    }

    fn finish(&mut self, outcome: &ReviewOutcome) -> io::Result<()> {
        writeln!(self.output)?;
        let message = if outcome.aborted {
            format!("Review stopped after {} card(s).", outcome.reviewed.len())
        } else {
            format!("Flashcards finished! You reviewed {} card(s).", outcome.reviewed.len())
        };
        writeln!(self.output, "{}", message.bold())?;
        self.output.flush()
    }
}
