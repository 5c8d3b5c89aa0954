//! Interactive console loop.
//!
//! The loop owns no global state: the caller hands in a [`HistoryRecord`],
//! every lookup merges into it, and [`Repl::run`] hands it back once the user
//! exits.

use std::io::{BufRead, Write};

use colored::Colorize;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::history::{HistoryRecord, HistoryStore};
use crate::output::table;
use crate::provider::{PriceProvider, normalize_currency, parse_coin_list};

const COMMAND_PROMPT: &str =
    "\nEnter command or cryptocurrencies (e.g., bitcoin,ethereum), or 'help' for options:";

const HELP: &str = "\nCommands:
 - Enter cryptocurrencies separated by commas to get prices
 - history: Show all coins checked with last known prices
 - save: Save checked coins and prices to a file
 - help: Show this message
 - exit: Exit the app";

/// A parsed line of user input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Exit,
    Help,
    History,
    Save,
    Lookup(Vec<String>),
    Invalid,
}

impl Command {
    pub fn parse(line: &str) -> Self {
        let line = line.trim().to_lowercase();
        match line.as_str() {
            "exit" => Self::Exit,
            "help" => Self::Help,
            "history" => Self::History,
            "save" => Self::Save,
            other => {
                let coins = parse_coin_list(other);
                if coins.is_empty() {
                    Self::Invalid
                } else {
                    Self::Lookup(coins)
                }
            }
        }
    }
}

#[derive(Debug)]
enum State {
    AwaitingCommand,
    Dispatching(Command),
    Terminated,
}

/// Ask for the quote currency, falling back to `default` on blank input or
/// end of input.
pub fn prompt_currency<R: BufRead, W: Write>(
    input: &mut R,
    out: &mut W,
    default: &str,
) -> Result<String> {
    write!(out, "Enter currency (default is {}): ", default.to_uppercase())?;
    out.flush()?;

    let mut line = String::new();
    input.read_line(&mut line)?;
    Ok(normalize_currency(&line, default))
}

/// Read-eval-print loop over a line source and an output sink.
pub struct Repl<'a, R, W> {
    provider: &'a dyn PriceProvider,
    store: &'a HistoryStore,
    currency: String,
    autosave: bool,
    input: R,
    out: W,
}

impl<'a, R: BufRead, W: Write> Repl<'a, R, W> {
    pub fn new(
        provider: &'a dyn PriceProvider,
        store: &'a HistoryStore,
        currency: impl Into<String>,
        input: R,
        out: W,
    ) -> Self {
        Self {
            provider,
            store,
            currency: currency.into(),
            autosave: false,
            input,
            out,
        }
    }

    /// Save a non-empty history when the loop terminates.
    pub fn with_autosave(mut self, autosave: bool) -> Self {
        self.autosave = autosave;
        self
    }

    /// Run until `exit` or end of input, returning the updated history.
    ///
    /// Fetch and save failures are reported to the user and the loop carries
    /// on. Only a failure to read input or write output is returned.
    pub async fn run(&mut self, mut history: HistoryRecord) -> Result<HistoryRecord> {
        if !history.is_empty() {
            writeln!(self.out, "Loaded history:")?;
            writeln!(self.out, "{}", table::history_table(&history, self.store.format()))?;
        } else {
            writeln!(self.out, "No previous history found.")?;
        }

        let mut state = State::AwaitingCommand;
        loop {
            state = match state {
                State::AwaitingCommand => match self.read_command()? {
                    Some(command) => State::Dispatching(command),
                    None => {
                        debug!("input closed");
                        State::Terminated
                    }
                },
                State::Dispatching(command) => self.dispatch(command, &mut history).await?,
                State::Terminated => break,
            };
        }

        if self.autosave && !history.is_empty() {
            self.save(&history)?;
        }
        writeln!(self.out, "Goodbye!")?;
        Ok(history)
    }

    fn read_command(&mut self) -> Result<Option<Command>> {
        writeln!(self.out, "{}", COMMAND_PROMPT)?;
        self.out.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(Command::parse(&line)))
    }

    async fn dispatch(&mut self, command: Command, history: &mut HistoryRecord) -> Result<State> {
        debug!(command = ?command, "dispatching");
        match command {
            Command::Exit => return Ok(State::Terminated),
            Command::Help => writeln!(self.out, "{}", HELP)?,
            Command::History => {
                if history.is_empty() {
                    writeln!(self.out, "No coins checked yet.")?;
                } else {
                    writeln!(self.out, "Coins checked so far:")?;
                    writeln!(
                        self.out,
                        "{}",
                        table::history_table(history, self.store.format())
                    )?;
                }
            }
            Command::Save => {
                if history.is_empty() {
                    writeln!(self.out, "No coins to save yet.")?;
                } else {
                    self.save(history)?;
                }
            }
            Command::Lookup(coins) => self.lookup(&coins, history).await?,
            Command::Invalid => {
                writeln!(self.out, "Please enter valid coin names or a command.")?;
            }
        }
        Ok(State::AwaitingCommand)
    }

    async fn lookup(&mut self, coins: &[String], history: &mut HistoryRecord) -> Result<()> {
        info!(coins = ?coins, currency = %self.currency, "fetching prices");

        let lookups = match self.provider.fetch(coins, &self.currency).await {
            Ok(lookups) => lookups,
            Err(err) => {
                warn!(error = %err, provider = self.provider.name(), "price lookup failed");
                let message = if err.is_transport() {
                    format!("❌ Failed to retrieve data: {}", err)
                } else {
                    format!("❌ Could not read price data: {}", err)
                };
                writeln!(self.out, "{}", message.red())?;
                return Ok(());
            }
        };

        for lookup in &lookups {
            writeln!(self.out, "{}", table::lookup_block(lookup, &self.currency))?;
        }

        let merged = history.merge(&lookups);
        debug!(merged, total = history.len(), "history updated");
        Ok(())
    }

    fn save(&mut self, history: &HistoryRecord) -> Result<()> {
        match self.store.save(history) {
            Ok(()) => writeln!(self.out, "History saved to {}", self.store.path().display())?,
            Err(err) => {
                warn!(error = %err, path = %self.store.path().display(), "failed to save history");
                writeln!(self.out, "{}", format!("❌ Could not save history: {}", err).red())?;
            }
        }
        Ok(())
    }
}
