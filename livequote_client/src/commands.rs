//! Interactive commands read from stdin.
//!
//! ```text
//! tab <currency|gold|favorites>   switch the table
//! fav <ID>                        toggle a favorite
//! show <ID> / close               open or close the detail pane
//! list                            redraw now
//! quit                            exit
//! ```
use std::io::{self, BufRead};
use std::str::FromStr;
use std::thread;

use crossbeam_channel::Sender;
use livequote_common::{InstrumentId, QuoteError};
use livequote_store::ViewTab;
use log::{debug, warn};

/// One parsed user command.
#[derive(Debug, Clone, PartialEq)]
pub enum UserCommand {
    Tab(ViewTab),
    Favorite(InstrumentId),
    Show(InstrumentId),
    Close,
    List,
    Help,
    Quit,
}

/// Usage text printed by `help`.
pub const HELP: &str = "commands: tab <currency|gold|favorites> | fav <ID> | show <ID> | close | list | help | quit";

impl FromStr for UserCommand {
    type Err = QuoteError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let verb = words
            .next()
            .ok_or_else(|| QuoteError::Format("empty command".to_string()))?;
        let arg = words.next();
        let needs_id = |arg: Option<&str>| {
            arg.map(InstrumentId::from)
                .ok_or_else(|| QuoteError::Format(format!("`{}` needs an instrument id", verb)))
        };

        match verb.to_ascii_lowercase().as_str() {
            "tab" => {
                let name = arg.ok_or_else(|| QuoteError::Format("`tab` needs a tab name".to_string()))?;
                let tab = name
                    .parse::<ViewTab>()
                    .map_err(|_| QuoteError::Format(format!("unknown tab `{}`", name)))?;
                Ok(UserCommand::Tab(tab))
            }
            "fav" | "favorite" => Ok(UserCommand::Favorite(needs_id(arg)?)),
            "show" | "detail" => Ok(UserCommand::Show(needs_id(arg)?)),
            "close" => Ok(UserCommand::Close),
            "list" | "ls" => Ok(UserCommand::List),
            "help" | "?" => Ok(UserCommand::Help),
            "quit" | "exit" | "q" => Ok(UserCommand::Quit),
            other => Err(QuoteError::Format(format!("unknown command `{}`", other))),
        }
    }
}

/// Spawns a thread forwarding parsed stdin lines to `tx`. The thread ends at
/// EOF or when the receiver is dropped.
pub fn spawn_stdin_reader(tx: Sender<UserCommand>) {
    thread::spawn(move || {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            let line = match line {
                Ok(line) => line,
                Err(e) => {
                    warn!("stdin read failed: {}", e);
                    break;
                }
            };
            if line.trim().is_empty() {
                continue;
            }
            match line.parse::<UserCommand>() {
                Ok(cmd) => {
                    if tx.send(cmd).is_err() {
                        break;
                    }
                }
                Err(e) => warn!("{}. {}", e, HELP),
            }
        }
        debug!("stdin reader finished");
    });
}
