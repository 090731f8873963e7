//! Terminal prompter for interactive mode

use std::io::{self, BufRead, IsTerminal, Write};

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal;

use stegtriage_engine::Prompter;

/// Reads from stdin and writes to stdout.
///
/// Secrets are read in raw mode without echo when stdin is a terminal.
#[derive(Debug, Default)]
pub struct StdioPrompter;

impl StdioPrompter {
    fn show(prompt: &str) {
        print!("{prompt}");
        let _ = io::stdout().flush();
    }
}

impl Prompter for StdioPrompter {
    fn read_line(&mut self, prompt: &str) -> Option<String> {
        Self::show(prompt);
        let mut line = String::new();
        match io::stdin().lock().read_line(&mut line) {
            Ok(0) | Err(_) => None,
            Ok(_) => Some(line.trim_end_matches(['\r', '\n']).to_string()),
        }
    }

    fn read_secret(&mut self, prompt: &str) -> Option<String> {
        if !io::stdin().is_terminal() {
            return self.read_line(prompt);
        }

        Self::show(prompt);
        if terminal::enable_raw_mode().is_err() {
            return self.read_line("");
        }
        let secret = read_hidden();
        let _ = terminal::disable_raw_mode();
        println!();
        secret.ok().flatten()
    }

    fn say(&mut self, message: &str) {
        println!("{message}");
    }
}

/// Collect key presses until Enter. Ctrl-C and Ctrl-D on an empty line give `None`.
fn read_hidden() -> io::Result<Option<String>> {
    let mut secret = String::new();
    loop {
        let Event::Key(KeyEvent {
            code,
            modifiers,
            kind: KeyEventKind::Press,
            ..
        }) = event::read()?
        else {
            continue;
        };

        let ctrl = modifiers.contains(KeyModifiers::CONTROL);
        match code {
            KeyCode::Enter => return Ok(Some(secret)),
            KeyCode::Char('c') if ctrl => return Ok(None),
            KeyCode::Char('d') if ctrl && secret.is_empty() => return Ok(None),
            KeyCode::Backspace => {
                secret.pop();
            }
            KeyCode::Char(c) if !ctrl => secret.push(c),
            _ => {}
        }
    }
}
