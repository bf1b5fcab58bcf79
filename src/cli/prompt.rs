//! Terminal implementation of the message prompt.
//!
//! A message given on the command line wins. Otherwise the message is edited
//! in the configured editor, and without one it is read from stdin.

use std::io::{self, BufRead, Write};
use std::process::Command;

use tracing::debug;

use super::formatting::parse_editor_command;
use crate::prompt::{MessagePrompt, MessageRequest};

/// Keyword that cancels the stdin prompt.
const CANCEL: &str = ":q";

/// Everything from this line down is dropped from an edited message.
///
/// Existing messages may contain lines starting with `#`, so only the hint
/// block below the marker is discarded, as with `git commit --cleanup=scissors`.
const SCISSORS: &str = "# ------------------------ >8 ------------------------";

/// Prompts on the terminal, in an editor, or not at all.
pub struct TerminalPrompt<R> {
    preset: Option<String>,
    editor: Option<String>,
    is_terminal: bool,
    reader: R,
}

impl<R: BufRead> TerminalPrompt<R> {
    /// `is_terminal` and `reader` are injected so tests can drive the prompt
    /// without blocking on real stdin.
    pub fn new(
        preset: Option<String>,
        editor: Option<String>,
        is_terminal: bool,
        reader: R,
    ) -> Self {
        Self {
            preset,
            editor,
            is_terminal,
            reader,
        }
    }

    fn read_stdin(&mut self, request: &MessageRequest) -> io::Result<Option<String>> {
        if !self.is_terminal {
            eprintln!("warning: stdin is not interactive, cannot prompt for a message (use --message)");
            return Ok(None);
        }

        println!("\n\u{1f4dd} {}", request.title);
        println!("{}:", request.prompt);
        for line in request.default.lines() {
            println!("    {line}");
        }
        print!("\u{2753} New message (empty keeps the message above, {CANCEL} cancels): ");
        io::stdout().flush()?;

        let mut input = String::new();
        if self.reader.read_line(&mut input)? == 0 {
            eprintln!("warning: stdin closed, cancelling");
            return Ok(None);
        }

        match input.trim() {
            CANCEL => Ok(None),
            "" => Ok(Some(request.default.clone())),
            message => Ok(Some(message.to_string())),
        }
    }
}

impl<R: BufRead> MessagePrompt for TerminalPrompt<R> {
    fn request(&mut self, request: &MessageRequest) -> io::Result<Option<String>> {
        if let Some(message) = &self.preset {
            return Ok(Some(message.clone()));
        }
        match self.editor.clone() {
            Some(editor) => edit_in_editor(&editor, request),
            None => self.read_stdin(request),
        }
    }
}

/// Opens `request.default` in `editor` and returns the saved text above the scissors line.
fn edit_in_editor(editor: &str, request: &MessageRequest) -> io::Result<Option<String>> {
    let mut file = tempfile::Builder::new()
        .prefix("HISTEDIT_EDITMSG")
        .suffix(".txt")
        .tempfile()?;
    write!(
        file,
        "{}\n\n{SCISSORS}\n# Do not modify or remove the line above.\n# {}\n# Everything below it is ignored; an empty message cancels.\n",
        request.default, request.prompt
    )?;
    file.flush()?;

    let (editor_cmd, args) = parse_editor_command(editor);
    debug!(editor = %editor, path = %file.path().display(), "Opening message in editor");
    let status = Command::new(editor_cmd).args(args).arg(file.path()).status()?;
    if !status.success() {
        eprintln!(
            "warning: editor exited with non-zero status {:?}, cancelling",
            status.code()
        );
        return Ok(None);
    }

    let edited = std::fs::read_to_string(file.path())?;
    Ok(Some(strip_hints(&edited)))
}

fn strip_hints(text: &str) -> String {
    text.lines()
        .take_while(|line| *line != SCISSORS)
        .collect::<Vec<_>>()
        .join("\n")
}
