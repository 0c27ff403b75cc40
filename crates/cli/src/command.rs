//! REPL command parsing.

use anyhow::{anyhow, bail, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Append one expression line to the form.
    Expr(String),
    Clear,
    Date(String),
    Eval,
    Edit,
    Hover { hour: u8, minute: u8 },
    Leave,
    Click { hour: u8, minute: u8 },
    /// Toggle listing entry, 1-based as printed.
    Highlight(usize),
    TimeZone(String),
    Back,
    Forward,
    Url,
    Show,
    Help,
    Quit,
}

pub const HELP: &str = "\
expr <cron>     add an expression line
clear           remove all expressions
date <text>     set the date (today or YYYY-MM-DD)
eval            submit the form
edit            back to the form
hover <HH:MM>   show a cell in the detail panel
leave           move the pointer off the grid
click <HH:MM>   freeze or thaw the detail panel on a cell
hl <n>          toggle highlight of listed expression n
tz <zone>       relabel axes for an IANA time zone
back, forward   walk history
url             print the shareable query
show            repaint the view
quit            exit";

impl Command {
    pub fn parse(line: &str) -> Result<Self> {
        let line = line.trim();
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };

        let command = match word {
            "expr" => Command::Expr(required(word, rest)?.to_string()),
            "clear" => Command::Clear,
            "date" => Command::Date(rest.to_string()),
            "eval" => Command::Eval,
            "edit" => Command::Edit,
            "hover" => {
                let (hour, minute) = parse_cell(required(word, rest)?)?;
                Command::Hover { hour, minute }
            }
            "leave" => Command::Leave,
            "click" => {
                let (hour, minute) = parse_cell(required(word, rest)?)?;
                Command::Click { hour, minute }
            }
            "hl" => {
                let n: usize = required(word, rest)?
                    .parse()
                    .map_err(|_| anyhow!("expected a listing number, got '{rest}'"))?;
                if n == 0 {
                    bail!("listing numbers start at 1");
                }
                Command::Highlight(n)
            }
            "tz" => Command::TimeZone(required(word, rest)?.to_string()),
            "back" => Command::Back,
            "forward" => Command::Forward,
            "url" => Command::Url,
            "show" => Command::Show,
            "help" | "?" => Command::Help,
            "quit" | "exit" | "/quit" | "/exit" => Command::Quit,
            other => bail!("unknown command '{other}', try 'help'"),
        };
        Ok(command)
    }
}

fn required<'a>(word: &str, rest: &'a str) -> Result<&'a str> {
    if rest.is_empty() {
        bail!("'{word}' needs an argument");
    }
    Ok(rest)
}

/// `"07:05"` → `(7, 5)`.
pub fn parse_cell(text: &str) -> Result<(u8, u8)> {
    let (h, m) = text
        .split_once(':')
        .ok_or_else(|| anyhow!("expected HH:MM, got '{text}'"))?;
    let hour: u8 = h.parse().map_err(|_| anyhow!("bad hour in '{text}'"))?;
    let minute: u8 = m.parse().map_err(|_| anyhow!("bad minute in '{text}'"))?;
    if hour > 23 || minute > 59 {
        bail!("'{text}' is not a minute of the day");
    }
    Ok((hour, minute))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expr_keeps_spaces() {
        assert_eq!(
            Command::parse("expr 0 1,2 0 ? * MON").unwrap(),
            Command::Expr("0 1,2 0 ? * MON".to_string())
        );
    }

    #[test]
    fn test_cell_commands() {
        assert_eq!(
            Command::parse("click 07:05").unwrap(),
            Command::Click { hour: 7, minute: 5 }
        );
        assert_eq!(
            Command::parse("hover 23:59").unwrap(),
            Command::Hover { hour: 23, minute: 59 }
        );
        assert!(Command::parse("hover 24:00").is_err());
        assert!(Command::parse("click noon").is_err());
    }

    #[test]
    fn test_date_may_be_empty() {
        assert_eq!(Command::parse("date").unwrap(), Command::Date(String::new()));
    }

    #[test]
    fn test_highlight_is_one_based() {
        assert_eq!(Command::parse("hl 2").unwrap(), Command::Highlight(2));
        assert!(Command::parse("hl 0").is_err());
        assert!(Command::parse("hl").is_err());
    }

    #[test]
    fn test_quit_aliases() {
        for word in ["quit", "exit", "/quit"] {
            assert_eq!(Command::parse(word).unwrap(), Command::Quit);
        }
        assert!(Command::parse("frobnicate").is_err());
    }
}
