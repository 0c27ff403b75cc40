use anyhow::Result;
use crossterm::{
    execute,
    style::{Color, Print, ResetColor, SetForegroundColor},
};
use std::collections::HashMap;
use std::io::{self, Write};

use crontention_core::axis::AxisTick;
use crontention_core::controller::{Controller, SubmitOutcome, ViewMode};
use crontention_core::lock::DetailPanel;
use crontention_core::query::FieldError;
use crontention_core::record::{HOURS_PER_DAY, MINUTES_PER_HOUR};
use crontention_core::scale::Rgb;
use crontention_core::scene::CellElement;
use crontention_core::{Evaluator, Renderer};

/// Color scheme for terminal output.
struct Colors;

impl Colors {
    const PROMPT: Color = Color::Green;
    const AXIS: Color = Color::Cyan;
    const SUMMARY: Color = Color::Yellow;
    const ERROR: Color = Color::Red;
    const DIM: Color = Color::DarkGrey;
    const HEADER: Color = Color::Magenta;
}

const EMPTY_CELL: char = '\u{00b7}';
const CELL: char = '\u{25a0}';
const HIGHLIGHTED_CELL: char = '\u{2588}';
const LOCKED_CELL: char = '\u{25c6}';

/// Width of the hour label column, including the gap.
const GUTTER: usize = 4;

fn rgb(color: Rgb) -> Color {
    Color::Rgb {
        r: color.r,
        g: color.g,
        b: color.b,
    }
}

/// Glyph for one grid position.
fn cell_glyph(cell: Option<&CellElement>) -> char {
    match cell {
        None => EMPTY_CELL,
        Some(c) if c.locked => LOCKED_CELL,
        Some(c) if c.highlighted => HIGHLIGHTED_CELL,
        Some(_) => CELL,
    }
}

/// Minute labels placed above their columns.
fn minute_header(ticks: &[AxisTick]) -> String {
    let mut columns = vec![' '; MINUTES_PER_HOUR as usize + 1];
    for tick in ticks {
        for (offset, ch) in tick.label.chars().enumerate() {
            if let Some(slot) = columns.get_mut(tick.value as usize + offset) {
                *slot = ch;
            }
        }
    }
    let header: String = columns.into_iter().collect();
    format!("{}{}", " ".repeat(GUTTER), header.trim_end())
}

/// Manages terminal I/O for the interactive REPL.
pub struct Terminal;

impl Terminal {
    pub fn new() -> Self {
        Self
    }

    /// Print the startup banner.
    pub fn print_banner(&self, service_url: &str, zone: &str) -> Result<()> {
        let mut stdout = io::stdout();
        execute!(
            stdout,
            SetForegroundColor(Colors::HEADER),
            Print("crontention"),
            ResetColor,
            Print(" - Cron contention heat map\n"),
            SetForegroundColor(Colors::DIM),
            Print(format!("Service: {} | Time zone: {}\n", service_url, zone)),
            Print("Type 'help' for commands, 'quit' to end.\n"),
            Print("---\n"),
            ResetColor,
        )?;
        stdout.flush()?;
        Ok(())
    }

    /// Read a line of user input with prompt.
    /// Returns None at end of input.
    pub fn read_input(&self) -> Result<Option<String>> {
        let mut stdout = io::stdout();
        execute!(
            stdout,
            Print("\n"),
            SetForegroundColor(Colors::PROMPT),
            Print("cron> "),
            ResetColor,
        )?;
        stdout.flush()?;

        let mut input = String::new();
        if io::stdin().read_line(&mut input)? == 0 {
            return Ok(None);
        }
        Ok(Some(input.trim().to_string()))
    }

    /// Paint whichever half of the page is showing.
    pub fn print_view<E: Evaluator>(&self, controller: &Controller<E>) -> Result<()> {
        match controller.mode() {
            ViewMode::Edit => self.print_form(controller)?,
            ViewMode::Rendered => {
                let renderer = controller.renderer();
                self.print_grid(renderer)?;
                self.print_summary(renderer)?;
                self.print_detail(renderer.detail())?;
                self.print_listing(renderer)?;
            }
        }
        if let Some(alert) = controller.alert() {
            self.print_error(alert)?;
        }
        Ok(())
    }

    fn print_form<E: Evaluator>(&self, controller: &Controller<E>) -> Result<()> {
        let mut stdout = io::stdout();
        let form = controller.form();
        execute!(
            stdout,
            SetForegroundColor(Colors::HEADER),
            Print("Expressions:\n"),
            ResetColor,
        )?;
        if form.expressions.is_empty() {
            execute!(
                stdout,
                SetForegroundColor(Colors::DIM),
                Print("  (none)\n"),
                ResetColor
            )?;
        }
        for line in form.expressions.lines() {
            execute!(stdout, Print(format!("  {}\n", line)))?;
        }
        let date = if form.date.is_empty() { "today" } else { form.date.as_str() };
        execute!(
            stdout,
            SetForegroundColor(Colors::HEADER),
            Print("Date: "),
            ResetColor,
            Print(format!("{}\n", date)),
        )?;
        stdout.flush()?;
        self.print_field_errors(controller.errors())
    }

    pub fn print_field_errors(&self, errors: &[FieldError]) -> Result<()> {
        let mut stdout = io::stdout();
        for error in errors {
            execute!(
                stdout,
                SetForegroundColor(Colors::ERROR),
                Print(format!("  {} ({}): {}\n", error.value, error.field, error.message)),
                ResetColor,
            )?;
        }
        stdout.flush()?;
        Ok(())
    }

    /// Paint the 24x60 grid with zone-relative axis labels.
    pub fn print_grid(&self, renderer: &Renderer) -> Result<()> {
        let mut stdout = io::stdout();
        let labels = renderer.axis_labels();
        let cells: HashMap<(u8, u8), &CellElement> = renderer
            .scene()
            .iter()
            .map(|e| ((e.record.hour, e.record.minute), e))
            .collect();

        execute!(
            stdout,
            SetForegroundColor(Colors::AXIS),
            Print(format!("{}\n", minute_header(&labels.minutes))),
            ResetColor,
        )?;

        for hour in 0..HOURS_PER_DAY {
            let label = labels
                .hours
                .get(hour as usize)
                .map(|t| t.label.as_str())
                .unwrap_or("");
            execute!(
                stdout,
                SetForegroundColor(Colors::AXIS),
                Print(format!("{:<width$}", label, width = GUTTER)),
            )?;
            for minute in 0..MINUTES_PER_HOUR {
                let cell = cells.get(&(hour, minute)).copied();
                let color = cell.map(|c| rgb(c.fill)).unwrap_or(Colors::DIM);
                execute!(
                    stdout,
                    SetForegroundColor(color),
                    Print(cell_glyph(cell))
                )?;
            }
            execute!(stdout, ResetColor, Print("\n"))?;
        }
        stdout.flush()?;
        Ok(())
    }

    pub fn print_summary(&self, renderer: &Renderer) -> Result<()> {
        let mut stdout = io::stdout();
        execute!(
            stdout,
            Print("\n"),
            SetForegroundColor(Colors::HEADER),
            Print("Most contention:\n"),
            ResetColor,
        )?;
        if renderer.summary().is_empty() {
            execute!(
                stdout,
                SetForegroundColor(Colors::DIM),
                Print("  No events.\n"),
                ResetColor
            )?;
        }
        for line in renderer.summary() {
            execute!(
                stdout,
                SetForegroundColor(Colors::SUMMARY),
                Print(format!("  {}\n", line)),
                ResetColor,
            )?;
        }
        stdout.flush()?;
        Ok(())
    }

    pub fn print_detail(&self, detail: &DetailPanel) -> Result<()> {
        let mut stdout = io::stdout();
        execute!(stdout, Print("\n"))?;
        match detail {
            DetailPanel::Placeholder => {
                execute!(
                    stdout,
                    SetForegroundColor(Colors::DIM),
                    Print(format!("{}\n", detail.header())),
                    ResetColor,
                )?;
            }
            DetailPanel::Cell {
                header,
                expressions,
            } => {
                execute!(
                    stdout,
                    SetForegroundColor(Colors::HEADER),
                    Print(format!("{}\n", header)),
                    ResetColor,
                )?;
                for expression in expressions {
                    execute!(stdout, Print(format!("  {}\n", expression)))?;
                }
            }
        }
        stdout.flush()?;
        Ok(())
    }

    pub fn print_listing(&self, renderer: &Renderer) -> Result<()> {
        let mut stdout = io::stdout();
        execute!(
            stdout,
            Print("\n"),
            SetForegroundColor(Colors::HEADER),
            Print("Expressions:\n"),
            ResetColor,
        )?;
        for (i, entry) in renderer.listing().iter().enumerate() {
            let marker = if entry.highlighted { HIGHLIGHTED_CELL } else { ' ' };
            let cells = renderer.index().cells_for(&entry.expression).len();
            execute!(
                stdout,
                Print(format!("{:>3}. {} {} ", i + 1, marker, entry.expression)),
                SetForegroundColor(Colors::DIM),
                Print(format!("({} cells)\n", cells)),
                ResetColor,
            )?;
        }
        stdout.flush()?;
        Ok(())
    }

    /// One-line report for outcomes that are not shown by repainting.
    pub fn print_outcome(&self, outcome: &SubmitOutcome) -> Result<()> {
        match outcome {
            SubmitOutcome::Busy => self.print_info("A request is already in flight."),
            SubmitOutcome::Ignored => self.print_info("Nothing to evaluate."),
            SubmitOutcome::Stale => self.print_info("Superseded response discarded."),
            SubmitOutcome::Cleared => self.print_info("Cleared."),
            SubmitOutcome::Drawn(report) => {
                self.print_info(&format!("{} cells ({:?} scale).", report.cells, report.scale))
            }
            SubmitOutcome::Invalid(_) | SubmitOutcome::Rejected(_) | SubmitOutcome::Failed(_) => {
                Ok(())
            }
        }
    }

    pub fn print_help(&self) -> Result<()> {
        let mut stdout = io::stdout();
        execute!(
            stdout,
            SetForegroundColor(Colors::DIM),
            Print(format!("{}\n", crate::command::HELP)),
            ResetColor,
        )?;
        stdout.flush()?;
        Ok(())
    }

    /// Print an error message.
    pub fn print_error(&self, msg: &str) -> Result<()> {
        let mut stdout = io::stdout();
        execute!(
            stdout,
            SetForegroundColor(Colors::ERROR),
            Print(format!("Error: {}\n", msg)),
            ResetColor,
        )?;
        stdout.flush()?;
        Ok(())
    }

    /// Print an info message.
    pub fn print_info(&self, msg: &str) -> Result<()> {
        let mut stdout = io::stdout();
        execute!(
            stdout,
            SetForegroundColor(Colors::DIM),
            Print(format!("{}\n", msg)),
            ResetColor,
        )?;
        stdout.flush()?;
        Ok(())
    }
}
