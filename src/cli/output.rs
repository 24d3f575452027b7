//! Colored terminal output for operators.

use std::io::{self, Write};
use termcolor::{BufferWriter, Color, ColorChoice, ColorSpec, WriteColor};

/// Writes progress, warnings and results to the terminal.
#[derive(Debug, Clone)]
pub struct OutputManager {
    verbose: bool,
    quiet: bool,
}

impl OutputManager {
    pub fn new(verbose: bool, quiet: bool) -> Self {
        Self { verbose, quiet }
    }

    /// Prints only in verbose mode.
    pub fn verbose(&self, message: &str) -> io::Result<()> {
        if !self.verbose || self.quiet {
            return Ok(());
        }
        self.print_stdout(None, "", message)
    }

    pub fn progress(&self, message: &str) -> io::Result<()> {
        if self.quiet {
            return Ok(());
        }
        self.print_stdout(Some(Color::Cyan), "→ ", message)
    }

    pub fn success(&self, message: &str) -> io::Result<()> {
        if self.quiet {
            return Ok(());
        }
        self.print_stdout(Some(Color::Green), "✓ ", message)
    }

    pub fn warn(&self, message: &str) -> io::Result<()> {
        if self.quiet {
            return Ok(());
        }
        self.print_stderr(Color::Yellow, "⚠ ", message)
    }

    pub fn section(&self, title: &str) -> io::Result<()> {
        if self.quiet {
            return Ok(());
        }
        let bufwtr = BufferWriter::stdout(ColorChoice::Auto);
        let mut buffer = bufwtr.buffer();
        writeln!(&mut buffer)?;
        buffer.set_color(ColorSpec::new().set_fg(Some(Color::Blue)).set_bold(true))?;
        writeln!(&mut buffer, "{title}")?;
        buffer.reset()?;
        bufwtr.print(&buffer)
    }

    pub fn indent(&self, message: &str) -> io::Result<()> {
        if self.quiet {
            return Ok(());
        }
        self.print_stdout(None, "  ", message)
    }

    fn print_stdout(&self, color: Option<Color>, marker: &str, message: &str) -> io::Result<()> {
        let bufwtr = BufferWriter::stdout(ColorChoice::Auto);
        let mut buffer = bufwtr.buffer();
        if color.is_some() {
            buffer.set_color(ColorSpec::new().set_fg(color))?;
        }
        write!(&mut buffer, "{marker}")?;
        buffer.reset()?;
        writeln!(&mut buffer, "{message}")?;
        bufwtr.print(&buffer)
    }

    fn print_stderr(&self, color: Color, marker: &str, message: &str) -> io::Result<()> {
        let bufwtr = BufferWriter::stderr(ColorChoice::Auto);
        let mut buffer = bufwtr.buffer();
        buffer.set_color(ColorSpec::new().set_fg(Some(color)))?;
        write!(&mut buffer, "{marker}")?;
        buffer.reset()?;
        writeln!(&mut buffer, "{message}")?;
        bufwtr.print(&buffer)
    }
}
