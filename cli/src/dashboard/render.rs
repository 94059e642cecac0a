//! Frame rendering.

use super::series::TimeSeriesBuffer;
use super::table::{Category, LogRow};
use shared::models::HealthReport;
use std::io::{self, Write};

const BARS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];
const CLEAR_SCREEN: &str = "\x1b[2J\x1b[H";

/// Everything one dashboard frame shows.
#[derive(Debug, Clone, Copy)]
pub struct Frame<'a> {
    /// CPU usage window.
    pub cpu: &'a TimeSeriesBuffer,
    /// Memory usage window.
    pub memory: &'a TimeSeriesBuffer,
    /// Latest disk usage percentage.
    pub disk: f64,
    /// Host uptime in seconds.
    pub uptime: u64,
    /// Health grade of the latest sample.
    pub health: HealthReport,
    /// Recent log rows, newest first.
    pub rows: &'a [LogRow],
}

/// Output surface for dashboard frames.
pub trait Render {
    /// Draws one frame.
    ///
    /// # Errors
    ///
    /// Returns an error if the output cannot be written.
    fn render(&mut self, frame: &Frame<'_>) -> io::Result<()>;
}

/// Plain-text renderer: one sparkline per chart followed by the log table.
#[derive(Debug)]
pub struct TerminalRenderer<W: Write> {
    out: W,
    clear: bool,
}

impl TerminalRenderer<io::Stdout> {
    /// Renders to stdout, clearing the screen before each frame.
    #[must_use]
    pub fn stdout() -> Self {
        Self::new(io::stdout()).with_clear(true)
    }
}

impl<W: Write> TerminalRenderer<W> {
    /// Creates a renderer that appends frames to `out`.
    pub fn new(out: W) -> Self {
        Self { out, clear: false }
    }

    /// Sets whether the screen is cleared before each frame.
    #[must_use]
    pub fn with_clear(mut self, clear: bool) -> Self {
        self.clear = clear;
        self
    }
}

impl<W: Write> Render for TerminalRenderer<W> {
    fn render(&mut self, frame: &Frame<'_>) -> io::Result<()> {
        if self.clear {
            write!(self.out, "{CLEAR_SCREEN}")?;
        }

        writeln!(
            self.out,
            "Health: {} (score {:.1})   Disk: {:.1}%   Uptime: {}",
            frame.health.status,
            frame.health.score,
            frame.disk,
            format_uptime(frame.uptime)
        )?;
        writeln!(
            self.out,
            "CPU    {} {:5.1}%",
            sparkline(frame.cpu),
            frame.cpu.latest()
        )?;
        writeln!(
            self.out,
            "Memory {} {:5.1}%",
            sparkline(frame.memory),
            frame.memory.latest()
        )?;
        writeln!(self.out)?;
        writeln!(self.out, "{:<10} {:<8} MESSAGE", "TIME", "LEVEL")?;

        for row in frame.rows {
            let marker = match row.category {
                Category::Warning => '!',
                Category::Success => '+',
                Category::Info => ' ',
            };
            writeln!(
                self.out,
                "{:<10} {:<8}{marker}{}",
                row.time, row.level, row.message
            )?;
        }

        self.out.flush()
    }
}

/// Maps 0–100 samples onto block characters.
#[must_use]
pub fn sparkline(series: &TimeSeriesBuffer) -> String {
    series
        .iter()
        .map(|value| {
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let idx = ((value.clamp(0.0, 100.0) / 100.0) * 7.0).round() as usize;
            BARS[idx.min(BARS.len() - 1)]
        })
        .collect()
}

fn format_uptime(secs: u64) -> String {
    let days = secs / 86_400;
    let hours = (secs % 86_400) / 3_600;
    let minutes = (secs % 3_600) / 60;
    if days > 0 {
        format!("{days}d {hours}h {minutes}m")
    } else {
        format!("{hours}h {minutes}m")
    }
}
