//! Table printing that can both print to a terminal in nice
//! human-readable format (with spaces for padding, and ANSI sequences
//! for formatting), as well as in TSV format.

//! Does not escape anything in the fields, just uses `Display` and
//! prints that directly. Thus is not safe if the type can print tabs
//! or newlines (or on the terminal even spaces could make it
//! ambiguous).

use std::{borrow::Cow, fmt::Display, io::Write};

use anyhow::{anyhow, bail, Result};
use itertools::Itertools;
use strum_macros::{Display as StrumDisplay, EnumString};
use yansi::{Paint, Style};

#[derive(Debug, EnumString, StrumDisplay, PartialEq, Clone, Copy)]
#[strum(serialize_all = "kebab_case")]
pub enum ColorOpt {
    Auto,
    Always,
    Never,
}

impl ColorOpt {
    pub fn want_color(self, detected_terminal: bool) -> bool {
        match self {
            ColorOpt::Auto => detected_terminal,
            ColorOpt::Always => true,
            ColorOpt::Never => false,
        }
    }
}

#[derive(Debug, clap::Args, Clone)]
pub struct TerminalTableOpts {
    /// Show the tables as TSV (with '\t' as separator) instead of
    /// human-readable
    #[clap(long)]
    pub tsv: bool,

    /// Whether to use ANSI codes to format human-readable output on
    /// terminals (auto, always, never)
    #[clap(long, default_value = "auto")]
    pub color: ColorOpt,
}

impl Default for TerminalTableOpts {
    fn default() -> Self {
        Self {
            tsv: false,
            color: ColorOpt::Auto,
        }
    }
}

impl TerminalTableOpts {
    pub fn want_color(&self, detected_terminal: bool) -> bool {
        let Self { tsv, color } = self;
        if *tsv {
            false
        } else {
            color.want_color(detected_terminal)
        }
    }
}

/// A value that can be shown as one row of a `TerminalTable`.
pub trait TableRow {
    fn table_row(&self) -> Vec<Cow<'_, str>>;
}

/// Capable of streaming, which requires defining the column widths
/// beforehand. If a value is wider than the defined column width for
/// that value, a single space is still printed between the value and
/// the next. The last column does not need a width, and no padding is
/// printed.
pub struct TerminalTable {
    widths: Vec<usize>,
    titles: Vec<String>,
    padding: String,
    /// Whether to print as TSV (with tab as separator) and omit
    /// printing ANSI codes and padding.
    pub tsv_mode: bool,
    /// Whether to print the title row with ANSI codes (ignored in
    /// `tsv_mode`).
    pub color: bool,
}

impl TerminalTable {
    /// The length of `widths` must be one less than that of `titles`
    /// (the last column does not need a width).  Appends a space to
    /// each title, to make sure italic text is not clipped on
    /// terminals. That will be fine as you'll want your widths to be
    /// at least 1 longer than the text itself, anyway.
    pub fn new<S: Display>(widths: &[usize], titles: &[S], tsv_mode: bool) -> Self {
        let titles = titles.iter().map(|title| format!("{title} ")).collect();
        let max_width = widths.iter().max().copied().unwrap_or(0);
        let padding = " ".repeat(max_width);
        Self {
            widths: widths.to_owned(),
            titles,
            padding,
            tsv_mode,
            color: !tsv_mode,
        }
    }

    /// Widths chosen so that all titles and `rows` fit, with at least
    /// two spaces between columns.
    pub fn fitting<S: Display>(titles: &[S], rows: &[Vec<Cow<str>>], tsv_mode: bool) -> Self {
        let ncols = titles.len().saturating_sub(1);
        let widths: Vec<usize> = (0..ncols)
            .map(|i| {
                let title_len = titles[i].to_string().len() + 1;
                rows.iter()
                    .filter_map(|row| row.get(i))
                    .map(|v| v.len())
                    .chain([title_len])
                    .max()
                    .unwrap_or(0)
                    + 2
            })
            .collect();
        Self::new(&widths, titles, tsv_mode)
    }

    fn write_row<V: Display>(
        &self,
        row: &[V],
        line_style: Option<&Style>,
        out: &mut impl Write,
    ) -> Result<()> {
        let lens = (self.widths.len(), row.len());
        let (l1, l2) = lens;
        if l1
            != l2
                .checked_sub(1)
                .ok_or_else(|| anyhow!("need at least 1 column"))?
        {
            bail!("widths.len != data.len - 1: {lens:?}")
        }

        let mut is_first = true;
        for either_or_both in self.widths.iter().zip_longest(row) {
            if self.tsv_mode && !is_first {
                out.write_all(b"\t")?;
            }

            let val = either_or_both
                .as_ref()
                .right()
                .expect("value there because row len checked above");
            let s = val.to_string();
            let s_len = s.len();
            {
                let s: String = if let Some(style) = line_style {
                    let s = s.paint(*style);
                    s.to_string()
                } else {
                    s
                };
                out.write_all(s.as_bytes())?;
            }

            if let Some(width) = either_or_both.left() {
                if !self.tsv_mode {
                    if *width > s_len {
                        let needed_padding = width - s_len;
                        let padding = &self.padding[0..needed_padding];
                        out.write_all(padding.as_bytes())?;
                    } else {
                        // write out at least 1 space anyway
                        out.write_all(b" ")?;
                    }
                }
            }

            is_first = false;
        }
        out.write_all(b"\n")?;
        Ok(())
    }

    pub fn write_title_row(&self, out: &mut impl Write) -> Result<()> {
        const STYLE: Style = Style::new().bold().italic();
        self.write_row(
            &self.titles,
            if self.tsv_mode || !self.color {
                None
            } else {
                Some(&STYLE)
            },
            out,
        )
    }

    pub fn write_data_row<V: Display>(&self, data: &[V], out: &mut impl Write) -> Result<()> {
        self.write_row(data, None, out)
    }
}

/// Print a complete table of `rows` with the given titles.
/// `is_terminal` is whether `out` goes to a terminal.
pub fn write_table<S: Display, R: TableRow>(
    titles: &[S],
    rows: &[R],
    opts: &TerminalTableOpts,
    is_terminal: bool,
    out: &mut impl Write,
) -> Result<()> {
    let cells: Vec<Vec<Cow<str>>> = rows.iter().map(|row| row.table_row()).collect();
    let mut table = TerminalTable::fitting(titles, &cells, opts.tsv);
    table.color = opts.want_color(is_terminal);
    table.write_title_row(out)?;
    for row in &cells {
        table.write_data_row(row, out)?;
    }
    Ok(())
}

impl TableRow for Vec<String> {
    fn table_row(&self) -> Vec<Cow<'_, str>> {
        self.iter().map(|s| s.as_str().into()).collect()
    }
}
