use std::io::{self, Write};

use flame_tree_core::{CallTreeNode, CallVisitor, Frame, Profile, RankedSort, ranked_frames};

pub fn write_summary(out: &mut impl Write, profile: &Profile) -> io::Result<()> {
    let name = if profile.name().is_empty() {
        "(unnamed)"
    } else {
        profile.name()
    };
    writeln!(out, "{name} [{}]", profile.unit())?;
    writeln!(
        out,
        "total {}, non-idle {}, {} frames, {} samples",
        profile.format_value(profile.total_weight()),
        profile.format_value(profile.total_non_idle_weight()),
        profile.frames().len(),
        profile.samples().len(),
    )
}

fn percent(value: f64, of: f64) -> f64 {
    if of == 0.0 { 0.0 } else { value / of * 100.0 }
}

/// Frame table, heaviest first unless sorted by name.
pub fn write_ranked(
    out: &mut impl Write,
    profile: &Profile,
    sort: RankedSort,
    top: usize,
) -> io::Result<()> {
    let non_idle = profile.total_non_idle_weight();
    writeln!(out, "{:>12} {:>7} {:>12} {:>7}  symbol", "self", "", "total", "")?;
    for entry in ranked_frames(profile, sort, false).into_iter().take(top) {
        let location = match (&entry.file, profile.frame_by_key(&entry.key)) {
            (Some(file), Some((_, frame))) => match frame.line() {
                Some(line) => format!(" ({file}:{line})"),
                None => format!(" ({file})"),
            },
            (Some(file), None) => format!(" ({file})"),
            (None, _) => String::new(),
        };
        writeln!(
            out,
            "{:>12} {:>6.2}% {:>12} {:>6.2}%  {}{location}",
            profile.format_value(entry.self_weight),
            percent(entry.self_weight, non_idle),
            profile.format_value(entry.total_weight),
            percent(entry.total_weight, non_idle),
            entry.name,
        )?;
    }
    Ok(())
}

/// Collapsed `a;b;c <weight>` lines, one per interval in which the open
/// stack does not change. Idle intervals are skipped.
struct CollapsedStacks<'w, W: Write> {
    out: &'w mut W,
    stack: Vec<String>,
    last_value: f64,
    result: io::Result<()>,
}

impl<W: Write> CollapsedStacks<'_, W> {
    fn flush(&mut self, value: f64) {
        if value == self.last_value {
            return;
        }
        if !self.stack.is_empty() && self.result.is_ok() {
            self.result = writeln!(
                self.out,
                "{} {}",
                self.stack.join(";"),
                value - self.last_value
            );
        }
        self.last_value = value;
    }
}

impl<W: Write> CallVisitor for CollapsedStacks<'_, W> {
    fn open_frame(&mut self, _node: &CallTreeNode, frame: &Frame, value: f64) {
        self.flush(value);
        self.stack.push(frame.name().to_string());
    }

    fn close_frame(&mut self, _node: &CallTreeNode, _frame: &Frame, value: f64) {
        self.flush(value);
        self.stack.pop();
    }
}

pub fn write_stacks(out: &mut impl Write, profile: &Profile, grouped: bool) -> io::Result<()> {
    let mut stacks = CollapsedStacks {
        out,
        stack: Vec::new(),
        last_value: 0.0,
        result: Ok(()),
    };
    if grouped {
        profile.for_each_call_grouped(&mut stacks);
    } else {
        profile.for_each_call(&mut stacks);
    }
    stacks.result
}
