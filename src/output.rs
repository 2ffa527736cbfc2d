use std::io::{self, Write};

/// Where user-visible progress and failure lines go
pub trait OutputSink {
    fn info(&mut self, line: &str);
    fn error(&mut self, line: &str);
}

impl<S: OutputSink + ?Sized> OutputSink for &mut S {
    fn info(&mut self, line: &str) {
        (**self).info(line);
    }

    fn error(&mut self, line: &str) {
        (**self).error(line);
    }
}

/// stdout for info, stderr for errors
#[derive(Debug, Default)]
pub struct ConsoleSink;

impl ConsoleSink {
    pub fn new() -> Self {
        Self
    }
}

impl OutputSink for ConsoleSink {
    fn info(&mut self, line: &str) {
        let _ = writeln!(io::stdout().lock(), "{}", console_line(line));
    }

    fn error(&mut self, line: &str) {
        let _ = writeln!(io::stderr().lock(), "{}", console_line(line));
    }
}

/// Captured process output already ends in a newline; `writeln!` adds its own.
fn console_line(line: &str) -> &str {
    line.strip_suffix('\n')
        .map(|rest| rest.strip_suffix('\r').unwrap_or(rest))
        .unwrap_or(line)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Info,
    Error,
}

/// Records every line in memory
#[derive(Debug, Default)]
pub struct BufferSink {
    lines: Vec<(Channel, String)>,
}

impl BufferSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> &[(Channel, String)] {
        &self.lines
    }

    pub fn infos(&self) -> Vec<&str> {
        self.on(Channel::Info)
    }

    pub fn errors(&self) -> Vec<&str> {
        self.on(Channel::Error)
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.lines.iter().any(|(_, line)| line.contains(needle))
    }

    fn on(&self, channel: Channel) -> Vec<&str> {
        self.lines
            .iter()
            .filter(|(c, _)| *c == channel)
            .map(|(_, line)| line.as_str())
            .collect()
    }
}

impl OutputSink for BufferSink {
    fn info(&mut self, line: &str) {
        self.lines.push((Channel::Info, line.to_string()));
    }

    fn error(&mut self, line: &str) {
        self.lines.push((Channel::Error, line.to_string()));
    }
}
