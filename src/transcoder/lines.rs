use super::Sink;

/// Splits decoded text into lines; the last (possibly empty) line is always
/// emitted, so the output is never empty.
#[derive(Debug, Default)]
pub struct LineSink {
    lines: Vec<String>,
    current: String,
}

impl Sink for LineSink {
    type Output = Vec<String>;

    fn line_break(&mut self) {
        self.lines.push(std::mem::take(&mut self.current));
    }

    fn tab(&mut self) {
        self.current.push('\t');
    }

    fn push(&mut self, c: char) {
        self.current.push(c);
    }

    fn finish(mut self) -> Vec<String> {
        self.lines.push(self.current);
        self.lines
    }
}
