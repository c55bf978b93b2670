use super::Sink;

/// Characters with a meaning in the markup key grammar.
pub const MARKUP_SPECIAL_CHARS: &[char] = &['+', '^', '%', '~', '(', ')', '[', ']', '{', '}'];

/// Builds a single markup key-sequence string.
#[derive(Debug, Default)]
pub struct MarkupSink {
    buffer: String,
}

impl Sink for MarkupSink {
    type Output = String;

    fn line_break(&mut self) {
        self.buffer.push_str("{ENTER}");
    }

    fn tab(&mut self) {
        self.buffer.push_str("{TAB}");
    }

    fn push(&mut self, c: char) {
        if MARKUP_SPECIAL_CHARS.contains(&c) {
            self.buffer.push('{');
            self.buffer.push(c);
            self.buffer.push('}');
        } else {
            self.buffer.push(c);
        }
    }

    fn finish(self) -> String {
        self.buffer
    }
}
