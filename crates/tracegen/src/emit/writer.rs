/// Indentation-aware line buffer.
#[derive(Debug, Clone)]
pub struct CodeWriter {
    buf: String,
    level: usize,
    unit: &'static str,
}

impl Default for CodeWriter {
    fn default() -> Self {
        Self::new("    ")
    }
}

impl CodeWriter {
    /// Writer indenting by `unit` per level.
    #[must_use]
    pub const fn new(unit: &'static str) -> Self {
        Self {
            buf: String::new(),
            level: 0,
            unit,
        }
    }

    /// Write one line at the current indentation.
    pub fn line(&mut self, text: impl AsRef<str>) {
        let text = text.as_ref();
        if !text.is_empty() {
            for _ in 0..self.level {
                self.buf.push_str(self.unit);
            }
            self.buf.push_str(text);
        }
        self.buf.push('\n');
    }

    /// Write an empty line.
    pub fn blank(&mut self) {
        self.buf.push('\n');
    }

    /// Append text verbatim, adding a final newline if it lacks one.
    pub fn raw(&mut self, text: &str) {
        self.buf.push_str(text);
        if !text.is_empty() && !text.ends_with('\n') {
            self.buf.push('\n');
        }
    }

    /// Run `f` one level deeper.
    pub fn indented(&mut self, f: impl FnOnce(&mut Self)) {
        self.level += 1;
        f(self);
        self.level -= 1;
    }

    /// Current indentation level.
    #[must_use]
    pub const fn level(&self) -> usize {
        self.level
    }

    /// Consume the writer.
    #[must_use]
    pub fn finish(self) -> String {
        self.buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nesting() {
        let mut w = CodeWriter::default();
        w.line("try:");
        w.indented(|w| w.line("x = 1"));
        w.line("");
        w.line("done");
        assert_eq!(w.finish(), "try:\n    x = 1\n\ndone\n");
    }

    #[test]
    fn test_raw_terminates_line() {
        let mut w = CodeWriter::new("  ");
        w.raw("a\nb");
        w.raw("c\n");
        assert_eq!(w.finish(), "a\nb\nc\n");
    }
}
