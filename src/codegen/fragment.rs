// SPDX-FileCopyrightText: 2025 Alexandre Gomes Gaigalas <alganet@gmail.com>
//
// SPDX-License-Identifier: ISC

/// Generated source as indented lines, rendered to text once at the end.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fragment {
    lines: Vec<(usize, String)>,
    depth: usize,
}

impl Fragment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn line<S: Into<String>>(&mut self, text: S) -> &mut Self {
        self.lines.push((self.depth, text.into()));
        self
    }

    pub fn blank(&mut self) -> &mut Self {
        self.lines.push((0, String::new()));
        self
    }

    /// Emit `text` and indent what follows.
    pub fn open<S: Into<String>>(&mut self, text: S) -> &mut Self {
        self.line(text);
        self.depth += 1;
        self
    }

    /// Dedent and emit `text`.
    pub fn close<S: Into<String>>(&mut self, text: S) -> &mut Self {
        self.depth = self.depth.saturating_sub(1);
        self.line(text)
    }

    /// Dedent, emit `text`, then indent again, as for `} else {`.
    pub fn reopen<S: Into<String>>(&mut self, text: S) -> &mut Self {
        self.close(text);
        self.depth += 1;
        self
    }

    /// Splice `other` in at the current depth.
    pub fn append(&mut self, other: Fragment) -> &mut Self {
        for (depth, text) in other.lines {
            let depth = if text.is_empty() { 0 } else { depth + self.depth };
            self.lines.push((depth, text));
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        for (depth, text) in &self.lines {
            if !text.is_empty() {
                out.extend(std::iter::repeat('\t').take(*depth));
                out.push_str(text);
            }
            out.push('\n');
        }
        out
    }
}
