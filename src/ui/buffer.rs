use super::Address;

/// Text state behind one surface. Offsets count characters, not bytes.
#[derive(Debug, Clone, Default)]
pub struct TextBuffer {
    pub name: String,
    pub tag: String,
    body: String,
    /// Selection as (start, end) character offsets into the body
    selection: (usize, usize),
    dirty: bool,
    diagnostics: Vec<String>,
}

impl TextBuffer {
    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn selection(&self) -> (usize, usize) {
        self.selection
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn mark_clean(&mut self) {
        self.dirty = false;
    }

    pub fn diagnostics(&self) -> &[String] {
        &self.diagnostics
    }

    pub fn report(&mut self, diagnostic: &str) {
        self.diagnostics.push(diagnostic.to_string());
    }

    pub fn clear(&mut self) {
        self.body.clear();
        self.selection = (0, 0);
        self.dirty = true;
    }

    pub fn append(&mut self, text: &str) {
        self.body.push_str(text);
        self.dirty = true;
    }

    /// Replace the whole body, keeping the selection inside it
    pub fn replace(&mut self, text: String) {
        self.body = text;
        let len = self.body.chars().count();
        self.selection = (self.selection.0.min(len), self.selection.1.min(len));
        self.dirty = true;
    }

    pub fn select(&mut self, address: Address) {
        self.selection = match address {
            Address::Start => (0, 0),
            Address::Line(line) => self.line_range(line),
        };
    }

    /// Number of lines, not counting the empty remainder after a final newline
    pub fn line_count(&self) -> usize {
        let lines = self.body.split('\n').count();
        if self.body.is_empty() {
            0
        } else if self.body.ends_with('\n') {
            lines - 1
        } else {
            lines
        }
    }

    /// 1-based line number and text of the line holding `offset`
    pub fn line_at(&self, offset: usize) -> (usize, String) {
        let mut start = 0;
        let mut last = (1, String::new());
        for (index, line) in self.body.split('\n').enumerate() {
            let len = line.chars().count();
            last = (index + 1, line.to_string());
            if offset <= start + len {
                return last;
            }
            start += len + 1;
        }
        last
    }

    /// Character range of a 1-based line, without its newline.
    /// Lines past the end select the end of the body.
    pub fn line_range(&self, line: usize) -> (usize, usize) {
        let mut start = 0;
        for (index, text) in self.body.split('\n').enumerate() {
            let len = text.chars().count();
            if index + 1 == line.max(1) {
                return (start, start + len);
            }
            start += len + 1;
        }
        let end = self.body.chars().count();
        (end, end)
    }

    /// 1-based line the selection starts on
    pub fn selected_line(&self) -> usize {
        self.line_at(self.selection.0).0
    }
}
