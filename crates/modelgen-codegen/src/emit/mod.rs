//! Code emitters.
//!
//! Each backend renders IR into a complete, independently loadable JS module.
//! Output is pretty-printed by construction through [`CodeWriter`]; no
//! post-hoc formatting pass exists.

mod model;
mod schema;

pub use model::emit_model;
pub use schema::{emit_models_index, emit_schema, emit_schema_index};

const INDENT: &str = "  ";

/// Line-oriented writer with indentation tracking.
pub(crate) struct CodeWriter {
    out: String,
    depth: usize,
}

impl CodeWriter {
    pub(crate) fn new() -> Self {
        Self {
            out: String::new(),
            depth: 0,
        }
    }

    pub(crate) fn line(&mut self, text: &str) {
        for _ in 0..self.depth {
            self.out.push_str(INDENT);
        }
        self.out.push_str(text);
        self.out.push('\n');
    }

    pub(crate) fn blank(&mut self) {
        self.out.push('\n');
    }

    /// Write a line and indent everything until the matching [`close`].
    ///
    /// [`close`]: CodeWriter::close
    pub(crate) fn open(&mut self, text: &str) {
        self.line(text);
        self.depth += 1;
    }

    pub(crate) fn close(&mut self, text: &str) {
        self.depth -= 1;
        self.line(text);
    }

    pub(crate) fn finish(self) -> String {
        debug_assert_eq!(self.depth, 0, "unbalanced open/close");
        self.out
    }
}
