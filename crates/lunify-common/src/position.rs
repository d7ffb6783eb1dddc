//! Line/column resolution for byte offsets.

/// 1-based line and column, for human-facing messages.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Position {
    pub line: u32,
    pub column: u32,
}

/// Precomputed newline offsets for a source file.
pub struct LineMap {
    line_starts: Vec<u32>,
}

impl LineMap {
    pub fn new(text: &str) -> LineMap {
        let mut line_starts = vec![0u32];
        for (i, b) in text.bytes().enumerate() {
            if b == b'\n' {
                line_starts.push(i as u32 + 1);
            }
        }
        LineMap { line_starts }
    }

    /// Resolve a byte offset to a 1-based line/column pair.
    pub fn position(&self, offset: u32) -> Position {
        let line = match self.line_starts.binary_search(&offset) {
            Ok(i) => i,
            Err(i) => i - 1,
        };
        Position {
            line: line as u32 + 1,
            column: offset - self.line_starts[line] + 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positions_across_lines() {
        let map = LineMap::new("ab\ncd\n");
        assert_eq!(map.position(0), Position { line: 1, column: 1 });
        assert_eq!(map.position(1), Position { line: 1, column: 2 });
        assert_eq!(map.position(3), Position { line: 2, column: 1 });
        assert_eq!(map.position(4), Position { line: 2, column: 2 });
    }

    #[test]
    fn position_at_line_start() {
        let map = LineMap::new("\n\nx");
        assert_eq!(map.position(2), Position { line: 3, column: 1 });
    }
}
