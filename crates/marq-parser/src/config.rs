/// Limits that keep recovery and recursion bounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParserConfig {
    /// Tokens a single recovery attempt may discard before the parse is
    /// abandoned. `0` makes every stray token fatal.
    pub max_skip: usize,
    /// Deepest element nesting accepted before the parse is abandoned.
    pub max_depth: usize,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            max_skip: 64,
            max_depth: 512,
        }
    }
}

impl ParserConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_skip(mut self, max_skip: usize) -> Self {
        self.max_skip = max_skip;
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }
}
