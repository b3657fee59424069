//! Checker configuration

/// Knobs shared by every check request of one [`TypeChecker`](crate::TypeChecker)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckerOptions {
    /// Recursion limit for matching and for alias/conditional resolution
    pub max_depth: usize,
    /// Memoize unifier results per (pattern, candidate, variance)
    pub memoize: bool,
}

impl Default for CheckerOptions {
    fn default() -> Self {
        Self { max_depth: 64, memoize: true }
    }
}
