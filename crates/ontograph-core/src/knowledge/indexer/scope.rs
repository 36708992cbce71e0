//! Lexical scope tracking for extracted definitions.

use std::ops::Range;

/// Dotted module path of a file: `src/utils/helper.py` becomes
/// `src.utils.helper`.
pub fn module_path(relative_path: &str) -> String {
    let without_ext = match relative_path.rfind('.') {
        Some(dot) if !relative_path[dot..].contains('/') && dot > 0 => &relative_path[..dot],
        _ => relative_path,
    };
    without_ext
        .split('/')
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>()
        .join(".")
}

/// Stack of open containers while walking definitions in document order.
///
/// Items must be pushed sorted by start ascending, then end descending; the
/// stack then always holds the chain of containers enclosing the next item.
#[derive(Debug, Default)]
pub struct ScopeStack {
    open: Vec<(usize, Range<usize>)>,
}

impl ScopeStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Close every container that does not enclose `range`.
    pub fn enter(&mut self, range: &Range<usize>) {
        while let Some((_, top)) = self.open.last() {
            if top.start <= range.start && range.end <= top.end {
                break;
            }
            self.open.pop();
        }
    }

    pub fn push(&mut self, index: usize, range: Range<usize>) {
        self.open.push((index, range));
    }

    /// Innermost open container.
    pub fn innermost(&self) -> Option<usize> {
        self.open.last().map(|(index, _)| *index)
    }

    /// Innermost open container accepted by `pred`.
    pub fn innermost_where(&self, mut pred: impl FnMut(usize) -> bool) -> Option<usize> {
        self.open.iter().rev().map(|(index, _)| *index).find(|index| pred(*index))
    }
}
