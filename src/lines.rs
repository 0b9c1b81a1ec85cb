pub(crate) struct LineResolver<'a> {
    source: &'a str,
    lines: Vec<usize>,
}

impl<'a> LineResolver<'a> {
    pub fn new(source: &'a str) -> Self {
        let lines = source
            .match_indices('\n')
            .map(|(index, _)| index + 1)
            .collect();
        LineResolver { source, lines }
    }

    /// Returns the zero-based line and column of a byte offset. Columns count characters, not bytes.
    pub fn resolve(&self, offset: usize) -> (usize, usize) {
        let offset = offset.min(self.source.len());
        let (line, line_start) = match self.lines.binary_search(&offset) {
            Ok(index) => (index + 1, offset),
            Err(0) => (0, 0),
            Err(index) => (index, self.lines[index - 1]),
        };

        let column = match self.source.get(line_start..offset) {
            Some(prefix) => prefix.chars().count(),
            None => offset - line_start,
        };
        (line, column)
    }
}

#[test]
fn resolve_line_number() {
    let resolver = LineResolver::new("hello\nworld\nfoo");

    assert_eq!(resolver.resolve(0), (0, 0));
    assert_eq!(resolver.resolve(4), (0, 4));
    assert_eq!(resolver.resolve(5), (0, 5));
    assert_eq!(resolver.resolve(6), (1, 0));
    assert_eq!(resolver.resolve(7), (1, 1));
    assert_eq!(resolver.resolve(10), (1, 4));
    assert_eq!(resolver.resolve(11), (1, 5));
    assert_eq!(resolver.resolve(12), (2, 0));
    assert_eq!(resolver.resolve(13), (2, 1));
    assert_eq!(resolver.resolve(15), (2, 3));
    assert_eq!(resolver.resolve(100), (2, 3));
}

#[test]
fn resolve_multibyte_column() {
    let resolver = LineResolver::new("// 😀😀\nx");

    assert_eq!(resolver.resolve(11), (0, 5));
    assert_eq!(resolver.resolve(12), (1, 0));
}
