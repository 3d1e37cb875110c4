use regex::escape;

use crate::error::PatternConflict;

use super::pattern::Segment;

/// The pattern prefix tree the regex strategy compiles from.
///
/// Literal edges are unrestricted; a node may host at most one dynamic
/// family (unconstrained capture, one specific constraint, or a tail
/// capture). A second family under the same prefix is a conflict the
/// caller turns into strategy fallback.
#[derive(Debug, Default)]
pub(crate) struct Trie {
    root: Node,
}

#[derive(Debug, Default)]
struct Node {
    edges: Vec<Edge>,
    terminals: Vec<usize>,
}

#[derive(Debug)]
struct Edge {
    kind: EdgeKind,
    node: Node,
}

#[derive(Debug, PartialEq, Eq)]
enum EdgeKind {
    Literal(String),
    Dynamic(Option<String>),
    Tail,
}

impl EdgeKind {
    fn is_literal(&self) -> bool {
        matches!(self, Self::Literal(_))
    }

    fn label(&self) -> String {
        match self {
            Self::Literal(text) => format!("'{text}'"),
            Self::Dynamic(None) => "one-segment capture".to_string(),
            Self::Dynamic(Some(constraint)) => {
                format!("capture constrained by {{{constraint}}}")
            }
            Self::Tail => "tail capture".to_string(),
        }
    }
}

/// One route ending somewhere in the tree, resolved to real capture-group
/// numbers of the composed expression.
#[derive(Debug)]
pub(crate) struct CompiledTerminal {
    /// Caller-side id handed to [`Trie::insert`].
    pub id: usize,
    /// Group number of the empty sentinel marking this pattern's branch.
    pub sentinel: usize,
    /// Group numbers of the dynamic segments along the branch, in order.
    pub captures: Vec<usize>,
}

#[derive(Debug)]
pub(crate) struct CompiledTrie {
    pub pattern: String,
    /// In alternation order; terminals sharing a node share a sentinel and
    /// sit consecutively.
    pub terminals: Vec<CompiledTerminal>,
}

impl Trie {
    pub fn insert(
        &mut self,
        segments: &[Segment],
        template: &str,
        id: usize,
    ) -> Result<(), PatternConflict> {
        let mut node = &mut self.root;
        for segment in segments {
            let kind = match segment {
                Segment::Literal(text) => EdgeKind::Literal(text.clone()),
                Segment::Param { constraint, .. } => EdgeKind::Dynamic(constraint.clone()),
                Segment::Wildcard => EdgeKind::Dynamic(None),
                Segment::Tail => EdgeKind::Tail,
            };
            node = node.child(kind, template, segment)?;
        }
        node.terminals.push(id);
        Ok(())
    }

    /// Flatten the tree into one anchored alternation. Group numbers are
    /// assigned with a running counter as the expression is emitted, so the
    /// sentinel and capture maps come out resolved.
    pub fn compile(&self) -> CompiledTrie {
        let mut pattern = String::from("^/");
        let mut groups = 0;
        let mut captures = Vec::new();
        let mut terminals = Vec::new();
        emit(&self.root, true, &mut pattern, &mut groups, &mut captures, &mut terminals);
        pattern.push('$');
        CompiledTrie { pattern, terminals }
    }
}

impl Node {
    fn child(
        &mut self,
        kind: EdgeKind,
        template: &str,
        segment: &Segment,
    ) -> Result<&mut Node, PatternConflict> {
        if let Some(position) = self.edges.iter().position(|edge| edge.kind == kind) {
            return Ok(&mut self.edges[position].node);
        }
        if !kind.is_literal() {
            if let Some(existing) = self.edges.iter().find(|edge| !edge.kind.is_literal()) {
                return Err(PatternConflict::new(
                    template,
                    format!(
                        "segment '{segment}' collides with the existing {} at the same position",
                        existing.kind.label()
                    ),
                ));
            }
        }
        self.edges.push(Edge {
            kind,
            node: Node::default(),
        });
        let position = self.edges.len() - 1;
        Ok(&mut self.edges[position].node)
    }
}

fn emit(
    node: &Node,
    at_root: bool,
    pattern: &mut String,
    groups: &mut usize,
    captures: &mut Vec<usize>,
    terminals: &mut Vec<CompiledTerminal>,
) {
    let alternatives = usize::from(!node.terminals.is_empty()) + node.edges.len();
    let wrap = alternatives > 1;
    if wrap {
        pattern.push_str("(?:");
    }
    let mut first = true;
    if !node.terminals.is_empty() {
        // A pattern ends here: an empty sentinel group marks the branch.
        *groups += 1;
        pattern.push_str("()");
        for &id in &node.terminals {
            terminals.push(CompiledTerminal {
                id,
                sentinel: *groups,
                captures: captures.clone(),
            });
        }
        first = false;
    }
    for edge in &node.edges {
        if !first {
            pattern.push('|');
        }
        first = false;
        if !at_root {
            pattern.push('/');
        }
        match &edge.kind {
            EdgeKind::Literal(text) => {
                pattern.push_str(&escape(text));
                emit(&edge.node, false, pattern, groups, captures, terminals);
            }
            EdgeKind::Dynamic(constraint) => {
                *groups += 1;
                let group = *groups;
                pattern.push('(');
                match constraint {
                    Some(constraint) => {
                        pattern.push_str(constraint);
                        // Capture groups inside an inline constraint shift
                        // the numbering of everything emitted after it.
                        *groups += count_capture_groups(constraint);
                    }
                    None => pattern.push_str("[^/]+"),
                }
                pattern.push(')');
                captures.push(group);
                emit(&edge.node, false, pattern, groups, captures, terminals);
                captures.pop();
            }
            EdgeKind::Tail => {
                *groups += 1;
                let group = *groups;
                pattern.push_str("(.+)");
                captures.push(group);
                emit(&edge.node, false, pattern, groups, captures, terminals);
                captures.pop();
            }
        }
    }
    if wrap {
        pattern.push(')');
    }
}

fn count_capture_groups(pattern: &str) -> usize {
    let mut count = 0;
    let mut in_class = false;
    let mut chars = pattern.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                chars.next();
            }
            '[' if !in_class => in_class = true,
            ']' if in_class => in_class = false,
            '(' if !in_class => {
                if chars.peek() != Some(&'?') {
                    count += 1;
                }
            }
            _ => {}
        }
    }
    count
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use crate::router::pattern::parse;

    use super::*;

    fn insert(trie: &mut Trie, template: &str, id: usize) -> Result<(), PatternConflict> {
        let variants = parse(template).unwrap();
        for segments in &variants {
            trie.insert(segments, template, id)?;
        }
        Ok(())
    }

    #[test]
    fn merges_shared_prefixes_into_one_alternation() {
        let mut trie = Trie::default();
        insert(&mut trie, "/a/:id", 0).unwrap();
        insert(&mut trie, "/a/fixed", 1).unwrap();
        let compiled = trie.compile();
        assert_eq!(compiled.pattern, "^/a(?:/([^/]+)()|/fixed())$");
        assert_eq!(compiled.terminals.len(), 2);
        assert_eq!(compiled.terminals[0].captures, vec![1]);
        assert_eq!(compiled.terminals[0].sentinel, 2);
        assert_eq!(compiled.terminals[1].captures, Vec::<usize>::new());
        assert_eq!(compiled.terminals[1].sentinel, 3);
    }

    #[test]
    fn same_constraint_shares_a_node_and_different_constraints_conflict() {
        let mut trie = Trie::default();
        insert(&mut trie, "/a/:x{[0-9]+}/one", 0).unwrap();
        insert(&mut trie, "/a/:y{[0-9]+}/two", 1).unwrap();
        let conflict = insert(&mut trie, "/a/:z{[a-z]+}", 2).unwrap_err();
        assert_eq!(conflict.template, "/a/:z{[a-z]+}");
        assert!(conflict.reason.contains("collides"));
    }

    #[test]
    fn unconstrained_capture_conflicts_with_tail() {
        let mut trie = Trie::default();
        insert(&mut trie, "/files/:name", 0).unwrap();
        let conflict = insert(&mut trie, "/files/*", 1).unwrap_err();
        assert!(conflict.reason.contains("one-segment capture"));
    }

    #[test]
    fn counts_only_capturing_groups_in_constraints() {
        assert_eq!(count_capture_groups("[0-9]+"), 0);
        assert_eq!(count_capture_groups("(a|b)(?:c)"), 1);
        assert_eq!(count_capture_groups(r"\((a)"), 1);
        assert_eq!(count_capture_groups("[(]a"), 0);
    }

    #[test]
    fn root_terminal_matches_the_bare_slash() {
        let mut trie = Trie::default();
        insert(&mut trie, "/", 0).unwrap();
        insert(&mut trie, "/shop", 1).unwrap();
        let compiled = trie.compile();
        assert_eq!(compiled.pattern, "^/(?:()|shop())$");
    }
}
