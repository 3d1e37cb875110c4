use std::collections::HashMap;
use std::sync::Arc;

use http::Method;
use regex::Regex;

use crate::context::Params;
use crate::handler::HandlerService;

use super::pattern::{anchored, split_path, Segment};
use super::{method_tables, MatchResult, Matcher, ParsedRoute, RouteMatch};

/// The universal fallback strategy: a segment-by-segment tree walk with no
/// single-regex compilation.
///
/// A node holds an ordered list of dynamic edges rather than a single
/// family, so any pattern set is accepted; the walk simply explores every
/// viable edge and gathers all reachable terminals.
pub(crate) struct TrieMatcher {
    tables: HashMap<Method, WalkTable>,
    fallback: WalkTable,
}

struct WalkTable {
    root: WalkNode,
}

#[derive(Default)]
struct WalkNode {
    edges: Vec<WalkEdge>,
    terminals: Vec<Terminal>,
}

struct WalkEdge {
    kind: WalkEdgeKind,
    node: WalkNode,
}

enum WalkEdgeKind {
    Literal(String),
    Dynamic {
        binds: Option<String>,
        constraint: Option<Constraint>,
    },
    Tail,
}

struct Constraint {
    source: String,
    regex: Regex,
}

struct Terminal {
    order: usize,
    chain: Arc<[HandlerService]>,
}

impl TrieMatcher {
    pub fn compile(routes: &[ParsedRoute]) -> Self {
        let grouped = method_tables(routes);
        let tables = grouped
            .tables
            .into_iter()
            .map(|(method, routes)| (method, WalkTable::build(&routes)))
            .collect();
        let fallback = WalkTable::build(&grouped.fallback);
        Self { tables, fallback }
    }
}

impl Matcher for TrieMatcher {
    fn find(&self, method: &Method, path: &str) -> MatchResult {
        self.tables
            .get(method)
            .unwrap_or(&self.fallback)
            .search(path)
    }

    fn name(&self) -> &'static str {
        "trie"
    }
}

impl WalkTable {
    fn build(routes: &[&ParsedRoute]) -> Self {
        let mut root = WalkNode::default();
        for route in routes {
            for segments in &route.variants {
                root.insert(segments, route);
            }
        }
        Self { root }
    }

    /// Walks the path, tracking a frontier of candidate nodes with the
    /// bindings collected on the way to each. Tail edges are terminal-only
    /// in this grammar, so they yield their matches immediately instead of
    /// re-entering the frontier.
    fn search(&self, path: &str) -> MatchResult {
        let segments = split_path(path);
        let mut matches: Vec<RouteMatch> = Vec::new();
        let mut frontier: Vec<(&WalkNode, Params)> = vec![(&self.root, Params::new())];
        for (depth, segment) in segments.iter().enumerate() {
            let mut advanced = Vec::new();
            for (node, params) in &frontier {
                for edge in &node.edges {
                    match &edge.kind {
                        WalkEdgeKind::Literal(text) => {
                            if text == segment {
                                advanced.push((&edge.node, params.clone()));
                            }
                        }
                        WalkEdgeKind::Dynamic { binds, constraint } => {
                            let allowed = constraint
                                .as_ref()
                                .map_or(true, |c| c.regex.is_match(segment));
                            if allowed {
                                let mut params = params.clone();
                                if let Some(name) = binds {
                                    params.push(name.clone(), *segment);
                                }
                                advanced.push((&edge.node, params));
                            }
                        }
                        WalkEdgeKind::Tail => {
                            let mut params = params.clone();
                            params.push("*", segments[depth..].join("/"));
                            collect(&edge.node, &params, &mut matches);
                        }
                    }
                }
            }
            frontier = advanced;
            if frontier.is_empty() {
                break;
            }
        }
        for (node, params) in &frontier {
            collect(node, params, &mut matches);
        }
        matches.sort_by_key(|matched| matched.order);
        matches
    }
}

fn collect(node: &WalkNode, params: &Params, matches: &mut Vec<RouteMatch>) {
    for terminal in &node.terminals {
        matches.push(RouteMatch {
            order: terminal.order,
            chain: terminal.chain.clone(),
            params: params.clone(),
        });
    }
}

impl WalkNode {
    fn insert(&mut self, segments: &[Segment], route: &ParsedRoute) {
        match segments.split_first() {
            None => self.terminals.push(Terminal {
                order: route.order,
                chain: route.chain.clone(),
            }),
            Some((segment, rest)) => {
                let index = self.edge_for(segment);
                self.edges[index].node.insert(rest, route);
            }
        }
    }

    /// Edges merge only when they are indistinguishable (same literal, or
    /// same binding name and constraint); otherwise a new edge is appended
    /// in registration order.
    fn edge_for(&mut self, segment: &Segment) -> usize {
        if let Some(position) = self.edges.iter().position(|edge| edge.kind.covers(segment)) {
            return position;
        }
        self.edges.push(WalkEdge {
            kind: WalkEdgeKind::from_segment(segment),
            node: WalkNode::default(),
        });
        self.edges.len() - 1
    }
}

impl WalkEdgeKind {
    fn from_segment(segment: &Segment) -> Self {
        match segment {
            Segment::Literal(text) => Self::Literal(text.clone()),
            Segment::Param { name, constraint } => Self::Dynamic {
                binds: Some(name.clone()),
                constraint: constraint.clone().and_then(|source| {
                    Regex::new(&anchored(&source))
                        .ok()
                        .map(|regex| Constraint { source, regex })
                }),
            },
            Segment::Wildcard => Self::Dynamic {
                binds: None,
                constraint: None,
            },
            Segment::Tail => Self::Tail,
        }
    }

    fn covers(&self, segment: &Segment) -> bool {
        match (self, segment) {
            (Self::Literal(text), Segment::Literal(other)) => text == other,
            (
                Self::Dynamic { binds, constraint },
                Segment::Param {
                    name,
                    constraint: other,
                },
            ) => {
                binds.as_deref() == Some(name.as_str())
                    && constraint.as_ref().map(|c| c.source.as_str()) == other.as_deref()
            }
            (
                Self::Dynamic {
                    binds: None,
                    constraint: None,
                },
                Segment::Wildcard,
            ) => true,
            (Self::Tail, Segment::Tail) => true,
            _ => false,
        }
    }
}
