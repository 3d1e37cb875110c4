use std::collections::HashMap;
use std::sync::Arc;

use http::Method;
use regex::Regex;

use crate::context::Params;
use crate::error::PatternConflict;
use crate::handler::HandlerService;

use super::pattern::normalize;
use super::trie::{CompiledTerminal, Trie};
use super::{
    capture_names, method_tables, static_path, MatchResult, Matcher, ParsedRoute, RouteMatch,
};

/// The primary matcher strategy: each method table is compiled into one
/// anchored alternation plus a literal-path shortcut map.
///
/// Rejects route sets whose patterns cannot be merged into one alternation
/// (two different dynamic families under the same prefix).
pub(crate) struct RegexMatcher {
    tables: HashMap<Method, Table>,
    fallback: Table,
}

struct Record {
    order: usize,
    chain: Arc<[HandlerService]>,
    names: Vec<Option<String>>,
    static_path: Option<String>,
}

struct Table {
    records: Vec<Record>,
    statics: HashMap<String, MatchResult>,
    regex: Option<Regex>,
    terminals: Vec<CompiledTerminal>,
}

impl RegexMatcher {
    pub fn compile(routes: &[ParsedRoute]) -> Result<Self, PatternConflict> {
        let grouped = method_tables(routes);
        let mut tables = HashMap::new();
        for (method, routes) in grouped.tables {
            tables.insert(method, Table::compile(&routes)?);
        }
        let fallback = Table::compile(&grouped.fallback)?;
        Ok(Self { tables, fallback })
    }
}

impl Matcher for RegexMatcher {
    fn find(&self, method: &Method, path: &str) -> MatchResult {
        self.tables
            .get(method)
            .unwrap_or(&self.fallback)
            .find(path)
    }

    fn name(&self) -> &'static str {
        "regex"
    }
}

impl Table {
    fn compile(routes: &[&ParsedRoute]) -> Result<Self, PatternConflict> {
        let mut records = Vec::new();
        let mut trie = Trie::default();
        for route in routes {
            for segments in &route.variants {
                trie.insert(segments, &route.template, records.len())?;
                records.push(Record {
                    order: route.order,
                    chain: route.chain.clone(),
                    names: capture_names(segments),
                    static_path: static_path(segments),
                });
            }
        }
        let compiled = trie.compile();
        let regex = if compiled.terminals.is_empty() {
            None
        } else {
            Some(Regex::new(&compiled.pattern).map_err(|e| {
                PatternConflict::new(
                    &compiled.pattern,
                    format!("route set is not representable as one alternation: {e}"),
                )
            })?)
        };
        let mut table = Self {
            records,
            statics: HashMap::new(),
            regex,
            terminals: compiled.terminals,
        };
        // Fully static paths are resolved once, at build time, through the
        // same alternation, so the shortcut cannot disagree with it on
        // priority.
        let paths: Vec<String> = table
            .records
            .iter()
            .filter_map(|record| record.static_path.clone())
            .collect();
        for path in paths {
            let result = table.find_compiled(&path);
            if !result.is_empty() {
                table.statics.insert(path, result);
            }
        }
        Ok(table)
    }

    fn find(&self, path: &str) -> MatchResult {
        let normalized = normalize(path);
        if let Some(result) = self.statics.get(&normalized) {
            return result.clone();
        }
        self.find_compiled(&normalized)
    }

    /// Runs the alternation and resolves the participating sentinel group to
    /// its routes and bindings. Exactly one branch of the anchored
    /// alternation matches, so exactly one sentinel participates.
    fn find_compiled(&self, path: &str) -> MatchResult {
        let captures = match self.regex.as_ref().and_then(|regex| regex.captures(path)) {
            Some(captures) => captures,
            None => return Vec::new(),
        };
        let mut result = Vec::new();
        let mut winner = None;
        for terminal in &self.terminals {
            match winner {
                Some(sentinel) => {
                    // Terminals sharing the winning node sit consecutively.
                    if terminal.sentinel != sentinel {
                        break;
                    }
                }
                None => {
                    if captures.get(terminal.sentinel).is_none() {
                        continue;
                    }
                    winner = Some(terminal.sentinel);
                }
            }
            let record = &self.records[terminal.id];
            let mut params = Params::new();
            for (group, name) in terminal.captures.iter().zip(&record.names) {
                if let (Some(value), Some(name)) = (captures.get(*group), name) {
                    params.push(name.clone(), value.as_str());
                }
            }
            result.push(RouteMatch {
                order: record.order,
                chain: record.chain.clone(),
                params,
            });
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use crate::handler::{handler_fn, HandlerService};
    use crate::router::pattern::parse;
    use crate::router::RouteMethod;

    use super::*;

    fn noop() -> HandlerService {
        handler_fn(|_ctx, _next| Box::pin(async { Ok(()) }))
    }

    fn routes(templates: &[(&str, RouteMethod)]) -> Vec<ParsedRoute> {
        templates
            .iter()
            .enumerate()
            .map(|(order, (template, method))| ParsedRoute {
                order,
                method: method.clone(),
                template: template.to_string(),
                variants: parse(template).unwrap(),
                chain: vec![noop()].into(),
            })
            .collect()
    }

    fn get(template: &str) -> (&str, RouteMethod) {
        (template, RouteMethod::Only(Method::GET))
    }

    #[test]
    fn static_paths_take_the_shortcut() {
        let routes = routes(&[get("/shop/items"), get("/shop/:section")]);
        let matcher = RegexMatcher::compile(&routes).unwrap();
        let result = matcher.find(&Method::GET, "/shop/items");
        assert_eq!(result.len(), 1);
        // Registered first, so the static path resolves to the static route.
        assert_eq!(result[0].order, 0);
        assert!(result[0].params.is_empty());
    }

    #[test]
    fn shortcut_respects_registration_priority() {
        let routes = routes(&[get("/shop/:section"), get("/shop/items")]);
        let matcher = RegexMatcher::compile(&routes).unwrap();
        let result = matcher.find(&Method::GET, "/shop/items");
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].order, 0);
        assert_eq!(result[0].params.get("section"), Some("items"));
    }

    #[test]
    fn binds_parameters_by_name() {
        let routes = routes(&[get("/shop/:category/items/:id{[0-9]+}")]);
        let matcher = RegexMatcher::compile(&routes).unwrap();
        let result = matcher.find(&Method::GET, "/shop/books/items/42");
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].params.get("category"), Some("books"));
        assert_eq!(result[0].params.get("id"), Some("42"));
        assert!(matcher.find(&Method::GET, "/shop/books/items/none").is_empty());
    }

    #[test]
    fn tail_captures_the_remainder() {
        let routes = routes(&[get("/files/*")]);
        let matcher = RegexMatcher::compile(&routes).unwrap();
        let result = matcher.find(&Method::GET, "/files/a/b/c");
        assert_eq!(result[0].params.get("*"), Some("a/b/c"));
        assert!(matcher.find(&Method::GET, "/files").is_empty());
    }

    #[test]
    fn any_routes_merge_into_every_method_table() {
        let all = routes(&[("/shop", RouteMethod::Any), get("/shop")]);
        let matcher = RegexMatcher::compile(&all).unwrap();
        let result = matcher.find(&Method::GET, "/shop");
        assert_eq!(result.len(), 2);
        assert_eq!(result[0].order, 0);
        assert_eq!(result[1].order, 1);
        // Unregistered methods still see the Any table.
        let result = matcher.find(&Method::DELETE, "/shop");
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].order, 0);
    }

    #[test]
    fn conflicting_families_are_rejected() {
        let routes = routes(&[get("/a/:x"), get("/a/:y{[0-9]+}")]);
        assert!(RegexMatcher::compile(&routes).is_err());
    }
}
