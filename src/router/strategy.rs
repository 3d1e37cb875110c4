use log::{info, warn};

use crate::error::PatternConflict;

use super::regex::RegexMatcher;
use super::walk::TrieMatcher;
use super::{MatcherService, ParsedRoute};

type Compile = fn(&[ParsedRoute]) -> Result<MatcherService, PatternConflict>;

fn regex_strategy(routes: &[ParsedRoute]) -> Result<MatcherService, PatternConflict> {
    RegexMatcher::compile(routes).map(|matcher| Box::new(matcher) as MatcherService)
}

fn walk_strategy(routes: &[ParsedRoute]) -> Result<MatcherService, PatternConflict> {
    Ok(Box::new(TrieMatcher::compile(routes)))
}

/// Replays the full registration set into each candidate strategy in order
/// and binds the first one that accepts it. The binding is permanent: it
/// happens once, at build time, and the compiled matcher is immutable.
pub(crate) fn select(routes: &[ParsedRoute]) -> Result<MatcherService, Vec<PatternConflict>> {
    const CANDIDATES: &[Compile] = &[regex_strategy, walk_strategy];
    let mut conflicts = Vec::new();
    for compile in CANDIDATES {
        match compile(routes) {
            Ok(matcher) => {
                info!(
                    "selected the {} strategy for {} routes",
                    matcher.name(),
                    routes.len()
                );
                return Ok(matcher);
            }
            Err(conflict) => {
                warn!("strategy rejected the route set: {conflict}");
                conflicts.push(conflict);
            }
        }
    }
    Err(conflicts)
}
