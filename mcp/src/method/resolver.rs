//! Fuzzy method lookup over the registered method universe

use error_stack::Report;
use itertools::Itertools;
use tracing::debug;

use super::MatchLevels;
use super::MethodDescriptor;
use super::MethodInfo;
use super::match_level::compare_names;
use super::match_level::compare_parameters;
use crate::error::Error;
use crate::error::Result;
use crate::marshal::Reflector;

/// Levels a candidate reached per criterion, compared best-first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct Score {
    method_name: u8,
    parameters:  u8,
    type_name:   u8,
}

fn active(filter: Option<&str>) -> Option<&str> { filter.filter(|f| !f.trim().is_empty()) }

/// Levels of `method` against `descriptor`, `None` when a criterion falls below its minimum
fn score(
    method: &MethodInfo,
    descriptor: &MethodDescriptor,
    levels: MatchLevels,
    known_namespace: Option<&str>,
) -> Option<Score> {
    if let Some(known) = active(known_namespace)
        && method.namespace != known
    {
        return None;
    }
    if let Some(namespace) = active(descriptor.namespace.as_deref())
        && !method.namespace.eq_ignore_ascii_case(namespace.trim())
    {
        return None;
    }

    let type_name = match active(descriptor.type_name.as_deref()) {
        Some(filter) if levels.type_name_level > 0 => {
            let filter = filter.trim();
            let level = compare_names(method.declaring_type.as_str(), filter)
                .max(compare_names(&method.declaring_type.short_name(), filter));
            if level < levels.type_name_level {
                return None;
            }
            level
        },
        _ => 0,
    };

    let method_name = match active(descriptor.method_name.as_deref()) {
        Some(filter) if levels.method_name_level > 0 => {
            let level = compare_names(&method.name, filter.trim());
            if level < levels.method_name_level {
                return None;
            }
            level
        },
        _ => 0,
    };

    let parameters = match descriptor.parameters.as_deref() {
        Some(shapes) if levels.parameters_level > 0 => {
            let level = compare_parameters(&method.parameters, Some(shapes));
            if level < levels.parameters_level {
                return None;
            }
            level
        },
        _ => 0,
    };

    Some(Score {
        method_name,
        parameters,
        type_name,
    })
}

impl Reflector {
    fn ranked_methods(
        &self,
        descriptor: &MethodDescriptor,
        levels: MatchLevels,
        known_namespace: Option<&str>,
    ) -> Vec<(Score, &MethodInfo)> {
        let levels = levels.clamped();
        self.methods()
            .iter()
            .filter_map(|method| {
                score(method, descriptor, levels, known_namespace).map(|score| (score, method))
            })
            .sorted_by(|(a, _), (b, _)| b.cmp(a))
            .collect()
    }

    /// Every method meeting the requested levels, best match first
    ///
    /// Ties keep registration order.
    pub fn find_methods(
        &self,
        descriptor: &MethodDescriptor,
        levels: MatchLevels,
        known_namespace: Option<&str>,
    ) -> Vec<&MethodInfo> {
        let found: Vec<&MethodInfo> = self
            .ranked_methods(descriptor, levels, known_namespace)
            .into_iter()
            .map(|(_, method)| method)
            .collect();
        debug!(%descriptor, count = found.len(), "Method search");
        found
    }

    /// The single method a call should target
    ///
    /// Only the strongest matches are considered. Several of them are narrowed to those whose
    /// parameters fully match the descriptor's shapes; if that still leaves more than one the
    /// request is ambiguous. `Ok(None)` means nothing matched.
    pub fn resolve_method(
        &self,
        descriptor: &MethodDescriptor,
        levels: MatchLevels,
        known_namespace: Option<&str>,
    ) -> Result<Option<&MethodInfo>> {
        let ranked = self.ranked_methods(descriptor, levels, known_namespace);
        let Some((best, _)) = ranked.first().copied() else {
            return Ok(None);
        };
        let mut strongest: Vec<&MethodInfo> = ranked
            .into_iter()
            .take_while(|(score, _)| *score == best)
            .map(|(_, method)| method)
            .collect();

        if strongest.len() > 1
            && let Some(shapes) = descriptor.parameters.as_deref()
        {
            let exact: Vec<&MethodInfo> = strongest
                .iter()
                .copied()
                .filter(|method| compare_parameters(&method.parameters, Some(shapes)) == 2)
                .collect();
            if !exact.is_empty() {
                strongest = exact;
            }
        }

        match strongest.as_slice() {
            [only] => Ok(Some(*only)),
            candidates => Err(Report::new(Error::AmbiguousMatch {
                candidates: candidates.iter().map(|m| m.signature()).join("\n"),
            })),
        }
    }
}
