//! Graded name and parameter matching
//!
//! String levels, strongest last:
//!
//! | level | match |
//! |-------|-------|
//! | 0 | ignored |
//! | 1 | substring, case-insensitive |
//! | 2 | substring, case-sensitive |
//! | 3 | prefix, case-insensitive |
//! | 4 | prefix, case-sensitive |
//! | 5 | exact, case-insensitive |
//! | 6 | exact, case-sensitive |
//!
//! Parameter levels: 0 ignored, 1 same arity, 2 same arity with matching names and types.
//! Parameters with a declared default may be left out without breaking the arity.

use schemars::JsonSchema;
use serde::Deserialize;
use serde::Serialize;

use super::ParameterInfo;
use super::ParameterShape;

/// Strongest string match level
pub const MAX_NAME_LEVEL: u8 = 6;
/// Strongest parameter match level
pub const MAX_PARAMETER_LEVEL: u8 = 2;

/// Strength of the match between `candidate` and the requested `filter`
///
/// An empty filter matches nothing; callers skip the criterion instead.
pub fn compare_names(candidate: &str, filter: &str) -> u8 {
    if filter.is_empty() {
        return 0;
    }
    if candidate == filter {
        return 6;
    }
    let candidate_lower = candidate.to_lowercase();
    let filter_lower = filter.to_lowercase();
    if candidate_lower == filter_lower {
        5
    } else if candidate.starts_with(filter) {
        4
    } else if candidate_lower.starts_with(&filter_lower) {
        3
    } else if candidate.contains(filter) {
        2
    } else if candidate_lower.contains(&filter_lower) {
        1
    } else {
        0
    }
}

/// Strength of the match between declared `parameters` and the requested shapes
///
/// `None` means the caller did not describe parameters and matches nothing; callers skip the
/// criterion instead, as with an empty name filter. When every shape is named, shapes are matched
/// to parameters by name; otherwise by position. In both cases parameters left without a shape
/// must declare a default for the arity to line up. Named shapes that do not pair up still match
/// at level 1 when their count fits the arity. A shape without a name or type matches any name or
/// type.
pub fn compare_parameters(parameters: &[ParameterInfo], shapes: Option<&[ParameterShape]>) -> u8 {
    let Some(shapes) = shapes else {
        return 0;
    };
    let by_name = !shapes.is_empty() && shapes.iter().all(|shape| shape.name.is_some());
    let pairs: Option<Vec<(&ParameterInfo, &ParameterShape)>> = if by_name {
        shapes
            .iter()
            .map(|shape| {
                parameters
                    .iter()
                    .find(|p| shape.name.as_deref() == Some(p.name.as_str()))
                    .map(|p| (p, shape))
            })
            .collect()
    } else if shapes.len() <= parameters.len() {
        Some(parameters.iter().zip(shapes).collect())
    } else {
        None
    };
    let Some(pairs) = pairs else {
        return u8::from(arity_fits(parameters, shapes.len()));
    };

    let unsupplied_have_defaults = parameters
        .iter()
        .filter(|p| !pairs.iter().any(|(paired, _)| std::ptr::eq(*paired, *p)))
        .all(|p| p.default.is_some());
    if pairs.len() != shapes.len() || !unsupplied_have_defaults {
        return 0;
    }

    let same_shape = pairs.iter().all(|(parameter, shape)| {
        let name_matches = shape.name.as_deref().is_none_or(|name| name == parameter.name);
        let type_matches = shape
            .type_name
            .as_ref()
            .is_none_or(|type_name| parameter.type_name.matches(type_name.as_str()));
        name_matches && type_matches
    });
    if same_shape { 2 } else { 1 }
}

/// Whether `count` arguments fit between the required and the total parameter count
fn arity_fits(parameters: &[ParameterInfo], count: usize) -> bool {
    let required = parameters.iter().filter(|p| p.default.is_none()).count();
    (required..=parameters.len()).contains(&count)
}

/// Minimum match level required per criterion; `0` disables a criterion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct MatchLevels {
    /// Declaring type name level, 0 to 6
    pub type_name_level:   u8,
    /// Method name level, 0 to 6
    pub method_name_level: u8,
    /// Parameter level, 0 to 2
    pub parameters_level:  u8,
}

impl Default for MatchLevels {
    /// Levels used to find methods
    fn default() -> Self { Self::new(1, 1, 0) }
}

impl MatchLevels {
    /// Levels clamped to their valid ranges
    pub fn new(type_name_level: u8, method_name_level: u8, parameters_level: u8) -> Self {
        Self {
            type_name_level:   type_name_level.min(MAX_NAME_LEVEL),
            method_name_level: method_name_level.min(MAX_NAME_LEVEL),
            parameters_level:  parameters_level.min(MAX_PARAMETER_LEVEL),
        }
    }

    /// Levels used to call methods: parameters must line up
    pub fn for_call() -> Self { Self::new(1, 1, 2) }

    /// Same levels, clamped to their valid ranges
    #[must_use]
    pub fn clamped(self) -> Self {
        Self::new(self.type_name_level, self.method_name_level, self.parameters_level)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reflect::TypeName;

    fn parameter(name: &str, type_name: &str) -> ParameterInfo {
        ParameterInfo {
            name:      name.to_string(),
            type_name: TypeName::from(type_name),
            default:   None,
        }
    }

    #[test]
    fn test_name_levels() {
        assert_eq!(compare_names("LookAt", "LookAt"), 6);
        assert_eq!(compare_names("LookAt", "lookat"), 5);
        assert_eq!(compare_names("LookAtTarget", "Look"), 4);
        assert_eq!(compare_names("LookAtTarget", "look"), 3);
        assert_eq!(compare_names("SmoothLookAt", "LookAt"), 2);
        assert_eq!(compare_names("SmoothLookAt", "lookat"), 1);
        assert_eq!(compare_names("Translate", "lookat"), 0);
        assert_eq!(compare_names("Translate", ""), 0);
    }

    #[test]
    fn test_name_levels_are_monotonic() {
        let candidates = ["LookAt", "lookat", "LookAtTarget", "SmoothLookAt", "Translate"];
        let filters = ["LookAt", "look", "At", "t", "xyz"];
        for candidate in candidates {
            for filter in filters {
                let level = compare_names(candidate, filter);
                let accepted_at = |minimum: u8| level >= minimum;
                for minimum in 1..MAX_NAME_LEVEL {
                    assert!(
                        !accepted_at(minimum + 1) || accepted_at(minimum),
                        "{candidate} / {filter} accepted at {} but not at {minimum}",
                        minimum + 1
                    );
                }
            }
        }
    }

    #[test]
    fn test_parameter_levels() {
        let declared = [parameter("target", "scene::Vec3"), parameter("worldUp", "scene::Vec3")];
        let exact = [
            ParameterShape::new(Some("target"), Some("Vec3")),
            ParameterShape::new(Some("worldUp"), None),
        ];
        let arity_only = [
            ParameterShape::new(Some("target"), Some("scene::Transform")),
            ParameterShape::new(None, None),
        ];
        assert_eq!(compare_parameters(&declared, Some(&exact)), 2);
        assert_eq!(compare_parameters(&declared, Some(&arity_only)), 1);
        assert_eq!(compare_parameters(&declared, Some(&exact[..1])), 0);
        assert_eq!(compare_parameters(&declared, None), 0);
        assert_eq!(compare_parameters(&[], Some(&[])), 2);
    }

    #[test]
    fn test_defaults_relax_arity() {
        let mut world_up = parameter("worldUp", "scene::Vec3");
        world_up.default = Some(serde_json::json!({"x": 0.0, "y": 1.0, "z": 0.0}));
        let declared = [parameter("target", "scene::Vec3"), world_up];

        let positional = [ParameterShape::new(None, Some("Vec3"))];
        let named = [ParameterShape::new(Some("target"), None)];
        let unknown = [ParameterShape::new(Some("up"), None)];
        assert_eq!(compare_parameters(&declared, Some(&positional)), 2);
        assert_eq!(compare_parameters(&declared, Some(&named)), 2);
        assert_eq!(compare_parameters(&declared, Some(&unknown)), 1);
        assert_eq!(compare_parameters(&declared, Some(&[])), 0);
    }

    #[test]
    fn test_unpaired_names_fall_back_to_arity() {
        let declared = [parameter("a", "scene::Vec3"), parameter("b", "scene::Vec3")];
        let renamed = [ParameterShape::new(Some("p"), None), ParameterShape::new(Some("q"), None)];
        let too_many = [
            ParameterShape::new(Some("p"), None),
            ParameterShape::new(Some("q"), None),
            ParameterShape::new(Some("r"), None),
        ];
        assert_eq!(compare_parameters(&declared, Some(&renamed)), 1);
        assert_eq!(compare_parameters(&declared, Some(&renamed[..1])), 0);
        assert_eq!(compare_parameters(&declared, Some(&too_many)), 0);
    }

    #[test]
    fn test_levels_are_clamped() {
        let levels = MatchLevels::new(9, 7, 5);
        assert_eq!(levels, MatchLevels::new(6, 6, 2));
        assert_eq!(MatchLevels::default(), MatchLevels::new(1, 1, 0));
        assert_eq!(MatchLevels::for_call().parameters_level, 2);
    }
}
