//! The unit registry: a fixed, ordered catalog of analysis units.
//!
//! Every report runs the full catalog. The order of the catalog is the order
//! in which the dispatcher announces units and in which the consumer seeds
//! its state, so it is also the order the presentation layer lists them.
//!
//! Display hints (`icon`, `accent`) are opaque to the dispatcher and the
//! consumer; only the presentation layer interprets them.
//!
//! # Built-in units
//!
//! Six units. Each renders its primary chart from `vizData` and fills
//! further widgets (see [`widgets_for`](crate::extract::widgets_for)).
//!
//! | Id | Primary viz |
//! |----|-------------|
//! | `market` | `scoreCard` |
//! | `competition` | `radarChart` |
//! | `customer` | `progressList` |
//! | `business_model` | `barChart` |
//! | `risks` | `gauge` |
//! | `gtm` | `timeline` |

use serde::Serialize;

use crate::viz::VizType;

/// Presentation-only attributes of a unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DisplayHints {
    pub icon: String,
    pub accent: String,
}

/// One registry entry. Immutable once the registry is built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnitDescriptor {
    pub id: String,
    pub label: String,
    pub description: String,
    pub viz_hint: VizType,
    pub display: DisplayHints,
}

impl UnitDescriptor {
    pub fn new(
        id: impl Into<String>,
        label: impl Into<String>,
        description: impl Into<String>,
        viz_hint: VizType,
    ) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            description: description.into(),
            viz_hint,
            display: DisplayHints {
                icon: String::new(),
                accent: "slate".to_string(),
            },
        }
    }

    pub fn with_display(mut self, icon: &str, accent: &str) -> Self {
        self.display = DisplayHints {
            icon: icon.to_string(),
            accent: accent.to_string(),
        };
        self
    }
}

/// (id, label, description, viz hint, icon, accent)
type BuiltinUnit = (
    &'static str,
    &'static str,
    &'static str,
    VizType,
    &'static str,
    &'static str,
);

const BUILTIN_UNITS: &[BuiltinUnit] = &[
    (
        "market",
        "Market Opportunity",
        "Assesses total addressable market, growth trends, and timing",
        VizType::ScoreCard,
        "📈",
        "blue",
    ),
    (
        "competition",
        "Competitive Landscape",
        "Maps existing players, moats, and differentiation angles",
        VizType::RadarChart,
        "⚔️",
        "purple",
    ),
    (
        "customer",
        "Target Customer",
        "Defines ICP, pain points, and willingness to pay",
        VizType::ProgressList,
        "🎯",
        "rose",
    ),
    (
        "business_model",
        "Business Model",
        "Evaluates revenue model, unit economics, and scalability",
        VizType::BarChart,
        "💰",
        "emerald",
    ),
    (
        "risks",
        "Risk Analysis",
        "Identifies execution, market, regulatory, and tech risks",
        VizType::Gauge,
        "⚠️",
        "amber",
    ),
    (
        "gtm",
        "Go-to-Market",
        "Suggests acquisition channels, launch strategy, and positioning",
        VizType::Timeline,
        "🚀",
        "indigo",
    ),
];

/// Ordered, read-only catalog of units. Share it behind an `Arc`.
///
/// # Example
///
/// ```rust
/// use venture_validator::registry::UnitRegistry;
///
/// let registry = UnitRegistry::builtin();
/// assert_eq!(registry.len(), 6);
/// assert_eq!(registry.units()[0].id, "market");
/// ```
#[derive(Debug, Clone, Default)]
pub struct UnitRegistry {
    units: Vec<UnitDescriptor>,
}

impl UnitRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self { units: Vec::new() }
    }

    /// The built-in six-unit catalog.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        for (id, label, description, viz_hint, icon, accent) in BUILTIN_UNITS {
            registry.register(
                UnitDescriptor::new(*id, *label, *description, *viz_hint)
                    .with_display(icon, accent),
            );
        }
        registry
    }

    /// Append a unit. A unit whose id is already registered replaces the
    /// existing entry in place, keeping ids unique and order stable.
    pub fn register(&mut self, unit: UnitDescriptor) {
        match self.units.iter_mut().find(|u| u.id == unit.id) {
            Some(existing) => *existing = unit,
            None => self.units.push(unit),
        }
    }

    pub fn units(&self) -> &[UnitDescriptor] {
        &self.units
    }

    pub fn find(&self, id: &str) -> Option<&UnitDescriptor> {
        self.units.iter().find(|u| u.id == id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.units.iter().map(|u| u.id.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn builtin_ids_are_unique_and_ordered() {
        let registry = UnitRegistry::builtin();
        let ids: Vec<&str> = registry.ids().collect();
        let unique: HashSet<&str> = ids.iter().copied().collect();
        assert_eq!(ids.len(), unique.len());
        assert_eq!(ids.first(), Some(&"market"));
        assert_eq!(ids.last(), Some(&"gtm"));
    }

    #[test]
    fn builtin_hint_is_the_primary_widget() {
        let registry = UnitRegistry::builtin();
        assert_eq!(registry.len(), 6);
        for unit in registry.units() {
            let primary = crate::extract::widgets_for(&unit.id)
                .and_then(|w| w.first())
                .unwrap_or_else(|| panic!("{} has no widgets", unit.id));
            assert_eq!(primary.viz_type, unit.viz_hint, "unit {}", unit.id);
        }
    }

    #[test]
    fn register_replaces_duplicate_id_in_place() {
        let mut registry = UnitRegistry::new();
        registry.register(UnitDescriptor::new("a", "A", "first", VizType::Gauge));
        registry.register(UnitDescriptor::new("b", "B", "second", VizType::Donut));
        registry.register(UnitDescriptor::new("a", "A2", "replaced", VizType::Gauge));
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.units()[0].label, "A2");
        assert_eq!(registry.find("b").map(|u| u.viz_hint), Some(VizType::Donut));
        assert!(registry.find("zzz").is_none());
    }

    #[test]
    fn descriptor_serializes_camel_case() {
        let unit = UnitDescriptor::new("risks", "Risk Analysis", "desc", VizType::Gauge)
            .with_display("⚠️", "amber");
        let v = serde_json::to_value(&unit).unwrap();
        assert_eq!(v["vizHint"], "gauge");
        assert_eq!(v["display"]["accent"], "amber");
    }
}
