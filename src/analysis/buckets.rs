//! Mode bucketing: fine transport-mode labels to display buckets.

use crate::models::TOTAL_MODE;
use std::collections::BTreeMap;

pub const DROVE_ALONE: &str = "Drove alone";
pub const CARPOOLED: &str = "Carpooled";
pub const PUBLIC_TRANSIT: &str = "Public transit";
pub const WORKED_FROM_HOME: &str = "Worked from home";
pub const OTHER: &str = "Other";

/// Built-in raw label → bucket entries.
const DEFAULT_BUCKETS: &[(&str, &str)] = &[
    ("Total, means of transportation", TOTAL_MODE),
    ("Car, truck, or van -- Drove alone", DROVE_ALONE),
    ("Car, truck, or van -- In a 2-person carpool", CARPOOLED),
    ("Car, truck, or van -- In a 3-person carpool", CARPOOLED),
    ("Car, truck, or van -- In a 3-or-more-person carpool", CARPOOLED),
    ("Car, truck, or van -- In a 4-person carpool", CARPOOLED),
    ("Car, truck, or van -- In a 5-or-6-person carpool", CARPOOLED),
    ("Car, truck, or van -- In a 7-or-more-person carpool", CARPOOLED),
    ("Bus or trolley bus", PUBLIC_TRANSIT),
    ("Streetcar or trolley car", PUBLIC_TRANSIT),
    ("Subway or elevated", PUBLIC_TRANSIT),
    ("Railroad", PUBLIC_TRANSIT),
    ("Ferryboat", PUBLIC_TRANSIT),
    ("Taxicab", OTHER),
    ("Motorcycle", OTHER),
    ("Other method", OTHER),
    ("Taxicab, motorcycle, or other method", OTHER),
    ("Worked at home", WORKED_FROM_HOME),
];

/// Many-to-one mapping from raw mode labels to display buckets.
///
/// Labels without an entry map to themselves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModeBuckets {
    map: BTreeMap<String, String>,
}

impl Default for ModeBuckets {
    fn default() -> Self {
        Self {
            map: DEFAULT_BUCKETS
                .iter()
                .map(|(raw, bucket)| (raw.to_string(), bucket.to_string()))
                .collect(),
        }
    }
}

impl ModeBuckets {
    /// Built-in mapping with extra entries layered on top.
    pub fn with_overrides(overrides: &BTreeMap<String, String>) -> Self {
        let mut buckets = Self::default();
        for (raw, bucket) in overrides {
            buckets.insert(raw, bucket);
        }
        buckets
    }

    pub fn insert(&mut self, raw: &str, bucket: &str) {
        self.map.insert(raw.to_string(), bucket.to_string());
    }

    /// Bucket for a raw label, or the label itself if unmapped.
    pub fn bucket<'a>(&'a self, raw: &'a str) -> &'a str {
        self.map.get(raw).map(String::as_str).unwrap_or(raw)
    }
}

/// Stacking order for mode buckets in the bar chart.
///
/// Keeps the incoming order but moves "Carpooled" directly after
/// "Drove alone" so the two car modes sit next to each other.
pub fn stacking_order(modes: &[String]) -> Vec<String> {
    let mut order: Vec<String> = modes.iter().filter(|m| *m != CARPOOLED).cloned().collect();

    if modes.iter().any(|m| m == CARPOOLED) {
        match order.iter().position(|m| m == DROVE_ALONE) {
            Some(pos) => order.insert(pos + 1, CARPOOLED.to_string()),
            None => order.insert(0, CARPOOLED.to_string()),
        }
    }

    order
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_carpool_labels_collapse() {
        let buckets = ModeBuckets::default();
        assert_eq!(buckets.bucket("Car, truck, or van -- In a 2-person carpool"), CARPOOLED);
        assert_eq!(
            buckets.bucket("Car, truck, or van -- In a 3-or-more-person carpool"),
            CARPOOLED
        );
        assert_eq!(buckets.bucket("Total, means of transportation"), TOTAL_MODE);
    }

    #[test]
    fn test_unmapped_labels_pass_through() {
        let buckets = ModeBuckets::default();
        assert_eq!(buckets.bucket("Walked"), "Walked");
        assert_eq!(buckets.bucket("Hovercraft"), "Hovercraft");
    }

    #[test]
    fn test_mapping_is_total() {
        let buckets = ModeBuckets::default();
        let observed = [
            "Car, truck, or van -- Drove alone",
            "Bicycle",
            "Walked",
            "Ferryboat",
            "Something new",
        ];
        for raw in observed {
            let bucket = buckets.bucket(raw);
            assert!(!bucket.is_empty());
            assert!(bucket == raw || DEFAULT_BUCKETS.iter().any(|(r, b)| *r == raw && *b == bucket));
        }
    }

    #[test]
    fn test_overrides() {
        let mut overrides = BTreeMap::new();
        overrides.insert("Bicycle".to_string(), "Active".to_string());
        overrides.insert("Railroad".to_string(), "Commuter rail".to_string());
        let buckets = ModeBuckets::with_overrides(&overrides);
        assert_eq!(buckets.bucket("Bicycle"), "Active");
        assert_eq!(buckets.bucket("Railroad"), "Commuter rail");
        assert_eq!(buckets.bucket("Subway or elevated"), PUBLIC_TRANSIT);
        assert_eq!(buckets.map.len(), DEFAULT_BUCKETS.len() + 1);
    }

    #[test]
    fn test_stacking_order_adjacent_car_modes() {
        let modes: Vec<String> = ["Carpooled", "Walked", "Drove alone", "Public transit"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let order = stacking_order(&modes);
        assert_eq!(order, vec!["Walked", "Drove alone", "Carpooled", "Public transit"]);
    }

    #[test]
    fn test_stacking_order_without_car_modes() {
        let modes = vec!["Walked".to_string(), "Bicycle".to_string()];
        assert_eq!(stacking_order(&modes), modes);
    }
}
