use crate::domain::CoordinateKey;

/// Human readable name for a coordinate, keyed by the rounded coordinate it was resolved for.
#[derive(Clone, Debug, PartialEq)]
pub struct PlaceLabel {
    pub coordinate: CoordinateKey,
    pub name: String,
    pub placeholder: bool,
}

impl PlaceLabel {
    pub fn new(coordinate: CoordinateKey, name: impl Into<String>) -> Self {
        PlaceLabel {
            coordinate,
            name: name.into(),
            placeholder: false,
        }
    }

    /// A label substituted when the place could not be resolved.
    pub fn placeholder(coordinate: CoordinateKey, name: impl Into<String>) -> Self {
        PlaceLabel {
            coordinate,
            name: name.into(),
            placeholder: true,
        }
    }

    /// Two resolved labels denote the same place when their display names match, regardless of the cell they were
    /// resolved for. A placeholder says nothing about the place, so it only matches a label of the same cell.
    pub fn same_place(&self, other: &PlaceLabel) -> bool {
        if self.placeholder || other.placeholder {
            return self.placeholder == other.placeholder && self.coordinate == other.coordinate;
        }
        self.name == other.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::GeoLocation;

    fn key(latitude: f64, longitude: f64) -> CoordinateKey {
        CoordinateKey::from_location(&GeoLocation::new(latitude, longitude), 75.0)
    }

    #[test]
    fn resolved_labels_match_by_name() {
        let dam = PlaceLabel::new(key(52.3731, 4.8922), "Dam 1, Amsterdam");
        let same_street = PlaceLabel::new(key(52.3741, 4.8932), "Dam 1, Amsterdam");

        assert!(dam.same_place(&same_street));
        assert!(!dam.same_place(&PlaceLabel::new(key(52.3731, 4.8922), "Dam 2, Amsterdam")));
    }

    #[test]
    fn placeholders_only_match_within_their_cell() {
        let paris = PlaceLabel::placeholder(key(48.8584, 2.2945), "Unknown location");
        let london = PlaceLabel::placeholder(key(51.5007, -0.1246), "Unknown location");

        assert!(paris.same_place(&paris.clone()));
        assert!(!paris.same_place(&london));
    }

    #[test]
    fn a_placeholder_never_matches_a_resolved_label_with_the_same_name() {
        let unknown = PlaceLabel::placeholder(key(48.8584, 2.2945), "Unknown location");
        let resolved = PlaceLabel::new(key(48.8584, 2.2945), "Unknown location");

        assert!(!unknown.same_place(&resolved));
    }
}
