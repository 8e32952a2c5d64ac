//! Deterministic location cycling.
//!
//! Wandering agents walk the location list in order and wrap around. No
//! randomness is involved, so a run replays identically.

/// The location after `current` in the cyclic order of `locations`.
///
/// - `current` not in the list: the first location.
/// - A single location, or an empty list: stay at `current`.
pub fn next_location<'a>(locations: &'a [String], current: &'a str) -> &'a str {
    let Some(first) = locations.first() else {
        return current;
    };
    let Some(idx) = locations.iter().position(|l| l == current) else {
        return first.as_str();
    };
    if locations.len() == 1 {
        return current;
    }
    let next = idx.checked_add(1).unwrap_or(0).checked_rem(locations.len()).unwrap_or(0);
    locations.get(next).map_or(current, String::as_str)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_locations() -> Vec<String> {
        vec!["spawn".to_owned(), "market".to_owned(), "workshop".to_owned()]
    }

    #[test]
    fn cycles_through_locations_and_wraps() {
        let locs = default_locations();
        assert_eq!(next_location(&locs, "spawn"), "market");
        assert_eq!(next_location(&locs, "market"), "workshop");
        assert_eq!(next_location(&locs, "workshop"), "spawn");
    }

    #[test]
    fn unknown_current_goes_to_first() {
        let locs = default_locations();
        assert_eq!(next_location(&locs, "moon"), "spawn");
    }

    #[test]
    fn single_location_stays() {
        let locs = vec!["spawn".to_owned()];
        assert_eq!(next_location(&locs, "spawn"), "spawn");
    }

    #[test]
    fn empty_list_stays() {
        assert_eq!(next_location(&[], "spawn"), "spawn");
    }
}
