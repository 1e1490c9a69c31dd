//! Client-side search over catalog data

use crate::types::{Route, Schedule, SearchParams};

/// Schedules whose route matches the search exactly, ignoring case and
/// surrounding whitespace
///
/// No fuzzy matching, ranking or paging; catalog order is kept. The date is
/// left to the backend query.
#[must_use]
pub fn filter_schedules(schedules: &[Schedule], params: &SearchParams) -> Vec<Schedule> {
    let origin = normalize(&params.origin);
    let destination = normalize(&params.destination);

    schedules
        .iter()
        .filter(|s| normalize(&s.route.origin) == origin && normalize(&s.route.destination) == destination)
        .cloned()
        .collect()
}

fn normalize(town: &str) -> String {
    town.trim().to_lowercase()
}

/// Distinct origins in first-seen order
#[must_use]
pub fn unique_origins(routes: &[Route]) -> Vec<String> {
    unique(routes.iter().map(|r| r.origin.as_str()))
}

/// Distinct destinations in first-seen order
#[must_use]
pub fn unique_destinations(routes: &[Route]) -> Vec<String> {
    unique(routes.iter().map(|r| r.destination.as_str()))
}

fn unique<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen: Vec<String> = Vec::new();
    for value in values {
        if !seen.iter().any(|s| s == value) {
            seen.push(value.to_string());
        }
    }
    seen
}
