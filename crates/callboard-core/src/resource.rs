// Resource bucketing for conflict checks
//
// A bucket is one physically exclusive resource: a named venue area, or the
// venue's labelled space ("general" when no label is set). An event that
// reserves several areas participates in one bucket per area, so two events
// conflict if they share any single resource with overlapping time.

use uuid::Uuid;

use crate::event::AreaRef;

/// The resource an event reserves
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReservedResource {
    /// Specific physical areas, one conflict bucket each
    Areas(Vec<AreaRef>),
    /// A single labelled space within the venue; `None` means the whole venue
    NamedSpace(Option<String>),
}

/// A conflict-checking bucket: stable key plus human label
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Bucket {
    pub key: String,
    pub label: String,
}

/// Derive the bucket keys an event occupies
pub fn bucket_keys(venue_id: Uuid, resource: &ReservedResource) -> Vec<Bucket> {
    match resource {
        ReservedResource::Areas(areas) => areas
            .iter()
            .map(|area| Bucket {
                key: format!("area::{}", area.id),
                label: area.name.clone(),
            })
            .collect(),
        ReservedResource::NamedSpace(space) => {
            let label = space
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .unwrap_or("general");
            vec![Bucket {
                key: format!("venue::{}::{}", venue_id, label.to_lowercase()),
                label: label.to_string(),
            }]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn areas_produce_one_bucket_each() {
        let venue = Uuid::now_v7();
        let a = AreaRef {
            id: Uuid::now_v7(),
            name: "Main Hall".into(),
        };
        let b = AreaRef {
            id: Uuid::now_v7(),
            name: "Terrace".into(),
        };
        let buckets = bucket_keys(venue, &ReservedResource::Areas(vec![a.clone(), b.clone()]));
        assert_eq!(buckets.len(), 2);
        assert_eq!(buckets[0].key, format!("area::{}", a.id));
        assert_eq!(buckets[0].label, "Main Hall");
        assert_eq!(buckets[1].key, format!("area::{}", b.id));
    }

    #[test]
    fn named_space_is_scoped_to_venue() {
        let venue = Uuid::now_v7();
        let other = Uuid::now_v7();
        let space = ReservedResource::NamedSpace(Some("Rooftop".into()));
        let ours = bucket_keys(venue, &space);
        let theirs = bucket_keys(other, &space);
        assert_eq!(ours.len(), 1);
        assert_eq!(ours[0].label, "Rooftop");
        // Same label at a different venue is a different resource
        assert_ne!(ours[0].key, theirs[0].key);
    }

    #[test]
    fn missing_or_blank_space_falls_back_to_general() {
        let venue = Uuid::now_v7();
        let none = bucket_keys(venue, &ReservedResource::NamedSpace(None));
        let blank = bucket_keys(venue, &ReservedResource::NamedSpace(Some("   ".into())));
        assert_eq!(none[0].label, "general");
        assert_eq!(none[0].key, blank[0].key);
    }

    #[test]
    fn space_labels_compare_case_insensitively() {
        let venue = Uuid::now_v7();
        let upper = bucket_keys(venue, &ReservedResource::NamedSpace(Some("Rooftop".into())));
        let lower = bucket_keys(venue, &ReservedResource::NamedSpace(Some("rooftop".into())));
        assert_eq!(upper[0].key, lower[0].key);
    }
}
