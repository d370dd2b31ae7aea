use std::collections::BTreeSet;

use crate::core::behavior::InteractionHistory;
use crate::models::{PeerSimilarity, RenterProfile};

/// Jaccard index with an empty union treated as zero overlap
#[inline]
pub fn jaccard(a: &BTreeSet<String>, b: &BTreeSet<String>) -> f64 {
    let union = a.union(b).count();
    if union == 0 {
        return 0.0;
    }
    a.intersection(b).count() as f64 / union as f64
}

/// Preference overlap between two renters: mean of amenity and location Jaccard
#[inline]
pub fn renter_similarity(a: &RenterProfile, b: &RenterProfile) -> f64 {
    (jaccard(&a.unit_amenities, &b.unit_amenities) + jaccard(&a.locations, &b.locations)) / 2.0
}

/// Nearest peers of `target` for collaborative filtering
///
/// Scans every other renter (quadratic over a run), keeps those strictly
/// above `threshold`, orders by similarity descending then user id, and
/// truncates to `limit`. Each peer carries its saved listing ids.
pub fn find_similar_peers(
    target: &RenterProfile,
    renters: &[RenterProfile],
    history: &InteractionHistory,
    threshold: f64,
    limit: usize,
) -> Vec<PeerSimilarity> {
    let mut peers: Vec<PeerSimilarity> = renters
        .iter()
        .filter(|other| other.user_id != target.user_id)
        .filter_map(|other| {
            let similarity = renter_similarity(target, other);
            (similarity > threshold).then(|| PeerSimilarity {
                user_id: other.user_id,
                similarity,
                saved_listing_ids: history.saved_listings(other.user_id),
            })
        })
        .collect();

    peers.sort_by(|a, b| {
        b.similarity
            .partial_cmp(&a.similarity)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.user_id.cmp(&b.user_id))
    });
    peers.truncate(limit);
    peers
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{InteractionEvent, InteractionKind};

    fn tags(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn renter(id: i64, amenities: &[&str], locations: &[&str]) -> RenterProfile {
        RenterProfile {
            user_id: id,
            unit_amenities: tags(amenities),
            locations: tags(locations),
            ..Default::default()
        }
    }

    #[test]
    fn test_jaccard() {
        assert_eq!(jaccard(&tags(&[]), &tags(&[])), 0.0);
        assert_eq!(jaccard(&tags(&["a", "b"]), &tags(&["a", "b"])), 1.0);
        assert!((jaccard(&tags(&["a", "b"]), &tags(&["b", "c"])) - 1.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_threshold_sort_and_limit() {
        let target = renter(1, &["gym", "laundry"], &["Downtown"]);
        let renters = vec![
            target.clone(),
            renter(2, &["gym", "laundry"], &["Downtown"]),     // 1.0
            renter(3, &["gym"], &["Downtown"]),                // 0.75
            renter(4, &["gym"], &["Uptown"]),                  // 0.25, dropped
            renter(5, &["gym", "laundry"], &["Downtown"]),     // 1.0, ties with 2
            renter(6, &[], &[]),                               // 0.0
        ];
        let history = InteractionHistory::from_events([InteractionEvent {
            user_id: 2,
            listing_id: 42,
            kind: InteractionKind::Saved,
        }]);

        let peers = find_similar_peers(&target, &renters, &history, 0.3, 10);
        let ids: Vec<i64> = peers.iter().map(|p| p.user_id).collect();
        assert_eq!(ids, vec![2, 5, 3]);
        assert_eq!(peers[0].saved_listing_ids, vec![42]);
        assert!(peers[2].saved_listing_ids.is_empty());

        let limited = find_similar_peers(&target, &renters, &history, 0.3, 2);
        assert_eq!(limited.len(), 2);
    }

    #[test]
    fn test_never_includes_self() {
        let target = renter(1, &["gym"], &["Downtown"]);
        let peers = find_similar_peers(&target, &[target.clone()], &InteractionHistory::new(), 0.0, 10);
        assert!(peers.is_empty());
    }
}
