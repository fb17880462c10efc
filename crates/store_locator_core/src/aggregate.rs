//! In-process versions of the tag and top-stores aggregations.
//!
//! The PostgreSQL adapter runs the same logic as SQL; these functions back the
//! in-memory adapter and pin down ordering and tie-breaks.

use std::collections::HashMap;

use uuid::Uuid;

use crate::domain::{Review, Store, TagCount, TopStore};

/// Stores need at least this many reviews to be ranked.
pub const MIN_REVIEWS_FOR_RANKING: usize = 2;
pub const TOP_STORES_LIMIT: usize = 10;

/// Counts stores per distinct tag, most common first, ties by tag name.
pub fn count_tags<'a>(stores: impl IntoIterator<Item = &'a Store>) -> Vec<TagCount> {
    let mut counts: HashMap<&str, i64> = HashMap::new();
    for tag in stores.into_iter().flat_map(|s| s.tags.iter()) {
        *counts.entry(tag.as_str()).or_default() += 1;
    }

    let mut out: Vec<TagCount> = counts
        .into_iter()
        .map(|(tag, count)| TagCount {
            tag: tag.to_string(),
            count,
        })
        .collect();
    out.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.tag.cmp(&b.tag)));
    out
}

/// Joins reviews onto stores and ranks by average rating, highest first.
///
/// Stores with fewer than [`MIN_REVIEWS_FOR_RANKING`] reviews are left out and
/// equal averages fall back to store id order.
pub fn rank_top_stores<'a>(
    stores: impl IntoIterator<Item = &'a Store>,
    reviews: impl IntoIterator<Item = &'a Review>,
) -> Vec<TopStore> {
    let mut ratings: HashMap<Uuid, Vec<i32>> = HashMap::new();
    for review in reviews {
        ratings.entry(review.store).or_default().push(review.rating);
    }

    let mut ranked: Vec<TopStore> = stores
        .into_iter()
        .filter_map(|store| {
            let joined = ratings.get(&store.id)?;
            if joined.len() < MIN_REVIEWS_FOR_RANKING {
                return None;
            }
            let sum: i64 = joined.iter().map(|r| i64::from(*r)).sum();
            Some(TopStore {
                id: store.id,
                name: store.name.clone(),
                slug: store.slug.clone(),
                photo: store.photo.clone(),
                average_rating: sum as f64 / joined.len() as f64,
                review_count: joined.len() as i64,
            })
        })
        .collect();

    ranked.sort_by(|a, b| {
        b.average_rating
            .total_cmp(&a.average_rating)
            .then_with(|| a.id.cmp(&b.id))
    });
    ranked.truncate(TOP_STORES_LIMIT);
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Location;
    use crate::geo::GeoPoint;
    use chrono::Utc;

    fn store(name: &str, tags: &[&str]) -> Store {
        Store {
            id: Uuid::new_v4(),
            name: name.to_string(),
            slug: name.to_lowercase(),
            description: None,
            tags: tags.iter().map(|t| t.to_string()).collect(),
            created: Utc::now(),
            location: Location {
                point: GeoPoint { lng: 0.0, lat: 0.0 },
                address: "somewhere".into(),
            },
            photo: None,
            author: Uuid::nil(),
        }
    }

    fn review(store: &Store, rating: i32) -> Review {
        Review {
            id: Uuid::new_v4(),
            store: store.id,
            author: Uuid::nil(),
            text: "ok".into(),
            rating,
            created: Utc::now(),
        }
    }

    #[test]
    fn tags_are_counted_and_sorted() {
        let stores = vec![store("x", &["a", "b"]), store("y", &["a"]), store("z", &["c"])];
        let counts = count_tags(&stores);
        let pairs: Vec<_> = counts.iter().map(|c| (c.tag.as_str(), c.count)).collect();
        assert_eq!(pairs, vec![("a", 2), ("b", 1), ("c", 1)]);
    }

    #[test]
    fn single_review_stores_are_excluded() {
        let lonely = store("lonely", &[]);
        let popular = store("popular", &[]);
        let reviews = vec![review(&lonely, 5), review(&popular, 3), review(&popular, 5)];

        let top = rank_top_stores(&[lonely, popular.clone()], &reviews);
        assert_eq!(top.len(), 1);
        assert_eq!(top[0].id, popular.id);
        assert_eq!(top[0].average_rating, 4.0);
        assert_eq!(top[0].review_count, 2);
    }

    #[test]
    fn at_most_ten_ranked_highest_first() {
        let stores: Vec<Store> = (0..12).map(|i| store(&format!("s{i}"), &[])).collect();
        let reviews: Vec<Review> = stores
            .iter()
            .enumerate()
            .flat_map(|(i, s)| {
                let rating = (i % 5) as i32 + 1;
                [review(s, rating), review(s, rating)]
            })
            .collect();

        let top = rank_top_stores(&stores, &reviews);
        assert_eq!(top.len(), TOP_STORES_LIMIT);
        assert!(top
            .windows(2)
            .all(|w| w[0].average_rating >= w[1].average_rating));
        assert_eq!(top[0].average_rating, 5.0);
    }

    #[test]
    fn ties_are_ordered_by_id() {
        let a = store("a", &[]);
        let b = store("b", &[]);
        let reviews = vec![review(&a, 4), review(&a, 4), review(&b, 4), review(&b, 4)];
        let top = rank_top_stores(&[a.clone(), b.clone()], &reviews);
        let mut expected = vec![a.id, b.id];
        expected.sort();
        assert_eq!(top.iter().map(|t| t.id).collect::<Vec<_>>(), expected);
    }
}
