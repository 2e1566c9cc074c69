use std::cmp::Ordering;

use crate::models::MatchResult;

/// Sorts by descending numeric score. Stable: ties keep backend order.
/// Results whose score does not parse go last.
pub fn rank_by_score(results: &mut [MatchResult]) {
    results.sort_by(|a, b| compare_scores(a.score(), b.score()));
}

fn compare_scores(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => b.total_cmp(&a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::match_result;

    #[test]
    fn test_descending_with_stable_ties() {
        let mut results = vec![
            match_result(Some(1), "first", "42.0"),
            match_result(Some(2), "second", "91.5"),
            match_result(Some(3), "third", "91.5"),
            match_result(Some(4), "fourth", "10.0"),
        ];
        rank_by_score(&mut results);

        let order: Vec<i64> = results.iter().filter_map(|r| r.cv_id).collect();
        assert_eq!(order, vec![2, 3, 1, 4]);
    }

    #[test]
    fn test_numeric_not_lexicographic() {
        let mut results = vec![
            match_result(Some(1), "a", "9"),
            match_result(Some(2), "b", "100"),
        ];
        rank_by_score(&mut results);
        assert_eq!(results[0].cv_id, Some(2));
    }

    #[test]
    fn test_unparseable_scores_last() {
        let mut results = vec![
            match_result(Some(1), "a", "pending"),
            match_result(Some(2), "b", "5"),
            match_result(Some(3), "c", ""),
        ];
        rank_by_score(&mut results);
        let order: Vec<i64> = results.iter().filter_map(|r| r.cv_id).collect();
        assert_eq!(order, vec![2, 1, 3]);
    }
}
