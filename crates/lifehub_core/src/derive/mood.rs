//! Ordinal averages and category tallies.

use crate::model::journal::Mood;
use std::collections::BTreeMap;

/// Mean mood rounded to the nearest scale position; `None` without input.
pub fn average_mood<I>(moods: I) -> Option<Mood>
where
    I: IntoIterator<Item = Mood>,
{
    let (sum, count) = moods
        .into_iter()
        .fold((0usize, 0usize), |(sum, count), mood| (sum + mood.index(), count + 1));
    if count == 0 {
        return None;
    }
    let index = (sum as f64 / count as f64).round() as usize;
    Mood::from_index(index)
}

/// Counts items per key.
pub fn tally_by<T, K, F>(items: &[T], key: F) -> BTreeMap<K, usize>
where
    K: Ord,
    F: Fn(&T) -> K,
{
    let mut tally = BTreeMap::new();
    for item in items {
        *tally.entry(key(item)).or_insert(0) += 1;
    }
    tally
}

/// Key with the highest count; ties resolve to the smallest key.
pub fn most_common<K: Ord + Clone>(tally: &BTreeMap<K, usize>) -> Option<K> {
    let mut best: Option<(&K, usize)> = None;
    for (key, &count) in tally {
        if best.map_or(true, |(_, best_count)| count > best_count) {
            best = Some((key, count));
        }
    }
    best.map(|(key, _)| key.clone())
}

#[cfg(test)]
mod tests {
    use super::{average_mood, most_common, tally_by};
    use crate::model::journal::Mood;

    #[test]
    fn average_mood_rounds_to_nearest_label() {
        assert_eq!(average_mood(Vec::new()), None);
        assert_eq!(average_mood(vec![Mood::Great, Mood::Good]), Some(Mood::Great));
        assert_eq!(average_mood(vec![Mood::Awful, Mood::Bad, Mood::Good]), Some(Mood::Bad));
        assert_eq!(average_mood(vec![Mood::Bad, Mood::Good]), Some(Mood::Okay));
    }

    #[test]
    fn tally_and_most_common_prefer_smallest_key_on_ties() {
        let items = vec!["work", "home", "work", "home", "gym"];
        let tally = tally_by(&items, |item| item.to_string());
        assert_eq!(tally.get("work"), Some(&2));
        assert_eq!(most_common(&tally), Some("home".to_string()));
    }
}
