//! Id lookup maps for client-side joins.
//!
//! Built once per load cycle so joins cost one hash lookup per record
//! instead of a scan of the other collection.

use crate::model::entity::Entity;
use std::collections::HashMap;

/// Read-only `id -> record` map over a loaded slice.
#[derive(Debug)]
pub struct IdIndex<'a, T> {
    by_id: HashMap<&'a str, &'a T>,
}

impl<'a, T: Entity> IdIndex<'a, T> {
    pub fn build(records: &'a [T]) -> Self {
        let by_id = records.iter().map(|record| (record.id(), record)).collect();
        Self { by_id }
    }

    pub fn get(&self, id: &str) -> Option<&'a T> {
        self.by_id.get(id).copied()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.by_id.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

/// Groups records by a foreign-key field, keeping input order per group.
pub fn group_by<'a, T, F>(records: &'a [T], key: F) -> HashMap<&'a str, Vec<&'a T>>
where
    F: Fn(&'a T) -> &'a str,
{
    let mut groups: HashMap<&'a str, Vec<&'a T>> = HashMap::new();
    for record in records {
        groups.entry(key(record)).or_default().push(record);
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::{group_by, IdIndex};
    use crate::model::school::{Assignment, Course};

    fn course(id: &str, name: &str) -> Course {
        Course {
            id: id.to_string(),
            name: name.to_string(),
            ..Course::default()
        }
    }

    fn assignment(id: &str, course_id: &str) -> Assignment {
        Assignment {
            id: id.to_string(),
            course_id: course_id.to_string(),
            ..Assignment::default()
        }
    }

    #[test]
    fn index_resolves_known_ids_only() {
        let courses = vec![course("c1", "Math"), course("c2", "Art")];
        let index = IdIndex::build(&courses);

        assert_eq!(index.len(), 2);
        assert_eq!(index.get("c2").map(|c| c.name.as_str()), Some("Art"));
        assert!(index.get("missing").is_none());
    }

    #[test]
    fn group_by_keeps_input_order() {
        let assignments = vec![assignment("a1", "c1"), assignment("a2", "c2"), assignment("a3", "c1")];
        let groups = group_by(&assignments, |a| a.course_id.as_str());

        let ids: Vec<&str> = groups["c1"].iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["a1", "a3"]);
    }
}
