//! Set reconciliation between a remote collection and the desired one
//!
//! Used for sub-objects that the API manages individually (firewall rules):
//! items are matched by key, stale remote items are removed and missing
//! desired items are added. Matched items are left untouched.

/// Result of comparing the current and desired collections
#[derive(Debug, Clone, PartialEq)]
pub struct SetDiff<T> {
    /// Desired items without a remote counterpart
    pub to_add: Vec<T>,

    /// Remote items that are no longer desired
    pub to_remove: Vec<T>,

    /// Remote items that match a desired item
    pub unchanged: Vec<T>,
}

impl<T> SetDiff<T> {
    pub fn is_empty(&self) -> bool {
        self.to_add.is_empty() && self.to_remove.is_empty()
    }
}

/// Compare two collections by key
///
/// Duplicate keys are matched one-to-one, so two identical desired items
/// need two identical remote items. Ordering follows the input order.
pub fn diff_sets<T, K, F>(current: Vec<T>, desired: Vec<T>, key: F) -> SetDiff<T>
where
    K: PartialEq,
    F: Fn(&T) -> K,
{
    let current_keys: Vec<K> = current.iter().map(&key).collect();
    let mut matched = vec![false; current.len()];
    let mut to_add = Vec::new();

    for item in desired {
        let k = key(&item);
        let found = current_keys
            .iter()
            .enumerate()
            .position(|(i, ck)| !matched[i] && *ck == k);
        match found {
            Some(i) => matched[i] = true,
            None => to_add.push(item),
        }
    }

    let mut to_remove = Vec::new();
    let mut unchanged = Vec::new();
    for (item, is_matched) in current.into_iter().zip(matched) {
        if is_matched {
            unchanged.push(item);
        } else {
            to_remove.push(item);
        }
    }

    SetDiff {
        to_add,
        to_remove,
        unchanged,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Rule {
        id: Option<&'static str>,
        port: &'static str,
    }

    fn remote(id: &'static str, port: &'static str) -> Rule {
        Rule { id: Some(id), port }
    }

    fn desired(port: &'static str) -> Rule {
        Rule { id: None, port }
    }

    #[test]
    fn test_diff_sets() {
        let current = vec![remote("r1", "22"), remote("r2", "80")];
        let wanted = vec![desired("80"), desired("443")];

        let diff = diff_sets(current, wanted, |r| r.port);

        assert_eq!(diff.to_add, vec![desired("443")]);
        assert_eq!(diff.to_remove, vec![remote("r1", "22")]);
        assert_eq!(diff.unchanged, vec![remote("r2", "80")]);
        assert!(!diff.is_empty());
    }

    #[test]
    fn test_no_changes() {
        let current = vec![remote("r1", "22")];
        let diff = diff_sets(current, vec![desired("22")], |r| r.port);
        assert!(diff.is_empty());
        assert_eq!(diff.unchanged.len(), 1);
    }

    #[test]
    fn test_duplicates_match_one_to_one() {
        let current = vec![remote("r1", "22")];
        let wanted = vec![desired("22"), desired("22")];

        let diff = diff_sets(current, wanted, |r| r.port);
        assert_eq!(diff.to_add.len(), 1);
        assert!(diff.to_remove.is_empty());
    }

    #[test]
    fn test_empty_desired_removes_everything() {
        let current = vec![remote("r1", "22"), remote("r2", "80")];
        let diff = diff_sets(current, Vec::new(), |r| r.port);
        assert_eq!(diff.to_remove.len(), 2);
        assert!(diff.to_add.is_empty());
    }
}
