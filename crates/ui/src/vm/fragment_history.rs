use exam_core::fragment::Fragment;

/// Back/forward stack of visited fragments, like a browser tab's history.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FragmentHistory {
    entries: Vec<Fragment>,
    cursor: usize,
}

impl FragmentHistory {
    /// Record a visit. Drops any forward entries; repeated visits collapse.
    pub fn push(&mut self, fragment: Fragment) {
        if self.current() == Some(&fragment) {
            return;
        }
        self.entries.truncate(self.cursor + 1);
        self.entries.push(fragment);
        self.cursor = self.entries.len() - 1;
    }

    #[must_use]
    pub fn current(&self) -> Option<&Fragment> {
        self.entries.get(self.cursor)
    }

    pub fn back(&mut self) -> Option<&Fragment> {
        if !self.can_go_back() {
            return None;
        }
        self.cursor -= 1;
        self.entries.get(self.cursor)
    }

    pub fn forward(&mut self) -> Option<&Fragment> {
        if !self.can_go_forward() {
            return None;
        }
        self.cursor += 1;
        self.entries.get(self.cursor)
    }

    #[must_use]
    pub fn can_go_back(&self) -> bool {
        self.cursor > 0
    }

    #[must_use]
    pub fn can_go_forward(&self) -> bool {
        self.cursor + 1 < self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frag(raw: &str) -> Fragment {
        Fragment::parse(raw)
    }

    #[test]
    fn empty_history_goes_nowhere() {
        let mut history = FragmentHistory::default();
        assert_eq!(history.current(), None);
        assert_eq!(history.back(), None);
        assert_eq!(history.forward(), None);
    }

    #[test]
    fn back_and_forward_walk_entries() {
        let mut history = FragmentHistory::default();
        history.push(frag("#a#1"));
        history.push(frag("#a#2"));
        history.push(frag("#b#1"));

        assert_eq!(history.back(), Some(&frag("#a#2")));
        assert_eq!(history.back(), Some(&frag("#a#1")));
        assert_eq!(history.back(), None);
        assert_eq!(history.forward(), Some(&frag("#a#2")));
        assert!(history.can_go_forward());
    }

    #[test]
    fn push_after_back_drops_forward_entries() {
        let mut history = FragmentHistory::default();
        history.push(frag("#a#1"));
        history.push(frag("#a#2"));
        history.back();
        history.push(frag("#a#3"));

        assert!(!history.can_go_forward());
        assert_eq!(history.back(), Some(&frag("#a#1")));
    }

    #[test]
    fn repeated_push_is_collapsed() {
        let mut history = FragmentHistory::default();
        history.push(frag("#a#1"));
        history.push(frag("#a#1"));
        assert!(!history.can_go_back());
    }
}
