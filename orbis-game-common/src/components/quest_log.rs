use arrayvec::ArrayVec;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt::Write;

/// A quest tracks progress against at most this many distinct targets.
pub const QUEST_MAX_TARGETS: usize = 5;

#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct QuestProgress {
    pub target_id: u32,
    pub amount: i32,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct ActiveQuest {
    pub id: u16,
    pub progress: ArrayVec<QuestProgress, QUEST_MAX_TARGETS>,
}

impl ActiveQuest {
    pub fn new(id: u16) -> Self {
        Self {
            id,
            progress: ArrayVec::new(),
        }
    }

    /// The client renders each target amount as exactly three decimal digits.
    pub fn progress_string(&self) -> String {
        let mut out = String::with_capacity(3 * self.progress.len());
        for progress in &self.progress {
            let amount = progress.amount.clamp(0, 999);
            write!(out, "{:03}", amount).unwrap();
        }
        out
    }
}

/// Quest state is three disjoint sets keyed by quest id, plus a refcount of
/// monsters any active quest cares about so kill handling can skip the scan
/// for unrelated monsters.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct QuestLog {
    active: HashMap<u16, ActiveQuest>,
    info: HashMap<u16, String>,
    completed: HashMap<u16, i64>,
    monster_refs: HashMap<u32, i8>,
}

impl QuestLog {
    pub fn start(&mut self, quest: ActiveQuest) -> bool {
        if self.active.contains_key(&quest.id) {
            return false;
        }
        for progress in &quest.progress {
            *self.monster_refs.entry(progress.target_id).or_insert(0) += 1;
        }
        self.active.insert(quest.id, quest);
        true
    }

    pub fn forfeit(&mut self, quest_id: u16) -> bool {
        match self.active.remove(&quest_id) {
            Some(quest) => {
                self.release_monster_refs(&quest);
                true
            }
            None => false,
        }
    }

    /// Moves a quest from active to completed, stamping the completion time
    /// as unix seconds.
    pub fn complete(&mut self, quest_id: u16, completed_at: i64) -> bool {
        match self.active.remove(&quest_id) {
            Some(quest) => {
                self.release_monster_refs(&quest);
                self.completed.insert(quest_id, completed_at);
                true
            }
            None => false,
        }
    }

    fn release_monster_refs(&mut self, quest: &ActiveQuest) {
        for progress in &quest.progress {
            if let Some(count) = self.monster_refs.get_mut(&progress.target_id) {
                *count -= 1;
                if *count <= 0 {
                    self.monster_refs.remove(&progress.target_id);
                }
            }
        }
    }

    pub fn is_active(&self, quest_id: u16) -> bool {
        self.active.contains_key(&quest_id)
    }

    pub fn is_completed(&self, quest_id: u16) -> bool {
        self.completed.contains_key(&quest_id)
    }

    pub fn get_active(&self, quest_id: u16) -> Option<&ActiveQuest> {
        self.active.get(&quest_id)
    }

    pub fn set_info(&mut self, quest_id: u16, value: String) {
        self.info.insert(quest_id, value);
    }

    pub fn get_info(&self, quest_id: u16) -> Option<&str> {
        self.info.get(&quest_id).map(|s| s.as_str())
    }

    /// Advances every active quest tracking this monster. Returns the
    /// (quest id, refreshed progress string) pairs that changed.
    pub fn record_kill(&mut self, monster_id: u32) -> Vec<(u16, String)> {
        if !self.monster_refs.contains_key(&monster_id) {
            return Vec::new();
        }

        let mut updates = Vec::new();
        for quest in self.active.values_mut() {
            let mut touched = false;
            for progress in quest.progress.iter_mut() {
                if progress.target_id == monster_id && progress.amount < 999 {
                    progress.amount += 1;
                    touched = true;
                }
            }
            if touched {
                updates.push((quest.id, quest.progress_string()));
            }
        }
        updates
    }

    pub fn iter_active(&self) -> impl Iterator<Item = &ActiveQuest> {
        self.active.values()
    }

    pub fn iter_info(&self) -> impl Iterator<Item = (u16, &str)> {
        self.info.iter().map(|(id, value)| (*id, value.as_str()))
    }

    pub fn iter_completed(&self) -> impl Iterator<Item = (u16, i64)> + use<'_> {
        self.completed.iter().map(|(id, time)| (*id, *time))
    }

    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    pub fn info_count(&self) -> usize {
        self.info.len()
    }

    pub fn completed_count(&self) -> usize {
        self.completed.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quest_with_target(id: u16, target_id: u32) -> ActiveQuest {
        let mut quest = ActiveQuest::new(id);
        quest.progress.push(QuestProgress {
            target_id,
            amount: 0,
        });
        quest
    }

    #[test]
    fn progress_string_pads_to_three_digits() {
        let mut quest = ActiveQuest::new(2000);
        quest.progress.push(QuestProgress {
            target_id: 100100,
            amount: 7,
        });
        quest.progress.push(QuestProgress {
            target_id: 100101,
            amount: 123,
        });
        assert_eq!(quest.progress_string(), "007123");
    }

    #[test]
    fn kill_updates_only_relevant_quests() {
        let mut log = QuestLog::default();
        assert!(log.start(quest_with_target(2000, 100100)));
        assert!(log.start(quest_with_target(2001, 100200)));

        let updates = log.record_kill(100100);
        assert_eq!(updates, vec![(2000, "001".to_string())]);
        assert!(log.record_kill(999999).is_empty());
    }

    #[test]
    fn complete_releases_monster_refs() {
        let mut log = QuestLog::default();
        assert!(log.start(quest_with_target(2000, 100100)));
        assert!(log.complete(2000, 1_600_000_000));
        assert!(log.is_completed(2000));
        assert!(!log.is_active(2000));
        assert!(log.record_kill(100100).is_empty());
    }

    #[test]
    fn duplicate_start_is_rejected() {
        let mut log = QuestLog::default();
        assert!(log.start(ActiveQuest::new(2000)));
        assert!(!log.start(ActiveQuest::new(2000)));
    }
}
