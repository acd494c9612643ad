use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct SkillEntry {
    pub level: u8,
    pub master_level: u8,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct SkillList {
    skills: HashMap<u32, SkillEntry>,
}

impl SkillList {
    pub fn get(&self, skill_id: u32) -> Option<SkillEntry> {
        self.skills.get(&skill_id).copied()
    }

    pub fn set(&mut self, skill_id: u32, level: u8, master_level: u8) -> SkillEntry {
        let entry = SkillEntry {
            level,
            master_level,
        };
        self.skills.insert(skill_id, entry);
        entry
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, SkillEntry)> + '_ {
        self.skills.iter().map(|(id, entry)| (*id, *entry))
    }

    pub fn len(&self) -> usize {
        self.skills.len()
    }

    pub fn is_empty(&self) -> bool {
        self.skills.is_empty()
    }
}
