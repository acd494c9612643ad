use serde::{Deserialize, Serialize};

pub const KEYMAP_KEY_COUNT: usize = 90;

#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct KeyBinding {
    pub kind: u8,
    pub action: u32,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct KeyMap {
    bindings: Vec<KeyBinding>,
}

impl Default for KeyMap {
    fn default() -> Self {
        Self {
            bindings: vec![KeyBinding::default(); KEYMAP_KEY_COUNT],
        }
    }
}

impl KeyMap {
    pub fn get(&self, key: usize) -> KeyBinding {
        self.bindings.get(key).copied().unwrap_or_default()
    }

    pub fn set(&mut self, key: usize, binding: KeyBinding) {
        if key < KEYMAP_KEY_COUNT {
            self.bindings[key] = binding;
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = KeyBinding> + '_ {
        self.bindings.iter().copied()
    }
}
