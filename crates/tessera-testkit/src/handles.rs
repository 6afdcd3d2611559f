//! Slot and generation table for result handles.
//!
//! A handle packs `slot + 1` into the upper 16 bits and the slot's
//! generation into the lower 16, so 0 is never a valid handle and a handle
//! whose result was already freed no longer resolves.

fn encode(slot: u32, generation: u16) -> u32 {
    ((slot + 1) << 16) | u32::from(generation)
}

fn decode(handle: u32) -> Option<(usize, u16)> {
    let slot = (handle >> 16).checked_sub(1)?;
    Some((slot as usize, handle as u16))
}

struct Slot<T> {
    generation: u16,
    data: Option<T>,
}

pub struct HandleTable<T> {
    slots: Vec<Slot<T>>,
    free_list: Vec<u32>,
}

impl<T> HandleTable<T> {
    pub const fn new() -> Self {
        Self {
            slots: Vec::new(),
            free_list: Vec::new(),
        }
    }

    pub fn insert(&mut self, value: T) -> u32 {
        if let Some(slot_idx) = self.free_list.pop() {
            let slot = &mut self.slots[slot_idx as usize];
            slot.data = Some(value);
            encode(slot_idx, slot.generation)
        } else {
            let slot_idx = self.slots.len() as u32;
            self.slots.push(Slot {
                generation: 0,
                data: Some(value),
            });
            encode(slot_idx, 0)
        }
    }

    pub fn get(&self, handle: u32) -> Option<&T> {
        let (slot_idx, generation) = decode(handle)?;
        let slot = self.slots.get(slot_idx)?;
        if slot.generation != generation {
            return None;
        }
        slot.data.as_ref()
    }

    /// Remove the value behind a handle. A stale handle yields `None`.
    ///
    /// A slot whose generation wraps is retired instead of recycled.
    pub fn remove(&mut self, handle: u32) -> Option<T> {
        let (slot_idx, generation) = decode(handle)?;
        let slot = self.slots.get_mut(slot_idx)?;
        if slot.generation != generation {
            return None;
        }
        let value = slot.data.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        if slot.generation != 0 {
            self.free_list.push(slot_idx as u32);
        }
        Some(value)
    }

    pub fn len(&self) -> usize {
        self.slots.iter().filter(|slot| slot.data.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T> Default for HandleTable<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handles_are_never_zero() {
        let mut table = HandleTable::new();
        let h = table.insert(1);
        assert_ne!(h, 0);
        assert_eq!(table.get(0), None);
        assert_eq!(table.get(h), Some(&1));
    }

    #[test]
    fn stale_handle_after_remove() {
        let mut table = HandleTable::new();
        let h = table.insert("a");
        assert_eq!(table.remove(h), Some("a"));
        assert_eq!(table.remove(h), None);
        assert_eq!(table.get(h), None);

        let h2 = table.insert("b");
        assert_ne!(h, h2);
        assert_eq!(table.get(h), None);
        assert_eq!(table.get(h2), Some(&"b"));
        assert_eq!(table.len(), 1);
    }
}
