//! Ping-pong pair of wave fields.

use super::field::WaveField;

/// Two equally sized fields; one is read while the other is written.
///
/// Swapping flips an index, the fields themselves never move or reallocate.
#[derive(Debug, Clone)]
pub struct WaveBuffers {
    fields: [WaveField; 2],
    read: usize,
}

impl WaveBuffers {
    /// Allocate both fields zeroed
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            fields: [WaveField::new(width, height), WaveField::new(width, height)],
            read: 0,
        }
    }

    /// Field holding the latest completed step
    pub fn current(&self) -> &WaveField {
        &self.fields[self.read]
    }

    /// Mutable access to the latest completed step (seeding, tests)
    pub fn current_mut(&mut self) -> &mut WaveField {
        &mut self.fields[self.read]
    }

    /// Index of the field currently being read
    pub fn read_index(&self) -> usize {
        self.read
    }

    /// Index of the field the next step writes into
    pub fn write_index(&self) -> usize {
        1 - self.read
    }

    /// Borrow the read field and the write field at the same time
    pub fn read_write(&mut self) -> (&WaveField, &mut WaveField) {
        let (first, second) = self.fields.split_at_mut(1);
        if self.read == 0 {
            (&first[0], &mut second[0])
        } else {
            (&second[0], &mut first[0])
        }
    }

    /// Make the last written field the one read next
    pub fn swap(&mut self) {
        self.read = 1 - self.read;
    }

    /// Zero both fields in place
    pub fn clear(&mut self) {
        for field in &mut self.fields {
            field.clear();
        }
    }
}
