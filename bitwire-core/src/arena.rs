//! Fixed-capacity device storage
//!
//! Edge interrupts need to reach the device that owns a pair of lines
//! without allocating. Devices live in a [`DeviceArena`] and are addressed
//! by a [`Handle`]; destroying a device bumps its slot generation so old
//! handles are rejected instead of aliasing the next device.
//!
//! Shared with interrupt handlers through [`SharedArena`]:
//!
//! ```ignore
//! static I2C_DEVICES: SharedArena<MyI2c, 2> =
//!     critical_section::Mutex::new(RefCell::new(DeviceArena::new()));
//!
//! fn scl_edge_irq(handle: Handle) {
//!     critical_section::with(|cs| {
//!         if let Ok(dev) = I2C_DEVICES.borrow_ref_mut(cs).get_mut(handle) {
//!             dev.on_scl_edge();
//!         }
//!     });
//! }
//! ```

use core::cell::RefCell;

use heapless::Vec;

/// Arena access error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ArenaError {
    /// Every slot is occupied
    Full,
    /// Handle refers to a destroyed device
    StaleHandle,
}

/// Stable reference to an arena slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Handle {
    index: u8,
    generation: u16,
}

impl Handle {
    pub fn index(&self) -> usize {
        self.index as usize
    }
}

struct Slot<T> {
    generation: u16,
    value: Option<T>,
}

/// Arena of up to `N` devices (`N` <= 256)
pub struct DeviceArena<T, const N: usize> {
    slots: Vec<Slot<T>, N>,
}

/// Arena guarded for access from interrupt handlers
pub type SharedArena<T, const N: usize> = critical_section::Mutex<RefCell<DeviceArena<T, N>>>;

impl<T, const N: usize> DeviceArena<T, N> {
    pub const fn new() -> Self {
        Self { slots: Vec::new() }
    }

    /// Store a device, reusing the first free slot
    pub fn create(&mut self, value: T) -> Result<Handle, ArenaError> {
        if let Some(index) = self.slots.iter().position(|slot| slot.value.is_none()) {
            let slot = &mut self.slots[index];
            slot.value = Some(value);
            return Ok(Handle {
                index: index as u8,
                generation: slot.generation,
            });
        }

        let index = self.slots.len();
        if index > u8::MAX as usize {
            return Err(ArenaError::Full);
        }
        self.slots
            .push(Slot {
                generation: 0,
                value: Some(value),
            })
            .map_err(|_| ArenaError::Full)?;
        Ok(Handle {
            index: index as u8,
            generation: 0,
        })
    }

    /// Remove a device and hand it back
    pub fn destroy(&mut self, handle: Handle) -> Result<T, ArenaError> {
        let slot = self.slot_mut(handle)?;
        let value = slot.value.take().ok_or(ArenaError::StaleHandle)?;
        slot.generation = slot.generation.wrapping_add(1);
        Ok(value)
    }

    pub fn get(&self, handle: Handle) -> Result<&T, ArenaError> {
        self.slots
            .get(handle.index())
            .filter(|slot| slot.generation == handle.generation)
            .and_then(|slot| slot.value.as_ref())
            .ok_or(ArenaError::StaleHandle)
    }

    pub fn get_mut(&mut self, handle: Handle) -> Result<&mut T, ArenaError> {
        self.slot_mut(handle)?
            .value
            .as_mut()
            .ok_or(ArenaError::StaleHandle)
    }

    /// Number of live devices
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|slot| slot.value.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Visit every live device, e.g. to fan out a shared edge interrupt
    pub fn for_each_mut(&mut self, mut f: impl FnMut(&mut T)) {
        for value in self.slots.iter_mut().filter_map(|slot| slot.value.as_mut()) {
            f(value);
        }
    }

    fn slot_mut(&mut self, handle: Handle) -> Result<&mut Slot<T>, ArenaError> {
        self.slots
            .get_mut(handle.index())
            .filter(|slot| slot.generation == handle.generation)
            .ok_or(ArenaError::StaleHandle)
    }
}

impl<T, const N: usize> Default for DeviceArena<T, N> {
    fn default() -> Self {
        Self::new()
    }
}
