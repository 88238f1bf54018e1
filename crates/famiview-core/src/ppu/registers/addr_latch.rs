use crate::memory::vram::ADDR_MASK;

/// Current VRAM address plus the shared `$2005/$2006` write toggle.
///
/// `$2006` takes two writes: the first loads the high six bits (the top two
/// bits of the byte are not wired), the second shifts them up and appends the
/// low byte.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct AddrLatch {
    /// Current VRAM address (`v`), always within 14 bits.
    addr: u16,
    /// Write toggle (`w`): false => first write, true => second write.
    w: bool,
}

impl AddrLatch {
    /// Writes to `$2006`. Returns the completed address on the second write.
    pub fn write(&mut self, value: u8) -> Option<u16> {
        let second_write = self.w;
        if second_write {
            self.addr = ((self.addr << 8) | u16::from(value)) & ADDR_MASK;
        } else {
            self.addr = u16::from(value & 0b0011_1111);
        }
        self.w = !self.w;
        second_write.then_some(self.addr)
    }

    /// Advances the address after a `$2007` access, wrapping at 14 bits.
    #[inline]
    pub fn increment(&mut self, step: u16) {
        self.addr = self.addr.wrapping_add(step) & ADDR_MASK;
    }

    #[inline]
    pub fn addr(self) -> u16 {
        self.addr
    }

    /// `true` when the next `$2006` write supplies the low byte.
    #[inline]
    pub fn write_toggle(self) -> bool {
        self.w
    }
}

impl core::fmt::Debug for AddrLatch {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AddrLatch")
            .field("addr", &format_args!("{:#06X}", self.addr))
            .field("w", &self.w)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn toggle_flips_per_write() {
        let mut latch = AddrLatch::default();
        assert_eq!(latch.write(0x21), None);
        assert!(latch.write_toggle());
        assert_eq!(latch.write(0x08), Some(0x2108));
        assert!(!latch.write_toggle());
    }

    #[test]
    fn increment_wraps_at_fourteen_bits() {
        let mut latch = AddrLatch::default();
        latch.write(0x3F);
        latch.write(0xFF);
        latch.increment(1);
        assert_eq!(latch.addr(), 0x0000);

        latch.write(0x3F);
        latch.write(0xF0);
        latch.increment(32);
        assert_eq!(latch.addr(), 0x0010);
    }

    proptest! {
        #[test]
        fn address_pair_round_trips(hi in any::<u8>(), lo in any::<u8>()) {
            let mut latch = AddrLatch::default();
            latch.write(hi);
            latch.write(lo);
            prop_assert_eq!(latch.addr(), (u16::from(hi & 0x3F) << 8) | u16::from(lo));
        }

        #[test]
        fn increments_stay_masked(start in 0u16..0x4000, steps in 0usize..64, wide in any::<bool>()) {
            let step = if wide { 32 } else { 1 };
            let mut latch = AddrLatch::default();
            latch.write((start >> 8) as u8);
            latch.write(start as u8);
            for _ in 0..steps {
                latch.increment(step);
            }
            let expected = (usize::from(start) + steps * usize::from(step)) % 0x4000;
            prop_assert_eq!(usize::from(latch.addr()), expected);
        }
    }
}
