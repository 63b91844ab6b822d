//! The external memory contract the CPU core is driven by.
//!
//! The CPU never owns a concrete memory map, DMA engine, or cartridge model -
//! those live in the embedding crate. It only ever talks to whatever implements
//! [`Memory`].

/// Direction of a block (LDM/STM) transfer, derived from the `P`/`U` bits of the
/// ARM block-data-transfer encoding.
#[derive(Debug, Eq, PartialEq, Copy, Clone)]
pub enum Direction {
    /// Increment After.
    IA,
    /// Increment Before.
    IB,
    /// Decrement After.
    DA,
    /// Decrement Before.
    DB,
}

/// Narrow capability the CPU core needs from its host: reads and writes at
/// various widths, plus block transfers and a hook for active-region caching.
///
/// Every access takes `cycles` as an out-parameter that the implementation
/// increments by the waitstate cost of the access, mirroring the explicit
/// cycle-accumulator idiom used throughout the instruction handlers.
pub trait Memory {
    fn load32(&mut self, address: u32, cycles: &mut u32) -> u32;
    fn load16(&mut self, address: u32, cycles: &mut u32) -> u16;
    /// Sign-extending halfword load (used by `LDRSH`).
    fn load_u16(&mut self, address: u32, cycles: &mut u32) -> u16 {
        self.load16(address, cycles)
    }
    fn load8(&mut self, address: u32, cycles: &mut u32) -> u8;
    /// Sign-extending byte load (used by `LDRSB`). Default forwards to `load8`;
    /// sign extension itself happens at the call site, which knows the target width.
    fn load_u8(&mut self, address: u32, cycles: &mut u32) -> u8 {
        self.load8(address, cycles)
    }

    fn store32(&mut self, address: u32, value: u32, cycles: &mut u32);
    fn store16(&mut self, address: u32, value: u16, cycles: &mut u32);
    fn store8(&mut self, address: u32, value: u8, cycles: &mut u32);

    /// Transfers the registers selected by `register_mask` (bit `n` == register `n`)
    /// starting at `base_address` in the given `direction`. Returns the final
    /// (unwritten-back) address the caller should use for base-register writeback.
    ///
    /// `load` indicates direction of the overall instruction (LDM vs STM); the
    /// per-register values to store, or the destinations for loaded values, are
    /// supplied/consumed via `transfer`.
    fn load_multiple(&mut self, base_address: u32, register_mask: u16, direction: Direction, cycles: &mut u32, transfer: &mut dyn FnMut(usize, u32));

    fn store_multiple(&mut self, base_address: u32, register_mask: u16, direction: Direction, cycles: &mut u32, transfer: &mut dyn FnMut(usize) -> u32);

    /// Called whenever the CPU writes the PC, so the host can update its cached
    /// "active region" base pointer/mask/waitstate numbers ahead of the next fetch.
    fn set_active_region(&mut self, pc: u32);
}
