//! The external interrupt/BIOS-service contract the CPU core is driven by.

use crate::cpu::registers::PSR;
use crate::cpu::Cpu;

/// Host-provided reactions to CPU-level events that the core itself has no
/// opinion on: BIOS service calls, illegal decodes, and scheduler re-entry.
pub trait InterruptHandler {
    /// Called once, at CPU construction/reset.
    fn reset(&mut self, cpu: &mut Cpu);

    /// Called whenever `cpu.cycles >= cpu.next_event`; the implementation may
    /// advance its own peripherals and raise an IRQ via [`Cpu::raise_irq`].
    fn process_events(&mut self, cpu: &mut Cpu);

    /// `SWI` from Thumb state (8-bit comment field).
    fn swi16(&mut self, cpu: &mut Cpu, comment: u8);

    /// `SWI` from ARM state (24-bit comment field).
    fn swi32(&mut self, cpu: &mut Cpu, comment: u32);

    /// The decoder landed on a slot with no defined instruction.
    fn hit_illegal(&mut self, cpu: &mut Cpu, opcode: u32);

    /// Coprocessor instructions and `BKPT`: recognised encodings this core
    /// does not implement semantics for.
    fn hit_stub(&mut self, cpu: &mut Cpu, opcode: u32);

    /// Called after every CPSR write, giving the host a chance to react
    /// (e.g. re-evaluate whether a pending IRQ is now unmasked).
    fn read_cpsr(&mut self, cpsr: PSR);
}
