//! Exception vectors and the target privilege mode each exception enters.

use crate::cpu::registers::Mode;

/// The seven ARM7TDMI exception types.
#[derive(Debug, Eq, PartialEq, Copy, Clone)]
pub enum Exception {
    Reset,
    UndefinedInstruction,
    SoftwareInterrupt,
    PrefetchAbort,
    DataAbort,
    /// Unused on the GBA, but part of the architecture.
    FastInterrupt,
    Interrupt,
}

impl Exception {
    /// The address the PC is set to on entry.
    pub const fn vector(self) -> u32 {
        match self {
            Exception::Reset => 0x0000_0000,
            Exception::UndefinedInstruction => 0x0000_0004,
            Exception::SoftwareInterrupt => 0x0000_0008,
            Exception::PrefetchAbort => 0x0000_000C,
            Exception::DataAbort => 0x0000_0010,
            Exception::Interrupt => 0x0000_0018,
            Exception::FastInterrupt => 0x0000_001C,
        }
    }

    /// The privilege mode the CPU switches to on entry.
    pub const fn target_mode(self) -> Mode {
        match self {
            Exception::Reset => Mode::Supervisor,
            Exception::UndefinedInstruction => Mode::Undefined,
            Exception::SoftwareInterrupt => Mode::Supervisor,
            Exception::PrefetchAbort => Mode::Abort,
            Exception::DataAbort => Mode::Abort,
            Exception::Interrupt => Mode::IRQ,
            Exception::FastInterrupt => Mode::FIQ,
        }
    }

    /// Whether entry additionally sets the `F` (FIQ disable) bit, besides `I`.
    pub const fn disables_fiq(self) -> bool {
        matches!(self, Exception::Reset | Exception::FastInterrupt)
    }

    /// The value subtracted from the (pipelined) PC to compute the return-address
    /// stashed in `LR` on entry, per instruction width `width` (4 for ARM, 2 for Thumb).
    ///
    /// Expressed as `width - adjustment` in the spec; here directly as the subtraction
    /// amount so callers can do `lr = pc - return_offset(width)`.
    pub const fn return_offset(self, width: u32) -> u32 {
        match self {
            // Wrapping, not a plain subtraction: Thumb's width of 2 makes this
            // negative, and the caller's `pc.wrapping_sub(return_offset)` relies
            // on both sides being taken mod 2^32.
            Exception::Interrupt | Exception::DataAbort => width.wrapping_sub(4),
            Exception::SoftwareInterrupt | Exception::PrefetchAbort | Exception::UndefinedInstruction => width,
            Exception::Reset | Exception::FastInterrupt => width,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vectors_match_the_architectural_table() {
        assert_eq!(Exception::Reset.vector(), 0x0000_0000);
        assert_eq!(Exception::UndefinedInstruction.vector(), 0x0000_0004);
        assert_eq!(Exception::SoftwareInterrupt.vector(), 0x0000_0008);
        assert_eq!(Exception::PrefetchAbort.vector(), 0x0000_000C);
        assert_eq!(Exception::DataAbort.vector(), 0x0000_0010);
        assert_eq!(Exception::Interrupt.vector(), 0x0000_0018);
        assert_eq!(Exception::FastInterrupt.vector(), 0x0000_001C);
    }

    #[test]
    fn only_reset_and_fiq_force_the_f_bit() {
        assert!(Exception::Reset.disables_fiq());
        assert!(Exception::FastInterrupt.disables_fiq());
        assert!(!Exception::Interrupt.disables_fiq());
        assert!(!Exception::SoftwareInterrupt.disables_fiq());
        assert!(!Exception::DataAbort.disables_fiq());
        assert!(!Exception::PrefetchAbort.disables_fiq());
        assert!(!Exception::UndefinedInstruction.disables_fiq());
    }

    #[test]
    fn target_modes_match_the_architectural_table() {
        assert_eq!(Exception::Reset.target_mode(), Mode::Supervisor);
        assert_eq!(Exception::SoftwareInterrupt.target_mode(), Mode::Supervisor);
        assert_eq!(Exception::UndefinedInstruction.target_mode(), Mode::Undefined);
        assert_eq!(Exception::PrefetchAbort.target_mode(), Mode::Abort);
        assert_eq!(Exception::DataAbort.target_mode(), Mode::Abort);
        assert_eq!(Exception::Interrupt.target_mode(), Mode::IRQ);
        assert_eq!(Exception::FastInterrupt.target_mode(), Mode::FIQ);
    }

    #[test]
    fn irq_and_data_abort_link_one_instruction_further_back() {
        // IRQ/data-abort save `pc - (width - 4)`, the rest save `pc - width`.
        assert_eq!(Exception::Interrupt.return_offset(4), 0);
        assert_eq!(Exception::DataAbort.return_offset(4), 0);
        assert_eq!(Exception::SoftwareInterrupt.return_offset(4), 4);
        assert_eq!(Exception::UndefinedInstruction.return_offset(2), 2);
        assert_eq!(Exception::Interrupt.return_offset(2), -2i32 as u32);
    }
}
