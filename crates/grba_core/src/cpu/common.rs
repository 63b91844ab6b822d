//! Behaviour shared between the ARM and Thumb instruction sets: the
//! addressing-mode-1 shifter, condition evaluation, and the handful of ALU
//! primitives (add/sub/adc/sbc) both instruction sets build their opcodes on.

use crate::bits::{has_sign_overflowed, BitOps};
use crate::cpu::registers::{Mode, PSR};
use crate::cpu::Cpu;
use crate::cpu_log;
use crate::memory::Memory;

#[derive(Debug, Eq, PartialEq, Copy, Clone, num_derive::FromPrimitive)]
pub enum ShiftType {
    LogicalLeft = 0b00,
    LogicalRight = 0b01,
    ArithRight = 0b10,
    RotateRight = 0b11,
}

impl ShiftType {
    /// Performs the shift, returning `(result, carry_out)`. `shift_amount` is
    /// the already-resolved amount (0..=255 for register-controlled shifts,
    /// 0..=31 for immediate ones - the immediate encoding for LSR/ASR #0
    /// should be translated to `32` by the caller before reaching here).
    #[inline]
    pub fn perform_shift(self, value: u32, shift_amount: u8, current_carry: bool) -> (u32, bool) {
        match self {
            ShiftType::LogicalLeft => match shift_amount {
                0 => (value, current_carry),
                1..=31 => {
                    let carry = value.check_bit(32 - shift_amount);
                    (value << shift_amount, carry)
                }
                32 => (0, value.check_bit(0)),
                _ => (0, false),
            },
            ShiftType::LogicalRight => {
                if shift_amount == 0 {
                    (value, current_carry)
                } else if shift_amount < 32 {
                    let carry = value.check_bit(shift_amount - 1);
                    (value >> shift_amount, carry)
                } else {
                    (0, value.check_bit(31))
                }
            }
            ShiftType::ArithRight => {
                if shift_amount == 0 {
                    (value, current_carry)
                } else if shift_amount < 32 {
                    let carry = value.check_bit(shift_amount - 1);
                    let shifted = ((value as i32) >> shift_amount) as u32;
                    (shifted, carry)
                } else {
                    // Architectural ASR #32 form: operand is the sign extended to
                    // every bit, not merely the boolean 0/1 the carry-out implies.
                    let carry = value.check_bit(31);
                    let shifted = if carry { u32::MAX } else { 0 };
                    (shifted, carry)
                }
            }
            ShiftType::RotateRight => {
                if shift_amount == 0 {
                    // RRX: current carry becomes bit 31, value shifts right by one.
                    let carry_in = (current_carry as u32) << 31;
                    (carry_in | (value >> 1), value.check_bit(0))
                } else {
                    let amount = shift_amount as u32 % 32;
                    let shifted = value.rotate_right(amount);
                    (shifted, shifted.check_bit(31))
                }
            }
        }
    }
}

impl Cpu {
    #[inline(always)]
    pub(crate) fn set_zero_and_sign(&mut self, value: u32) {
        self.registers.cpsr.set_zero(value == 0);
        self.registers.cpsr.set_sign(value.check_bit(31));
    }

    #[inline(always)]
    pub(crate) fn set_logical_flags(&mut self, value: u32, carry: bool) {
        self.set_zero_and_sign(value);
        self.registers.cpsr.set_carry(carry);
    }

    #[inline(always)]
    pub(crate) fn set_arithmetic_flags(&mut self, value: u32, carry: bool, overflow: bool) {
        self.set_logical_flags(value, carry);
        self.registers.cpsr.set_overflow(overflow);
    }
}

/// Evaluates a 4-bit ARM/Thumb condition code against the given CPSR.
pub fn check_condition(cpsr: PSR, condition: u8) -> bool {
    match condition {
        0b0000 => cpsr.zero(),
        0b0001 => !cpsr.zero(),
        0b0010 => cpsr.carry(),
        0b0011 => !cpsr.carry(),
        0b0100 => cpsr.sign(),
        0b0101 => !cpsr.sign(),
        0b0110 => cpsr.overflow(),
        0b0111 => !cpsr.overflow(),
        0b1000 => cpsr.carry() && !cpsr.zero(),
        0b1001 => !cpsr.carry() || cpsr.zero(),
        0b1010 => cpsr.sign() == cpsr.overflow(),
        0b1011 => cpsr.sign() != cpsr.overflow(),
        0b1100 => !cpsr.zero() && (cpsr.sign() == cpsr.overflow()),
        0b1101 => cpsr.zero() || (cpsr.sign() != cpsr.overflow()),
        0b1110 => true,
        0b1111 => false,
        _ => unreachable!("condition field is only ever 4 bits"),
    }
}

#[inline]
pub fn add(cpu: &mut Cpu, op1: u32, op2: u32, write_flags: bool) -> u32 {
    let (result, carry) = op1.overflowing_add(op2);

    if write_flags {
        cpu.set_arithmetic_flags(result, carry, has_sign_overflowed(op1, op2, result));
    }

    result
}

#[inline]
pub fn sub(cpu: &mut Cpu, op1: u32, op2: u32, write_flags: bool) -> u32 {
    let (result, borrowed) = op1.overflowing_sub(op2);

    if write_flags {
        // ARM's carry flag for subtraction is "no borrow occurred", the inverse
        // of Rust's `overflowing_sub`. Overflow is computed as if adding `!op2`,
        // matching how the hardware's adder actually performs a subtract.
        cpu.set_arithmetic_flags(result, !borrowed, has_sign_overflowed(op1, !op2, result));
    }

    result
}

#[inline]
pub fn adc(cpu: &mut Cpu, op1: u32, op2: u32, write_flags: bool) -> u32 {
    let full_result = op1 as u64 + op2 as u64 + cpu.registers.cpsr.carry() as u64;
    let result = full_result as u32;

    if write_flags {
        cpu.set_arithmetic_flags(result, full_result.check_bit(32), has_sign_overflowed(op1, op2, result));
    }

    result
}

#[inline]
pub fn sbc(cpu: &mut Cpu, op1: u32, op2: u32, write_flags: bool) -> u32 {
    let to_subtract = (op2 as u64).wrapping_add(!cpu.registers.cpsr.carry() as u64);
    let (full_result, borrowed) = (op1 as u64).overflowing_sub(to_subtract);
    let result = full_result as u32;

    if write_flags {
        cpu.set_arithmetic_flags(result, !borrowed, has_sign_overflowed(op1, !op2, result));
    }

    result
}

/// `BX`-style branch and (possible) instruction-set exchange: bit 0 of
/// `address` selects Thumb, the rest becomes the new PC.
#[inline]
pub fn branch_and_exchange(cpu: &mut Cpu, address: u32, mem: &mut dyn Memory, cycles: &mut u32) {
    use crate::cpu::registers::{State, PC_REG};

    let new_state = State::from_t_bit(address.check_bit(0));
    cpu.switch_state(new_state);
    cpu.write_reg(PC_REG, address, mem, cycles);
}

/// Number of extra internal cycles the multiplier takes, determined by how
/// many of the top bits of `rs` are all-0 or all-1 (early termination: the
/// ARM7TDMI's booth multiplier can skip a cycle once the remaining bits of
/// the multiplier are known not to change the result). Shared by the ARM
/// `MUL`/`MLA`/`*MULL`/`*MLAL` family and Thumb's `MUL`.
pub(crate) fn multiplier_cycles(rs: u32) -> u32 {
    if rs & 0xFFFF_FF00 == 0 || rs & 0xFFFF_FF00 == 0xFFFF_FF00 {
        1
    } else if rs & 0xFFFF_0000 == 0 || rs & 0xFFFF_0000 == 0xFFFF_0000 {
        2
    } else if rs & 0xFF00_0000 == 0 || rs & 0xFF00_0000 == 0xFF00_0000 {
        3
    } else {
        4
    }
}

/// Switches privilege mode, swapping register/SPSR banks as needed. Does not
/// touch the `T` bit.
pub fn switch_mode(cpu: &mut Cpu, new_mode: Mode) {
    let old_mode = cpu.registers.cpsr.mode();

    if !cpu.registers.swap_banks(old_mode, new_mode, true) {
        return;
    }

    cpu_log!("mode switch: {:?} -> {:?}", old_mode, new_mode);
    cpu.registers.cpsr.set_mode(new_mode);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lsl_by_zero_preserves_carry() {
        let (value, carry) = ShiftType::LogicalLeft.perform_shift(0xFFFF_FFFF, 0, false);
        assert_eq!(value, 0xFFFF_FFFF);
        assert!(!carry);
    }

    #[test]
    fn lsr_by_32_is_all_zero_carry_from_sign() {
        let (value, carry) = ShiftType::LogicalRight.perform_shift(0x8000_0000, 32, false);
        assert_eq!(value, 0);
        assert!(carry);
    }

    #[test]
    fn asr_by_32_sign_extends_fully() {
        let (value, carry) = ShiftType::ArithRight.perform_shift(0x8000_0000, 32, false);
        assert_eq!(value, 0xFFFF_FFFF);
        assert!(carry);

        let (value, carry) = ShiftType::ArithRight.perform_shift(0x7FFF_FFFF, 32, false);
        assert_eq!(value, 0);
        assert!(!carry);
    }

    #[test]
    fn ror_by_zero_is_rrx() {
        let (value, carry) = ShiftType::RotateRight.perform_shift(0b10, 0, true);
        assert_eq!(value, 0x8000_0001);
        assert!(!carry);
    }

    #[test]
    fn condition_table_matches_architecture() {
        let mut cpsr = PSR::default();
        cpsr.set_zero(true);
        assert!(check_condition(cpsr, 0b0000));
        assert!(!check_condition(cpsr, 0b0001));
        assert!(check_condition(cpsr, 0b1110));
        assert!(!check_condition(cpsr, 0b1111));
    }
}
