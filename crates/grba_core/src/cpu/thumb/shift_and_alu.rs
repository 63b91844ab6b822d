//! Formats 1-5: shifted-register moves, add/subtract, immediate ALU ops,
//! register ALU ops, and the Hi-register/branch-exchange family.

use crate::bits::BitOps;
use crate::cpu::common::{self, multiplier_cycles, ShiftType};
use crate::cpu::thumb::{ThumbInstruction, ThumbV4};
use crate::cpu::Cpu;
use crate::interrupt::InterruptHandler;
use crate::memory::Memory;
use num_traits::FromPrimitive;

impl ThumbV4 {
    /// Format 1: `LSL`/`LSR`/`ASR Rd, Rs, #offset`.
    pub fn move_shifted_register(cpu: &mut Cpu, instruction: ThumbInstruction, mem: &mut dyn Memory, _irq: &mut dyn InterruptHandler) {
        let mut cycles = 0u32;

        let shift_type = ShiftType::from_u16(instruction.get_bits(11, 12)).unwrap();
        let offset = instruction.get_bits(6, 10) as u8;
        let r_s = instruction.get_bits(3, 5) as usize;
        let r_d = instruction.get_bits(0, 2) as usize;

        // The immediate #0 encoding for LSR/ASR means "shift by 32", same rule
        // as the ARM addressing-mode-1 immediate shifter.
        let amount = if offset == 0 && shift_type != ShiftType::LogicalLeft { 32 } else { offset };

        let (value, carry) = shift_type.perform_shift(cpu.read_reg(r_s), amount, cpu.registers.cpsr.carry());

        cpu.write_reg(r_d, value, mem, &mut cycles);
        cpu.set_logical_flags(value, carry);
        cpu.cycles += cycles as u64;
    }

    /// Format 2: `ADD`/`SUB Rd, Rs, Rn` or `Rd, Rs, #imm3`.
    pub fn add_subtract(cpu: &mut Cpu, instruction: ThumbInstruction, mem: &mut dyn Memory, _irq: &mut dyn InterruptHandler) {
        let mut cycles = 0u32;

        let immediate = instruction.check_bit(10);
        let subtract = instruction.check_bit(9);
        let r_n_or_imm = instruction.get_bits(6, 8) as u32;
        let r_s = instruction.get_bits(3, 5) as usize;
        let r_d = instruction.get_bits(0, 2) as usize;

        let op1 = cpu.read_reg(r_s);
        let op2 = if immediate { r_n_or_imm } else { cpu.read_reg(r_n_or_imm as usize) };

        let result = if subtract { common::sub(cpu, op1, op2, true) } else { common::add(cpu, op1, op2, true) };
        cpu.write_reg(r_d, result, mem, &mut cycles);
        cpu.cycles += cycles as u64;
    }

    /// Format 3: `MOV`/`CMP`/`ADD`/`SUB Rd, #imm8`.
    pub fn move_compare_add_subtract_immediate(cpu: &mut Cpu, instruction: ThumbInstruction, mem: &mut dyn Memory, _irq: &mut dyn InterruptHandler) {
        let mut cycles = 0u32;

        let opcode = instruction.get_bits(11, 12);
        let r_d = instruction.get_bits(8, 10) as usize;
        let imm = instruction.get_bits(0, 7) as u32;

        match opcode {
            0b00 => {
                cpu.write_reg(r_d, imm, mem, &mut cycles);
                cpu.set_logical_flags(imm, cpu.registers.cpsr.carry());
            }
            0b01 => {
                common::sub(cpu, cpu.read_reg(r_d), imm, true);
            }
            0b10 => {
                let result = common::add(cpu, cpu.read_reg(r_d), imm, true);
                cpu.write_reg(r_d, result, mem, &mut cycles);
            }
            0b11 => {
                let result = common::sub(cpu, cpu.read_reg(r_d), imm, true);
                cpu.write_reg(r_d, result, mem, &mut cycles);
            }
            _ => unreachable!("2-bit field"),
        }

        cpu.cycles += cycles as u64;
    }

    /// Format 4: the 16 register-register ALU operations.
    pub fn alu_operations(cpu: &mut Cpu, instruction: ThumbInstruction, mem: &mut dyn Memory, _irq: &mut dyn InterruptHandler) {
        let mut cycles = 0u32;

        let opcode = instruction.get_bits(6, 9);
        let r_s = instruction.get_bits(3, 5) as usize;
        let r_d = instruction.get_bits(0, 2) as usize;

        let op1 = cpu.read_reg(r_d);
        let op2 = cpu.read_reg(r_s);
        let carry = cpu.registers.cpsr.carry();

        match opcode {
            0x0 => {
                // AND
                let result = op1 & op2;
                cpu.write_reg(r_d, result, mem, &mut cycles);
                cpu.set_logical_flags(result, carry);
            }
            0x1 => {
                // EOR
                let result = op1 ^ op2;
                cpu.write_reg(r_d, result, mem, &mut cycles);
                cpu.set_logical_flags(result, carry);
            }
            0x2 => {
                // LSL, register controlled
                cycles += 1;
                let (result, shift_carry) = ShiftType::LogicalLeft.perform_shift(op1, op2 as u8, carry);
                cpu.write_reg(r_d, result, mem, &mut cycles);
                cpu.set_logical_flags(result, shift_carry);
            }
            0x3 => {
                // LSR, register controlled
                cycles += 1;
                let (result, shift_carry) = ShiftType::LogicalRight.perform_shift(op1, op2 as u8, carry);
                cpu.write_reg(r_d, result, mem, &mut cycles);
                cpu.set_logical_flags(result, shift_carry);
            }
            0x4 => {
                // ASR, register controlled
                cycles += 1;
                let (result, shift_carry) = ShiftType::ArithRight.perform_shift(op1, op2 as u8, carry);
                cpu.write_reg(r_d, result, mem, &mut cycles);
                cpu.set_logical_flags(result, shift_carry);
            }
            0x5 => {
                // ADC
                let result = common::adc(cpu, op1, op2, true);
                cpu.write_reg(r_d, result, mem, &mut cycles);
            }
            0x6 => {
                // SBC
                let result = common::sbc(cpu, op1, op2, true);
                cpu.write_reg(r_d, result, mem, &mut cycles);
            }
            0x7 => {
                // ROR, register controlled. Rs & 0xFF == 0 is a no-op on operand
                // and carry - perform_shift's amount-0 case is the immediate
                // ROR #0 (RRX) encoding, which doesn't apply here.
                cycles += 1;
                let rotate_amount = op2 as u8;
                let (result, shift_carry) = if rotate_amount == 0 {
                    (op1, carry)
                } else {
                    ShiftType::RotateRight.perform_shift(op1, rotate_amount, carry)
                };
                cpu.write_reg(r_d, result, mem, &mut cycles);
                cpu.set_logical_flags(result, shift_carry);
            }
            0x8 => {
                // TST
                cpu.set_logical_flags(op1 & op2, carry);
            }
            0x9 => {
                // NEG
                let result = common::sub(cpu, 0, op2, true);
                cpu.write_reg(r_d, result, mem, &mut cycles);
            }
            0xA => {
                // CMP
                common::sub(cpu, op1, op2, true);
            }
            0xB => {
                // CMN
                common::add(cpu, op1, op2, true);
            }
            0xC => {
                // ORR
                let result = op1 | op2;
                cpu.write_reg(r_d, result, mem, &mut cycles);
                cpu.set_logical_flags(result, carry);
            }
            0xD => {
                // MUL
                cycles += multiplier_cycles(op2);
                let result = op1.wrapping_mul(op2);
                cpu.write_reg(r_d, result, mem, &mut cycles);
                cpu.set_zero_and_sign(result);
            }
            0xE => {
                // BIC
                let result = op1 & !op2;
                cpu.write_reg(r_d, result, mem, &mut cycles);
                cpu.set_logical_flags(result, carry);
            }
            0xF => {
                // MVN
                let result = !op2;
                cpu.write_reg(r_d, result, mem, &mut cycles);
                cpu.set_logical_flags(result, carry);
            }
            _ => unreachable!("4-bit field"),
        }

        cpu.cycles += cycles as u64;
    }

    /// Format 5: `ADD`/`CMP`/`MOV`/`BX` across the full register file via the
    /// `H1`/`H2` high-register selectors.
    pub fn hi_register_operations_and_branch_exchange(cpu: &mut Cpu, instruction: ThumbInstruction, mem: &mut dyn Memory, _irq: &mut dyn InterruptHandler) {
        let mut cycles = 0u32;

        let opcode = instruction.get_bits(8, 9);
        let h1 = instruction.check_bit(7);
        let h2 = instruction.check_bit(6);
        let r_d = instruction.get_bits(0, 2) as usize + if h1 { 8 } else { 0 };
        let r_s = instruction.get_bits(3, 5) as usize + if h2 { 8 } else { 0 };

        let op1 = cpu.read_reg(r_d);
        let op2 = cpu.read_reg(r_s);

        match opcode {
            0b00 => {
                // ADD, flags unaffected
                let result = common::add(cpu, op1, op2, false);
                cpu.write_reg(r_d, result, mem, &mut cycles);
            }
            0b01 => {
                // CMP
                common::sub(cpu, op1, op2, true);
            }
            0b10 => {
                // MOV
                cpu.write_reg(r_d, op2, mem, &mut cycles);
            }
            0b11 => {
                // BX
                common::branch_and_exchange(cpu, op2, mem, &mut cycles);
            }
            _ => unreachable!("2-bit field"),
        }

        cpu.cycles += cycles as u64;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{NullIrq, TestMemory};

    #[test]
    fn lsl_immediate_shifts_and_sets_carry() {
        let mut cpu = Cpu::new();
        cpu.registers.write(1, 0x8000_0000);
        let mut mem = TestMemory::new();

        // LSL r0, r1, #1
        let instruction = 0b0000_0000_0100_1000u16;
        ThumbV4::move_shifted_register(&mut cpu, instruction, &mut mem, &mut NullIrq);

        assert_eq!(cpu.registers.read(0), 0);
        assert!(cpu.registers.cpsr.carry());
        assert!(cpu.registers.cpsr.zero());
    }

    #[test]
    fn add_subtract_immediate3() {
        let mut cpu = Cpu::new();
        cpu.registers.write(1, 5);
        let mut mem = TestMemory::new();

        // SUB r0, r1, #2
        let instruction = 0b0001_1110_1000_1000u16;
        ThumbV4::add_subtract(&mut cpu, instruction, &mut mem, &mut NullIrq);

        assert_eq!(cpu.registers.read(0), 3);
        assert!(cpu.registers.cpsr.carry());
    }

    #[test]
    fn mov_immediate_sets_zero_flag_for_zero() {
        let mut cpu = Cpu::new();
        let mut mem = TestMemory::new();

        // MOV r0, #0
        let instruction = 0b0010_0000_0000_0000u16;
        ThumbV4::move_compare_add_subtract_immediate(&mut cpu, instruction, &mut mem, &mut NullIrq);

        assert_eq!(cpu.registers.read(0), 0);
        assert!(cpu.registers.cpsr.zero());
    }

    #[test]
    fn alu_and_masks_registers() {
        let mut cpu = Cpu::new();
        cpu.registers.write(0, 0xFF);
        cpu.registers.write(1, 0x0F);
        let mut mem = TestMemory::new();

        // AND r0, r1
        let instruction = 0b0100_0000_00_001_000u16;
        ThumbV4::alu_operations(&mut cpu, instruction, &mut mem, &mut NullIrq);

        assert_eq!(cpu.registers.read(0), 0x0F);
    }

    #[test]
    fn alu_mul_multiplies() {
        let mut cpu = Cpu::new();
        cpu.registers.write(0, 6);
        cpu.registers.write(1, 7);
        let mut mem = TestMemory::new();

        // MUL r0, r1
        let instruction = 0b0100_0011_01_001_000u16;
        ThumbV4::alu_operations(&mut cpu, instruction, &mut mem, &mut NullIrq);

        assert_eq!(cpu.registers.read(0), 42);
    }

    #[test]
    fn hi_register_mov_reaches_high_registers() {
        let mut cpu = Cpu::new();
        cpu.registers.write(9, 0x1234);
        let mut mem = TestMemory::new();

        // MOV r0, r9 (H2 set, Rs field = 1)
        let instruction = 0b0100_0110_01_001_000u16;
        ThumbV4::hi_register_operations_and_branch_exchange(&mut cpu, instruction, &mut mem, &mut NullIrq);

        assert_eq!(cpu.registers.read(0), 0x1234);
    }
}
