use crate::bits::BitOps;
use crate::cpu::arm::{ArmInstruction, ArmV4};
use crate::cpu::common::{self, ShiftType};
use crate::cpu::registers::{Mode, PC_REG};
use crate::cpu::Cpu;
use crate::interrupt::InterruptHandler;
use crate::memory::Memory;
use num_traits::FromPrimitive;

#[derive(Debug, Eq, PartialEq, Copy, Clone, num_derive::FromPrimitive)]
enum DataOperation {
    And = 0b0000,
    Eor = 0b0001,
    Sub = 0b0010,
    Rsb = 0b0011,
    Add = 0b0100,
    Adc = 0b0101,
    Sbc = 0b0110,
    Rsc = 0b0111,
    Tst = 0b1000,
    Teq = 0b1001,
    Cmp = 0b1010,
    Cmn = 0b1011,
    Orr = 0b1100,
    Mov = 0b1101,
    Bic = 0b1110,
    Mvn = 0b1111,
}

impl ArmV4 {
    pub fn data_processing_immediate(cpu: &mut Cpu, instruction: ArmInstruction, mem: &mut dyn Memory, _irq: &mut dyn InterruptHandler) {
        let mut cycles = 0u32;

        let opcode = DataOperation::from_u32(instruction.get_bits(21, 24)).unwrap();
        let set_flags = instruction.check_bit(20);
        let r_d = instruction.get_bits(12, 15) as usize;

        ArmV4::restore_cpsr_on_pc_write(cpu, r_d, set_flags);

        let r_n = instruction.get_bits(16, 19) as usize;
        let op1 = cpu.read_reg(r_n);

        // 8-bit immediate rotated right by 2x the 4-bit rotate field.
        let rotate = instruction.get_bits(8, 11) * 2;
        let imm = instruction.get_bits(0, 7);
        let (op2, shifter_carry) = if rotate == 0 {
            (imm, cpu.registers.cpsr.carry())
        } else {
            let rotated = imm.rotate_right(rotate);
            (rotated, rotated.check_bit(31))
        };

        ArmV4::perform_data_operation(cpu, mem, &mut cycles, opcode, op1, op2, r_d, set_flags, shifter_carry);
        cpu.cycles += cycles as u64;
    }

    pub fn data_processing_immediate_shift(cpu: &mut Cpu, instruction: ArmInstruction, mem: &mut dyn Memory, _irq: &mut dyn InterruptHandler) {
        let mut cycles = 0u32;

        let opcode = DataOperation::from_u32(instruction.get_bits(21, 24)).unwrap();
        let set_flags = instruction.check_bit(20);
        let r_d = instruction.get_bits(12, 15) as usize;

        ArmV4::restore_cpsr_on_pc_write(cpu, r_d, set_flags);

        let shift_type = ShiftType::from_u32(instruction.get_bits(5, 6)).unwrap();
        let r_m = instruction.get_bits(0, 3) as usize;
        let shift_amount = instruction.get_bits(7, 11) as u8;
        // The immediate #0 encoding for LSR/ASR means "shift by 32", same rule
        // as the Thumb shifted-register format.
        let shift_amount = if shift_amount == 0 && matches!(shift_type, ShiftType::LogicalRight | ShiftType::ArithRight) {
            32
        } else {
            shift_amount
        };

        let (op2, shifter_carry) = shift_type.perform_shift(cpu.read_reg(r_m), shift_amount, cpu.registers.cpsr.carry());

        let r_n = instruction.get_bits(16, 19) as usize;
        let op1 = cpu.read_reg(r_n);

        ArmV4::perform_data_operation(cpu, mem, &mut cycles, opcode, op1, op2, r_d, set_flags, shifter_carry);
        cpu.cycles += cycles as u64;
    }

    pub fn data_processing_register_shift(cpu: &mut Cpu, instruction: ArmInstruction, mem: &mut dyn Memory, _irq: &mut dyn InterruptHandler) {
        let mut cycles = 1; // register-controlled shift costs one internal cycle

        let opcode = DataOperation::from_u32(instruction.get_bits(21, 24)).unwrap();
        let set_flags = instruction.check_bit(20);
        let r_d = instruction.get_bits(12, 15) as usize;

        ArmV4::restore_cpsr_on_pc_write(cpu, r_d, set_flags);

        // PC reads as current-instruction-address + 12 while a register-controlled
        // shift is being resolved.
        cpu.registers.gprs[PC_REG] = cpu.registers.pc().wrapping_add(4);

        let shift_type = ShiftType::from_u32(instruction.get_bits(5, 6)).unwrap();
        let r_m = instruction.get_bits(0, 3) as usize;
        let shift_register = instruction.get_bits(8, 11) as usize;
        let shift_amount = cpu.read_reg(shift_register) as u8;

        let (op2, shifter_carry) = if shift_amount == 0 {
            (cpu.read_reg(r_m), cpu.registers.cpsr.carry())
        } else {
            shift_type.perform_shift(cpu.read_reg(r_m), shift_amount, cpu.registers.cpsr.carry())
        };

        let r_n = instruction.get_bits(16, 19) as usize;
        let op1 = cpu.read_reg(r_n);

        cpu.registers.gprs[PC_REG] = cpu.registers.pc().wrapping_sub(4);

        ArmV4::perform_data_operation(cpu, mem, &mut cycles, opcode, op1, op2, r_d, set_flags, shifter_carry);
        cpu.cycles += cycles as u64;
    }

    /// If `Rd` is PC and the S bit is set, restore CPSR from SPSR - this is
    /// how data-processing instructions return from an exception.
    fn restore_cpsr_on_pc_write(cpu: &mut Cpu, r_d: usize, set_flags: bool) {
        if r_d == PC_REG && set_flags && cpu.registers.cpsr.mode() != Mode::User {
            let spsr = cpu.registers.spsr;
            cpu.switch_mode(spsr.mode());
            cpu.registers.cpsr = spsr;
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn perform_data_operation(
        cpu: &mut Cpu,
        mem: &mut dyn Memory,
        cycles: &mut u32,
        opcode: DataOperation,
        op1: u32,
        op2: u32,
        r_d: usize,
        set_flags: bool,
        shifter_carry: bool,
    ) {
        match opcode {
            DataOperation::And => {
                let result = op1 & op2;
                cpu.write_reg(r_d, result, mem, cycles);
                if set_flags {
                    cpu.set_logical_flags(result, shifter_carry);
                }
            }
            DataOperation::Eor => {
                let result = op1 ^ op2;
                cpu.write_reg(r_d, result, mem, cycles);
                if set_flags {
                    cpu.set_logical_flags(result, shifter_carry);
                }
            }
            DataOperation::Sub => {
                let result = common::sub(cpu, op1, op2, set_flags);
                cpu.write_reg(r_d, result, mem, cycles);
            }
            DataOperation::Rsb => {
                let result = common::sub(cpu, op2, op1, set_flags);
                cpu.write_reg(r_d, result, mem, cycles);
            }
            DataOperation::Add => {
                let result = common::add(cpu, op1, op2, set_flags);
                cpu.write_reg(r_d, result, mem, cycles);
            }
            DataOperation::Adc => {
                let result = common::adc(cpu, op1, op2, set_flags);
                cpu.write_reg(r_d, result, mem, cycles);
            }
            DataOperation::Sbc => {
                let result = common::sbc(cpu, op1, op2, set_flags);
                cpu.write_reg(r_d, result, mem, cycles);
            }
            DataOperation::Rsc => {
                // Architectural order: Rn - (shifterOperand + !C); op1/op2 already
                // carry the Rn/shifterOperand assignment from the caller, so swap here.
                let result = common::sbc(cpu, op2, op1, set_flags);
                cpu.write_reg(r_d, result, mem, cycles);
            }
            DataOperation::Tst => {
                let result = op1 & op2;
                cpu.set_logical_flags(result, shifter_carry);
            }
            DataOperation::Teq => {
                let result = op1 ^ op2;
                cpu.set_logical_flags(result, shifter_carry);
            }
            DataOperation::Cmp => {
                common::sub(cpu, op1, op2, true);
            }
            DataOperation::Cmn => {
                common::add(cpu, op1, op2, true);
            }
            DataOperation::Orr => {
                let result = op1 | op2;
                cpu.write_reg(r_d, result, mem, cycles);
                if set_flags {
                    cpu.set_logical_flags(result, shifter_carry);
                }
            }
            DataOperation::Mov => {
                cpu.write_reg(r_d, op2, mem, cycles);
                if set_flags {
                    cpu.set_logical_flags(op2, shifter_carry);
                }
            }
            DataOperation::Bic => {
                let result = op1 & !op2;
                cpu.write_reg(r_d, result, mem, cycles);
                if set_flags {
                    cpu.set_logical_flags(result, shifter_carry);
                }
            }
            DataOperation::Mvn => {
                let result = !op2;
                cpu.write_reg(r_d, result, mem, cycles);
                if set_flags {
                    cpu.set_logical_flags(result, shifter_carry);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cpu::registers::PC_REG;
    use crate::test_support::TestMemory;

    fn cpu_with(r1: u32, r2: u32) -> Cpu {
        let mut cpu = Cpu::new();
        cpu.registers.write(1, r1);
        cpu.registers.write(2, r2);
        cpu
    }

    #[test]
    fn adds_sets_no_flags_on_simple_add() {
        let mut cpu = cpu_with(1, 2);
        let mut mem = TestMemory::new();
        // ADDS r0, r1, r2
        let instruction = 0xE091_0002u32;
        ArmV4::data_processing_immediate_shift(&mut cpu, instruction, &mut mem, &mut crate::test_support::NullIrq);

        assert_eq!(cpu.registers.read(0), 3);
        assert!(!cpu.registers.cpsr.zero());
        assert!(!cpu.registers.cpsr.carry());
        assert!(!cpu.registers.cpsr.overflow());
        assert!(!cpu.registers.cpsr.sign());
    }

    #[test]
    fn subs_produces_zero_with_no_borrow() {
        let mut cpu = cpu_with(5, 5);
        let mut mem = TestMemory::new();
        // SUBS r0, r1, r2
        let instruction = 0xE051_0002u32;
        ArmV4::data_processing_immediate_shift(&mut cpu, instruction, &mut mem, &mut crate::test_support::NullIrq);

        assert_eq!(cpu.registers.read(0), 0);
        assert!(cpu.registers.cpsr.zero());
        assert!(cpu.registers.cpsr.carry());
        assert!(!cpu.registers.cpsr.sign());
    }
}
