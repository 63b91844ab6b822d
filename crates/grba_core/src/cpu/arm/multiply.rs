use crate::bits::BitOps;
use crate::cpu::arm::{ArmInstruction, ArmV4};
use crate::cpu::common::multiplier_cycles;
use crate::cpu::Cpu;
use crate::interrupt::InterruptHandler;
use crate::memory::Memory;

impl ArmV4 {
    /// `MUL`/`MLA`.
    pub fn multiply(cpu: &mut Cpu, instruction: ArmInstruction, mem: &mut dyn Memory, _irq: &mut dyn InterruptHandler) {
        let mut cycles = 0u32;

        let accumulate = instruction.check_bit(21);
        let set_flags = instruction.check_bit(20);
        let r_d = instruction.get_bits(16, 19) as usize;
        let r_n = instruction.get_bits(12, 15) as usize;
        let r_s = instruction.get_bits(8, 11) as usize;
        let r_m = instruction.get_bits(0, 3) as usize;

        let rs_value = cpu.read_reg(r_s);
        cycles += multiplier_cycles(rs_value);
        if accumulate {
            cycles += 1;
        }

        let mut result = cpu.read_reg(r_m).wrapping_mul(rs_value);
        if accumulate {
            result = result.wrapping_add(cpu.read_reg(r_n));
        }

        cpu.write_reg(r_d, result, mem, &mut cycles);

        if set_flags {
            cpu.set_zero_and_sign(result);
        }

        cpu.cycles += cycles as u64;
    }

    /// `UMULL`/`UMLAL`/`SMULL`/`SMLAL`.
    pub fn multiply_long(cpu: &mut Cpu, instruction: ArmInstruction, mem: &mut dyn Memory, _irq: &mut dyn InterruptHandler) {
        let mut cycles = 1u32; // one extra internal cycle vs the 32-bit multiply

        let signed = instruction.check_bit(22);
        let accumulate = instruction.check_bit(21);
        let set_flags = instruction.check_bit(20);
        let r_d_hi = instruction.get_bits(16, 19) as usize;
        let r_d_lo = instruction.get_bits(12, 15) as usize;
        let r_s = instruction.get_bits(8, 11) as usize;
        let r_m = instruction.get_bits(0, 3) as usize;

        let rs_value = cpu.read_reg(r_s);
        cycles += multiplier_cycles(rs_value);
        if accumulate {
            cycles += 1;
        }

        let rm_value = cpu.read_reg(r_m);

        let product: u64 = if signed {
            ((rm_value as i32) as i64).wrapping_mul((rs_value as i32) as i64) as u64
        } else {
            (rm_value as u64).wrapping_mul(rs_value as u64)
        };

        let result = if accumulate {
            let existing = ((cpu.read_reg(r_d_hi) as u64) << 32) | cpu.read_reg(r_d_lo) as u64;
            product.wrapping_add(existing)
        } else {
            product
        };

        cpu.write_reg(r_d_lo, result as u32, mem, &mut cycles);
        cpu.write_reg(r_d_hi, (result >> 32) as u32, mem, &mut cycles);

        if set_flags {
            cpu.set_zero_and_sign(result as u32);
            cpu.registers.cpsr.set_zero(result == 0);
            cpu.registers.cpsr.set_sign((result >> 32).check_bit(31));
        }

        cpu.cycles += cycles as u64;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{NullIrq, TestMemory};

    #[test]
    fn mul_multiplies_two_registers() {
        let mut cpu = Cpu::new();
        cpu.registers.write(1, 6);
        cpu.registers.write(2, 7);
        let mut mem = TestMemory::new();

        // MUL r0, r1, r2
        let instruction = 0xE000_0291u32;
        ArmV4::multiply(&mut cpu, instruction, &mut mem, &mut NullIrq);

        assert_eq!(cpu.registers.read(0), 42);
    }

    #[test]
    fn umull_produces_64_bit_result_split_across_registers() {
        let mut cpu = Cpu::new();
        cpu.registers.write(2, 0xFFFF_FFFF);
        cpu.registers.write(3, 2);
        let mut mem = TestMemory::new();

        // UMULL r0, r1, r2, r3
        let instruction = 0xE080_1392u32;
        ArmV4::multiply_long(&mut cpu, instruction, &mut mem, &mut NullIrq);

        let result = ((cpu.registers.read(1) as u64) << 32) | cpu.registers.read(0) as u64;
        assert_eq!(result, 0xFFFF_FFFEu64);
    }
}
