use crate::bits::BitOps;
use crate::cpu::arm::{ArmInstruction, ArmV4};
use crate::cpu::registers::Mode;
use crate::cpu::Cpu;
use crate::interrupt::InterruptHandler;
use crate::memory::Memory;

impl ArmV4 {
    /// `MRS Rd, CPSR|SPSR`.
    pub fn mrs(cpu: &mut Cpu, instruction: ArmInstruction, mem: &mut dyn Memory, _irq: &mut dyn InterruptHandler) {
        let mut cycles = 0u32;

        let source_spsr = instruction.check_bit(22);
        let r_d = instruction.get_bits(12, 15) as usize;

        let value = if source_spsr { cpu.registers.spsr.as_raw() } else { cpu.registers.cpsr.as_raw() };
        cpu.write_reg(r_d, value, mem, &mut cycles);

        cpu.cycles += cycles as u64;
    }

    /// `MSR CPSR|SPSR, #imm` (rotated 8-bit immediate, same encoding as the
    /// data-processing immediate operand).
    pub fn msr_immediate(cpu: &mut Cpu, instruction: ArmInstruction, mem: &mut dyn Memory, _irq: &mut dyn InterruptHandler) {
        let mut cycles = 0u32;

        let rotate = instruction.get_bits(8, 11) * 2;
        let value = instruction.get_bits(0, 7).rotate_right(rotate);

        ArmV4::write_psr_fields(cpu, instruction, value);
        cpu.cycles += cycles as u64;
        let _ = mem;
    }

    /// `MSR CPSR|SPSR, Rm`.
    pub fn msr_register(cpu: &mut Cpu, instruction: ArmInstruction, mem: &mut dyn Memory, _irq: &mut dyn InterruptHandler) {
        let cycles = 0u32;

        let r_m = instruction.get_bits(0, 3) as usize;
        let value = cpu.read_reg(r_m);

        ArmV4::write_psr_fields(cpu, instruction, value);
        cpu.cycles += cycles as u64;
        let _ = mem;
    }

    /// Applies `value` to either CPSR or SPSR, masked by the `c` (control byte,
    /// bit 16) and `f` (flags byte, bit 19) field selectors. The `s`/`x` byte
    /// selectors (bits 17/18) carry no meaning on ARMv4T (no extension register
    /// banks) and are ignored rather than silently treated as `c`/`f`.
    fn write_psr_fields(cpu: &mut Cpu, instruction: ArmInstruction, value: u32) {
        let dest_spsr = instruction.check_bit(22);
        let write_control = instruction.check_bit(16);
        let write_flags = instruction.check_bit(19);

        if dest_spsr {
            if !cpu.registers.cpsr.mode().has_spsr() {
                return;
            }
            if write_flags {
                cpu.registers.spsr.set_flags_byte(value);
            }
            if write_control {
                cpu.registers.spsr.set_control_byte(value);
            }
            return;
        }

        if write_flags {
            cpu.registers.cpsr.set_flags_byte(value);
        }

        // Control-byte writes (mode, I, F, T) are ignored entirely in User
        // mode - there is no privileged state to leave it from.
        if write_control && cpu.registers.cpsr.mode() != Mode::User {
            if let Some(new_mode) = Mode::try_from_raw(value) {
                if new_mode != cpu.registers.cpsr.mode() {
                    cpu.switch_mode(new_mode);
                }
            }
            cpu.registers.cpsr.set_control_byte(value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cpu::registers::PSR;
    use crate::test_support::{NullIrq, TestMemory};

    #[test]
    fn mrs_reads_cpsr_into_register() {
        let mut cpu = Cpu::new();
        cpu.registers.cpsr = PSR::from_raw(0xDEAD_BEEF & !0x1F | 0x1F);
        let mut mem = TestMemory::new();

        // MRS r0, CPSR
        let instruction = 0xE10F_0000u32;
        ArmV4::mrs(&mut cpu, instruction, &mut mem, &mut NullIrq);

        assert_eq!(cpu.registers.read(0), cpu.registers.cpsr.as_raw());
    }

    #[test]
    fn msr_immediate_sets_only_flag_bits() {
        let mut cpu = Cpu::new();
        let mut mem = TestMemory::new();

        // Directly drive the field-mask logic instead of hand-encoding the
        // immediate rotate, since the point under test is the masking, not
        // the rotate decode (covered by data_processing tests). Bit 19 set
        // (write flags), bit 22 and bit 16 clear (CPSR target, no control write).
        ArmV4::write_psr_fields(&mut cpu, 0x0008_0000, 0xFFFF_FFFF);
        assert_eq!(cpu.registers.cpsr.as_raw() & 0xF000_0000, 0xF000_0000);
        assert_eq!(cpu.registers.cpsr.as_raw() & 0xFF, PSR::default().as_raw() & 0xFF);
    }

    #[test]
    fn msr_control_byte_is_ignored_in_user_mode() {
        let mut cpu = Cpu::new();
        cpu.switch_mode(Mode::User);
        let before = cpu.registers.cpsr;

        // Bit 16 set (write control), targeting CPSR, attempting to enter Supervisor.
        ArmV4::write_psr_fields(&mut cpu, 0x0001_0000, Mode::Supervisor as u32);

        assert_eq!(cpu.registers.cpsr, before);
        assert_eq!(cpu.registers.cpsr.mode(), Mode::User);
    }
}
