use crate::bits::BitOps;
use crate::cpu::arm::{ArmInstruction, ArmV4};
use crate::cpu::Cpu;
use crate::interrupt::InterruptHandler;
use crate::memory::Memory;

impl ArmV4 {
    /// `SWP`/`SWPB`: atomic (from the CPU's perspective - no other bus master
    /// can interleave between the load and the store) load-then-store.
    pub fn single_data_swap(cpu: &mut Cpu, instruction: ArmInstruction, mem: &mut dyn Memory, _irq: &mut dyn InterruptHandler) {
        let mut cycles = 1u32; // internal cycle between the load and the store

        let byte_transfer = instruction.check_bit(22);
        let r_n = instruction.get_bits(16, 19) as usize;
        let r_d = instruction.get_bits(12, 15) as usize;
        let r_m = instruction.get_bits(0, 3) as usize;

        let address = cpu.read_reg(r_n);
        let source = cpu.read_reg(r_m);

        let loaded = if byte_transfer {
            let value = mem.load8(address, &mut cycles) as u32;
            mem.store8(address, source as u8, &mut cycles);
            value
        } else {
            let word = mem.load32(address & !0b11, &mut cycles);
            let value = word.rotate_right((address & 0b11) * 8);
            mem.store32(address & !0b11, source, &mut cycles);
            value
        };

        cpu.write_reg(r_d, loaded, mem, &mut cycles);
        cpu.cycles += cycles as u64;
    }
}
