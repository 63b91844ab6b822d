use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use grba_core::cpu::registers::PSR;
use grba_core::cpu::Cpu;
use grba_core::interrupt::InterruptHandler;
use grba_core::memory::{Direction, Memory};

struct FlatMemory {
    data: Vec<u8>,
}

impl FlatMemory {
    fn new() -> Self {
        FlatMemory { data: vec![0; 1024 * 1024] }
    }

    fn write32(&mut self, address: u32, value: u32) {
        let address = address as usize;
        self.data[address..address + 4].copy_from_slice(&value.to_le_bytes());
    }
}

impl Memory for FlatMemory {
    fn load32(&mut self, address: u32, _cycles: &mut u32) -> u32 {
        let address = (address & !0b11) as usize;
        u32::from_le_bytes(self.data[address..address + 4].try_into().unwrap())
    }

    fn load16(&mut self, address: u32, _cycles: &mut u32) -> u16 {
        let address = (address & !0b1) as usize;
        u16::from_le_bytes(self.data[address..address + 2].try_into().unwrap())
    }

    fn load8(&mut self, address: u32, _cycles: &mut u32) -> u8 {
        self.data[address as usize]
    }

    fn store32(&mut self, address: u32, value: u32, _cycles: &mut u32) {
        self.write32(address & !0b11, value);
    }

    fn store16(&mut self, address: u32, value: u16, _cycles: &mut u32) {
        let address = (address & !0b1) as usize;
        self.data[address..address + 2].copy_from_slice(&value.to_le_bytes());
    }

    fn store8(&mut self, address: u32, value: u8, _cycles: &mut u32) {
        self.data[address as usize] = value;
    }

    fn load_multiple(&mut self, _base_address: u32, _register_mask: u16, _direction: Direction, _cycles: &mut u32, _transfer: &mut dyn FnMut(usize, u32)) {}

    fn store_multiple(&mut self, _base_address: u32, _register_mask: u16, _direction: Direction, _cycles: &mut u32, _transfer: &mut dyn FnMut(usize) -> u32) {}

    fn set_active_region(&mut self, _pc: u32) {}
}

struct NullIrq;

impl InterruptHandler for NullIrq {
    fn reset(&mut self, _cpu: &mut Cpu) {}
    fn process_events(&mut self, _cpu: &mut Cpu) {}
    fn swi16(&mut self, _cpu: &mut Cpu, _comment: u8) {}
    fn swi32(&mut self, _cpu: &mut Cpu, _comment: u32) {}
    fn hit_illegal(&mut self, _cpu: &mut Cpu, _opcode: u32) {}
    fn hit_stub(&mut self, _cpu: &mut Cpu, _opcode: u32) {}
    fn read_cpsr(&mut self, _cpsr: PSR) {}
}

fn bench_step_loop(c: &mut Criterion) {
    let mut group = c.benchmark_group("CpuStep");
    for steps in [64u64, 1024u64].iter() {
        group.bench_with_input(BenchmarkId::new("ArmAddLoop", steps), steps, |b, steps| {
            b.iter(|| {
                let mut cpu = Cpu::new();
                let mut mem = FlatMemory::new();
                let mut irq = NullIrq;
                cpu.reset(&mut mem, &mut irq);

                // ADDS r0, r0, #1, at every instruction slot - exercises fetch,
                // condition check, and data-processing dispatch in a tight loop.
                for addr in (0..(*steps * 4)).step_by(4) {
                    mem.write32(addr as u32, 0xE290_0001);
                }

                for _ in 0..*steps {
                    cpu.step(&mut mem, &mut irq);
                }
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_step_loop);
criterion_main!(benches);
