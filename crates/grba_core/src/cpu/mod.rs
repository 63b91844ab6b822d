//! The ARM7TDMI interpreter: register file, pipeline, and instruction dispatch.

use crate::component::Component;
use crate::cpu::arm::{ArmLut, ArmV4};
use crate::cpu::common::switch_mode;
use crate::cpu::registers::{Mode, Registers, State, LINK_REG, PC_REG};
use crate::cpu::thumb::ThumbLut;
use crate::cpu_log;
use crate::exception::Exception;
use crate::interrupt::InterruptHandler;
use crate::memory::Memory;

pub mod arm;
pub mod common;
pub mod registers;
pub mod thumb;

/// Prefetch/waitstate cost of fetching the next instruction, charged at the
/// start of every handler before any instruction-specific work.
const PREFETCH_CYCLES: u32 = 1;

/// The ARM7TDMI core. Holds register state, the two decode tables, and the
/// scheduling state (`cycles`/`next_event`/`halted`) - nothing about the
/// memory map, interrupt sources, or attached peripherals, all of which are
/// supplied per call through [`Memory`] and [`InterruptHandler`].
pub struct Cpu {
    pub registers: Registers,
    /// Execute/decode/fetch pipeline. `pipeline[0]` is the instruction about
    /// to execute this step; `pipeline[2]` is the word most recently fetched.
    /// This is what keeps `PC` reading two instructions ahead of the one
    /// being executed (+8 in ARM state, +4 in Thumb).
    pipeline: [u32; 3],
    arm_lut: ArmLut,
    thumb_lut: ThumbLut,
    pub cycles: u64,
    pub next_event: u64,
    pub halted: bool,
}

impl Cpu {
    pub fn new() -> Cpu {
        Cpu {
            registers: Registers::default(),
            pipeline: [0; 3],
            arm_lut: arm::create_arm_lut(),
            thumb_lut: thumb::create_thumb_lut(),
            cycles: 0,
            next_event: 0,
            halted: false,
        }
    }

    /// Resets all registers and banks to power-on defaults, sets the PC to the
    /// reset vector, flushes the pipeline against `mem`, and notifies `irq`.
    pub fn reset(&mut self, mem: &mut dyn Memory, irq: &mut dyn InterruptHandler) {
        self.registers = Registers::default();
        self.registers.write(PC_REG, Exception::Reset.vector());
        self.cycles = 0;
        self.halted = false;

        mem.set_active_region(self.registers.pc());
        self.flush_pipeline(mem);

        irq.reset(self);
    }

    /// Runs `master`'s and then every extra component's `init` hook, in order.
    pub fn init_components(&mut self, master: &mut dyn Component, extras: &mut [&mut dyn Component]) {
        master.init(self);
        for extra in extras {
            extra.init(self);
        }
    }

    /// Advances the CPU by exactly one instruction, then - if the scheduling
    /// deadline has been reached - lets the host drain pending events.
    pub fn step(&mut self, mem: &mut dyn Memory, irq: &mut dyn InterruptHandler) {
        // Recovers from a pipeline flush, which only partly refills the
        // three slots - this first advance completes it.
        self.advance_pipeline(mem);

        match self.state() {
            State::Arm => {
                let instruction = self.pipeline[0];
                if ArmV4::condition_holds(self, instruction) {
                    let index = arm::lut_index(instruction);
                    let handler = self.arm_lut[index];
                    cpu_log!("arm  pc={:08x} instr={:08x}", self.registers.pc(), instruction);
                    handler(self, instruction, mem, irq);
                } else {
                    self.cycles += PREFETCH_CYCLES as u64;
                }
            }
            State::Thumb => {
                let instruction = self.pipeline[0] as u16;
                let index = thumb::lut_index(instruction);
                let handler = self.thumb_lut[index];
                cpu_log!("thumb pc={:08x} instr={:04x}", self.registers.pc(), instruction);
                handler(self, instruction, mem, irq);
            }
        }

        if self.cycles >= self.next_event {
            irq.process_events(self);
        }
    }

    /// Runs [`Cpu::step`] until the scheduling deadline is reached, then
    /// drains events exactly once more.
    pub fn run_loop(&mut self, mem: &mut dyn Memory, irq: &mut dyn InterruptHandler) {
        if self.halted {
            self.cycles = self.next_event;
            irq.process_events(self);
            return;
        }

        while self.cycles < self.next_event {
            self.step(mem, irq);

            if self.halted {
                self.cycles = self.next_event;
                break;
            }
        }

        irq.process_events(self);
    }

    #[inline(always)]
    fn advance_pipeline(&mut self, mem: &mut dyn Memory) {
        self.pipeline[0] = self.pipeline[1];
        self.pipeline[1] = self.pipeline[2];

        self.registers.gprs[PC_REG] = self.registers.pc().wrapping_add(self.state().instruction_width());

        let mut cycles = 0u32;
        self.pipeline[2] = match self.state() {
            State::Arm => mem.load32(self.registers.pc(), &mut cycles),
            State::Thumb => mem.load16(self.registers.pc(), &mut cycles) as u32,
        };
        self.cycles += cycles as u64;
    }

    /// Flushes the pipeline at the current PC: re-establishes the memory
    /// host's active-region cache and partially refills the pipeline (slots
    /// 1 and 2 only - slot 0 is left empty since [`Cpu::step`]'s next
    /// [`Cpu::advance_pipeline`] call shifts it in). Called whenever the PC
    /// is written directly (branches, exceptions, Rd=PC writes).
    fn flush_pipeline(&mut self, mem: &mut dyn Memory) {
        mem.set_active_region(self.registers.pc());

        self.pipeline[0] = 0;

        let mut cycles = 0u32;
        self.pipeline[1] = match self.state() {
            State::Arm => mem.load32(self.registers.pc(), &mut cycles),
            State::Thumb => mem.load16(self.registers.pc(), &mut cycles) as u32,
        };
        self.registers.gprs[PC_REG] = self.registers.pc().wrapping_add(self.state().instruction_width());
        self.pipeline[2] = match self.state() {
            State::Arm => mem.load32(self.registers.pc(), &mut cycles),
            State::Thumb => mem.load16(self.registers.pc(), &mut cycles) as u32,
        };
        self.cycles += cycles as u64;
    }

    /// Reads a general-purpose register. `reg` must be `0..16`.
    #[inline(always)]
    pub fn read_reg(&self, reg: usize) -> u32 {
        self.registers.read(reg)
    }

    /// Writes a general-purpose register. Writing [`PC_REG`] triggers the
    /// PC-write sequence (pipeline flush), charged against `cycles`.
    #[inline(always)]
    pub fn write_reg(&mut self, reg: usize, value: u32, mem: &mut dyn Memory, cycles: &mut u32) {
        if reg != PC_REG {
            self.registers.write(reg, value);
            return;
        }

        let aligned = match self.state() {
            State::Arm => value & !0b11,
            State::Thumb => value & !0b1,
        };
        self.registers.write(PC_REG, aligned);

        let before = self.cycles;
        self.flush_pipeline(mem);
        *cycles += (self.cycles - before) as u32;
    }

    #[inline(always)]
    pub fn state(&self) -> State {
        self.registers.cpsr.state()
    }

    /// The raw prefetch slots, exposed for host-side debuggers/disassemblers.
    /// Not used by the interpreter itself outside of `advance_pipeline`/`flush_pipeline`.
    #[cfg(feature = "debug-functionality")]
    pub fn pipeline(&self) -> [u32; 3] {
        self.pipeline
    }

    /// Switches execution state (ARM <-> Thumb) without touching the PC.
    pub fn switch_state(&mut self, new_state: State) {
        self.registers.cpsr.set_state(new_state);
    }

    /// Switches privilege mode, swapping banks as needed.
    pub fn switch_mode(&mut self, new_mode: Mode) {
        switch_mode(self, new_mode);
    }

    /// Raises `exception`, performing the full architectural entry sequence
    /// (§4.5): snapshot CPSR, bank swap, SPSR save, mode/interrupt-mask bits,
    /// LR computation, vector the PC, and switch to ARM state.
    pub fn raise_exception(&mut self, mem: &mut dyn Memory, exception: Exception) {
        let width = self.state().instruction_width();
        let return_offset = exception.return_offset(width);
        let link_value = self.registers.pc().wrapping_sub(return_offset);

        let old_cpsr = self.registers.cpsr;

        self.switch_mode(exception.target_mode());
        self.registers.spsr = old_cpsr;

        self.registers.cpsr.set_irq_disable(true);
        if exception.disables_fiq() {
            self.registers.cpsr.set_fiq_disable(true);
        }

        self.registers.write(LINK_REG, link_value);
        self.switch_state(State::Arm);
        self.registers.write(PC_REG, exception.vector());

        self.flush_pipeline(mem);
    }

    /// Raises the IRQ exception unless currently masked by `cpsr.I`.
    pub fn raise_irq(&mut self, mem: &mut dyn Memory, irq: &mut dyn InterruptHandler) {
        self.halted = false;

        if self.registers.cpsr.irq_disable() {
            return;
        }

        self.raise_exception(mem, Exception::Interrupt);
        irq.read_cpsr(self.registers.cpsr);
    }
}

impl Default for Cpu {
    fn default() -> Self {
        Cpu::new()
    }
}
