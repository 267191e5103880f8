//! An interpreter for the integer subset of the MIPS I instruction set.
//!
//! Only register state is modeled: the general purpose registers, hi/lo and the pc. There is
//! no memory, so loads and stores decode but have nothing to run against, and there are no
//! exceptions, pipeline or timing.

use instructions::{decode, DecodeError, Instruction, RawInstruction};
use regfile::RegFile;

pub mod instructions;
pub mod regfile;
mod dispatch;
mod execute;

#[derive(Debug, Copy, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Fault {
    #[error("no handler for `{0}`")]
    Unhandled(Instruction),
    #[error("division by zero in `{0}`")]
    DivideByZero(Instruction),
    #[error(transparent)]
    Decode(#[from] DecodeError),
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Step {
    Retired,
    /// The pc was still advanced, nothing else changed
    Faulted(Fault),
    /// pc is outside the program, nothing was fetched
    Halted,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Reason {
    /// Ran off the end of the program
    Halted,
    /// Hit the step limit
    Limited,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct RunResult {
    pub steps: u64,
    pub faults: u64,
    pub reason: Reason,
}

/// Architectural state, and the only thing that changes it.
#[derive(Clone, PartialEq, Eq, Default)]
pub struct Core {
    regs: RegFile,
    hi: u32,
    lo: u32,
    pc: u32,
    retired: u64,
}

impl Core {
    pub fn new() -> Core {
        Core::default()
    }

    pub fn registers(&self) -> &[u32; 32] {
        self.regs.as_array()
    }

    pub fn register(&self, reg: u8) -> u32 {
        self.regs.read(reg)
    }

    pub fn regfile(&self) -> &RegFile {
        &self.regs
    }

    pub fn hi(&self) -> u32 {
        self.hi
    }

    pub fn lo(&self) -> u32 {
        self.lo
    }

    pub fn pc(&self) -> u32 {
        self.pc
    }

    /// Instructions that ran without a fault
    pub fn retired(&self) -> u64 {
        self.retired
    }

    pub fn set_pc(&mut self, pc: u32) {
        self.pc = pc;
    }

    pub fn set_register(&mut self, reg: u8, val: u32) {
        self.regs.write(reg, val);
    }

    /// Fetches `program[pc / 4]`, advances pc by 4, then decodes and executes it.
    ///
    /// Faults aren't fatal. They are logged and returned, and leave everything but the pc
    /// untouched, so the caller is free to keep stepping.
    pub fn step(&mut self, program: &[RawInstruction]) -> Step {
        let address = self.pc;
        let Some(&raw) = program.get((address / 4) as usize) else {
            return Step::Halted;
        };

        self.pc = address.wrapping_add(4);

        let result = match decode(raw) {
            Ok(instruction) => {
                log::trace!("{:08x}: {:08x}    {}", address, raw, instruction.disassemble(Some(address)));
                self.execute(instruction)
            }
            Err(err) => Err(Fault::from(err)),
        };

        match result {
            Ok(()) => {
                self.retired += 1;
                Step::Retired
            }
            Err(fault) => {
                log::warn!("{:08x}: {}", address, fault);
                Step::Faulted(fault)
            }
        }
    }

    /// Steps until the pc leaves the program or `max_steps` instructions have been fetched
    pub fn run(&mut self, program: &[RawInstruction], max_steps: u64) -> RunResult {
        let mut steps = 0;
        let mut faults = 0;

        while steps < max_steps {
            match self.step(program) {
                Step::Halted => {
                    log::debug!("halted at {:#010x} after {} steps ({} faults)", self.pc, steps, faults);
                    return RunResult { steps, faults, reason: Reason::Halted };
                }
                Step::Faulted(_) => { faults += 1; }
                Step::Retired => {}
            }
            steps += 1;
        }

        log::debug!("stopped at {:#010x}, step limit {} reached ({} faults)", self.pc, max_steps, faults);
        RunResult { steps, faults, reason: Reason::Limited }
    }
}

impl std::fmt::Debug for Core {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Core")
            .field("pc", &format_args!("{:#010x}", self.pc))
            .field("hi", &format_args!("{:#010x}", self.hi))
            .field("lo", &format_args!("{:#010x}", self.lo))
            .field("regs", &self.regs)
            .finish()
    }
}
