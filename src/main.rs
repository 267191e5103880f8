use anyhow::Context;
use clap::Parser;

use common::cli::{parse_address, ProgramOpts};
use mips1::instructions::{decode, Funct, IInstruction, Instruction, Opcode, RInstruction};
use mips1::{Core, Reason};

#[derive(Debug, Parser)]
#[command(name = "mips-sim", version, about = "Runs MIPS I integer programs")]
struct Opts {
    #[command(flatten)]
    program: ProgramOpts,

    /// Stop after this many instructions
    #[arg(long, short = 'n', default_value_t = 1_000_000)]
    max_steps: u64,

    /// Address of the first instruction
    #[arg(long, value_parser = parse_address, default_value = "0")]
    entry: u32,

    /// Print the decoded program and exit
    #[arg(long)]
    disassemble: bool,
}

/// Counts $t0 up to 10, then runs off the end
fn demo() -> Vec<u32> {
    const T0: u8 = 8;
    const T1: u8 = 9;

    [
        Instruction::I(IInstruction { opcode: Opcode::Slti, rs: T0, rt: T1, immediate: 10 }),
        Instruction::I(IInstruction { opcode: Opcode::Beq, rs: T1, rt: 0, immediate: 2 }),
        Instruction::I(IInstruction { opcode: Opcode::Addi, rs: T0, rt: T0, immediate: 1 }),
        Instruction::R(RInstruction { rs: 0, rt: 0, rd: 0, shamt: 0, funct: Funct::Jr }),
    ].into_iter().map(Instruction::encode).collect()
}

fn disassemble(program: &[u32]) {
    for (address, raw) in (0u32..).step_by(4).zip(program.iter().copied()) {
        match decode(raw) {
            Ok(instruction) => println!("{:08x}: {:08x}    {}", address, raw, instruction.disassemble(Some(address))),
            Err(err) => println!("{:08x}: {:08x}    ; {}", address, raw, err),
        }
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let opts = Opts::parse();

    let program = match opts.program.load().context("failed to load program")? {
        Some(program) => program,
        None => {
            log::info!("no program given, running the built-in demo");
            demo()
        }
    };

    if opts.disassemble {
        disassemble(&program);
        return Ok(());
    }

    let mut core = Core::new();
    core.set_pc(opts.entry);

    let result = core.run(&program, opts.max_steps);

    print!("{}", core.regfile());
    println!("   hi = {:#010x}     lo = {:#010x}     pc = {:#010x}", core.hi(), core.lo(), core.pc());
    println!();

    let reason = match result.reason {
        Reason::Halted => "ran off the end of the program",
        Reason::Limited => "step limit reached",
    };
    println!("{} after {} steps, {} retired, {} faults", reason, result.steps, core.retired(), result.faults);

    Ok(())
}
