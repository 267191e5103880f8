use isa_table::EnumMap;

use crate::execute::Handled;
use crate::instructions::{Funct, IInstruction, Instruction, JInstruction, Opcode, RInstruction};
use crate::{Core, Fault};

type RHandler = fn(&mut Core, RInstruction) -> Handled;
type IHandler = fn(&mut Core, IInstruction) -> Handled;
type JHandler = fn(&mut Core, JInstruction) -> Handled;

// Every slot starts out pointing at an unknown handler, so adding a variant to Opcode or
// Funct without wiring it up decodes fine and faults as Unhandled when executed.

const fn build_r_table() -> [RHandler; Funct::COUNT] {
    let mut table = [Core::unknown_r_instruction as RHandler; Funct::COUNT];

    table[Funct::Add.ordinal()] = Core::add;
    table[Funct::Addu.ordinal()] = Core::addu;
    table[Funct::Sub.ordinal()] = Core::sub;
    table[Funct::Subu.ordinal()] = Core::subu;
    table[Funct::And.ordinal()] = Core::bitwise_and;
    table[Funct::Or.ordinal()] = Core::bitwise_or;
    table[Funct::Nor.ordinal()] = Core::nor;
    table[Funct::Slt.ordinal()] = Core::slt;
    table[Funct::Sltu.ordinal()] = Core::sltu;
    table[Funct::Sll.ordinal()] = Core::sll;
    table[Funct::Srl.ordinal()] = Core::srl;
    table[Funct::Jr.ordinal()] = Core::jr;

    table[Funct::Mfhi.ordinal()] = Core::mfhi;
    table[Funct::Mflo.ordinal()] = Core::mflo;
    table[Funct::Mult.ordinal()] = Core::mult;
    table[Funct::Multu.ordinal()] = Core::multu;
    table[Funct::Div.ordinal()] = Core::div;
    table[Funct::Divu.ordinal()] = Core::divu;

    return table;
}

const fn build_i_table() -> [IHandler; Opcode::COUNT] {
    let mut table = [Core::unknown_i_instruction as IHandler; Opcode::COUNT];

    table[Opcode::Addi.ordinal()] = Core::addi;
    table[Opcode::Addiu.ordinal()] = Core::addiu;
    table[Opcode::Andi.ordinal()] = Core::andi;
    table[Opcode::Ori.ordinal()] = Core::ori;
    table[Opcode::Slti.ordinal()] = Core::slti;
    table[Opcode::Sltiu.ordinal()] = Core::sltiu;
    table[Opcode::Lui.ordinal()] = Core::lui;
    table[Opcode::Beq.ordinal()] = Core::beq;
    table[Opcode::Bne.ordinal()] = Core::bne;

    // Lw, Lbu, Lhu, Sb, Sh, Sw, Ll and Sc have no memory to work on

    return table;
}

const fn build_j_table() -> [JHandler; Opcode::COUNT] {
    let mut table = [Core::unknown_j_instruction as JHandler; Opcode::COUNT];

    table[Opcode::J.ordinal()] = Core::jump;
    table[Opcode::Jal.ordinal()] = Core::jal;

    return table;
}

static R_HANDLERS: EnumMap<Funct, RHandler> = EnumMap::from_array(build_r_table());
static I_HANDLERS: EnumMap<Opcode, IHandler> = EnumMap::from_array(build_i_table());
static J_HANDLERS: EnumMap<Opcode, JHandler> = EnumMap::from_array(build_j_table());

impl Core {
    /// Runs a single decoded instruction against this core.
    ///
    /// Expects the pc to already point past the instruction, as `step` leaves it. On error
    /// nothing has been modified.
    pub fn execute(&mut self, instruction: Instruction) -> Result<(), Fault> {
        match instruction {
            Instruction::R(i) => R_HANDLERS[i.funct](self, i),
            Instruction::I(i) => I_HANDLERS[i.opcode](self, i),
            Instruction::J(i) => J_HANDLERS[i.opcode](self, i),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_ops_are_unhandled() {
        for opcode in [Opcode::Lw, Opcode::Lbu, Opcode::Lhu, Opcode::Sb, Opcode::Sh, Opcode::Sw, Opcode::Ll, Opcode::Sc] {
            let mut core = Core::new();
            core.set_register(4, 0x100);
            core.set_pc(0x40);
            let before = core.clone();

            let instruction = Instruction::I(IInstruction { opcode, rs: 4, rt: 5, immediate: 8 });
            assert_eq!(core.execute(instruction), Err(Fault::Unhandled(instruction)));
            assert_eq!(core, before);
        }
    }

    #[test]
    fn mismatched_formats_are_unhandled() {
        // decode never builds these, but execute shouldn't trust that
        let mut core = Core::new();

        let instruction = Instruction::J(JInstruction { opcode: Opcode::Addi, address: 1 });
        assert_eq!(core.execute(instruction), Err(Fault::Unhandled(instruction)));

        let instruction = Instruction::I(IInstruction { opcode: Opcode::J, rs: 0, rt: 0, immediate: 1 });
        assert_eq!(core.execute(instruction), Err(Fault::Unhandled(instruction)));

        let instruction = Instruction::I(IInstruction { opcode: Opcode::Special, rs: 0, rt: 0, immediate: 1 });
        assert_eq!(core.execute(instruction), Err(Fault::Unhandled(instruction)));

        assert_eq!(core, Core::new());
    }

    #[test]
    fn every_funct_is_wired() {
        for funct in Funct::ALL {
            let mut core = Core::new();
            core.set_register(5, 1);
            let instruction = Instruction::R(RInstruction { rs: 4, rt: 5, rd: 6, shamt: 0, funct });
            assert!(!matches!(core.execute(instruction), Err(Fault::Unhandled(_))), "{:?}", funct);
        }
    }
}
