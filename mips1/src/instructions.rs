use std::fmt;

use modular_bitfield::{bitfield, specifiers::*};
use isa_table::Encoded;

pub type RawInstruction = u32;

/// Bit layout of the three instruction formats, packed from the most significant bit down:
///
/// R-type: [opcode:6][rs:5][rt:5][rd:5][shamt:5][funct:6]
/// I-type: [opcode:6][rs:5][rt:5][immediate:16]
/// J-type: [opcode:6][address:26]
pub mod field {
    use common::util::Field;

    pub const OPCODE: Field = Field::top(6);
    pub const RS: Field = OPCODE.next(5);
    pub const RT: Field = RS.next(5);
    pub const RD: Field = RT.next(5);
    pub const SHAMT: Field = RD.next(5);
    pub const FUNCT: Field = SHAMT.next(6);
    pub const IMMEDIATE: Field = RT.next(16);
    pub const ADDRESS: Field = OPCODE.next(26);

    /// Not an instruction field: the bits of the pc that a J-type jump keeps
    pub const JUMP_REGION: Field = Field::top(4);

    const _: () = assert!(
        OPCODE.width() + RS.width() + RT.width() + RD.width() + SHAMT.width() + FUNCT.width() == 32,
        "R instruction size incorrect"
    );
    const _: () = assert!(
        OPCODE.width() + RS.width() + RT.width() + IMMEDIATE.width() == 32,
        "I instruction size incorrect"
    );
    const _: () = assert!(OPCODE.width() + ADDRESS.width() == 32, "J instruction size incorrect");

    const _: () = assert!(
        (OPCODE.mask() | RS.mask() | RT.mask() | RD.mask() | SHAMT.mask() | FUNCT.mask()) == u32::MAX,
        "R instruction masks don't bitwise-or correctly"
    );
    const _: () = assert!(
        (OPCODE.mask() | RS.mask() | RT.mask() | IMMEDIATE.mask()) == u32::MAX,
        "I instruction masks don't bitwise-or correctly"
    );
    const _: () = assert!(
        (OPCODE.mask() | ADDRESS.mask()) == u32::MAX,
        "J instruction masks don't bitwise-or correctly"
    );
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Encoded)]
#[encoded(width = 6)]
pub enum Opcode {
    /// All R-type instructions share this opcode, the funct field selects the operation
    Special = 0x00,
    J = 0x02,
    Jal = 0x03,
    Beq = 0x04,
    Bne = 0x05,
    Addi = 0x08,
    Addiu = 0x09,
    Slti = 0x0a,
    Sltiu = 0x0b,
    Andi = 0x0c,
    Ori = 0x0d,
    Lui = 0x0f,
    Lw = 0x23,
    Lbu = 0x24,
    Lhu = 0x25,
    Sb = 0x28,
    Sh = 0x29,
    Sw = 0x2b,
    Ll = 0x30,
    Sc = 0x38,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Encoded)]
#[encoded(width = 6)]
pub enum Funct {
    Sll = 0x00,
    Srl = 0x02,
    Jr = 0x08,
    Mfhi = 0x10,
    Mflo = 0x12,
    Mult = 0x18,
    Multu = 0x19,
    Div = 0x1a,
    Divu = 0x1b,
    Add = 0x20,
    Addu = 0x21,
    Sub = 0x22,
    Subu = 0x23,
    And = 0x24,
    Or = 0x25,
    Nor = 0x27,
    Slt = 0x2a,
    Sltu = 0x2b,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Format {
    R,
    I,
    J,
}

impl Opcode {
    pub const fn format(self) -> Format {
        match self {
            Opcode::Special => Format::R,
            Opcode::J | Opcode::Jal => Format::J,
            _ => Format::I,
        }
    }
}

// Raw layouts, used for encoding. Decoding goes through `field` so the masks and positions
// stay the single source of truth for what a word means.

#[bitfield(bits = 32)]
#[derive(Debug, Copy, Clone)]
pub struct IType {
    pub imm: B16,
    pub rt: B5,
    pub rs: B5,
    pub op: B6,
}

#[bitfield(bits = 32)]
#[derive(Debug, Copy, Clone)]
pub struct JType {
    pub target: B26,
    pub op: B6,
}

#[bitfield(bits = 32)]
#[derive(Debug, Copy, Clone)]
pub struct RType {
    pub funct: B6,
    pub sa: B5,
    pub rd: B5,
    pub rt: B5,
    pub rs: B5,
    pub op: B6,
}

impl From<IType> for u32 {
    fn from(i: IType) -> u32 {
        u32::from_le_bytes(i.into_bytes())
    }
}
impl From<JType> for u32 {
    fn from(j: JType) -> u32 {
        u32::from_le_bytes(j.into_bytes())
    }
}
impl From<RType> for u32 {
    fn from(r: RType) -> u32 {
        u32::from_le_bytes(r.into_bytes())
    }
}

impl From<u32> for IType {
    fn from(word: u32) -> IType {
        IType::from_bytes(word.to_le_bytes())
    }
}
impl From<u32> for JType {
    fn from(word: u32) -> JType {
        JType::from_bytes(word.to_le_bytes())
    }
}
impl From<u32> for RType {
    fn from(word: u32) -> RType {
        RType::from_bytes(word.to_le_bytes())
    }
}

/// Register-register operation. The opcode is always `Special`, so it isn't stored.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct RInstruction {
    pub rs: u8,
    pub rt: u8,
    pub rd: u8,
    pub shamt: u8,
    pub funct: Funct,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct IInstruction {
    pub opcode: Opcode,
    pub rs: u8,
    pub rt: u8,
    pub immediate: u16,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct JInstruction {
    pub opcode: Opcode,
    /// 26 bits, a word index within the current 256MB region
    pub address: u32,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Instruction {
    R(RInstruction),
    I(IInstruction),
    J(JInstruction),
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("unknown opcode {opcode:#04x} in {raw:#010x}")]
    UnknownOpcode { raw: RawInstruction, opcode: u8 },
    #[error("unknown funct {funct:#04x} in {raw:#010x}")]
    UnknownFunct { raw: RawInstruction, funct: u8 },
}

const fn r_instruction(funct: Funct, raw: RawInstruction) -> RInstruction {
    RInstruction {
        rs: field::RS.extract(raw) as u8,
        rt: field::RT.extract(raw) as u8,
        rd: field::RD.extract(raw) as u8,
        shamt: field::SHAMT.extract(raw) as u8,
        funct,
    }
}

const fn i_instruction(opcode: Opcode, raw: RawInstruction) -> IInstruction {
    IInstruction {
        opcode,
        rs: field::RS.extract(raw) as u8,
        rt: field::RT.extract(raw) as u8,
        immediate: field::IMMEDIATE.extract(raw) as u16,
    }
}

const fn j_instruction(opcode: Opcode, raw: RawInstruction) -> JInstruction {
    JInstruction {
        opcode,
        address: field::ADDRESS.extract(raw),
    }
}

pub const fn decode(raw: RawInstruction) -> Result<Instruction, DecodeError> {
    let opcode_bits = field::OPCODE.extract(raw);
    let Some(opcode) = Opcode::from_bits(opcode_bits) else {
        return Err(DecodeError::UnknownOpcode { raw, opcode: opcode_bits as u8 });
    };

    match opcode.format() {
        Format::R => {
            let funct_bits = field::FUNCT.extract(raw);
            match Funct::from_bits(funct_bits) {
                Some(funct) => Ok(Instruction::R(r_instruction(funct, raw))),
                None => Err(DecodeError::UnknownFunct { raw, funct: funct_bits as u8 }),
            }
        }
        Format::J => Ok(Instruction::J(j_instruction(opcode, raw))),
        Format::I => Ok(Instruction::I(i_instruction(opcode, raw))),
    }
}

// Reference encodings, checked at compile time
const _: () = {
    assert!(matches!(
        decode(0b000000_00001_00010_00011_00000_100000),
        Ok(Instruction::R(RInstruction { rs: 1, rt: 2, rd: 3, shamt: 0, funct: Funct::Add }))
    ));
    assert!(matches!(
        decode(0b000100_00001_00010_0000000000101010),
        Ok(Instruction::I(IInstruction { opcode: Opcode::Beq, rs: 1, rt: 2, immediate: 42 }))
    ));
    assert!(matches!(
        decode(0b000010_00000000000000000000001010),
        Ok(Instruction::J(JInstruction { opcode: Opcode::J, address: 10 }))
    ));
};

impl RInstruction {
    pub fn encode(self) -> RawInstruction {
        RType::new()
            .with_op(Opcode::Special.bits() as u8)
            .with_rs(field::RS.truncate(self.rs.into()) as u8)
            .with_rt(field::RT.truncate(self.rt.into()) as u8)
            .with_rd(field::RD.truncate(self.rd.into()) as u8)
            .with_sa(field::SHAMT.truncate(self.shamt.into()) as u8)
            .with_funct(self.funct.bits() as u8)
            .into()
    }
}

impl IInstruction {
    pub fn encode(self) -> RawInstruction {
        IType::new()
            .with_op(self.opcode.bits() as u8)
            .with_rs(field::RS.truncate(self.rs.into()) as u8)
            .with_rt(field::RT.truncate(self.rt.into()) as u8)
            .with_imm(self.immediate)
            .into()
    }
}

impl JInstruction {
    pub fn encode(self) -> RawInstruction {
        JType::new()
            .with_op(self.opcode.bits() as u8)
            .with_target(field::ADDRESS.truncate(self.address))
            .into()
    }
}

pub const MIPS_REG_NAMES: [&'static str; 32] = [
    "$zero", // Always 0
    "$at",   // r1 - Reserved for assembler
    "$v0", "$v1", // r2-r3 - Function return values
    "$a0", "$a1", "$a2", "$a3", // r4-r7 - function arguments
    "$t0", "$t1", "$t2", "$t3", "$t4", "$t5", "$t6",
    "$t7", // r8-r15 - Temporaries (Caller saved)
    "$s0", "$s1", "$s2", "$s3", "$s4", "$s5", "$s6", "$s7", // r16-r23 - Saved  (Callee saved)
    "$t8", "$t9", // r24-r25 - Caller-saved temporaries
    "$k0", "$k1", // Reserved for OS kernel
    "$gp", // r28 - Global pointer
    "$sp", // r29 - Stack pointer
    "$fp", // r30 - Frame pointer
    "$ra", // r31 - Return address
];

#[inline(always)]
pub fn reg_name(reg: u8) -> &'static str {
    MIPS_REG_NAMES[usize::from(reg & 0x1f)]
}

impl Instruction {
    pub fn encode(self) -> RawInstruction {
        match self {
            Instruction::R(r) => r.encode(),
            Instruction::I(i) => i.encode(),
            Instruction::J(j) => j.encode(),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Instruction::R(r) => r.funct.mnemonic(),
            Instruction::I(i) => i.opcode.mnemonic(),
            Instruction::J(j) => j.opcode.mnemonic(),
        }
    }

    /// Provides a string representation of the instruction (as disassembly)
    ///
    /// With an `address`, branch and jump targets are shown as absolute addresses, otherwise
    /// as the raw offset / target field.
    pub fn disassemble(self, address: Option<u32>) -> String {
        // We will collect the arguments into this vector
        let mut args = Vec::<String>::new();

        match self {
            Instruction::R(r) => {
                use Funct::*;
                match r.funct {
                    Sll | Srl => {
                        args.push(reg_name(r.rd).to_owned());
                        args.push(reg_name(r.rt).to_owned());
                        args.push(format!("{}", r.shamt));
                    }
                    Jr => {
                        args.push(reg_name(r.rs).to_owned());
                    }
                    Mfhi | Mflo => {
                        args.push(reg_name(r.rd).to_owned());
                    }
                    Mult | Multu | Div | Divu => {
                        args.push(reg_name(r.rs).to_owned());
                        args.push(reg_name(r.rt).to_owned());
                    }
                    Add | Addu | Sub | Subu | And | Or | Nor | Slt | Sltu => {
                        args.push(reg_name(r.rd).to_owned());
                        args.push(reg_name(r.rs).to_owned());
                        args.push(reg_name(r.rt).to_owned());
                    }
                }
            }
            Instruction::I(i) => {
                use Opcode::*;
                match i.opcode {
                    Beq | Bne => {
                        args.push(reg_name(i.rs).to_owned());
                        args.push(reg_name(i.rt).to_owned());
                        let offset = i.immediate as i16 as i32;
                        match address {
                            Some(address) => {
                                let target = address.wrapping_add(4).wrapping_add((offset << 2) as u32);
                                args.push(format!("{:#x}", target));
                            }
                            None => args.push(format!("{}", offset)),
                        }
                    }
                    Lui => {
                        args.push(reg_name(i.rt).to_owned());
                        args.push(format!("{:#x}", i.immediate));
                    }
                    Andi | Ori => {
                        args.push(reg_name(i.rt).to_owned());
                        args.push(reg_name(i.rs).to_owned());
                        args.push(format!("{:#x}", i.immediate));
                    }
                    Lw | Lbu | Lhu | Sb | Sh | Sw | Ll | Sc => {
                        args.push(reg_name(i.rt).to_owned());
                        args.push(format!("{}({})", i.immediate as i16, reg_name(i.rs)));
                    }
                    // Everything else is a signed immediate
                    _ => {
                        args.push(reg_name(i.rt).to_owned());
                        args.push(reg_name(i.rs).to_owned());
                        args.push(format!("{}", i.immediate as i16));
                    }
                }
            }
            Instruction::J(j) => {
                let offset = field::ADDRESS.truncate(j.address) << 2;
                let target = match address {
                    Some(address) => (address.wrapping_add(4) & field::JUMP_REGION.mask()) | offset,
                    None => offset,
                };
                args.push(format!("{:#x}", target));
            }
        }

        format!("{:<7} {}", self.name(), args.join(", ")).trim_end().to_owned()
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.disassemble(None))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn r(rs: u8, rt: u8, rd: u8, shamt: u8, funct: Funct) -> Instruction {
        Instruction::R(RInstruction { rs, rt, rd, shamt, funct })
    }

    fn i(opcode: Opcode, rs: u8, rt: u8, immediate: u16) -> Instruction {
        Instruction::I(IInstruction { opcode, rs, rt, immediate })
    }

    #[test]
    fn known_encodings() {
        assert_eq!(decode(0b000000_00001_00010_00011_00000_100000), Ok(r(1, 2, 3, 0, Funct::Add)));
        assert_eq!(decode(0b000100_00001_00010_0000000000101010), Ok(i(Opcode::Beq, 1, 2, 42)));
        assert_eq!(
            decode(0b000010_00000000000000000000001010),
            Ok(Instruction::J(JInstruction { opcode: Opcode::J, address: 10 }))
        );
    }

    #[test]
    fn field_layout() {
        assert_eq!(field::OPCODE.mask(), 0xfc00_0000);
        assert_eq!(field::RS.mask(), 0x03e0_0000);
        assert_eq!(field::RT.mask(), 0x001f_0000);
        assert_eq!(field::RD.mask(), 0x0000_f800);
        assert_eq!(field::SHAMT.mask(), 0x0000_07c0);
        assert_eq!(field::FUNCT.mask(), 0x0000_003f);
        assert_eq!(field::IMMEDIATE.mask(), 0x0000_ffff);
        assert_eq!(field::ADDRESS.mask(), 0x03ff_ffff);
    }

    #[test]
    fn rejects_unknown_opcodes() {
        let known: Vec<u32> = Opcode::iter().map(|op| op.bits()).collect();

        for opcode in 0..64u32 {
            // a spread of operand bits, including all-ones
            for rest in [0, 0x03ff_ffff, 0x0155_5555, 0x02aa_aaaa, 0x0000_0020] {
                let raw = (opcode << 26) | rest;
                let decoded = decode(raw);
                if known.contains(&opcode) {
                    if opcode != 0 {
                        assert!(decoded.is_ok(), "{:#010x}", raw);
                    }
                } else {
                    assert_eq!(decoded, Err(DecodeError::UnknownOpcode { raw, opcode: opcode as u8 }));
                }
            }
        }
    }

    #[test]
    fn rejects_unknown_functs() {
        for funct in 0..64u32 {
            let raw = 0b000000_00001_00010_00011_00000_000000 | funct;
            match Funct::from_bits(funct) {
                Some(known) => assert_eq!(decode(raw), Ok(r(1, 2, 3, 0, known))),
                None => assert_eq!(decode(raw), Err(DecodeError::UnknownFunct { raw, funct: funct as u8 })),
            }
        }
    }

    #[test]
    fn enumerations() {
        assert_eq!(Opcode::COUNT, 20);
        assert_eq!(Funct::COUNT, 18);
        assert_eq!(Opcode::Special.format(), Format::R);
        assert_eq!(Opcode::Jal.format(), Format::J);
        assert_eq!(Opcode::Sc.format(), Format::I);
        assert_eq!(Opcode::from_bits(0x0f), Some(Opcode::Lui));
        assert_eq!(Opcode::from_bits(0x01), None);
        assert_eq!(Funct::from_bits(0x2b), Some(Funct::Sltu));
        assert_eq!(Funct::from_bits(0x26), None); // xor isn't supported
    }

    #[test]
    fn decode_sign_bits_are_raw() {
        // the decoder keeps immediates raw, extension is the executor's job
        let raw = i(Opcode::Addi, 8, 9, 0xfffe).encode();
        assert_eq!(raw, 0x2109_fffe);
        assert_eq!(decode(raw), Ok(i(Opcode::Addi, 8, 9, 0xfffe)));
    }

    #[test]
    fn encode_matches_decode() {
        let mut instructions = Vec::new();
        for funct in Funct::iter() {
            instructions.push(r(31, 17, 4, 21, funct));
        }
        for opcode in Opcode::iter() {
            match opcode.format() {
                Format::R => {}
                Format::I => instructions.push(i(opcode, 3, 30, 0x8001)),
                Format::J => instructions.push(Instruction::J(JInstruction { opcode, address: 0x03ff_fffc })),
            }
        }

        for inst in instructions {
            assert_eq!(decode(inst.encode()), Ok(inst), "{}", inst);
        }
    }

    #[test]
    fn encode_truncates_wide_fields() {
        let raw = r(33, 2, 3, 32, Funct::Add).encode();
        assert_eq!(raw, 0b000000_00001_00010_00011_00000_100000);

        let raw = Instruction::J(JInstruction { opcode: Opcode::J, address: 0xffff_ffff }).encode();
        assert_eq!(raw, 0x0bff_ffff);
    }

    #[test]
    fn bitfields_agree_with_fields() {
        for raw in [0x0000_0000, 0xffff_ffff, 0x1234_5678, 0x8765_4321, 0x2909_000a] {
            let r = RType::from(raw);
            assert_eq!(r.op() as u32, field::OPCODE.extract(raw));
            assert_eq!(r.rs() as u32, field::RS.extract(raw));
            assert_eq!(r.rt() as u32, field::RT.extract(raw));
            assert_eq!(r.rd() as u32, field::RD.extract(raw));
            assert_eq!(r.sa() as u32, field::SHAMT.extract(raw));
            assert_eq!(r.funct() as u32, field::FUNCT.extract(raw));

            let i = IType::from(raw);
            assert_eq!(i.imm() as u32, field::IMMEDIATE.extract(raw));

            let j = JType::from(raw);
            assert_eq!(j.target(), field::ADDRESS.extract(raw));

            assert_eq!(u32::from(r), raw);
        }
    }

    #[test]
    fn disassembly() {
        assert_eq!(r(1, 2, 3, 0, Funct::Add).to_string(), "add     $v1, $at, $v0");
        assert_eq!(r(0, 9, 8, 4, Funct::Sll).to_string(), "sll     $t0, $t1, 4");
        assert_eq!(r(31, 0, 0, 0, Funct::Jr).to_string(), "jr      $ra");
        assert_eq!(r(0, 0, 2, 0, Funct::Mflo).to_string(), "mflo    $v0");
        assert_eq!(r(4, 5, 0, 0, Funct::Divu).to_string(), "divu    $a0, $a1");

        assert_eq!(i(Opcode::Slti, 8, 9, 10).to_string(), "slti    $t1, $t0, 10");
        assert_eq!(i(Opcode::Addiu, 29, 29, 0xfff8).to_string(), "addiu   $sp, $sp, -8");
        assert_eq!(i(Opcode::Ori, 0, 4, 0xbeef).to_string(), "ori     $a0, $zero, 0xbeef");
        assert_eq!(i(Opcode::Lui, 0, 1, 0x1000).to_string(), "lui     $at, 0x1000");
        assert_eq!(i(Opcode::Lw, 29, 31, 0xfffc).to_string(), "lw      $ra, -4($sp)");
        assert_eq!(i(Opcode::Beq, 9, 0, 0xffff).to_string(), "beq     $t1, $zero, -1");

        let jal = Instruction::J(JInstruction { opcode: Opcode::Jal, address: 10 });
        assert_eq!(jal.to_string(), "jal     0x28");
    }

    #[test]
    fn disassembly_with_address() {
        let beq = i(Opcode::Beq, 9, 0, 2);
        assert_eq!(beq.disassemble(Some(0x4)), "beq     $t1, $zero, 0x10");

        let back = i(Opcode::Bne, 1, 2, 0xfffe);
        assert_eq!(back.disassemble(Some(0x100)), "bne     $at, $v0, 0xfc");

        let j = Instruction::J(JInstruction { opcode: Opcode::J, address: 0x40 });
        assert_eq!(j.disassemble(Some(0x1000_0000)), "j       0x10000100");
    }
}
