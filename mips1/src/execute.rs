use crate::instructions::{field, IInstruction, Instruction, JInstruction, RInstruction};
use crate::{Core, Fault};

// Handlers run after the pc has been advanced past the instruction, so `self.pc` is the
// address of the next sequential instruction. All of them either fully apply or return a
// fault without touching anything.

pub(crate) type Handled = Result<(), Fault>;

#[inline(always)]
fn sign_extend(imm: u16) -> u32 {
    imm as i16 as i32 as u32
}

#[inline(always)]
fn zero_extend(imm: u16) -> u32 {
    imm as u32
}

impl Core {
    pub(crate) fn unknown_r_instruction(&mut self, instruction: RInstruction) -> Handled {
        Err(Fault::Unhandled(Instruction::R(instruction)))
    }

    pub(crate) fn unknown_i_instruction(&mut self, instruction: IInstruction) -> Handled {
        Err(Fault::Unhandled(Instruction::I(instruction)))
    }

    pub(crate) fn unknown_j_instruction(&mut self, instruction: JInstruction) -> Handled {
        Err(Fault::Unhandled(Instruction::J(instruction)))
    }

    /* Basic R instructions */

    /// No overflow exception, the result just wraps
    pub(crate) fn add(&mut self, i: RInstruction) -> Handled {
        let rs = self.regs.read(i.rs) as i32;
        let rt = self.regs.read(i.rt) as i32;

        self.regs.write(i.rd, rs.wrapping_add(rt) as u32);
        Ok(())
    }

    pub(crate) fn addu(&mut self, i: RInstruction) -> Handled {
        let rs = self.regs.read(i.rs);
        let rt = self.regs.read(i.rt);

        self.regs.write(i.rd, rs.wrapping_add(rt));
        Ok(())
    }

    pub(crate) fn sub(&mut self, i: RInstruction) -> Handled {
        let rs = self.regs.read(i.rs) as i32;
        let rt = self.regs.read(i.rt) as i32;

        self.regs.write(i.rd, rs.wrapping_sub(rt) as u32);
        Ok(())
    }

    pub(crate) fn subu(&mut self, i: RInstruction) -> Handled {
        let rs = self.regs.read(i.rs);
        let rt = self.regs.read(i.rt);

        self.regs.write(i.rd, rs.wrapping_sub(rt));
        Ok(())
    }

    pub(crate) fn bitwise_and(&mut self, i: RInstruction) -> Handled {
        let value = self.regs.read(i.rs) & self.regs.read(i.rt);
        self.regs.write(i.rd, value);
        Ok(())
    }

    pub(crate) fn bitwise_or(&mut self, i: RInstruction) -> Handled {
        let value = self.regs.read(i.rs) | self.regs.read(i.rt);
        self.regs.write(i.rd, value);
        Ok(())
    }

    pub(crate) fn nor(&mut self, i: RInstruction) -> Handled {
        let value = !(self.regs.read(i.rs) | self.regs.read(i.rt));
        self.regs.write(i.rd, value);
        Ok(())
    }

    pub(crate) fn slt(&mut self, i: RInstruction) -> Handled {
        let rs = self.regs.read(i.rs) as i32;
        let rt = self.regs.read(i.rt) as i32;

        self.regs.write(i.rd, (rs < rt) as u32);
        Ok(())
    }

    pub(crate) fn sltu(&mut self, i: RInstruction) -> Handled {
        let rs = self.regs.read(i.rs);
        let rt = self.regs.read(i.rt);

        self.regs.write(i.rd, (rs < rt) as u32);
        Ok(())
    }

    // wrapping_shl/shr mask the amount to 5 bits, same as the shamt field

    pub(crate) fn sll(&mut self, i: RInstruction) -> Handled {
        let rt = self.regs.read(i.rt);
        self.regs.write(i.rd, rt.wrapping_shl(i.shamt.into()));
        Ok(())
    }

    /// Logical, zeros are shifted in
    pub(crate) fn srl(&mut self, i: RInstruction) -> Handled {
        let rt = self.regs.read(i.rt);
        self.regs.write(i.rd, rt.wrapping_shr(i.shamt.into()));
        Ok(())
    }

    pub(crate) fn jr(&mut self, i: RInstruction) -> Handled {
        self.pc = self.regs.read(i.rs);
        Ok(())
    }

    /* Multiplication R instructions */

    pub(crate) fn mfhi(&mut self, i: RInstruction) -> Handled {
        self.regs.write(i.rd, self.hi);
        Ok(())
    }

    pub(crate) fn mflo(&mut self, i: RInstruction) -> Handled {
        self.regs.write(i.rd, self.lo);
        Ok(())
    }

    #[inline(always)]
    fn set_hilo(&mut self, product: u64) {
        self.hi = (product >> 32) as u32;
        self.lo = product as u32;
    }

    pub(crate) fn mult(&mut self, i: RInstruction) -> Handled {
        let rs = self.regs.read(i.rs) as i32 as i64;
        let rt = self.regs.read(i.rt) as i32 as i64;

        // can't overflow, |i32::MIN * i32::MIN| is 2^62
        self.set_hilo((rs * rt) as u64);
        Ok(())
    }

    pub(crate) fn multu(&mut self, i: RInstruction) -> Handled {
        let rs = self.regs.read(i.rs) as u64;
        let rt = self.regs.read(i.rt) as u64;

        self.set_hilo(rs * rt);
        Ok(())
    }

    /// Quotient rounds toward zero, the remainder takes the sign of the dividend.
    /// `i32::MIN / -1` wraps back to `i32::MIN` with a remainder of 0.
    pub(crate) fn div(&mut self, i: RInstruction) -> Handled {
        let rs = self.regs.read(i.rs) as i32;
        let rt = self.regs.read(i.rt) as i32;

        if rt == 0 {
            return Err(Fault::DivideByZero(Instruction::R(i)));
        }

        self.lo = rs.wrapping_div(rt) as u32;
        self.hi = rs.wrapping_rem(rt) as u32;
        Ok(())
    }

    pub(crate) fn divu(&mut self, i: RInstruction) -> Handled {
        let rs = self.regs.read(i.rs);
        let rt = self.regs.read(i.rt);

        if rt == 0 {
            return Err(Fault::DivideByZero(Instruction::R(i)));
        }

        self.lo = rs / rt;
        self.hi = rs % rt;
        Ok(())
    }

    /* I instructions */

    pub(crate) fn addi(&mut self, i: IInstruction) -> Handled {
        let rs = self.regs.read(i.rs) as i32;

        self.regs.write(i.rt, rs.wrapping_add(sign_extend(i.immediate) as i32) as u32);
        Ok(())
    }

    pub(crate) fn addiu(&mut self, i: IInstruction) -> Handled {
        let rs = self.regs.read(i.rs);

        self.regs.write(i.rt, rs.wrapping_add(sign_extend(i.immediate)));
        Ok(())
    }

    pub(crate) fn andi(&mut self, i: IInstruction) -> Handled {
        let rs = self.regs.read(i.rs);

        self.regs.write(i.rt, rs & zero_extend(i.immediate));
        Ok(())
    }

    pub(crate) fn ori(&mut self, i: IInstruction) -> Handled {
        let rs = self.regs.read(i.rs);

        self.regs.write(i.rt, rs | zero_extend(i.immediate));
        Ok(())
    }

    pub(crate) fn slti(&mut self, i: IInstruction) -> Handled {
        let rs = self.regs.read(i.rs) as i32;

        self.regs.write(i.rt, (rs < sign_extend(i.immediate) as i32) as u32);
        Ok(())
    }

    /// The immediate is still sign extended, then compared unsigned
    pub(crate) fn sltiu(&mut self, i: IInstruction) -> Handled {
        let rs = self.regs.read(i.rs);

        self.regs.write(i.rt, (rs < sign_extend(i.immediate)) as u32);
        Ok(())
    }

    pub(crate) fn lui(&mut self, i: IInstruction) -> Handled {
        self.regs.write(i.rt, zero_extend(i.immediate) << 16);
        Ok(())
    }

    #[inline(always)]
    fn branch(&mut self, immediate: u16) {
        let offset = sign_extend(immediate) << 2;
        self.pc = self.pc.wrapping_add(offset);
    }

    pub(crate) fn beq(&mut self, i: IInstruction) -> Handled {
        if self.regs.read(i.rs) == self.regs.read(i.rt) {
            self.branch(i.immediate);
        }
        Ok(())
    }

    pub(crate) fn bne(&mut self, i: IInstruction) -> Handled {
        if self.regs.read(i.rs) != self.regs.read(i.rt) {
            self.branch(i.immediate);
        }
        Ok(())
    }

    /* J instructions */

    fn jump_address(&self, address: u32) -> u32 {
        let region = self.pc & field::JUMP_REGION.mask();
        region | (field::ADDRESS.truncate(address) << 2)
    }

    pub(crate) fn jump(&mut self, i: JInstruction) -> Handled {
        self.pc = self.jump_address(i.address);
        Ok(())
    }

    pub(crate) fn jal(&mut self, i: JInstruction) -> Handled {
        // skips over the slot a delay slot would occupy
        self.regs.write(31, self.pc.wrapping_add(4));
        self.jump(i)
    }
}
