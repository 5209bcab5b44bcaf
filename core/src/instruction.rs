use rand::RngCore;

use crate::opcode::Opcode;
use crate::operations::*;
use crate::state::State;

/// A pure transition from one State to the next for a given Opcode
pub type Instruction = fn(op: u16, state: &State, rng: &mut dyn RngCore) -> State;

/// Selects the correct Instruction for a given Opcode
///
/// The family nibble picks the instruction directly except for families `0`, `8`, `E` and `F`,
/// which are dispatched a second time on their low nibble (or low byte for `F`).
/// Anything left unassigned is a `nop`.
pub fn from_op(op: u16) -> Instruction {
    match op.family() {
        0x0 => family_0(op),
        0x1 => jump,
        0x2 => call,
        0x3 => ske,
        0x4 => skne,
        0x5 => skre,
        0x6 => load,
        0x7 => add,
        0x8 => family_8(op),
        0x9 => skrne,
        0xA => loadi,
        0xB => jumpi,
        0xC => rnd,
        0xD => draw,
        0xE => family_e(op),
        _ => family_f(op),
    }
}

fn family_0(op: u16) -> Instruction {
    // ROMs pad with zero words; they must not clear the screen
    if op == 0x0000 {
        return nop;
    }
    match op.n() {
        0x0 => clr,
        0xE => rts,
        _ => nop,
    }
}

fn family_8(op: u16) -> Instruction {
    match op.n() {
        0x0 => mv,
        0x1 => or,
        0x2 => and,
        0x3 => xor,
        0x4 => addr,
        0x5 => sub,
        0x6 => shr,
        0x7 => subn,
        0xE => shl,
        _ => nop,
    }
}

fn family_e(op: u16) -> Instruction {
    match op.n() {
        0xE => skpr,
        0x1 => skup,
        _ => nop,
    }
}

fn family_f(op: u16) -> Instruction {
    match op.kk() {
        0x07 => getd,
        0x0A => keyd,
        0x15 => setd,
        0x18 => sets,
        0x1E => addi,
        0x29 => ldspr,
        0x33 => bcd,
        0x55 => stor,
        0x65 => read,
        _ => nop,
    }
}
