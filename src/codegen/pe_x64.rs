// ============================================================
// PE x64 (Windows console, x86-64) code generator
// ============================================================
//
// Data pointer register: rbx. Unlike the ELF targets, the runtime support
// (`putchar`, `getchar`) is not a bare syscall but an imported libc
// function, so the prologue loads both function pointers from IAT slots
// that do not exist yet — the container emitter fills them in once the
// import table layout is known. Three 32-bit slots are reserved as zero
// and handed back to the caller via `PeX64CodeGen::fixups()` after
// `codegen::compile` returns, mirroring the `Fixup` handles `ImageWriter`
// already uses elsewhere instead of hand-memorized byte offsets.
//
// The three prologue slot positions (relative to the prologue's own start)
// fall out of the chosen encodings rather than being copied constants:
//   push rsi; push rdi; push rbp                    (3 bytes, pos 0..3)
//   mov rsi, [moffs32]     48 8B 34 25 imm32         (8 bytes, slot @ 7)
//   mov rdi, [moffs32]     48 8B 3C 25 imm32         (8 bytes, slot @ 15)
//   mov rbx, imm32 (sext)  48 C7 C3 imm32            (7 bytes, slot @ 22)
// giving slot offsets 7, 15, 22 within the code region — derived from the
// encodings above rather than hand-copied constants.

use super::{CodeGen, LoopSite};
use crate::cursor::ImageWriter;
use crate::token::reduce_byte_count;

const RBX: u8 = 3;

/// The four code-resident 32-bit slots the PE container emitter must patch
/// once the IAT layout and ImageBase are known: the `putchar` IAT-entry
/// address, the `getchar` IAT-entry address, the `.bss` base (a direct
/// immediate, not an indirection), and a dead `exit` IAT-entry address in
/// the epilogue: the epilogue `ret`s before ever reaching it, but the slot
/// is still patched so the layout stays consistent.
#[derive(Clone, Copy, Debug, Default)]
pub struct PeFixups {
    pub putchar_slot: usize,
    pub getchar_slot: usize,
    pub bss_slot: usize,
    pub exit_slot: usize,
}

#[derive(Default)]
pub struct PeX64CodeGen {
    fixups: PeFixups,
}

impl PeX64CodeGen {
    pub fn new() -> Self {
        PeX64CodeGen::default()
    }

    pub fn fixups(&self) -> PeFixups {
        self.fixups
    }
}

impl CodeGen for PeX64CodeGen {
    fn prologue(&mut self, w: &mut ImageWriter) {
        w.emit_u8(0x56); // push rsi
        w.emit_u8(0x57); // push rdi
        w.emit_u8(0x55); // push rbp

        // mov rsi, [moffs32]  (absolute, no base/index: SIB = 0x25)
        w.emit_u8(0x48);
        w.emit_u8(0x8B);
        w.emit_u8(0x34);
        w.emit_u8(0x25);
        self.fixups.putchar_slot = w.pos();
        w.emit_u32(0);

        // mov rdi, [moffs32]
        w.emit_u8(0x48);
        w.emit_u8(0x8B);
        w.emit_u8(0x3C);
        w.emit_u8(0x25);
        self.fixups.getchar_slot = w.pos();
        w.emit_u32(0);

        // mov rbx, imm32 (sign-extended)
        w.emit_u8(0x48);
        w.emit_u8(0xC7);
        w.emit_u8(0xC3);
        self.fixups.bss_slot = w.pos();
        w.emit_u32(0);
    }

    fn epilogue(&mut self, w: &mut ImageWriter) {
        // pop rsi; pop rdi; pop rbp — same order as the pushes, so rsi and
        // rbp swap relative to a conventional save/restore. Harmless: the
        // next instruction is `ret` and nothing reads rbp afterward.
        w.emit_u8(0x5E); // pop rsi
        w.emit_u8(0x5F); // pop rdi
        w.emit_u8(0x5D); // pop rbp
        w.emit_u8(0x31); // xor eax, eax
        w.emit_u8(0xC0);
        w.emit_u8(0xC3); // ret
        self.fixups.exit_slot = w.pos();
        w.emit_u32(0); // dead `exit` IAT slot — still patched for layout fidelity
    }

    fn right(&mut self, w: &mut ImageWriter, n: u32) {
        emit_ptr_add(w, n);
    }

    fn left(&mut self, w: &mut ImageWriter, n: u32) {
        emit_ptr_sub(w, n);
    }

    fn inc(&mut self, w: &mut ImageWriter, n: u32) {
        emit_cell_add(w, n);
    }

    fn dec(&mut self, w: &mut ImageWriter, n: u32) {
        emit_cell_sub(w, n);
    }

    fn output(&mut self, w: &mut ImageWriter) {
        // mov rcx, [rbx] ; sub rsp, 0x20 ; call rsi ; add rsp, 0x20
        w.emit_u8(0x48);
        w.emit_u8(0x8B);
        w.emit_u8(0x0B);
        w.emit_u8(0x48);
        w.emit_u8(0x83);
        w.emit_u8(0xEC);
        w.emit_u8(0x20);
        w.emit_u8(0xFF);
        w.emit_u8(0xD6);
        w.emit_u8(0x48);
        w.emit_u8(0x83);
        w.emit_u8(0xC4);
        w.emit_u8(0x20);
    }

    fn input(&mut self, w: &mut ImageWriter) {
        // sub rsp, 0x20 ; call rdi ; add rsp, 0x20 ; mov [rbx], al
        w.emit_u8(0x48);
        w.emit_u8(0x83);
        w.emit_u8(0xEC);
        w.emit_u8(0x20);
        w.emit_u8(0xFF);
        w.emit_u8(0xD7);
        w.emit_u8(0x48);
        w.emit_u8(0x83);
        w.emit_u8(0xC4);
        w.emit_u8(0x20);
        w.emit_u8(0x88);
        w.emit_u8(0x03);
    }

    fn zero_store(&mut self, w: &mut ImageWriter) {
        super::x86::emit_mov_mem8_imm(w, RBX, 0);
    }

    fn loop_start(&mut self, w: &mut ImageWriter) -> LoopSite {
        let cmp_pos = w.pos();
        super::x86::emit_cmp_mem8_imm(w, RBX, 0);
        let je_rel32_pos = super::x86::emit_je_rel32_stub(w);
        LoopSite { cmp_pos, je_rel32_pos }
    }
}

fn emit_ptr_add(w: &mut ImageWriter, n: u32) {
    match n {
        0 => {}
        1 => super::x86::emit_inc_r64(w, RBX),
        2..=127 => super::x86::emit_add_r64_imm8(w, RBX, n as u8),
        _ => super::x86::emit_add_r64_imm32(w, RBX, n),
    }
}

fn emit_ptr_sub(w: &mut ImageWriter, n: u32) {
    match n {
        0 => {}
        1 => super::x86::emit_dec_r64(w, RBX),
        2..=127 => super::x86::emit_sub_r64_imm8(w, RBX, n as u8),
        _ => super::x86::emit_sub_r64_imm32(w, RBX, n),
    }
}

fn emit_cell_add(w: &mut ImageWriter, n: u32) {
    let count = reduce_byte_count(n);
    match count {
        0 => {}
        1 => super::x86::emit_inc_mem8(w, RBX),
        _ => super::x86::emit_add_mem8_imm(w, RBX, count),
    }
}

fn emit_cell_sub(w: &mut ImageWriter, n: u32) {
    let count = reduce_byte_count(n);
    match count {
        0 => {}
        1 => super::x86::emit_dec_mem8(w, RBX),
        _ => super::x86::emit_sub_mem8_imm(w, RBX, count),
    }
}
