// ============================================================
// ELF32 (Linux i386) code generator
// ============================================================
//
// Data pointer register: ecx. Like ELF64, `edx` is pinned to 1 in the
// prologue and reused both as the read/write length argument and, via the
// `dh == 0` trick, as a one-byte-shorter zero operand.
//
// When the program never contains a `,` (computed by `token::has_input` as
// an explicit upfront scan, not as a side effect of normalization), the
// prologue additionally hoists `eax = 4` (syscall write) and `ebx = edx`
// (fd 1) once, so every `.` shrinks to a bare `int 0x80`.

use super::x86::{self, DH};
use super::{CodeGen, LoopSite};
use crate::cursor::ImageWriter;

const ECX: u8 = 1;

pub struct Elf32CodeGen {
    bss_base: u32,
    output_only: bool,
}

impl Elf32CodeGen {
    pub fn new(bss_base: u32, output_only: bool) -> Self {
        Elf32CodeGen { bss_base, output_only }
    }
}

impl CodeGen for Elf32CodeGen {
    fn prologue(&mut self, w: &mut ImageWriter) {
        // mov ecx, bss_base
        w.emit_u8(0xB9);
        w.emit_u32(self.bss_base);
        // mov edx, 1
        w.emit_u8(0xBA);
        w.emit_u32(1);
        if self.output_only {
            // mov eax, 4 ; mov ebx, edx
            w.emit_u8(0xB8);
            w.emit_u32(4);
            w.emit_u8(0x89);
            w.emit_u8(0xD3);
        }
    }

    fn epilogue(&mut self, w: &mut ImageWriter) {
        // mov eax, edx ; xor ebx, ebx ; int 0x80  (exit, reusing edx == 1)
        w.emit_u8(0x89);
        w.emit_u8(0xD0);
        w.emit_u8(0x31);
        w.emit_u8(0xDB);
        w.emit_u8(0xCD);
        w.emit_u8(0x80);
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
        if self.output_only {
            w.emit_u8(0xCD);
            w.emit_u8(0x80);
        } else {
            // mov eax, 4 ; mov ebx, edx ; int 0x80
            w.emit_u8(0xB8);
            w.emit_u32(4);
            w.emit_u8(0x89);
            w.emit_u8(0xD3);
            w.emit_u8(0xCD);
            w.emit_u8(0x80);
        }
    }

    fn input(&mut self, w: &mut ImageWriter) {
        // mov eax, 3 ; xor ebx, ebx ; int 0x80
        w.emit_u8(0xB8);
        w.emit_u32(3);
        w.emit_u8(0x31);
        w.emit_u8(0xDB);
        w.emit_u8(0xCD);
        w.emit_u8(0x80);
    }

    fn zero_store(&mut self, w: &mut ImageWriter) {
        x86::emit_mov_mem8_reg8(w, ECX, DH);
    }

    fn loop_start(&mut self, w: &mut ImageWriter) -> LoopSite {
        let cmp_pos = w.pos();
        x86::emit_cmp_mem8_reg8(w, ECX, DH);
        let je_rel32_pos = x86::emit_je_rel32_stub(w);
        LoopSite { cmp_pos, je_rel32_pos }
    }
}

fn emit_ptr_add(w: &mut ImageWriter, n: u32) {
    match n {
        0 => {}
        1 => x86::emit_inc_r32_short(w, ECX),
        2..=127 => x86::emit_add_r32_imm8(w, ECX, n as u8),
        _ => x86::emit_add_r32_imm32(w, ECX, n),
    }
}

fn emit_ptr_sub(w: &mut ImageWriter, n: u32) {
    match n {
        0 => {}
        1 => x86::emit_dec_r32_short(w, ECX),
        2..=127 => x86::emit_sub_r32_imm8(w, ECX, n as u8),
        _ => x86::emit_sub_r32_imm32(w, ECX, n),
    }
}

fn emit_cell_add(w: &mut ImageWriter, n: u32) {
    let count = crate::token::reduce_byte_count(n);
    match count {
        0 => {}
        1 => x86::emit_inc_mem8(w, ECX),
        _ => x86::emit_add_mem8_imm(w, ECX, count),
    }
}

fn emit_cell_sub(w: &mut ImageWriter, n: u32) {
    let count = crate::token::reduce_byte_count(n);
    match count {
        0 => {}
        1 => x86::emit_dec_mem8(w, ECX),
        _ => x86::emit_sub_mem8_imm(w, ECX, count),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::compile;
    use crate::token::{fold_zero_store, has_input, normalize, scan_tokens};

    fn toks(src: &[u8]) -> Vec<crate::token::Token> {
        fold_zero_store(&scan_tokens(&normalize(src)))
    }

    #[test]
    fn output_only_program_hoists_write_setup() {
        let tokens = toks(b"+++.");
        assert!(!has_input(&tokens));
        let mut gen = Elf32CodeGen::new(0x0424_8000, true);
        let mut w = ImageWriter::new();
        compile(&mut gen, &mut w, &tokens).unwrap();
        let bytes = w.bytes();
        // prologue: mov ecx,base(5) mov edx,1(5) mov eax,4(5) mov ebx,edx(2) = 17
        assert_eq!(&bytes[10..15], &[0xB8, 4, 0, 0, 0]);
        assert_eq!(&bytes[15..17], &[0x89, 0xD3]);
        // add byte [ecx], 3
        assert_eq!(&bytes[17..20], &[0x80, 0x01, 3]);
        // bare int 0x80 for the output
        assert_eq!(&bytes[20..22], &[0xCD, 0x80]);
    }

    #[test]
    fn mixed_io_program_does_not_hoist() {
        let tokens = toks(b"+++.,");
        assert!(has_input(&tokens));
        let mut gen = Elf32CodeGen::new(0x0424_8000, false);
        let mut w = ImageWriter::new();
        compile(&mut gen, &mut w, &tokens).unwrap();
        let bytes = w.bytes();
        // prologue: mov ecx,base(5) mov edx,1(5) = 10, no hoist
        assert_eq!(&bytes[10..13], &[0x80, 0x01, 3]);
        assert_eq!(&bytes[13..19], &[0xB8, 4, 0, 0, 0, 0x89]);
    }
}
