// ============================================================
// ELF64 (Linux x86-64) code generator
// ============================================================
//
// Data pointer register: rsi. The prologue loads the `.bss` base as an
// absolute 64-bit immediate (no import table to chase, unlike PE) and sets
// `edx = 1` once, which the rest of the generator leans on as the syscall
// length argument and — via the `dh == 0` trick — as a one-byte-shorter
// zero to compare/store against. rdx is never touched again after the
// prologue, so that invariant holds for the whole generated program.

use super::x86::{self, DH};
use super::{CodeGen, LoopSite};
use crate::cursor::ImageWriter;

const RSI: u8 = 6;

pub struct Elf64CodeGen {
    bss_base: u64,
}

impl Elf64CodeGen {
    pub fn new(bss_base: u64) -> Self {
        Elf64CodeGen { bss_base }
    }
}

impl CodeGen for Elf64CodeGen {
    fn prologue(&mut self, w: &mut ImageWriter) {
        // movabs rsi, bss_base
        w.emit_u8(0x48);
        w.emit_u8(0xBE);
        w.emit_u64(self.bss_base);
        // mov edx, 1
        w.emit_u8(0xBA);
        w.emit_u32(1);
    }

    fn epilogue(&mut self, w: &mut ImageWriter) {
        // mov eax, 60 ; xor edi, edi ; syscall  (exit_group)
        w.emit_u8(0xB8);
        w.emit_u32(60);
        w.emit_u8(0x31);
        w.emit_u8(0xFF);
        w.emit_u8(0x0F);
        w.emit_u8(0x05);
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
        // mov eax, edx ; mov edi, edx ; syscall  (write, fd=1, len=1)
        w.emit_u8(0x89);
        w.emit_u8(0xD0);
        w.emit_u8(0x89);
        w.emit_u8(0xD7);
        w.emit_u8(0x0F);
        w.emit_u8(0x05);
    }

    fn input(&mut self, w: &mut ImageWriter) {
        // xor eax, eax ; xor edi, edi ; syscall  (read, fd=0, len=1, buf=rsi)
        w.emit_u8(0x31);
        w.emit_u8(0xC0);
        w.emit_u8(0x31);
        w.emit_u8(0xFF);
        w.emit_u8(0x0F);
        w.emit_u8(0x05);
    }

    fn zero_store(&mut self, w: &mut ImageWriter) {
        x86::emit_mov_mem8_reg8(w, RSI, DH);
    }

    fn loop_start(&mut self, w: &mut ImageWriter) -> LoopSite {
        let cmp_pos = w.pos();
        x86::emit_cmp_mem8_reg8(w, RSI, DH);
        let je_rel32_pos = x86::emit_je_rel32_stub(w);
        LoopSite { cmp_pos, je_rel32_pos }
    }
}

fn emit_ptr_add(w: &mut ImageWriter, n: u32) {
    match n {
        0 => {}
        1 => x86::emit_inc_r64(w, RSI),
        2..=127 => x86::emit_add_r64_imm8(w, RSI, n as u8),
        _ => x86::emit_add_r64_imm32(w, RSI, n),
    }
}

fn emit_ptr_sub(w: &mut ImageWriter, n: u32) {
    match n {
        0 => {}
        1 => x86::emit_dec_r64(w, RSI),
        2..=127 => x86::emit_sub_r64_imm8(w, RSI, n as u8),
        _ => x86::emit_sub_r64_imm32(w, RSI, n),
    }
}

fn emit_cell_add(w: &mut ImageWriter, n: u32) {
    let count = crate::token::reduce_byte_count(n);
    match count {
        0 => {}
        1 => x86::emit_inc_mem8(w, RSI),
        _ => x86::emit_add_mem8_imm(w, RSI, count),
    }
}

fn emit_cell_sub(w: &mut ImageWriter, n: u32) {
    let count = crate::token::reduce_byte_count(n);
    match count {
        0 => {}
        1 => x86::emit_dec_mem8(w, RSI),
        _ => x86::emit_sub_mem8_imm(w, RSI, count),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::compile;
    use crate::token::{fold_zero_store, normalize, scan_tokens};

    fn toks(src: &[u8]) -> Vec<crate::token::Token> {
        fold_zero_store(&scan_tokens(&normalize(src)))
    }

    #[test]
    fn plus_plus_plus_dot_emits_add_and_write_syscall() {
        let mut gen = Elf64CodeGen::new(0x0424_8000);
        let mut w = ImageWriter::new();
        compile(&mut gen, &mut w, &toks(b"+++.")).unwrap();
        let bytes = w.bytes();
        // prologue: movabs rsi, 0x04248000 ; mov edx, 1
        assert_eq!(&bytes[0..2], &[0x48, 0xBE]);
        assert_eq!(
            u64::from_le_bytes(bytes[2..10].try_into().unwrap()),
            0x0424_8000
        );
        assert_eq!(&bytes[10..15], &[0xBA, 1, 0, 0, 0]);
        // add byte [rsi], 3
        assert_eq!(&bytes[15..18], &[0x80, 0x06, 3]);
        // mov eax, edx ; mov edi, edx ; syscall
        assert_eq!(&bytes[18..24], &[0x89, 0xD0, 0x89, 0xD7, 0x0F, 0x05]);
        // epilogue: mov eax, 60 ; xor edi, edi ; syscall
        assert_eq!(&bytes[24..30], &[0xB8, 60, 0, 0, 0, 0x31]);
        assert_eq!(&bytes[30..33], &[0xFF, 0x0F, 0x05]);
    }

    #[test]
    fn zero_store_peephole_emits_single_instruction() {
        let mut gen = Elf64CodeGen::new(0x0424_8000);
        let mut w = ImageWriter::new();
        compile(&mut gen, &mut w, &toks(b"+++++[-]")).unwrap();
        let bytes = w.bytes();
        // prologue (15 bytes) + add byte [rsi],5 (3 bytes) + mov [rsi],dh (2) + epilogue (6)
        assert_eq!(bytes.len(), 15 + 3 + 2 + 6);
        assert_eq!(&bytes[18..20], &[0x88, 0x36]);
    }
}
