// ============================================================
// bfaot — Brainfuck ahead-of-time native compiler family
// ============================================================
//
// Three single-pass streaming compilers, one per target container (PE
// x64, ELF64, ELF32), sharing a token normalizer, run-length scanner,
// loop-matching/peephole pipeline (`codegen::compile`), and a byte-cursor
// writer with fixup support (`cursor::ImageWriter`). No assembler or
// linker is invoked — each `container` module assembles its image by
// hand, byte by byte.

pub mod codegen;
pub mod container;
pub mod cursor;
pub mod driver;
pub mod error;
pub mod token;
