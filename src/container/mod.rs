// ============================================================
// Container emitters — one per target image format
// ============================================================
//
// Each module here takes the already-folded token stream, drives the
// matching `codegen` target through the shared `codegen::compile`
// pipeline, and wraps the result in a loader-valid PE or ELF image. No
// assembler or object-file crate is used: headers, section tables and
// import directories are all hand-built over a pre-sized byte buffer.

pub mod elf;
pub mod pe;
