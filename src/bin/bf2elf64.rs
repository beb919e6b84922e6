// ============================================================
// bf2elf64 — Brainfuck -> Linux ELF64 (x86-64) executable
// ============================================================
// Reads `source.bf` from the current directory, compiles it straight to
// machine code and a loader-valid ELF64 image using raw syscalls (no
// libc), writes `a.out`, chmods it executable, and runs it.

use bfaot::container::elf;
use bfaot::driver::{self, ELF64_TARGET};

fn main() {
    std::process::exit(driver::run(&ELF64_TARGET, elf::build_elf64));
}
