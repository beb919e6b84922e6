// ============================================================
// bf2elf32 — Brainfuck -> Linux ELF32 (i386) executable
// ============================================================
// Reads `source.bf` from the current directory, compiles it straight to
// machine code and a loader-valid ELF32 image using raw int 0x80
// syscalls (no libc), writes `a.out`, chmods it executable, and runs it.

use bfaot::container::elf;
use bfaot::driver::{self, ELF32_TARGET};

fn main() {
    std::process::exit(driver::run(&ELF32_TARGET, elf::build_elf32));
}
