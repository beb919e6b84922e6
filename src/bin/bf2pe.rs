// ============================================================
// bf2pe — Brainfuck -> Windows PE x64 console executable
// ============================================================
// Reads `source.bf` from the current directory, compiles it straight to
// machine code and a loader-valid PE32+ image, writes `a.exe`, and runs
// it. No flags, no other inputs.

use bfaot::container::pe;
use bfaot::driver::{self, PE_TARGET};

fn main() {
    std::process::exit(driver::run(&PE_TARGET, pe::build_pe));
}
