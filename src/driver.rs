// ============================================================
// Driver — sequence: read source, compile, write, chmod, execute
// ============================================================
//
// Each target's `main` is a one-liner into `driver::run`. Errors are
// printed to stderr and turned into exit code 1, the same shape used
// throughout this crate, rather than reaching for a diagnostics crate:
// there is no diagnostics framework beyond the handful of textual
// failure messages already carried by `CompileError`.
//
// There is no CLI surface: source is always read from `source.bf` and the
// destination name is fixed per target.

use std::fs;
use std::process::Command;

use crate::error::{CompileError, CompileResult};
use crate::token::{fold_zero_store, normalize, scan_tokens, Token};

pub const SOURCE_PATH: &str = "source.bf";

pub struct TargetSpec {
    pub dest_path: &'static str,
    /// chmod the destination to owner/group/other rwxr-xr-x after writing
    /// (ELF targets only — PE carries no POSIX permission bits).
    pub make_executable: bool,
}

pub const PE_TARGET: TargetSpec = TargetSpec { dest_path: "a.exe", make_executable: false };
pub const ELF64_TARGET: TargetSpec = TargetSpec { dest_path: "a.out", make_executable: true };
pub const ELF32_TARGET: TargetSpec = TargetSpec { dest_path: "a.out", make_executable: true };

/// Runs the full driver sequence for one target and returns the process
/// exit code: the spawned child's exit status on success, or `1` for any
/// fatal condition along the way. Never panics on a malformed source
/// program — bracket mismatches are reported and turned into exit code 1
/// like every other documented failure.
pub fn run(spec: &TargetSpec, build: impl FnOnce(&[Token]) -> CompileResult<Vec<u8>>) -> i32 {
    let source = match fs::read(SOURCE_PATH) {
        Ok(bytes) => bytes,
        Err(e) => {
            let err = CompileError::SourceOpen(format!("could not open '{}': {}", SOURCE_PATH, e));
            eprintln!("{}", err);
            return 1;
        }
    };

    let tokens = fold_zero_store(&scan_tokens(&normalize(&source)));

    let image = match build(&tokens) {
        Ok(image) => image,
        Err(e) => {
            eprintln!("{}", e);
            return 1;
        }
    };

    if let Err(e) = fs::write(spec.dest_path, &image) {
        let err = CompileError::DestOpen(format!("could not write '{}': {}", spec.dest_path, e));
        eprintln!("{}", err);
        return 1;
    }

    if spec.make_executable {
        if let Err(e) = set_executable(spec.dest_path) {
            eprintln!("could not set executable permissions on '{}': {}", spec.dest_path, e);
            return 1;
        }
    }

    execute(spec.dest_path)
}

#[cfg(unix)]
fn set_executable(path: &str) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o755))
}

#[cfg(not(unix))]
fn set_executable(_path: &str) -> std::io::Result<()> {
    Ok(())
}

fn execute(dest_path: &str) -> i32 {
    let invocation = if dest_path.contains('/') || dest_path.contains('\\') {
        dest_path.to_string()
    } else {
        format!("./{}", dest_path)
    };

    match Command::new(&invocation).status() {
        Ok(status) => status.code().unwrap_or(1),
        Err(e) => {
            eprintln!("could not execute '{}': {}", invocation, e);
            1
        }
    }
}
