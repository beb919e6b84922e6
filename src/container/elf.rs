// ============================================================
// ELF64 / ELF32 container emitter
// ============================================================
//
// Unlike PE, no code-resident address slots need patching here: the
// `.bss` base is an immediate baked straight into the prologue by the
// code generator, because the image base is known statically. The
// container emitter's only job is header/program-header/section-header
// arithmetic around the already-generated code: manual field-offset
// writes into a pre-sized buffer, no `object`/`goblin` crate.
//
// File layout: `[Ehdr + 2 Phdr] [code] [.shstrtab bytes] [4 Shdr]`.
// Memory layout: code segment based at `BASE`, `.bss` an anonymous
// zero-fill segment at `BSS_BASE` sized `BSS_SIZE` (memsz, filesz 0).

use crate::codegen::elf32::Elf32CodeGen;
use crate::codegen::elf64::Elf64CodeGen;
use crate::codegen::compile;
use crate::cursor::ImageWriter;
use crate::error::CompileResult;
use crate::token::{has_input, Token};

pub const BASE: u64 = 0x0404_8000;
pub const BSS_BASE: u64 = 0x0424_8000;
pub const BSS_SIZE: u64 = 0x1_0000;

const EI_NIDENT: usize = 16;
const ELFCLASS64: u8 = 2;
const ELFCLASS32: u8 = 1;
const ELFDATA2LSB: u8 = 1;
const EV_CURRENT: u8 = 1;
const ELFOSABI_LINUX: u8 = 3;
const ET_EXEC: u16 = 2;
const EM_X86_64: u16 = 62;
const EM_386: u16 = 3;

const PT_LOAD: u32 = 1;
const PF_X: u32 = 1;
const PF_W: u32 = 2;
const PF_R: u32 = 4;

const SHT_NULL: u32 = 0;
const SHT_PROGBITS: u32 = 1;
const SHT_STRTAB: u32 = 3;
const SHT_NOBITS: u32 = 8;
const SHF_WRITE: u64 = 1;
const SHF_ALLOC: u64 = 2;
const SHF_EXECINSTR: u64 = 4;

const EHDR64_SIZE: usize = 64;
const PHDR64_SIZE: usize = 56;
const SHDR64_SIZE: usize = 64;

const EHDR32_SIZE: usize = 52;
const PHDR32_SIZE: usize = 32;
const SHDR32_SIZE: usize = 40;

/// `"\0.text\0.shstrtab\0.bss"` plus the byte offsets of each name within
/// it, computed once instead of hand-counted.
struct ShStrTab {
    bytes: Vec<u8>,
    text_name: u32,
    shstrtab_name: u32,
    bss_name: u32,
}

fn build_shstrtab() -> ShStrTab {
    let mut bytes = vec![0u8]; // null section's empty name
    let text_name = bytes.len() as u32;
    bytes.extend_from_slice(b".text\0");
    let shstrtab_name = bytes.len() as u32;
    bytes.extend_from_slice(b".shstrtab\0");
    let bss_name = bytes.len() as u32;
    bytes.extend_from_slice(b".bss\0");
    ShStrTab { bytes, text_name, shstrtab_name, bss_name }
}

pub fn build_elf64(tokens: &[Token]) -> CompileResult<Vec<u8>> {
    let header_region = EHDR64_SIZE + 2 * PHDR64_SIZE;
    let mut w = ImageWriter::new();
    w.seek(header_region);

    let mut gen = Elf64CodeGen::new(BSS_BASE);
    compile(&mut gen, &mut w, tokens)?;
    let code_size = w.pos() - header_region;

    let strtab = build_shstrtab();
    let strtab_off = w.pos();
    w.emit_bytes(&strtab.bytes);
    let shoff = w.pos();

    write_section_headers_64(&mut w, &strtab, header_region, code_size, strtab_off);

    let entry = BASE + header_region as u64;
    write_ehdr64(&mut w, entry, shoff);
    write_phdr64(&mut w, w.len());

    Ok(w.into_bytes())
}

pub fn build_elf32(tokens: &[Token]) -> CompileResult<Vec<u8>> {
    let header_region = EHDR32_SIZE + 2 * PHDR32_SIZE;
    let mut w = ImageWriter::new();
    w.seek(header_region);

    let output_only = !has_input(tokens);
    let mut gen = Elf32CodeGen::new(BSS_BASE as u32, output_only);
    compile(&mut gen, &mut w, tokens)?;
    let code_size = w.pos() - header_region;

    let strtab = build_shstrtab();
    let strtab_off = w.pos();
    w.emit_bytes(&strtab.bytes);
    let shoff = w.pos();

    write_section_headers_32(&mut w, &strtab, header_region, code_size, strtab_off);

    let entry = BASE as u32 + header_region as u32;
    write_ehdr32(&mut w, entry, shoff as u32);
    write_phdr32(&mut w, w.len() as u32);

    Ok(w.into_bytes())
}

// ---- ELF64 header writers ----------------------------------------------

fn write_ehdr64(w: &mut ImageWriter, entry: u64, shoff: usize) {
    w.seek(0);
    let mut ident = [0u8; EI_NIDENT];
    ident[0..4].copy_from_slice(&[0x7F, b'E', b'L', b'F']);
    ident[4] = ELFCLASS64;
    ident[5] = ELFDATA2LSB;
    ident[6] = EV_CURRENT;
    ident[7] = ELFOSABI_LINUX;
    w.emit_bytes(&ident);
    w.emit_u16(ET_EXEC);
    w.emit_u16(EM_X86_64);
    w.emit_u32(EV_CURRENT as u32);
    w.emit_u64(entry);
    w.emit_u64(EHDR64_SIZE as u64); // e_phoff
    w.emit_u64(shoff as u64); // e_shoff
    w.emit_u32(0); // e_flags
    w.emit_u16(EHDR64_SIZE as u16); // e_ehsize
    w.emit_u16(PHDR64_SIZE as u16); // e_phentsize
    w.emit_u16(2); // e_phnum
    w.emit_u16(SHDR64_SIZE as u16); // e_shentsize
    w.emit_u16(4); // e_shnum: null, .shstrtab, .text, .bss
    w.emit_u16(1); // e_shstrndx
    debug_assert_eq!(w.pos(), EHDR64_SIZE);
}

fn write_phdr64(w: &mut ImageWriter, file_size: usize) {
    // PT_LOAD: everything on disk (headers + code + strtab + section headers).
    w.emit_u32(PT_LOAD);
    w.emit_u32(PF_R | PF_X);
    w.emit_u64(0); // p_offset
    w.emit_u64(BASE); // p_vaddr
    w.emit_u64(BASE); // p_paddr
    w.emit_u64(file_size as u64); // p_filesz
    w.emit_u64(file_size as u64); // p_memsz
    w.emit_u64(0x1000); // p_align

    // PT_LOAD: anonymous .bss segment, zero-fill, not backed by file data.
    w.emit_u32(PT_LOAD);
    w.emit_u32(PF_R | PF_W);
    w.emit_u64(0); // p_offset
    w.emit_u64(BSS_BASE); // p_vaddr
    w.emit_u64(BSS_BASE); // p_paddr
    w.emit_u64(0); // p_filesz
    w.emit_u64(BSS_SIZE); // p_memsz
    w.emit_u64(0x1000); // p_align
}

fn write_section_headers_64(
    w: &mut ImageWriter,
    strtab: &ShStrTab,
    header_region: usize,
    code_size: usize,
    strtab_off: usize,
) {
    // null section
    w.emit_zeroes(SHDR64_SIZE);

    // .shstrtab
    w.emit_u32(strtab.shstrtab_name);
    w.emit_u32(SHT_STRTAB);
    w.emit_u64(0); // sh_flags
    w.emit_u64(0); // sh_addr
    w.emit_u64(strtab_off as u64);
    w.emit_u64(strtab.bytes.len() as u64);
    w.emit_u32(0); // sh_link
    w.emit_u32(0); // sh_info
    w.emit_u64(1); // sh_addralign
    w.emit_u64(0); // sh_entsize

    // .text
    w.emit_u32(strtab.text_name);
    w.emit_u32(SHT_PROGBITS);
    w.emit_u64(SHF_ALLOC | SHF_EXECINSTR);
    w.emit_u64(BASE + header_region as u64);
    w.emit_u64(header_region as u64);
    w.emit_u64(code_size as u64);
    w.emit_u32(0);
    w.emit_u32(0);
    w.emit_u64(4);
    w.emit_u64(0);

    // .bss
    w.emit_u32(strtab.bss_name);
    w.emit_u32(SHT_NOBITS);
    w.emit_u64(SHF_ALLOC | SHF_WRITE);
    w.emit_u64(BSS_BASE);
    w.emit_u64(0); // sh_offset: NOBITS, no file backing
    w.emit_u64(BSS_SIZE);
    w.emit_u32(0);
    w.emit_u32(0);
    w.emit_u64(16);
    w.emit_u64(0);
}

// ---- ELF32 header writers ----------------------------------------------

fn write_ehdr32(w: &mut ImageWriter, entry: u32, shoff: u32) {
    w.seek(0);
    let mut ident = [0u8; EI_NIDENT];
    ident[0..4].copy_from_slice(&[0x7F, b'E', b'L', b'F']);
    ident[4] = ELFCLASS32;
    ident[5] = ELFDATA2LSB;
    ident[6] = EV_CURRENT;
    ident[7] = ELFOSABI_LINUX;
    w.emit_bytes(&ident);
    w.emit_u16(ET_EXEC);
    w.emit_u16(EM_386);
    w.emit_u32(EV_CURRENT as u32);
    w.emit_u32(entry);
    w.emit_u32(EHDR32_SIZE as u32); // e_phoff
    w.emit_u32(shoff); // e_shoff
    w.emit_u32(0); // e_flags
    w.emit_u16(EHDR32_SIZE as u16);
    w.emit_u16(PHDR32_SIZE as u16);
    w.emit_u16(2);
    w.emit_u16(SHDR32_SIZE as u16);
    w.emit_u16(4);
    w.emit_u16(1);
    debug_assert_eq!(w.pos(), EHDR32_SIZE);
}

fn write_phdr32(w: &mut ImageWriter, file_size: u32) {
    // Note: Elf32_Phdr's field order differs from Elf64_Phdr — p_flags
    // comes after p_memsz, not right after p_type.
    w.emit_u32(PT_LOAD);
    w.emit_u32(0); // p_offset
    w.emit_u32(BASE as u32); // p_vaddr
    w.emit_u32(BASE as u32); // p_paddr
    w.emit_u32(file_size); // p_filesz
    w.emit_u32(file_size); // p_memsz
    w.emit_u32(PF_R | PF_X); // p_flags
    w.emit_u32(0x1000); // p_align

    w.emit_u32(PT_LOAD);
    w.emit_u32(0);
    w.emit_u32(BSS_BASE as u32);
    w.emit_u32(BSS_BASE as u32);
    w.emit_u32(0);
    w.emit_u32(BSS_SIZE as u32);
    w.emit_u32(PF_R | PF_W);
    w.emit_u32(0x1000);
}

fn write_section_headers_32(
    w: &mut ImageWriter,
    strtab: &ShStrTab,
    header_region: usize,
    code_size: usize,
    strtab_off: usize,
) {
    w.emit_zeroes(SHDR32_SIZE);

    w.emit_u32(strtab.shstrtab_name);
    w.emit_u32(SHT_STRTAB);
    w.emit_u32(0);
    w.emit_u32(0);
    w.emit_u32(strtab_off as u32);
    w.emit_u32(strtab.bytes.len() as u32);
    w.emit_u32(0);
    w.emit_u32(0);
    w.emit_u32(1);
    w.emit_u32(0);

    w.emit_u32(strtab.text_name);
    w.emit_u32(SHT_PROGBITS);
    w.emit_u32((SHF_ALLOC | SHF_EXECINSTR) as u32);
    w.emit_u32(BASE as u32 + header_region as u32);
    w.emit_u32(header_region as u32);
    w.emit_u32(code_size as u32);
    w.emit_u32(0);
    w.emit_u32(0);
    w.emit_u32(4);
    w.emit_u32(0);

    w.emit_u32(strtab.bss_name);
    w.emit_u32(SHT_NOBITS);
    w.emit_u32((SHF_ALLOC | SHF_WRITE) as u32);
    w.emit_u32(BSS_BASE as u32);
    w.emit_u32(0);
    w.emit_u32(BSS_SIZE as u32);
    w.emit_u32(0);
    w.emit_u32(0);
    w.emit_u32(16);
    w.emit_u32(0);
}
