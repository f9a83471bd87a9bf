//! Case-transform tables derived from the UCD simple case mappings.
//! Each table is sorted by `start` and entries do not overlap.

/// A run of code points sharing a single case transform.
/// The transform adds `delta` to a code point `cp` in
/// `start..start + length` when `(cp - start) % modulo == 0`.
#[derive(Debug, Copy, Clone)]
pub struct FoldRange {
    pub start: u32,
    pub length: u32,
    pub delta: i32,
    pub modulo: u8,
}

const fn fr(start: u32, length: u32, delta: i32, modulo: u8) -> FoldRange {
    FoldRange {
        start,
        length,
        delta,
        modulo,
    }
}

/// Simple case-fold transforms (the "unicode" canonicalization rules).
/// Transforms map code points to their case-fold target, which is usually
/// the lowercase form.
pub const UNICODE_FOLDS: &[FoldRange] = &[
    fr(0x41, 26, 32, 1),          // A-Z -> a-z
    fr(0xB5, 1, 0x307, 1),        // MICRO SIGN -> greek mu
    fr(0xC0, 23, 32, 1),          // A-grave..O-diaeresis
    fr(0xD8, 7, 32, 1),           // O-stroke..THORN
    fr(0x100, 56, 1, 2),          // Latin Extended-A, even uppercase
    fr(0x139, 16, 1, 2),          // L-acute..N-caron, odd uppercase
    fr(0x14A, 46, 1, 2),          // ENG..Y-circumflex, even uppercase
    fr(0x178, 1, -0x79, 1),       // Y-diaeresis -> 0xFF
    fr(0x179, 6, 1, 2),           // Z-acute..Z-caron, odd uppercase
    fr(0x17F, 1, -0x10C, 1),      // LONG S -> s
    fr(0x1CD, 16, 1, 2),          // A-caron..U-diaeresis-grave, odd uppercase
    fr(0x1DE, 18, 1, 2),
    fr(0x1F8, 40, 1, 2),
    fr(0x222, 18, 1, 2),
    fr(0x246, 10, 1, 2),
    fr(0x386, 1, 0x26, 1),        // Greek ALPHA-tonos
    fr(0x388, 3, 0x25, 1),        // EPSILON..IOTA tonos
    fr(0x38C, 1, 0x40, 1),        // OMICRON-tonos
    fr(0x38E, 2, 0x3F, 1),        // UPSILON..OMEGA tonos
    fr(0x391, 17, 32, 1),         // ALPHA..RHO
    fr(0x3A3, 9, 32, 1),          // SIGMA..UPSILON-diaeresis
    fr(0x3C2, 1, 1, 1),           // final sigma -> sigma
    fr(0x3D8, 24, 1, 2),          // archaic Greek, even uppercase
    fr(0x400, 16, 80, 1),         // Cyrillic IE-grave..DZHE
    fr(0x410, 32, 32, 1),         // Cyrillic A..YA
    fr(0x460, 34, 1, 2),
    fr(0x48A, 54, 1, 2),
    fr(0x4C1, 13, 1, 2),
    fr(0x4D0, 96, 1, 2),
    fr(0x531, 38, 48, 1),         // Armenian AYB..FEH
    fr(0x10A0, 38, 0x1C60, 1),    // Georgian Asomtavruli -> Nuskhuri
    fr(0x1E00, 150, 1, 2),        // Latin Extended Additional, even uppercase
    fr(0x1E9E, 1, -0x1DBF, 1),    // CAPITAL SHARP S -> sharp s
    fr(0x1EA0, 96, 1, 2),
    fr(0x1F08, 8, -8, 1),         // Greek Extended, capitals with psili/dasia
    fr(0x1F18, 6, -8, 1),
    fr(0x1F28, 8, -8, 1),
    fr(0x1F38, 8, -8, 1),
    fr(0x1F48, 6, -8, 1),
    fr(0x1F68, 8, -8, 1),
    fr(0x2126, 1, -0x1D5D, 1),    // OHM SIGN -> omega
    fr(0x212A, 1, -0x20BF, 1),    // KELVIN SIGN -> k
    fr(0x212B, 1, -0x2046, 1),    // ANGSTROM SIGN -> a-ring
    fr(0x2160, 16, 16, 1),        // Roman numerals
    fr(0x24B6, 26, 26, 1),        // circled Latin capitals
    fr(0xFF21, 26, 32, 1),        // fullwidth A-Z
    fr(0x10400, 40, 40, 1),       // Deseret
];

/// Uppercase transforms (the legacy, non-"unicode" canonicalization rules).
/// Transforms map code points to their simple uppercase form. Mappings from a
/// non-ASCII source into ASCII are excluded, matching the requirement that
/// legacy canonicalization never maps a non-ASCII code point into ASCII.
pub const LEGACY_FOLDS: &[FoldRange] = &[
    fr(0x61, 26, -32, 1),         // a-z -> A-Z
    fr(0xB5, 1, 0x2E7, 1),        // MICRO SIGN -> greek MU
    fr(0xE0, 23, -32, 1),
    fr(0xF8, 7, -32, 1),
    fr(0xFF, 1, 0x79, 1),         // y-diaeresis -> 0x178
    fr(0x101, 55, -1, 2),         // Latin Extended-A, odd lowercase
    fr(0x13A, 15, -1, 2),
    fr(0x14B, 45, -1, 2),
    fr(0x17A, 5, -1, 2),
    fr(0x1CE, 15, -1, 2),
    fr(0x1DF, 17, -1, 2),
    fr(0x1F9, 39, -1, 2),
    fr(0x223, 17, -1, 2),
    fr(0x247, 9, -1, 2),
    fr(0x3AC, 1, -0x26, 1),
    fr(0x3AD, 3, -0x25, 1),
    fr(0x3B1, 17, -32, 1),
    fr(0x3C2, 1, -0x1F, 1),       // final sigma -> SIGMA
    fr(0x3C3, 9, -32, 1),
    fr(0x3CC, 1, -0x40, 1),
    fr(0x3CD, 2, -0x3F, 1),
    fr(0x3D9, 23, -1, 2),
    fr(0x430, 32, -32, 1),
    fr(0x450, 16, -80, 1),
    fr(0x461, 33, -1, 2),
    fr(0x48B, 53, -1, 2),
    fr(0x4C2, 13, -1, 2),
    fr(0x4D1, 95, -1, 2),
    fr(0x561, 38, -48, 1),        // Armenian
    fr(0x1E01, 149, -1, 2),
    fr(0x1EA1, 95, -1, 2),
    fr(0x1F00, 8, 8, 1),
    fr(0x1F10, 6, 8, 1),
    fr(0x1F20, 8, 8, 1),
    fr(0x1F30, 8, 8, 1),
    fr(0x1F40, 6, 8, 1),
    fr(0x1F60, 8, 8, 1),
    fr(0x2170, 16, -16, 1),
    fr(0x24D0, 26, -26, 1),
    fr(0xFF41, 26, -32, 1),
    fr(0x10428, 40, -40, 1),
];
