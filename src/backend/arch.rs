//! This module contains the set of architectures that the exploration
//! engine knows how to drive.

use std::fmt::{Display, Formatter};

/// The architectures supported by the exploration engine.
///
/// The engine itself is architecture-agnostic except for two places: the
/// name of the program-counter register, and the encoding of the return
/// instruction synthesised when a hook stands in for a full function call.
/// Both are total over this type, so adding a variant is a compile-time
/// checklist rather than a runtime surprise.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Arch {
    /// 32-bit x86.
    X86,

    /// 64-bit x86.
    X86_64,

    /// 32-bit ARM.
    Arm32,

    /// 64-bit ARM.
    Aarch64,
}

impl Arch {
    /// Gets the name of the program-counter register for this architecture.
    #[must_use]
    pub fn program_counter(self) -> &'static str {
        match self {
            Self::X86 => "eip",
            Self::X86_64 => "rip",
            Self::Arm32 | Self::Aarch64 => "pc",
        }
    }

    /// Gets the encoding of a bare return instruction for this architecture,
    /// or [`None`] where the engine cannot synthesise one.
    ///
    /// Returning from a hooked function on the ARM architectures is a branch
    /// to the link register rather than a dedicated opcode, and the engine
    /// does not synthesise it.
    #[must_use]
    pub fn return_instruction(self) -> Option<&'static [u8]> {
        match self {
            Self::X86 | Self::X86_64 => Some(&[0xc3]),
            Self::Arm32 | Self::Aarch64 => None,
        }
    }
}

impl Display for Arch {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::X86 => "x86",
            Self::X86_64 => "x86-64",
            Self::Arm32 => "ARM32",
            Self::Aarch64 => "AArch64",
        };
        write!(f, "{name}")
    }
}

#[cfg(test)]
mod test {
    use crate::backend::arch::Arch;

    #[test]
    fn names_the_program_counter_per_architecture() {
        assert_eq!(Arch::X86.program_counter(), "eip");
        assert_eq!(Arch::X86_64.program_counter(), "rip");
        assert_eq!(Arch::Arm32.program_counter(), "pc");
        assert_eq!(Arch::Aarch64.program_counter(), "pc");
    }

    #[test]
    fn synthesises_returns_only_on_x86() {
        assert_eq!(Arch::X86.return_instruction(), Some(&[0xc3][..]));
        assert_eq!(Arch::X86_64.return_instruction(), Some(&[0xc3][..]));
        assert_eq!(Arch::Arm32.return_instruction(), None);
        assert_eq!(Arch::Aarch64.return_instruction(), None);
    }
}
