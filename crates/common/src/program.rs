//! Program representation: the raw, ordered instruction sequence handed to
//! the engine by a front end. LABEL pseudo-instructions are still present.

use crate::instruction::Instruction;

/// An IPPcode22 program.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Program {
    /// The instruction stream, in execution order.
    pub instructions: Vec<Instruction>,
}

impl Program {
    /// Create a new program from a vector of instructions.
    pub fn new(instructions: Vec<Instruction>) -> Self {
        Self { instructions }
    }

    /// Number of instructions, LABELs included.
    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    /// Returns true if the program has no instructions.
    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_program() {
        let program = Program::new(vec![]);
        assert!(program.is_empty());
        assert_eq!(program.len(), 0);
        assert_eq!(program, Program::default());
    }

    #[test]
    fn len_counts_labels() {
        let program = Program::new(vec![
            Instruction::Label("start".into()),
            Instruction::CreateFrame,
            Instruction::Jump("start".into()),
        ]);
        assert_eq!(program.len(), 3);
        assert!(!program.is_empty());
    }
}
