//! Instruction sink.
use super::ir::{ArithOp, Instr, Segment};
use itertools::Itertools;
use smol_str::SmolStr;

/// Append-only buffer of emitted instructions for one class.
///
/// A muted writer accepts instructions and drops them. It's
/// handed to speculative parses that must not leave output behind.
#[derive(Debug, Default)]
pub struct VmWriter {
    code: Vec<Instr>,
    muted: bool,
}

impl VmWriter {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn muted() -> Self {
        Self {
            code: vec![],
            muted: true,
        }
    }

    #[inline]
    pub fn is_muted(&self) -> bool {
        self.muted
    }

    pub fn emit(&mut self, instr: Instr) {
        if self.muted {
            return;
        }

        #[cfg(feature = "op_trace")]
        log::trace!("{instr}");

        self.code.push(instr);
    }

    #[inline]
    pub fn push(&mut self, segment: Segment, index: u16) {
        self.emit(Instr::Push(segment, index))
    }

    #[inline]
    pub fn pop(&mut self, segment: Segment, index: u16) {
        self.emit(Instr::Pop(segment, index))
    }

    #[inline]
    pub fn arith(&mut self, op: ArithOp) {
        self.emit(Instr::Arith(op))
    }

    #[inline]
    pub fn label(&mut self, label: impl Into<SmolStr>) {
        self.emit(Instr::Label(label.into()))
    }

    #[inline]
    pub fn goto(&mut self, label: impl Into<SmolStr>) {
        self.emit(Instr::Goto(label.into()))
    }

    #[inline]
    pub fn if_goto(&mut self, label: impl Into<SmolStr>) {
        self.emit(Instr::IfGoto(label.into()))
    }

    #[inline]
    pub fn call(&mut self, name: impl Into<SmolStr>, n_args: u16) {
        self.emit(Instr::Call(name.into(), n_args))
    }

    #[inline]
    pub fn function(&mut self, name: impl Into<SmolStr>, n_locals: u16) {
        self.emit(Instr::Function(name.into(), n_locals))
    }

    #[inline]
    pub fn ret(&mut self) {
        self.emit(Instr::Return)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.code.is_empty()
    }

    #[inline]
    pub fn instructions(&self) -> &[Instr] {
        &self.code
    }

    #[inline]
    pub fn into_instructions(self) -> Vec<Instr> {
        self.code
    }
}

/// Render instructions as VM code text, one instruction per line.
pub fn render(code: &[Instr]) -> String {
    if code.is_empty() {
        return String::new();
    }
    let mut text = code.iter().join("\n");
    text.push('\n');
    text
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_muted_writer_drops_code() {
        let mut writer = VmWriter::muted();
        writer.push(Segment::Constant, 1);
        writer.ret();
        assert!(writer.is_muted());
        assert!(writer.is_empty());
    }

    #[test]
    fn test_render() {
        let mut writer = VmWriter::new();
        writer.push(Segment::Constant, 0);
        writer.ret();
        assert_eq!(render(writer.instructions()), "push constant 0\nreturn\n");
        assert_eq!(render(&[]), "");
    }
}
