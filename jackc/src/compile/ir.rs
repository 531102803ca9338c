use crate::tokens::TokenKind;
use smol_str::SmolStr;
use std::fmt;

/// Instruction of the target stack machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instr {
    /// `function <Class.name> <nLocals>`
    Function(SmolStr, u16),
    /// `push <segment> <index>`
    Push(Segment, u16),
    /// `pop <segment> <index>`
    Pop(Segment, u16),
    /// Arithmetic and logic on the top of the stack.
    Arith(ArithOp),
    /// `label <Label>`
    Label(SmolStr),
    /// `goto <Label>`
    Goto(SmolStr),
    /// `if-goto <Label>`
    ///
    /// Pops the top of the stack and jumps when it's not zero.
    IfGoto(SmolStr),
    /// `call <Class.name> <nArgs>`
    Call(SmolStr, u16),
    /// `return`
    Return,
}

/// Outputs instruction as VM code text.
impl fmt::Display for Instr {
    #[rustfmt::skip]
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Instr::Function(name, n_locals) => write!(f, "function {} {}", name, n_locals),
            Instr::Push(segment, index)     => write!(f, "push {} {}", segment, index),
            Instr::Pop(segment, index)      => write!(f, "pop {} {}", segment, index),
            Instr::Arith(op)                => write!(f, "{}", op),
            Instr::Label(label)             => write!(f, "label {}", label),
            Instr::Goto(label)              => write!(f, "goto {}", label),
            Instr::IfGoto(label)            => write!(f, "if-goto {}", label),
            Instr::Call(name, n_args)       => write!(f, "call {} {}", name, n_args),
            Instr::Return                   => write!(f, "return"),
        }
    }
}

/// Named memory region of the stack machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment {
    Constant,
    Argument,
    Local,
    Static,
    /// Fields of the current object, based at `pointer 0`.
    This,
    /// Array element window, based at `pointer 1`.
    That,
    Pointer,
    Temp,
}

impl fmt::Display for Segment {
    #[rustfmt::skip]
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Segment::Constant => write!(f, "constant"),
            Segment::Argument => write!(f, "argument"),
            Segment::Local    => write!(f, "local"),
            Segment::Static   => write!(f, "static"),
            Segment::This     => write!(f, "this"),
            Segment::That     => write!(f, "that"),
            Segment::Pointer  => write!(f, "pointer"),
            Segment::Temp     => write!(f, "temp"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithOp {
    Add,
    Sub,
    Neg,
    Eq,
    Gt,
    Lt,
    And,
    Or,
    Not,
}

impl fmt::Display for ArithOp {
    #[rustfmt::skip]
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ArithOp::Add => write!(f, "add"),
            ArithOp::Sub => write!(f, "sub"),
            ArithOp::Neg => write!(f, "neg"),
            ArithOp::Eq  => write!(f, "eq"),
            ArithOp::Gt  => write!(f, "gt"),
            ArithOp::Lt  => write!(f, "lt"),
            ArithOp::And => write!(f, "and"),
            ArithOp::Or  => write!(f, "or"),
            ArithOp::Not => write!(f, "not"),
        }
    }
}

/// Binary operator of the expression grammar.
///
/// All operators share one precedence level and
/// associate to the left.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    And,
    Or,
    Lt,
    Gt,
    Eq,
}

impl BinaryOp {
    #[rustfmt::skip]
    pub fn from_token(kind: TokenKind) -> Option<Self> {
        match kind {
            TokenKind::Plus    => Some(Self::Add),
            TokenKind::Minus   => Some(Self::Sub),
            TokenKind::Star    => Some(Self::Mul),
            TokenKind::Slash   => Some(Self::Div),
            TokenKind::Amp     => Some(Self::And),
            TokenKind::Pipe    => Some(Self::Or),
            TokenKind::Less    => Some(Self::Lt),
            TokenKind::Greater => Some(Self::Gt),
            TokenKind::Eq      => Some(Self::Eq),
            _ => None,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_instr_text() {
        let code = [
            Instr::Function("Main.main".into(), 2),
            Instr::Push(Segment::Constant, 7),
            Instr::Pop(Segment::That, 0),
            Instr::Arith(ArithOp::Not),
            Instr::Label("WHILE_EXP0".into()),
            Instr::IfGoto("WHILE_END0".into()),
            Instr::Goto("WHILE_EXP0".into()),
            Instr::Call("Math.multiply".into(), 2),
            Instr::Return,
        ];
        let text = code.iter().map(|i| i.to_string()).collect::<Vec<_>>();
        assert_eq!(
            text,
            vec![
                "function Main.main 2",
                "push constant 7",
                "pop that 0",
                "not",
                "label WHILE_EXP0",
                "if-goto WHILE_END0",
                "goto WHILE_EXP0",
                "call Math.multiply 2",
                "return",
            ]
        );
    }

    #[test]
    fn test_operator_tokens() {
        assert_eq!(BinaryOp::from_token(TokenKind::Pipe), Some(BinaryOp::Or));
        assert_eq!(BinaryOp::from_token(TokenKind::Tilde), None);
    }
}
