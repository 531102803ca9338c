//! Expressions, terms and subroutine calls.
use super::{ArithOp, BinaryOp, CompilationEngine, ListProbe, Segment, VmWriter};
use crate::{
    constants::{MATH_DIVIDE, MATH_MULTIPLY, STRING_APPEND_CHAR, STRING_NEW},
    error::{CompileError, CompileResult},
    tokens::{Keyword, Span, TokenKind},
};
use log::trace;
use smol_str::SmolStr;

impl<'a> CompilationEngine<'a> {
    /// term (op term)*
    ///
    /// Operators have no precedence and are applied left to right.
    pub(super) fn compile_expression(&mut self, out: &mut VmWriter) -> CompileResult<()> {
        self.compile_term(out)?;

        while let Some(op) = self.tokens.peek_kind().and_then(BinaryOp::from_token) {
            self.tokens.next_token();
            self.compile_term(out)?;
            emit_binary_op(op, out);
        }

        Ok(())
    }

    fn compile_term(&mut self, out: &mut VmWriter) -> CompileResult<()> {
        use Keyword as K;

        let token = self.next()?;
        match token.kind {
            TokenKind::Number => {
                let value = self
                    .tokens
                    .span_fragment(&token.span)
                    .parse::<u16>()
                    .map_err(|_| CompileError::IntegerOverflow { span: token.span })?;
                out.push(Segment::Constant, value);
            }
            TokenKind::String => self.compile_string(token.span, out)?,
            TokenKind::Keyword(K::True) => {
                out.push(Segment::Constant, 0);
                out.arith(ArithOp::Not);
            }
            TokenKind::Keyword(K::False | K::Null) => out.push(Segment::Constant, 0),
            TokenKind::Keyword(K::This) => out.push(Segment::Pointer, 0),
            TokenKind::Minus => {
                self.compile_term(out)?;
                out.arith(ArithOp::Neg);
            }
            TokenKind::Tilde => {
                self.compile_term(out)?;
                out.arith(ArithOp::Not);
            }
            TokenKind::LeftParen => {
                self.compile_expression(out)?;
                self.tokens.consume(TokenKind::RightParen)?;
            }
            TokenKind::Ident => {
                let name: SmolStr = self.tokens.span_fragment(&token.span).into();

                match self.tokens.peek_kind() {
                    Some(TokenKind::LeftParen | TokenKind::Dot) => self.compile_call(name, token.span, out)?,
                    Some(TokenKind::LeftBracket) => {
                        let symbol = self.resolve(&name, token.span)?;
                        self.tokens.next_token();

                        out.push(symbol.segment(), symbol.index);
                        self.compile_expression(out)?;
                        self.tokens.consume(TokenKind::RightBracket)?;
                        out.arith(ArithOp::Add);
                        out.pop(Segment::Pointer, 1);
                        out.push(Segment::That, 0);
                    }
                    _ => {
                        let symbol = self.resolve(&name, token.span)?;
                        out.push(symbol.segment(), symbol.index);
                    }
                }
            }
            _ => return Err(self.unexpected("expected a term", &token)),
        }

        Ok(())
    }

    /// Build a string object one character at a time.
    fn compile_string(&mut self, span: Span, out: &mut VmWriter) -> CompileResult<()> {
        let quoted = self.tokens.span_fragment(&span);
        let text = &quoted[1..quoted.len() - 1];

        let len = u16::try_from(text.chars().count()).map_err(|_| CompileError::IntegerOverflow { span })?;
        out.push(Segment::Constant, len);
        out.call(STRING_NEW, 1);

        for c in text.chars() {
            let code = u16::try_from(c as u32).map_err(|_| CompileError::IntegerOverflow { span })?;
            out.push(Segment::Constant, code);
            out.call(STRING_APPEND_CHAR, 2);
        }

        Ok(())
    }

    /// name `(` expressionList `)`
    /// | (className | varName) `.` name `(` expressionList `)`
    ///
    /// The leading name has already been consumed.
    pub(super) fn compile_call(&mut self, name: SmolStr, span: Span, out: &mut VmWriter) -> CompileResult<()> {
        let (target, receiver) = if self.tokens.match_token(TokenKind::Dot) {
            let (subroutine, _) = self.ident()?;

            match self.scopes.lookup(&name) {
                // Method call on an object held in a variable.
                Some(symbol) => {
                    out.push(symbol.segment(), symbol.index);
                    (SmolStr::from(format!("{}.{}", symbol.ty, subroutine)), 1)
                }
                // Function or constructor of another class.
                None => (SmolStr::from(format!("{name}.{subroutine}")), 0),
            }
        } else {
            // Method call on the current object.
            out.push(Segment::Pointer, 0);
            (self.qualify(&name), 1)
        };

        self.tokens.consume(TokenKind::LeftParen)?;
        let n_args = self.compile_expression_list(out)?;
        self.tokens.consume(TokenKind::RightParen)?;

        let n_args = n_args
            .checked_add(receiver)
            .ok_or(CompileError::IntegerOverflow { span })?;
        out.call(target, n_args);

        Ok(())
    }

    /// (expression (`,` expression)*)?
    ///
    /// Returns the number of expressions compiled.
    fn compile_expression_list(&mut self, out: &mut VmWriter) -> CompileResult<u16> {
        if !self.probe_expression(out.is_muted()) {
            return Ok(0);
        }

        self.compile_expression(out)?;
        let mut count: u16 = 1;

        while self.tokens.match_token(TokenKind::Comma) {
            self.compile_expression(out)?;
            count = count
                .checked_add(1)
                .ok_or_else(|| CompileError::IntegerOverflow { span: self.tokens.current_span() })?;
        }

        Ok(count)
    }

    /// Whether an expression starts at the current token.
    ///
    /// A speculative probe that is already part of a dry run
    /// falls back to the static check, because the token stream
    /// only holds a single checkpoint.
    fn probe_expression(&mut self, dry_run: bool) -> bool {
        match self.conf.list_probe {
            ListProbe::Speculative if !dry_run => self.speculate_expression(),
            ListProbe::FirstSet | ListProbe::Speculative => {
                self.tokens.peek_kind().map(|kind| kind.starts_term()).unwrap_or(false)
            }
        }
    }

    /// Dry-run one expression into a muted writer, and rewind.
    ///
    /// Errors other than syntax errors still mean an expression is
    /// present. Compiling it for real will report them.
    fn speculate_expression(&mut self) -> bool {
        self.tokens.checkpoint();
        let mut scratch = VmWriter::muted();
        let result = self.compile_expression(&mut scratch);
        self.tokens.rollback();

        trace!("speculative expression: {result:?}");

        match result {
            Ok(()) => true,
            Err(err) => !err.is_syntax(),
        }
    }
}

fn emit_binary_op(op: BinaryOp, out: &mut VmWriter) {
    match op {
        BinaryOp::Add => out.arith(ArithOp::Add),
        BinaryOp::Sub => out.arith(ArithOp::Sub),
        BinaryOp::Mul => out.call(MATH_MULTIPLY, 2),
        BinaryOp::Div => out.call(MATH_DIVIDE, 2),
        BinaryOp::And => out.arith(ArithOp::And),
        BinaryOp::Or => out.arith(ArithOp::Or),
        BinaryOp::Lt => out.arith(ArithOp::Lt),
        BinaryOp::Gt => out.arith(ArithOp::Gt),
        BinaryOp::Eq => out.arith(ArithOp::Eq),
    }
}

#[cfg(test)]
mod test {
    use crate::compile::{CompilationEngine, CompileConf, ListProbe};
    use crate::error::CompileError;

    const PRELUDE: &str = "field int x; field Point p; static Array arr;";

    fn compile_with(probe: ListProbe, expr: &str) -> Result<Vec<String>, CompileError> {
        let source = format!("class T {{ {PRELUDE} method int m(int a, int b) {{ return {expr}; }} }}");
        let conf = CompileConf { list_probe: probe };
        CompilationEngine::new(&source, conf).compile_class().map(|code| {
            code.iter()
                // Skip the function header and method preamble.
                .skip(3)
                .map(|instr| instr.to_string())
                // Drop the trailing return.
                .filter(|line| line != "return")
                .collect()
        })
    }

    /// Compile an expression as the return value of a method,
    /// with both probe strategies, and check they agree.
    fn compile_expr(expr: &str) -> Vec<String> {
        let first_set = compile_with(ListProbe::FirstSet, expr).unwrap();
        let speculative = compile_with(ListProbe::Speculative, expr).unwrap();
        assert_eq!(first_set, speculative, "probe strategies disagree on `{expr}`");
        first_set
    }

    #[test]
    fn test_no_precedence() {
        assert_eq!(
            compile_expr("2 + 3 * 4"),
            vec![
                "push constant 2",
                "push constant 3",
                "add",
                "push constant 4",
                "call Math.multiply 2",
            ]
        );
        assert_eq!(
            compile_expr("a / (b - 1)"),
            vec![
                "push argument 1",
                "push argument 2",
                "push constant 1",
                "sub",
                "call Math.divide 2",
            ]
        );
    }

    #[test]
    fn test_operators() {
        assert_eq!(
            compile_expr("a & b | x < 1 > 2 = 3"),
            vec![
                "push argument 1",
                "push argument 2",
                "and",
                "push this 0",
                "or",
                "push constant 1",
                "lt",
                "push constant 2",
                "gt",
                "push constant 3",
                "eq",
            ]
        );
    }

    #[test]
    fn test_unary() {
        assert_eq!(
            compile_expr("-a + ~(b)"),
            vec!["push argument 1", "neg", "push argument 2", "not", "add"]
        );
        assert_eq!(
            compile_expr("~-x"),
            vec!["push this 0", "neg", "not"]
        );
    }

    #[test]
    fn test_keyword_constants() {
        assert_eq!(compile_expr("true"), vec!["push constant 0", "not"]);
        assert_eq!(compile_expr("false"), vec!["push constant 0"]);
        assert_eq!(compile_expr("null"), vec!["push constant 0"]);
        assert_eq!(compile_expr("this"), vec!["push pointer 0"]);
    }

    #[test]
    fn test_string() {
        assert_eq!(
            compile_expr("\"hi\""),
            vec![
                "push constant 2",
                "call String.new 1",
                "push constant 104",
                "call String.appendChar 2",
                "push constant 105",
                "call String.appendChar 2",
            ]
        );
        assert_eq!(compile_expr("\"\""), vec!["push constant 0", "call String.new 1"]);
    }

    #[test]
    fn test_array_read() {
        assert_eq!(
            compile_expr("arr[a + 1]"),
            vec![
                "push static 0",
                "push argument 1",
                "push constant 1",
                "add",
                "add",
                "pop pointer 1",
                "push that 0",
            ]
        );
    }

    #[test]
    fn test_call_shapes() {
        // Unqualified: method on the current object.
        assert_eq!(
            compile_expr("m(1, 2)"),
            vec!["push pointer 0", "push constant 1", "push constant 2", "call T.m 3"]
        );
        // Qualified by a variable: method on that object.
        assert_eq!(
            compile_expr("p.getX()"),
            vec!["push this 1", "call Point.getX 1"]
        );
        // Qualified by a class name: plain function call.
        assert_eq!(compile_expr("Math.max(a, b)"), vec![
            "push argument 1",
            "push argument 2",
            "call Math.max 2",
        ]);
        assert_eq!(compile_expr("Keyboard.readChar()"), vec!["call Keyboard.readChar 0"]);
    }

    #[test]
    fn test_nested_calls() {
        assert_eq!(
            compile_expr("Math.abs(p.dist(Point.new(-1, a)))"),
            vec![
                "push this 1",
                "push constant 1",
                "neg",
                "push argument 1",
                "call Point.new 2",
                "call Point.dist 2",
                "call Math.abs 1",
            ]
        );
    }

    #[test]
    fn test_integer_range() {
        assert_eq!(compile_expr("32767"), vec!["push constant 32767"]);
        assert_eq!(compile_expr("40000"), vec!["push constant 40000"]);
        assert!(matches!(
            compile_with(ListProbe::FirstSet, "65536"),
            Err(CompileError::IntegerOverflow { .. })
        ));
    }

    #[test]
    fn test_undefined_variable() {
        for probe in [ListProbe::FirstSet, ListProbe::Speculative] {
            let err = compile_with(probe, "Math.abs(missing)").unwrap_err();
            assert!(matches!(err, CompileError::UndefinedSymbol { ref name, .. } if name == "missing"));
        }
    }

    #[test]
    fn test_bad_term() {
        for probe in [ListProbe::FirstSet, ListProbe::Speculative] {
            let err = compile_with(probe, "a + ;").unwrap_err();
            assert_eq!(err.to_string(), "expected a term, found ';'");
        }
    }

    #[test]
    fn test_unclosed_argument_list() {
        for probe in [ListProbe::FirstSet, ListProbe::Speculative] {
            assert!(compile_with(probe, "Math.abs(a").unwrap_err().is_syntax());
        }
    }
}
