//! Statements.
use super::{ArithOp, CompilationEngine, Segment, SubroutineCtx, VmWriter};
use crate::{
    error::{CompileError, CompileResult},
    tokens::{Keyword, Span, TokenKind},
};

impl<'a> CompilationEngine<'a> {
    /// statement*
    ///
    /// Stops at the closing brace of the enclosing block, which is left for
    /// the caller to consume.
    pub(super) fn compile_statements(&mut self, ctx: &mut SubroutineCtx, out: &mut VmWriter) -> CompileResult<()> {
        use Keyword as K;

        loop {
            match self.tokens.peek_kind() {
                Some(TokenKind::Keyword(K::Let)) => self.compile_let(out)?,
                Some(TokenKind::Keyword(K::If)) => self.compile_if(ctx, out)?,
                Some(TokenKind::Keyword(K::While)) => self.compile_while(ctx, out)?,
                Some(TokenKind::Keyword(K::Do)) => self.compile_do(out)?,
                Some(TokenKind::Keyword(K::Return)) => self.compile_return(out)?,
                Some(TokenKind::RightBrace) => return Ok(()),
                _ => {
                    let token = self.next()?;
                    return Err(self.unexpected("expected a statement", &token));
                }
            }
        }
    }

    /// `let` name (`[` expression `]`)? `=` expression `;`
    fn compile_let(&mut self, out: &mut VmWriter) -> CompileResult<()> {
        self.tokens.consume(TokenKind::Keyword(Keyword::Let))?;
        let (name, span) = self.ident()?;
        let symbol = self.resolve(&name, span)?;

        if self.tokens.match_token(TokenKind::LeftBracket) {
            out.push(symbol.segment(), symbol.index);
            self.compile_expression(out)?;
            self.tokens.consume(TokenKind::RightBracket)?;
            out.arith(ArithOp::Add);

            self.tokens.consume(TokenKind::Eq)?;
            self.compile_expression(out)?;
            self.tokens.consume(TokenKind::Semicolon)?;

            // The right side may have used `that` itself, so the
            // target address is only bound once its value is stashed.
            out.pop(Segment::Temp, 0);
            out.pop(Segment::Pointer, 1);
            out.push(Segment::Temp, 0);
            out.pop(Segment::That, 0);
        } else {
            self.tokens.consume(TokenKind::Eq)?;
            self.compile_expression(out)?;
            self.tokens.consume(TokenKind::Semicolon)?;

            out.pop(symbol.segment(), symbol.index);
        }

        Ok(())
    }

    /// `if` `(` expression `)` `{` statements `}` (`else` `{` statements `}`)?
    fn compile_if(&mut self, ctx: &mut SubroutineCtx, out: &mut VmWriter) -> CompileResult<()> {
        let token = self.tokens.consume(TokenKind::Keyword(Keyword::If))?;
        let n = ctx.next_if().ok_or_else(|| too_many_labels("if", token.span))?;
        let if_true = format!("IF_TRUE{n}");
        let if_false = format!("IF_FALSE{n}");

        self.tokens.consume(TokenKind::LeftParen)?;
        self.compile_expression(out)?;
        self.tokens.consume(TokenKind::RightParen)?;

        out.if_goto(if_true.as_str());
        out.goto(if_false.as_str());
        out.label(if_true);

        self.compile_block(ctx, out)?;

        if self.tokens.match_token(TokenKind::Keyword(Keyword::Else)) {
            let if_end = format!("IF_END{n}");
            out.goto(if_end.as_str());
            out.label(if_false);
            self.compile_block(ctx, out)?;
            out.label(if_end);
        } else {
            out.label(if_false);
        }

        Ok(())
    }

    /// `while` `(` expression `)` `{` statements `}`
    fn compile_while(&mut self, ctx: &mut SubroutineCtx, out: &mut VmWriter) -> CompileResult<()> {
        let token = self.tokens.consume(TokenKind::Keyword(Keyword::While))?;
        let n = ctx.next_while().ok_or_else(|| too_many_labels("while", token.span))?;
        let while_exp = format!("WHILE_EXP{n}");
        let while_end = format!("WHILE_END{n}");

        out.label(while_exp.as_str());
        self.tokens.consume(TokenKind::LeftParen)?;
        self.compile_expression(out)?;
        self.tokens.consume(TokenKind::RightParen)?;
        out.arith(ArithOp::Not);
        out.if_goto(while_end.as_str());

        self.compile_block(ctx, out)?;

        out.goto(while_exp);
        out.label(while_end);

        Ok(())
    }

    /// `do` subroutineCall `;`
    fn compile_do(&mut self, out: &mut VmWriter) -> CompileResult<()> {
        self.tokens.consume(TokenKind::Keyword(Keyword::Do))?;
        let (name, span) = self.ident()?;
        self.compile_call(name, span, out)?;
        self.tokens.consume(TokenKind::Semicolon)?;

        // Every subroutine returns a value, void ones included.
        out.pop(Segment::Temp, 0);
        Ok(())
    }

    /// `return` expression? `;`
    fn compile_return(&mut self, out: &mut VmWriter) -> CompileResult<()> {
        self.tokens.consume(TokenKind::Keyword(Keyword::Return))?;

        if self.tokens.match_token(TokenKind::Semicolon) {
            out.push(Segment::Constant, 0);
        } else {
            self.compile_expression(out)?;
            self.tokens.consume(TokenKind::Semicolon)?;
        }

        out.ret();
        Ok(())
    }

    /// `{` statements `}`
    fn compile_block(&mut self, ctx: &mut SubroutineCtx, out: &mut VmWriter) -> CompileResult<()> {
        self.tokens.consume(TokenKind::LeftBrace)?;
        self.compile_statements(ctx, out)?;
        self.tokens.consume(TokenKind::RightBrace)?;
        Ok(())
    }
}

#[cold]
fn too_many_labels(statement: &str, span: Span) -> CompileError {
    CompileError::LimitExceeded {
        message: format!("too many '{statement}' statements in one subroutine"),
        span,
    }
}
