//! Single pass compilation engine.
//!
//! Each grammar production is one method on [`CompilationEngine`]. A method
//! checks the current token against its production, updates or consults the
//! scope tables, and emits instructions straight into a [`VmWriter`] as it
//! goes. No syntax tree is built.
mod expr;
mod ir;
mod stmts;
mod symbol;
mod writer;

pub use ir::{ArithOp, BinaryOp, Instr, Segment};
pub use symbol::{DefineError, Scopes, Symbol, SymbolKind, SymbolTable};
pub use writer::{render, VmWriter};

use crate::{
    constants::{MEMORY_ALLOC, THIS},
    error::{CompileError, CompileResult},
    token_stream::TokenStream,
    tokens::{Keyword, Span, Token, TokenKind},
};
use log::debug;
use smol_str::SmolStr;

/// Strategy for deciding whether a call's argument list is empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ListProbe {
    /// Check whether the next token can begin an expression.
    #[default]
    FirstSet,
    /// Attempt a dry-run parse of one expression and roll back.
    Speculative,
}

/// Compiler configuration.
#[derive(Debug, Clone, Default)]
pub struct CompileConf {
    pub list_probe: ListProbe,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubroutineKind {
    Constructor,
    Function,
    Method,
}

/// State owned by the subroutine currently being compiled.
#[derive(Debug)]
pub struct SubroutineCtx {
    pub kind: SubroutineKind,
    pub name: SmolStr,
    if_count: u16,
    while_count: u16,
}

impl SubroutineCtx {
    pub fn new(kind: SubroutineKind, name: impl Into<SmolStr>) -> Self {
        Self {
            kind,
            name: name.into(),
            if_count: 0,
            while_count: 0,
        }
    }

    /// Take the next `if` label number.
    ///
    /// `None` once the numbers are used up, since a repeated
    /// number would repeat the labels.
    #[inline]
    pub fn next_if(&mut self) -> Option<u16> {
        let n = self.if_count;
        self.if_count = n.checked_add(1)?;
        Some(n)
    }

    /// Take the next `while` label number.
    #[inline]
    pub fn next_while(&mut self) -> Option<u16> {
        let n = self.while_count;
        self.while_count = n.checked_add(1)?;
        Some(n)
    }
}

/// Recursive descent compiler for a single class.
pub struct CompilationEngine<'a> {
    tokens: TokenStream<'a>,
    scopes: Scopes,
    /// Qualifies emitted function names and unqualified calls.
    class_name: SmolStr,
    conf: CompileConf,
}

impl<'a> CompilationEngine<'a> {
    pub fn new(source_code: &'a str, conf: CompileConf) -> Self {
        Self::from_tokens(TokenStream::from_source(source_code), conf)
    }

    pub fn from_tokens(tokens: TokenStream<'a>, conf: CompileConf) -> Self {
        Self {
            tokens,
            scopes: Scopes::new(),
            class_name: SmolStr::default(),
            conf,
        }
    }

    pub fn class_name(&self) -> &str {
        self.class_name.as_str()
    }

    pub fn scopes(&self) -> &Scopes {
        &self.scopes
    }

    /// Compile the source's single class and return its code.
    ///
    /// `class` identifier `{` classVarDec* subroutineDec* `}`
    pub fn compile_class(&mut self) -> CompileResult<Vec<Instr>> {
        use Keyword as K;
        use TokenKind as TK;

        let mut out = VmWriter::new();

        self.tokens.consume(TK::Keyword(K::Class))?;
        let (class_name, _) = self.ident()?;
        self.class_name = class_name;
        self.tokens.consume(TK::LeftBrace)?;

        while let Some(TK::Keyword(K::Static | K::Field)) = self.tokens.peek_kind() {
            self.compile_class_var_dec()?;
        }

        while let Some(TK::Keyword(K::Constructor | K::Function | K::Method)) = self.tokens.peek_kind() {
            self.compile_subroutine(&mut out)?;
        }

        self.tokens.consume(TK::RightBrace)?;
        self.tokens.consume(TK::EOF)?;

        self.scopes
            .class()
            .debug_print(&format!("class {} symbol table:", self.class_name));

        Ok(out.into_instructions())
    }

    /// (`static` | `field`) type name (`,` name)* `;`
    fn compile_class_var_dec(&mut self) -> CompileResult<()> {
        let token = self.next()?;
        let kind = match token.kind {
            TokenKind::Keyword(Keyword::Static) => SymbolKind::Static,
            TokenKind::Keyword(Keyword::Field) => SymbolKind::Field,
            _ => return Err(self.unexpected("expected 'static' or 'field'", &token)),
        };

        self.compile_var_names(kind)
    }

    /// `var` type name (`,` name)* `;`
    fn compile_var_dec(&mut self) -> CompileResult<()> {
        self.tokens.consume(TokenKind::Keyword(Keyword::Var))?;
        self.compile_var_names(SymbolKind::Local)
    }

    /// Every name in a declaration list shares the type and kind.
    fn compile_var_names(&mut self, kind: SymbolKind) -> CompileResult<()> {
        let ty = self.compile_type(false)?;

        loop {
            let (name, span) = self.ident()?;
            self.define(name, ty.clone(), kind, span)?;

            if !self.tokens.match_token(TokenKind::Comma) {
                break;
            }
        }

        self.tokens.consume(TokenKind::Semicolon)?;
        Ok(())
    }

    /// (`constructor` | `function` | `method`) (`void` | type) name `(` parameterList `)` subroutineBody
    fn compile_subroutine(&mut self, out: &mut VmWriter) -> CompileResult<()> {
        let token = self.next()?;
        let kind = match token.kind {
            TokenKind::Keyword(Keyword::Constructor) => SubroutineKind::Constructor,
            TokenKind::Keyword(Keyword::Function) => SubroutineKind::Function,
            TokenKind::Keyword(Keyword::Method) => SubroutineKind::Method,
            _ => return Err(self.unexpected("expected 'constructor', 'function' or 'method'", &token)),
        };

        self.scopes.enter_subroutine();
        if kind == SubroutineKind::Method {
            // The object is passed as a hidden first argument.
            self.define(THIS.into(), self.class_name.clone(), SymbolKind::Arg, token.span)?;
        }

        self.compile_type(true)?;
        let (name, _) = self.ident()?;
        let mut ctx = SubroutineCtx::new(kind, name);

        self.tokens.consume(TokenKind::LeftParen)?;
        self.compile_parameter_list()?;
        self.tokens.consume(TokenKind::RightParen)?;

        self.compile_subroutine_body(&mut ctx, out)?;

        if let Some(table) = self.scopes.subroutine() {
            table.debug_print(&format!("{}.{} symbol table:", self.class_name, ctx.name));
        }

        Ok(())
    }

    /// ((type name) (`,` type name)*)?
    fn compile_parameter_list(&mut self) -> CompileResult<()> {
        if self.tokens.peek_kind() == Some(TokenKind::RightParen) {
            return Ok(());
        }

        loop {
            let ty = self.compile_type(false)?;
            let (name, span) = self.ident()?;
            self.define(name, ty, SymbolKind::Arg, span)?;

            if !self.tokens.match_token(TokenKind::Comma) {
                break;
            }
        }

        Ok(())
    }

    /// `{` varDec* statements `}`
    fn compile_subroutine_body(&mut self, ctx: &mut SubroutineCtx, out: &mut VmWriter) -> CompileResult<()> {
        self.tokens.consume(TokenKind::LeftBrace)?;

        while self.tokens.peek_kind() == Some(TokenKind::Keyword(Keyword::Var)) {
            self.compile_var_dec()?;
        }

        // The header declares the local count, so it can only
        // be emitted once every local has been declared.
        let n_locals = self.scopes.count(SymbolKind::Local);
        let function_name = self.qualify(&ctx.name);
        debug!("function {function_name} {n_locals}");
        out.function(function_name, n_locals);

        match ctx.kind {
            SubroutineKind::Constructor => {
                out.push(Segment::Constant, self.scopes.count(SymbolKind::Field));
                out.call(MEMORY_ALLOC, 1);
                out.pop(Segment::Pointer, 0);
            }
            SubroutineKind::Method => {
                out.push(Segment::Argument, 0);
                out.pop(Segment::Pointer, 0);
            }
            SubroutineKind::Function => {}
        }

        self.compile_statements(ctx, out)?;

        self.tokens.consume(TokenKind::RightBrace)?;
        Ok(())
    }

    /// `int` | `char` | `boolean` | class name, and `void` when allowed.
    fn compile_type(&mut self, allow_void: bool) -> CompileResult<SmolStr> {
        use Keyword as K;

        let token = self.next()?;
        match token.kind {
            TokenKind::Keyword(keyword @ (K::Int | K::Char | K::Boolean)) => Ok(keyword.as_str().into()),
            TokenKind::Keyword(K::Void) if allow_void => Ok(K::Void.as_str().into()),
            TokenKind::Ident => Ok(self.tokens.span_fragment(&token.span).into()),
            _ if allow_void => Err(self.unexpected("expected 'void' or a type", &token)),
            _ => Err(self.unexpected("expected a type", &token)),
        }
    }
}

/// Helpers
impl<'a> CompilationEngine<'a> {
    /// Consume an identifier and return its name.
    fn ident(&mut self) -> CompileResult<(SmolStr, Span)> {
        let token = self.tokens.consume(TokenKind::Ident)?;
        Ok((self.tokens.span_fragment(&token.span).into(), token.span))
    }

    /// Consume the current token regardless of kind.
    fn next(&mut self) -> CompileResult<Token> {
        self.tokens
            .next_token()
            .ok_or(CompileError::Token(crate::token_stream::TokenError::EndOfSource))
    }

    fn define(&mut self, name: SmolStr, ty: SmolStr, kind: SymbolKind, span: Span) -> CompileResult<()> {
        self.scopes
            .define(name, ty, kind)
            .map(|_| ())
            .map_err(|err| match err {
                DefineError::Exists(name) => CompileError::SymbolExists { name, span },
                DefineError::Full(kind) => CompileError::LimitExceeded {
                    message: format!("too many {kind} variables"),
                    span,
                },
            })
    }

    /// Find a variable, searching the subroutine scope before the class scope.
    fn resolve(&self, name: &str, span: Span) -> CompileResult<Symbol> {
        self.scopes
            .lookup(name)
            .cloned()
            .ok_or_else(|| CompileError::UndefinedSymbol { name: name.into(), span })
    }

    /// Name of a subroutine in this class, as it appears in VM code.
    fn qualify(&self, name: &str) -> SmolStr {
        SmolStr::from(format!("{}.{}", self.class_name, name))
    }

    #[inline(never)]
    #[cold]
    fn unexpected(&self, message: &str, token: &Token) -> CompileError {
        let found = match token.kind {
            TokenKind::EOF => "end-of-file".to_owned(),
            _ => format!("'{}'", self.tokens.span_fragment(&token.span)),
        };
        CompileError::unexpected(format!("{message}, found {found}"), token.span)
    }
}
