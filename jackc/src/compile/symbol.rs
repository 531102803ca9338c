use super::ir::Segment;
use log::debug;
use smol_str::SmolStr;
use std::{collections::BTreeMap, fmt};

/// Storage kind of a variable.
///
/// Decides both the segment a variable lives in, and
/// which of the independent index counters it draws from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymbolKind {
    Static,
    Field,
    Arg,
    Local,
}

impl SymbolKind {
    const COUNT: usize = 4;

    #[inline]
    pub fn segment(self) -> Segment {
        match self {
            SymbolKind::Static => Segment::Static,
            SymbolKind::Field => Segment::This,
            SymbolKind::Arg => Segment::Argument,
            SymbolKind::Local => Segment::Local,
        }
    }

    /// Static and field variables live as long as the class.
    #[inline]
    pub fn is_class_level(self) -> bool {
        matches!(self, SymbolKind::Static | SymbolKind::Field)
    }

    #[inline]
    fn slot(self) -> usize {
        self as usize
    }
}

impl fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SymbolKind::Static => write!(f, "static"),
            SymbolKind::Field => write!(f, "field"),
            SymbolKind::Arg => write!(f, "arg"),
            SymbolKind::Local => write!(f, "local"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
    pub name: SmolStr,
    /// Declared type, either a primitive or a class name.
    pub ty: SmolStr,
    pub kind: SymbolKind,
    pub index: u16,
}

impl Symbol {
    #[inline]
    pub fn segment(&self) -> Segment {
        self.kind.segment()
    }
}

/// Reason a variable couldn't be added to a table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DefineError {
    /// The name is already defined in the same table.
    Exists(SmolStr),
    /// Every index of the kind is taken.
    Full(SymbolKind),
}

/// Maps names to their declared type, storage kind and index.
#[derive(Debug, Default)]
pub struct SymbolTable {
    symbols: BTreeMap<SmolStr, Symbol>,
    counts: [u16; SymbolKind::COUNT],
}

impl SymbolTable {
    /// Add a variable, taking the next index of its kind.
    pub fn define(
        &mut self,
        name: impl Into<SmolStr>,
        ty: impl Into<SmolStr>,
        kind: SymbolKind,
    ) -> Result<&Symbol, DefineError> {
        let name = name.into();
        if self.symbols.contains_key(&name) {
            return Err(DefineError::Exists(name));
        }

        // The count must stay representable, so the last index is never handed out.
        let index = self.counts[kind.slot()];
        self.counts[kind.slot()] = index.checked_add(1).ok_or(DefineError::Full(kind))?;

        let symbol = Symbol {
            name: name.clone(),
            ty: ty.into(),
            kind,
            index,
        };
        Ok(self.symbols.entry(name).or_insert(symbol))
    }

    #[inline]
    pub fn lookup(&self, name: &str) -> Option<&Symbol> {
        self.symbols.get(name)
    }

    #[inline]
    pub fn contains(&self, name: &str) -> bool {
        self.symbols.contains_key(name)
    }

    /// Number of variables of the given kind defined so far.
    #[inline]
    pub fn count(&self, kind: SymbolKind) -> u16 {
        self.counts[kind.slot()]
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Clear all entries and counters.
    pub fn reset(&mut self) {
        self.symbols.clear();
        self.counts = Default::default();
    }

    /// Symbols ordered by kind, then index.
    pub fn iter_sorted(&self) -> impl Iterator<Item = &Symbol> {
        let mut symbols = self.symbols.values().collect::<Vec<_>>();
        symbols.sort_by_key(|s| (s.kind.slot(), s.index));
        symbols.into_iter()
    }

    pub fn debug_print(&self, title: &str) {
        debug!("{title}");
        for symbol in self.iter_sorted() {
            debug!(
                "  {:<12} {:<10} {:<6} {}",
                symbol.name, symbol.ty, symbol.kind, symbol.index
            );
        }
    }
}

/// Stack of symbol tables, searched from the innermost layer out.
///
/// The bottom layer belongs to the class and lives for the
/// whole compilation. The subroutine layer above it is reset
/// at the start of every subroutine.
#[derive(Debug)]
pub struct Scopes {
    layers: Vec<SymbolTable>,
}

impl Scopes {
    pub fn new() -> Self {
        // Implicitly starts with the class scope.
        Self {
            layers: vec![SymbolTable::default()],
        }
    }

    #[inline]
    pub fn class(&self) -> &SymbolTable {
        &self.layers[0]
    }

    /// Innermost subroutine scope, if a subroutine has been entered.
    #[inline]
    pub fn subroutine(&self) -> Option<&SymbolTable> {
        self.layers.get(1..).and_then(|rest| rest.last())
    }

    /// Start a fresh subroutine scope above the class scope.
    pub fn enter_subroutine(&mut self) -> &mut SymbolTable {
        self.layers.truncate(2);
        if self.layers.len() == 1 {
            self.layers.push(SymbolTable::default());
        }
        let table = &mut self.layers[1];
        table.reset();
        table
    }

    /// Define a variable in the layer its kind belongs to.
    ///
    /// Subroutine-level kinds defined before a subroutine has
    /// been entered start the subroutine layer implicitly.
    pub fn define(
        &mut self,
        name: impl Into<SmolStr>,
        ty: impl Into<SmolStr>,
        kind: SymbolKind,
    ) -> Result<&Symbol, DefineError> {
        if kind.is_class_level() {
            self.layers[0].define(name, ty, kind)
        } else {
            if self.layers.len() == 1 {
                self.layers.push(SymbolTable::default());
            }
            let last = self.layers.len() - 1;
            self.layers[last].define(name, ty, kind)
        }
    }

    /// Lookup the given name according to the scope rules.
    ///
    /// The innermost layer shadows the layers below it.
    pub fn lookup(&self, name: &str) -> Option<&Symbol> {
        self.layers.iter().rev().find_map(|table| table.lookup(name))
    }

    /// Number of variables of the given kind in the layer that owns the kind.
    pub fn count(&self, kind: SymbolKind) -> u16 {
        if kind.is_class_level() {
            self.class().count(kind)
        } else {
            self.subroutine().map(|t| t.count(kind)).unwrap_or(0)
        }
    }
}

impl Default for Scopes {
    #[inline]
    fn default() -> Self {
        Scopes::new()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_indices_per_kind() {
        let mut table = SymbolTable::default();
        table.define("a", "int", SymbolKind::Field).unwrap();
        table.define("b", "int", SymbolKind::Static).unwrap();
        table.define("c", "Point", SymbolKind::Field).unwrap();
        table.define("d", "boolean", SymbolKind::Field).unwrap();

        assert_eq!(table.lookup("a").unwrap().index, 0);
        assert_eq!(table.lookup("b").unwrap().index, 0);
        assert_eq!(table.lookup("c").unwrap().index, 1);
        assert_eq!(table.lookup("d").unwrap().index, 2);
        assert_eq!(table.count(SymbolKind::Field), 3);
        assert_eq!(table.count(SymbolKind::Static), 1);
        assert_eq!(table.count(SymbolKind::Local), 0);
        assert_eq!(table.lookup("c").unwrap().ty, "Point");
    }

    #[test]
    fn test_redefinition_rejected() {
        let mut table = SymbolTable::default();
        table.define("x", "int", SymbolKind::Local).unwrap();
        assert_eq!(
            table.define("x", "char", SymbolKind::Arg),
            Err(DefineError::Exists("x".into()))
        );
        // Failed definitions don't consume an index.
        assert_eq!(table.count(SymbolKind::Arg), 0);
        assert_eq!(table.lookup("x").unwrap().ty, "int");
    }

    #[test]
    fn test_full_kind_rejected() {
        let mut table = SymbolTable::default();
        table.counts[SymbolKind::Local.slot()] = u16::MAX - 1;

        assert_eq!(table.define("last", "int", SymbolKind::Local).unwrap().index, u16::MAX - 1);
        assert_eq!(
            table.define("over", "int", SymbolKind::Local),
            Err(DefineError::Full(SymbolKind::Local))
        );
        assert_eq!(table.count(SymbolKind::Local), u16::MAX);
        assert!(!table.contains("over"));

        // Other kinds keep their own counters.
        assert_eq!(table.define("a", "int", SymbolKind::Arg).unwrap().index, 0);
    }

    #[test]
    fn test_reset() {
        let mut table = SymbolTable::default();
        table.define("x", "int", SymbolKind::Local).unwrap();
        table.reset();
        assert!(table.is_empty());
        assert!(!table.contains("x"));
        assert_eq!(table.count(SymbolKind::Local), 0);
        assert_eq!(table.define("y", "int", SymbolKind::Local).unwrap().index, 0);
    }

    #[test]
    fn test_segments() {
        assert_eq!(SymbolKind::Static.segment(), Segment::Static);
        assert_eq!(SymbolKind::Field.segment(), Segment::This);
        assert_eq!(SymbolKind::Arg.segment(), Segment::Argument);
        assert_eq!(SymbolKind::Local.segment(), Segment::Local);
    }

    #[test]
    fn test_scopes_shadowing() {
        let mut scopes = Scopes::new();
        scopes.define("x", "int", SymbolKind::Field).unwrap();
        scopes.define("y", "int", SymbolKind::Static).unwrap();

        scopes.enter_subroutine();
        scopes.define("x", "char", SymbolKind::Local).unwrap();

        let x = scopes.lookup("x").unwrap();
        assert_eq!(x.kind, SymbolKind::Local);
        assert_eq!(x.ty, "char");
        assert_eq!(scopes.lookup("y").unwrap().kind, SymbolKind::Static);
        assert!(scopes.lookup("z").is_none());
    }

    #[test]
    fn test_scopes_enter_subroutine_resets() {
        let mut scopes = Scopes::new();
        scopes.define("f", "int", SymbolKind::Field).unwrap();

        scopes.enter_subroutine();
        scopes.define("a", "int", SymbolKind::Arg).unwrap();
        scopes.define("l", "int", SymbolKind::Local).unwrap();
        assert_eq!(scopes.count(SymbolKind::Local), 1);

        let table = scopes.enter_subroutine();
        assert!(table.is_empty());
        assert!(scopes.lookup("a").is_none());
        assert_eq!(scopes.count(SymbolKind::Arg), 0);
        // Class scope survives.
        assert_eq!(scopes.count(SymbolKind::Field), 1);
        assert!(scopes.lookup("f").is_some());
    }
}
