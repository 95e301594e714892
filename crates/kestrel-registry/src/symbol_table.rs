//! Stack-of-scopes symbol table.
//!
//! One table instance serves one namespace of one class: the field tables
//! bind names to type names, the method tables bind names to signatures.
//! Scopes nest with strict stack discipline; for a class, the outer scopes
//! hold the (already-populated) declarations of each ancestor and the
//! innermost scope holds the class's own declarations, so the level at which
//! a name resolves distinguishes a same-class redefinition from an override
//! of an inherited member.

use rustc_hash::FxHashMap;

/// A stack of scopes mapping names to bindings, innermost last.
#[derive(Debug, Clone, Default)]
pub struct SymbolTable<T> {
    scopes: Vec<FxHashMap<String, T>>,
}

impl<T> SymbolTable<T> {
    pub fn new() -> Self {
        Self { scopes: Vec::new() }
    }

    /// Push a fresh innermost scope.
    pub fn enter_scope(&mut self) {
        self.scopes.push(FxHashMap::default());
    }

    /// Pop the innermost scope. Calls must pair with [`enter_scope`].
    ///
    /// [`enter_scope`]: SymbolTable::enter_scope
    pub fn exit_scope(&mut self) {
        assert!(
            self.scopes.pop().is_some(),
            "exit_scope without matching enter_scope"
        );
    }

    /// Bind `name` in the current (innermost) scope.
    pub fn add(&mut self, name: impl Into<String>, binding: T) {
        let scope = self
            .scopes
            .last_mut()
            .expect("add called with no open scope");
        scope.insert(name.into(), binding);
    }

    /// Resolve `name` in the current scope only.
    pub fn peek(&self, name: &str) -> Option<&T> {
        self.scopes.last().and_then(|scope| scope.get(name))
    }

    /// Resolve `name` from innermost to outermost, first match wins.
    pub fn lookup(&self, name: &str) -> Option<&T> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.get(name))
    }

    /// The level (1 = outermost) at which [`lookup`] would resolve `name`.
    ///
    /// [`lookup`]: SymbolTable::lookup
    pub fn scope_level(&self, name: &str) -> Option<usize> {
        self.scopes
            .iter()
            .rposition(|scope| scope.contains_key(name))
            .map(|index| index + 1)
    }

    /// The level of the current scope (1 = outermost, 0 = no open scope).
    pub fn current_level(&self) -> usize {
        self.scopes.len()
    }

    /// Number of bindings in the current scope.
    pub fn current_size(&self) -> usize {
        self.scopes.last().map_or(0, FxHashMap::len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table_with_one_scope() -> SymbolTable<String> {
        let mut table = SymbolTable::new();
        table.enter_scope();
        table
    }

    #[test]
    fn add_and_peek_current_scope() {
        let mut table = table_with_one_scope();
        table.add("x", "int".to_string());
        assert_eq!(table.peek("x"), Some(&"int".to_string()));
        assert_eq!(table.peek("y"), None);
    }

    #[test]
    fn peek_does_not_see_outer_scopes() {
        let mut table = table_with_one_scope();
        table.add("x", "int".to_string());
        table.enter_scope();
        assert_eq!(table.peek("x"), None);
        assert_eq!(table.lookup("x"), Some(&"int".to_string()));
    }

    #[test]
    fn lookup_prefers_innermost() {
        let mut table = table_with_one_scope();
        table.add("x", "int".to_string());
        table.enter_scope();
        table.add("x", "boolean".to_string());
        assert_eq!(table.lookup("x"), Some(&"boolean".to_string()));
        table.exit_scope();
        assert_eq!(table.lookup("x"), Some(&"int".to_string()));
    }

    #[test]
    fn scope_level_distinguishes_inherited_from_own() {
        let mut table = table_with_one_scope();
        table.add("foo", "inherited".to_string());
        table.enter_scope();

        // Resolves one level below the current scope: inherited.
        assert_eq!(table.scope_level("foo"), Some(1));
        assert_eq!(table.current_level(), 2);

        table.add("foo", "own".to_string());
        assert_eq!(table.scope_level("foo"), Some(2));
        assert_eq!(table.scope_level("absent"), None);
    }

    #[test]
    fn current_size_counts_innermost_only() {
        let mut table = table_with_one_scope();
        table.add("a", "int".to_string());
        table.add("b", "int".to_string());
        table.enter_scope();
        assert_eq!(table.current_size(), 0);
        table.add("c", "int".to_string());
        assert_eq!(table.current_size(), 1);
    }

    #[test]
    #[should_panic(expected = "exit_scope without matching enter_scope")]
    fn unbalanced_exit_panics() {
        let mut table: SymbolTable<String> = SymbolTable::new();
        table.exit_scope();
    }
}
