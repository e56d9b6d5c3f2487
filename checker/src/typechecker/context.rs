/**
Typing context for Quill

Maintains the scoped variable bindings, global function signatures, the
enabled-extension set, and the declared exception payload type for one
type-check run. A context is created per run and discarded afterwards.
*/
use crate::ast::types::Type;
use std::collections::{HashMap, HashSet};
use std::fmt;

/// A named opt-in language feature; each typing rule for a gated form
/// checks membership in the enabled set before applying its rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Extension {
    Records,
    Tuples,
    Lists,
    SumTypes,
    Variants,
    References,
    Exceptions,
    ExceptionTypeDeclaration,
    Panic,
    FixpointCombinator,
    Sequencing,
    LetBindings,
    TypeAscriptions,
    TypeCast,
    StructuralSubtyping,
}

impl Extension {
    /// Map a declared extension name to a flag. Names may carry a leading
    /// `#`; `pairs` is an alias for the tuples flag. Unknown names yield
    /// `None` so registration can skip parser-level extensions the checker
    /// does not gate on.
    pub fn from_name(name: &str) -> Option<Extension> {
        let name = name.strip_prefix('#').unwrap_or(name);
        match name {
            "records" => Some(Extension::Records),
            "tuples" | "pairs" => Some(Extension::Tuples),
            "lists" => Some(Extension::Lists),
            "sum-types" => Some(Extension::SumTypes),
            "variants" => Some(Extension::Variants),
            "references" => Some(Extension::References),
            "exceptions" => Some(Extension::Exceptions),
            "exception-type-declaration" => Some(Extension::ExceptionTypeDeclaration),
            "panic" => Some(Extension::Panic),
            "fixpoint-combinator" => Some(Extension::FixpointCombinator),
            "sequencing" => Some(Extension::Sequencing),
            "let-bindings" => Some(Extension::LetBindings),
            "type-ascriptions" => Some(Extension::TypeAscriptions),
            "type-cast" => Some(Extension::TypeCast),
            "structural-subtyping" => Some(Extension::StructuralSubtyping),
            _ => None,
        }
    }

    /// The canonical source-level name of the flag
    pub fn name(&self) -> &'static str {
        match self {
            Extension::Records => "records",
            Extension::Tuples => "tuples",
            Extension::Lists => "lists",
            Extension::SumTypes => "sum-types",
            Extension::Variants => "variants",
            Extension::References => "references",
            Extension::Exceptions => "exceptions",
            Extension::ExceptionTypeDeclaration => "exception-type-declaration",
            Extension::Panic => "panic",
            Extension::FixpointCombinator => "fixpoint-combinator",
            Extension::Sequencing => "sequencing",
            Extension::LetBindings => "let-bindings",
            Extension::TypeAscriptions => "type-ascriptions",
            Extension::TypeCast => "type-cast",
            Extension::StructuralSubtyping => "structural-subtyping",
        }
    }
}

impl fmt::Display for Extension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// The mutable environment threaded through one check
///
/// Contains:
/// - A stack of variable scopes (innermost last, lookup walks outward)
/// - Global function signatures, populated before any body is checked
/// - The enabled-extension set
/// - The globally declared exception payload type, if any
#[derive(Debug, Clone)]
pub struct Context {
    scopes: Vec<HashMap<String, Type>>,
    functions: HashMap<String, Type>,
    extensions: HashSet<Extension>,
    exception_type: Option<Type>,
    has_main: bool,
}

impl Context {
    /// Create a new context with the built-in functions registered
    pub fn new() -> Self {
        let mut ctx = Context {
            scopes: vec![HashMap::new()],
            functions: HashMap::new(),
            extensions: HashSet::new(),
            exception_type: None,
            has_main: false,
        };

        // Nat::iszero is the one built-in with a monomorphic signature;
        // the polymorphic built-ins only resolve at application sites.
        ctx.add_function("Nat::iszero", Type::fun(Type::Nat, Type::Bool));

        ctx
    }

    /// Open a fresh innermost scope
    pub fn push_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    /// Close the innermost scope; the outermost scope is never popped
    pub fn pop_scope(&mut self) {
        if self.scopes.len() > 1 {
            self.scopes.pop();
        }
    }

    /// Bind a variable in the innermost scope, shadowing outer bindings
    pub fn add_variable(&mut self, name: impl Into<String>, ty: Type) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.into(), ty);
        }
    }

    /// Look up a variable, innermost scope first
    pub fn lookup_variable(&self, name: &str) -> Option<&Type> {
        self.scopes.iter().rev().find_map(|scope| scope.get(name))
    }

    /// Register a global function signature
    pub fn add_function(&mut self, name: impl Into<String>, ty: Type) {
        let name = name.into();
        if name == "main" {
            self.has_main = true;
        }
        self.functions.insert(name, ty);
    }

    /// Look up a global function signature
    pub fn lookup_function(&self, name: &str) -> Option<&Type> {
        self.functions.get(name)
    }

    /// Whether a function literally named `main` has been registered
    pub fn has_main(&self) -> bool {
        self.has_main
    }

    /// Enable a single extension flag
    pub fn enable_extension(&mut self, ext: Extension) {
        self.extensions.insert(ext);
    }

    /// Enable an extension by its declared name; returns false for names
    /// the checker does not recognize (those are ignored)
    pub fn enable_extension_by_name(&mut self, name: &str) -> bool {
        match Extension::from_name(name) {
            Some(ext) => {
                self.extensions.insert(ext);
                true
            }
            None => false,
        }
    }

    pub fn has_extension(&self, ext: Extension) -> bool {
        self.extensions.contains(&ext)
    }

    /// Declare the global exception payload type
    pub fn set_exception_type(&mut self, ty: Type) {
        self.exception_type = Some(ty);
    }

    pub fn exception_type(&self) -> Option<&Type> {
        self.exception_type.as_ref()
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}
