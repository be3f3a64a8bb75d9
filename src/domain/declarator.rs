//! Declarator name resolution.
//!
//! A function definition's name sits behind a chain of declarator wrappers:
//! pointer/reference return adornments, parentheses and the
//! parameter-list wrapper itself. [`resolve_function_name`] unwraps that
//! chain down to the canonical name used as a graph node key.
//!
//! The walk only needs a read-only view of the tree, expressed by
//! [`SyntaxView`], so it can run over tree-sitter nodes or any other
//! tree with typed nodes and named fields.

use tracing::debug;

/// Upper bound on declarator hops before resolution gives up.
pub const MAX_DECLARATOR_DEPTH: usize = 64;

/// Borrowed, read-only view of a syntax node.
pub trait SyntaxView: Clone {
    /// Node type tag, e.g. `"function_declarator"`.
    fn kind(&self) -> &str;

    /// Child stored under a named field, if present.
    fn field(&self, name: &str) -> Option<Self>;

    /// Literal source text covered by the node. `None` when it is not
    /// valid UTF-8.
    fn text(&self) -> Option<&str>;

    /// Last named child, used where a grammar nests a declarator without
    /// labelling it (`reference_declarator`, `parenthesized_declarator`).
    fn last_named_child(&self) -> Option<Self>;
}

/// Declarator node kinds the resolver distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclaratorKind {
    Identifier,
    FunctionDeclarator,
    ParenthesizedDeclarator,
    PointerDeclarator,
    ReferenceDeclarator,
    FieldIdentifier,
    QualifiedIdentifier,
    Other,
}

impl DeclaratorKind {
    pub fn of(kind: &str) -> Self {
        match kind {
            "identifier" => DeclaratorKind::Identifier,
            "function_declarator" => DeclaratorKind::FunctionDeclarator,
            "parenthesized_declarator" => DeclaratorKind::ParenthesizedDeclarator,
            "pointer_declarator" => DeclaratorKind::PointerDeclarator,
            "reference_declarator" => DeclaratorKind::ReferenceDeclarator,
            "field_identifier" => DeclaratorKind::FieldIdentifier,
            "qualified_identifier" => DeclaratorKind::QualifiedIdentifier,
            _ => DeclaratorKind::Other,
        }
    }

    /// Wrappers whose own `declarator` field leads further down the chain.
    fn is_wrapper(self) -> bool {
        matches!(
            self,
            DeclaratorKind::FunctionDeclarator
                | DeclaratorKind::ParenthesizedDeclarator
                | DeclaratorKind::PointerDeclarator
                | DeclaratorKind::ReferenceDeclarator
        )
    }
}

/// Resolve the canonical name of a `function_definition` node.
///
/// Returns `None` when the definition has no resolvable name; such
/// definitions contribute no call record.
pub fn resolve_function_name<N: SyntaxView>(definition: &N) -> Option<String> {
    let declarator = definition.field("declarator")?;
    let mut current = declarator.clone();

    for _ in 0..MAX_DECLARATOR_DEPTH {
        let kind = DeclaratorKind::of(current.kind());
        match kind {
            DeclaratorKind::Identifier | DeclaratorKind::FieldIdentifier => {
                return current.text().map(str::to_string);
            }
            k if k.is_wrapper() => match inner_declarator(&current, k) {
                Some(inner) => current = inner,
                None => return qualified_name(&declarator),
            },
            _ => return qualified_name(&declarator),
        }
    }

    debug!(
        limit = MAX_DECLARATOR_DEPTH,
        "declarator chain exceeded hop limit, leaving definition unnamed"
    );
    None
}

fn inner_declarator<N: SyntaxView>(node: &N, kind: DeclaratorKind) -> Option<N> {
    match node.field("declarator") {
        Some(inner) => Some(inner),
        None if matches!(
            kind,
            DeclaratorKind::ReferenceDeclarator | DeclaratorKind::ParenthesizedDeclarator
        ) =>
        {
            node.last_named_child()
        }
        None => None,
    }
}

/// `Namespace::Class::method(...)`: the top-level declarator is the
/// parameter-list wrapper and its inner declarator is qualified. The
/// qualified text is kept verbatim.
fn qualified_name<N: SyntaxView>(declarator: &N) -> Option<String> {
    if DeclaratorKind::of(declarator.kind()) != DeclaratorKind::FunctionDeclarator {
        return None;
    }
    let inner = declarator.field("declarator")?;
    if DeclaratorKind::of(inner.kind()) == DeclaratorKind::QualifiedIdentifier {
        inner.text().map(str::to_string)
    } else {
        None
    }
}
