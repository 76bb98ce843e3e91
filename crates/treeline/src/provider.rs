use serde::{Deserialize, Serialize};

use crate::expr::{Expr, LambdaParam, MatchArm, Pattern};
use crate::id::IdAllocator;

/// Coarse value types, used for placeholder labels and for re-binding
/// arguments by name+type when a partial commits onto a different target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParamType {
    Int,
    Float,
    Str,
    Bool,
    Null,
    List,
    Record,
    Block,
    Any,
}

impl ParamType {
    pub fn label(self) -> &'static str {
        match self {
            ParamType::Int => "Int",
            ParamType::Float => "Float",
            ParamType::Str => "String",
            ParamType::Bool => "Bool",
            ParamType::Null => "Null",
            ParamType::List => "List",
            ParamType::Record => "Record",
            ParamType::Block => "Block",
            ParamType::Any => "Any",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub name: String,
    pub typ: ParamType,
    /// For `Block` parameters: the argument names the block's lambda should
    /// be pre-filled with.
    pub block_args: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Signature {
    pub name: String,
    pub params: Vec<Parameter>,
    pub return_type: ParamType,
}

/// Function-signature lookup, consumed for placeholder labels and for
/// partial-commit argument realignment. The editor core never defines
/// functions itself.
pub trait SignatureLookup {
    fn signature(&self, name: &str) -> Option<&Signature>;

    fn params_of(&self, name: &str) -> Option<&[Parameter]> {
        self.signature(name).map(|sig| sig.params.as_slice())
    }
}

/// Builtin signature table. The production lookup lives outside this crate;
/// this one backs tests and is a workable default.
#[derive(Debug, Clone)]
pub struct StaticSignatures {
    signatures: Vec<Signature>,
}

const BUILTIN_FUNCTIONS: &[(&str, &[(&str, ParamType)], ParamType)] = &[
    ("Int::add", &[("a", ParamType::Int), ("b", ParamType::Int)], ParamType::Int),
    ("Int::subtract", &[("a", ParamType::Int), ("b", ParamType::Int)], ParamType::Int),
    ("Int::multiply", &[("a", ParamType::Int), ("b", ParamType::Int)], ParamType::Int),
    ("Int::divide", &[("a", ParamType::Int), ("b", ParamType::Int)], ParamType::Int),
    ("Float::add", &[("a", ParamType::Float), ("b", ParamType::Float)], ParamType::Float),
    ("List::head", &[("list", ParamType::List)], ParamType::Any),
    ("List::tail", &[("list", ParamType::List)], ParamType::List),
    ("List::length", &[("list", ParamType::List)], ParamType::Int),
    ("List::append", &[("list", ParamType::List), ("item", ParamType::Any)], ParamType::List),
    ("List::map", &[("list", ParamType::List), ("f", ParamType::Block)], ParamType::List),
    ("List::filter", &[("list", ParamType::List), ("f", ParamType::Block)], ParamType::List),
    ("String::length", &[("s", ParamType::Str)], ParamType::Int),
    ("String::append", &[("a", ParamType::Str), ("b", ParamType::Str)], ParamType::Str),
    ("String::contains", &[("haystack", ParamType::Str), ("needle", ParamType::Str)], ParamType::Bool),
];

/// Binary operators share the signature table so placeholder labels and
/// commit realignment treat them like two-argument calls.
const BUILTIN_OPERATORS: &[(&str, ParamType, ParamType)] = &[
    ("+", ParamType::Int, ParamType::Int),
    ("-", ParamType::Int, ParamType::Int),
    ("*", ParamType::Int, ParamType::Int),
    ("/", ParamType::Float, ParamType::Float),
    ("==", ParamType::Any, ParamType::Bool),
    ("!=", ParamType::Any, ParamType::Bool),
    ("<", ParamType::Int, ParamType::Bool),
    (">", ParamType::Int, ParamType::Bool),
    ("<=", ParamType::Int, ParamType::Bool),
    (">=", ParamType::Int, ParamType::Bool),
    ("&&", ParamType::Bool, ParamType::Bool),
    ("||", ParamType::Bool, ParamType::Bool),
    ("++", ParamType::Str, ParamType::Str),
];

/// Names the lambda is pre-filled with when a block argument's declared
/// names are unknown.
pub const DEFAULT_BLOCK_ARGS: &[&str] = &["item"];

impl StaticSignatures {
    pub fn builtin() -> Self {
        let mut signatures = Vec::new();
        for (name, params, ret) in BUILTIN_FUNCTIONS {
            signatures.push(Signature {
                name: (*name).to_string(),
                params: params
                    .iter()
                    .map(|(pname, typ)| Parameter {
                        name: (*pname).to_string(),
                        typ: *typ,
                        block_args: if *typ == ParamType::Block {
                            DEFAULT_BLOCK_ARGS.iter().map(|a| (*a).to_string()).collect()
                        } else {
                            Vec::new()
                        },
                    })
                    .collect(),
                return_type: *ret,
            });
        }
        for (op, operand, ret) in BUILTIN_OPERATORS {
            signatures.push(Signature {
                name: (*op).to_string(),
                params: vec![
                    Parameter {
                        name: "a".to_string(),
                        typ: *operand,
                        block_args: Vec::new(),
                    },
                    Parameter {
                        name: "b".to_string(),
                        typ: *operand,
                        block_args: Vec::new(),
                    },
                ],
                return_type: *ret,
            });
        }
        Self { signatures }
    }

    pub fn with(signatures: Vec<Signature>) -> Self {
        Self { signatures }
    }
}

impl SignatureLookup for StaticSignatures {
    fn signature(&self, name: &str) -> Option<&Signature> {
        self.signatures.iter().find(|sig| sig.name == name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SuggestionKind {
    Function,
    Constructor { arity: usize },
    Keyword,
    Variable,
    Literal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Suggestion {
    pub name: String,
    pub kind: SuggestionKind,
}

/// What the engine knows about the caret when it asks for completions.
#[derive(Debug, Clone)]
pub struct QueryContext {
    pub query: String,
    pub is_field_access: bool,
    pub in_pipeline: bool,
}

/// Ranked-completion provider. The engine owns highlight movement and commit
/// triggering; it never ranks or filters candidates itself.
pub trait SuggestionProvider {
    fn suggestions(&self, ctx: &QueryContext) -> Vec<Suggestion>;

    /// Realize a suggestion as an expression, returning the caret offset
    /// within that expression's rendering.
    fn to_expression(&self, suggestion: &Suggestion, ids: &mut IdAllocator) -> (Expr, usize);
}

const KEYWORD_SUGGESTIONS: &[&str] = &["let", "if", "match"];
const CONSTRUCTOR_SUGGESTIONS: &[(&str, usize)] =
    &[("Some", 1), ("None", 0), ("Ok", 1), ("Err", 1)];
const LITERAL_SUGGESTIONS: &[&str] = &["true", "false", "null"];

/// Deterministic provider over the builtin table, for tests and tooling.
#[derive(Debug, Clone)]
pub struct StaticSuggestions {
    signatures: StaticSignatures,
}

impl StaticSuggestions {
    pub fn builtin() -> Self {
        Self {
            signatures: StaticSignatures::builtin(),
        }
    }

    pub fn signatures(&self) -> &StaticSignatures {
        &self.signatures
    }

    fn candidates(&self) -> Vec<Suggestion> {
        let mut out = Vec::new();
        for sig in &self.signatures.signatures {
            // Operators enter through triggers, not through the overlay.
            if sig.name.chars().any(|c| c.is_ascii_alphanumeric()) {
                out.push(Suggestion {
                    name: sig.name.clone(),
                    kind: SuggestionKind::Function,
                });
            }
        }
        for (name, arity) in CONSTRUCTOR_SUGGESTIONS {
            out.push(Suggestion {
                name: (*name).to_string(),
                kind: SuggestionKind::Constructor { arity: *arity },
            });
        }
        for name in KEYWORD_SUGGESTIONS {
            out.push(Suggestion {
                name: (*name).to_string(),
                kind: SuggestionKind::Keyword,
            });
        }
        for name in LITERAL_SUGGESTIONS {
            out.push(Suggestion {
                name: (*name).to_string(),
                kind: SuggestionKind::Literal,
            });
        }
        out
    }
}

impl SuggestionProvider for StaticSuggestions {
    fn suggestions(&self, ctx: &QueryContext) -> Vec<Suggestion> {
        if ctx.is_field_access {
            return Vec::new();
        }
        let query = ctx.query.to_lowercase();
        let all = self.candidates();
        if query.is_empty() {
            return all;
        }
        let mut prefix = Vec::new();
        let mut substring = Vec::new();
        for candidate in all {
            let lowered = candidate.name.to_lowercase();
            if lowered.starts_with(&query) {
                prefix.push(candidate);
            } else if lowered.contains(&query) {
                substring.push(candidate);
            }
        }
        prefix.extend(substring);
        prefix
    }

    fn to_expression(&self, suggestion: &Suggestion, ids: &mut IdAllocator) -> (Expr, usize) {
        let name_len = suggestion.name.chars().count();
        match &suggestion.kind {
            SuggestionKind::Function => {
                let params = self
                    .signatures
                    .params_of(&suggestion.name)
                    .map(<[Parameter]>::to_vec)
                    .unwrap_or_default();
                let args: Vec<Expr> = params
                    .iter()
                    .map(|param| {
                        if param.typ == ParamType::Block {
                            Expr::Lambda {
                                id: ids.mint(),
                                params: param
                                    .block_args
                                    .iter()
                                    .map(|arg| LambdaParam {
                                        id: ids.mint(),
                                        name: arg.clone(),
                                    })
                                    .collect(),
                                body: Box::new(Expr::Blank { id: ids.mint() }),
                            }
                        } else {
                            Expr::Blank { id: ids.mint() }
                        }
                    })
                    .collect();
                let caret = if args.is_empty() { name_len } else { name_len + 1 };
                (
                    Expr::FnCall {
                        id: ids.mint(),
                        name: suggestion.name.clone(),
                        args,
                        on_rail: false,
                    },
                    caret,
                )
            }
            SuggestionKind::Constructor { arity } => {
                let args: Vec<Expr> = (0..*arity)
                    .map(|_| Expr::Blank { id: ids.mint() })
                    .collect();
                let caret = if args.is_empty() { name_len } else { name_len + 1 };
                (
                    Expr::Constructor {
                        id: ids.mint(),
                        name: suggestion.name.clone(),
                        args,
                    },
                    caret,
                )
            }
            SuggestionKind::Keyword => match suggestion.name.as_str() {
                "let" => (
                    Expr::Let {
                        id: ids.mint(),
                        lhs_id: ids.mint(),
                        lhs: String::new(),
                        rhs: Box::new(Expr::Blank { id: ids.mint() }),
                        body: Box::new(Expr::Blank { id: ids.mint() }),
                    },
                    "let ".chars().count(),
                ),
                "if" => (
                    Expr::If {
                        id: ids.mint(),
                        cond: Box::new(Expr::Blank { id: ids.mint() }),
                        then_branch: Box::new(Expr::Blank { id: ids.mint() }),
                        else_branch: Box::new(Expr::Blank { id: ids.mint() }),
                    },
                    "if ".chars().count(),
                ),
                "match" => {
                    let match_id = ids.mint();
                    (
                        Expr::Match {
                            id: match_id,
                            subject: Box::new(Expr::Blank { id: ids.mint() }),
                            arms: vec![MatchArm {
                                pattern: Pattern::Blank {
                                    match_id,
                                    id: ids.mint(),
                                },
                                body: Expr::Blank { id: ids.mint() },
                            }],
                        },
                        "match ".chars().count(),
                    )
                }
                other => (
                    Expr::Variable {
                        id: ids.mint(),
                        name: other.to_string(),
                    },
                    name_len,
                ),
            },
            SuggestionKind::Variable => (
                Expr::Variable {
                    id: ids.mint(),
                    name: suggestion.name.clone(),
                },
                name_len,
            ),
            SuggestionKind::Literal => {
                let expr = match suggestion.name.as_str() {
                    "true" => Expr::BoolLiteral {
                        id: ids.mint(),
                        value: true,
                    },
                    "false" => Expr::BoolLiteral {
                        id: ids.mint(),
                        value: false,
                    },
                    _ => Expr::NullLiteral { id: ids.mint() },
                };
                (expr, name_len)
            }
        }
    }
}
