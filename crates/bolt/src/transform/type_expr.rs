//! Puppet data type expressions as they appear in task metadata.
//!
//! The grammar boltdesk cares about is small:
//!
//! ```text
//! expr    := name ( '[' expr ( ',' expr )* ']' )?
//!          | 'string' | "string" | /regex/ | number | { ... }
//! ```
//!
//! Expressions that do not parse fall back to prefix matching, which is what
//! older dashboards did and what existing task metadata was written against.

use boltdesk_core::ParameterType;
use once_cell::sync::Lazy;
use regex::Regex;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeExpr {
    /// `Name` or `Name[args...]`
    Named { name: String, args: Vec<TypeExpr> },
    /// A quoted string, regex, number or hash literal, kept as written
    /// (without quotes for strings)
    Literal(String),
}

/// What a type expression says about a parameter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeInfo {
    pub param_type: ParameterType,
    pub required: bool,
    pub enum_values: Option<Vec<String>>,
}

impl Default for TypeInfo {
    fn default() -> Self {
        Self {
            param_type: ParameterType::String,
            required: true,
            enum_values: None,
        }
    }
}

impl TypeExpr {
    /// Parse a complete expression; trailing input is an error
    pub fn parse(input: &str) -> Option<TypeExpr> {
        let mut parser = Parser {
            chars: input.chars().collect(),
            pos: 0,
        };
        let expr = parser.expr()?;
        parser.skip_ws();
        parser.at_end().then_some(expr)
    }

    fn name(&self) -> Option<&str> {
        match self {
            TypeExpr::Named { name, .. } => Some(name),
            TypeExpr::Literal(_) => None,
        }
    }

    fn args(&self) -> &[TypeExpr] {
        match self {
            TypeExpr::Named { args, .. } => args,
            TypeExpr::Literal(_) => &[],
        }
    }

    /// Text of an enum member: literals as written, bare names as names
    fn as_enum_value(&self) -> String {
        match self {
            TypeExpr::Named { name, .. } => name.clone(),
            TypeExpr::Literal(text) => text.clone(),
        }
    }

    pub fn infer(&self) -> TypeInfo {
        let args = self.args();
        match self.name().unwrap_or_default() {
            "Optional" => TypeInfo {
                required: false,
                ..args.first().map(TypeExpr::infer).unwrap_or_default()
            },
            "NotUndef" => TypeInfo {
                required: true,
                ..args.first().map(TypeExpr::infer).unwrap_or_default()
            },
            "Enum" => TypeInfo {
                enum_values: Some(args.iter().map(TypeExpr::as_enum_value).collect()),
                ..TypeInfo::default()
            },
            "Variant" => {
                let optional = args.iter().any(|a| a.name() == Some("Undef"));
                let inner = args
                    .iter()
                    .find(|a| a.name() != Some("Undef"))
                    .map(TypeExpr::infer)
                    .unwrap_or_default();
                TypeInfo {
                    required: inner.required && !optional,
                    ..inner
                }
            }
            name => TypeInfo {
                param_type: base_type(name),
                ..TypeInfo::default()
            },
        }
    }
}

fn base_type(name: &str) -> ParameterType {
    match name {
        "Integer" | "Float" | "Numeric" => ParameterType::Integer,
        "Boolean" => ParameterType::Boolean,
        "Array" | "Tuple" => ParameterType::Array,
        "Hash" | "Struct" => ParameterType::Hash,
        _ => ParameterType::String,
    }
}

/// Infer type, requiredness and enum values from a type expression
pub fn infer(expr: &str) -> TypeInfo {
    match TypeExpr::parse(expr) {
        Some(parsed) => parsed.infer(),
        None => infer_by_prefix(expr),
    }
}

static ENUM_ARGS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Enum\[(.*?)\]").expect("enum regex must compile"));

fn infer_by_prefix(expr: &str) -> TypeInfo {
    let expr = expr.trim();
    let (required, inner) = match expr.strip_prefix("Optional[") {
        Some(rest) => (false, rest),
        None => (true, expr),
    };

    if let Some(caps) = ENUM_ARGS.captures(inner) {
        let values = caps[1]
            .split(',')
            .map(|v| v.trim().trim_matches(['\'', '"']).to_string())
            .filter(|v| !v.is_empty())
            .collect();
        return TypeInfo {
            param_type: ParameterType::String,
            required,
            enum_values: Some(values),
        };
    }

    let name: String = inner
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric() || *c == '_')
        .collect();
    TypeInfo {
        param_type: base_type(&name),
        required,
        enum_values: None,
    }
}

struct Parser {
    chars: Vec<char>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        Some(c)
    }

    fn at_end(&self) -> bool {
        self.pos >= self.chars.len()
    }

    fn skip_ws(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
    }

    fn expr(&mut self) -> Option<TypeExpr> {
        self.skip_ws();
        match self.peek()? {
            quote @ ('\'' | '"') => self.quoted(quote),
            '/' => self.regex(),
            '{' => self.balanced('{', '}'),
            c if is_name_char(c) => self.named(),
            _ => None,
        }
    }

    fn named(&mut self) -> Option<TypeExpr> {
        let start = self.pos;
        while self.peek().is_some_and(is_name_char) {
            self.pos += 1;
        }
        let name: String = self.chars[start..self.pos].iter().collect();

        self.skip_ws();
        let mut args = Vec::new();
        if self.peek() == Some('[') {
            self.bump();
            self.skip_ws();
            if self.peek() == Some(']') {
                self.bump();
            } else {
                loop {
                    args.push(self.expr()?);
                    self.skip_ws();
                    match self.bump()? {
                        ',' => continue,
                        ']' => break,
                        _ => return None,
                    }
                }
            }
        }

        // Numbers such as the bounds in `Integer[0, 10]` are literals
        if name.starts_with(|c: char| c.is_ascii_digit() || c == '-') {
            return args.is_empty().then_some(TypeExpr::Literal(name));
        }
        Some(TypeExpr::Named { name, args })
    }

    fn quoted(&mut self, quote: char) -> Option<TypeExpr> {
        self.bump();
        let mut text = String::new();
        loop {
            match self.bump()? {
                '\\' => text.push(self.bump()?),
                c if c == quote => return Some(TypeExpr::Literal(text)),
                c => text.push(c),
            }
        }
    }

    fn regex(&mut self) -> Option<TypeExpr> {
        let start = self.pos;
        self.bump();
        loop {
            match self.bump()? {
                '\\' => {
                    self.bump()?;
                }
                '/' => break,
                _ => {}
            }
        }
        Some(TypeExpr::Literal(self.chars[start..self.pos].iter().collect()))
    }

    /// A `{ ... }` hash literal, kept verbatim
    fn balanced(&mut self, open: char, close: char) -> Option<TypeExpr> {
        let start = self.pos;
        let mut depth = 0usize;
        let mut quote: Option<char> = None;
        loop {
            let c = self.bump()?;
            match quote {
                Some(q) if c == q => quote = None,
                Some(_) => {}
                None if c == '\'' || c == '"' => quote = Some(c),
                None if c == open => depth += 1,
                None if c == close => {
                    depth -= 1;
                    if depth == 0 {
                        break;
                    }
                }
                None => {}
            }
        }
        Some(TypeExpr::Literal(self.chars[start..self.pos].iter().collect()))
    }
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | ':' | '-' | '.')
}
