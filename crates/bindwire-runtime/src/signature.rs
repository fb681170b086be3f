//! Signature grammar
//!
//! The source scanner describes each exported function as one line:
//!
//! ```text
//! python_bind_list1::type(WireList<String>);type(&mut i64);type(WireList<String>)
//! ```
//!
//! Every `type(...)` segment but the last is a parameter; the last one is the
//! return type. A function without parameters may drop the `::`.
//!
//! Inside a segment:
//!
//! ```text
//! decl      := access? base
//! access    := "&mut" | "&" | "*mut" | "*const"
//! base      := name | name "<" decl_list ">" | "(" decl_list? ")" | name "(" decl_list? ")"
//! decl_list := decl ("," decl)*
//! ```
//!
//! Names resolve through a closed table. Bare `WireTuple`/`WireDict` and
//! pointer-sized integers stay `Opaque` until the host attaches a hint.

use crate::error::{BindError, BindResult};
use crate::keys::{self, HashableKind};
use std::fmt;

/// Declared width of an integer slot
///
/// Host integers are always `i64`; the width decides the ABI type and the
/// range a host value must fit in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntWidth {
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
}

impl IntWidth {
    pub fn name(self) -> &'static str {
        match self {
            IntWidth::I8 => "i8",
            IntWidth::I16 => "i16",
            IntWidth::I32 => "i32",
            IntWidth::I64 => "i64",
            IntWidth::U8 => "u8",
            IntWidth::U16 => "u16",
            IntWidth::U32 => "u32",
            IntWidth::U64 => "u64",
        }
    }

    /// Width of a C integer type on this platform
    fn of_c<T>(signed: bool) -> Self {
        match (std::mem::size_of::<T>(), signed) {
            (1, true) => IntWidth::I8,
            (2, true) => IntWidth::I16,
            (4, true) => IntWidth::I32,
            (_, true) => IntWidth::I64,
            (1, false) => IntWidth::U8,
            (2, false) => IntWidth::U16,
            (4, false) => IntWidth::U32,
            (_, false) => IntWidth::U64,
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        use std::os::raw;
        Some(match name {
            "i8" | "c_schar" => IntWidth::I8,
            "i16" => IntWidth::I16,
            "i32" => IntWidth::I32,
            "i64" => IntWidth::I64,
            "u8" | "c_uchar" => IntWidth::U8,
            "u16" => IntWidth::U16,
            "u32" => IntWidth::U32,
            "u64" => IntWidth::U64,
            "isize" => Self::of_c::<isize>(true),
            "c_short" => Self::of_c::<raw::c_short>(true),
            "c_int" => Self::of_c::<raw::c_int>(true),
            "c_long" => Self::of_c::<raw::c_long>(true),
            "c_longlong" => Self::of_c::<raw::c_longlong>(true),
            "c_ushort" => Self::of_c::<raw::c_ushort>(false),
            "c_uint" => Self::of_c::<raw::c_uint>(false),
            "c_ulong" => Self::of_c::<raw::c_ulong>(false),
            "c_ulonglong" => Self::of_c::<raw::c_ulonglong>(false),
            _ => return None,
        })
    }

    /// Whether a host integer is representable at this width
    pub fn fits(self, value: i64) -> bool {
        match self {
            IntWidth::I8 => i8::try_from(value).is_ok(),
            IntWidth::I16 => i16::try_from(value).is_ok(),
            IntWidth::I32 => i32::try_from(value).is_ok(),
            IntWidth::I64 => true,
            IntWidth::U8 => u8::try_from(value).is_ok(),
            IntWidth::U16 => u16::try_from(value).is_ok(),
            IntWidth::U32 => u32::try_from(value).is_ok(),
            IntWidth::U64 => value >= 0,
        }
    }

    /// Range-check a host integer
    pub fn check(self, value: i64) -> BindResult<i64> {
        if self.fits(value) {
            Ok(value)
        } else {
            Err(BindError::int_out_of_range(self, value.to_string()))
        }
    }

    /// Sign- or zero-extend the low bits of a register-sized value
    ///
    /// `u64` keeps its bit pattern; [`IntWidth::from_abi`] rejects values the
    /// host cannot hold.
    pub fn extend(self, raw: u64) -> i64 {
        match self {
            IntWidth::I8 => i64::from(raw as i8),
            IntWidth::I16 => i64::from(raw as i16),
            IntWidth::I32 => i64::from(raw as i32),
            IntWidth::U8 => i64::from(raw as u8),
            IntWidth::U16 => i64::from(raw as u16),
            IntWidth::U32 => i64::from(raw as u32),
            IntWidth::I64 | IntWidth::U64 => raw as i64,
        }
    }

    /// Host integer for a value produced natively at this width
    pub fn from_abi(self, value: i64) -> BindResult<i64> {
        if self == IntWidth::U64 && value < 0 {
            return Err(BindError::int_out_of_range(self, (value as u64).to_string()));
        }
        Ok(value)
    }
}

impl fmt::Display for IntWidth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveKind {
    Int(IntWidth),
    Float32,
    Float64,
    Bool,
    String,
}

/// Container head a raw declaration named
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Container {
    Tuple,
    List,
    Dict,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Shape {
    Primitive(PrimitiveKind),
    Tuple(Vec<TypeSignature>),
    List(Box<TypeSignature>),
    Dict(HashableKind, Box<TypeSignature>),
    /// Pointer-sized foreign value, or a container whose element types are unknown
    Opaque(Option<Container>),
    /// No value; return positions only
    Void,
}

impl Shape {
    /// Container this shape is or names
    pub fn container(&self) -> Option<Container> {
        match self {
            Shape::Tuple(_) => Some(Container::Tuple),
            Shape::List(_) => Some(Container::List),
            Shape::Dict(..) => Some(Container::Dict),
            Shape::Opaque(c) => *c,
            Shape::Primitive(_) | Shape::Void => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Access {
    #[default]
    Owned,
    Borrowed,
    MutBorrowed,
    RawConst,
    RawMut,
}

impl Access {
    pub fn prefix(self) -> &'static str {
        match self {
            Access::Owned => "",
            Access::Borrowed => "&",
            Access::MutBorrowed => "&mut ",
            Access::RawConst => "*const ",
            Access::RawMut => "*mut ",
        }
    }

    /// `&` or `&mut`: the host keeps ownership across the call
    pub fn is_reference(self) -> bool {
        matches!(self, Access::Borrowed | Access::MutBorrowed)
    }
}

/// Parameter or return type of a foreign function
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeSignature {
    shape: Shape,
    access: Access,
}

impl TypeSignature {
    pub fn new(shape: Shape, access: Access) -> Self {
        Self { shape, access }
    }

    fn owned(shape: Shape) -> Self {
        Self::new(shape, Access::Owned)
    }

    pub fn int() -> Self {
        Self::int_of(IntWidth::I64)
    }

    pub fn int_of(width: IntWidth) -> Self {
        Self::owned(Shape::Primitive(PrimitiveKind::Int(width)))
    }

    pub fn float32() -> Self {
        Self::owned(Shape::Primitive(PrimitiveKind::Float32))
    }

    pub fn float64() -> Self {
        Self::owned(Shape::Primitive(PrimitiveKind::Float64))
    }

    pub fn boolean() -> Self {
        Self::owned(Shape::Primitive(PrimitiveKind::Bool))
    }

    pub fn string() -> Self {
        Self::owned(Shape::Primitive(PrimitiveKind::String))
    }

    pub fn tuple(elems: Vec<TypeSignature>) -> Self {
        Self::owned(Shape::Tuple(elems))
    }

    pub fn list(elem: TypeSignature) -> Self {
        Self::owned(Shape::List(Box::new(elem)))
    }

    /// Dictionary keyed by the named hashable type
    ///
    /// Fails with `UnsupportedType` for unhashable key names such as `f64`.
    pub fn dict(key: &str, value: TypeSignature) -> BindResult<Self> {
        let codec = keys::resolve(key)?;
        Ok(Self::dict_of(codec.kind(), value))
    }

    pub fn dict_of(kind: HashableKind, value: TypeSignature) -> Self {
        Self::owned(Shape::Dict(kind, Box::new(value)))
    }

    /// Unresolved pointer-sized slot
    pub fn opaque() -> Self {
        Self::owned(Shape::Opaque(None))
    }

    /// Container named without element types
    pub fn opaque_container(container: Container) -> Self {
        Self::owned(Shape::Opaque(Some(container)))
    }

    pub fn void() -> Self {
        Self::owned(Shape::Void)
    }

    pub fn with_access(mut self, access: Access) -> Self {
        self.access = access;
        self
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    pub fn access(&self) -> Access {
        self.access
    }

    pub fn is_void(&self) -> bool {
        self.shape == Shape::Void
    }

    /// Int or float, passed by value when owned
    pub fn is_scalar(&self) -> bool {
        matches!(
            self.shape,
            Shape::Primitive(
                PrimitiveKind::Int(_) | PrimitiveKind::Float32 | PrimitiveKind::Float64
            )
        )
    }

    /// Position path of the first `Opaque` slot, if any
    ///
    /// The root is the empty path; tuple elements append `[i]`, list elements
    /// `[*]` and dictionary values `.value`.
    pub fn first_unresolved(&self) -> Option<String> {
        match &self.shape {
            Shape::Opaque(_) => Some(String::new()),
            Shape::Tuple(elems) => elems.iter().enumerate().find_map(|(i, elem)| {
                elem.first_unresolved()
                    .map(|path| format!("[{}]{}", i, path))
            }),
            Shape::List(elem) => elem.first_unresolved().map(|path| format!("[*]{}", path)),
            Shape::Dict(_, value) => value
                .first_unresolved()
                .map(|path| format!(".value{}", path)),
            Shape::Primitive(_) | Shape::Void => None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.first_unresolved().is_none()
    }

    /// Narrow this declared type with a host-supplied hint
    ///
    /// The declared access modifier is kept. Opaque slots accept any hint that
    /// agrees with the container head they named; resolved positions must match.
    pub fn refine_with(&self, hint: &TypeSignature) -> BindResult<TypeSignature> {
        let shape =
            refine_shape(&self.shape, &hint.shape).ok_or_else(|| BindError::mismatch(self, hint))?;
        Ok(TypeSignature::new(shape, self.access))
    }
}

fn refine_shape(declared: &Shape, hint: &Shape) -> Option<Shape> {
    match (declared, hint) {
        (Shape::Void, Shape::Void) => Some(Shape::Void),
        (_, Shape::Void) | (Shape::Void, _) => None,
        (Shape::Opaque(None), h) => Some(h.clone()),
        (Shape::Opaque(Some(c)), h) if h.container() == Some(*c) => Some(h.clone()),
        // The declared width is what the native function was compiled with
        (Shape::Primitive(PrimitiveKind::Int(_)), Shape::Primitive(PrimitiveKind::Int(_))) => {
            Some(declared.clone())
        }
        (Shape::Primitive(a), Shape::Primitive(b)) if a == b => Some(declared.clone()),
        (Shape::List(d), Shape::List(h)) => Some(Shape::List(Box::new(d.refine_with(h).ok()?))),
        (Shape::Tuple(ds), Shape::Tuple(hs)) if ds.len() == hs.len() => ds
            .iter()
            .zip(hs)
            .map(|(d, h)| d.refine_with(h).ok())
            .collect::<Option<Vec<_>>>()
            .map(Shape::Tuple),
        (Shape::Dict(dk, dv), Shape::Dict(hk, hv)) if dk == hk => {
            Some(Shape::Dict(*dk, Box::new(dv.refine_with(hv).ok()?)))
        }
        _ => None,
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Shape::Primitive(PrimitiveKind::Int(width)) => write!(f, "{}", width),
            Shape::Primitive(PrimitiveKind::Float32) => f.write_str("f32"),
            Shape::Primitive(PrimitiveKind::Float64) => f.write_str("f64"),
            Shape::Primitive(PrimitiveKind::Bool) => f.write_str("bool"),
            Shape::Primitive(PrimitiveKind::String) => f.write_str("String"),
            Shape::Tuple(elems) => {
                f.write_str("Tuple(")?;
                for (i, elem) in elems.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", elem)?;
                }
                f.write_str(")")
            }
            Shape::List(elem) => write!(f, "List<{}>", elem),
            Shape::Dict(key, value) => write!(f, "Dict<{}, {}>", key, value),
            Shape::Opaque(None) => f.write_str("usize"),
            Shape::Opaque(Some(Container::Tuple)) => f.write_str("WireTuple"),
            Shape::Opaque(Some(Container::List)) => f.write_str("WireList"),
            Shape::Opaque(Some(Container::Dict)) => f.write_str("WireDict"),
            Shape::Void => f.write_str("()"),
        }
    }
}

impl fmt::Display for TypeSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.access.prefix(), self.shape)
    }
}

fn lookup(name: &str) -> Option<Shape> {
    if let Some(width) = IntWidth::from_name(name) {
        return Some(Shape::Primitive(PrimitiveKind::Int(width)));
    }
    Some(match name {
        "f32" | "c_float" => Shape::Primitive(PrimitiveKind::Float32),
        "f64" | "c_double" => Shape::Primitive(PrimitiveKind::Float64),
        "bool" | "WireBool" => Shape::Primitive(PrimitiveKind::Bool),
        "String" | "str" | "WireString" => Shape::Primitive(PrimitiveKind::String),
        "WireTuple" => Shape::Opaque(Some(Container::Tuple)),
        "WireList" => Shape::List(Box::new(TypeSignature::opaque())),
        "WireDict" => Shape::Opaque(Some(Container::Dict)),
        "usize" | "size_t" => Shape::Opaque(None),
        "void" => Shape::Void,
        _ => return None,
    })
}

struct Parser<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(src: &'a str) -> Self {
        Self { src, pos: 0 }
    }

    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn skip_ws(&mut self) {
        let trimmed = self.rest().trim_start();
        self.pos = self.src.len() - trimmed.len();
    }

    fn peek(&mut self) -> Option<char> {
        self.skip_ws();
        self.rest().chars().next()
    }

    fn eat(&mut self, c: char) -> bool {
        if self.peek() == Some(c) {
            self.pos += c.len_utf8();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, c: char) -> BindResult<()> {
        if self.eat(c) {
            Ok(())
        } else {
            Err(self.unexpected())
        }
    }

    fn eat_keyword(&mut self, kw: &str) -> bool {
        self.skip_ws();
        let rest = self.rest();
        let followed_by_ident = rest
            .get(kw.len()..)
            .is_some_and(|tail| tail.starts_with(|c: char| c.is_ascii_alphanumeric() || c == '_'));
        if rest.starts_with(kw) && !followed_by_ident {
            self.pos += kw.len();
            true
        } else {
            false
        }
    }

    fn unexpected(&self) -> BindError {
        let rest = self.rest().trim();
        if rest.is_empty() {
            BindError::unsupported(self.src.trim())
        } else {
            BindError::unsupported(rest)
        }
    }

    fn ident(&mut self) -> Option<&'a str> {
        self.skip_ws();
        let rest = self.rest();
        let len = rest
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
            .unwrap_or(rest.len());
        if len == 0 {
            return None;
        }
        self.pos += len;
        Some(&rest[..len])
    }

    /// `std::os::raw::c_int` resolves by its last segment
    fn path(&mut self) -> Option<&'a str> {
        let mut name = self.ident()?;
        while self.rest().starts_with("::") {
            self.pos += 2;
            name = self.ident()?;
        }
        Some(name)
    }

    fn access(&mut self) -> BindResult<Access> {
        if self.eat('&') {
            if self.eat('\'') {
                self.ident();
            }
            if self.eat_keyword("mut") {
                Ok(Access::MutBorrowed)
            } else {
                Ok(Access::Borrowed)
            }
        } else if self.eat('*') {
            if self.eat_keyword("mut") {
                Ok(Access::RawMut)
            } else if self.eat_keyword("const") {
                Ok(Access::RawConst)
            } else {
                Err(self.unexpected())
            }
        } else {
            Ok(Access::Owned)
        }
    }

    fn decl(&mut self) -> BindResult<TypeSignature> {
        let access = self.access()?;
        let sig = self.base()?;
        // `(&mut i64)` keeps its inner modifier unless an outer one is given
        Ok(match access {
            Access::Owned => sig,
            outer => sig.with_access(outer),
        })
    }

    /// A declaration inside a container, where `()` is not allowed
    fn nested(&mut self) -> BindResult<TypeSignature> {
        let sig = self.decl()?;
        if sig.is_void() {
            return Err(BindError::unsupported("()"));
        }
        Ok(sig)
    }

    fn base(&mut self) -> BindResult<TypeSignature> {
        if self.eat('(') {
            let (mut elems, trailing_comma) = self.decl_list(')')?;
            return Ok(match elems.len() {
                0 => TypeSignature::void(),
                1 if !trailing_comma => elems.remove(0),
                _ => TypeSignature::tuple(elems),
            });
        }

        let name = self.path().ok_or_else(|| self.unexpected())?;
        let shape = match self.peek() {
            Some('<') => {
                self.pos += 1;
                self.generic(name)?
            }
            Some('(') if matches!(name, "Tuple" | "WireTuple") => {
                self.pos += 1;
                let (elems, _) = self.decl_list(')')?;
                Shape::Tuple(elems)
            }
            _ => lookup(name).ok_or_else(|| BindError::unsupported(name))?,
        };
        Ok(TypeSignature::owned(shape))
    }

    fn generic(&mut self, name: &str) -> BindResult<Shape> {
        let shape = match name {
            "List" | "WireList" => Shape::List(Box::new(self.nested()?)),
            "Dict" | "WireDict" => {
                // `&str` keys are string keys
                self.access()?;
                let key = self.path().ok_or_else(|| self.unexpected())?;
                let codec = keys::resolve(key)?;
                self.expect(',')?;
                Shape::Dict(codec.kind(), Box::new(self.nested()?))
            }
            other => return Err(BindError::unsupported(other)),
        };
        self.expect('>')?;
        Ok(shape)
    }

    fn decl_list(&mut self, close: char) -> BindResult<(Vec<TypeSignature>, bool)> {
        let mut elems = Vec::new();
        if self.eat(close) {
            return Ok((elems, false));
        }
        loop {
            elems.push(self.nested()?);
            if self.eat(',') {
                if self.eat(close) {
                    return Ok((elems, true));
                }
            } else {
                self.expect(close)?;
                return Ok((elems, false));
            }
        }
    }

    fn finish(&mut self) -> BindResult<()> {
        self.skip_ws();
        if self.pos == self.src.len() {
            Ok(())
        } else {
            Err(BindError::unsupported(self.rest().trim()))
        }
    }
}

/// Parse one type declaration (scanner output or a host hint)
pub fn parse_type(src: &str) -> BindResult<TypeSignature> {
    let mut parser = Parser::new(src);
    let sig = parser.decl()?;
    parser.finish()?;
    Ok(sig)
}

/// One scanner line, split into symbol, parameters and return type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawDeclaration {
    pub symbol: String,
    pub params: Vec<TypeSignature>,
    pub ret: TypeSignature,
}

const SEGMENT: &str = "type(";

/// Split a declaration into its symbol and the `type(...)` segments
pub(crate) fn split_symbol(decl: &str) -> Option<(&str, &str)> {
    let decl = decl.trim();
    let at = decl.find(SEGMENT)?;
    let head = &decl[..at];
    let symbol = head.strip_suffix("::").unwrap_or(head).trim();
    Some((symbol, &decl[at..]))
}

fn matching_paren(s: &str) -> Option<usize> {
    let mut depth = 1usize;
    for (i, c) in s.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

/// Parse a full scanner declaration
pub fn parse_declaration(decl: &str) -> BindResult<RawDeclaration> {
    let (symbol, mut rest) =
        split_symbol(decl).ok_or_else(|| BindError::unsupported(decl.trim()))?;
    if symbol.is_empty() || !symbol.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(BindError::unsupported(decl.trim()));
    }

    let mut types = Vec::new();
    loop {
        rest = rest.trim_start();
        if rest.is_empty() {
            break;
        }
        let body = rest
            .strip_prefix(SEGMENT)
            .ok_or_else(|| BindError::unsupported(rest))?;
        let close = matching_paren(body).ok_or_else(|| BindError::unsupported(rest))?;
        let inner = body[..close].trim();
        types.push(if inner.is_empty() {
            TypeSignature::void()
        } else {
            parse_type(inner)?
        });
        rest = body[close + 1..].trim_start();
        rest = rest.strip_prefix(';').unwrap_or(rest);
    }

    let ret = types
        .pop()
        .ok_or_else(|| BindError::unsupported(decl.trim()))?;
    if types.iter().any(TypeSignature::is_void) {
        return Err(BindError::unsupported("()"));
    }

    Ok(RawDeclaration {
        symbol: symbol.to_string(),
        params: types,
        ret,
    })
}

impl fmt::Display for RawDeclaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::", self.symbol)?;
        for param in &self.params {
            write!(f, "type({});", param)?;
        }
        write!(f, "type({})", self.ret)
    }
}
