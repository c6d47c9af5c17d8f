//! JVM types and member references.
//!
//! Types are written and parsed in JVM descriptor syntax, e.g. `I`,
//! `[J`, `Ljava/lang/String;`. The [JType::Bottom] sentinel is the type of
//! `null`: it is compatible with every reference type.

use core::fmt;

use super::{IrError, IrResult};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum JType {
    Boolean,
    Char,
    Byte,
    Short,
    Int,
    Long,
    Float,
    Double,
    /// A class type, by internal name (`java/lang/Object`).
    Object(String),
    Array(Box<JType>),
    /// The type of a constant `null`.
    Bottom,
}

impl JType {
    pub fn object(internal_name: impl Into<String>) -> Self { JType::Object(internal_name.into()) }

    pub fn array_of(elem: JType) -> Self { JType::Array(Box::new(elem)) }

    /// Parse a single field descriptor, `V` is not accepted.
    pub fn parse(desc: &str) -> IrResult<JType> {
        let (ty, rest) = Self::parse_prefix(desc)?;
        if !rest.is_empty() {
            return Err(IrError::illegal(format!(
                "trailing characters in type descriptor: {desc}"
            )));
        }
        Ok(ty)
    }

    /// Parse one type from the start of `desc`, returning the remainder.
    fn parse_prefix(desc: &str) -> IrResult<(JType, &str)> {
        let mut dims = 0;
        let mut rest = desc;
        while let Some(stripped) = rest.strip_prefix('[') {
            dims += 1;
            rest = stripped;
        }

        let mut chars = rest.chars();
        let first = chars
            .next()
            .ok_or_else(|| IrError::illegal(format!("empty type descriptor: {desc:?}")))?;
        let after = chars.as_str();

        let (mut ty, rest) = match first {
            'Z' => (JType::Boolean, after),
            'C' => (JType::Char, after),
            'B' => (JType::Byte, after),
            'S' => (JType::Short, after),
            'I' => (JType::Int, after),
            'J' => (JType::Long, after),
            'F' => (JType::Float, after),
            'D' => (JType::Double, after),
            'L' => {
                let end = after.find(';').ok_or_else(|| {
                    IrError::illegal(format!("unterminated class descriptor: {desc}"))
                })?;
                if end == 0 {
                    return Err(IrError::illegal(format!("empty class name: {desc}")));
                }
                (JType::object(&after[..end]), &after[end + 1..])
            }
            _ => {
                return Err(IrError::illegal(format!(
                    "invalid type descriptor: {desc}"
                )))
            }
        };

        for _ in 0..dims {
            ty = JType::array_of(ty);
        }
        Ok((ty, rest))
    }

    /// Parse a method descriptor into parameter types and return type,
    /// `None` for `V`.
    pub fn parse_method(desc: &str) -> IrResult<(Vec<JType>, Option<JType>)> {
        let mut rest = desc
            .strip_prefix('(')
            .ok_or_else(|| IrError::illegal(format!("invalid method descriptor: {desc}")))?;

        let mut params = Vec::new();
        loop {
            if let Some(after) = rest.strip_prefix(')') {
                rest = after;
                break;
            }
            let (ty, after) = Self::parse_prefix(rest)?;
            params.push(ty);
            rest = after;
        }

        let ret = if rest == "V" {
            None
        } else {
            Some(Self::parse(rest)?)
        };
        Ok((params, ret))
    }

    pub fn descriptor(&self) -> String { self.to_string() }

    pub fn is_reference(&self) -> bool {
        matches!(self, JType::Object(_) | JType::Array(_) | JType::Bottom)
    }

    pub fn is_bottom(&self) -> bool { matches!(self, JType::Bottom) }

    pub fn element_type(&self) -> Option<&JType> {
        match self {
            JType::Array(elem) => Some(elem),
            _ => None,
        }
    }

    /// Widen the sub-int primitives to `I`, as they are on the operand stack.
    pub fn intify(self) -> JType {
        match self {
            JType::Boolean | JType::Char | JType::Byte | JType::Short => JType::Int,
            ty => ty,
        }
    }
}

impl fmt::Display for JType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JType::Boolean => write!(f, "Z"),
            JType::Char => write!(f, "C"),
            JType::Byte => write!(f, "B"),
            JType::Short => write!(f, "S"),
            JType::Int => write!(f, "I"),
            JType::Long => write!(f, "J"),
            JType::Float => write!(f, "F"),
            JType::Double => write!(f, "D"),
            JType::Object(name) => write!(f, "L{name};"),
            JType::Array(elem) => write!(f, "[{elem}"),
            JType::Bottom => write!(f, "<bottom>"),
        }
    }
}

/// A reference to a method of a class.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MethodRef {
    /// Internal name of the declaring class.
    pub owner: String,
    pub name: String,
    pub params: Vec<JType>,
    /// `None` for void methods.
    pub ret: Option<JType>,
    pub is_static: bool,
}

impl MethodRef {
    pub fn new(
        owner: impl Into<String>,
        name: impl Into<String>,
        desc: &str,
        is_static: bool,
    ) -> IrResult<Self> {
        let (params, ret) = JType::parse_method(desc)?;
        Ok(Self {
            owner: owner.into(),
            name: name.into(),
            params,
            ret,
            is_static,
        })
    }

    /// The number of stack operands, the receiver included.
    pub fn arity(&self) -> usize { self.params.len() + usize::from(!self.is_static) }

    pub fn descriptor(&self) -> String {
        let mut desc = String::from("(");
        for param in &self.params {
            desc.push_str(&param.descriptor());
        }
        desc.push(')');
        match &self.ret {
            Some(ret) => desc.push_str(&ret.descriptor()),
            None => desc.push('V'),
        }
        desc
    }
}

impl fmt::Display for MethodRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_static {
            write!(f, "static ")?;
        }
        write!(f, "{}.{}{}", self.owner, self.name, self.descriptor())
    }
}

/// A reference to a field of a class.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldRef {
    pub owner: String,
    pub name: String,
    pub ty: JType,
    pub is_static: bool,
}

impl FieldRef {
    pub fn new(
        owner: impl Into<String>,
        name: impl Into<String>,
        desc: &str,
        is_static: bool,
    ) -> IrResult<Self> {
        Ok(Self {
            owner: owner.into(),
            name: name.into(),
            ty: JType::parse(desc)?,
            is_static,
        })
    }
}

impl fmt::Display for FieldRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_static {
            write!(f, "static ")?;
        }
        write!(f, "{}.{}:{}", self.owner, self.name, self.ty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_descriptors() {
        assert_eq!(JType::parse("I").unwrap(), JType::Int);
        assert_eq!(
            JType::parse("[[Ljava/lang/String;").unwrap(),
            JType::array_of(JType::array_of(JType::object("java/lang/String")))
        );
        assert!(JType::parse("V").is_err());
        assert!(JType::parse("Ljava/lang/String").is_err());
        assert!(JType::parse("II").is_err());

        let (params, ret) = JType::parse_method("(IJ[BLfoo/Bar;)V").unwrap();
        assert_eq!(
            params,
            vec![
                JType::Int,
                JType::Long,
                JType::array_of(JType::Byte),
                JType::object("foo/Bar"),
            ]
        );
        assert_eq!(ret, None);
    }

    #[test]
    fn test_method_ref() {
        let m = MethodRef::new("foo/Bar", "baz", "(IZ)Ljava/lang/Object;", false).unwrap();
        assert_eq!(m.arity(), 3);
        assert_eq!(m.descriptor(), "(IZ)Ljava/lang/Object;");
        assert_eq!(m.to_string(), "foo/Bar.baz(IZ)Ljava/lang/Object;");
    }

    #[test]
    fn test_intify() {
        assert_eq!(JType::Boolean.intify(), JType::Int);
        assert_eq!(JType::Short.intify(), JType::Int);
        assert_eq!(JType::Long.intify(), JType::Long);
        assert_eq!(
            JType::array_of(JType::Byte).intify(),
            JType::array_of(JType::Byte)
        );
    }
}
