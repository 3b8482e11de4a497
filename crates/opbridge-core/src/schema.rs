use std::fmt;

use crate::IValue;

/// Declared type of a schema argument or return.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Type {
    Tensor,
    Int,
    Float,
    Bool,
    Str,
    List(Box<Type>),
    Optional(Box<Type>),
}

impl Type {
    pub fn list_of_tensors() -> Self {
        Type::List(Box::new(Type::Tensor))
    }

    pub fn optional(inner: Type) -> Self {
        Type::Optional(Box::new(inner))
    }

    pub fn is_subtype_of(&self, other: &Type) -> bool {
        if self == other {
            return true;
        }
        match (self, other) {
            (Type::Optional(a), Type::Optional(b)) => a.is_subtype_of(b),
            (_, Type::Optional(b)) => self.is_subtype_of(b),
            _ => false,
        }
    }

    /// True for `Tensor` and `Tensor[]`.
    pub fn is_tensor_like(&self) -> bool {
        match self {
            Type::Tensor => true,
            Type::List(inner) => **inner == Type::Tensor,
            _ => false,
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Tensor => f.write_str("Tensor"),
            Type::Int => f.write_str("int"),
            Type::Float => f.write_str("float"),
            Type::Bool => f.write_str("bool"),
            Type::Str => f.write_str("str"),
            Type::List(inner) => write!(f, "{inner}[]"),
            Type::Optional(inner) => write!(f, "{inner}?"),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Argument {
    pub name: String,
    pub ty: Type,
    pub default: Option<IValue>,
}

impl Argument {
    /// A tensor argument without a default.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_type(name, Type::Tensor)
    }

    pub fn with_type(name: impl Into<String>, ty: Type) -> Self {
        Self {
            name: name.into(),
            ty,
            default: None,
        }
    }

    pub fn with_default(mut self, default: IValue) -> Self {
        self.default = Some(default);
        self
    }
}

impl fmt::Display for Argument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.ty, self.name)?;
        match &self.default {
            None => Ok(()),
            Some(IValue::None) => f.write_str("=None"),
            Some(IValue::Int(v)) => write!(f, "={v}"),
            Some(IValue::Double(v)) => write!(f, "={v}"),
            Some(IValue::Bool(v)) => write!(f, "={v}"),
            Some(other) => write!(f, "=<{}>", other.kind()),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OperatorName {
    pub name: String,
    pub overload_name: String,
}

impl OperatorName {
    pub fn new(name: impl Into<String>, overload_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            overload_name: overload_name.into(),
        }
    }
}

impl fmt::Display for OperatorName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        if !self.overload_name.is_empty() {
            write!(f, ".{}", self.overload_name)?;
        }
        Ok(())
    }
}

/// The typed calling contract of an operator.
///
/// Immutable once registered; the dispatcher hands out shared references.
#[derive(Clone, Debug)]
pub struct FunctionSchema {
    name: OperatorName,
    arguments: Vec<Argument>,
    returns: Vec<Argument>,
}

impl FunctionSchema {
    pub fn new(
        name: impl Into<String>,
        overload_name: impl Into<String>,
        arguments: Vec<Argument>,
        returns: Vec<Argument>,
    ) -> Self {
        Self {
            name: OperatorName::new(name, overload_name),
            arguments,
            returns,
        }
    }

    pub fn operator_name(&self) -> &OperatorName {
        &self.name
    }

    pub fn name(&self) -> &str {
        &self.name.name
    }

    pub fn overload_name(&self) -> &str {
        &self.name.overload_name
    }

    pub fn arguments(&self) -> &[Argument] {
        &self.arguments
    }

    pub fn returns(&self) -> &[Argument] {
        &self.returns
    }

    pub fn argument_index(&self, name: &str) -> Option<usize> {
        self.arguments.iter().position(|a| a.name == name)
    }
}

impl fmt::Display for FunctionSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.name)?;
        for (i, arg) in self.arguments.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{arg}")?;
        }
        f.write_str(") -> (")?;
        for (i, ret) in self.returns.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{ret}")?;
        }
        f.write_str(")")
    }
}
