use crate::Tensor;

/// A dynamically typed value as carried on the boxed calling-convention stack.
#[derive(Clone, Debug, Default)]
pub enum IValue {
    #[default]
    None,
    Tensor(Tensor),
    TensorList(Vec<Tensor>),
    Int(i64),
    Double(f64),
    Bool(bool),
    String(String),
    IntList(Vec<i64>),
    DoubleList(Vec<f64>),
}

impl IValue {
    pub fn kind(&self) -> &'static str {
        match self {
            IValue::None => "None",
            IValue::Tensor(_) => "Tensor",
            IValue::TensorList(_) => "TensorList",
            IValue::Int(_) => "Int",
            IValue::Double(_) => "Double",
            IValue::Bool(_) => "Bool",
            IValue::String(_) => "String",
            IValue::IntList(_) => "IntList",
            IValue::DoubleList(_) => "DoubleList",
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, IValue::None)
    }

    pub fn is_tensor(&self) -> bool {
        matches!(self, IValue::Tensor(_))
    }

    pub fn is_tensor_list(&self) -> bool {
        matches!(self, IValue::TensorList(_))
    }

    pub fn as_tensor(&self) -> Option<&Tensor> {
        match self {
            IValue::Tensor(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_tensor_list(&self) -> Option<&[Tensor]> {
        match self {
            IValue::TensorList(l) => Some(l),
            _ => None,
        }
    }

    pub fn into_tensor(self) -> Option<Tensor> {
        match self {
            IValue::Tensor(t) => Some(t),
            _ => None,
        }
    }

    pub fn into_tensor_list(self) -> Option<Vec<Tensor>> {
        match self {
            IValue::TensorList(l) => Some(l),
            _ => None,
        }
    }

    pub fn to_i64(&self) -> Option<i64> {
        match self {
            IValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Ints widen to doubles, matching how scalar arguments are usually
    /// written on the command line or in tests.
    pub fn to_f64(&self) -> Option<f64> {
        match self {
            IValue::Double(v) => Some(*v),
            IValue::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn to_bool(&self) -> Option<bool> {
        match self {
            IValue::Bool(v) => Some(*v),
            _ => None,
        }
    }
}

impl From<Tensor> for IValue {
    fn from(t: Tensor) -> Self {
        IValue::Tensor(t)
    }
}

impl From<Vec<Tensor>> for IValue {
    fn from(l: Vec<Tensor>) -> Self {
        IValue::TensorList(l)
    }
}

impl From<i64> for IValue {
    fn from(v: i64) -> Self {
        IValue::Int(v)
    }
}

impl From<f64> for IValue {
    fn from(v: f64) -> Self {
        IValue::Double(v)
    }
}

impl From<bool> for IValue {
    fn from(v: bool) -> Self {
        IValue::Bool(v)
    }
}

impl From<String> for IValue {
    fn from(v: String) -> Self {
        IValue::String(v)
    }
}

impl From<&str> for IValue {
    fn from(v: &str) -> Self {
        IValue::String(v.to_string())
    }
}
