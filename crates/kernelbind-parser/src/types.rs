//! Mapping from native type names to managed types.

use rustc_hash::{FxHashMap, FxHashSet};

use kernelbind_core::{ManagedType, NumericKind, ParseError, ParseErrorKind, PassBy, Span, StringKind};

/// Indirection written after a native type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Indirection {
    #[default]
    None,
    /// `T *`
    Pointer,
    /// `T &`
    Reference,
    /// `T *&`: the callee assigns a pointer.
    PointerRef,
}

impl Indirection {
    pub fn pass_by(self) -> PassBy {
        match self {
            Indirection::None => PassBy::Value,
            Indirection::Reference => PassBy::Reference,
            Indirection::Pointer | Indirection::PointerRef => PassBy::Pointer,
        }
    }
}

/// A native type as written in a declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeRef {
    pub name: String,
    pub is_const: bool,
    /// Template argument, e.g. `MbCurve` in `RPArray<MbCurve>`.
    pub element: Option<Box<TypeRef>>,
    pub indirection: Indirection,
    pub span: Span,
}

/// Native containers that surface as managed arrays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerKind {
    /// Stores pointers to elements (`RPArray`).
    PointerArray,
    /// Stores elements by value (`SArray`, `std::vector`, `List`, `Array`).
    ValueArray,
    /// A kernel list iterator, materialised from a temporary list.
    Iterator,
}

impl ContainerKind {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "RPArray" | "PArray" => Some(ContainerKind::PointerArray),
            "SArray" | "List" | "std::vector" | "Array" => Some(ContainerKind::ValueArray),
            "LIterator" => Some(ContainerKind::Iterator),
            _ => None,
        }
    }

    /// How the container holds each element.
    pub fn element_pass_by(self) -> PassBy {
        match self {
            ContainerKind::PointerArray | ContainerKind::Iterator => PassBy::Pointer,
            ContainerKind::ValueArray => PassBy::Value,
        }
    }
}

const INTEGER_TYPES: &[&str] = &[
    "int",
    "uint",
    "size_t",
    "refcount_t",
    "VERSION",
    "SimpleName",
    "long",
    "ptrdiff_t",
    "uint8",
    "uint32",
    "int32",
    "int64",
    "uint64",
];

/// Known enums and classes used to resolve declarations.
#[derive(Debug, Clone, Default)]
pub struct TypeTable {
    enums: FxHashSet<String>,
    /// Native class name to managed class name.
    classes: FxHashMap<String, String>,
}

impl TypeTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_enums<I, S>(mut self, enums: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.enums.extend(enums.into_iter().map(Into::into));
        self
    }

    pub fn add_enum(&mut self, name: impl Into<String>) {
        self.enums.insert(name.into());
    }

    /// Record a class under both its native and managed names.
    pub fn add_class(&mut self, native: impl Into<String>, managed: impl Into<String>) {
        let managed = managed.into();
        self.classes.insert(managed.clone(), managed.clone());
        self.classes.insert(native.into(), managed);
    }

    pub fn is_enum(&self, name: &str) -> bool {
        self.enums.contains(name)
    }

    /// Managed class name for a native type name.
    pub fn managed_class(&self, native: &str) -> String {
        match self.classes.get(native) {
            Some(managed) => managed.clone(),
            None => native.strip_prefix("Mb").unwrap_or(native).to_string(),
        }
    }

    /// Resolve a scalar (non-container) type.
    pub fn scalar(&self, ty: &TypeRef) -> ManagedType {
        let name = ty.name.as_str();
        match name {
            "bool" => ManagedType::Boolean,
            "double" | "float" => ManagedType::Number(NumericKind::Double),
            "char" if ty.is_const && ty.indirection == Indirection::Pointer => {
                ManagedType::String(StringKind::CStringWithLength)
            }
            "char" => ManagedType::Number(NumericKind::Integer),
            "c3d::string_t" => ManagedType::String(StringKind::KernelString),
            "c3d::path_string" => ManagedType::String(StringKind::PathString),
            "std::string" => ManagedType::String(StringKind::StdString),
            n if INTEGER_TYPES.contains(&n) => ManagedType::Number(NumericKind::Integer),
            n if self.is_enum(n) => ManagedType::Enum(n.to_string()),
            n => ManagedType::ObjectOf(self.managed_class(n)),
        }
    }

    /// Resolve a type, including containers and smart pointers.
    pub fn resolve(&self, ty: &TypeRef) -> Result<Resolved, ParseError> {
        if let Some(container) = ContainerKind::from_name(&ty.name) {
            let element = ty.element.as_deref().ok_or_else(|| {
                ParseError::new(
                    ParseErrorKind::ExpectedType,
                    ty.span,
                    format!("'{}' needs an element type", ty.name),
                )
            })?;
            let element_type = self.scalar(element);
            return Ok(Resolved {
                managed: ManagedType::ArrayOf(Box::new(element_type.clone())),
                container: Some(container),
                element: Some((element.name.clone(), element_type)),
            });
        }

        if let Some(element) = ty.element.as_deref() {
            // Smart pointers (`SPtr<MbSolid>`) surface as the pointee.
            return Ok(Resolved {
                managed: self.scalar(element),
                container: None,
                element: None,
            });
        }

        Ok(Resolved {
            managed: self.scalar(ty),
            container: None,
            element: None,
        })
    }
}

/// Result of resolving a [`TypeRef`].
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved {
    pub managed: ManagedType,
    pub container: Option<ContainerKind>,
    /// Native name and managed type of the container element.
    pub element: Option<(String, ManagedType)>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ty(name: &str) -> TypeRef {
        TypeRef {
            name: name.into(),
            is_const: false,
            element: None,
            indirection: Indirection::None,
            span: Span::default(),
        }
    }

    #[test]
    fn primitive_mapping() {
        let table = TypeTable::new();
        assert_eq!(table.scalar(&ty("bool")), ManagedType::Boolean);
        assert_eq!(table.scalar(&ty("double")), ManagedType::Number(NumericKind::Double));
        assert_eq!(table.scalar(&ty("SimpleName")), ManagedType::Number(NumericKind::Integer));
        assert_eq!(
            table.scalar(&ty("c3d::path_string")),
            ManagedType::String(StringKind::PathString)
        );
    }

    #[test]
    fn c_string_needs_const_pointer() {
        let table = TypeTable::new();
        let mut c = ty("char");
        c.is_const = true;
        c.indirection = Indirection::Pointer;
        assert_eq!(table.scalar(&c), ManagedType::String(StringKind::CStringWithLength));
    }

    #[test]
    fn classes_strip_prefix_unless_registered() {
        let mut table = TypeTable::new().with_enums(["MbeSpaceType"]);
        assert_eq!(table.scalar(&ty("MbSolid")), ManagedType::ObjectOf("Solid".into()));
        table.add_class("MbSmoothValues", "_SmoothValues");
        assert_eq!(
            table.scalar(&ty("MbSmoothValues")),
            ManagedType::ObjectOf("_SmoothValues".into())
        );
        assert_eq!(table.scalar(&ty("MbeSpaceType")), ManagedType::Enum("MbeSpaceType".into()));
    }

    #[test]
    fn containers() {
        let table = TypeTable::new();
        let mut arr = ty("RPArray");
        arr.element = Some(Box::new(ty("MbCurve")));
        let resolved = table.resolve(&arr).unwrap();
        assert_eq!(
            resolved.managed,
            ManagedType::ArrayOf(Box::new(ManagedType::ObjectOf("Curve".into())))
        );
        assert_eq!(resolved.container, Some(ContainerKind::PointerArray));
        assert_eq!(resolved.container.unwrap().element_pass_by(), PassBy::Pointer);

        let bare = ty("SArray");
        let err = table.resolve(&bare).unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::ExpectedType);
    }
}
