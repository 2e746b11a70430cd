//! # Introspection data model.
//!
//! A parsed view of an object's introspection document: interfaces, their
//! methods and the method argument signatures. Used by [`Method`] to coerce
//! caller arguments to the declared wire shapes before sending.
//!
//! [`Method`]: crate::bus::Method

use crate::error::BusError;

/// Direction of a method argument.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ArgDirection {
    /// Caller-supplied argument.
    In,
    /// Value returned by the method.
    Out,
}

/// One introspected method argument.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArgSpec {
    /// Argument name (may be empty).
    pub name: String,
    /// Argument direction.
    pub direction: ArgDirection,
    /// Type signature, e.g. `u`, `as`, `a{sv}`.
    pub signature: String,
}

impl ArgSpec {
    /// Convenience constructor for an "in" argument.
    pub fn input(name: impl Into<String>, signature: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            direction: ArgDirection::In,
            signature: signature.into(),
        }
    }

    /// Convenience constructor for an "out" argument.
    pub fn output(name: impl Into<String>, signature: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            direction: ArgDirection::Out,
            signature: signature.into(),
        }
    }
}

/// One introspected method.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MethodSpec {
    /// Unqualified method name.
    pub name: String,
    /// Declared arguments, in order.
    pub args: Vec<ArgSpec>,
}

impl MethodSpec {
    /// Returns the caller-supplied ("in") arguments, in declaration order.
    pub fn input_args(&self) -> impl Iterator<Item = &ArgSpec> {
        self.args
            .iter()
            .filter(|arg| arg.direction == ArgDirection::In)
    }
}

/// One introspected interface.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InterfaceSpec {
    /// Fully-qualified interface name.
    pub name: String,
    /// Methods declared on the interface.
    pub methods: Vec<MethodSpec>,
}

/// Parsed introspection document for one object.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Introspection {
    /// Interfaces exposed by the object.
    pub interfaces: Vec<InterfaceSpec>,
}

impl Introspection {
    /// Finds a method by name suffix.
    ///
    /// Callers usually hold a fully-qualified name like
    /// `org.freedesktop.login1.Manager.ListUsers`; the introspection
    /// document declares the unqualified `ListUsers` under its interface.
    /// A method matches when the requested name equals the unqualified name
    /// or ends with `.<name>`, and, if the requested name is qualified, the
    /// interface name is the matching prefix.
    pub fn find_method(&self, name: &str) -> Result<&MethodSpec, BusError> {
        let member = name.rsplit('.').next().unwrap_or(name);
        let qualified = name.contains('.');

        for interface in &self.interfaces {
            for method in &interface.methods {
                if method.name != member {
                    continue;
                }
                if qualified {
                    let full = format!("{}.{}", interface.name, method.name);
                    if full != name && !full.ends_with(&format!(".{name}")) {
                        continue;
                    }
                }
                return Ok(method);
            }
        }

        Err(BusError::UnknownMethod(name.to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc() -> Introspection {
        Introspection {
            interfaces: vec![
                InterfaceSpec {
                    name: "org.example.Power".to_owned(),
                    methods: vec![MethodSpec {
                        name: "Suspend".to_owned(),
                        args: vec![ArgSpec::input("interactive", "b")],
                    }],
                },
                InterfaceSpec {
                    name: "org.example.Session".to_owned(),
                    methods: vec![MethodSpec {
                        name: "Lock".to_owned(),
                        args: vec![],
                    }],
                },
            ],
        }
    }

    #[test]
    fn finds_by_unqualified_name() {
        let doc = doc();
        assert_eq!(doc.find_method("Lock").unwrap().name, "Lock");
    }

    #[test]
    fn finds_by_qualified_name() {
        let doc = doc();
        let method = doc.find_method("org.example.Power.Suspend").unwrap();
        assert_eq!(method.name, "Suspend");
        assert_eq!(method.input_args().count(), 1);
    }

    #[test]
    fn qualified_name_must_match_interface() {
        let doc = doc();
        let err = doc.find_method("org.other.Power.Suspend").unwrap_err();
        assert!(matches!(err, BusError::UnknownMethod(_)));
    }

    #[test]
    fn unknown_method_is_an_error() {
        assert!(doc().find_method("Hibernate").is_err());
    }
}
