//! Suite member discovery and classification.
//!
//! ## How members are found
//!
//! `#[derive(SuiteMembers)]` lists a suite's fields in declaration order and classifies each one by its type:
//!
//! - `Option<Box<H>>` where `H: Helper + Default` and `H` implements at least one hook → [`Member::Helper`]
//! - [`DefaultConfig`] or `Option<Box<DefaultConfig>>` → [`Member::Marker`], skipped silently
//! - anything else → [`Member::Plain`], reported as ignored
//!
//! `#[suite_tests]` on the suite's inherent `impl` block lists every method taking `self` and classifies it by name
//! and signature. [`Classification::of`] folds both lists into what the runner needs.

use std::fmt;

use crate::config::DefaultConfig;
use crate::context::Context;
use crate::error::SuiteError;
use crate::lifecycle::{Capabilities, Helper};
use crate::tester::Tester;

/// Method name exempt from the ignored-method warning.
pub const EXEMPT_METHOD: &str = "suite";

/// Structural kind of a suite type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuiteShape {
    /// A struct whose fields can be listed.
    Record,
    /// Anything else, with a short description of what it is (`"enum"`, `"union"`).
    Opaque(&'static str),
}

/// Field listing for a suite type. Implemented by `#[derive(SuiteMembers)]`.
pub trait SuiteMembers {
    fn shape() -> SuiteShape
    where
        Self: Sized;

    /// Every field in declaration order.
    fn fields(&mut self) -> Vec<FieldMember<'_>>;
}

/// A field as seen by the classifier.
pub enum Member<'a> {
    /// A lazily allocated helper slot.
    Helper(&'a mut (dyn HelperSlot + 'a)),
    /// The zero-configuration marker.
    Marker,
    /// Neither a helper nor the marker.
    Plain,
}

impl fmt::Debug for Member<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Member::Helper(slot) => f
                .debug_struct("Helper")
                .field("allocated", &slot.is_allocated())
                .field("capabilities", &slot.capabilities())
                .finish(),
            Member::Marker => f.write_str("Marker"),
            Member::Plain => f.write_str("Plain"),
        }
    }
}

#[derive(Debug)]
pub struct FieldMember<'a> {
    name: &'static str,
    member: Member<'a>,
}

impl<'a> FieldMember<'a> {
    pub fn new(name: &'static str, member: Member<'a>) -> Self {
        Self { name, member }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn member(&self) -> &Member<'a> {
        &self.member
    }

    pub fn into_member(self) -> Member<'a> {
        self.member
    }
}

/// Storage for one helper: `None` until first use.
pub trait HelperSlot {
    fn is_allocated(&self) -> bool;

    /// The helper, allocating a default instance first if the slot is empty.
    fn helper_mut(&mut self) -> &mut dyn Helper;

    fn capabilities(&self) -> Capabilities;
}

impl<T: Helper + Default> HelperSlot for Option<Box<T>> {
    fn is_allocated(&self) -> bool {
        self.is_some()
    }

    fn helper_mut(&mut self) -> &mut dyn Helper {
        self.get_or_insert_with(|| Box::new(T::default())).as_mut()
    }

    fn capabilities(&self) -> Capabilities {
        T::capabilities()
    }
}

/// Method listing for a suite type. Implemented by `#[suite_tests]`.
pub trait SuiteTests: Sized {
    /// Every method taking `self`, in declaration order.
    fn methods() -> Vec<SuiteMethod<Self>>;
}

/// Entry point of a test method.
pub type TestFn<S> = fn(&mut S, &Context, &mut Tester);

pub enum MethodKind<S> {
    Test(TestFn<S>),
    Ignored,
}

pub struct SuiteMethod<S> {
    name: &'static str,
    kind: MethodKind<S>,
}

impl<S> SuiteMethod<S> {
    pub fn test(name: &'static str, body: TestFn<S>) -> Self {
        Self {
            name,
            kind: MethodKind::Test(body),
        }
    }

    pub fn ignored(name: &'static str) -> Self {
        Self {
            name,
            kind: MethodKind::Ignored,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn kind(&self) -> &MethodKind<S> {
        &self.kind
    }

    pub fn is_test(&self) -> bool {
        matches!(self.kind, MethodKind::Test(_))
    }
}

impl<S> fmt::Debug for SuiteMethod<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SuiteMethod")
            .field("name", &self.name)
            .field("test", &self.is_test())
            .finish()
    }
}

/// A field classified as a helper.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HelperField {
    /// Position in [`SuiteMembers::fields`].
    pub index: usize,
    pub name: &'static str,
}

/// A method classified as a test.
pub struct TestMethod<S> {
    pub name: &'static str,
    pub body: TestFn<S>,
}

impl<S> fmt::Debug for TestMethod<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("TestMethod").field(&self.name).finish()
    }
}

/// Result of classifying one suite value.
#[derive(Debug)]
pub struct Classification<S> {
    pub helpers: Vec<HelperField>,
    pub ignored_fields: Vec<&'static str>,
    pub tests: Vec<TestMethod<S>>,
    pub ignored_methods: Vec<&'static str>,
}

impl<S: SuiteMembers + SuiteTests> Classification<S> {
    /// Classify `suite`'s fields and methods. Fails only when `S` is not a struct.
    pub fn of(suite: &mut S) -> Result<Self, SuiteError> {
        if let SuiteShape::Opaque(kind) = S::shape() {
            return Err(SuiteError::NotAStruct {
                suite: std::any::type_name::<S>().to_string(),
                kind,
            });
        }

        let mut helpers = Vec::new();
        let mut ignored_fields = Vec::new();
        for (index, field) in suite.fields().into_iter().enumerate() {
            match field.member() {
                Member::Helper(_) => helpers.push(HelperField {
                    index,
                    name: field.name(),
                }),
                Member::Marker => {}
                Member::Plain => ignored_fields.push(field.name()),
            }
        }

        let mut tests = Vec::new();
        let mut ignored_methods = Vec::new();
        for method in S::methods() {
            match method.kind {
                MethodKind::Test(body) => tests.push(TestMethod {
                    name: method.name,
                    body,
                }),
                MethodKind::Ignored if method.name == EXEMPT_METHOD => {}
                MethodKind::Ignored => ignored_methods.push(method.name),
            }
        }

        Ok(Self {
            helpers,
            ignored_fields,
            tests,
            ignored_methods,
        })
    }
}

/// Support code for the derive macros. Not public API.
#[doc(hidden)]
pub mod __private {
    use super::{DefaultConfig, Helper, Member};

    /// Wraps a field so that method resolution can pick a classification by the field's type.
    ///
    /// `HelperKind` and `MarkerKind` are implemented on `Probe` itself and win when their bounds hold.
    /// `PlainKind` is implemented on `&Probe` and is only reached through autoref, i.e. as the fallback.
    pub struct Probe<'a, F>(&'a mut F);

    impl<'a, F> Probe<'a, F> {
        pub fn new(field: &'a mut F) -> Self {
            Probe(field)
        }
    }

    pub trait HelperKind<'a> {
        fn member(self) -> Member<'a>;
    }

    impl<'a, T: Helper + Default> HelperKind<'a> for Probe<'a, Option<Box<T>>> {
        fn member(self) -> Member<'a> {
            if T::capabilities().is_empty() {
                Member::Plain
            } else {
                Member::Helper(self.0)
            }
        }
    }

    pub trait MarkerKind<'a> {
        fn member(self) -> Member<'a>;
    }

    impl<'a> MarkerKind<'a> for Probe<'a, DefaultConfig> {
        fn member(self) -> Member<'a> {
            Member::Marker
        }
    }

    impl<'a> MarkerKind<'a> for Probe<'a, Option<Box<DefaultConfig>>> {
        fn member(self) -> Member<'a> {
            Member::Marker
        }
    }

    pub trait PlainKind<'a> {
        fn member(self) -> Member<'a>;
    }

    impl<'a, F> PlainKind<'a> for &Probe<'a, F> {
        fn member(self) -> Member<'a> {
            Member::Plain
        }
    }
}
