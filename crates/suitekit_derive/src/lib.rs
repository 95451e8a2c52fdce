//! Derive and attribute macros for suitekit.
//!
//! These macros generate the discovery code the runner relies on:
//! - `SuiteMembers`: lists a suite's fields and classifies each one by type
//! - `Helper`: implements the capability query for a helper from a `#[helper(..)]` hook list
//! - `suite_tests`: lists the methods of a suite's inherent `impl` block and picks out the tests

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::{format_ident, quote};
use syn::ext::IdentExt;
use syn::spanned::Spanned;
use syn::{
    Attribute, Data, DeriveInput, Fields, FnArg, ImplItem, ImplItemFn, ItemImpl, ReturnType, Signature, Type,
    TypePath, parse_macro_input,
};

/// Reserved name prefix of test methods.
const TEST_PREFIX: &str = "test";

/// Generates `SuiteMembers` for a suite struct.
///
/// Fields are listed in declaration order. Each field is classified by its type when the impl is compiled:
/// `Option<Box<H>>` with `H: Helper + Default` is a helper slot, `DefaultConfig` is skipped, anything else is
/// reported as ignored. Tuple struct fields are named `0`, `1`, ...
///
/// Deriving on an enum or union compiles, but the runner rejects such a suite with a setup error.
///
/// # Example
/// ```ignore
/// #[derive(Default, SuiteMembers)]
/// struct StoreSuite {
///     db: Option<Box<TempDb>>,    // helper
///     config: DefaultConfig,      // skipped
///     retries: u32,               // ignored
/// }
///
/// // Generates:
/// impl suitekit::SuiteMembers for StoreSuite {
///     fn shape() -> suitekit::SuiteShape { suitekit::SuiteShape::Record }
///     fn fields(&mut self) -> Vec<suitekit::FieldMember<'_>> { /* one entry per field */ }
/// }
/// ```
#[proc_macro_derive(SuiteMembers)]
pub fn derive_suite_members(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    // (label, member access) per field
    let (shape, fields): (TokenStream2, Vec<(String, TokenStream2)>) = match &input.data {
        Data::Struct(data) => {
            let fields = match &data.fields {
                Fields::Named(fields) => fields
                    .named
                    .iter()
                    .filter_map(|f| f.ident.as_ref())
                    .map(|ident| (ident.unraw().to_string(), quote!(#ident)))
                    .collect(),
                Fields::Unnamed(fields) => (0..fields.unnamed.len())
                    .map(|i| {
                        let index = syn::Index::from(i);
                        (i.to_string(), quote!(#index))
                    })
                    .collect(),
                Fields::Unit => vec![],
            };
            (quote!(::suitekit::SuiteShape::Record), fields)
        }
        Data::Enum(_) => (quote!(::suitekit::SuiteShape::Opaque("enum")), vec![]),
        Data::Union(_) => (quote!(::suitekit::SuiteShape::Opaque("union")), vec![]),
    };

    let entries = fields.iter().map(|(label, access)| {
        quote! {
            ::suitekit::FieldMember::new(#label, Probe::new(&mut self.#access).member())
        }
    });

    let expanded = quote! {
        impl #impl_generics ::suitekit::SuiteMembers for #name #ty_generics #where_clause {
            fn shape() -> ::suitekit::SuiteShape {
                #shape
            }

            #[allow(unused_imports)]
            fn fields(&mut self) -> ::std::vec::Vec<::suitekit::FieldMember<'_>> {
                use ::suitekit::__private::{HelperKind as _, MarkerKind as _, PlainKind as _, Probe};
                ::std::vec![#(#entries),*]
            }
        }
    };

    TokenStream::from(expanded)
}

/// A lifecycle hook as named in `#[helper(..)]`.
struct HookSpec {
    name: &'static str,
    flag: &'static str,
    trait_name: &'static str,
}

const HOOK_COUNT: usize = 4;

static HOOKS: [HookSpec; HOOK_COUNT] = [
    HookSpec {
        name: "before_suite",
        flag: "BEFORE_SUITE",
        trait_name: "BeforeSuite",
    },
    HookSpec {
        name: "after_suite",
        flag: "AFTER_SUITE",
        trait_name: "AfterSuite",
    },
    HookSpec {
        name: "before_test",
        flag: "BEFORE_TEST",
        trait_name: "BeforeTest",
    },
    HookSpec {
        name: "after_test",
        flag: "AFTER_TEST",
        trait_name: "AfterTest",
    },
];

/// Generates `Helper` for a helper type.
///
/// List the hooks the type implements in `#[helper(..)]`; each listed hook needs the matching trait impl.
///
/// The list is the only source of the helper's capabilities. A hook trait implemented but left out of the list is
/// never called by the runner.
///
/// # Example
/// ```ignore
/// #[derive(Default, Helper)]
/// #[helper(before_test, after_test)]
/// struct TempDir { path: Option<PathBuf> }
///
/// impl BeforeTest for TempDir { /* ... */ }
/// impl AfterTest for TempDir { /* ... */ }
/// ```
#[proc_macro_derive(Helper, attributes(helper))]
pub fn derive_helper(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    let hooks = match parse_hooks(&input.attrs) {
        Ok(hooks) => hooks,
        Err(err) => return err.to_compile_error().into(),
    };

    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let flags = hooks.iter().map(|hook| format_ident!("{}", hook.flag));
    let accessors = hooks.iter().map(|hook| {
        let method = format_ident!("as_{}", hook.name);
        let trait_ident = format_ident!("{}", hook.trait_name);
        quote! {
            fn #method(&mut self) -> ::std::option::Option<&mut dyn ::suitekit::#trait_ident> {
                ::std::option::Option::Some(self)
            }
        }
    });

    let expanded = quote! {
        impl #impl_generics ::suitekit::Helper for #name #ty_generics #where_clause {
            fn capabilities() -> ::suitekit::Capabilities {
                ::suitekit::Capabilities::empty()
                    #(.union(::suitekit::Capabilities::#flags))*
            }

            #(#accessors)*
        }
    };

    TokenStream::from(expanded)
}

/// Collect the hooks named in every `#[helper(..)]` attribute, in table order.
fn parse_hooks(attrs: &[Attribute]) -> syn::Result<Vec<&'static HookSpec>> {
    let mut listed = [false; HOOK_COUNT];

    for attr in attrs.iter().filter(|a| a.path().is_ident("helper")) {
        attr.parse_nested_meta(|meta| {
            let Some(position) = HOOKS.iter().position(|hook| meta.path.is_ident(hook.name)) else {
                return Err(meta.error(
                    "unknown hook, expected one of `before_suite`, `after_suite`, `before_test`, `after_test`",
                ));
            };
            if listed[position] {
                return Err(meta.error(format!("hook `{}` listed twice", HOOKS[position].name)));
            }
            listed[position] = true;
            Ok(())
        })?;
    }

    Ok(HOOKS
        .iter()
        .zip(listed)
        .filter_map(|(hook, on)| on.then_some(hook))
        .collect())
}

/// Generates `SuiteTests` for the type of an inherent `impl` block.
///
/// Every method taking `self` is listed in declaration order. A method is a test when its name starts with `test`,
/// it takes `&self` or `&mut self`, then a `Context` (by value or `&Context`) and a `&mut Tester`, is neither generic
/// nor async, and returns `()`. Other methods are reported as ignored. Associated functions without a receiver are
/// not listed. The block itself is emitted unchanged.
///
/// # Example
/// ```ignore
/// #[suite_tests]
/// impl StoreSuite {
///     fn test_insert(&mut self, ctx: &Context, t: &mut Tester) { /* test */ }
///     fn seed(&self) -> Vec<Row> { /* ignored */ }
///     fn new() -> Self { /* not listed */ }
/// }
/// ```
#[proc_macro_attribute]
pub fn suite_tests(attr: TokenStream, item: TokenStream) -> TokenStream {
    let attr = TokenStream2::from(attr);
    if !attr.is_empty() {
        return syn::Error::new(attr.span(), "`suite_tests` takes no arguments")
            .to_compile_error()
            .into();
    }

    let block = parse_macro_input!(item as ItemImpl);
    if let Some((_, path, _)) = &block.trait_ {
        return syn::Error::new_spanned(path, "`suite_tests` must be applied to an inherent impl block")
            .to_compile_error()
            .into();
    }

    let self_ty = &block.self_ty;
    let (impl_generics, _, where_clause) = block.generics.split_for_impl();
    let methods = block.items.iter().filter_map(|item| match item {
        ImplItem::Fn(method) => method_entry(method),
        _ => None,
    });

    let expanded = quote! {
        #block

        impl #impl_generics ::suitekit::SuiteTests for #self_ty #where_clause {
            fn methods() -> ::std::vec::Vec<::suitekit::SuiteMethod<Self>> {
                let mut methods = ::std::vec::Vec::new();
                #(#methods)*
                methods
            }
        }
    };

    TokenStream::from(expanded)
}

/// How a test method takes its context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ContextArg {
    Owned,
    Borrowed,
}

/// The `methods.push(..)` statement for one method, or `None` for associated functions.
fn method_entry(method: &ImplItemFn) -> Option<TokenStream2> {
    method.sig.receiver()?;

    let name = &method.sig.ident;
    let label = name.unraw().to_string();
    let cfgs = method.attrs.iter().filter(|a| a.path().is_ident("cfg"));

    let entry = match test_shape(&method.sig) {
        Some(context) if label.starts_with(TEST_PREFIX) => {
            let ctx = match context {
                ContextArg::Owned => quote!(::std::clone::Clone::clone(ctx)),
                ContextArg::Borrowed => quote!(ctx),
            };
            quote! {
                ::suitekit::SuiteMethod::test(
                    #label,
                    |s: &mut Self, ctx: &::suitekit::Context, t: &mut ::suitekit::Tester| s.#name(#ctx, t),
                )
            }
        }
        _ => quote!(::suitekit::SuiteMethod::ignored(#label)),
    };

    Some(quote! {
        #(#cfgs)*
        methods.push(#entry);
    })
}

/// Check the test signature shape: `(&self | &mut self, Context | &Context, &mut Tester) -> ()`, not generic, not
/// async, not unsafe.
fn test_shape(sig: &Signature) -> Option<ContextArg> {
    if !sig.generics.params.is_empty()
        || sig.asyncness.is_some()
        || sig.unsafety.is_some()
        || sig.variadic.is_some()
        || !returns_unit(&sig.output)
    {
        return None;
    }

    let receiver = sig.receiver()?;
    if receiver.reference.is_none() || receiver.colon_token.is_some() {
        return None;
    }

    let args: Vec<&Type> = sig
        .inputs
        .iter()
        .filter_map(|arg| match arg {
            FnArg::Typed(pat) => Some(&*pat.ty),
            FnArg::Receiver(_) => None,
        })
        .collect();
    let [ctx, tester] = args.as_slice() else {
        return None;
    };

    let context = match ctx {
        Type::Path(path) if names(path, "Context") => ContextArg::Owned,
        Type::Reference(r) if r.mutability.is_none() && matches!(&*r.elem, Type::Path(p) if names(p, "Context")) => {
            ContextArg::Borrowed
        }
        _ => return None,
    };

    match tester {
        Type::Reference(r) if r.mutability.is_some() && matches!(&*r.elem, Type::Path(p) if names(p, "Tester")) => {
            Some(context)
        }
        _ => None,
    }
}

fn returns_unit(output: &ReturnType) -> bool {
    match output {
        ReturnType::Default => true,
        ReturnType::Type(_, ty) => matches!(&**ty, Type::Tuple(tuple) if tuple.elems.is_empty()),
    }
}

/// Whether `path` ends in the plain identifier `ident` (`Context`, `suitekit::Context`, ...).
fn names(path: &TypePath, ident: &str) -> bool {
    path.qself.is_none()
        && path
            .path
            .segments
            .last()
            .is_some_and(|segment| segment.ident == ident && segment.arguments.is_none())
}

#[cfg(test)]
mod tests {
    use super::*;
    use syn::parse_quote;

    fn shape(method: ImplItemFn) -> Option<ContextArg> {
        test_shape(&method.sig)
    }

    #[test]
    fn test_accepts_reference_context() {
        let method: ImplItemFn = parse_quote! {
            fn test_first(&mut self, ctx: &Context, t: &mut Tester) {}
        };
        assert_eq!(shape(method), Some(ContextArg::Borrowed));
    }

    #[test]
    fn test_accepts_owned_context_and_paths() {
        let method: ImplItemFn = parse_quote! {
            fn test_first(&self, ctx: suitekit::Context, t: &mut ::suitekit::Tester) -> () {}
        };
        assert_eq!(shape(method), Some(ContextArg::Owned));
    }

    #[test]
    fn test_rejects_wrong_shapes() {
        let rejected: Vec<ImplItemFn> = vec![
            parse_quote! { fn test_wrong(&self) {} },
            parse_quote! { fn test_value(self, ctx: Context, t: &mut Tester) {} },
            parse_quote! { fn test_shared(&self, ctx: Context, t: &Tester) {} },
            parse_quote! { fn test_swapped(&self, t: &mut Tester, ctx: Context) {} },
            parse_quote! { fn test_returns(&self, ctx: Context, t: &mut Tester) -> bool { true } },
            parse_quote! { fn test_generic<T>(&self, ctx: Context, t: &mut Tester) {} },
            parse_quote! { async fn test_async(&self, ctx: Context, t: &mut Tester) {} },
            parse_quote! { fn test_extra(&self, ctx: Context, t: &mut Tester, n: u32) {} },
            parse_quote! { fn test_mut_ctx(&self, ctx: &mut Context, t: &mut Tester) {} },
        ];
        for method in rejected {
            let name = method.sig.ident.to_string();
            assert_eq!(shape(method), None, "{name} should not be a test");
        }
    }

    #[test]
    fn test_entry_for_non_test_name_is_ignored() {
        let method: ImplItemFn = parse_quote! {
            fn check_first(&mut self, ctx: &Context, t: &mut Tester) {}
        };
        let entry = method_entry(&method).map(|tokens| tokens.to_string()).unwrap_or_default();
        assert!(entry.contains("ignored"));
        assert!(entry.contains("\"check_first\""));
    }

    #[test]
    fn test_entry_for_test_calls_method() {
        let method: ImplItemFn = parse_quote! {
            fn test_first(&mut self, ctx: Context, t: &mut Tester) {}
        };
        let entry = method_entry(&method).map(|tokens| tokens.to_string()).unwrap_or_default();
        assert!(entry.contains(":: suitekit :: SuiteMethod :: test"));
        assert!(entry.contains("s . test_first"));
        assert!(entry.contains("Clone :: clone (ctx)"));
    }

    #[test]
    fn test_associated_functions_are_not_listed() {
        let method: ImplItemFn = parse_quote! {
            fn new() -> Self { Self }
        };
        assert!(method_entry(&method).is_none());
    }

    #[test]
    fn test_parse_hooks() {
        let attrs: Vec<Attribute> = vec![parse_quote!(#[helper(after_test, before_suite)])];
        let hooks: Vec<&str> = parse_hooks(&attrs)
            .map(|hooks| hooks.iter().map(|h| h.name).collect())
            .unwrap_or_default();
        // table order, not attribute order
        assert_eq!(hooks, vec!["before_suite", "after_test"]);
    }

    #[test]
    fn test_parse_hooks_rejects_unknown_and_duplicates() {
        let unknown: Vec<Attribute> = vec![parse_quote!(#[helper(before_all)])];
        assert!(parse_hooks(&unknown).is_err());

        let twice: Vec<Attribute> = vec![parse_quote!(#[helper(before_test, before_test)])];
        assert!(parse_hooks(&twice).is_err());
    }
}
