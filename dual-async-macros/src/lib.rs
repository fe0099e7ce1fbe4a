use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::{format_ident, quote};
use syn::{parse_macro_input, FnArg, ItemFn, Pat};

/// Runs an `async fn` test to completion on the test thread's event loop.
#[proc_macro_attribute]
pub fn test(attr: TokenStream, item: TokenStream) -> TokenStream {
    expand_entry(attr, item, EntryKind::Test)
}

/// Runs an `async fn main` to completion on the main thread's event loop.
#[proc_macro_attribute]
pub fn main(attr: TokenStream, item: TokenStream) -> TokenStream {
    expand_entry(attr, item, EntryKind::Main)
}

/// Keeps the function as written and adds a sibling `<name>_signature()`
/// returning its declared parameter names as a `dual_async::signature::FnSignature`.
#[proc_macro_attribute]
pub fn signature(attr: TokenStream, item: TokenStream) -> TokenStream {
    if let Some(err) = reject_arguments(attr, "signature") {
        return err;
    }

    let input = parse_macro_input!(item as ItemFn);
    let vis = &input.vis;
    let name = input.sig.ident.to_string();
    let describe = format_ident!("{}_signature", input.sig.ident);

    let mut params = Vec::new();
    for arg in &input.sig.inputs {
        match arg {
            FnArg::Receiver(_) => params.push("self".to_string()),
            FnArg::Typed(typed) => collect_bindings(&typed.pat, &mut params),
        }
    }

    let len = params.len();

    quote! {
        #input

        #[allow(dead_code)]
        #vis fn #describe() -> ::dual_async::signature::FnSignature {
            let params: [&str; #len] = [#(#params),*];
            ::dual_async::signature::FnSignature::from_params(#name, params)
        }
    }
    .into()
}

/// Collects every identifier a parameter pattern binds.
fn collect_bindings(pat: &Pat, out: &mut Vec<String>) {
    match pat {
        Pat::Ident(ident) => out.push(ident.ident.to_string()),
        Pat::Type(typed) => collect_bindings(&typed.pat, out),
        Pat::Reference(reference) => collect_bindings(&reference.pat, out),
        Pat::Paren(paren) => collect_bindings(&paren.pat, out),
        Pat::Tuple(tuple) => tuple.elems.iter().for_each(|p| collect_bindings(p, out)),
        Pat::TupleStruct(tuple) => tuple.elems.iter().for_each(|p| collect_bindings(p, out)),
        Pat::Slice(slice) => slice.elems.iter().for_each(|p| collect_bindings(p, out)),
        Pat::Struct(strukt) => strukt
            .fields
            .iter()
            .for_each(|field| collect_bindings(&field.pat, out)),
        _ => {}
    }
}

enum EntryKind {
    Test,
    Main,
}

fn reject_arguments(attr: TokenStream, macro_name: &str) -> Option<TokenStream> {
    if attr.is_empty() {
        return None;
    }

    let tokens = TokenStream2::from(attr);
    Some(
        syn::Error::new_spanned(
            tokens,
            format!("dual_async::{} does not accept arguments", macro_name),
        )
        .to_compile_error()
        .into(),
    )
}

fn expand_entry(attr: TokenStream, item: TokenStream, kind: EntryKind) -> TokenStream {
    let macro_name = match kind {
        EntryKind::Test => "test",
        EntryKind::Main => "main",
    };
    if let Some(err) = reject_arguments(attr, macro_name) {
        return err;
    }

    let input = parse_macro_input!(item as ItemFn);

    if input.sig.asyncness.is_none() {
        return syn::Error::new_spanned(
            input.sig.fn_token,
            format!("dual_async::{} requires `async fn`", macro_name),
        )
        .to_compile_error()
        .into();
    }

    let mut sync_sig = input.sig.clone();
    sync_sig.asyncness = None;

    let attrs = input.attrs;
    let vis = input.vis;
    let block = input.block;
    let failure = format!(
        "dual_async::{}: failed to drive the async body on this thread's event loop",
        macro_name
    );

    let test_attr = match kind {
        EntryKind::Test => quote!(#[test]),
        EntryKind::Main => quote!(),
    };

    quote! {
        #(#attrs)*
        #test_attr
        #vis #sync_sig {
            ::dual_async::bridge::await_blocking(async move #block).expect(#failure)
        }
    }
    .into()
}
